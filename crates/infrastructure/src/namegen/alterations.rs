//! Rule-based label alterations (§4.4(a)). Each rule operates on the
//! leftmost label of a name and re-joins the result with the original
//! parent suffix, rejecting anything over the 253/63 length limits.

use std::collections::HashSet;

use surveyor_domain::names::is_valid_length;

const DNS_ALPHABET: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '-',
];

fn split_label_parent(name: &str) -> (&str, &str) {
    match name.split_once('.') {
        Some((label, parent)) => (label, parent),
        None => (name, ""),
    }
}

fn rejoin(label: &str, parent: &str) -> Option<String> {
    let joined = if parent.is_empty() {
        label.to_string()
    } else {
        format!("{label}.{parent}")
    };
    if label.len() > 63 || !is_valid_length(&joined) {
        return None;
    }
    Some(joined)
}

/// `AddPrefixWord`: `{w + "-" + label : w ∈ wordlist}`.
pub fn add_prefix_word(name: &str, wordlist: &[String]) -> Vec<String> {
    let (label, parent) = split_label_parent(name);
    wordlist
        .iter()
        .filter_map(|w| rejoin(&format!("{w}-{label}"), parent))
        .collect()
}

/// `AddSuffixWord`: `{label + "-" + w : w ∈ wordlist}`.
pub fn add_suffix_word(name: &str, wordlist: &[String]) -> Vec<String> {
    let (label, parent) = split_label_parent(name);
    wordlist
        .iter()
        .filter_map(|w| rejoin(&format!("{label}-{w}"), parent))
        .collect()
}

/// `FlipWords`: split `label` on `-`; for each position whose token length
/// is ≥ `min_flip_len`, substitute every wordlist entry at that position.
///
/// Resolved open question (§9 #1): a label with no `-`-separated token at
/// all (e.g. `fa2ke`) has no position to flip and yields no output — it is
/// not treated as one giant token.
pub fn flip_words(name: &str, wordlist: &[String], min_flip_len: usize) -> Vec<String> {
    let (label, parent) = split_label_parent(name);
    if !label.contains('-') {
        return Vec::new();
    }
    let tokens: Vec<&str> = label.split('-').collect();
    let mut out = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.len() < min_flip_len {
            continue;
        }
        for w in wordlist {
            if *w == *token {
                continue;
            }
            let mut flipped = tokens.clone();
            flipped[i] = w.as_str();
            if let Some(joined) = rejoin(&flipped.join("-"), parent) {
                out.push(joined);
            }
        }
    }
    out
}

fn digit_positions(label: &str) -> Vec<usize> {
    label
        .char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect()
}

/// `AppendNumbers`: operates on the trailing digit run if `label` ends in a
/// digit; otherwise appends a fresh digit to the end (§4.4(a)).
pub fn append_numbers(name: &str) -> Vec<String> {
    let (label, parent) = split_label_parent(name);
    let mut out = Vec::new();

    let ends_in_digit = label.chars().last().is_some_and(|c| c.is_ascii_digit());

    if ends_in_digit {
        let digit_start = label
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, _)| i)
            .unwrap_or(label.len() - 1);
        let prefix = &label[..digit_start];
        let original_digits = &label[digit_start..];
        for d in 0u32..10 {
            let candidate = format!("{prefix}{d}");
            if candidate == format!("{prefix}{original_digits}") {
                continue;
            }
            if let Some(joined) = rejoin(&candidate, parent) {
                out.push(joined);
            }
        }
    } else {
        for d in 0u32..10 {
            if let Some(joined) = rejoin(&format!("{label}{d}"), parent) {
                out.push(joined);
            }
        }
    }
    out
}

/// `FlipNumbers`: for every digit position, substitute every other digit
/// 0-9 (§4.4(a)).
pub fn flip_numbers(name: &str) -> Vec<String> {
    let (label, parent) = split_label_parent(name);
    let mut out = Vec::new();
    for pos in digit_positions(label) {
        let original = label.as_bytes()[pos];
        for d in b'0'..=b'9' {
            if d == original {
                continue;
            }
            let mut bytes = label.as_bytes().to_vec();
            bytes[pos] = d;
            let candidate = String::from_utf8(bytes).unwrap();
            if let Some(joined) = rejoin(&candidate, parent) {
                out.push(joined);
            }
        }
    }
    out
}

/// `FuzzyLabelSearches`: labels within Damerau-Levenshtein edit distance
/// `max_distance` of the input, generated by substitution/insertion/
/// deletion/transposition over the DNS alphabet rather than scored against
/// every possible string (infeasible past length ~6). Bounded to
/// `MAX_FUZZY_OUTPUTS` candidates so a long label can't blow up the
/// enumeration fan-out; callers that need exhaustiveness should lower
/// `max_distance` instead of relying on this cap.
const MAX_FUZZY_OUTPUTS: usize = 2048;

pub fn fuzzy_label_searches(name: &str, max_distance: u32) -> Vec<String> {
    let (label, parent) = split_label_parent(name);
    let mut seen = HashSet::new();
    seen.insert(label.to_string());
    let mut frontier = vec![label.to_string()];

    for _ in 0..max_distance {
        let mut next_frontier = Vec::new();
        for candidate in &frontier {
            for mutated in single_edits(candidate) {
                if seen.len() >= MAX_FUZZY_OUTPUTS {
                    break;
                }
                if seen.insert(mutated.clone()) {
                    next_frontier.push(mutated);
                }
            }
        }
        frontier = next_frontier;
        if seen.len() >= MAX_FUZZY_OUTPUTS {
            break;
        }
    }

    seen.remove(label);
    seen.into_iter()
        .filter_map(|l| rejoin(&l, parent))
        .collect()
}

fn single_edits(label: &str) -> Vec<String> {
    let chars: Vec<char> = label.chars().collect();
    let mut out = Vec::new();

    for i in 0..chars.len() {
        for &c in DNS_ALPHABET {
            if c == chars[i] {
                continue;
            }
            let mut v = chars.clone();
            v[i] = c;
            out.push(v.into_iter().collect());
        }
    }

    for i in 0..=chars.len() {
        for &c in DNS_ALPHABET {
            let mut v = chars.clone();
            v.insert(i, c);
            out.push(v.into_iter().collect());
        }
    }

    if chars.len() > 1 {
        for i in 0..chars.len() {
            let mut v = chars.clone();
            v.remove(i);
            out.push(v.into_iter().collect());
        }
    }

    for i in 0..chars.len().saturating_sub(1) {
        let mut v = chars.clone();
        v.swap(i, i + 1);
        out.push(v.into_iter().collect());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_numbers_appends_when_no_trailing_digit() {
        let out = append_numbers("fa2ke.test.com");
        assert!(out.contains(&"fa2ke2.test.com".to_string()));
        assert!(out.contains(&"fa2ke3.test.com".to_string()));
        assert!(out.contains(&"fa2ke4.test.com".to_string()));
        assert_eq!(out.len(), 10);
    }

    #[test]
    fn flip_numbers_substitutes_each_digit_position() {
        let out = flip_numbers("fa2ke.test.com");
        assert!(out.contains(&"fa7ke.test.com".to_string()));
        assert!(out.contains(&"fa8ke.test.com".to_string()));
        assert!(out.contains(&"fa3ke.test.com".to_string()));
        assert_eq!(out.len(), 9);
    }

    #[test]
    fn flip_words_is_noop_without_hyphen() {
        let wordlist = vec!["test".to_string(), "abc".to_string(), "123".to_string()];
        assert!(flip_words("fa2ke.test.com", &wordlist, 3).is_empty());
    }

    #[test]
    fn flip_words_substitutes_tokens_at_or_above_threshold() {
        let wordlist = vec!["prod".to_string()];
        let out = flip_words("api-dev.test.com", &wordlist, 3);
        assert!(out.contains(&"api-prod.test.com".to_string()));
    }

    #[test]
    fn add_prefix_and_suffix_word() {
        let wordlist = vec!["dev".to_string()];
        assert_eq!(
            add_prefix_word("api.test.com", &wordlist),
            vec!["dev-api.test.com".to_string()]
        );
        assert_eq!(
            add_suffix_word("api.test.com", &wordlist),
            vec!["api-dev.test.com".to_string()]
        );
    }

    #[test]
    fn fuzzy_neighborhood_stays_within_edit_distance_and_excludes_self() {
        let out = fuzzy_label_searches("fa2ke.test.com", 1);
        assert!(!out.contains(&"fa2ke.test.com".to_string()));
        assert!(out.iter().all(|n| n.ends_with(".test.com")));
        assert!(out.contains(&"fa2k.test.com".to_string()));
    }
}
