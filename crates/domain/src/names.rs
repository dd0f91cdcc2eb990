//! Name normalization and registered-domain/TLD derivation (§3, §4.1).

/// A small set of multi-label public suffixes that would otherwise be
/// mis-split by the "last two labels" heuristic. Not a full public-suffix
/// list; sufficient for the eTLD+1 shapes the enumeration engine actually
/// encounters (bare ccTLDs and their common second-level carve-outs).
const MULTI_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "co.jp", "ne.jp", "or.jp", "com.au", "net.au", "org.au",
    "co.nz", "co.za", "com.br", "com.cn", "com.mx", "co.in", "co.kr",
];

/// Lowercases and trims a raw name, per the case-insensitive scope
/// predicate in §4.1.
pub fn normalize(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Splits a normalized FQDN into its labels.
pub fn labels(name: &str) -> Vec<&str> {
    name.split('.').filter(|l| !l.is_empty()).collect()
}

/// Derives the TLD suffix of a normalized name (the portion matched by the
/// public-suffix heuristic above, or the final label otherwise).
pub fn tld(name: &str) -> String {
    let labs = labels(name);
    if labs.len() < 2 {
        return name.to_string();
    }
    let last_two = format!("{}.{}", labs[labs.len() - 2], labs[labs.len() - 1]);
    if MULTI_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        last_two
    } else {
        labs[labs.len() - 1].to_string()
    }
}

/// Derives the registered domain (eTLD+1) of a normalized name: the TLD
/// suffix plus exactly one more label, per the GLOSSARY definition.
pub fn registered_domain(name: &str) -> String {
    let suffix = tld(name);
    let suffix_labels = labels(&suffix).len();
    let labs = labels(name);
    if labs.len() <= suffix_labels {
        return name.to_string();
    }
    let start = labs.len() - suffix_labels - 1;
    labs[start..].join(".")
}

/// Scope predicate from §4.1: `name ∈ scope ⇔ name == d OR name endsWith "." + d`.
pub fn is_subdomain_of_or_equal(name: &str, domain: &str) -> bool {
    let name = normalize(name);
    let domain = normalize(domain);
    name == domain || name.ends_with(&format!(".{domain}"))
}

/// Total length and per-label length limits from §4.4 ("rejected if total
/// length > 253 or any label > 63").
pub fn is_valid_length(name: &str) -> bool {
    if name.len() > 253 {
        return false;
    }
    labels(name).iter().all(|l| l.len() <= 63)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_trailing_dot() {
        assert_eq!(normalize(" WWW.Example.COM. "), "www.example.com");
    }

    #[test]
    fn simple_tld_and_registered_domain() {
        assert_eq!(tld("www.example.com"), "com");
        assert_eq!(registered_domain("www.example.com"), "example.com");
    }

    #[test]
    fn multi_label_suffix() {
        assert_eq!(tld("foo.bar.co.uk"), "co.uk");
        assert_eq!(registered_domain("foo.bar.co.uk"), "bar.co.uk");
    }

    #[test]
    fn scope_predicate_matches_exact_and_subdomain() {
        assert!(is_subdomain_of_or_equal("example.com", "example.com"));
        assert!(is_subdomain_of_or_equal("a.b.example.com", "example.com"));
        assert!(!is_subdomain_of_or_equal("notexample.com", "example.com"));
    }

    #[test]
    fn length_limits() {
        assert!(is_valid_length("a.b.com"));
        assert!(!is_valid_length(&"a".repeat(64)));
        let long = vec!["a"; 130].join(".");
        assert!(!is_valid_length(&long));
    }
}
