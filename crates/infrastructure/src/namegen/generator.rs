use std::collections::HashSet;

use super::alterations;
use super::markov::MarkovModel;

/// Parameters shared by every alteration rule (§4.4(a)).
pub struct AlterationConfig {
    pub wordlist: Vec<String>,
    pub min_flip_len: usize,
    pub edit_distance: u32,
}

/// Combines the alteration family and the Markov family into the single
/// `generate(n, [sub]) → names` operation (§4.4, last paragraph).
pub struct NameGenerator {
    alterations: AlterationConfig,
    markov: MarkovModel,
}

impl NameGenerator {
    pub fn new(alterations: AlterationConfig, markov_ngram: usize) -> Self {
        Self {
            alterations,
            markov: MarkovModel::new(markov_ngram),
        }
    }

    /// Feeds a confirmed label into the Markov trainer so future `generate`
    /// calls can synthesize plausible siblings.
    pub fn observe(&self, confirmed_name: &str) {
        if let Some((label, _)) = confirmed_name.split_once('.') {
            self.markov.train(label);
        }
    }

    /// All alteration-rule candidates for one confirmed name.
    pub fn alterations_for(&self, confirmed_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(alterations::add_prefix_word(
            confirmed_name,
            &self.alterations.wordlist,
        ));
        out.extend(alterations::add_suffix_word(
            confirmed_name,
            &self.alterations.wordlist,
        ));
        out.extend(alterations::flip_words(
            confirmed_name,
            &self.alterations.wordlist,
            self.alterations.min_flip_len,
        ));
        out.extend(alterations::append_numbers(confirmed_name));
        out.extend(alterations::flip_numbers(confirmed_name));
        out.extend(alterations::fuzzy_label_searches(
            confirmed_name,
            self.alterations.edit_distance,
        ));
        out
    }

    /// `generate(n, [sub])`: returns `n` unique joined Markov-synthesized
    /// names per supplied subdomain parent.
    pub fn generate(&self, n: usize, subs: &[String]) -> Vec<String> {
        let mut out = HashSet::new();
        for sub in subs {
            for label in self.markov.generate(n) {
                out.insert(format!("{label}.{sub}"));
            }
        }
        out.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alterations_for_combines_all_rule_families() {
        let gen = NameGenerator::new(
            AlterationConfig {
                wordlist: vec!["test".to_string()],
                min_flip_len: 3,
                edit_distance: 1,
            },
            2,
        );
        let out = gen.alterations_for("fa2ke.test.com");
        assert!(out.iter().any(|n| n.starts_with("test-fa2ke")));
        assert!(out.iter().any(|n| n.starts_with("fa2ke-test")));
        assert!(out.contains(&"fa2ke2.test.com".to_string()));
    }

    #[test]
    fn generate_yields_novel_names_joined_to_each_sub() {
        let gen = NameGenerator::new(
            AlterationConfig {
                wordlist: vec![],
                min_flip_len: 3,
                edit_distance: 1,
            },
            2,
        );
        // See markov.rs's own test for why this particular four-label set
        // is used: it's the smallest corpus that reaches a blended label
        // ("amply") the Markov model never observed directly.
        for label in ["apple.ex.com", "apply.ex.com", "ample.ex.com", "ankle.ex.com"] {
            gen.observe(label);
        }
        let names = gen.generate(1, &["ex.com".to_string()]);
        assert_eq!(names, vec!["amply.ex.com".to_string()]);
        for n in &names {
            assert!(n.ends_with(".ex.com"));
        }
    }
}
