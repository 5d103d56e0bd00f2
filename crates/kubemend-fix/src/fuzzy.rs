//! Fuzzy key and Kind matching.
//!
//! Tokens are normalized (ASCII letters only, lowercased) and compared
//! against pre-normalized dictionaries with Levenshtein distance. The
//! distance budget is 2, stretched to 3 when the first two letters agree
//! and tightened to 1 for short dictionary words, where a budget of 2
//! would let `kind` absorb half the alphabet.

use std::collections::HashMap;
use std::sync::LazyLock;

use kubemend_knowledge::{KNOWN_KEYS, KNOWN_KINDS};

/// Lowercase and drop every non-letter. `containerPort`, `container_port`,
/// and `container-port` all normalize alike.
pub fn normalize(token: &str) -> String {
    token
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_ascii_lowercase()
}

struct Dictionary {
    /// `(normalized, canonical)` in declaration order, for distance scans.
    entries: Vec<(String, &'static str)>,
    /// Normalized form to canonical, for exact hits.
    exact: HashMap<String, &'static str>,
}

impl Dictionary {
    fn build(words: &[&'static str]) -> Self {
        let entries: Vec<(String, &'static str)> =
            words.iter().map(|w| (normalize(w), *w)).collect();
        let exact = entries.iter().map(|(n, c)| (n.clone(), *c)).collect();
        Self { entries, exact }
    }

    fn lookup(&self, token: &str) -> Option<&'static str> {
        let norm = normalize(token);
        if norm.is_empty() {
            return None;
        }
        if let Some(canonical) = self.exact.get(&norm) {
            return Some(canonical);
        }

        let mut best: Option<(usize, &'static str)> = None;
        for (entry_norm, canonical) in &self.entries {
            let distance = strsim::levenshtein(&norm, entry_norm);
            if distance <= budget(&norm, entry_norm)
                && best.is_none_or(|(best_distance, _)| distance < best_distance)
            {
                best = Some((distance, canonical));
            }
        }
        best.map(|(_, canonical)| canonical)
    }
}

/// Allowed edit distance for a candidate/dictionary pair.
fn budget(candidate: &str, known: &str) -> usize {
    if known.len() < 5 {
        1
    } else if candidate.len() >= 2 && candidate[..2] == known[..2] {
        3
    } else {
        2
    }
}

static KEY_DICT: LazyLock<Dictionary> = LazyLock::new(|| Dictionary::build(KNOWN_KEYS));
static KIND_DICT: LazyLock<Dictionary> = LazyLock::new(|| Dictionary::build(KNOWN_KINDS));

/// The canonical key for a token that is a known key modulo normalization.
pub fn exact_key(token: &str) -> Option<&'static str> {
    KEY_DICT.exact.get(&normalize(token)).copied()
}

/// Closest canonical key within the distance budget, exact hits first.
pub fn closest_key(token: &str) -> Option<&'static str> {
    KEY_DICT.lookup(token)
}

/// Closest canonical Kind within the distance budget.
pub fn closest_kind(value: &str) -> Option<&'static str> {
    KIND_DICT.lookup(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_everything_but_letters() {
        assert_eq!(normalize("container-port"), "containerport");
        assert_eq!(normalize("image_pull_policy2"), "imagepullpolicy");
        assert_eq!(normalize("APIVersion"), "apiversion");
        assert_eq!(normalize("123"), "");
    }

    #[test]
    fn exact_hits_survive_case_and_punctuation() {
        assert_eq!(exact_key("apiversion"), Some("apiVersion"));
        assert_eq!(exact_key("image-pull-policy"), Some("imagePullPolicy"));
        assert_eq!(exact_key("nonsense"), None);
    }

    #[test]
    fn distance_two_matches() {
        assert_eq!(closest_key("contaners"), Some("containers"));
        assert_eq!(closest_key("replcas"), Some("replicas"));
    }

    #[test]
    fn distance_three_needs_prefix_agreement() {
        // "contanirs" -> "containers" is distance 3 with a matching prefix.
        assert_eq!(closest_key("contanirs"), Some("containers"));
        // Without prefix agreement, distance 3 is rejected.
        assert_eq!(closest_key("xxxtainers"), None);
    }

    #[test]
    fn short_keys_get_a_tight_budget() {
        // "kind" has four letters: only distance 1 is allowed.
        assert_eq!(closest_key("kin"), Some("kind"));
        assert_eq!(closest_key("bind"), Some("kind"));
        assert_eq!(closest_key("bound"), None);
    }

    #[test]
    fn kinds_match_case_insensitively() {
        assert_eq!(closest_kind("deployment"), Some("Deployment"));
        assert_eq!(closest_kind("Deplyoment"), Some("Deployment"));
        assert_eq!(closest_kind("confgmap"), Some("ConfigMap"));
        assert_eq!(closest_kind("Gizmo"), None);
    }
}
