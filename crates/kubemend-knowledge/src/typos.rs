//! Explicit misspelling tables.
//!
//! Keys on the left are *normalized* spellings: lowercased with every
//! non-letter removed, the same normalization the fuzzy matcher applies
//! before lookup. Entries here take precedence over Levenshtein matching,
//! which lets us pin down misspellings that are closer to the wrong
//! canonical key (`specs` is distance 1 from both `spec` and `specs`-less
//! neighbors) or too far for the distance threshold (`meta`).

use std::sync::LazyLock;

use indexmap::IndexMap;

/// Whole-line rewrites applied only at indent zero, before any fuzzy work.
pub const TOP_LEVEL_REWRITES: &[(&str, &str)] = &[
    ("meta:", "metadata:"),
    ("metdata:", "metadata:"),
    ("metadat:", "metadata:"),
    ("apiversion:", "apiVersion:"),
];

/// Misspellings observed at document roots, normalized form to canonical.
pub static TYPO_CORRECTIONS: LazyLock<IndexMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        IndexMap::from([
            ("apiverison", "apiVersion"),
            ("apivresion", "apiVersion"),
            ("apiversoin", "apiVersion"),
            ("aipversion", "apiVersion"),
            ("kindd", "kind"),
            ("knid", "kind"),
            ("met", "metadata"),
            ("meta", "metadata"),
            ("metdata", "metadata"),
            ("metadat", "metadata"),
            ("matadata", "metadata"),
            ("sepc", "spec"),
            ("specs", "spec"),
            ("spce", "spec"),
            ("stauts", "status"),
        ])
    });

/// Misspellings of nested field names, normalized form to canonical.
pub static FIELD_TYPO_MAP: LazyLock<IndexMap<&'static str, &'static str>> = LazyLock::new(|| {
    IndexMap::from([
        ("replica", "replicas"),
        ("replcias", "replicas"),
        ("repicas", "replicas"),
        ("contianers", "containers"),
        ("continers", "containers"),
        ("containrs", "containers"),
        ("conatiners", "containers"),
        ("imgae", "image"),
        ("imge", "image"),
        ("iamge", "image"),
        ("prots", "ports"),
        ("porst", "ports"),
        ("containerprot", "containerPort"),
        ("contianerport", "containerPort"),
        ("lables", "labels"),
        ("labls", "labels"),
        ("annotaions", "annotations"),
        ("anotations", "annotations"),
        ("namespce", "namespace"),
        ("namepsace", "namespace"),
        ("selctor", "selector"),
        ("seletor", "selector"),
        ("matchlables", "matchLabels"),
        ("tempalte", "template"),
        ("templte", "template"),
        ("resorces", "resources"),
        ("resouces", "resources"),
        ("limts", "limits"),
        ("limmits", "limits"),
        ("requsts", "requests"),
        ("requets", "requests"),
        ("volums", "volumes"),
        ("volumemont", "volumeMounts"),
        ("volumemonts", "volumeMounts"),
        ("mountpth", "mountPath"),
        ("livenessprob", "livenessProbe"),
        ("livnessprobe", "livenessProbe"),
        ("readinesprobe", "readinessProbe"),
        ("readynessprobe", "readinessProbe"),
        ("imagepullpolcy", "imagePullPolicy"),
        ("imagepulpolicy", "imagePullPolicy"),
        ("restartpolcy", "restartPolicy"),
        ("serviceacountname", "serviceAccountName"),
        ("enviroment", "env"),
        ("commmand", "command"),
        ("agrs", "args"),
        ("shedule", "schedule"),
        ("schedual", "schedule"),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_known_key;

    fn normalize(s: &str) -> String {
        s.chars()
            .filter(char::is_ascii_alphabetic)
            .collect::<String>()
            .to_ascii_lowercase()
    }

    #[test]
    fn typo_targets_are_known_keys() {
        for target in TYPO_CORRECTIONS.values().chain(FIELD_TYPO_MAP.values()) {
            assert!(is_known_key(target), "{target} missing from KNOWN_KEYS");
        }
    }

    #[test]
    fn typo_sources_are_normalized() {
        for source in TYPO_CORRECTIONS.keys().chain(FIELD_TYPO_MAP.keys()) {
            assert_eq!(
                *source,
                normalize(source),
                "{source} is not in normalized form"
            );
        }
    }

    #[test]
    fn rewrite_targets_parse_as_key_lines() {
        for (from, to) in TOP_LEVEL_REWRITES {
            assert!(from.ends_with(':'));
            assert!(to.ends_with(':'));
        }
    }
}
