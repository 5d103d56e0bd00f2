//! Nested-structure wrapping patterns.
//!
//! Each pattern describes a parent whose direct children belong under an
//! intermediate wrapper key the author forgot to write. The canonical case
//! is a probe declared with `path`/`port` directly under it instead of
//! under `httpGet`.

use std::sync::LazyLock;

use regex::Regex;

/// One wrapping rule: when a key matching `parent` has direct children
/// matching `child` and no child named `wrapper`, the matching children are
/// regrouped under an inserted `wrapper:` line. Rules marked
/// `aggressive_only` guess at author intent and are skipped outside
/// aggressive mode.
pub struct WrapPattern {
    pub parent: Regex,
    pub child: Regex,
    pub wrapper: &'static str,
    pub aggressive_only: bool,
}

pub static NESTED_STRUCTURE_PATTERNS: LazyLock<Vec<WrapPattern>> = LazyLock::new(|| {
    vec![
        WrapPattern {
            parent: Regex::new(r"^(?:liveness|readiness|startup)Probe$")
                .expect("static pattern must compile"),
            child: Regex::new(r"^(?:path|port|scheme|host|httpHeaders)$")
                .expect("static pattern must compile"),
            wrapper: "httpGet",
            aggressive_only: false,
        },
        WrapPattern {
            parent: Regex::new(r"^resources$").expect("static pattern must compile"),
            child: Regex::new(r"^(?:cpu|memory|ephemeral-storage)$")
                .expect("static pattern must compile"),
            wrapper: "limits",
            aggressive_only: false,
        },
        // A bare key under valueFrom is usually a secret ref, but not
        // reliably enough to rewrite by default.
        WrapPattern {
            parent: Regex::new(r"^valueFrom$").expect("static pattern must compile"),
            child: Regex::new(r"^(?:key|optional)$").expect("static pattern must compile"),
            wrapper: "secretKeyRef",
            aggressive_only: true,
        },
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_pattern_matches_all_three_probes() {
        let probe = &NESTED_STRUCTURE_PATTERNS[0];
        for parent in ["livenessProbe", "readinessProbe", "startupProbe"] {
            assert!(probe.parent.is_match(parent));
        }
        assert!(!probe.parent.is_match("probe"));
        assert!(probe.child.is_match("path"));
        assert!(!probe.child.is_match("initialDelaySeconds"));
    }

    #[test]
    fn wrappers_are_known_keys() {
        for pattern in NESTED_STRUCTURE_PATTERNS.iter() {
            assert!(crate::is_known_key(pattern.wrapper));
        }
    }
}
