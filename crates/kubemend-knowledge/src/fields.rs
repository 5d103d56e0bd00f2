//! Type-coercion field tables and indentation rules.

use std::sync::LazyLock;

use regex::Regex;

/// Fields whose scalar value is an integer. A quoted integer or an English
/// word number under one of these keys is coerced in pass 3.
pub const NUMERIC_FIELDS: &[&str] = &[
    "replicas",
    "containerPort",
    "hostPort",
    "port",
    "targetPort",
    "nodePort",
    "number",
    "initialDelaySeconds",
    "periodSeconds",
    "timeoutSeconds",
    "successThreshold",
    "failureThreshold",
    "terminationGracePeriodSeconds",
    "activeDeadlineSeconds",
    "startingDeadlineSeconds",
    "backoffLimit",
    "completions",
    "parallelism",
    "ttlSecondsAfterFinished",
    "successfulJobsHistoryLimit",
    "failedJobsHistoryLimit",
    "minReadySeconds",
    "revisionHistoryLimit",
    "progressDeadlineSeconds",
    "minReplicas",
    "maxReplicas",
    "targetCPUUtilizationPercentage",
    "runAsUser",
    "runAsGroup",
    "fsGroup",
    "weight",
    "priority",
    "tolerationSeconds",
    "defaultMode",
];

/// Fields whose scalar value is a boolean. `yes`/`on`/`"1"` style values
/// under one of these keys are coerced in pass 3.
pub const BOOLEAN_FIELDS: &[&str] = &[
    "hostNetwork",
    "hostPID",
    "hostIPC",
    "hostUsers",
    "shareProcessNamespace",
    "privileged",
    "allowPrivilegeEscalation",
    "readOnlyRootFilesystem",
    "runAsNonRoot",
    "readOnly",
    "automountServiceAccountToken",
    "enableServiceLinks",
    "suspend",
    "paused",
    "immutable",
    "optional",
    "stdin",
    "stdinOnce",
    "tty",
    "allowVolumeExpansion",
];

/// Key-name suffixes that imply a numeric value even for keys outside
/// [`NUMERIC_FIELDS`]. Matched case-insensitively against the full key.
static NUMERIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)count$",
        r"(?i)limit$",
        r"(?i)size$",
        r"(?i)timeout$",
        r"(?i)delay$",
        r"(?i)period$",
        r"(?i)threshold$",
        r"(?i)replicas$",
        r"(?i)port$",
        r"(?i)seconds$",
        r"(?i)minutes$",
        r"(?i)millis$",
        r"(?i)capacity$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static pattern must compile"))
    .collect()
});

/// Canonical indent levels for keys whose position is unambiguous. Keys at
/// level 1 are forced to column `indent_size` only when they are indented
/// somewhere else entirely; a level-1 key sitting at column 0 is left alone
/// so the AST pass can recognize and hoist it.
pub const FORCED_INDENTS: &[(&str, usize)] = &[
    ("apiVersion", 0),
    ("kind", 0),
    ("metadata", 0),
    ("spec", 0),
    ("status", 0),
    ("data", 0),
    ("binaryData", 0),
    ("replicas", 1),
    ("selector", 1),
    ("template", 1),
    ("type", 1),
];

/// Parents whose children are plain `key: value` pairs. Inside one of these
/// blocks a bare `word value` line is assumed to be a pair missing its colon.
pub const CHILD_VALUE_PARENTS: &[&str] = &[
    "labels",
    "annotations",
    "data",
    "env",
    "ports",
    "matchLabels",
    "selector",
    "resources",
    "limits",
    "requests",
];

/// Parents whose child keys are user-chosen (label names, data file names).
/// Fuzzy key correction never rewrites a child of one of these.
pub const FREEFORM_PARENTS: &[&str] = &[
    "labels",
    "annotations",
    "matchLabels",
    "nodeSelector",
    "data",
    "binaryData",
    "stringData",
    "parameters",
];

pub fn is_numeric_field(key: &str) -> bool {
    NUMERIC_FIELDS.contains(&key)
}

pub fn is_boolean_field(key: &str) -> bool {
    BOOLEAN_FIELDS.contains(&key)
}

/// `true` when the key name alone implies a numeric value (`…Seconds`,
/// `…Port`, `…Threshold`, ...).
pub fn matches_numeric_pattern(key: &str) -> bool {
    NUMERIC_PATTERNS.iter().any(|re| re.is_match(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_boolean_fields_are_disjoint() {
        for field in NUMERIC_FIELDS {
            assert!(
                !BOOLEAN_FIELDS.contains(field),
                "{field} is in both NUMERIC_FIELDS and BOOLEAN_FIELDS"
            );
        }
    }

    #[test]
    fn numeric_fields_are_known_keys() {
        for field in NUMERIC_FIELDS {
            assert!(crate::is_known_key(field), "{field} missing from KNOWN_KEYS");
        }
    }

    #[test]
    fn pattern_matches_camel_case_suffixes() {
        assert!(matches_numeric_pattern("initialDelaySeconds"));
        assert!(matches_numeric_pattern("gracePeriod"));
        assert!(matches_numeric_pattern("maxRetryCount"));
        assert!(matches_numeric_pattern("containerPort"));
        assert!(matches_numeric_pattern("storageCapacity"));
        assert!(!matches_numeric_pattern("image"));
        assert!(!matches_numeric_pattern("portal"));
    }

    #[test]
    fn forced_indent_keys_are_known() {
        for (key, level) in FORCED_INDENTS {
            assert!(crate::is_known_key(key), "{key} missing from KNOWN_KEYS");
            assert!(*level <= 1);
        }
    }
}
