//! Pass 5: confidence scoring.
//!
//! One final parse check, verbatim capture of any remaining errors, and a
//! severity downgrade for changes that scored below the configured
//! confidence threshold.

use serde::Deserialize;
use serde_yaml::Value;

use crate::change::{ChangeLog, Severity};
use crate::options::FixOptions;

/// Outcome of the final parse check.
#[derive(Debug)]
pub struct Verdict {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

#[tracing::instrument(skip_all)]
pub fn run(text: &str, opts: &FixOptions, log: &mut ChangeLog) -> Verdict {
    let errors = parse_errors(text);
    let threshold = opts.effective_threshold();

    for change in log.changes_mut() {
        if change.confidence < threshold
            && matches!(change.severity, Severity::Critical | Severity::Error)
        {
            change.severity = Severity::Warning;
        }
    }

    tracing::debug!(valid = errors.is_empty(), remaining = errors.len(), "final parse check");
    Verdict {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn parse_errors(text: &str) -> Vec<String> {
    for doc in serde_yaml::Deserializer::from_str(text) {
        if let Err(e) = Value::deserialize(doc) {
            // Parsing past the first failure is unreliable; report it alone.
            return vec![e.to_string()];
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Category, Change};

    fn low_confidence_error() -> Change {
        Change::new(
            1,
            "a",
            "b",
            "shaky guess",
            Category::Syntax,
            Severity::Error,
            0.5,
        )
    }

    #[test]
    fn valid_text_yields_no_errors() {
        let mut log = ChangeLog::new();
        let verdict = run("kind: Pod\n", &FixOptions::default(), &mut log);
        assert!(verdict.is_valid);
        assert!(verdict.errors.is_empty());
    }

    #[test]
    fn invalid_text_reports_the_parse_error() {
        let mut log = ChangeLog::new();
        let verdict = run("key: [unclosed\n", &FixOptions::default(), &mut log);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.errors.len(), 1);
    }

    #[test]
    fn low_confidence_changes_are_downgraded() {
        let mut log = ChangeLog::new();
        log.push(low_confidence_error());
        run("kind: Pod\n", &FixOptions::default(), &mut log);
        assert_eq!(log.into_changes()[0].severity, Severity::Warning);
    }

    #[test]
    fn confident_changes_keep_their_severity() {
        let mut log = ChangeLog::new();
        let mut change = low_confidence_error();
        change.confidence = 0.99;
        log.push(change);
        run("kind: Pod\n", &FixOptions::default(), &mut log);
        assert_eq!(log.into_changes()[0].severity, Severity::Error);
    }

    #[test]
    fn aggressive_mode_lowers_the_bar() {
        let opts = FixOptions {
            aggressive: true,
            ..FixOptions::default()
        };
        let mut log = ChangeLog::new();
        log.push(low_confidence_error());
        run("kind: Pod\n", &opts, &mut log);
        // 0.5 meets the lowered 0.5 threshold, so the severity survives.
        assert_eq!(log.into_changes()[0].severity, Severity::Error);
    }
}
