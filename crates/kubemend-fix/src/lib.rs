#![doc = include_str!("../README.md")]

pub mod change;
pub mod fuzzy;
pub mod options;
pub mod passes;
pub mod scan;
pub mod serialize;

pub use change::{Category, Change, ChangeLog, FixReport, PassStat, Severity};
pub use options::FixOptions;

use std::time::Instant;

use passes::{
    AST_RECONSTRUCTION, CONFIDENCE_SCORING, JUNK_STRIPPING, SEMANTIC_VALIDATION,
    SYNTAX_NORMALIZATION, VALIDATION_ITERATION,
};

/// Run the full repair pipeline over one (possibly multi-document) manifest.
///
/// This never fails: pathological input comes back with `is_valid: false`
/// and the remaining parse errors recorded as strings. With
/// `auto_fix: false` the pipeline still runs for its diagnostics, but the
/// report carries the original input as `content`.
#[tracing::instrument(skip_all, fields(bytes = content.len()))]
pub fn fix(content: &str, options: &FixOptions) -> FixReport {
    if content.trim().is_empty() {
        return FixReport {
            content: String::new(),
            changes: Vec::new(),
            is_valid: true,
            errors: Vec::new(),
            confidence: 1.0,
            passes: Vec::new(),
        };
    }

    let mut log = ChangeLog::new();
    let mut stats: Vec<PassStat> = Vec::new();

    let text = record(JUNK_STRIPPING, &mut log, &mut stats, |log| {
        passes::junk::run(content, log)
    });
    let text = record(SYNTAX_NORMALIZATION, &mut log, &mut stats, |log| {
        passes::syntax::run(&text, options, log)
    });
    let text = record(AST_RECONSTRUCTION, &mut log, &mut stats, |log| {
        passes::ast::run(&text, log)
    });
    let text = record(SEMANTIC_VALIDATION, &mut log, &mut stats, |log| {
        passes::semantic::run(&text, log)
    });
    let text = record(VALIDATION_ITERATION, &mut log, &mut stats, |log| {
        passes::iterate::run(&text, options, log)
    });

    let start = Instant::now();
    let before = log.len();
    let verdict = passes::score::run(&text, options, &mut log);
    stats.push(PassStat {
        name: CONFIDENCE_SCORING,
        changes: log.len() - before,
        duration: start.elapsed(),
    });

    let changes = log.into_changes();
    #[allow(clippy::cast_precision_loss)]
    let confidence = if changes.is_empty() {
        1.0
    } else {
        changes.iter().map(|c| c.confidence).sum::<f64>() / changes.len() as f64
    };

    tracing::info!(
        changes = changes.len(),
        valid = verdict.is_valid,
        confidence,
        "repair finished"
    );

    FixReport {
        content: if options.auto_fix {
            text
        } else {
            content.to_string()
        },
        changes,
        is_valid: verdict.is_valid,
        errors: verdict.errors,
        confidence,
        passes: stats,
    }
}

fn record<F>(
    name: &'static str,
    log: &mut ChangeLog,
    stats: &mut Vec<PassStat>,
    pass: F,
) -> String
where
    F: FnOnce(&mut ChangeLog) -> String,
{
    let start = Instant::now();
    let before = log.len();
    let out = pass(log);
    stats.push(PassStat {
        name,
        changes: log.len() - before,
        duration: start.elapsed(),
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_valid_and_unchanged() {
        let report = fix("", &FixOptions::default());
        assert_eq!(report.content, "");
        assert!(report.changes.is_empty());
        assert!(report.is_valid);
        assert!((report.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn whitespace_only_input_is_valid() {
        let report = fix("  \n\n", &FixOptions::default());
        assert!(report.is_valid);
        assert!(report.changes.is_empty());
    }

    #[test]
    fn comments_and_separators_survive() {
        let text = "# deploy config\n---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: dev\n";
        let report = fix(text, &FixOptions::default());
        assert!(report.content.contains("# deploy config"));
        assert_eq!(report.content.matches("---").count(), 1);
    }

    #[test]
    fn url_values_are_never_split() {
        let text = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: c\n  namespace: default\ndata:\n  endpoint: http://example.com\n";
        let report = fix(text, &FixOptions::default());
        assert!(report.content.contains("endpoint: http://example.com"));
    }

    #[test]
    fn pass_breakdown_covers_all_passes() {
        let report = fix("kind: Pod\n", &FixOptions::default());
        let names: Vec<&str> = report.passes.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "Junk Stripping",
                "Syntax Normalization",
                "AST Reconstruction",
                "Semantic Validation",
                "Validation Iteration",
                "Confidence Scoring",
            ]
        );
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let report = fix("apiVersion v1\nkind deployment\nreplicas: three\n", &FixOptions::default());
        assert!(report.confidence > 0.0 && report.confidence <= 1.0);
        assert!(!report.changes.is_empty());
    }

    #[test]
    fn no_fix_mode_reports_without_rewriting() {
        let text = "apiVersion v1\nkind: Pod\n";
        let opts = FixOptions {
            auto_fix: false,
            ..FixOptions::default()
        };
        let report = fix(text, &opts);
        assert_eq!(report.content, text);
        assert!(!report.changes.is_empty());
    }

    #[test]
    fn pathological_input_never_panics() {
        let report = fix("::::\n\t\t[\x00}}\n'''\n", &FixOptions::default());
        assert!(report.confidence >= 0.0);
    }
}
