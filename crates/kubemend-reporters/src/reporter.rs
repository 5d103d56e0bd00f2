//! The `Reporter` trait and the shared change-log summary.

use core::time::Duration;

use kubemend_fix::{Category, FixReport, Severity};

/// Formats and outputs a repair report. The repaired content itself is the
/// caller's business; reporters only narrate the change log.
pub trait Reporter {
    fn report(&mut self, report: &FixReport, elapsed: Duration);
}

/// One-line rollup of a change log, grouped by category.
pub fn summarize(report: &FixReport) -> String {
    let count = |category: Category| {
        report
            .changes
            .iter()
            .filter(|c| c.category == category)
            .count()
    };
    let low_confidence = report
        .changes
        .iter()
        .filter(|c| c.severity == Severity::Warning)
        .count();
    format!(
        "{} fixes ({} syntax, {} structure, {} semantic, {} type), {} flagged for review",
        report.changes.len(),
        count(Category::Syntax),
        count(Category::Structure),
        count(Category::Semantic),
        count(Category::Type),
        low_confidence,
    )
}
