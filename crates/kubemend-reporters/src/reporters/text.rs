//! Text reporter: plain one-line-per-change output suitable for CI.

use core::time::Duration;

use kubemend_fix::FixReport;

use crate::reporter::{Reporter, summarize};

pub struct TextReporter {
    pub verbose: bool,
}

impl Reporter for TextReporter {
    fn report(&mut self, report: &FixReport, elapsed: Duration) {
        for change in &report.changes {
            eprintln!(
                "{}: line {}: {} [{}/{}]",
                change.severity, change.line, change.reason, change.category, change.confidence
            );
        }
        for error in &report.errors {
            eprintln!("error: unresolved: {error}");
        }
        if self.verbose {
            for pass in &report.passes {
                eprintln!("  {}: {} changes", pass.name, pass.changes);
            }
        }

        let ms = elapsed.as_millis();
        let status = if report.is_valid {
            "valid YAML"
        } else {
            "still unparseable"
        };
        eprintln!(
            "{} in {ms}ms; {status} (confidence {:.2})",
            summarize(report),
            report.confidence
        );
    }
}
