//! JSON reporter: the integration shape HTTP consumers expect.

use core::time::Duration;

use kubemend_fix::FixReport;
use serde::Serialize;

use crate::reporter::{Reporter, summarize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonBody<'a> {
    success: bool,
    fixed: &'a str,
    errors: &'a [String],
    changes: &'a [kubemend_fix::Change],
    fixed_count: usize,
    confidence: f64,
    summary: String,
}

pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn report(&mut self, report: &FixReport, _elapsed: Duration) {
        let body = JsonBody {
            success: report.is_valid,
            fixed: &report.content,
            errors: &report.errors,
            changes: &report.changes,
            fixed_count: report.changes.len(),
            confidence: report.confidence,
            summary: summarize(report),
        };
        match serde_json::to_string_pretty(&body) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("error: failed to serialize report: {e}"),
        }
    }
}
