#![doc = include_str!("../README.md")]
#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives

pub mod diagnostics;
pub mod reporter;
pub mod reporters;

pub use diagnostics::ParseDiagnostic;
pub use reporter::{Reporter, summarize};
pub use reporters::json::JsonReporter;
pub use reporters::pretty::PrettyReporter;
pub use reporters::text::TextReporter;

/// Which reporter the CLI should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterKind {
    Pretty,
    Text,
    Json,
}

impl core::str::FromStr for ReporterKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "unknown reporter '{s}', expected: pretty, text, json"
            )),
        }
    }
}

/// Construct the reporter for `kind`.
pub fn make_reporter(kind: ReporterKind, verbose: bool) -> Box<dyn Reporter> {
    match kind {
        ReporterKind::Pretty => Box::new(PrettyReporter { verbose }),
        ReporterKind::Text => Box::new(TextReporter { verbose }),
        ReporterKind::Json => Box::new(JsonReporter),
    }
}
