//! Pretty reporter: colored change log and miette-rendered diagnostics for
//! anything that stayed unparseable.

use core::time::Duration;
use std::io::IsTerminal;

use ansi_term_styles::{BOLD, DIM, GREEN, RED, RESET, YELLOW};
use kubemend_fix::{FixReport, Severity};
use miette::Report;

use crate::diagnostics::locate_parse_error;
use crate::reporter::{Reporter, summarize};

pub struct PrettyReporter {
    pub verbose: bool,
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => DIM,
    }
}

impl Reporter for PrettyReporter {
    fn report(&mut self, report: &FixReport, elapsed: Duration) {
        let colored = std::io::stderr().is_terminal();

        for change in &report.changes {
            if colored {
                eprintln!(
                    "{}{}{RESET} line {}: {} {DIM}({:.2}){RESET}",
                    severity_color(change.severity),
                    change.severity,
                    change.line,
                    change.reason,
                    change.confidence,
                );
            } else {
                eprintln!(
                    "{} line {}: {} ({:.2})",
                    change.severity, change.line, change.reason, change.confidence
                );
            }
            if self.verbose && !change.original.is_empty() {
                eprintln!("  - {}", change.original.trim_end());
                eprintln!("  + {}", change.fixed.trim_end());
            }
        }

        if !report.is_valid {
            match locate_parse_error("manifest", &report.content) {
                Some(diagnostic) => eprintln!("{:?}", Report::new(diagnostic)),
                None => {
                    for error in &report.errors {
                        eprintln!("error: {error}");
                    }
                }
            }
        }

        let ms = elapsed.as_millis();
        let summary = summarize(report);
        if colored {
            let badge = if report.is_valid {
                format!("{GREEN}valid{RESET}")
            } else {
                format!("{RED}unparseable{RESET}")
            };
            eprintln!("{BOLD}{summary}{RESET} {DIM}in {ms}ms.{RESET} {badge}");
        } else {
            let badge = if report.is_valid { "valid" } else { "unparseable" };
            eprintln!("{summary} in {ms}ms. {badge}");
        }
    }
}
