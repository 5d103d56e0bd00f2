//! Pass 4: validation iteration.
//!
//! Parse, read the error's location, apply one targeted fix, repeat. The
//! loop is bounded by `max_iterations` and stops early as soon as the
//! buffer parses or no fix pattern applies.

use serde::Deserialize;
use serde_yaml::Value;

use crate::change::{Category, Change, ChangeLog, Severity};
use crate::options::FixOptions;
use crate::scan;

use super::{from_lines, to_lines};

#[tracing::instrument(skip_all)]
pub fn run(text: &str, opts: &FixOptions, log: &mut ChangeLog) -> String {
    let trailing = text.ends_with('\n');
    let mut current = text.to_string();

    for iteration in 0..opts.max_iterations {
        let Some(error) = first_parse_error(&current) else {
            return current;
        };
        let Some(location) = error.location() else {
            break;
        };
        let message = error.to_string();
        tracing::debug!(iteration, line = location.line(), %message, "targeted repair");

        let mut lines = to_lines(&current);
        if lines.is_empty() {
            break;
        }
        // End-of-stream errors point one past the last line; clamp.
        let line_idx = location.line().saturating_sub(1).min(lines.len() - 1);
        if !apply_error_fix(&mut lines, line_idx, &message, log) {
            break;
        }
        current = from_lines(&lines, trailing);
    }
    current
}

fn first_parse_error(text: &str) -> Option<serde_yaml::Error> {
    for doc in serde_yaml::Deserializer::from_str(text) {
        if let Err(e) = Value::deserialize(doc) {
            return Some(e);
        }
    }
    None
}

/// Apply one pattern-driven fix at the error line. Returns `false` when no
/// pattern matches, which ends the iteration.
fn apply_error_fix(
    lines: &mut [String],
    line_idx: usize,
    message: &str,
    log: &mut ChangeLog,
) -> bool {
    if message.contains("block end") || message.contains("did not find expected") {
        return reindent_under_previous(lines, line_idx, log);
    }
    if message.contains("mapping values are not allowed") {
        return insert_space_after_colon(lines, line_idx, log);
    }
    if message.contains("unexpected end") {
        return close_quote(lines, line_idx, log);
    }
    false
}

/// A line shallower than its predecessor, mid-block: pull it under the
/// previous line.
fn reindent_under_previous(lines: &mut [String], line_idx: usize, log: &mut ChangeLog) -> bool {
    let line = lines[line_idx].clone();
    if scan::is_exempt(&line) || scan::is_list_item(line.trim_start()) {
        return false;
    }
    let prev_indent = (0..line_idx)
        .rev()
        .find(|&j| !scan::is_blank(&lines[j]) && !scan::is_comment(&lines[j]))
        .map(|j| scan::indent_of(&lines[j]));
    let Some(prev_indent) = prev_indent else {
        return false;
    };
    if scan::indent_of(&line) >= prev_indent {
        return false;
    }
    let fixed = format!("{}{}", " ".repeat(prev_indent + 2), line.trim_start());
    push_fix(lines, line_idx, fixed, "re-indented line under its block", log);
    true
}

fn insert_space_after_colon(lines: &mut [String], line_idx: usize, log: &mut ChangeLog) -> bool {
    let line = lines[line_idx].clone();
    let Some(pos) = line.find(':') else {
        return false;
    };
    let after = &line[pos + 1..];
    if after.is_empty() || after.starts_with(' ') {
        return false;
    }
    let fixed = format!("{}: {}", &line[..pos], after);
    push_fix(lines, line_idx, fixed, "inserted space after colon", log);
    true
}

fn close_quote(lines: &mut [String], line_idx: usize, log: &mut ChangeLog) -> bool {
    // The stream often ends because a quote on an earlier line never
    // closed; scan backwards for the first unbalanced line.
    for j in (0..=line_idx.min(lines.len() - 1)).rev() {
        let line = lines[j].clone();
        let quote = if line.matches('"').count() % 2 == 1 {
            '"'
        } else if line.matches('\'').count() % 2 == 1 {
            '\''
        } else {
            continue;
        };
        let fixed = format!("{}{quote}", line.trim_end());
        push_fix(lines, j, fixed, "closed unbalanced quote", log);
        return true;
    }
    false
}

fn push_fix(
    lines: &mut [String],
    i: usize,
    fixed: String,
    reason: &str,
    log: &mut ChangeLog,
) {
    log.push(Change::new(
        i + 1,
        lines[i].clone(),
        fixed.clone(),
        reason,
        Category::Syntax,
        Severity::Error,
        0.75,
    ));
    lines[i] = fixed;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(text: &str) -> (String, usize) {
        let mut log = ChangeLog::new();
        let out = run(text, &FixOptions::default(), &mut log);
        (out, log.len())
    }

    fn parses(text: &str) -> bool {
        first_parse_error(text).is_none()
    }

    #[test]
    fn valid_input_is_untouched() {
        let text = "kind: Pod\nmetadata:\n  name: x\n";
        let (out, n) = fix(text);
        assert_eq!(out, text);
        assert_eq!(n, 0);
    }

    #[test]
    fn unclosed_quote_is_repaired() {
        let (out, n) = fix("metadata:\n  name: \"broken\n");
        assert!(parses(&out), "still broken: {out}");
        assert!(n >= 1);
    }

    #[test]
    fn colon_fix_pattern_applies() {
        let mut lines = vec!["  name:x".to_string()];
        let mut log = ChangeLog::new();
        assert!(apply_error_fix(
            &mut lines,
            0,
            "mapping values are not allowed in this context",
            &mut log,
        ));
        assert_eq!(lines[0], "  name: x");
    }

    #[test]
    fn block_end_pattern_reindents_shallow_line() {
        let mut lines = vec!["    image: nginx".to_string(), "  ports: []".to_string()];
        let mut log = ChangeLog::new();
        assert!(apply_error_fix(&mut lines, 1, "expected <block end>", &mut log));
        assert_eq!(lines[1], "      ports: []");
    }

    #[test]
    fn unknown_error_pattern_gives_up() {
        let mut lines = vec!["key: [a, b".to_string()];
        let mut log = ChangeLog::new();
        assert!(!apply_error_fix(&mut lines, 0, "something inscrutable", &mut log));
        assert!(log.is_empty());
    }

    #[test]
    fn iteration_is_bounded() {
        let opts = FixOptions {
            max_iterations: 2,
            ..FixOptions::default()
        };
        let mut log = ChangeLog::new();
        // Flow-sequence garbage no pattern can fix: the loop must give up.
        let text = "key: [a, b\nother: [c, d\n";
        let out = run(text, &opts, &mut log);
        assert!(log.len() <= 2, "applied too many fixes");
        let _ = out;
    }
}
