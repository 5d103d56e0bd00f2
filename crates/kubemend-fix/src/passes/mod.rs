//! The ordered repair passes.
//!
//! Each pass consumes the full buffer as text and returns the repaired
//! text, appending to the shared [`ChangeLog`](crate::change::ChangeLog).
//! Pass names are part of the public contract; downstream tools group on
//! them.

pub mod ast;
pub mod iterate;
pub mod junk;
pub mod score;
pub mod semantic;
pub mod sweeps;
pub mod syntax;

pub const JUNK_STRIPPING: &str = "Junk Stripping";
pub const SYNTAX_NORMALIZATION: &str = "Syntax Normalization";
pub const AST_RECONSTRUCTION: &str = "AST Reconstruction";
pub const SEMANTIC_VALIDATION: &str = "Semantic Validation";
pub const VALIDATION_ITERATION: &str = "Validation Iteration";
pub const CONFIDENCE_SCORING: &str = "Confidence Scoring";

use crate::scan;

/// Split into owned lines for in-place repair.
pub(crate) fn to_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Rejoin lines, restoring the trailing newline if the input had one.
pub(crate) fn from_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Index of the next line that is neither blank nor a comment.
pub(crate) fn next_content_line(lines: &[String], after: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(after + 1)
        .find(|(_, l)| !scan::is_blank(l) && !scan::is_comment(l))
        .map(|(i, _)| i)
}

/// End of the block that starts below `start`: the first index at or past
/// `start + 1` whose non-blank line is indented at or above `base_indent`.
pub(crate) fn block_end(lines: &[String], start: usize, base_indent: usize) -> usize {
    let mut end = start + 1;
    let mut last_content = start + 1;
    while end < lines.len() {
        if scan::is_blank(&lines[end]) || scan::is_comment(&lines[end]) {
            end += 1;
            continue;
        }
        if scan::indent_of(&lines[end]) > base_indent {
            end += 1;
            last_content = end;
        } else {
            break;
        }
    }
    last_content
}
