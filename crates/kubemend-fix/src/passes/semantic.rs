//! Pass 3: semantic validation.
//!
//! Type-aware line repairs that need the parseable baseline passes 1 and 2
//! established: numeric and boolean coercion for the fields whose types
//! are known, numeric inference from key-name patterns, late colon
//! inference inside list items, and duplicate-key removal.

use std::collections::HashSet;

use kubemend_knowledge::{
    boolean_for, compound_word_number, is_boolean_field, is_numeric_field,
    matches_numeric_pattern, word_number,
};

use crate::change::{Category, Change, ChangeLog, Severity};
use crate::scan::{self, ContextStack};

use super::{block_end, from_lines, to_lines};

/// Parents whose children are scalar list entries (`command`, `args`, RBAC
/// verbs). `- word value` under these is a scalar, not a pair missing its
/// colon.
const SCALAR_LIST_PARENTS: &[&str] = &[
    "command",
    "args",
    "accessModes",
    "finalizers",
    "verbs",
    "apiGroups",
    "resourceNames",
    "policyTypes",
    "hosts",
    "values",
];

#[tracing::instrument(skip_all)]
pub fn run(text: &str, log: &mut ChangeLog) -> String {
    let trailing = text.ends_with('\n');
    let mut lines = to_lines(text);

    let mask = scan::block_scalar_mask(&lines);
    let mut stack = ContextStack::new();
    for i in 0..lines.len() {
        if mask[i] || scan::is_blank(&lines[i]) || scan::is_comment(&lines[i]) {
            continue;
        }
        if scan::is_doc_separator(&lines[i]) {
            stack.clear();
            continue;
        }

        infer_nested_colon(&mut lines, i, &stack, log);
        coerce_typed_fields(&mut lines, i, log);

        if let Some(parsed) = scan::parse_key_line(&lines[i]) {
            stack.enter(&parsed);
        }
    }

    remove_duplicate_keys(&mut lines, log);
    from_lines(&lines, trailing)
}

// -----------------------------------------------------------------------
// Nested colon inference
// -----------------------------------------------------------------------

fn identifier_like(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// An indented `word value` (or `- word value` inside a list item) with a
/// single-token value becomes a key/value pair.
fn infer_nested_colon(lines: &mut [String], i: usize, stack: &ContextStack, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if parsed.has_colon || parsed.value.is_empty() || !identifier_like(parsed.key) {
        return;
    }
    if !parsed.list_item && parsed.indent == 0 {
        return;
    }
    if stack
        .parent()
        .is_some_and(|p| SCALAR_LIST_PARENTS.contains(&p))
    {
        return;
    }
    let scalar = scan::value_scalar(parsed.value);
    if scalar.is_empty() || scalar.contains(char::is_whitespace) {
        return;
    }
    let dash = if parsed.list_item { "- " } else { "" };
    let fixed = format!("{}{dash}{}: {scalar}", " ".repeat(parsed.indent), parsed.key);
    log.push(Change::new(
        i + 1,
        line.clone(),
        fixed.clone(),
        format!("assumed `{} {scalar}` is a key/value pair", parsed.key),
        Category::Semantic,
        Severity::Error,
        0.9,
    ));
    lines[i] = fixed;
}

// -----------------------------------------------------------------------
// Typed coercion
// -----------------------------------------------------------------------

/// Strip one layer of matching quotes.
fn unquoted(scalar: &str) -> Option<&str> {
    scalar
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| scalar.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
}

fn as_integer(scalar: &str) -> Option<u64> {
    let bare = unquoted(scalar).unwrap_or(scalar);
    if !bare.is_empty() && bare.chars().all(|c| c.is_ascii_digit()) {
        // Only quoted integers and word numbers are coercions; a bare
        // integer is already the right type.
        if unquoted(scalar).is_some() {
            return bare.parse().ok();
        }
        return None;
    }
    compound_word_number(bare).or_else(|| word_number(bare))
}

fn replace_scalar(line: &str, new_value: &str) -> Option<String> {
    let content = scan::strip_trailing_comment(line);
    let comment = line[content.len()..].trim_end();
    let colon = content.find(':')?;
    let mut out = format!("{} {new_value}", &content[..=colon]);
    if !comment.is_empty() {
        out.push(' ');
        out.push_str(comment);
    }
    Some(out)
}

fn coerce_typed_fields(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if !parsed.has_colon {
        return;
    }
    let scalar = scan::value_scalar(parsed.value);
    if scalar.is_empty() {
        return;
    }

    if is_numeric_field(parsed.key) {
        coerce_numeric(lines, i, &line, parsed.key, scalar, 0.95, log);
        return;
    }
    if is_boolean_field(parsed.key) {
        coerce_boolean(lines, i, &line, parsed.key, scalar, log);
        return;
    }
    if matches_numeric_pattern(parsed.key) {
        coerce_numeric(lines, i, &line, parsed.key, scalar, 0.9, log);
    }
}

fn coerce_numeric(
    lines: &mut [String],
    i: usize,
    line: &str,
    key: &str,
    scalar: &str,
    confidence: f64,
    log: &mut ChangeLog,
) {
    let Some(n) = as_integer(scalar) else {
        return;
    };
    if let Some(fixed) = replace_scalar(line, &n.to_string()) {
        log.push(Change::new(
            i + 1,
            line.to_string(),
            fixed.clone(),
            format!("`{key}` takes an integer"),
            Category::Type,
            Severity::Warning,
            confidence,
        ));
        lines[i] = fixed;
    }
}

fn coerce_boolean(
    lines: &mut [String],
    i: usize,
    line: &str,
    key: &str,
    scalar: &str,
    log: &mut ChangeLog,
) {
    let bare = unquoted(scalar).unwrap_or(scalar);
    let Some(value) = boolean_for(bare) else {
        return;
    };
    let canonical = if value { "true" } else { "false" };
    if scalar == canonical {
        return;
    }
    if let Some(fixed) = replace_scalar(line, canonical) {
        log.push(Change::new(
            i + 1,
            line.to_string(),
            fixed.clone(),
            format!("`{key}` takes a boolean"),
            Category::Type,
            Severity::Warning,
            0.95,
        ));
        lines[i] = fixed;
    }
}

// -----------------------------------------------------------------------
// Duplicate-key removal
// -----------------------------------------------------------------------

struct Level {
    column: usize,
    keys: HashSet<String>,
}

/// Walk with a stack of per-indent key sets; the second occurrence of a key
/// at the same level is removed together with its descendants. `---`
/// resets the stack and a new list item clears its level.
fn remove_duplicate_keys(lines: &mut Vec<String>, log: &mut ChangeLog) {
    let mask = scan::block_scalar_mask(lines);
    let mut levels: Vec<Level> = Vec::new();
    let mut doomed: Vec<(usize, usize)> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        if mask[i] || scan::is_blank(line) || scan::is_comment(line) {
            i += 1;
            continue;
        }
        if scan::is_doc_separator(line) {
            levels.clear();
            i += 1;
            continue;
        }
        let Some(parsed) = scan::parse_key_line(line) else {
            i += 1;
            continue;
        };
        let column = parsed.key_column();

        if parsed.list_item {
            // A fresh sequence entry restarts the key namespace at its level.
            levels.retain(|l| l.column < column);
        } else {
            levels.retain(|l| l.column <= column);
        }
        if levels.last().is_none_or(|l| l.column < column) {
            levels.push(Level {
                column,
                keys: HashSet::new(),
            });
        }

        let level = levels.last_mut().expect("level was just ensured");
        if level.column == column && !level.keys.insert(parsed.key.to_string()) {
            let end = block_end(lines, i, column);
            log.push(Change::removal(
                i + 1,
                line.clone(),
                format!("removed duplicate key `{}`", parsed.key),
                Category::Semantic,
                Severity::Warning,
                0.9,
            ));
            doomed.push((i, end.max(i + 1)));
            i = end.max(i + 1);
            continue;
        }
        i += 1;
    }

    for (start, end) in doomed.into_iter().rev() {
        lines.drain(start..end);
    }
}
