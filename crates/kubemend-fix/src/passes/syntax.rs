//! Pass 1: syntax normalization.
//!
//! Line-local repairs that take the text from character soup to something
//! the YAML parser has a fighting chance with: key spelling, missing
//! colons, quoting, spacing, tabs, and canonical indentation for the keys
//! whose position is unambiguous. Block-level sweeps (see
//! [`sweeps`](super::sweeps)) run afterwards on the full buffer.

use std::sync::LazyLock;

use regex::Regex;

use kubemend_knowledge::{
    CHILD_VALUE_PARENTS, FIELD_TYPO_MAP, FORCED_INDENTS, FREEFORM_PARENTS, TOP_LEVEL_REWRITES,
    TYPO_CORRECTIONS, compound_word_number, word_number,
};

use crate::change::{Category, Change, ChangeLog, Severity};
use crate::fuzzy;
use crate::options::FixOptions;
use crate::scan::{self, ContextStack, KeyLine};

use super::{from_lines, next_content_line, sweeps, to_lines};

#[tracing::instrument(skip_all)]
pub fn run(text: &str, opts: &FixOptions, log: &mut ChangeLog) -> String {
    let trailing = text.ends_with('\n');
    let mut lines = to_lines(text);

    // The mask is computed on the raw buffer first: block-scalar content is
    // allowed to contain tabs and must keep them.
    let mask = scan::block_scalar_mask(&lines);
    normalize_tabs(&mut lines, &mask, log);
    apply_line_steps(&mut lines, opts, log);

    sweeps::list_parent_colons(&mut lines, log);
    sweeps::known_parent_colons(&mut lines, log);
    sweeps::env_item_names(&mut lines, log);
    sweeps::dedupe_probe_types(&mut lines, opts, log);
    sweeps::aggressive_parent_colons(&mut lines, log);
    sweeps::annotation_values(&mut lines, log);
    sweeps::wrap_nested_structures(&mut lines, opts, log);

    from_lines(&lines, trailing)
}

/// Record a rewrite of `lines[i]` and apply it.
fn emit(
    lines: &mut [String],
    i: usize,
    new_line: String,
    reason: impl Into<String>,
    severity: Severity,
    confidence: f64,
    log: &mut ChangeLog,
) {
    log.push(Change::new(
        i + 1,
        lines[i].clone(),
        new_line.clone(),
        reason,
        Category::Syntax,
        severity,
        confidence,
    ));
    lines[i] = new_line;
}

/// Tabs are normalized to two spaces before any scanning happens; every
/// other repair step assumes space-only indentation.
fn normalize_tabs(lines: &mut [String], mask: &[bool], log: &mut ChangeLog) {
    for i in 0..lines.len() {
        if !mask[i] && lines[i].contains('\t') {
            let fixed = lines[i].replace('\t', "  ");
            emit(
                lines,
                i,
                fixed,
                "replaced tabs with spaces",
                Severity::Info,
                1.0,
                log,
            );
        }
    }
}

#[allow(clippy::cognitive_complexity)] // a flat list of ordered sub-steps
fn apply_line_steps(lines: &mut Vec<String>, opts: &FixOptions, log: &mut ChangeLog) {
    let mask = scan::block_scalar_mask(lines);
    let mut stack = ContextStack::new();

    for i in 0..lines.len() {
        if mask[i] || scan::is_blank(&lines[i]) || scan::is_comment(&lines[i]) {
            continue;
        }
        if scan::is_doc_separator(&lines[i]) {
            stack.clear();
            continue;
        }

        rewrite_top_level(lines, i, log);
        quote_ambiguous_booleans(lines, i, log);
        force_canonical_indent(lines, i, opts, &stack, log);
        close_unbalanced_quote(lines, i, log);
        fix_key_token(lines, i, &stack, log);
        convert_word_numbers(lines, i, log);
        round_odd_indent(lines, i, log);
        space_after_colon(lines, i, log);
        space_after_dash(lines, i, log);
        normalize_kind_value(lines, i, log);
        bare_key_colon(lines, i, log);
        map_value_colon(lines, i, &stack, log);

        if let Some(parsed) = scan::parse_key_line(&lines[i]) {
            stack.enter(&parsed);
        }
    }
}

// -----------------------------------------------------------------------
// Sub-step 1: top-level field rewrites
// -----------------------------------------------------------------------

fn rewrite_top_level(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    if scan::indent_of(&line) != 0 {
        return;
    }
    let trimmed = line.trim_end();
    for (from, to) in TOP_LEVEL_REWRITES {
        let matches = trimmed
            .get(..from.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(from))
            && trimmed[from.len()..].chars().next().is_none_or(|c| c == ' ');
        if matches {
            let fixed = format!("{to}{}", &trimmed[from.len()..]);
            if fixed != line {
                emit(
                    lines,
                    i,
                    fixed,
                    format!("rewrote top-level field to `{to}`"),
                    Severity::Error,
                    0.95,
                    log,
                );
            }
            return;
        }
    }
}

// -----------------------------------------------------------------------
// Sub-step 2: quote YAML 1.1 boolean literals
// -----------------------------------------------------------------------

static BOOLEANISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:yes|no|on|off)$").expect("static pattern must compile"));

fn quote_ambiguous_booleans(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if !parsed.has_colon {
        return;
    }
    let scalar = scan::value_scalar(parsed.value);
    if !BOOLEANISH.is_match(scalar) {
        return;
    }
    if let Some(fixed) = replace_value(&line, &format!("\"{scalar}\"")) {
        emit(
            lines,
            i,
            fixed,
            format!("quoted `{scalar}` to avoid YAML 1.1 boolean coercion"),
            Severity::Warning,
            0.95,
            log,
        );
    }
}

/// Replace the scalar after the key colon, keeping any trailing comment.
fn replace_value(line: &str, new_value: &str) -> Option<String> {
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

// -----------------------------------------------------------------------
// Sub-step 3: forced indentation for unambiguous keys
// -----------------------------------------------------------------------

fn forced_level(key: &str) -> Option<usize> {
    FORCED_INDENTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, level)| *level)
}

/// Ancestors under which a forced-indent key is legitimately nested; a key
/// below one of these is left where it is.
fn nesting_parents(key: &str) -> &'static [&'static str] {
    match key {
        "apiVersion" | "kind" => &["scaleTargetRef", "ownerReferences", "subjects", "roleRef"],
        "metadata" | "spec" | "replicas" | "selector" | "template" => {
            &["template", "jobTemplate", "volumeClaimTemplates"]
        }
        "type" => &[
            "template",
            "jobTemplate",
            "strategy",
            "updateStrategy",
            "rollingUpdate",
            "seccompProfile",
            "hostPath",
            "metrics",
        ],
        _ => &[],
    }
}

fn force_canonical_indent(
    lines: &mut [String],
    i: usize,
    opts: &FixOptions,
    stack: &ContextStack,
    log: &mut ChangeLog,
) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if parsed.list_item || !parsed.has_colon {
        return;
    }
    let Some(level) = forced_level(parsed.key) else {
        return;
    };
    let target = level * opts.indent_size;
    if parsed.indent == target {
        return;
    }
    // A level-1 key at column zero is deliberately left alone: the AST pass
    // recognizes it there and hoists it; forcing it to column two would
    // graft it under whatever block happens to precede it.
    if level == 1 && parsed.indent == 0 {
        return;
    }
    if nesting_parents(parsed.key).iter().any(|p| stack.has_ancestor(p)) {
        return;
    }
    let fixed = format!("{}{}", " ".repeat(target), line.trim_start());
    emit(
        lines,
        i,
        fixed,
        format!("moved `{}` to its canonical indentation", parsed.key),
        Severity::Warning,
        0.9,
        log,
    );
}

// -----------------------------------------------------------------------
// Sub-step 4: close unbalanced quotes
// -----------------------------------------------------------------------

fn close_unbalanced_quote(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    let scalar = scan::value_scalar(parsed.value);
    let quote = if scalar.starts_with('"') && line.matches('"').count() % 2 == 1 {
        '"'
    } else if scalar.starts_with('\'') && line.matches('\'').count() % 2 == 1 {
        '\''
    } else {
        return;
    };
    let fixed = format!("{}{quote}", line.trim_end());
    emit(
        lines,
        i,
        fixed,
        "closed unbalanced quote",
        Severity::Error,
        0.80,
        log,
    );
}

// -----------------------------------------------------------------------
// Sub-step 5: fuzzy key correction and missing-colon injection
// -----------------------------------------------------------------------

fn identifier_like(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Rebuild a key line with a (possibly corrected) key and a colon.
fn rebuild_key_line(line: &str, parsed: &KeyLine<'_>, key: &str) -> String {
    let content = scan::strip_trailing_comment(line);
    let comment = line[content.len()..].trim_end();
    let scalar = scan::value_scalar(parsed.value);
    let dash = if parsed.list_item { "- " } else { "" };
    let mut out = format!("{}{dash}{key}:", " ".repeat(parsed.indent));
    if !scalar.is_empty() {
        out.push(' ');
        out.push_str(scalar);
    }
    if !comment.is_empty() {
        out.push(' ');
        out.push_str(comment);
    }
    out
}

fn explicit_typo(key: &str) -> Option<&'static str> {
    let norm = fuzzy::normalize(key);
    TYPO_CORRECTIONS
        .get(norm.as_str())
        .or_else(|| FIELD_TYPO_MAP.get(norm.as_str()))
        .copied()
}

#[allow(clippy::cognitive_complexity)]
fn fix_key_token(lines: &mut Vec<String>, i: usize, stack: &ContextStack, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if !identifier_like(parsed.key) {
        return;
    }
    let parent = stack.parent();

    // Children of labels/annotations/data are user-chosen names: no fuzzy
    // rewriting, but a colon-less `word value` pair still gets its colon.
    if parent.is_some_and(|p| FREEFORM_PARENTS.contains(&p)) {
        if !parsed.has_colon && !parsed.value.is_empty() {
            let fixed = rebuild_key_line(&line, &parsed, parsed.key);
            let why = format!("assumed `{}` is a key under `{}`", parsed.key, parent.unwrap_or(""));
            emit(lines, i, fixed, why, Severity::Error, 0.90, log);
        }
        return;
    }

    // Bare tokens only take explicit typo corrections here; the colon comes
    // from bare-key detection or the block sweeps. A bare list item is a
    // scalar sequence entry and is never rewritten.
    if parsed.is_bare() {
        if parsed.list_item {
            return;
        }
        if let Some(canonical) = explicit_typo(parsed.key)
            && canonical != parsed.key
            && next_content_line(lines, i)
                .is_some_and(|j| scan::indent_of(&lines[j]) > parsed.indent)
        {
            let fixed = rebuild_key_line(&line, &parsed, canonical);
            let why = format!("corrected `{}` to `{canonical}`", parsed.key);
            emit(lines, i, fixed, why, Severity::Error, 0.95, log);
        }
        return;
    }

    let canonical = explicit_typo(parsed.key).or_else(|| fuzzy::closest_key(parsed.key));
    match canonical {
        Some(c) if c != parsed.key => {
            let fixed = rebuild_key_line(&line, &parsed, c);
            let why = format!("corrected `{}` to `{c}`", parsed.key);
            emit(lines, i, fixed, why, Severity::Error, 0.95, log);
        }
        Some(c) if !parsed.has_colon => {
            let fixed = rebuild_key_line(&line, &parsed, c);
            let why = format!("inserted missing colon after `{c}`");
            emit(lines, i, fixed, why, Severity::Error, 0.99, log);
        }
        _ => {
            if !parsed.has_colon
                && !parsed.value.is_empty()
                && parent.is_some_and(|p| CHILD_VALUE_PARENTS.contains(&p))
            {
                let fixed = rebuild_key_line(&line, &parsed, parsed.key);
                let why = format!(
                    "assumed `{}` is a key under `{}`",
                    parsed.key,
                    parent.unwrap_or("")
                );
                emit(lines, i, fixed, why, Severity::Error, 0.90, log);
            }
        }
    }
}

// -----------------------------------------------------------------------
// Sub-step 6: English word numbers
// -----------------------------------------------------------------------

static COMPOUND_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:twenty|thirty|forty|fifty|sixty|seventy|eighty|ninety)[ -](?:one|two|three|four|five|six|seven|eight|nine)\b",
    )
    .expect("static pattern must compile")
});

static SIMPLE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:zero|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|thirty|forty|fifty|sixty|seventy|eighty|ninety|hundred|thousand)\b",
    )
    .expect("static pattern must compile")
});

/// Substitute word numbers anywhere on the line, longest match first.
/// Quoted strings are deliberately not exempt; callers relying on a literal
/// `"three"` get a warning-severity change to audit. Matching is
/// lowercase-only so `DEBUG_ONE` style identifiers survive.
fn convert_word_numbers(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let compound = COMPOUND_NUMBER.replace_all(&line, |caps: &regex::Captures<'_>| {
        compound_word_number(&caps[0]).map_or_else(|| caps[0].to_string(), |n| n.to_string())
    });
    let fixed = SIMPLE_NUMBER
        .replace_all(&compound, |caps: &regex::Captures<'_>| {
            word_number(&caps[0]).map_or_else(|| caps[0].to_string(), |n| n.to_string())
        })
        .into_owned();
    if fixed != line {
        emit(
            lines,
            i,
            fixed,
            "converted word number to integer",
            Severity::Warning,
            0.89,
            log,
        );
    }
}

// -----------------------------------------------------------------------
// Sub-step 7: whitespace repairs
// -----------------------------------------------------------------------

fn round_odd_indent(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let indent = scan::indent_of(&line);
    if indent % 2 == 0 {
        return;
    }
    let fixed = format!("{}{}", " ".repeat(indent + 1), line.trim_start());
    emit(
        lines,
        i,
        fixed,
        "rounded odd indentation to the nearest level",
        Severity::Info,
        0.95,
        log,
    );
}

fn space_after_colon(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(pos) = line.find(':') else {
        return;
    };
    // A colon inside a quoted scalar is not a key separator.
    let before = &line[..pos];
    if before.matches('"').count() % 2 == 1 || before.matches('\'').count() % 2 == 1 {
        return;
    }
    let after = &line[pos + 1..];
    // `://` is a URL scheme, not a key separator.
    if after.starts_with("//") {
        return;
    }
    if after
        .chars()
        .next()
        .is_none_or(|c| c == ' ' || c == '#')
    {
        return;
    }
    let fixed = format!("{}: {}", &line[..pos], after);
    emit(
        lines,
        i,
        fixed,
        "inserted space after colon",
        Severity::Error,
        0.98,
        log,
    );
}

fn space_after_dash(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let indent = scan::indent_of(&line);
    let trimmed = &line[indent..];
    let mut chars = trimmed.chars();
    if chars.next() != Some('-') {
        return;
    }
    let Some(next) = chars.next() else {
        return;
    };
    if next == ' ' || next == '-' {
        return;
    }
    // `-1` style scalars are numbers, not squashed list items.
    if trimmed.parse::<f64>().is_ok() {
        return;
    }
    let fixed = format!("{}- {}", " ".repeat(indent), &trimmed[1..]);
    emit(
        lines,
        i,
        fixed,
        "inserted space after list dash",
        Severity::Error,
        0.98,
        log,
    );
}

// -----------------------------------------------------------------------
// Sub-step 8: Kind value normalization
// -----------------------------------------------------------------------

fn normalize_kind_value(lines: &mut [String], i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if parsed.key != "kind" || !parsed.has_colon {
        return;
    }
    let scalar = scan::value_scalar(parsed.value);
    if scalar.is_empty() {
        return;
    }
    if let Some(kind) = fuzzy::closest_kind(scalar)
        && kind != scalar
        && let Some(fixed) = replace_value(&line, kind)
    {
        let why = format!("normalized kind `{scalar}` to `{kind}`");
        emit(lines, i, fixed, why, Severity::Warning, 0.95, log);
    }
}

// -----------------------------------------------------------------------
// Sub-steps 9 and 10: universal colon inference
// -----------------------------------------------------------------------

/// A bare token whose next content line is strictly deeper is a parent
/// missing its colon.
fn bare_key_colon(lines: &mut Vec<String>, i: usize, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if !parsed.is_bare() || parsed.list_item || !identifier_like(parsed.key) {
        return;
    }
    let Some(j) = next_content_line(lines, i) else {
        return;
    };
    if scan::indent_of(&lines[j]) <= parsed.indent {
        return;
    }
    let fixed = format!("{}:", line.trim_end());
    let why = format!("`{}` introduces a block and needs a colon", parsed.key);
    emit(lines, i, fixed, why, Severity::Error, 0.93, log);
}

/// An indented two-token line inside a mapping context becomes `key: value`.
fn map_value_colon(lines: &mut [String], i: usize, stack: &ContextStack, log: &mut ChangeLog) {
    let line = lines[i].clone();
    let Some(parsed) = scan::parse_key_line(&line) else {
        return;
    };
    if parsed.has_colon || parsed.list_item || parsed.value.is_empty() || parsed.indent == 0 {
        return;
    }
    if !identifier_like(parsed.key) || stack.parent().is_none() {
        return;
    }
    // Only a single-token value: longer runs are likely scalar continuations.
    let scalar = scan::value_scalar(parsed.value);
    if scalar.is_empty() || scalar.contains(char::is_whitespace) {
        return;
    }
    let fixed = rebuild_key_line(&line, &parsed, parsed.key);
    let why = format!("assumed `{} {scalar}` is a key/value pair", parsed.key);
    emit(lines, i, fixed, why, Severity::Error, 0.90, log);
}
