//! Pass 1 block-level sweeps.
//!
//! Line-local repairs cannot see structure; these sweeps run over the full
//! buffer afterwards, in a fixed order: list-parent colons, known-parent
//! colons, env item naming, probe-type deduplication, aggressive
//! parent-colon inference, annotation values, and nested-structure
//! wrapping.

use std::sync::LazyLock;

use regex::Regex;

use kubemend_knowledge::{NESTED_STRUCTURE_PATTERNS, is_parent_keyword};

use crate::change::{Category, Change, ChangeLog, Severity};
use crate::options::FixOptions;
use crate::scan;

use super::{block_end, next_content_line};

/// Keys that take a single child mapping and routinely appear without their
/// colon.
const SINGLE_CHILD_PARENTS: &[&str] = &[
    "resources",
    "requests",
    "limits",
    "backend",
    "service",
    "preference",
    "valueFrom",
    "secretKeyRef",
    "configMapKeyRef",
    "configMapRef",
    "secretRef",
    "fieldRef",
    "resourceFieldRef",
    "scaleTargetRef",
    "roleRef",
    "httpGet",
    "tcpSocket",
    "grpc",
    "securityContext",
    "emptyDir",
    "hostPath",
    "tls",
];

fn append_colon(
    lines: &mut [String],
    i: usize,
    reason: impl Into<String>,
    confidence: f64,
    log: &mut ChangeLog,
) {
    let fixed = format!("{}:", lines[i].trim_end());
    log.push(Change::new(
        i + 1,
        lines[i].clone(),
        fixed.clone(),
        reason,
        Category::Syntax,
        Severity::Error,
        confidence,
    ));
    lines[i] = fixed;
}

fn bare_key(lines: &[String], mask: &[bool], i: usize) -> Option<(usize, bool, String)> {
    if mask[i] || scan::is_exempt(&lines[i]) {
        return None;
    }
    let parsed = scan::parse_key_line(&lines[i])?;
    if !parsed.is_bare() {
        return None;
    }
    Some((parsed.indent, parsed.list_item, parsed.key.to_string()))
}

// -----------------------------------------------------------------------
// List-parent colons
// -----------------------------------------------------------------------

/// `key` alone on a line, next content line a sequence entry at the same or
/// deeper indent: the key is a list parent missing its colon.
pub(super) fn list_parent_colons(lines: &mut [String], log: &mut ChangeLog) {
    let mask = scan::block_scalar_mask(lines);
    for i in 0..lines.len() {
        let Some((indent, list_item, key)) = bare_key(lines, &mask, i) else {
            continue;
        };
        if list_item || !key.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            continue;
        }
        let Some(j) = next_content_line(lines, i) else {
            continue;
        };
        if scan::is_list_item(lines[j].trim_start()) && scan::indent_of(&lines[j]) >= indent {
            append_colon(
                lines,
                i,
                format!("`{key}` introduces a list and needs a colon"),
                0.95,
                log,
            );
        }
    }
}

// -----------------------------------------------------------------------
// Known-parent colons
// -----------------------------------------------------------------------

/// Nearest enclosing key for the line at `i`, looking upward. For sequence
/// entries the sequence key may sit at the same indent as the dash.
fn enclosing_parent_key(lines: &[String], i: usize) -> Option<String> {
    let my_indent = scan::indent_of(&lines[i]);
    let is_item = scan::is_list_item(lines[i].trim_start());
    for j in (0..i).rev() {
        let line = &lines[j];
        if scan::is_blank(line) || scan::is_comment(line) {
            continue;
        }
        if scan::is_doc_separator(line) {
            return None;
        }
        let Some(parsed) = scan::parse_key_line(line) else {
            continue;
        };
        if parsed.list_item {
            continue;
        }
        if parsed.indent < my_indent || (is_item && parsed.indent <= my_indent && parsed.has_colon)
        {
            return Some(parsed.key.to_string());
        }
    }
    None
}

/// Bare occurrences of single-child parents (`requests`, `backend`,
/// `secretKeyRef`, ...) followed by a deeper block, plus the
/// `- metadata` / `- spec` items of `volumeClaimTemplates`.
pub(super) fn known_parent_colons(lines: &mut [String], log: &mut ChangeLog) {
    let mask = scan::block_scalar_mask(lines);
    for i in 0..lines.len() {
        let Some((indent, list_item, key)) = bare_key(lines, &mask, i) else {
            continue;
        };
        let Some(j) = next_content_line(lines, i) else {
            continue;
        };
        if scan::indent_of(&lines[j]) <= indent {
            continue;
        }
        if !list_item && SINGLE_CHILD_PARENTS.contains(&key.as_str()) {
            append_colon(
                lines,
                i,
                format!("`{key}` takes a nested block and needs a colon"),
                0.95,
                log,
            );
        } else if list_item
            && matches!(key.as_str(), "metadata" | "spec")
            && enclosing_parent_key(lines, i).as_deref() == Some("volumeClaimTemplates")
        {
            append_colon(
                lines,
                i,
                format!("volume claim template `{key}` needs a colon"),
                0.95,
                log,
            );
        }
    }
}

// -----------------------------------------------------------------------
// Env item naming
// -----------------------------------------------------------------------

static UPPER_SNAKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("static pattern must compile"));

/// In an `env:` block, a sequence entry whose only content is an
/// `UPPER_SNAKE` token followed by a `value:`/`valueFrom:` line is an
/// environment variable missing its `name:` key.
pub(super) fn env_item_names(lines: &mut [String], log: &mut ChangeLog) {
    let mask = scan::block_scalar_mask(lines);
    for i in 0..lines.len() {
        if mask[i] {
            continue;
        }
        let Some(parsed) = scan::parse_key_line(&lines[i]) else {
            continue;
        };
        if parsed.key != "env" || !parsed.has_colon || !parsed.value.is_empty() {
            continue;
        }
        let env_indent = parsed.indent;
        let end = env_block_end(lines, i, env_indent);
        for j in i + 1..end {
            rename_env_item(lines, j, log);
        }
    }
}

/// An env block extends through sequence entries at the env key's indent or
/// deeper.
fn env_block_end(lines: &[String], start: usize, env_indent: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() {
        let line = &lines[end];
        if scan::is_blank(line) || scan::is_comment(line) {
            end += 1;
            continue;
        }
        let indent = scan::indent_of(line);
        let deeper = indent > env_indent;
        let item_at_key = indent >= env_indent && scan::is_list_item(line.trim_start());
        if deeper || item_at_key {
            end += 1;
        } else {
            break;
        }
    }
    end
}

fn rename_env_item(lines: &mut [String], j: usize, log: &mut ChangeLog) {
    let Some(parsed) = scan::parse_key_line(&lines[j]) else {
        return;
    };
    if !parsed.list_item || !parsed.is_bare() || !UPPER_SNAKE.is_match(parsed.key) {
        return;
    }
    let Some(k) = next_content_line(lines, j) else {
        return;
    };
    let Some(next) = scan::parse_key_line(&lines[k]) else {
        return;
    };
    if !matches!(next.key, "value" | "valueFrom") || !next.has_colon {
        return;
    }
    let fixed = format!("{}- name: {}", " ".repeat(parsed.indent), parsed.key);
    log.push(Change::new(
        j + 1,
        lines[j].clone(),
        fixed.clone(),
        format!("named bare env entry `{}`", parsed.key),
        Category::Syntax,
        Severity::Error,
        0.95,
    ));
    lines[j] = fixed;
}

// -----------------------------------------------------------------------
// Probe-type deduplication
// -----------------------------------------------------------------------

const PROBE_KEYS: &[&str] = &["livenessProbe", "readinessProbe", "startupProbe"];

fn handler_priority(key: &str) -> u8 {
    match key {
        "exec" => 4,
        "httpGet" => 3,
        "tcpSocket" => 2,
        "grpc" => 1,
        _ => 0,
    }
}

struct Handler {
    start: usize,
    end: usize,
    key: String,
    has_children: bool,
}

/// Exactly one of `httpGet`/`tcpSocket`/`exec`/`grpc` is legal per probe.
/// Competing declarations are ranked (children first, then handler
/// priority, then later occurrence) and the losers removed wholesale.
pub(super) fn dedupe_probe_types(lines: &mut Vec<String>, opts: &FixOptions, log: &mut ChangeLog) {
    let mut i = 0;
    let mut mask = scan::block_scalar_mask(lines);
    while i < lines.len() {
        if mask[i] {
            i += 1;
            continue;
        }
        let Some(parsed) = scan::parse_key_line(&lines[i]) else {
            i += 1;
            continue;
        };
        if !PROBE_KEYS.contains(&parsed.key) {
            i += 1;
            continue;
        }
        let probe_col = parsed.key_column();
        let end = block_end(lines, i, probe_col);
        let handlers = collect_handlers(lines, i, end, probe_col);
        if handlers.len() < 2 {
            i = end.max(i + 1);
            continue;
        }
        i = resolve_probe_conflict(lines, i, handlers, opts, log);
        mask = scan::block_scalar_mask(lines);
    }
}

fn collect_handlers(lines: &[String], start: usize, end: usize, probe_col: usize) -> Vec<Handler> {
    let child_indent = (start + 1..end)
        .filter(|&j| !scan::is_blank(&lines[j]) && !scan::is_comment(&lines[j]))
        .map(|j| scan::indent_of(&lines[j]))
        .min();
    let Some(child_indent) = child_indent else {
        return Vec::new();
    };
    if child_indent <= probe_col {
        return Vec::new();
    }

    let mut handlers = Vec::new();
    let mut j = start + 1;
    while j < end {
        let line = &lines[j];
        if scan::is_blank(line) || scan::is_comment(line) || scan::indent_of(line) != child_indent {
            j += 1;
            continue;
        }
        let Some(parsed) = scan::parse_key_line(line) else {
            j += 1;
            continue;
        };
        if handler_priority(parsed.key) == 0 {
            j += 1;
            continue;
        }
        let sub_end = block_end(lines, j, child_indent).min(end);
        handlers.push(Handler {
            start: j,
            end: sub_end,
            key: parsed.key.to_string(),
            has_children: sub_end > j + 1,
        });
        j = sub_end.max(j + 1);
    }
    handlers
}

fn resolve_probe_conflict(
    lines: &mut Vec<String>,
    probe_idx: usize,
    mut handlers: Vec<Handler>,
    opts: &FixOptions,
    log: &mut ChangeLog,
) -> usize {
    // Ranked best-first: children beat no children, then handler priority,
    // then the later declaration.
    handlers.sort_by(|a, b| {
        b.has_children
            .cmp(&a.has_children)
            .then_with(|| handler_priority(&b.key).cmp(&handler_priority(&a.key)))
            .then_with(|| b.start.cmp(&a.start))
    });
    let winner = handlers.remove(0);

    for loser in &handlers {
        log.push(Change::removal(
            loser.start + 1,
            lines[loser.start].clone(),
            format!(
                "removed conflicting probe handler `{}` in favor of `{}`",
                loser.key, winner.key
            ),
            Category::Structure,
            Severity::Warning,
            0.85,
        ));
    }

    // Normalize the winner before deletions shift anything: a colon on its
    // declaration and children at exactly winner-indent + indent_size.
    let winner_indent = scan::indent_of(&lines[winner.start]);
    if scan::parse_key_line(&lines[winner.start]).is_some_and(|p| !p.has_colon) {
        let fixed = format!("{}:", lines[winner.start].trim_end());
        lines[winner.start] = fixed;
    }
    if winner.has_children {
        let first_child_indent = (winner.start + 1..winner.end)
            .find(|&j| !scan::is_blank(&lines[j]) && !scan::is_comment(&lines[j]))
            .map(|j| scan::indent_of(&lines[j]));
        if let Some(current) = first_child_indent {
            let target = winner_indent + opts.indent_size;
            reindent_block(lines, winner.start + 1, winner.end, current, target);
        }
    }

    // Delete loser blocks back to front so earlier ranges stay valid.
    let mut ranges: Vec<(usize, usize)> = handlers.iter().map(|h| (h.start, h.end)).collect();
    ranges.sort_by(|a, b| b.0.cmp(&a.0));
    for (start, end) in ranges {
        lines.drain(start..end);
    }

    probe_idx + 1
}

/// Shift every line in `[start, end)` by the indent delta implied by moving
/// `current` to `target`, preserving relative depth.
fn reindent_block(lines: &mut [String], start: usize, end: usize, current: usize, target: usize) {
    for line in lines.iter_mut().take(end).skip(start) {
        if scan::is_blank(line) {
            continue;
        }
        let indent = scan::indent_of(line);
        let shifted = if target >= current {
            indent + (target - current)
        } else {
            indent.saturating_sub(current - target)
        };
        *line = format!("{}{}", " ".repeat(shifted), line.trim_start());
    }
}

// -----------------------------------------------------------------------
// Aggressive parent-colon inference
// -----------------------------------------------------------------------

/// Up to three sweeps: any bare word followed by a strictly deeper block is
/// assumed to be a parent missing its colon. Known parent keywords score
/// higher than arbitrary words.
pub(super) fn aggressive_parent_colons(lines: &mut [String], log: &mut ChangeLog) {
    for _ in 0..3 {
        let mask = scan::block_scalar_mask(lines);
        let mut changed = false;
        for i in 0..lines.len() {
            let Some((indent, list_item, key)) = bare_key(lines, &mask, i) else {
                continue;
            };
            if list_item || !key.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            let Some(j) = next_content_line(lines, i) else {
                continue;
            };
            if scan::indent_of(&lines[j]) <= indent {
                continue;
            }
            let confidence = if is_parent_keyword(&key) { 0.92 } else { 0.85 };
            append_colon(
                lines,
                i,
                format!("`{key}` is followed by a nested block"),
                confidence,
                log,
            );
            changed = true;
        }
        if !changed {
            break;
        }
    }
}

// -----------------------------------------------------------------------
// Annotation values
// -----------------------------------------------------------------------

/// Inside `metadata.annotations`, `k8s.io/foo value` lines become
/// `k8s.io/foo: value`.
pub(super) fn annotation_values(lines: &mut [String], log: &mut ChangeLog) {
    let mask = scan::block_scalar_mask(lines);
    for i in 0..lines.len() {
        if mask[i] {
            continue;
        }
        let Some(parsed) = scan::parse_key_line(&lines[i]) else {
            continue;
        };
        if parsed.key != "annotations" || !parsed.has_colon || !parsed.value.is_empty() {
            continue;
        }
        let end = block_end(lines, i, parsed.indent);
        for j in i + 1..end {
            if mask[j] {
                continue;
            }
            fix_annotation_line(lines, j, log);
        }
    }
}

fn fix_annotation_line(lines: &mut [String], j: usize, log: &mut ChangeLog) {
    let Some(parsed) = scan::parse_key_line(&lines[j]) else {
        return;
    };
    if parsed.has_colon || parsed.list_item || parsed.value.is_empty() {
        return;
    }
    if !parsed.key.contains('/') && !parsed.key.contains('.') {
        return;
    }
    let fixed = format!(
        "{}{}: {}",
        " ".repeat(parsed.indent),
        parsed.key,
        parsed.value
    );
    log.push(Change::new(
        j + 1,
        lines[j].clone(),
        fixed.clone(),
        format!("assumed `{}` is an annotation key", parsed.key),
        Category::Syntax,
        Severity::Error,
        0.90,
    ));
    lines[j] = fixed;
}

// -----------------------------------------------------------------------
// Nested-structure wrapping
// -----------------------------------------------------------------------

/// Regroup direct children under a missing intermediate wrapper
/// (`path`/`port` under a probe belong inside `httpGet`).
pub(super) fn wrap_nested_structures(
    lines: &mut Vec<String>,
    opts: &FixOptions,
    log: &mut ChangeLog,
) {
    for pattern in NESTED_STRUCTURE_PATTERNS.iter() {
        if pattern.aggressive_only && !opts.aggressive {
            continue;
        }
        let mut i = 0;
        let mut mask = scan::block_scalar_mask(lines);
        while i < lines.len() {
            if mask[i] || !parent_matches(lines, i, &pattern.parent) {
                i += 1;
                continue;
            }
            let parent_col = scan::parse_key_line(&lines[i])
                .map(|p| p.key_column())
                .unwrap_or(0);
            let end = block_end(lines, i, parent_col);
            let before = lines.len();
            i = apply_wrap(lines, i, end, parent_col, pattern, opts, log);
            if lines.len() != before {
                mask = scan::block_scalar_mask(lines);
            }
        }
    }
}

fn parent_matches(lines: &[String], i: usize, parent: &Regex) -> bool {
    scan::parse_key_line(&lines[i])
        .is_some_and(|p| p.has_colon && p.value.is_empty() && parent.is_match(p.key))
}

fn apply_wrap(
    lines: &mut Vec<String>,
    start: usize,
    end: usize,
    parent_col: usize,
    pattern: &kubemend_knowledge::WrapPattern,
    opts: &FixOptions,
    log: &mut ChangeLog,
) -> usize {
    let child_indent = (start + 1..end)
        .filter(|&j| !scan::is_blank(&lines[j]) && !scan::is_comment(&lines[j]))
        .map(|j| scan::indent_of(&lines[j]))
        .min();
    let Some(child_indent) = child_indent else {
        return end.max(start + 1);
    };

    // Direct children, and whether the wrapper already exists among them.
    let mut matched: Vec<(usize, usize)> = Vec::new();
    let mut j = start + 1;
    while j < end {
        let line = &lines[j];
        if scan::is_blank(line) || scan::is_comment(line) || scan::indent_of(line) != child_indent {
            j += 1;
            continue;
        }
        let Some(parsed) = scan::parse_key_line(line) else {
            j += 1;
            continue;
        };
        if parsed.key == pattern.wrapper {
            return end.max(start + 1);
        }
        let sub_end = block_end(lines, j, child_indent).min(end);
        if pattern.child.is_match(parsed.key) {
            matched.push((j, sub_end));
        }
        j = sub_end.max(j + 1);
    }
    if matched.is_empty() {
        return end.max(start + 1);
    }

    // Detach the matched blocks, deepest index first.
    let mut moved: Vec<String> = Vec::new();
    let insert_at = matched[0].0;
    for (block_start, block_endx) in matched.iter().rev() {
        let drained: Vec<String> = lines.drain(*block_start..*block_endx).collect();
        moved.splice(0..0, drained);
    }

    // Re-indent the moved children one level below the new wrapper.
    let wrapper_indent = parent_col + opts.indent_size;
    let target = wrapper_indent + opts.indent_size;
    let moved_len = moved.len();
    reindent_block(&mut moved, 0, moved_len, child_indent, target);

    let wrapper_line = format!("{}{}:", " ".repeat(wrapper_indent), pattern.wrapper);
    log.push(Change::new(
        insert_at + 1,
        String::new(),
        wrapper_line.clone(),
        format!("grouped stray fields under `{}`", pattern.wrapper),
        Category::Structure,
        Severity::Error,
        0.85,
    ));

    let mut insertion = vec![wrapper_line];
    insertion.extend(moved);
    let inserted = insertion.len();
    lines.splice(insert_at..insert_at, insertion);

    end + inserted - matched.iter().map(|(s, e)| e - s).sum::<usize>() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::syntax;

    fn fix(text: &str) -> (String, Vec<Change>) {
        let mut log = ChangeLog::new();
        let out = syntax::run(text, &FixOptions::default(), &mut log);
        (out, log.into_changes())
    }

    #[test]
    fn list_parent_gains_colon_at_same_indent() {
        let (out, _) = fix("tolerations\n- key: dedicated\n");
        assert_eq!(out, "tolerations:\n- key: dedicated\n");
    }

    #[test]
    fn known_single_child_parent_gains_colon() {
        let (out, _) = fix("resources:\n  limits\n    cpu: 500m\n");
        assert_eq!(out, "resources:\n  limits:\n    cpu: 500m\n");
    }

    #[test]
    fn volume_claim_template_items_gain_colons() {
        let text = "volumeClaimTemplates:\n- metadata\n    name: data\n";
        let (out, _) = fix(text);
        assert!(out.contains("- metadata:\n"));
    }

    #[test]
    fn env_shorthand_scenario() {
        let (out, _) = fix("env:\n  - DEBUG\n    value: \"true\"\n");
        assert_eq!(out, "env:\n  - name: DEBUG\n    value: \"true\"\n");
    }

    #[test]
    fn env_shorthand_requires_value_sibling() {
        let (out, _) = fix("env:\n  - DEBUG\n");
        assert_eq!(out, "env:\n  - DEBUG\n");
    }

    #[test]
    fn probe_conflict_keeps_http_get() {
        let text = "livenessProbe:\n  httpGet:\n    path: /\n    port: 8080\n  tcpSocket:\n    port: 8080\n";
        let (out, changes) = fix(text);
        assert_eq!(out, "livenessProbe:\n  httpGet:\n    path: /\n    port: 8080\n");
        let removals: Vec<_> = changes
            .iter()
            .filter(|c| c.fixed == crate::change::REMOVED)
            .collect();
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].category, Category::Structure);
        assert_eq!(removals[0].severity, Severity::Warning);
    }

    #[test]
    fn probe_conflict_prefers_exec_over_http_get() {
        let text = "livenessProbe:\n  httpGet:\n    path: /\n  exec:\n    command: [ls]\n";
        let (out, _) = fix(text);
        assert!(out.contains("exec:"));
        assert!(!out.contains("httpGet:"));
    }

    #[test]
    fn probe_handler_with_children_beats_bare_one() {
        let text = "readinessProbe:\n  exec:\n  httpGet:\n    path: /healthz\n    port: 8080\n";
        let (out, _) = fix(text);
        assert!(out.contains("httpGet:"));
        assert!(!out.contains("exec"));
    }

    #[test]
    fn aggressive_sweep_scores_parent_keywords_higher() {
        let (out, changes) = fix("securityContext\n  runAsUser: 1000\n");
        assert_eq!(out, "securityContext:\n  runAsUser: 1000\n");
        assert!(
            changes
                .iter()
                .any(|c| (c.confidence - 0.93).abs() < f64::EPSILON
                    || (c.confidence - 0.92).abs() < f64::EPSILON)
        );
    }

    #[test]
    fn annotation_values_gain_colons() {
        let text = "metadata:\n  annotations:\n    prometheus.io/scrape true\n";
        let (out, _) = fix(text);
        assert!(out.contains("prometheus.io/scrape: true\n"));
    }

    #[test]
    fn probe_fields_are_wrapped_under_http_get() {
        let text = "livenessProbe:\n  path: /healthz\n  port: 8080\n  initialDelaySeconds: 5\n";
        let (out, changes) = fix(text);
        assert_eq!(
            out,
            "livenessProbe:\n  httpGet:\n    path: /healthz\n    port: 8080\n  initialDelaySeconds: 5\n"
        );
        assert!(changes.iter().any(|c| c.fixed.contains("httpGet:")));
    }

    #[test]
    fn existing_wrapper_blocks_rewrap() {
        let text = "livenessProbe:\n  httpGet:\n    path: /\n    port: 80\n";
        let (out, changes) = fix(text);
        assert_eq!(out, text);
        assert!(changes.is_empty());
    }

    #[test]
    fn value_from_wrap_needs_aggressive_mode() {
        let text = "valueFrom:\n  key: password\n";
        let (out, _) = fix(text);
        assert_eq!(out, text);

        let mut log = ChangeLog::new();
        let opts = FixOptions {
            aggressive: true,
            ..FixOptions::default()
        };
        let aggressive_out = syntax::run(text, &opts, &mut log);
        assert_eq!(
            aggressive_out,
            "valueFrom:\n  secretKeyRef:\n    key: password\n"
        );
    }
}
