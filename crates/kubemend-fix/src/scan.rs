//! Line-level scanning utilities shared by the text passes.
//!
//! Everything here works on the buffer as a slice of lines. Indentation is
//! the count of leading spaces; tabs are normalized away before any of
//! these helpers run.

use std::sync::LazyLock;

use regex::Regex;

/// Leading-space count of a line.
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// `true` when the first non-blank character is `#`.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// `true` for `---` and `...` document markers (with or without trailing
/// content after `--- `).
pub fn is_doc_separator(line: &str) -> bool {
    let trimmed = line.trim_end();
    trimmed == "---" || trimmed == "..." || trimmed.starts_with("--- ")
}

/// `true` when the trimmed line is a sequence entry (`- item` or a bare `-`).
pub fn is_list_item(trimmed: &str) -> bool {
    trimmed == "-" || trimmed.starts_with("- ")
}

/// A line that should be skipped by every repair step.
pub fn is_exempt(line: &str) -> bool {
    is_blank(line) || is_comment(line) || is_doc_separator(line)
}

/// Strip a trailing YAML comment that is preceded by whitespace. Quote-aware
/// enough for manifest lines: a `#` inside a quoted value is kept.
pub fn strip_trailing_comment(line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev_is_space = true;
    for (i, ch) in line.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double && prev_is_space => return &line[..i],
            _ => {}
        }
        prev_is_space = ch == ' ';
    }
    line
}

/// The scalar portion of a value: trailing comment stripped, whitespace
/// trimmed.
pub fn value_scalar(value: &str) -> &str {
    strip_trailing_comment(value).trim()
}

// -----------------------------------------------------------------------
// Key-line parsing
// -----------------------------------------------------------------------

/// Decomposed mapping-entry line: `(indent)(- )?key(:)?( value)?`.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyLine<'a> {
    pub indent: usize,
    pub list_item: bool,
    pub key: &'a str,
    pub has_colon: bool,
    /// Trimmed text after the key (and colon, if present). Empty when the
    /// line carries no value.
    pub value: &'a str,
}

impl KeyLine<'_> {
    /// Column of the key itself: list items shift it past the dash.
    pub fn key_column(&self) -> usize {
        if self.list_item { self.indent + 2 } else { self.indent }
    }

    /// `true` when this is a lone token with no colon and no value.
    pub fn is_bare(&self) -> bool {
        !self.has_colon && self.value.is_empty()
    }
}

/// Parse a line into a [`KeyLine`]. Returns `None` for blank, comment, and
/// document-separator lines, and for lines whose first token is empty.
pub fn parse_key_line(line: &str) -> Option<KeyLine<'_>> {
    if is_exempt(line) {
        return None;
    }
    let indent = indent_of(line);
    let mut rest = &line[indent..];
    let list_item = rest.starts_with("- ");
    if list_item {
        rest = &rest[2..];
        // Tolerate extra spaces after the dash.
        rest = rest.trim_start_matches(' ');
    }

    let key_end = rest.find(|c: char| c == ':' || c.is_whitespace()).unwrap_or(rest.len());
    let key = &rest[..key_end];
    if key.is_empty() {
        return None;
    }

    let after_key = &rest[key_end..];
    let (has_colon, value) = if let Some(stripped) = after_key.strip_prefix(':') {
        // A colon immediately followed by non-space is still a key line
        // (pass 1 repairs the spacing) unless it is part of a URL.
        if stripped.starts_with("//") {
            (false, after_key.trim())
        } else {
            (true, stripped.trim())
        }
    } else {
        (false, after_key.trim())
    };

    Some(KeyLine {
        indent,
        list_item,
        key,
        has_colon,
        value,
    })
}

// -----------------------------------------------------------------------
// Context stack
// -----------------------------------------------------------------------

/// Ancestor chain of the current line, as `(key column, key)` entries.
/// Popping happens whenever the current line's key column is at or above a
/// stack entry's column.
#[derive(Debug, Default)]
pub struct ContextStack {
    entries: Vec<(usize, String)>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset on a document separator.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pop every entry whose column is >= `column`.
    pub fn pop_to(&mut self, column: usize) {
        while self.entries.last().is_some_and(|(c, _)| *c >= column) {
            self.entries.pop();
        }
    }

    pub fn push(&mut self, column: usize, key: &str) {
        self.entries.push((column, key.to_string()));
    }

    /// The innermost enclosing key, if any.
    pub fn parent(&self) -> Option<&str> {
        self.entries.last().map(|(_, k)| k.as_str())
    }

    /// `true` when `key` appears anywhere in the ancestor chain.
    pub fn has_ancestor(&self, key: &str) -> bool {
        self.entries.iter().any(|(_, k)| k == key)
    }

    /// Feed one parsed line through the stack: pop to its column, then push
    /// it if it introduces a key. Returns the parent in effect for the line.
    pub fn enter(&mut self, parsed: &KeyLine<'_>) -> Option<String> {
        let column = parsed.key_column();
        self.pop_to(column);
        let parent = self.parent().map(str::to_string);
        if parsed.has_colon || parsed.is_bare() {
            self.push(column, parsed.key);
        }
        parent
    }
}

// -----------------------------------------------------------------------
// Block-scalar mask
// -----------------------------------------------------------------------

static BLOCK_SCALAR_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*[|>][+-]?[0-9]?\s*$").expect("static pattern must compile"));

/// `true` when the line introduces a literal (`|`) or folded (`>`) scalar.
pub fn is_block_scalar_header(line: &str) -> bool {
    !is_comment(line) && BLOCK_SCALAR_HEADER.is_match(strip_trailing_comment(line).trim_end())
}

/// Compute which lines sit inside a block scalar. Masked lines are exempt
/// from every text repair; their bytes must survive the pipeline untouched
/// (unless the AST pass re-serializes the document wholesale).
pub fn block_scalar_mask(lines: &[String]) -> Vec<bool> {
    let mut mask = vec![false; lines.len()];
    let mut i = 0;
    while i < lines.len() {
        if mask[i] || !is_block_scalar_header(&lines[i]) {
            i += 1;
            continue;
        }
        let header_indent = indent_of(&lines[i]);
        let mut j = i + 1;
        let mut pending_blanks = Vec::new();
        while j < lines.len() {
            if is_blank(&lines[j]) {
                pending_blanks.push(j);
                j += 1;
                continue;
            }
            if indent_of(&lines[j]) > header_indent {
                for b in pending_blanks.drain(..) {
                    mask[b] = true;
                }
                mask[j] = true;
                j += 1;
            } else {
                break;
            }
        }
        i = j;
    }
    mask
}
