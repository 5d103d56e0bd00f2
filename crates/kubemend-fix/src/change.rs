//! The change log: every mutation the pipeline performs is recorded as one
//! [`Change`], categorized and scored. Downstream tools group and filter on
//! the category and severity strings, so their spellings are part of the
//! public contract.

use core::time::Duration;

use serde::Serialize;

/// Placeholder text recorded as the fixed line when a line is deleted.
pub const REMOVED: &str = "(removed)";

/// What aspect of the document a change repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Syntax,
    Structure,
    Semantic,
    Type,
}

/// How consequential a change is. `Critical` is reserved for surrounding
/// surfaces reporting unrecoverable failures; the passes themselves emit
/// `Error` through `Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
}

/// One recorded repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    /// 1-based line number in the text as it was when the change was made.
    /// Object-model edits in the AST pass use line 1 as a placeholder.
    pub line: usize,
    pub original: String,
    /// The repaired line, [`REMOVED`] for deletions, or `(missing …)` for
    /// fields injected in the object model.
    pub fixed: String,
    pub reason: String,
    pub category: Category,
    pub severity: Severity,
    /// Estimate in `[0, 1]` that the repair preserves author intent.
    pub confidence: f64,
}

impl Change {
    pub fn new(
        line: usize,
        original: impl Into<String>,
        fixed: impl Into<String>,
        reason: impl Into<String>,
        category: Category,
        severity: Severity,
        confidence: f64,
    ) -> Self {
        Self {
            line,
            original: original.into(),
            fixed: fixed.into(),
            reason: reason.into(),
            category,
            severity,
            confidence,
        }
    }

    /// A deletion record for `original` at `line`.
    pub fn removal(
        line: usize,
        original: impl Into<String>,
        reason: impl Into<String>,
        category: Category,
        severity: Severity,
        confidence: f64,
    ) -> Self {
        Self::new(line, original, REMOVED, reason, category, severity, confidence)
    }

    /// An object-model insertion record (`(missing …)`), anchored to line 1.
    pub fn missing(
        what: impl core::fmt::Display,
        reason: impl Into<String>,
        severity: Severity,
        confidence: f64,
    ) -> Self {
        Self::new(
            1,
            String::new(),
            format!("(missing {what})"),
            reason,
            Category::Structure,
            severity,
            confidence,
        )
    }
}

/// Append-only change log shared by all passes of one invocation.
#[derive(Debug, Default)]
pub struct ChangeLog {
    changes: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Mutable access for the scoring pass, which downgrades severities.
    pub fn changes_mut(&mut self) -> &mut [Change] {
        &mut self.changes
    }

    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}

/// Per-pass accounting in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct PassStat {
    pub name: &'static str,
    pub changes: usize,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // signature dictated by serde
fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

/// Everything the pipeline produces for one input.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixReport {
    /// The repaired text.
    pub content: String,
    /// Every change in order of application.
    pub changes: Vec<Change>,
    /// Whether the final text parses as multi-document YAML.
    pub is_valid: bool,
    /// Parse errors remaining after all passes, verbatim.
    pub errors: Vec<String>,
    /// Arithmetic mean of change confidences; `1.0` when nothing changed.
    pub confidence: f64,
    /// Per-pass breakdown.
    pub passes: Vec<PassStat>,
}

impl FixReport {
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
