//! Pass 0: drop whole lines that cannot plausibly belong to a manifest.
//!
//! Pasted prose, shell prompts, and log fragments all fail the same test:
//! no colon, no list dash, and a first token that is nowhere near a known
//! key. Block-scalar content is exempt; it is allowed to look like
//! anything.

use crate::change::{Category, Change, ChangeLog, Severity};
use crate::fuzzy;
use crate::scan;

use super::{from_lines, to_lines};

#[tracing::instrument(skip_all)]
pub fn run(text: &str, log: &mut ChangeLog) -> String {
    let trailing = text.ends_with('\n');
    let lines = to_lines(text);
    let mask = scan::block_scalar_mask(&lines);

    let mut kept = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if mask[i] || !is_junk(line) {
            kept.push(line.clone());
        } else {
            log.push(Change::removal(
                i + 1,
                line,
                "line does not look like manifest content",
                Category::Structure,
                Severity::Warning,
                1.0,
            ));
        }
    }

    tracing::debug!(dropped = lines.len() - kept.len(), "junk stripping done");
    from_lines(&kept, trailing)
}

fn is_junk(line: &str) -> bool {
    if scan::is_exempt(line) {
        return false;
    }
    if line.contains(':') {
        return false;
    }
    if line.trim_start().starts_with('-') {
        return false;
    }
    !looks_like_key(line)
}

/// A colon-less line still looks like a (repairable) key when its first
/// token fuzzy-matches a known key, or when it is an indented two-token
/// pair that later passes will turn into `key: value`.
fn looks_like_key(line: &str) -> bool {
    let indent = scan::indent_of(line);
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return false;
    };
    if fuzzy::closest_key(first).is_some() {
        return true;
    }
    indent > 0 && tokens.next().is_some() && tokens.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(text: &str) -> (String, usize) {
        let mut log = ChangeLog::new();
        let out = run(text, &mut log);
        (out, log.len())
    }

    #[test]
    fn drops_prose() {
        let (out, n) = strip("here is my manifest please fix it\napiVersion: v1\n");
        assert_eq!(out, "apiVersion: v1\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn keeps_comments_separators_and_blanks() {
        let text = "# a comment\n---\n\napiVersion: v1\n";
        let (out, n) = strip(text);
        assert_eq!(out, text);
        assert_eq!(n, 0);
    }

    #[test]
    fn keeps_misspelled_keys() {
        let (out, n) = strip("contianers\n");
        assert_eq!(out, "contianers\n");
        assert_eq!(n, 0);
    }

    #[test]
    fn keeps_indented_two_token_pairs() {
        let (out, n) = strip("  app web\n");
        assert_eq!(out, "  app web\n");
        assert_eq!(n, 0);
    }

    #[test]
    fn keeps_list_items() {
        let (out, n) = strip("- nginx\n");
        assert_eq!(out, "- nginx\n");
        assert_eq!(n, 0);
    }

    #[test]
    fn block_scalar_content_is_never_junk() {
        let text = "data:\n  notes: |\n    arbitrary prose with no colon at all\n";
        let (out, n) = strip(text);
        assert_eq!(out, text);
        assert_eq!(n, 0);
    }

    #[test]
    fn junk_changes_carry_full_confidence() {
        let mut log = ChangeLog::new();
        run("complete junk text line\n", &mut log);
        let changes = log.into_changes();
        assert_eq!(changes.len(), 1);
        assert!((changes[0].confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(changes[0].severity, Severity::Warning);
        assert_eq!(changes[0].fixed, crate::change::REMOVED);
    }
}
