//! Canonical-order YAML re-serialization for the AST pass.
//!
//! `serde_yaml`'s emitter has no key-ordering hook, so documents are
//! rebuilt with their mappings in canonical order before emission:
//! the well-known manifest keys first, everything else lexicographically
//! after them, at every nesting level.

use serde_yaml::{Mapping, Value};

/// The project-defined key order. Keys not listed sort lexicographically
/// after the listed ones.
pub const CANONICAL_ORDER: &[&str] = &[
    "apiVersion",
    "kind",
    "metadata",
    "name",
    "namespace",
    "labels",
    "annotations",
    "spec",
    "data",
    "status",
];

fn rank(key: &Value) -> (usize, String) {
    match key.as_str() {
        Some(s) => match CANONICAL_ORDER.iter().position(|k| *k == s) {
            Some(i) => (i, String::new()),
            None => (CANONICAL_ORDER.len(), s.to_string()),
        },
        // Non-string keys are rare in manifests; they sort last by their
        // serialized form.
        None => (
            CANONICAL_ORDER.len() + 1,
            serde_yaml::to_string(key).unwrap_or_default(),
        ),
    }
}

/// Rebuild `value` with every mapping in canonical key order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(&Value, &Value)> = map.iter().collect();
            entries.sort_by_cached_key(|(k, _)| rank(k));
            let mut out = Mapping::with_capacity(entries.len());
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Mapping(out)
        }
        Value::Sequence(seq) => Value::Sequence(seq.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Emit a document stream with fixed two-space indentation, documents
/// joined by `\n---\n`. Null documents emit as empty segments so the
/// separator count of the input stream is preserved.
pub fn emit_documents(docs: &[Value]) -> String {
    let parts: Vec<String> = docs
        .iter()
        .map(|doc| {
            if doc.is_null() {
                String::new()
            } else {
                serde_yaml::to_string(&canonicalize(doc))
                    .unwrap_or_default()
                    .trim_end()
                    .to_string()
            }
        })
        .collect();
    let mut out = parts.join("\n---\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Value {
        serde_yaml::from_str(text).expect("test document parses")
    }

    #[test]
    fn root_keys_follow_canonical_order() {
        let v = doc("spec:\n  replicas: 1\nkind: Deployment\nmetadata:\n  name: x\napiVersion: apps/v1\n");
        let out = emit_documents(&[v]);
        let positions: Vec<usize> = ["apiVersion:", "kind:", "metadata:", "spec:"]
            .iter()
            .map(|k| out.find(k).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unlisted_keys_sort_lexicographically_after_listed() {
        let v = doc("zeta: 1\nalpha: 2\nkind: Pod\n");
        let out = emit_documents(&[v]);
        let kind = out.find("kind:").expect("kind");
        let alpha = out.find("alpha:").expect("alpha");
        let zeta = out.find("zeta:").expect("zeta");
        assert!(kind < alpha && alpha < zeta);
    }

    #[test]
    fn nested_mappings_are_ordered_too() {
        let v = doc("metadata:\n  labels:\n    app: x\n  name: y\n");
        let out = emit_documents(&[v]);
        let name = out.find("name:").expect("name");
        let labels = out.find("labels:").expect("labels");
        assert!(name < labels);
    }

    #[test]
    fn multi_document_stream_joins_with_separator() {
        let a = doc("kind: Pod\n");
        let b = doc("kind: Service\n");
        let out = emit_documents(&[a, b]);
        assert_eq!(out.matches("\n---\n").count(), 1);
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn null_documents_keep_their_separator() {
        let out = emit_documents(&[Value::Null, doc("kind: Pod\n")]);
        assert!(out.starts_with("\n---\n"));
    }
}
