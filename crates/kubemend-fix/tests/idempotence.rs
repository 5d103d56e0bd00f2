//! The idempotence law: repairing already-repaired output is a no-op.

use std::path::{Path, PathBuf};

use kubemend_fix::{FixOptions, fix};

fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn assert_idempotent(name: &str, input: &str) {
    let opts = FixOptions::default();
    let first = fix(input, &opts);
    let second = fix(&first.content, &opts);
    assert_eq!(
        second.content, first.content,
        "{name}: content changed on the second run"
    );
    assert!(
        second.changes.is_empty(),
        "{name}: second run produced changes: {:#?}",
        second.changes
    );
    assert!((second.confidence - 1.0).abs() < f64::EPSILON);
}

#[test]
fn all_fixtures_are_idempotent() {
    for entry in std::fs::read_dir(testdata()).expect("testdata exists") {
        let path = entry.expect("directory entry").path();
        if path.extension().is_none_or(|e| e != "yaml") {
            continue;
        }
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        let input = std::fs::read_to_string(&path).expect("fixture is readable");
        assert_idempotent(name.as_deref().unwrap_or("fixture"), &input);
    }
}

#[test]
fn clean_manifest_is_a_no_op() {
    let text = concat!(
        "apiVersion: apps/v1\n",
        "kind: Deployment\n",
        "metadata:\n",
        "  name: web\n",
        "  namespace: default\n",
        "spec:\n",
        "  replicas: 2\n",
        "  selector:\n",
        "    matchLabels:\n",
        "      app: web\n",
        "  template:\n",
        "    metadata:\n",
        "      labels:\n",
        "        app: web\n",
        "    spec:\n",
        "      containers:\n",
        "      - name: web\n",
        "        image: nginx:1.25\n",
    );
    let report = fix(text, &FixOptions::default());
    assert_eq!(report.content, text);
    assert!(report.changes.is_empty());
    assert!(report.is_valid);
    assert!((report.confidence - 1.0).abs() < f64::EPSILON);
}

#[test]
fn comment_only_input_is_unchanged() {
    let text = "# nothing but comments\n# here\n";
    let report = fix(text, &FixOptions::default());
    assert_eq!(report.content, text);
    assert!(report.changes.is_empty());
    assert!(report.is_valid);
}

#[test]
fn separator_only_input_is_unchanged() {
    let text = "---\n";
    let report = fix(text, &FixOptions::default());
    assert_eq!(report.content, text);
    assert!(report.changes.is_empty());
    assert!(report.is_valid);
}
