//! Miette diagnostics for remaining parse errors.

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

/// A parse error that survived the pipeline, with exact source location.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kubemend::parse))]
pub struct ParseDiagnostic {
    #[source_code]
    pub src: NamedSource<String>,

    #[label("still unparseable here")]
    pub span: SourceSpan,

    pub message: String,
}

/// Locate the first remaining parse error in `content` and wrap it for
/// rendering. The pipeline's report only carries error strings; the source
/// location is recovered by parsing once more.
pub fn locate_parse_error(name: &str, content: &str) -> Option<ParseDiagnostic> {
    for doc in serde_yaml::Deserializer::from_str(content) {
        if let Err(e) = serde_yaml::Value::deserialize(doc) {
            let offset = e.location().map_or(0, |loc| loc.index().min(content.len()));
            return Some(ParseDiagnostic {
                src: NamedSource::new(name, content.to_string()),
                span: offset.into(),
                message: e.to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_content_has_no_diagnostic() {
        assert!(locate_parse_error("f.yaml", "kind: Pod\n").is_none());
    }

    #[test]
    fn diagnostic_points_into_the_source() {
        let d = locate_parse_error("f.yaml", "kind: Pod\nbad: [\n").expect("error located");
        assert!(d.span.offset() <= "kind: Pod\nbad: [\n".len());
        assert!(!d.message.is_empty());
    }
}
