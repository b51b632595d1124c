//! Stateless tool-call boundary.
//!
//! Each tool takes a single string argument and returns a serde value, so an
//! orchestrator (or `brandscan tool ...`) can call it with no shared context.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use brandscan_core::{AcquisitionError, TextAcquirer};

/// `{"text": ...}` on success, `{"error": ...}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextToolOutput {
    Text { text: String },
    Error { error: String },
}

impl From<Result<String, AcquisitionError>> for TextToolOutput {
    fn from(result: Result<String, AcquisitionError>) -> Self {
        match result {
            Ok(text) => TextToolOutput::Text { text },
            Err(e) => TextToolOutput::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Embedded text of every page.
pub fn extract_text(acquirer: &TextAcquirer, path: &Path) -> TextToolOutput {
    acquirer.extract_text(path, &CancellationToken::new()).into()
}

/// OCR text of every page.
pub fn extract_text_via_ocr(acquirer: &TextAcquirer, path: &Path) -> TextToolOutput {
    acquirer
        .extract_text_via_ocr(path, &|_| {}, &CancellationToken::new())
        .into()
}

/// `#rrggbb` for a CMYK descriptor, or a readable error message.
pub fn cmyk_to_hex(descriptor: &str) -> Result<String, String> {
    brandscan_parsing::cmyk_to_hex(descriptor).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use brandscan_core::mock::{MockOcrEngine, MockPdfBackend};

    use super::*;

    #[test]
    fn text_tool_serializes_text_or_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let acquirer = TextAcquirer::new(Arc::new(MockPdfBackend::with_text_pages(&["Cores"])));

        let ok = serde_json::to_value(extract_text(&acquirer, file.path())).unwrap();
        assert_eq!(ok, serde_json::json!({ "text": "Cores\n\n" }));

        let missing = serde_json::to_value(extract_text(&acquirer, Path::new("/nonexistent.pdf")))
            .unwrap();
        assert!(missing["error"].as_str().unwrap().contains("/nonexistent.pdf"));
        assert!(missing.get("text").is_none());
    }

    #[test]
    fn ocr_tool_without_engine_reports_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let acquirer = TextAcquirer::new(Arc::new(MockPdfBackend::with_text_pages(&["x"])))
            .with_ocr_unavailable("no OCR engine configured; set TESSERACT_CMD");
        let TextToolOutput::Error { error } = extract_text_via_ocr(&acquirer, file.path()) else {
            panic!("expected error output");
        };
        assert!(error.contains("TESSERACT_CMD"));
    }

    #[test]
    fn ocr_tool_returns_recognized_text() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let acquirer = TextAcquirer::new(Arc::new(MockPdfBackend::with_pages(&[(
            "",
            "Cores Primarias",
        )])))
        .with_ocr_engine(Arc::new(MockOcrEngine::new()));
        assert_eq!(
            extract_text_via_ocr(&acquirer, file.path()),
            TextToolOutput::Text {
                text: "Cores Primarias\n\n".into()
            }
        );
    }

    #[test]
    fn cmyk_tool_round_trips_errors_as_strings() {
        assert_eq!(cmyk_to_hex("C:0 M:100 Y:100 K:0"), Ok("#ff0000".to_string()));
        let err = cmyk_to_hex("CMYK 1 2 3").unwrap_err();
        assert!(err.contains("expected 4 values"));
    }

    #[test]
    fn text_tool_output_deserializes_both_shapes() {
        let ok: TextToolOutput = serde_json::from_str(r#"{"text":"a"}"#).unwrap();
        assert_eq!(ok, TextToolOutput::Text { text: "a".into() });
        let err: TextToolOutput = serde_json::from_str(r#"{"error":"b"}"#).unwrap();
        assert_eq!(err, TextToolOutput::Error { error: "b".into() });
    }
}
