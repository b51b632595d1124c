use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, OcrEngine, OcrError, PdfBackend};
use crate::DEFAULT_OCR_DPI;

/// Appended after every page so page breaks survive as paragraph breaks.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// How text is obtained from a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    Direct,
    Ocr,
}

impl fmt::Display for AcquisitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionMode::Direct => write!(f, "direct text extraction"),
            AcquisitionMode::Ocr => write!(f, "OCR"),
        }
    }
}

/// Underlying fault wrapped by [`AcquisitionError::AcquisitionFailure`].
#[derive(Error, Debug)]
pub enum Fault {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("file not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("{mode} produced no text from {}", path.display())]
    NoTextExtracted { path: PathBuf, mode: AcquisitionMode },
    #[error("OCR engine unavailable for {}: {reason}", path.display())]
    EngineUnavailable { path: PathBuf, reason: String },
    #[error("{mode} failed on {}: {source}", path.display())]
    AcquisitionFailure {
        path: PathBuf,
        mode: AcquisitionMode,
        #[source]
        source: Fault,
    },
    #[error("{mode} of {} was cancelled", path.display())]
    Cancelled { path: PathBuf, mode: AcquisitionMode },
    #[error("{mode} of {} timed out after {secs}s", path.display())]
    TimedOut {
        path: PathBuf,
        mode: AcquisitionMode,
        secs: u64,
    },
}

impl AcquisitionError {
    fn failure(path: &Path, mode: AcquisitionMode, source: impl Into<Fault>) -> Self {
        AcquisitionError::AcquisitionFailure {
            path: path.to_path_buf(),
            mode,
            source: source.into(),
        }
    }
}

/// Progress events emitted during OCR acquisition. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionEvent {
    PageStarted {
        page: usize,
        page_count: usize,
    },
    PageFinished {
        page: usize,
        page_count: usize,
        chars: usize,
    },
}

enum OcrSlot {
    Ready(Arc<dyn OcrEngine>),
    Unavailable(String),
}

/// Obtains the full text of a PDF, either directly or through OCR.
///
/// The OCR engine is validated by whoever builds the acquirer; an engine that
/// failed validation is stored as a reason and reported as
/// [`AcquisitionError::EngineUnavailable`] on OCR calls only, so direct
/// extraction keeps working without one.
pub struct TextAcquirer {
    backend: Arc<dyn PdfBackend>,
    ocr: OcrSlot,
    dpi: u32,
}

impl TextAcquirer {
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self {
            backend,
            ocr: OcrSlot::Unavailable("no OCR engine configured".into()),
            dpi: DEFAULT_OCR_DPI,
        }
    }

    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = OcrSlot::Ready(engine);
        self
    }

    /// Record why no OCR engine could be set up.
    pub fn with_ocr_unavailable(mut self, reason: impl Into<String>) -> Self {
        self.ocr = OcrSlot::Unavailable(reason.into());
        self
    }

    /// Set the rasterization resolution. Values of 0 keep the current setting.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        if dpi > 0 {
            self.dpi = dpi;
        }
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn ocr_available(&self) -> bool {
        matches!(self.ocr, OcrSlot::Ready(_))
    }

    /// Acquire text in the given mode.
    pub fn acquire(
        &self,
        path: &Path,
        mode: AcquisitionMode,
        progress: &dyn Fn(AcquisitionEvent),
        cancel: &CancellationToken,
    ) -> Result<String, AcquisitionError> {
        match mode {
            AcquisitionMode::Direct => self.extract_text(path, cancel),
            AcquisitionMode::Ocr => self.extract_text_via_ocr(path, progress, cancel),
        }
    }

    /// Concatenate the embedded text of every page.
    pub fn extract_text(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, AcquisitionError> {
        let mode = AcquisitionMode::Direct;
        ensure_readable(path)?;
        ensure_not_cancelled(path, mode, cancel)?;

        let pages = self
            .backend
            .page_texts(path)
            .map_err(|e| AcquisitionError::failure(path, mode, e))?;
        tracing::debug!(path = %path.display(), pages = pages.len(), "extracted embedded text");

        let mut text = String::new();
        for page in &pages {
            text.push_str(page);
            text.push_str(PAGE_SEPARATOR);
        }

        ensure_not_cancelled(path, mode, cancel)?;
        non_blank(text, path, mode)
    }

    /// Render every page and run OCR over it, one page at a time.
    pub fn extract_text_via_ocr(
        &self,
        path: &Path,
        progress: &dyn Fn(AcquisitionEvent),
        cancel: &CancellationToken,
    ) -> Result<String, AcquisitionError> {
        let mode = AcquisitionMode::Ocr;
        ensure_readable(path)?;

        let engine = match &self.ocr {
            OcrSlot::Ready(engine) => Arc::clone(engine),
            OcrSlot::Unavailable(reason) => {
                return Err(AcquisitionError::EngineUnavailable {
                    path: path.to_path_buf(),
                    reason: reason.clone(),
                });
            }
        };
        ensure_not_cancelled(path, mode, cancel)?;

        // Rendered bitmaps live here and are removed when this guard drops.
        let scratch = tempfile::Builder::new()
            .prefix("brandscan-ocr-")
            .tempdir()
            .map_err(|e| AcquisitionError::failure(path, mode, BackendError::Io(e)))?;

        let mut text = String::new();
        let mut stopped: Option<AcquisitionError> = None;

        let rendered = self
            .backend
            .render_pages(path, self.dpi, scratch.path(), &mut |page| {
                if cancel.is_cancelled() {
                    stopped = Some(AcquisitionError::Cancelled {
                        path: path.to_path_buf(),
                        mode,
                    });
                    return Err(BackendError::Interrupted);
                }

                let number = page.index + 1;
                progress(AcquisitionEvent::PageStarted {
                    page: number,
                    page_count: page.page_count,
                });
                tracing::info!(
                    path = %path.display(),
                    page = number,
                    pages = page.page_count,
                    engine = engine.name(),
                    "running OCR on page"
                );

                let recognized = engine.recognize(&page.image_path);
                if let Err(e) = std::fs::remove_file(&page.image_path) {
                    tracing::debug!(
                        image = %page.image_path.display(),
                        error = %e,
                        "could not remove rendered page"
                    );
                }

                match recognized {
                    Ok(page_text) => {
                        text.push_str(&page_text);
                        text.push_str(PAGE_SEPARATOR);
                        progress(AcquisitionEvent::PageFinished {
                            page: number,
                            page_count: page.page_count,
                            chars: page_text.chars().count(),
                        });
                        Ok(())
                    }
                    Err(OcrError::Unavailable(reason)) => {
                        stopped = Some(AcquisitionError::EngineUnavailable {
                            path: path.to_path_buf(),
                            reason,
                        });
                        Err(BackendError::Interrupted)
                    }
                    Err(e) => {
                        stopped = Some(AcquisitionError::failure(path, mode, e));
                        Err(BackendError::Interrupted)
                    }
                }
            });

        if let Some(err) = stopped {
            return Err(err);
        }
        rendered.map_err(|e| AcquisitionError::failure(path, mode, e))?;

        ensure_not_cancelled(path, mode, cancel)?;
        non_blank(text, path, mode)
    }
}

fn ensure_readable(path: &Path) -> Result<(), AcquisitionError> {
    let readable = std::fs::File::open(path)
        .and_then(|f| f.metadata())
        .map(|m| m.is_file())
        .unwrap_or(false);
    if readable {
        Ok(())
    } else {
        Err(AcquisitionError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

fn ensure_not_cancelled(
    path: &Path,
    mode: AcquisitionMode,
    cancel: &CancellationToken,
) -> Result<(), AcquisitionError> {
    if cancel.is_cancelled() {
        Err(AcquisitionError::Cancelled {
            path: path.to_path_buf(),
            mode,
        })
    } else {
        Ok(())
    }
}

fn non_blank(text: String, path: &Path, mode: AcquisitionMode) -> Result<String, AcquisitionError> {
    if text.trim().is_empty() {
        Err(AcquisitionError::NoTextExtracted {
            path: path.to_path_buf(),
            mode,
        })
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOcrEngine, MockPdfBackend};

    fn pdf_file() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn direct_mode_joins_pages_with_blank_line() {
        let file = pdf_file();
        let backend = MockPdfBackend::with_text_pages(&["Page one\n", "Page two\n"]);
        let acquirer = TextAcquirer::new(Arc::new(backend));
        let text = acquirer
            .extract_text(file.path(), &CancellationToken::new())
            .unwrap();
        assert_eq!(text, "Page one\n\n\nPage two\n\n\n");
    }

    #[test]
    fn whitespace_only_pages_are_no_text() {
        let file = pdf_file();
        let backend = MockPdfBackend::with_text_pages(&["  \n", "\t\n\n"]);
        let acquirer = TextAcquirer::new(Arc::new(backend));
        let err = acquirer
            .extract_text(file.path(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::NoTextExtracted {
                mode: AcquisitionMode::Direct,
                ..
            }
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let backend = MockPdfBackend::with_text_pages(&["text"]);
        let acquirer = TextAcquirer::new(Arc::new(backend));
        let err = acquirer
            .extract_text(Path::new("/definitely/not/here.pdf"), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::NotFound { .. }));
        assert!(err.to_string().contains("/definitely/not/here.pdf"));
    }

    #[test]
    fn ocr_without_engine_is_unavailable_but_direct_works() {
        let file = pdf_file();
        let backend = MockPdfBackend::with_pages(&[("embedded", "scanned")]);
        let acquirer = TextAcquirer::new(Arc::new(backend))
            .with_ocr_unavailable("TESSERACT_CMD is not set");
        let cancel = CancellationToken::new();

        let err = acquirer
            .extract_text_via_ocr(file.path(), &|_| {}, &cancel)
            .unwrap_err();
        match err {
            AcquisitionError::EngineUnavailable { reason, .. } => {
                assert!(reason.contains("TESSERACT_CMD"))
            }
            other => panic!("expected EngineUnavailable, got {other:?}"),
        }

        assert!(acquirer.extract_text(file.path(), &cancel).is_ok());
    }

    #[test]
    fn ocr_reports_progress_per_page_in_order() {
        let file = pdf_file();
        let backend = MockPdfBackend::with_pages(&[("", "first"), ("", "second")]);
        let acquirer =
            TextAcquirer::new(Arc::new(backend)).with_ocr_engine(Arc::new(MockOcrEngine::new()));

        let events = std::sync::Mutex::new(Vec::new());
        let text = acquirer
            .extract_text_via_ocr(
                file.path(),
                &|e| events.lock().unwrap().push(e),
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(text, "first\n\nsecond\n\n");
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            AcquisitionEvent::PageStarted {
                page: 1,
                page_count: 2
            }
        );
        assert_eq!(
            events[3],
            AcquisitionEvent::PageFinished {
                page: 2,
                page_count: 2,
                chars: 6
            }
        );
    }

    #[test]
    fn cancelled_token_stops_ocr() {
        let file = pdf_file();
        let backend = MockPdfBackend::with_pages(&[("", "first")]);
        let acquirer =
            TextAcquirer::new(Arc::new(backend)).with_ocr_engine(Arc::new(MockOcrEngine::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = acquirer
            .extract_text_via_ocr(file.path(), &|_| {}, &cancel)
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::Cancelled { .. }));
    }

    /// Notes, at each call, whether the previous page image is already gone.
    /// With `consume` it also deletes each image itself.
    #[derive(Default)]
    struct RecordingOcr {
        consume: bool,
        seen: std::sync::Mutex<Vec<(PathBuf, bool)>>,
    }

    impl OcrEngine for RecordingOcr {
        fn name(&self) -> &str {
            "recording"
        }

        fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
            let mut seen = self.seen.lock().unwrap();
            let previous_gone = seen.last().is_none_or(|(p, _)| !p.exists());
            seen.push((image_path.to_path_buf(), previous_gone));
            let text = std::fs::read_to_string(image_path)?;
            if self.consume {
                std::fs::remove_file(image_path)?;
            }
            Ok(text)
        }
    }

    fn ocr_two_pages(engine: Arc<RecordingOcr>) -> String {
        let file = pdf_file();
        let backend = MockPdfBackend::with_pages(&[("", "first"), ("", "second")]);
        TextAcquirer::new(Arc::new(backend))
            .with_ocr_engine(engine)
            .extract_text_via_ocr(file.path(), &|_| {}, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn rendered_page_removed_after_recognition() {
        let engine = Arc::new(RecordingOcr::default());
        assert_eq!(ocr_two_pages(engine.clone()), "first\n\nsecond\n\n");
        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].1, "page 1 image should be gone before page 2");
        assert!(!seen[1].0.exists());
    }

    #[test]
    fn page_image_already_removed_does_not_fail_ocr() {
        let engine = Arc::new(RecordingOcr {
            consume: true,
            ..Default::default()
        });
        assert_eq!(ocr_two_pages(engine.clone()), "first\n\nsecond\n\n");
        assert_eq!(engine.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn dpi_zero_keeps_default() {
        let acquirer = TextAcquirer::new(Arc::new(MockPdfBackend::with_text_pages(&[]))).with_dpi(0);
        assert_eq!(acquirer.dpi(), DEFAULT_OCR_DPI);
        let acquirer = acquirer.with_dpi(600);
        assert_eq!(acquirer.dpi(), 600);
    }
}
