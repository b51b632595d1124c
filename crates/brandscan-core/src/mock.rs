//! Mock PDF backend and OCR engine for testing.
//!
//! The mock backend "renders" a page by writing the page's scanned text into
//! the image file; [`MockOcrEngine`] recognizes a page by reading that file
//! back. This keeps the full acquisition path (scratch directory, per-page
//! visiting, cleanup) exercised without MuPDF or Tesseract.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendError, OcrEngine, OcrError, PdfBackend, RenderedPage};

#[derive(Debug, Clone)]
struct MockPage {
    text: String,
    scanned: String,
}

/// A hand-rolled [`PdfBackend`] serving fixed page contents.
#[derive(Debug, Default)]
pub struct MockPdfBackend {
    pages: Vec<MockPage>,
    fail_open: Option<String>,
    render_calls: AtomicUsize,
}

impl MockPdfBackend {
    /// Pages given as `(embedded_text, scanned_text)` pairs.
    pub fn with_pages(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(text, scanned)| MockPage {
                    text: text.to_string(),
                    scanned: scanned.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Pages whose embedded and scanned text are identical.
    pub fn with_text_pages(pages: &[&str]) -> Self {
        let pairs: Vec<(&str, &str)> = pages.iter().map(|p| (*p, *p)).collect();
        Self::with_pages(&pairs)
    }

    /// Make every call fail as if the document could not be opened.
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_open: Some(reason.to_string()),
            ..Default::default()
        }
    }

    /// Number of pages handed to a visitor so far.
    pub fn pages_rendered(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }
}

impl PdfBackend for MockPdfBackend {
    fn page_texts(&self, _path: &Path) -> Result<Vec<String>, BackendError> {
        if let Some(reason) = &self.fail_open {
            return Err(BackendError::OpenError(reason.clone()));
        }
        Ok(self.pages.iter().map(|p| p.text.clone()).collect())
    }

    fn render_pages(
        &self,
        _path: &Path,
        _dpi: u32,
        scratch_dir: &Path,
        visit: &mut dyn FnMut(RenderedPage) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        if let Some(reason) = &self.fail_open {
            return Err(BackendError::OpenError(reason.clone()));
        }
        let page_count = self.pages.len();
        for (index, page) in self.pages.iter().enumerate() {
            let image_path = scratch_dir.join(format!("page-{:04}.png", index + 1));
            std::fs::write(&image_path, &page.scanned)?;
            self.render_calls.fetch_add(1, Ordering::SeqCst);
            visit(RenderedPage {
                index,
                page_count,
                width: 2480,
                height: 3508,
                image_path,
            })?;
        }
        Ok(())
    }
}

/// How [`MockOcrEngine`] answers.
#[derive(Debug, Clone)]
pub enum MockOcrBehavior {
    /// Return the contents of the rendered image file.
    EchoImage,
    /// Fail as if the executable vanished.
    Unavailable(String),
    /// Fail recognition with this message.
    Fail(String),
}

/// A hand-rolled [`OcrEngine`] for tests.
#[derive(Debug)]
pub struct MockOcrEngine {
    behavior: MockOcrBehavior,
    call_count: AtomicUsize,
}

impl Default for MockOcrEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOcrEngine {
    pub fn new() -> Self {
        Self::with_behavior(MockOcrBehavior::EchoImage)
    }

    pub fn with_behavior(behavior: MockOcrBehavior) -> Self {
        Self {
            behavior,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockOcrBehavior::EchoImage => Ok(std::fs::read_to_string(image_path)?),
            MockOcrBehavior::Unavailable(reason) => Err(OcrError::Unavailable(reason.clone())),
            MockOcrBehavior::Fail(msg) => Err(OcrError::RecognitionFailed(msg.clone())),
        }
    }
}
