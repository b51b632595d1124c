use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to render page: {0}")]
    RenderError(String),
    /// The page visitor asked the backend to stop.
    #[error("page processing interrupted")]
    Interrupted,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),
    #[error("recognition failed: {0}")]
    RecognitionFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page rasterized to an image file inside the caller's scratch directory.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based page index.
    pub index: usize,
    pub page_count: usize,
    pub width: u32,
    pub height: u32,
    pub image_path: PathBuf,
}

/// Trait for PDF decoding backends.
///
/// Implementors provide page-level text and rasterization; concatenation,
/// blank-result detection and OCR orchestration live in
/// [`crate::acquisition::TextAcquirer`].
pub trait PdfBackend: Send + Sync {
    /// Embedded text of every page, in page order, exactly as stored.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BackendError>;

    /// Render every page, in order, at `dpi` into `scratch_dir` and hand each
    /// one to `visit` before the next page is rendered.
    ///
    /// `visit` returning an error stops rendering and the error is returned
    /// unchanged. Visitors use [`BackendError::Interrupted`] to stop early.
    fn render_pages(
        &self,
        path: &Path,
        dpi: u32,
        scratch_dir: &Path,
        visit: &mut dyn FnMut(RenderedPage) -> Result<(), BackendError>,
    ) -> Result<(), BackendError>;
}

/// Trait for optical character recognition engines.
pub trait OcrEngine: Send + Sync {
    /// Engine identifier used in log and error messages.
    fn name(&self) -> &str;

    /// Recognize the text of a single page image.
    fn recognize(&self, image_path: &Path) -> Result<String, OcrError>;
}
