use std::sync::Arc;

use thiserror::Error;

pub mod analyzer;
pub mod tools;

// Re-export domain types for convenience
pub use brandscan_core::{
    AcquisitionError, AcquisitionEvent, AcquisitionMode, Classification, Config, Findings,
    PdfBackend,
};
pub use analyzer::{Analysis, Analyzer};
pub use tools::TextToolOutput;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("invalid palette heading pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("analysis task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of brandscan-ingest)")]
    NoPdfSupport,
}

#[cfg(feature = "pdf")]
fn pdf_backend() -> Result<Arc<dyn PdfBackend>, IngestError> {
    Ok(Arc::new(brandscan_pdf_mupdf::MupdfBackend::new()))
}

#[cfg(not(feature = "pdf"))]
fn pdf_backend() -> Result<Arc<dyn PdfBackend>, IngestError> {
    Err(IngestError::NoPdfSupport)
}
