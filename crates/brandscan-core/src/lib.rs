use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod acquisition;
pub mod backend;
pub mod config_file;
pub mod mock;

// Re-export for convenience
pub use acquisition::{AcquisitionError, AcquisitionEvent, AcquisitionMode, TextAcquirer};
pub use backend::{BackendError, OcrEngine, OcrError, PdfBackend, RenderedPage};

/// Default rasterization resolution for OCR. Higher values trade speed for accuracy.
pub const DEFAULT_OCR_DPI: u32 = 300;

/// Default Tesseract language model (the guidelines this tool targets are Portuguese).
pub const DEFAULT_OCR_LANGUAGE: &str = "por";

/// How trustworthy the characters of the acquired text are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceReliability {
    /// Text extracted directly from the PDF content stream.
    Clean,
    /// Text produced by OCR, subject to character-level corruption.
    Noisy,
}

/// Caller-supplied classification of a document.
///
/// Each state maps to a fixed acquisition mode and resolution policy; the
/// classification is never inferred from the file itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    ClassifiedText,
    ClassifiedImage,
}

impl Classification {
    pub fn acquisition_mode(self) -> AcquisitionMode {
        match self {
            Classification::ClassifiedText => AcquisitionMode::Direct,
            Classification::ClassifiedImage => AcquisitionMode::Ocr,
        }
    }

    pub fn reliability(self) -> SourceReliability {
        match self {
            Classification::ClassifiedText => SourceReliability::Clean,
            Classification::ClassifiedImage => SourceReliability::Noisy,
        }
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "texto" => Ok(Classification::ClassifiedText),
            "image" | "imagem" => Ok(Classification::ClassifiedImage),
            other => Err(format!(
                "unknown document kind '{}' (expected 'text' or 'image')",
                other
            )),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::ClassifiedText => write!(f, "text"),
            Classification::ClassifiedImage => write!(f, "image"),
        }
    }
}

/// A best-effort field that is either populated or explicitly not found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Finding<T> {
    Found(T),
    NotFound,
}

impl<T> Finding<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Finding::Found(_))
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Finding::Found(v) => Some(v),
            Finding::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Finding<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Finding::Found(v),
            None => Finding::NotFound,
        }
    }
}

impl Finding<Vec<String>> {
    /// An empty list counts as not found.
    pub fn from_list(items: Vec<String>) -> Self {
        if items.is_empty() {
            Finding::NotFound
        } else {
            Finding::Found(items)
        }
    }
}

/// Which representation in the document produced a resolved color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    Hex,
    Cmyk,
}

/// A resolved palette color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub label: String,
    /// `#rrggbb`, lowercase.
    pub hex: String,
    /// Heading of the palette section the color was defined under.
    pub section: String,
    pub source: ColorSource,
}

/// A palette entry that carried color tokens but no usable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedColor {
    pub label: String,
    pub section: String,
    pub reason: String,
}

/// Structured result of analyzing one brand-guideline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Findings {
    pub reliability: SourceReliability,
    pub palette: Finding<Vec<ColorEntry>>,
    pub unresolved_colors: Vec<UnresolvedColor>,
    pub brand_name: Finding<String>,
    pub description: Finding<String>,
    pub urls: Finding<Vec<String>>,
    pub tone_of_voice: Finding<String>,
    pub fonts: Finding<Vec<String>>,
}

impl Findings {
    /// Resolved colors, or an empty slice when the palette was not found.
    pub fn colors(&self) -> &[ColorEntry] {
        self.palette.as_option().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Path to (or bare command name of) the recognition executable.
    pub engine_path: Option<PathBuf>,
    pub language: String,
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            dpi: DEFAULT_OCR_DPI,
        }
    }
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ocr: OcrConfig,
    /// Upper bound on the text acquisition step. `None` waits indefinitely.
    pub acquisition_timeout_secs: Option<u64>,
    /// Number of documents analyzed concurrently in batch mode.
    pub batch_concurrency: usize,
    /// Additional palette headings (regex fragments) on top of the built-ins.
    pub extra_palette_headings: Vec<String>,
    /// Additional headings (regex fragments) that close a palette section.
    pub extra_section_ends: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            acquisition_timeout_secs: None,
            batch_concurrency: 2,
            extra_palette_headings: vec![],
            extra_section_ends: vec![],
        }
    }
}
