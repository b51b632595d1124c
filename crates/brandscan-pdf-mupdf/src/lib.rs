use std::path::Path;

use mupdf::{Colorspace, Document, ImageFormat, Matrix, TextPageFlags};

use brandscan_core::{BackendError, PdfBackend, RenderedPage};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that non-PDF code paths do not transitively
/// depend on it.
///
/// Text is returned exactly as stored, one `\n` per text line in block
/// order. Headers, footers and ligatures are left untouched; palette pages
/// often carry color codes in those regions.
#[derive(Debug, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn open(path: &Path) -> Result<Document, BackendError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;
    Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))
}

impl PdfBackend for MupdfBackend {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        let document = open(path)?;

        let mut pages_text = Vec::new();
        for page_result in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        Ok(pages_text)
    }

    fn render_pages(
        &self,
        path: &Path,
        dpi: u32,
        scratch_dir: &Path,
        visit: &mut dyn FnMut(RenderedPage) -> Result<(), BackendError>,
    ) -> Result<(), BackendError> {
        let document = open(path)?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::RenderError(e.to_string()))?
            .max(0) as usize;

        // PDF user space is 72 units per inch.
        let scale = dpi as f32 / 72.0;
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();

        for (index, page_result) in document
            .pages()
            .map_err(|e| BackendError::RenderError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::RenderError(e.to_string()))?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, true)
                .map_err(|e| BackendError::RenderError(format!("page {}: {}", index + 1, e)))?;

            let image_path = scratch_dir.join(format!("page-{:04}.png", index + 1));
            let image_str = image_path
                .to_str()
                .ok_or_else(|| BackendError::RenderError("invalid scratch path encoding".into()))?;
            pixmap
                .save_as(image_str, ImageFormat::PNG)
                .map_err(|e| BackendError::RenderError(format!("page {}: {}", index + 1, e)))?;

            visit(RenderedPage {
                index,
                page_count,
                width: pixmap.width(),
                height: pixmap.height(),
                image_path,
            })?;
        }

        Ok(())
    }
}
