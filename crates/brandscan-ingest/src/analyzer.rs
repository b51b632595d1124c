use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use brandscan_core::{
    AcquisitionError, AcquisitionEvent, Classification, Config, Findings, OcrEngine, OcrError,
    PdfBackend, TextAcquirer,
};
use brandscan_ocr::TesseractEngine;
use brandscan_parsing::{FindingsExtractor, ParsingConfigBuilder};
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{IngestError, pdf_backend};

/// Callback receiving OCR page progress from a worker thread.
pub type ProgressFn = Arc<dyn Fn(AcquisitionEvent) + Send + Sync>;

/// Findings for one document, with what was asked of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub path: PathBuf,
    pub classification: Classification,
    pub findings: Findings,
}

/// Runs the classification state machine: each [`Classification`] selects a
/// fixed acquisition mode and resolution policy.
///
/// Cheap to clone; clones share the backend, OCR engine and extractor.
#[derive(Clone)]
pub struct Analyzer {
    acquirer: Arc<TextAcquirer>,
    extractor: Arc<FindingsExtractor>,
    timeout: Option<Duration>,
    batch_concurrency: usize,
}

impl Analyzer {
    /// MuPDF backend plus a Tesseract engine located from `config.ocr`.
    ///
    /// An unusable OCR configuration does not fail construction: direct
    /// extraction keeps working and OCR calls report `EngineUnavailable`.
    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        let ocr = TesseractEngine::from_config(&config.ocr)
            .map(|engine| Arc::new(engine) as Arc<dyn OcrEngine>);
        Self::with_backends(config, pdf_backend()?, ocr)
    }

    /// Build with explicit backends (used by tests and embedders).
    pub fn with_backends(
        config: &Config,
        backend: Arc<dyn PdfBackend>,
        ocr: Result<Arc<dyn OcrEngine>, OcrError>,
    ) -> Result<Self, IngestError> {
        let acquirer = TextAcquirer::new(backend).with_dpi(config.ocr.dpi);
        let acquirer = match ocr {
            Ok(engine) => acquirer.with_ocr_engine(engine),
            Err(e) => {
                if config.ocr.engine_path.is_some() {
                    tracing::warn!(error = %e, "configured OCR engine is unusable; image documents will fail");
                } else {
                    tracing::debug!(error = %e, "no OCR engine configured");
                }
                acquirer.with_ocr_unavailable(e.to_string())
            }
        };

        let mut parsing = ParsingConfigBuilder::new();
        for heading in &config.extra_palette_headings {
            parsing = parsing.add_palette_heading(heading.clone());
        }
        for end in &config.extra_section_ends {
            parsing = parsing.add_section_end(end.clone());
        }

        Ok(Self {
            acquirer: Arc::new(acquirer),
            extractor: Arc::new(FindingsExtractor::with_config(parsing.build()?)),
            timeout: config.acquisition_timeout_secs.map(Duration::from_secs),
            batch_concurrency: config.batch_concurrency.max(1),
        })
    }

    /// Override the acquisition timeout. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn acquirer(&self) -> &TextAcquirer {
        &self.acquirer
    }

    pub fn extractor(&self) -> &FindingsExtractor {
        &self.extractor
    }

    /// Acquire and resolve one document on the current thread.
    pub fn analyze(
        &self,
        path: &Path,
        classification: Classification,
        progress: &dyn Fn(AcquisitionEvent),
        cancel: &CancellationToken,
    ) -> Result<Analysis, IngestError> {
        let mode = classification.acquisition_mode();
        tracing::info!(path = %path.display(), %classification, %mode, "analyzing document");

        let text = self.acquirer.acquire(path, mode, progress, cancel)?;
        let findings = self
            .extractor
            .extract_findings(&text, classification.reliability());

        tracing::debug!(
            path = %path.display(),
            colors = findings.colors().len(),
            unresolved = findings.unresolved_colors.len(),
            "analysis complete"
        );

        Ok(Analysis {
            path: path.to_path_buf(),
            classification,
            findings,
        })
    }

    /// Run [`analyze`](Self::analyze) on a blocking thread, bounded by the
    /// configured timeout.
    ///
    /// On timeout the worker's token is cancelled so it stops at the next
    /// page boundary and cleans up its scratch directory; the caller gets
    /// `TimedOut` without waiting for that.
    pub async fn analyze_async(
        &self,
        path: PathBuf,
        classification: Classification,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<Analysis, IngestError> {
        let worker_cancel = cancel.child_token();
        let mut handle = {
            let this = self.clone();
            let path = path.clone();
            let worker_cancel = worker_cancel.clone();
            tokio::task::spawn_blocking(move || {
                this.analyze(&path, classification, &*progress, &worker_cancel)
            })
        };

        let Some(limit) = self.timeout else {
            return handle.await?;
        };

        match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined?,
            Err(_) => {
                worker_cancel.cancel();
                tracing::warn!(path = %path.display(), ?limit, "acquisition timed out");
                Err(AcquisitionError::TimedOut {
                    path,
                    mode: classification.acquisition_mode(),
                    secs: limit.as_secs(),
                }
                .into())
            }
        }
    }

    /// Analyze independent documents, at most `batch_concurrency` at a time.
    /// Results come back in input order; one failure does not stop the rest.
    pub async fn analyze_batch(
        &self,
        jobs: Vec<(PathBuf, Classification)>,
        cancel: CancellationToken,
    ) -> Vec<(PathBuf, Result<Analysis, IngestError>)> {
        let silent: ProgressFn = Arc::new(|_: AcquisitionEvent| {});

        futures_util::stream::iter(jobs.into_iter().map(|(path, classification)| {
            let progress = Arc::clone(&silent);
            let cancel = cancel.clone();
            async move {
                let result = self
                    .analyze_async(path.clone(), classification, progress, cancel)
                    .await;
                (path, result)
            }
        }))
        .buffered(self.batch_concurrency)
        .collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandscan_core::mock::{MockOcrEngine, MockPdfBackend};

    fn analyzer(config: &Config) -> Analyzer {
        Analyzer::with_backends(
            config,
            Arc::new(MockPdfBackend::with_text_pages(&["Cores\nAzul #1A2B3C\n"])),
            Ok(Arc::new(MockOcrEngine::new())),
        )
        .unwrap()
    }

    #[test]
    fn extra_headings_reach_the_extractor() {
        let config = Config {
            extra_palette_headings: vec![r"cores\s+sazonais".to_string()],
            ..Default::default()
        };
        let sections = analyzer(&config)
            .extractor()
            .find_palette_sections("Cores Sazonais\nAbóbora #E67E22\n");
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn invalid_extra_heading_is_pattern_error() {
        let config = Config {
            extra_section_ends: vec!["[broken".to_string()],
            ..Default::default()
        };
        let result = Analyzer::with_backends(
            &config,
            Arc::new(MockPdfBackend::with_text_pages(&["x"])),
            Ok(Arc::new(MockOcrEngine::new())),
        );
        assert!(matches!(result, Err(IngestError::Pattern(_))));
    }

    #[test]
    fn dpi_and_ocr_state_come_from_config() {
        let mut config = Config::default();
        config.ocr.dpi = 150;
        let a = analyzer(&config);
        assert_eq!(a.acquirer().dpi(), 150);
        assert!(a.acquirer().ocr_available());

        let without = Analyzer::with_backends(
            &config,
            Arc::new(MockPdfBackend::with_text_pages(&["x"])),
            Err(OcrError::Unavailable("no OCR engine configured; set TESSERACT_CMD".into())),
        )
        .unwrap();
        assert!(!without.acquirer().ocr_available());
    }
}
