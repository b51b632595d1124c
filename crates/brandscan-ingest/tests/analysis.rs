//! Classification dispatch, timeouts, cancellation and batches, over mock
//! backends so neither MuPDF nor Tesseract is needed.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use brandscan_core::mock::{MockOcrEngine, MockPdfBackend};
use brandscan_core::{
    AcquisitionError, AcquisitionEvent, AcquisitionMode, Classification, ColorSource, Config,
    OcrEngine, OcrError, SourceReliability,
};
use brandscan_ingest::{Analyzer, IngestError};
use tokio_util::sync::CancellationToken;

/// Embedded text is clean; the scanned rendition of the same page has a
/// corrupted hex code.
const PAGES: &[(&str, &str)] = &[(
    "Cores Primárias\nAzul Royal\n#1A2B3C\nCMYK 10 20 30 40\n",
    "Cores Primarias\nAzul Royal\n#1A2B\nCMYK 10 20 30 40\n",
)];

fn analyzer_with(backend: MockPdfBackend, engine: Arc<dyn OcrEngine>) -> Analyzer {
    Analyzer::with_backends(&Config::default(), Arc::new(backend), Ok(engine)).unwrap()
}

fn pdf_file() -> tempfile::NamedTempFile {
    tempfile::Builder::new().suffix(".pdf").tempfile().unwrap()
}

/// Echoes the page image back after a delay, counting calls.
struct SlowOcr {
    delay: Duration,
    calls: AtomicUsize,
}

impl OcrEngine for SlowOcr {
    fn name(&self) -> &str {
        "slow"
    }

    fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(std::fs::read_to_string(image_path)?)
    }
}

#[test]
fn text_classification_uses_direct_text_and_clean_policy() {
    let file = pdf_file();
    let engine = Arc::new(MockOcrEngine::new());
    let analyzer = analyzer_with(MockPdfBackend::with_pages(PAGES), engine.clone());

    let analysis = analyzer
        .analyze(
            file.path(),
            Classification::ClassifiedText,
            &|_| {},
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(analysis.findings.reliability, SourceReliability::Clean);
    let color = &analysis.findings.colors()[0];
    assert_eq!(color.hex, "#1a2b3c");
    assert_eq!(color.source, ColorSource::Hex);
    assert_eq!(engine.call_count(), 0);
}

#[test]
fn image_classification_uses_ocr_and_noisy_policy() {
    let file = pdf_file();
    let engine = Arc::new(MockOcrEngine::new());
    let analyzer = analyzer_with(MockPdfBackend::with_pages(PAGES), engine.clone());
    let events = Mutex::new(Vec::new());

    let analysis = analyzer
        .analyze(
            file.path(),
            Classification::ClassifiedImage,
            &|e| events.lock().unwrap().push(e),
            &CancellationToken::new(),
        )
        .unwrap();

    assert_eq!(analysis.findings.reliability, SourceReliability::Noisy);
    let color = &analysis.findings.colors()[0];
    assert_eq!(color.label, "Azul Royal");
    assert_eq!(color.hex, "#897a6b");
    assert_eq!(color.source, ColorSource::Cmyk);
    assert_eq!(engine.call_count(), 1);
    assert_eq!(
        events.into_inner().unwrap(),
        vec![
            AcquisitionEvent::PageStarted { page: 1, page_count: 1 },
            AcquisitionEvent::PageFinished {
                page: 1,
                page_count: 1,
                chars: PAGES[0].1.chars().count(),
            },
        ]
    );
}

#[test]
fn image_without_engine_is_engine_unavailable_but_text_still_works() {
    let file = pdf_file();
    let analyzer = Analyzer::with_backends(
        &Config::default(),
        Arc::new(MockPdfBackend::with_pages(PAGES)),
        Err(OcrError::Unavailable("no OCR engine configured; set TESSERACT_CMD".into())),
    )
    .unwrap();
    let cancel = CancellationToken::new();

    let err = analyzer
        .analyze(file.path(), Classification::ClassifiedImage, &|_| {}, &cancel)
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Acquisition(AcquisitionError::EngineUnavailable { .. })
    ));
    assert!(err.to_string().contains("TESSERACT_CMD"));

    assert!(
        analyzer
            .analyze(file.path(), Classification::ClassifiedText, &|_| {}, &cancel)
            .is_ok()
    );
}

#[test]
fn blank_document_is_no_text_extracted() {
    let file = pdf_file();
    let analyzer = analyzer_with(
        MockPdfBackend::with_text_pages(&["  \n", "\t"]),
        Arc::new(MockOcrEngine::new()),
    );
    let err = analyzer
        .analyze(
            file.path(),
            Classification::ClassifiedText,
            &|_| {},
            &CancellationToken::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Acquisition(AcquisitionError::NoTextExtracted {
            mode: AcquisitionMode::Direct,
            ..
        })
    ));
}

#[tokio::test]
async fn slow_ocr_times_out_and_stops_early() {
    let file = pdf_file();
    let pages: Vec<(&str, &str)> = (0..20).map(|_| ("", "Cores\n#FFFFFF\n")).collect();
    let engine = Arc::new(SlowOcr {
        delay: Duration::from_millis(200),
        calls: AtomicUsize::new(0),
    });
    let analyzer = analyzer_with(MockPdfBackend::with_pages(&pages), engine.clone())
        .with_timeout(Some(Duration::from_millis(300)));

    let err = analyzer
        .analyze_async(
            file.path().to_path_buf(),
            Classification::ClassifiedImage,
            Arc::new(|_: AcquisitionEvent| {}),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Acquisition(AcquisitionError::TimedOut {
            mode: AcquisitionMode::Ocr,
            ..
        })
    ));

    // The worker notices the cancelled token at the next page boundary.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(engine.calls.load(Ordering::SeqCst) < pages.len());
}

#[tokio::test]
async fn cancelled_before_start_is_cancelled() {
    let file = pdf_file();
    let analyzer = analyzer_with(
        MockPdfBackend::with_pages(PAGES),
        Arc::new(MockOcrEngine::new()),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = analyzer
        .analyze_async(
            file.path().to_path_buf(),
            Classification::ClassifiedImage,
            Arc::new(|_: AcquisitionEvent| {}),
            cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Acquisition(AcquisitionError::Cancelled { .. })
    ));
}

#[tokio::test]
async fn batch_preserves_input_order_and_isolates_failures() {
    let good = pdf_file();
    let analyzer = analyzer_with(
        MockPdfBackend::with_pages(PAGES),
        Arc::new(MockOcrEngine::new()),
    );
    let missing = good.path().with_file_name("does-not-exist.pdf");

    let results = analyzer
        .analyze_batch(
            vec![
                (good.path().to_path_buf(), Classification::ClassifiedImage),
                (missing.clone(), Classification::ClassifiedText),
                (good.path().to_path_buf(), Classification::ClassifiedText),
            ],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, good.path());
    assert_eq!(
        results[0].1.as_ref().unwrap().findings.reliability,
        SourceReliability::Noisy
    );
    assert_eq!(results[1].0, missing);
    assert!(matches!(
        results[1].1,
        Err(IngestError::Acquisition(AcquisitionError::NotFound { .. }))
    ));
    assert_eq!(
        results[2].1.as_ref().unwrap().findings.reliability,
        SourceReliability::Clean
    );
}

#[test]
fn repeated_analysis_gives_equal_findings() {
    let file = pdf_file();
    let analyzer = analyzer_with(
        MockPdfBackend::with_pages(PAGES),
        Arc::new(MockOcrEngine::new()),
    );
    let cancel = CancellationToken::new();
    for classification in [Classification::ClassifiedText, Classification::ClassifiedImage] {
        let first = analyzer
            .analyze(file.path(), classification, &|_| {}, &cancel)
            .unwrap();
        let second = analyzer
            .analyze(file.path(), classification, &|_| {}, &cancel)
            .unwrap();
        assert_eq!(first, second);
    }
}
