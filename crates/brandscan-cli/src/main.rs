use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brandscan_core::Config;
use brandscan_core::config_file;
use brandscan_ingest::analyzer::ProgressFn;
use brandscan_ingest::{AcquisitionEvent, AcquisitionMode, Analyzer, Classification, tools};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

mod output;

use output::ColorMode;

/// Brand guideline scanner - extract color palettes and brand metadata from PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one brand guideline PDF
    Analyze {
        /// Path to the PDF file
        file_path: PathBuf,

        /// How the PDF was produced: `text` (embedded text) or `image` (scanned, needs OCR)
        #[arg(long)]
        kind: Classification,

        /// Print findings as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Path to output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        ocr: OcrArgs,
    },

    /// Analyze several PDFs of the same kind concurrently
    Batch {
        /// Paths to the PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// How the PDFs were produced: `text` or `image`
        #[arg(long)]
        kind: Classification,

        /// Print findings as JSON
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Number of documents analyzed at once
        #[arg(short, long)]
        jobs: Option<usize>,

        #[command(flatten)]
        ocr: OcrArgs,
    },

    /// Run a single stateless tool and print its JSON result
    Tool {
        #[command(subcommand)]
        tool: ToolCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ToolCommand {
    /// Embedded text of every page
    ExtractText { file_path: PathBuf },
    /// OCR text of every page
    ExtractTextViaOcr { file_path: PathBuf },
    /// Convert a CMYK descriptor such as "C:0 M:100 Y:100 K:0" to #rrggbb
    CmykToHex { descriptor: String },
}

#[derive(Args, Debug, Default)]
struct OcrArgs {
    /// Path to the tesseract executable
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// OCR language (tesseract traineddata name)
    #[arg(long)]
    lang: Option<String>,

    /// Page render resolution for OCR
    #[arg(long)]
    dpi: Option<u32>,

    /// Give up on text acquisition after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Command::Analyze {
            file_path,
            kind,
            json,
            no_color,
            output,
            ocr,
        } => {
            let config = resolve_config(&ocr);
            analyze(file_path, kind, json, no_color, output, config).await
        }
        Command::Batch {
            files,
            kind,
            json,
            no_color,
            jobs,
            ocr,
        } => {
            let mut config = resolve_config(&ocr);
            if let Some(jobs) = jobs.filter(|n| *n > 0) {
                config.batch_concurrency = jobs;
            }
            batch(files, kind, json, no_color, config).await
        }
        Command::Tool { tool } => run_tool(tool, resolve_config(&OcrArgs::default())),
    }
}

/// Resolve configuration: CLI flags > env vars > config file > defaults.
fn resolve_config(args: &OcrArgs) -> Config {
    let mut config = config_file::load_config().into_config();

    if let Some(path) = args
        .tesseract
        .clone()
        .or_else(|| env_string("TESSERACT_CMD").map(PathBuf::from))
    {
        config.ocr.engine_path = Some(path);
    }
    if let Some(lang) = args.lang.clone().or_else(|| env_string("BRANDSCAN_OCR_LANG")) {
        config.ocr.language = lang;
    }
    if let Some(dpi) = args
        .dpi
        .or_else(|| env_parsed("BRANDSCAN_OCR_DPI"))
        .filter(|d| *d > 0)
    {
        config.ocr.dpi = dpi;
    }
    if let Some(secs) = args.timeout.or_else(|| env_parsed("BRANDSCAN_TIMEOUT_SECS")) {
        config.acquisition_timeout_secs = (secs > 0).then_some(secs);
    }

    config
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env_string(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparsable environment variable");
            None
        }
    }
}

fn output_writer(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    })
}

/// Cancel `token` on Ctrl+C.
fn cancel_on_ctrl_c(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

/// A bar advanced by OCR page events. Hidden for direct extraction, which
/// has no pages to report, and automatically when stderr is not a terminal.
fn ocr_progress_bar(kind: Classification) -> (indicatif::ProgressBar, ProgressFn) {
    use indicatif::{ProgressBar, ProgressStyle};

    let bar = match kind.acquisition_mode() {
        AcquisitionMode::Ocr => ProgressBar::new(0),
        AcquisitionMode::Direct => ProgressBar::hidden(),
    };
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.cyan} {msg} [{bar:40.cyan/dim}] {pos}/{len} pages (eta {eta})",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }

    let handle = bar.clone();
    let progress: ProgressFn = Arc::new(move |event: AcquisitionEvent| match event {
        AcquisitionEvent::PageStarted { page, page_count } => {
            handle.set_length(page_count as u64);
            handle.set_message(format!("OCR page {}", page));
        }
        AcquisitionEvent::PageFinished { .. } => handle.inc(1),
    });
    (bar, progress)
}

async fn analyze(
    file_path: PathBuf,
    kind: Classification,
    json: bool,
    no_color: bool,
    output: Option<PathBuf>,
    config: Config,
) -> anyhow::Result<()> {
    let use_color = !no_color && !json && output.is_none();
    let color = ColorMode(use_color);
    let mut writer = output_writer(output.as_deref())?;

    let analyzer = Analyzer::from_config(&config)?;

    if !json {
        output::print_analysis_header(
            &mut writer,
            &output::display_name(&file_path),
            kind,
            color,
        )?;
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let (bar, progress) = ocr_progress_bar(kind);
    let result = analyzer
        .analyze_async(file_path, kind, progress, cancel)
        .await;
    bar.finish_and_clear();
    let analysis = result?;

    if json {
        serde_json::to_writer_pretty(&mut writer, &analysis)?;
        writeln!(writer)?;
    } else {
        output::print_findings_report(&mut writer, &analysis, color)?;
    }
    Ok(())
}

async fn batch(
    files: Vec<PathBuf>,
    kind: Classification,
    json: bool,
    no_color: bool,
    config: Config,
) -> anyhow::Result<()> {
    let color = ColorMode(!no_color && !json);
    let mut writer = std::io::stdout();

    let analyzer = Analyzer::from_config(&config)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(&cancel);

    let total = files.len();
    tracing::info!(documents = total, concurrency = config.batch_concurrency, "starting batch");
    let jobs = files.into_iter().map(|path| (path, kind)).collect();
    let results = analyzer.analyze_batch(jobs, cancel).await;

    let mut failed = 0;
    if json {
        let entries: Vec<serde_json::Value> = results
            .iter()
            .map(|(path, result)| match result {
                Ok(analysis) => serde_json::json!({
                    "path": path,
                    "analysis": analysis,
                }),
                Err(e) => serde_json::json!({
                    "path": path,
                    "error": e.to_string(),
                }),
            })
            .collect();
        failed = results.iter().filter(|(_, r)| r.is_err()).count();
        serde_json::to_writer_pretty(&mut writer, &entries)?;
        writeln!(writer)?;
    } else {
        for (path, result) in &results {
            match result {
                Ok(analysis) => output::print_findings_report(&mut writer, analysis, color)?,
                Err(e) => {
                    failed += 1;
                    output::print_failure(&mut writer, path, e, color)?;
                }
            }
        }
        output::print_batch_summary(&mut writer, total - failed, failed, color)?;
    }

    if failed > 0 {
        anyhow::bail!("{} of {} documents failed", failed, total);
    }
    Ok(())
}

fn run_tool(tool: ToolCommand, config: Config) -> anyhow::Result<()> {
    let value = match tool {
        ToolCommand::ExtractText { file_path } => {
            let analyzer = Analyzer::from_config(&config)?;
            serde_json::to_value(tools::extract_text(analyzer.acquirer(), &file_path))?
        }
        ToolCommand::ExtractTextViaOcr { file_path } => {
            let analyzer = Analyzer::from_config(&config)?;
            serde_json::to_value(tools::extract_text_via_ocr(
                analyzer.acquirer(),
                &file_path,
            ))?
        }
        ToolCommand::CmykToHex { descriptor } => match tools::cmyk_to_hex(&descriptor) {
            Ok(hex) => serde_json::json!({ "hex": hex }),
            Err(error) => serde_json::json!({ "error": error }),
        },
    };

    let mut stdout = std::io::stdout();
    serde_json::to_writer_pretty(&mut stdout, &value)?;
    writeln!(stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "brandscan",
            "analyze",
            "guia.pdf",
            "--kind",
            "imagem",
            "--json",
            "--tesseract",
            "/usr/bin/tesseract",
            "--dpi",
            "200",
        ])
        .unwrap();
        let Command::Analyze {
            kind, json, ocr, ..
        } = cli.command
        else {
            panic!("expected analyze");
        };
        assert_eq!(kind, Classification::ClassifiedImage);
        assert!(json);
        assert_eq!(ocr.dpi, Some(200));
        assert_eq!(ocr.tesseract, Some(PathBuf::from("/usr/bin/tesseract")));
    }

    #[test]
    fn cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["brandscan", "analyze", "a.pdf", "--kind", "scan"]).is_err());
    }

    #[test]
    fn cli_parses_tool_subcommand() {
        let cli =
            Cli::try_parse_from(["brandscan", "tool", "cmyk-to-hex", "C:0 M:100 Y:100 K:0"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Command::Tool {
                tool: ToolCommand::CmykToHex { .. }
            }
        ));
    }

    #[test]
    fn progress_bar_only_shown_for_ocr() {
        let (text_bar, _) = ocr_progress_bar(Classification::ClassifiedText);
        assert!(text_bar.is_hidden());

        let (image_bar, progress) = ocr_progress_bar(Classification::ClassifiedImage);
        progress(AcquisitionEvent::PageStarted { page: 1, page_count: 3 });
        progress(AcquisitionEvent::PageFinished {
            page: 1,
            page_count: 3,
            chars: 10,
        });
        assert_eq!(image_bar.length(), Some(3));
        assert_eq!(image_bar.position(), 1);
    }

    #[test]
    fn flags_override_resolved_config() {
        let args = OcrArgs {
            tesseract: Some(PathBuf::from("/opt/tesseract")),
            lang: Some("eng".into()),
            dpi: Some(150),
            timeout: Some(0),
        };
        let config = resolve_config(&args);
        assert_eq!(config.ocr.engine_path, Some(PathBuf::from("/opt/tesseract")));
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.dpi, 150);
        assert_eq!(config.acquisition_timeout_secs, None);
    }
}
