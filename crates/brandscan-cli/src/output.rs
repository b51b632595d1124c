use std::io::Write;
use std::path::Path;

use brandscan_core::{ColorEntry, ColorSource, Finding, Findings, SourceReliability};
use brandscan_ingest::{Analysis, Classification};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print the line announcing which pipeline a document goes through.
pub fn print_analysis_header(
    w: &mut dyn Write,
    file_name: &str,
    classification: Classification,
    color: ColorMode,
) -> std::io::Result<()> {
    let pipeline = match classification {
        Classification::ClassifiedText => "embedded text, clean policy",
        Classification::ClassifiedImage => "OCR, noisy policy",
    };
    if color.enabled() {
        writeln!(
            w,
            "Analyzing {} {}",
            file_name.bold(),
            format!("({})", pipeline).dimmed()
        )?;
    } else {
        writeln!(w, "Analyzing {} ({})", file_name, pipeline)?;
    }
    Ok(())
}

/// Print the full findings report for one document.
pub fn print_findings_report(
    w: &mut dyn Write,
    analysis: &Analysis,
    color: ColorMode,
) -> std::io::Result<()> {
    let findings = &analysis.findings;
    let title = format!("BRAND FINDINGS: {}", display_name(&analysis.path));

    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "=".repeat(60).bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", "=".repeat(60).bold())?;
    } else {
        writeln!(w, "{}", "=".repeat(60))?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", "=".repeat(60))?;
    }
    writeln!(w)?;

    print_field(w, "Brand name", &findings.brand_name, color)?;
    print_field(w, "Description", &findings.description, color)?;
    print_field(w, "Tone of voice", &findings.tone_of_voice, color)?;
    print_list_field(w, "Fonts", &findings.fonts, ", ", color)?;
    print_list_field(w, "URLs", &findings.urls, " ", color)?;
    writeln!(w)?;

    print_palette(w, findings, color)?;
    print_unresolved(w, findings, color)?;

    writeln!(w, "{}", "-".repeat(60))?;
    Ok(())
}

fn print_field(
    w: &mut dyn Write,
    name: &str,
    value: &Finding<String>,
    color: ColorMode,
) -> std::io::Result<()> {
    let label = format!("{}:", name);
    match value {
        Finding::Found(v) => writeln!(w, "{:<15} {}", label, v),
        Finding::NotFound if color.enabled() => {
            writeln!(w, "{:<15} {}", label, "Not found".dimmed())
        }
        Finding::NotFound => writeln!(w, "{:<15} Not found", label),
    }
}

fn print_list_field(
    w: &mut dyn Write,
    name: &str,
    value: &Finding<Vec<String>>,
    separator: &str,
    color: ColorMode,
) -> std::io::Result<()> {
    let joined = match value {
        Finding::Found(items) => Finding::Found(items.join(separator)),
        Finding::NotFound => Finding::NotFound,
    };
    print_field(w, name, &joined, color)
}

fn print_palette(w: &mut dyn Write, findings: &Findings, color: ColorMode) -> std::io::Result<()> {
    let colors = findings.colors();
    if colors.is_empty() {
        if color.enabled() {
            writeln!(w, "Palette: {}", "Not found".dimmed())?;
        } else {
            writeln!(w, "Palette: Not found")?;
        }
        return Ok(());
    }

    writeln!(w, "Palette ({} colors):", colors.len())?;
    let width = colors.iter().map(|c| c.label.chars().count()).max().unwrap_or(0);
    for entry in colors {
        print_color_entry(w, entry, width, findings.reliability, color)?;
    }
    writeln!(w)?;
    Ok(())
}

fn print_color_entry(
    w: &mut dyn Write,
    entry: &ColorEntry,
    width: usize,
    reliability: SourceReliability,
    color: ColorMode,
) -> std::io::Result<()> {
    let via = match (entry.source, reliability) {
        (ColorSource::Hex, _) => "hex",
        (ColorSource::Cmyk, SourceReliability::Clean) => "from CMYK",
        (ColorSource::Cmyk, SourceReliability::Noisy) => "from CMYK, OCR",
    };
    let detail = format!("({}; {})", entry.section, via);

    if color.enabled() {
        let swatch = match hex_rgb(&entry.hex) {
            Some((r, g, b)) => format!("{}", "  ".on_truecolor(r, g, b)),
            None => "  ".to_string(),
        };
        writeln!(
            w,
            "  {} {:<width$}  {}  {}",
            swatch,
            entry.label,
            entry.hex.bold(),
            detail.dimmed(),
            width = width
        )
    } else {
        writeln!(
            w,
            "  - {:<width$}  {}  {}",
            entry.label,
            entry.hex,
            detail,
            width = width
        )
    }
}

fn print_unresolved(
    w: &mut dyn Write,
    findings: &Findings,
    color: ColorMode,
) -> std::io::Result<()> {
    if findings.unresolved_colors.is_empty() {
        return Ok(());
    }

    let heading = format!(
        "Unresolved colors ({}):",
        findings.unresolved_colors.len()
    );
    if color.enabled() {
        writeln!(w, "{}", heading.yellow().bold())?;
    } else {
        writeln!(w, "{}", heading)?;
    }
    for entry in &findings.unresolved_colors {
        if color.enabled() {
            writeln!(
                w,
                "  {} {} {}",
                "?".yellow(),
                entry.label,
                format!("({}): {}", entry.section, entry.reason).dimmed()
            )?;
        } else {
            writeln!(w, "  ? {} ({}): {}", entry.label, entry.section, entry.reason)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print a one-line failure for a document in a batch.
pub fn print_failure(
    w: &mut dyn Write,
    path: &Path,
    error: &dyn std::fmt::Display,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(
            w,
            "{} {}: {}",
            "FAILED".red().bold(),
            display_name(path).bold(),
            error
        )
    } else {
        writeln!(w, "FAILED {}: {}", display_name(path), error)
    }
}

/// Print the closing summary of a batch run.
pub fn print_batch_summary(
    w: &mut dyn Write,
    analyzed: usize,
    failed: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "  Analyzed: {}", analyzed.to_string().green())?;
        if failed > 0 {
            writeln!(w, "  Failed:   {}", failed.to_string().red())?;
        } else {
            writeln!(w, "  Failed:   {}", failed)?;
        }
    } else {
        writeln!(w, "SUMMARY")?;
        writeln!(w, "  Analyzed: {}", analyzed)?;
        writeln!(w, "  Failed:   {}", failed)?;
    }
    Ok(())
}

fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
