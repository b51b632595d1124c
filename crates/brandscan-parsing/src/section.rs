use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{
    DEFAULT_PALETTE_HEADINGS, DEFAULT_SECTION_ENDS, ParsingConfig, defaults,
    palette_heading_pattern, section_end_pattern,
};

/// A palette section: the heading line that opened it and the lines under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSection {
    pub heading: String,
    pub body: String,
}

pub(crate) static PALETTE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&palette_heading_pattern(&defaults(DEFAULT_PALETTE_HEADINGS))).unwrap()
});

pub(crate) static SECTION_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&section_end_pattern(&defaults(DEFAULT_SECTION_ENDS))).unwrap()
});

/// Locate every palette section in the document text.
///
/// A section opens at a line that is a palette heading (`Cores Primárias`,
/// `Brand Colors:`, `2.1 Paleta de Cores`) and runs until the next palette
/// heading, a known non-palette heading (`Tipografia`, `Tone of Voice`, ...),
/// or the end of the text. Sections with an empty body are dropped.
pub fn find_palette_sections(text: &str) -> Vec<PaletteSection> {
    find_palette_sections_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`find_palette_sections`].
pub(crate) fn find_palette_sections_with_config(
    text: &str,
    config: &ParsingConfig,
) -> Vec<PaletteSection> {
    let heading_re = config
        .palette_heading_re
        .as_ref()
        .unwrap_or(&PALETTE_HEADING_RE);
    let end_re = config.section_end_re.as_ref().unwrap_or(&SECTION_END_RE);

    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if heading_re.is_match(trimmed) {
            close(&mut sections, current.take());
            current = Some((trimmed.trim_end_matches(':').trim_end().to_string(), Vec::new()));
            continue;
        }

        if current.is_some() && end_re.is_match(trimmed) {
            close(&mut sections, current.take());
            continue;
        }

        if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    close(&mut sections, current);

    tracing::debug!(count = sections.len(), "palette sections found");
    sections
}

fn close(sections: &mut Vec<PaletteSection>, open: Option<(String, Vec<&str>)>) {
    let Some((heading, body)) = open else {
        return;
    };
    if body.iter().all(|l| l.trim().is_empty()) {
        return;
    }
    sections.push(PaletteSection {
        heading,
        body: body.join("\n"),
    });
}
