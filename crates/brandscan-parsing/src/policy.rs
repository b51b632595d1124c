use brandscan_core::{ColorEntry, ColorSource, SourceReliability, UnresolvedColor};

use crate::cmyk::cmyk_to_hex;
use crate::section::PaletteSection;
use crate::tokens::{CmykDescriptor, ColorToken, HexToken, LineEvent, scan_block};

/// How far the characters of a color entry can be trusted.
///
/// Both policies accept a hex code only when it is exactly `#` plus six hex
/// digits and never repair one. Under `Noisy` (OCR) a short, long or
/// misread hex is expected, so the entry falls back to its CMYK values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPolicy {
    Clean,
    Noisy,
}

impl From<SourceReliability> for ResolutionPolicy {
    fn from(reliability: SourceReliability) -> Self {
        match reliability {
            SourceReliability::Clean => ResolutionPolicy::Clean,
            SourceReliability::Noisy => ResolutionPolicy::Noisy,
        }
    }
}

/// One color entry inside a palette section, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub label: String,
    pub section: String,
    pub hex: Option<HexToken>,
    pub cmyk: Option<CmykDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ColorEntry),
    Unresolved(UnresolvedColor),
}

#[derive(Debug, Default)]
struct Draft {
    label: Option<String>,
    hex: Option<HexToken>,
    cmyk: Option<CmykDescriptor>,
}

impl Draft {
    fn has_color(&self) -> bool {
        self.hex.is_some() || self.cmyk.is_some()
    }
}

/// Group a section's tokens into color entries.
///
/// Label text after an entry that already has a color starts a new entry;
/// further text before the entry's first color (usage notes) is ignored. A second hex or a
/// second CMYK token also starts a new entry. Lines with more than
/// `max_label_words` words are prose and never become labels. Entries with no
/// color token are dropped.
pub fn collect_candidates(section: &PaletteSection, max_label_words: usize) -> Vec<CandidateEntry> {
    let mut drafts: Vec<Draft> = Vec::new();
    let mut current = Draft::default();

    for event in scan_block(&section.body) {
        match event {
            LineEvent::Text(text) => {
                if text.split_whitespace().count() > max_label_words {
                    continue;
                }
                if current.has_color() {
                    drafts.push(std::mem::take(&mut current));
                }
                if current.label.is_none() {
                    current.label = Some(text);
                }
            }
            LineEvent::Token(ColorToken::Hex(hex)) => {
                if current.hex.is_some() {
                    drafts.push(std::mem::take(&mut current));
                }
                current.hex = Some(hex);
            }
            LineEvent::Token(ColorToken::Cmyk(cmyk)) => {
                if current.cmyk.is_some() {
                    drafts.push(std::mem::take(&mut current));
                }
                current.cmyk = Some(cmyk);
            }
        }
    }
    drafts.push(current);
    drafts.retain(Draft::has_color);

    let single = drafts.len() == 1;
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| CandidateEntry {
            label: draft.label.unwrap_or_else(|| {
                if single {
                    section.heading.clone()
                } else {
                    format!("{} {}", section.heading, i + 1)
                }
            }),
            section: section.heading.clone(),
            hex: draft.hex,
            cmyk: draft.cmyk,
        })
        .collect()
}

/// Decide the color of one entry under `policy`: a complete hex wins, then a
/// convertible CMYK descriptor. Never fails: an entry with no usable
/// representation comes back as [`Resolution::Unresolved`].
pub fn resolve(policy: ResolutionPolicy, entry: &CandidateEntry) -> Resolution {
    let hex = entry.hex.as_ref().and_then(HexToken::normalized);
    let cmyk = entry.cmyk.as_ref().map(|d| cmyk_to_hex(&d.raw));

    let resolved = |hex: String, source: ColorSource| {
        Resolution::Resolved(ColorEntry {
            label: entry.label.clone(),
            hex,
            section: entry.section.clone(),
            source,
        })
    };

    if let Some(hex) = hex {
        return resolved(hex, ColorSource::Hex);
    }
    if let Some(Ok(converted)) = &cmyk {
        if policy == ResolutionPolicy::Noisy
            && let Some(token) = &entry.hex
        {
            tracing::debug!(
                label = %entry.label,
                hex = %token.raw,
                cmyk = %converted,
                "incomplete OCR hex; using CMYK"
            );
        }
        return resolved(converted.clone(), ColorSource::Cmyk);
    }

    Resolution::Unresolved(UnresolvedColor {
        label: entry.label.clone(),
        section: entry.section.clone(),
        reason: unresolved_reason(entry, cmyk),
    })
}

fn unresolved_reason(
    entry: &CandidateEntry,
    cmyk: Option<Result<String, crate::cmyk::ColorError>>,
) -> String {
    let mut reasons = Vec::new();
    if let Some(hex) = &entry.hex {
        reasons.push(format!("hex {:?} is incomplete", hex.raw));
    }
    match cmyk {
        Some(Err(e)) => reasons.push(e.to_string()),
        None => reasons.push("no CMYK values".to_string()),
        Some(Ok(_)) => {}
    }
    reasons.join("; ")
}
