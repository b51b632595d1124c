use brandscan_core::{ColorEntry, Finding, Findings, SourceReliability, UnresolvedColor};

use crate::config::ParsingConfig;
use crate::metadata::extract_metadata_with_config;
use crate::policy::{Resolution, ResolutionPolicy, collect_candidates, resolve};
use crate::section::{PaletteSection, find_palette_sections_with_config};

/// Resolved and unresolved palette entries, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<ColorEntry>,
    pub unresolved: Vec<UnresolvedColor>,
}

/// Turns acquired document text into [`Findings`].
///
/// Stateless apart from its configuration: the same text and reliability
/// always produce the same findings.
#[derive(Debug, Clone, Default)]
pub struct FindingsExtractor {
    config: ParsingConfig,
}

impl FindingsExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn find_palette_sections(&self, text: &str) -> Vec<PaletteSection> {
        find_palette_sections_with_config(text, &self.config)
    }

    /// Resolve every color entry of every palette section under `policy`.
    /// Identical `(label, hex)` pairs are kept once.
    pub fn resolve_palette(&self, text: &str, policy: ResolutionPolicy) -> Palette {
        let mut palette = Palette::default();

        for section in self.find_palette_sections(text) {
            let candidates = collect_candidates(&section, self.config.max_label_words);
            tracing::debug!(
                section = %section.heading,
                entries = candidates.len(),
                ?policy,
                "resolving palette section"
            );

            for candidate in &candidates {
                match resolve(policy, candidate) {
                    Resolution::Resolved(color) => {
                        let duplicate = palette
                            .colors
                            .iter()
                            .any(|c| c.label == color.label && c.hex == color.hex);
                        if !duplicate {
                            palette.colors.push(color);
                        }
                    }
                    Resolution::Unresolved(missing) => palette.unresolved.push(missing),
                }
            }
        }

        palette
    }

    /// Palette plus brand metadata. Every field is either found or
    /// explicitly [`Finding::NotFound`].
    pub fn extract_findings(&self, text: &str, reliability: SourceReliability) -> Findings {
        let palette = self.resolve_palette(text, reliability.into());
        let metadata = extract_metadata_with_config(text, &self.config);

        Findings {
            reliability,
            palette: Finding::from(Some(palette.colors).filter(|c| !c.is_empty())),
            unresolved_colors: palette.unresolved,
            brand_name: metadata.brand_name,
            description: metadata.description,
            urls: metadata.urls,
            tone_of_voice: metadata.tone_of_voice,
            fonts: metadata.fonts,
        }
    }
}
