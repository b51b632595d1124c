pub mod cmyk;
pub mod config;
pub mod extractor;
pub mod metadata;
pub mod policy;
pub mod section;
pub mod tokens;

pub use cmyk::{Cmyk, ColorError, cmyk_to_hex};
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use extractor::{FindingsExtractor, Palette};
pub use metadata::{Metadata, extract_metadata, find_urls};
pub use policy::{CandidateEntry, Resolution, ResolutionPolicy};
pub use section::{PaletteSection, find_palette_sections};
// Re-export domain types from core (canonical definitions live there)
pub use brandscan_core::{
    ColorEntry, ColorSource, Finding, Findings, SourceReliability, UnresolvedColor,
};

/// Extract the palette and brand metadata from acquired text, using the
/// resolution policy that matches the text's reliability.
///
/// Pipeline:
/// 1. Locate palette sections by heading
/// 2. Group each section's hex and CMYK tokens into labelled entries
/// 3. Resolve each entry (clean: hex first; noisy: CMYK first)
/// 4. Collect brand name, description, tone of voice, fonts and URLs
pub fn extract_findings(text: &str, reliability: SourceReliability) -> Findings {
    FindingsExtractor::new().extract_findings(text, reliability)
}
