use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Config, OcrConfig};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub ocr: Option<OcrSection>,
    pub analysis: Option<AnalysisSection>,
    pub palette: Option<PaletteSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSection {
    pub engine_path: Option<String>,
    pub language: Option<String>,
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub timeout_secs: Option<u64>,
    pub batch_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaletteSection {
    pub extra_headings: Option<Vec<String>>,
    pub extra_section_ends: Option<Vec<String>>,
}

/// Platform config directory path: `<config_dir>/brandscan/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("brandscan").join("config.toml"))
}

/// Load config by cascading CWD `.brandscan.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".brandscan.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        ocr: Some(OcrSection {
            engine_path: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.engine_path.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.engine_path.clone())),
            language: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.language.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.language.clone())),
            dpi: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.dpi)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.dpi)),
        }),
        analysis: Some(AnalysisSection {
            timeout_secs: overlay
                .analysis
                .as_ref()
                .and_then(|a| a.timeout_secs)
                .or_else(|| base.analysis.as_ref().and_then(|a| a.timeout_secs)),
            batch_concurrency: overlay
                .analysis
                .as_ref()
                .and_then(|a| a.batch_concurrency)
                .or_else(|| base.analysis.as_ref().and_then(|a| a.batch_concurrency)),
        }),
        palette: Some(PaletteSection {
            extra_headings: overlay
                .palette
                .as_ref()
                .and_then(|p| p.extra_headings.clone())
                .or_else(|| base.palette.as_ref().and_then(|p| p.extra_headings.clone())),
            extra_section_ends: overlay
                .palette
                .as_ref()
                .and_then(|p| p.extra_section_ends.clone())
                .or_else(|| {
                    base.palette
                        .as_ref()
                        .and_then(|p| p.extra_section_ends.clone())
                }),
        }),
    }
}

impl ConfigFile {
    /// Resolve file values over the built-in defaults.
    pub fn into_config(self) -> Config {
        let defaults = Config::default();
        let ocr = self.ocr.unwrap_or_default();
        let analysis = self.analysis.unwrap_or_default();
        let palette = self.palette.unwrap_or_default();

        Config {
            ocr: OcrConfig {
                engine_path: ocr.engine_path.map(PathBuf::from),
                language: ocr.language.unwrap_or(defaults.ocr.language),
                dpi: ocr.dpi.filter(|d| *d > 0).unwrap_or(defaults.ocr.dpi),
            },
            acquisition_timeout_secs: analysis.timeout_secs.filter(|s| *s > 0),
            batch_concurrency: analysis
                .batch_concurrency
                .filter(|n| *n > 0)
                .unwrap_or(defaults.batch_concurrency),
            extra_palette_headings: palette.extra_headings.unwrap_or_default(),
            extra_section_ends: palette.extra_section_ends.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let toml_str = "[ocr]\nengine_path = \"/usr/bin/tesseract\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let config = parsed.into_config();
        assert_eq!(
            config.ocr.engine_path.as_deref(),
            Some(Path::new("/usr/bin/tesseract"))
        );
        assert_eq!(config.ocr.language, "por");
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.acquisition_timeout_secs, None);
    }

    #[test]
    fn palette_table_round_trip_toml() {
        let config = ConfigFile {
            palette: Some(PaletteSection {
                extra_headings: Some(vec!["cores de destaque".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.palette.unwrap().extra_headings.unwrap(),
            vec!["cores de destaque".to_string()]
        );
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            ocr: Some(OcrSection {
                language: Some("eng".to_string()),
                dpi: Some(200),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            ocr: Some(OcrSection {
                dpi: Some(400),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).into_config();
        assert_eq!(merged.ocr.dpi, 400);
        assert_eq!(merged.ocr.language, "eng");
    }

    #[test]
    fn zero_values_are_ignored() {
        let toml_str = "[ocr]\ndpi = 0\n[analysis]\ntimeout_secs = 0\nbatch_concurrency = 0\n";
        let config = toml::from_str::<ConfigFile>(toml_str)
            .unwrap()
            .into_config();
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.acquisition_timeout_secs, None);
        assert_eq!(config.batch_concurrency, 2);
    }
}
