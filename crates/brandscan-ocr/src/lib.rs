use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use brandscan_core::{DEFAULT_OCR_DPI, DEFAULT_OCR_LANGUAGE, OcrConfig, OcrEngine, OcrError};

/// [`OcrEngine`] backed by the `tesseract` command-line program.
///
/// Each page image is recognized by one `tesseract <image> stdout -l <lang>`
/// invocation; recognized text is read from stdout.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: PathBuf,
    language: String,
    dpi: u32,
}

impl TesseractEngine {
    /// Validate `program` and build an engine.
    ///
    /// A locator containing a path separator must name an existing file; a
    /// bare command name must be found on `PATH`. Either failure is
    /// [`OcrError::Unavailable`].
    pub fn new(program: impl Into<PathBuf>) -> Result<Self, OcrError> {
        let program = program.into();
        if program.as_os_str().is_empty() {
            return Err(OcrError::Unavailable("empty OCR engine path".into()));
        }

        let resolved = if program.components().count() > 1 || program.is_absolute() {
            if !program.is_file() {
                return Err(OcrError::Unavailable(format!(
                    "OCR engine not found at {}",
                    program.display()
                )));
            }
            program
        } else {
            find_on_path(&program).ok_or_else(|| {
                OcrError::Unavailable(format!("{} not found on PATH", program.display()))
            })?
        };

        Ok(Self {
            program: resolved,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            dpi: DEFAULT_OCR_DPI,
        })
    }

    /// Build an engine from configuration. No locator configured is
    /// [`OcrError::Unavailable`].
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let program = config.engine_path.as_ref().ok_or_else(|| {
            OcrError::Unavailable("no OCR engine configured; set TESSERACT_CMD".into())
        })?;
        Ok(Self::new(program)?
            .with_language(&config.language)
            .with_dpi(config.dpi))
    }

    pub fn with_language(mut self, language: &str) -> Self {
        if !language.trim().is_empty() {
            self.language = language.trim().to_string();
        }
        self
    }

    /// Resolution hint passed to the engine; should match the render DPI.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        if dpi > 0 {
            self.dpi = dpi;
        }
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

fn find_on_path(name: &Path) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.program)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--dpi")
            .arg(self.dpi.to_string())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => OcrError::Unavailable(format!(
                    "cannot start {}: {}",
                    self.program.display(),
                    e
                )),
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(
                image = %image_path.display(),
                status = %output.status,
                "tesseract exited with failure"
            );
            return Err(OcrError::RecognitionFailed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_locator_is_unavailable() {
        let err = TesseractEngine::from_config(&OcrConfig::default()).unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(ref m) if m.contains("TESSERACT_CMD")));
    }

    #[test]
    fn nonexistent_path_is_unavailable() {
        let err = TesseractEngine::new("/nonexistent/bin/tesseract").unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(_)));
    }

    #[test]
    fn unknown_command_name_is_unavailable() {
        let err = TesseractEngine::new("brandscan-no-such-ocr-engine").unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(ref m) if m.contains("PATH")));
    }

    #[test]
    fn existing_file_is_accepted_with_config_settings() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = OcrConfig {
            engine_path: Some(file.path().to_path_buf()),
            language: "eng".to_string(),
            dpi: 200,
        };
        let engine = TesseractEngine::from_config(&config).unwrap();
        assert_eq!(engine.program(), file.path());
        assert_eq!(engine.language(), "eng");
        assert_eq!(engine.dpi, 200);
    }

    #[test]
    fn blank_language_keeps_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let engine = TesseractEngine::new(file.path()).unwrap().with_language("  ");
        assert_eq!(engine.language(), "por");
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_reports_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-tesseract");
        std::fs::write(&script, "#!/bin/sh\necho 'Error opening data file' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = TesseractEngine::new(&script).unwrap();
        let err = engine.recognize(Path::new("page-0001.png")).unwrap_err();
        assert!(matches!(err, OcrError::RecognitionFailed(ref m) if m.contains("Error opening data file")));
    }

    #[cfg(unix)]
    #[test]
    fn successful_engine_returns_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-tesseract");
        std::fs::write(&script, "#!/bin/sh\necho \"Cores Primarias\"\necho \"lang=$4\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = TesseractEngine::new(&script).unwrap();
        let text = engine.recognize(Path::new("page-0001.png")).unwrap();
        assert_eq!(text, "Cores Primarias\nlang=por\n");
    }
}
