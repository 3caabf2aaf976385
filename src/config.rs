use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::utils::QidError;

/// Scanner settings. Every field has a default so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Images narrower than this are rejected.
    pub min_width: u32,
    /// Images shorter than this are rejected.
    pub min_height: u32,
    /// Wider images are downscaled to this width.
    pub max_width: u32,
    pub blur_sigma: f32,
    pub threshold_block_radius: u32,
    pub close_radius: u8,
    /// Tesseract language packs, `+`-separated.
    pub languages: String,
    pub tessdata_path: Option<String>,
    pub tesseract_binary: String,
    /// Run the recognition modes on scoped threads.
    pub parallel_recognition: bool,
    /// Upper bound on one recognizer call, in seconds. A call that runs
    /// longer is abandoned and its mode yields no text.
    pub recognizer_timeout_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            min_width: 200,
            min_height: 100,
            max_width: 1200,
            blur_sigma: 0.8,
            threshold_block_radius: 5,
            close_radius: 1,
            languages: "eng+ara".to_string(),
            tessdata_path: None,
            tesseract_binary: "tesseract".to_string(),
            parallel_recognition: true,
            recognizer_timeout_secs: 30,
        }
    }
}

impl ScannerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, QidError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: ScannerConfig = serde_json::from_str(&raw)
            .map_err(|e| QidError::Config(format!("{}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn recognizer_timeout(&self) -> Duration {
        Duration::from_secs(self.recognizer_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), QidError> {
        if self.max_width < self.min_width {
            return Err(QidError::Config(format!(
                "max_width ({}) is below min_width ({})",
                self.max_width, self.min_width
            )));
        }
        if self.recognizer_timeout_secs == 0 {
            return Err(QidError::Config("recognizer_timeout_secs must be positive".to_string()));
        }
        if self.languages.trim().is_empty() {
            return Err(QidError::Config("languages must not be empty".to_string()));
        }
        Ok(())
    }
}
