// In-process recognizer through the libtesseract bindings.
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tesseract::{PageSegMode, Tesseract};
use crate::config::ScannerConfig;
use crate::processing::image::EnhancedImage;
use crate::processing::ocr::{RecognitionMode, TextRecognizer};
use crate::utils::QidError;

/// A fresh engine is initialized per call, so one instance can serve all
/// modes concurrently. Each call runs on its own thread; a call that outlives
/// the timeout is abandoned and the thread is left to finish on its own.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    languages: String,
    tessdata_path: Option<String>,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(config: &ScannerConfig) -> Self {
        TesseractRecognizer {
            languages: config.languages.clone(),
            tessdata_path: config.tessdata_path.clone(),
            timeout: config.recognizer_timeout(),
        }
    }

    fn page_seg_mode(mode: RecognitionMode) -> PageSegMode {
        match mode.page_seg_mode() {
            8 => PageSegMode::PsmSingleWord,
            _ => PageSegMode::PsmSingleBlock,
        }
    }

    fn run(&self, image: &EnhancedImage, mode: RecognitionMode) -> Result<String, QidError> {
        let temp_file = image.save_to_temp_file()?;
        let path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| QidError::Recognizer("Failed to convert path to string".to_string()))?;

        let mut tess = Tesseract::new(self.tessdata_path.as_deref(), Some(&self.languages))
            .map_err(|e| QidError::Recognizer(format!("Tesseract init error: {}", e)))?;

        if let Some(whitelist) = mode.char_whitelist() {
            tess = tess
                .set_variable("tessedit_char_whitelist", whitelist)
                .map_err(|e| QidError::Recognizer(format!("Tesseract set variable error: {}", e)))?;
        }

        tess.set_page_seg_mode(Self::page_seg_mode(mode));

        let mut tess = tess
            .set_image(path)
            .map_err(|e| QidError::Recognizer(format!("Tesseract set image error: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| QidError::Recognizer(format!("Tesseract error: {}", e)))?;

        Ok(text.trim().to_string())
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &EnhancedImage, mode: RecognitionMode) -> String {
        let (tx, rx) = mpsc::channel();
        let worker = self.clone();
        let image = image.clone();
        std::thread::spawn(move || {
            let _ = tx.send(worker.run(&image, mode));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                log::error!("Tesseract OCR failed in mode {}: {}", mode.key(), e);
                String::new()
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Tesseract OCR timed out after {}s in mode {}",
                    self.timeout.as_secs_f64(),
                    mode.key()
                );
                String::new()
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::error!("Tesseract OCR worker panicked in mode {}", mode.key());
                String::new()
            }
        }
    }
}
