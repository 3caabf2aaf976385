use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use serde::Serialize;
use crate::config::ScannerConfig;
use crate::processing::image::EnhancedImage;

const LETTERS_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ";
const DIGITS_WHITELIST: &str = "0123456789";

/// Recognizer configuration tuned for a character subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RecognitionMode {
    Default,
    NumericOnly,
    AlphabeticOnly,
}

impl RecognitionMode {
    /// Merge order.
    pub const ALL: [RecognitionMode; 3] = [
        RecognitionMode::Default,
        RecognitionMode::NumericOnly,
        RecognitionMode::AlphabeticOnly,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RecognitionMode::Default => "tesseract_default",
            RecognitionMode::NumericOnly => "tesseract_numbers",
            RecognitionMode::AlphabeticOnly => "tesseract_text",
        }
    }

    /// Tesseract page segmentation mode: 6 = uniform block, 8 = single word.
    pub fn page_seg_mode(&self) -> u32 {
        match self {
            RecognitionMode::NumericOnly => 8,
            RecognitionMode::Default | RecognitionMode::AlphabeticOnly => 6,
        }
    }

    pub fn char_whitelist(&self) -> Option<&'static str> {
        match self {
            RecognitionMode::Default => None,
            RecognitionMode::NumericOnly => Some(DIGITS_WHITELIST),
            RecognitionMode::AlphabeticOnly => Some(LETTERS_WHITELIST),
        }
    }
}

/// Black-box text recognition engine.
///
/// Implementations never fail: a recognition error is logged and reported
/// as an empty string.
pub trait TextRecognizer: Send + Sync {
    /// Engine name reported in the response metadata.
    fn name(&self) -> &str;

    fn recognize(&self, image: &EnhancedImage, mode: RecognitionMode) -> String;
}

/// Recognizer output per mode, merged in a fixed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrVariants {
    texts: BTreeMap<RecognitionMode, String>,
}

impl OcrVariants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mode: RecognitionMode, text: &str) {
        self.texts.insert(mode, text.trim().to_string());
    }

    pub fn get(&self, mode: RecognitionMode) -> Option<&str> {
        self.texts.get(&mode).map(String::as_str)
    }

    /// Non-empty texts joined by newlines, default mode first.
    pub fn merged(&self) -> String {
        self.texts
            .values()
            .filter(|text| !text.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn variants_with_text(&self) -> usize {
        self.texts.values().filter(|text| !text.trim().is_empty()).count()
    }

    /// Characters recognized per mode key.
    pub fn char_counts(&self) -> BTreeMap<String, usize> {
        self.texts
            .iter()
            .map(|(mode, text)| (mode.key().to_string(), text.chars().count()))
            .collect()
    }
}

/// Runs every recognition mode over the same image.
///
/// A mode that panics contributes an empty string; the other modes still run.
pub fn recognize_all(recognizer: &dyn TextRecognizer, image: &EnhancedImage, parallel: bool) -> OcrVariants {
    let mut variants = OcrVariants::new();

    if parallel {
        std::thread::scope(|scope| {
            let handles: Vec<_> = RecognitionMode::ALL
                .iter()
                .map(|&mode| (mode, scope.spawn(move || recognizer.recognize(image, mode))))
                .collect();

            for (mode, handle) in handles {
                let text = handle.join().unwrap_or_else(|_| {
                    log::warn!("Recognizer panicked in mode {}", mode.key());
                    String::new()
                });
                variants.insert(mode, &text);
            }
        });
    } else {
        for mode in RecognitionMode::ALL {
            let text = catch_unwind(AssertUnwindSafe(|| recognizer.recognize(image, mode))).unwrap_or_else(|_| {
                log::warn!("Recognizer panicked in mode {}", mode.key());
                String::new()
            });
            variants.insert(mode, &text);
        }
    }

    for (mode, text) in &variants.texts {
        if text.is_empty() {
            log::warn!("No text recognized in mode {}", mode.key());
        } else {
            log::debug!("Mode {} recognized {} characters", mode.key(), text.chars().count());
        }
    }

    variants
}

/// Poll interval while waiting on a recognizer process.
const WAIT_POLL: Duration = Duration::from_millis(20);

enum CliFailure {
    TimedOut,
    Failed(String),
}

/// Waits for `child` until `timeout` passes. Returns `None` on timeout,
/// leaving the child running.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(WAIT_POLL);
    }
}

/// Runs the `tesseract` executable once per call, killing it when it
/// outlives the configured timeout.
pub struct TesseractCliRecognizer {
    binary: String,
    languages: String,
    tessdata_path: Option<String>,
    timeout: Duration,
}

impl TesseractCliRecognizer {
    pub fn new(config: &ScannerConfig) -> Self {
        TesseractCliRecognizer {
            binary: config.tesseract_binary.clone(),
            languages: config.languages.clone(),
            tessdata_path: config.tessdata_path.clone(),
            timeout: config.recognizer_timeout(),
        }
    }

    // tesseract writes its text to `<output_base>.txt`
    fn build_command(&self, image_path: &Path, output_base: &Path, mode: RecognitionMode) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg(output_base)
            .arg("-l")
            .arg(&self.languages)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(mode.page_seg_mode().to_string());

        if let Some(whitelist) = mode.char_whitelist() {
            cmd.arg("-c").arg(format!("tessedit_char_whitelist={}", whitelist));
        }
        if let Some(tessdata) = &self.tessdata_path {
            cmd.env("TESSDATA_PREFIX", tessdata);
        }
        cmd
    }

    fn run(&self, image: &EnhancedImage, mode: RecognitionMode) -> Result<String, CliFailure> {
        let failed = |e: std::io::Error| CliFailure::Failed(e.to_string());

        let temp_file = image
            .save_to_temp_file()
            .map_err(|e| CliFailure::Failed(e.to_string()))?;
        let work_dir = tempfile::tempdir().map_err(failed)?;
        let output_base = work_dir.path().join("out");
        let stderr_log = work_dir.path().join("stderr.log");

        let mut child = self
            .build_command(temp_file.path(), &output_base, mode)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(File::create(&stderr_log).map_err(failed)?)
            .spawn()
            .map_err(|e| CliFailure::Failed(format!("failed to run {}: {}", self.binary, e)))?;

        let status = match wait_with_deadline(&mut child, self.timeout).map_err(failed)? {
            Some(status) => status,
            None => {
                // the child may have exited in between; kill errors are harmless
                let _ = child.kill();
                let _ = child.wait();
                return Err(CliFailure::TimedOut);
            }
        };

        if !status.success() {
            let stderr = std::fs::read_to_string(&stderr_log).unwrap_or_default();
            return Err(CliFailure::Failed(format!("{}: {}", status, stderr.trim())));
        }

        let text = std::fs::read_to_string(output_base.with_extension("txt")).map_err(failed)?;
        Ok(text.trim().to_string())
    }
}

impl TextRecognizer for TesseractCliRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &EnhancedImage, mode: RecognitionMode) -> String {
        match self.run(image, mode) {
            Ok(text) => text,
            Err(CliFailure::TimedOut) => {
                log::warn!(
                    "Tesseract OCR timed out after {}s in mode {}",
                    self.timeout.as_secs_f64(),
                    mode.key()
                );
                String::new()
            }
            Err(CliFailure::Failed(e)) => {
                log::error!("Tesseract OCR failed in mode {}: {}", mode.key(), e);
                String::new()
            }
        }
    }
}
