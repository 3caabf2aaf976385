use thiserror::Error;

/// Reasons a raw string is not a usable QID number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIdentifier {
    #[error("QID must be 11 digits, got {0}")]
    WrongLength(usize),

    #[error("Invalid century digit: {0}. Must be 2 or 3")]
    InvalidCenturyDigit(char),

    #[error("Invalid birth year: {0}. Cannot be in the future")]
    FutureBirthYear(i32),

    #[error("Invalid birth year: {0}. Too old")]
    TooOldBirthYear(i32),
}

#[derive(Debug, Error)]
pub enum QidError {
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("Image processing failed: {0}")]
    ImageDecode(String),

    #[error("Image too small: {width}x{height}. Minimum size: {min_width}x{min_height}")]
    ImageTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },

    #[error("No text could be extracted from the image")]
    NoTextExtracted,

    #[error("No valid QID number found")]
    NoIdentifierFound,

    #[error("Text recognition error: {0}")]
    Recognizer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QidError {
    /// Stable code reported in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            QidError::InvalidImageData(_) => "INVALID_IMAGE_DATA",
            QidError::ImageDecode(_) => "IMAGE_DECODE_FAILED",
            QidError::ImageTooSmall { .. } => "IMAGE_TOO_SMALL",
            QidError::NoTextExtracted => "NO_TEXT_EXTRACTED",
            QidError::NoIdentifierFound => "EXTRACTION_FAILED",
            QidError::Recognizer(_) | QidError::Config(_) | QidError::Io(_) => "PROCESSING_FAILED",
        }
    }

    /// Input and extraction failures are reported as-is; everything else is
    /// an internal failure whose message is not shown to the caller.
    pub fn is_internal(&self) -> bool {
        self.code() == "PROCESSING_FAILED"
    }
}
