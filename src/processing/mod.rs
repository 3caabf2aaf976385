pub mod assembler;
pub mod confidence;
pub mod extractors;
pub mod image;
pub mod ocr;
#[cfg(feature = "tesseract")]
pub mod tesseract;

pub use assembler::{resolve_dates, FieldAssembler, ResolvedDates};
pub use confidence::{ConfidenceScorer, ExtractionShape};
pub use self::image::{decode_image_payload, EnhancedImage, ImageEnhancer};
pub use ocr::{recognize_all, OcrVariants, RecognitionMode, TesseractCliRecognizer, TextRecognizer};
#[cfg(feature = "tesseract")]
pub use self::tesseract::TesseractRecognizer;
