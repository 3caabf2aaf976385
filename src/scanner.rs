use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use chrono::{DateTime, Datelike, Local};
use sha2::{Digest, Sha256};
use crate::config::ScannerConfig;
use crate::models::{
    ascii_digit, ApiInfo, ErrorDetails, ErrorInfo, ExtractedRecord, IdentifierCode, IdentifierReport, ProcessingMetadata,
    ScanResponse, ValidationOutcome,
};
#[cfg(feature = "tesseract")]
use crate::processing::TesseractRecognizer;
use crate::processing::{decode_image_payload, recognize_all, FieldAssembler, ImageEnhancer, TextRecognizer};
#[cfg(not(feature = "tesseract"))]
use crate::processing::TesseractCliRecognizer;
use crate::utils::QidError;
use crate::validation::RecordValidator;

/// Where a request is in the pipeline. Terminal stages are `NoTextExtracted`
/// and `Done`; extraction and input failures stop at the stage they hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    ImageEnhanced,
    TextRecognized,
    TextMerged,
    NoTextExtracted,
    Extracted,
    Validated,
    Done,
}

/// Request-local state, never shared between requests.
struct RequestContext {
    processing_id: String,
    started: Instant,
    reference_year: i32,
    stage: PipelineStage,
    image_processed: bool,
    recognizer_variants: BTreeMap<String, usize>,
}

impl RequestContext {
    fn new(image_data: &str) -> Self {
        let started_at = Local::now();
        RequestContext {
            processing_id: correlation_id(image_data, &started_at),
            started: Instant::now(),
            reference_year: started_at.year(),
            stage: PipelineStage::Start,
            image_processed: false,
            recognizer_variants: BTreeMap::new(),
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        log::debug!("[{}] {:?} -> {:?}", self.processing_id, self.stage, stage);
        self.stage = stage;
    }
}

/// Short id for correlating the log lines of one request. Not a secret.
fn correlation_id(image_data: &str, started_at: &DateTime<Local>) -> String {
    let prefix: String = image_data.chars().take(100).collect();
    let digest = Sha256::digest(format!("{}{}", prefix, started_at.to_rfc3339()).as_bytes());
    let mut id = format!("{:x}", digest);
    id.truncate(8);
    id
}

#[cfg(feature = "tesseract")]
fn default_recognizer(config: &ScannerConfig) -> Box<dyn TextRecognizer> {
    Box::new(TesseractRecognizer::new(config))
}

#[cfg(not(feature = "tesseract"))]
fn default_recognizer(config: &ScannerConfig) -> Box<dyn TextRecognizer> {
    Box::new(TesseractCliRecognizer::new(config))
}

/// Runs a card photo through enhancement, recognition, extraction and
/// validation, and packages the outcome for the host application.
pub struct QidScanner {
    config: ScannerConfig,
    enhancer: ImageEnhancer,
    recognizer: Box<dyn TextRecognizer>,
}

impl QidScanner {
    pub fn new(config: ScannerConfig) -> Self {
        let recognizer = default_recognizer(&config);
        Self::with_recognizer(config, recognizer)
    }

    pub fn with_recognizer(config: ScannerConfig, recognizer: Box<dyn TextRecognizer>) -> Self {
        let enhancer = ImageEnhancer::new(&config);
        log::info!("QID scanner initialized with {} recognizer", recognizer.name());
        QidScanner {
            config,
            enhancer,
            recognizer,
        }
    }

    /// Processes a base64 image (optionally a `data:image/...` URL).
    /// Never fails: every outcome is reported in the envelope.
    pub fn process_qid_image(&self, image_data: &str, metadata: Option<serde_json::Value>) -> ScanResponse {
        let mut ctx = RequestContext::new(image_data);
        log::info!("[{}] Starting QID processing", ctx.processing_id);

        let outcome = catch_unwind(AssertUnwindSafe(|| self.run_pipeline(&mut ctx, image_data)));

        let response = match outcome {
            Ok(Ok((record, validation))) => {
                ctx.advance(PipelineStage::Done);
                let error = if validation.valid {
                    None
                } else {
                    Some(ErrorInfo {
                        code: "VALIDATION_FAILED".to_string(),
                        message: "Extracted data failed validation".to_string(),
                        details: ErrorDetails::List(validation.errors.clone()),
                    })
                };
                ScanResponse {
                    success: validation.valid,
                    data: Some(record),
                    validation: Some(validation),
                    error,
                    processing_metadata: self.metadata(&ctx, metadata),
                }
            }
            Ok(Err(err)) => {
                if err.is_internal() {
                    log::error!("[{}] Processing failed: {}", ctx.processing_id, err);
                } else {
                    log::warn!("[{}] Rejected at {:?}: {}", ctx.processing_id, ctx.stage, err);
                }
                self.failure(&ctx, error_info(&err), metadata)
            }
            Err(_) => {
                log::error!("[{}] Processing panicked at {:?}", ctx.processing_id, ctx.stage);
                self.failure(&ctx, internal_error_info(), metadata)
            }
        };

        log::info!(
            "[{}] Processing completed in {:.2}s",
            ctx.processing_id,
            response.processing_metadata.processing_time
        );
        response
    }

    fn run_pipeline(
        &self,
        ctx: &mut RequestContext,
        image_data: &str,
    ) -> Result<(ExtractedRecord, ValidationOutcome), QidError> {
        // Step 1: Decode and enhance the image
        log::info!("[{}] Processing image...", ctx.processing_id);
        let raw_image = decode_image_payload(image_data)?;
        let enhanced = self.enhancer.enhance(&raw_image)?;
        log::debug!("[{}] Enhanced image is {}x{}", ctx.processing_id, enhanced.width(), enhanced.height());
        ctx.image_processed = true;
        ctx.advance(PipelineStage::ImageEnhanced);

        // Step 2: Recognize text in every mode
        log::info!("[{}] Extracting text...", ctx.processing_id);
        let variants = recognize_all(self.recognizer.as_ref(), &enhanced, self.config.parallel_recognition);
        ctx.recognizer_variants = variants.char_counts();
        ctx.advance(PipelineStage::TextRecognized);

        let merged = variants.merged();
        ctx.advance(PipelineStage::TextMerged);
        if merged.trim().is_empty() {
            ctx.advance(PipelineStage::NoTextExtracted);
            return Err(QidError::NoTextExtracted);
        }

        // Step 3: Extract fields
        log::info!("[{}] Extracting QID information...", ctx.processing_id);
        let record = FieldAssembler::new(ctx.reference_year).assemble(&variants)?;
        ctx.advance(PipelineStage::Extracted);

        // Step 4: Validate
        log::info!("[{}] Validating extracted data...", ctx.processing_id);
        let validation = RecordValidator::validate_at(&record, ctx.reference_year);
        ctx.advance(PipelineStage::Validated);

        Ok((record, validation))
    }

    fn failure(&self, ctx: &RequestContext, error: ErrorInfo, metadata: Option<serde_json::Value>) -> ScanResponse {
        ScanResponse {
            success: false,
            data: None,
            validation: None,
            error: Some(error),
            processing_metadata: self.metadata(ctx, metadata),
        }
    }

    fn metadata(&self, ctx: &RequestContext, request_metadata: Option<serde_json::Value>) -> ProcessingMetadata {
        ProcessingMetadata {
            processing_id: ctx.processing_id.clone(),
            processing_time: ctx.started.elapsed().as_secs_f64(),
            timestamp: Local::now(),
            ocr_engines_used: vec![self.recognizer.name().to_string()],
            image_processed: ctx.image_processed,
            recognizer_variants: ctx.recognizer_variants.clone(),
            request_metadata,
        }
    }

    /// Identifier-only check: decodes the QID without any OCR.
    pub fn validate_qid_number(&self, raw: &str) -> IdentifierReport {
        validate_qid_number(raw)
    }

    pub fn api_info(&self) -> ApiInfo {
        api_info()
    }
}

fn error_info(err: &QidError) -> ErrorInfo {
    if err.is_internal() {
        return internal_error_info();
    }

    let details = match err {
        QidError::NoTextExtracted => "OCR failed to detect any readable text",
        QidError::NoIdentifierFound => "Information extraction failed",
        _ => "The image could not be processed",
    };

    ErrorInfo {
        code: err.code().to_string(),
        message: err.to_string(),
        details: ErrorDetails::Text(details.to_string()),
    }
}

fn internal_error_info() -> ErrorInfo {
    ErrorInfo {
        code: "PROCESSING_FAILED".to_string(),
        message: "QID processing failed".to_string(),
        details: ErrorDetails::Text("Unexpected error during processing".to_string()),
    }
}

/// Decodes a QID and reports its components, or the reason it is invalid.
pub fn validate_qid_number(raw: &str) -> IdentifierReport {
    match IdentifierCode::decode(raw) {
        Ok(qid) => IdentifierReport {
            valid: true,
            qid_number: qid.as_str().to_string(),
            components: Some(qid.components().clone()),
            parsed_info: Some(qid.info().clone()),
            error: None,
        },
        Err(e) => IdentifierReport {
            valid: false,
            qid_number: raw.chars().filter_map(ascii_digit).collect(),
            components: None,
            parsed_info: None,
            error: Some(e.to_string()),
        },
    }
}

/// Static description of what the scanner accepts and does.
pub fn api_info() -> ApiInfo {
    ApiInfo {
        service: "QID Scanner".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Qatar ID document processing and validation service".to_string(),
        capabilities: [
            "QID image processing",
            "Text extraction using OCR",
            "QID number validation",
            "Personal information extraction",
            "Date parsing and validation",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        supported_formats: ["JPEG", "PNG", "Base64 encoded images"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        timestamp: Local::now(),
    }
}
