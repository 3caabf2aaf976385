use std::collections::BTreeMap;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use crate::models::data::{ExtractedRecord, ValidationOutcome};
use crate::models::identifier::{DecodedIdentifierInfo, IdentifierComponents};

/// Envelope returned to the host for every image submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub processing_metadata: ProcessingMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub details: ErrorDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub processing_id: String,
    /// Seconds.
    pub processing_time: f64,
    pub timestamp: DateTime<Local>,
    pub ocr_engines_used: Vec<String>,
    pub image_processed: bool,
    /// Characters recognized per mode.
    #[serde(default)]
    pub recognizer_variants: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_metadata: Option<serde_json::Value>,
}

/// Result of the identifier-only entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierReport {
    pub valid: bool,
    pub qid_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<IdentifierComponents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_info: Option<DecodedIdentifierInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub service: String,
    pub version: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub supported_formats: Vec<String>,
    pub timestamp: DateTime<Local>,
}
