pub mod config;
pub mod models;
pub mod processing;
pub mod scanner;
pub mod utils;
pub mod validation;

pub use config::ScannerConfig;
pub use scanner::{api_info, validate_qid_number, PipelineStage, QidScanner};
pub use utils::{InvalidIdentifier, QidError};
