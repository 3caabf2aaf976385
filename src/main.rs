// Qatar ID scanner command line

use std::path::PathBuf;
use std::process::ExitCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use qid_scanner::models::{ErrorDetails, ScanResponse};
use qid_scanner::{api_info, validate_qid_number, QidError, QidScanner, ScannerConfig};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "qid-scanner", version, about = "Extract and validate Qatar ID card data")]
struct Cli {
    /// JSON file with scanner settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tesseract languages, e.g. eng+ara
    #[arg(long, global = true)]
    languages: Option<String>,

    /// Directory holding tesseract language data
    #[arg(long, global = true)]
    tessdata: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a card photo
    Scan {
        image: PathBuf,

        /// JSON echoed back in the processing metadata
        #[arg(long)]
        metadata: Option<String>,

        /// Print a readable report instead of JSON
        #[arg(long)]
        report: bool,
    },
    /// Check a QID number without OCR
    Validate { qid: String },
    /// Describe the service
    Info,
}

fn load_config(cli: &Cli) -> Result<ScannerConfig, QidError> {
    let mut config = match &cli.config {
        Some(path) => ScannerConfig::from_json_file(path)?,
        None => ScannerConfig::default(),
    };
    if let Some(languages) = &cli.languages {
        config.languages = languages.clone();
    }
    if let Some(tessdata) = &cli.tessdata {
        config.tessdata_path = Some(tessdata.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), QidError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| QidError::Config(format!("could not serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn print_report(response: &ScanResponse) {
    println!("\n===============================================");
    println!("           QATAR ID SCAN REPORT");
    println!("===============================================\n");

    if let Some(data) = &response.data {
        println!("CARD INFORMATION:");
        println!("  QID Number: {}", data.qid_number.as_deref().unwrap_or("-"));
        println!("  Name (English): {}", data.full_name.english().unwrap_or("-"));
        println!("  Name (Arabic): {}", data.full_name.arabic().unwrap_or("-"));
        println!("  Nationality: {}", data.nationality);
        println!("  Date of Birth: {}", data.date_of_birth.as_deref().unwrap_or("-"));
        println!("  Expiry Date: {}", data.expiry_date.as_deref().unwrap_or("-"));
        println!("  Overall Confidence: {:.2}", data.confidence_scores.overall);
    }

    if let Some(validation) = &response.validation {
        if !validation.warnings.is_empty() {
            println!("\nWARNINGS:");
            for warning in &validation.warnings {
                println!("  - {}", warning);
            }
        }
    }

    if let Some(error) = &response.error {
        println!("\nERROR [{}]: {}", error.code, error.message);
        match &error.details {
            ErrorDetails::Text(text) => println!("  {}", text),
            ErrorDetails::List(items) => {
                for item in items {
                    println!("  - {}", item);
                }
            }
        }
    }

    let meta = &response.processing_metadata;
    println!(
        "\nScan {}: {} ({:.2}s)",
        meta.processing_id,
        if response.success { "VALID" } else { "INVALID" },
        meta.processing_time
    );
}

fn run(cli: &Cli) -> Result<bool, QidError> {
    match &cli.command {
        Command::Scan { image, metadata, report } => {
            let config = load_config(cli)?;
            let bytes = std::fs::read(image)?;
            let metadata = match metadata {
                Some(raw) => Some(
                    serde_json::from_str(raw)
                        .map_err(|e| QidError::Config(format!("--metadata is not valid JSON: {}", e)))?,
                ),
                None => None,
            };

            log::info!("Scanning {}", image.display());
            let scanner = QidScanner::new(config);
            let response = scanner.process_qid_image(&STANDARD.encode(bytes), metadata);
            if *report {
                print_report(&response);
            } else {
                print_json(&response)?;
            }
            Ok(response.success)
        }
        Command::Validate { qid } => {
            let report = validate_qid_number(qid);
            print_json(&report)?;
            Ok(report.valid)
        }
        Command::Info => {
            print_json(&api_info())?;
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
