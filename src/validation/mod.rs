pub mod dates;
pub mod identifier;
pub mod names;

pub use dates::DateValidator;
pub use identifier::IdentifierValidator;
pub use names::NameValidator;

use std::collections::BTreeMap;
use crate::models::{current_year, ExtractedRecord, ValidationOutcome};

/// Errors, warnings and scores produced by one validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCheck {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub scores: BTreeMap<String, f64>,
}

impl FieldCheck {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn score(&mut self, field: &str, value: f64) {
        self.scores.insert(field.to_string(), value);
    }
}

/// The value of an optional field, treating blank strings as absent.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Year of a `YYYY-MM-DD` string: the integer before the first dash.
pub(crate) fn leading_year(date: &str) -> Option<i32> {
    date.split('-').next()?.trim().parse().ok()
}

/// Re-validates an extracted record independently of how it was produced.
pub struct RecordValidator;

impl RecordValidator {
    pub fn validate(record: &ExtractedRecord) -> ValidationOutcome {
        Self::validate_at(record, current_year())
    }

    /// Validates against a fixed reference year. Pure: the same record and
    /// year always give the same outcome.
    pub fn validate_at(record: &ExtractedRecord, current_year: i32) -> ValidationOutcome {
        let checks = [
            IdentifierValidator::validate(record, current_year),
            NameValidator::validate(record),
            DateValidator::validate(record, current_year),
        ];

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut confidence_scores = BTreeMap::new();
        for check in checks {
            errors.extend(check.errors);
            warnings.extend(check.warnings);
            confidence_scores.extend(check.scores);
        }

        ValidationOutcome {
            valid: errors.is_empty(),
            errors,
            warnings,
            confidence_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameFields;

    fn good_record() -> ExtractedRecord {
        ExtractedRecord {
            qid_number: Some("28563401234".to_string()),
            full_name: NameFields {
                english: Some("Mohammed Ali Hassan".to_string()),
                arabic: None,
            },
            date_of_birth: Some("1985-05-02".to_string()),
            nationality: "Qatari".to_string(),
            expiry_date: Some("2028-01-01".to_string()),
            ..ExtractedRecord::default()
        }
    }

    #[test]
    fn test_good_record_is_valid() {
        let outcome = RecordValidator::validate_at(&good_record(), 2026);
        assert!(outcome.valid);
        assert!(outcome.errors.is_empty());
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.confidence_scores["qid_number"], 0.98);
        assert_eq!(outcome.confidence_scores["date_consistency"], 0.95);
        assert_eq!(outcome.confidence_scores["name"], 0.95);
    }

    #[test]
    fn test_warnings_do_not_affect_validity() {
        let record = ExtractedRecord {
            full_name: NameFields::default(),
            expiry_date: Some("2019-01-01".to_string()),
            date_of_birth: Some("1990-01-01".to_string()),
            ..good_record()
        };
        let outcome = RecordValidator::validate_at(&record, 2026);
        assert!(outcome.valid);
        assert_eq!(outcome.warnings.len(), 3);
    }

    #[test]
    fn test_errors_are_ordered_and_invalidate() {
        let record = ExtractedRecord {
            qid_number: None,
            date_of_birth: Some("2031-01-01".to_string()),
            ..good_record()
        };
        let outcome = RecordValidator::validate_at(&record, 2026);
        assert!(!outcome.valid);
        assert_eq!(outcome.errors, vec!["No QID number found", "Invalid birth year: 2031"]);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let record = ExtractedRecord {
            expiry_date: Some("bad".to_string()),
            ..good_record()
        };
        let first = RecordValidator::validate_at(&record, 2026);
        let second = RecordValidator::validate_at(&record, 2026);
        assert_eq!(first, second);
    }

    #[test]
    fn test_leading_year() {
        assert_eq!(leading_year("1990-05-02"), Some(1990));
        assert_eq!(leading_year("1990"), Some(1990));
        assert_eq!(leading_year("May-1990"), None);
    }
}
