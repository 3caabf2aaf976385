use crate::models::{ExtractedRecord, MIN_DATE_YEAR};
use crate::validation::{leading_year, present, FieldCheck};

const DATE_CONFIDENCE: f64 = 0.9;
const MALFORMED_EXPIRY_CONFIDENCE: f64 = 0.5;

/// Plausibility checks on the resolved birth and expiry dates.
pub struct DateValidator;

impl DateValidator {
    pub fn validate(record: &ExtractedRecord, current_year: i32) -> FieldCheck {
        let mut check = FieldCheck::default();
        Self::check_birth_date(record, current_year, &mut check);
        Self::check_expiry_date(record, current_year, &mut check);
        check
    }

    fn check_birth_date(record: &ExtractedRecord, current_year: i32, check: &mut FieldCheck) {
        let raw = match present(&record.date_of_birth) {
            Some(raw) => raw,
            None => {
                check.warning("No date of birth extracted");
                check.score("date_of_birth", 0.0);
                return;
            }
        };

        match leading_year(raw) {
            Some(year) if year > current_year || year < MIN_DATE_YEAR => {
                check.error(format!("Invalid birth year: {}", year));
                check.score("date_of_birth", 0.0);
            }
            Some(_) => check.score("date_of_birth", DATE_CONFIDENCE),
            None => {
                check.error("Invalid date of birth format");
                check.score("date_of_birth", 0.0);
            }
        }
    }

    // An expired card is still a valid record, so expiry only ever warns.
    fn check_expiry_date(record: &ExtractedRecord, current_year: i32, check: &mut FieldCheck) {
        let raw = match present(&record.expiry_date) {
            Some(raw) => raw,
            None => {
                check.warning("No expiry date extracted");
                check.score("expiry_date", 0.0);
                return;
            }
        };

        match leading_year(raw) {
            Some(year) => {
                if year < current_year {
                    check.warning(format!("QID appears to be expired: {}", raw));
                }
                check.score("expiry_date", DATE_CONFIDENCE);
            }
            None => {
                check.warning("Invalid expiry date format");
                check.score("expiry_date", MALFORMED_EXPIRY_CONFIDENCE);
            }
        }
    }
}
