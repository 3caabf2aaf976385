use crate::models::{ExtractedRecord, IdentifierCode};
use crate::validation::{leading_year, present, FieldCheck};

const QID_CONFIDENCE: f64 = 0.98;
const CONSISTENT_DATE_CONFIDENCE: f64 = 0.95;
const INCONSISTENT_DATE_CONFIDENCE: f64 = 0.3;

/// Re-decodes the QID and cross-checks its birth year against the birth date.
pub struct IdentifierValidator;

impl IdentifierValidator {
    pub fn validate(record: &ExtractedRecord, current_year: i32) -> FieldCheck {
        let mut check = FieldCheck::default();

        let raw = match present(&record.qid_number) {
            Some(raw) => raw,
            None => {
                check.error("No QID number found");
                check.score("qid_number", 0.0);
                return check;
            }
        };

        match IdentifierCode::decode_at(raw, current_year) {
            Err(e) => {
                check.error(format!("Invalid QID number: {}", e));
                check.score("qid_number", 0.0);
            }
            Ok(qid) => {
                check.score("qid_number", QID_CONFIDENCE);

                // an unparseable birth date is reported by the date checks
                if let Some(extracted_year) = present(&record.date_of_birth).and_then(leading_year) {
                    let qid_year = qid.birth_year();
                    if (extracted_year - qid_year).abs() > 1 {
                        check.warning(format!(
                            "Birth year mismatch: QID indicates {}, extracted date indicates {}",
                            qid_year, extracted_year
                        ));
                        check.score("date_consistency", INCONSISTENT_DATE_CONFIDENCE);
                    } else {
                        check.score("date_consistency", CONSISTENT_DATE_CONFIDENCE);
                    }
                }
            }
        }

        check
    }
}
