use std::collections::BTreeSet;
use crate::models::{DateCandidate, ExtractedRecord, DOCUMENT_TYPE};
use crate::processing::confidence::{ConfidenceScorer, ExtractionShape};
use crate::processing::extractors::{find_dates, find_names, scan_identifiers_at};
use crate::processing::ocr::OcrVariants;
use crate::utils::QidError;

/// Birth and expiry dates picked out of the unlabeled dates on the card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedDates {
    pub date_of_birth: Option<DateCandidate>,
    pub expiry_date: Option<DateCandidate>,
}

/// Decides which found date is the birth date and which is the expiry date.
///
/// The earliest date within one year of the QID's birth year is the birth
/// date. With two or more dates the latest one is the expiry date. A single
/// date that is not near the birth year is taken as the expiry date.
pub fn resolve_dates(dates: &BTreeSet<DateCandidate>, qid_birth_year: i32) -> ResolvedDates {
    // BTreeSet iterates in chronological order
    let date_of_birth = dates
        .iter()
        .find(|date| (date.year() - qid_birth_year).abs() <= 1)
        .copied();

    let expiry_date = match dates.len() {
        0 => None,
        1 if date_of_birth.is_none() => dates.iter().next().copied(),
        1 => None,
        _ => dates.iter().next_back().copied(),
    };

    ResolvedDates {
        date_of_birth,
        expiry_date,
    }
}

/// Turns merged recognizer output into one scored record.
pub struct FieldAssembler {
    reference_year: i32,
}

impl FieldAssembler {
    /// `reference_year` is the "current year" for every decode in this request.
    pub fn new(reference_year: i32) -> Self {
        FieldAssembler { reference_year }
    }

    pub fn assemble(&self, variants: &OcrVariants) -> Result<ExtractedRecord, QidError> {
        self.assemble_text(&variants.merged(), variants.variants_with_text())
    }

    pub fn assemble_text(&self, merged_text: &str, variants_with_text: usize) -> Result<ExtractedRecord, QidError> {
        let qid = scan_identifiers_at(merged_text, self.reference_year)
            .into_iter()
            .next()
            .ok_or(QidError::NoIdentifierFound)?;

        let names = find_names(merged_text);
        let dates = find_dates(merged_text);
        let resolved = resolve_dates(&dates, qid.birth_year());

        log::debug!(
            "Assembled QID {} with {} date candidate(s), birth date {:?}, expiry {:?}",
            qid.as_str(),
            dates.len(),
            resolved.date_of_birth,
            resolved.expiry_date
        );

        let confidence_scores = ConfidenceScorer::score(&ExtractionShape {
            identifier_decoded: true,
            names: &names,
            dates_found: dates.len(),
            merged_text_chars: merged_text.trim().chars().count(),
            variants_with_text,
        });

        Ok(ExtractedRecord {
            qid_number: Some(qid.as_str().to_string()),
            full_name: names,
            date_of_birth: resolved.date_of_birth.map(|d| d.to_string()),
            nationality: qid.nationality().to_string(),
            expiry_date: resolved.expiry_date.map(|d| d.to_string()),
            document_type: DOCUMENT_TYPE.to_string(),
            confidence_scores,
            qid_details: Some(qid.info().clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ocr::RecognitionMode;

    fn dates(values: &[&str]) -> BTreeSet<DateCandidate> {
        values.iter().map(|v| v.parse().unwrap()).collect()
    }

    fn date(value: &str) -> Option<DateCandidate> {
        Some(value.parse().unwrap())
    }

    #[test]
    fn test_birth_and_expiry_resolved() {
        let resolved = resolve_dates(&dates(&["2019-05-01", "1990-05-02"]), 1990);
        assert_eq!(resolved.date_of_birth, date("1990-05-02"));
        assert_eq!(resolved.expiry_date, date("2019-05-01"));
    }

    #[test]
    fn test_single_unrelated_date_is_expiry() {
        let resolved = resolve_dates(&dates(&["2030-01-01"]), 1985);
        assert_eq!(resolved.date_of_birth, None);
        assert_eq!(resolved.expiry_date, date("2030-01-01"));
    }

    #[test]
    fn test_single_date_near_birth_year_is_birth_date() {
        let resolved = resolve_dates(&dates(&["1986-03-04"]), 1985);
        assert_eq!(resolved.date_of_birth, date("1986-03-04"));
        assert_eq!(resolved.expiry_date, None);
    }

    #[test]
    fn test_earliest_near_date_wins() {
        let resolved = resolve_dates(&dates(&["1984-12-30", "1985-01-01", "2027-01-01"]), 1985);
        assert_eq!(resolved.date_of_birth, date("1984-12-30"));
        assert_eq!(resolved.expiry_date, date("2027-01-01"));
    }

    #[test]
    fn test_no_near_date_among_several() {
        let resolved = resolve_dates(&dates(&["2010-01-01", "2030-01-01"]), 1985);
        assert_eq!(resolved.date_of_birth, None);
        assert_eq!(resolved.expiry_date, date("2030-01-01"));
    }

    #[test]
    fn test_no_dates() {
        assert_eq!(resolve_dates(&BTreeSet::new(), 1985), ResolvedDates::default());
    }

    #[test]
    fn test_assemble_full_record() {
        let mut variants = OcrVariants::new();
        variants.insert(
            RecognitionMode::Default,
            "State of Qatar\nName: Mohammed Ali Hassan\nمحمد علي حسن\nID 28563401234\nDOB 02/05/1985\nExpiry 2027-01-01",
        );
        variants.insert(RecognitionMode::NumericOnly, "28563401234");
        variants.insert(RecognitionMode::AlphabeticOnly, "");

        let record = FieldAssembler::new(2026).assemble(&variants).unwrap();
        assert_eq!(record.qid_number.as_deref(), Some("28563401234"));
        assert_eq!(record.nationality, "Qatari");
        assert_eq!(record.full_name.english(), Some("Mohammed Ali Hassan"));
        assert_eq!(record.full_name.arabic(), Some("محمد علي حسن"));
        assert_eq!(record.date_of_birth.as_deref(), Some("1985-05-02"));
        assert_eq!(record.expiry_date.as_deref(), Some("2027-01-01"));
        assert_eq!(record.document_type, "Qatar ID");

        let details = record.qid_details.unwrap();
        assert_eq!(details.birth_year, 1985);
        assert_eq!(details.age, 41);

        let scores = record.confidence_scores;
        assert_eq!(scores.qid_number, 0.98);
        assert_eq!(scores.expiry_date, 0.9);
        assert!(scores.ocr_quality > 0.4);
    }

    #[test]
    fn test_first_candidate_is_chosen() {
        let record = FieldAssembler::new(2026)
            .assemble_text("29012345678 then 28563401234", 1)
            .unwrap();
        assert_eq!(record.qid_number.as_deref(), Some("29012345678"));
        assert_eq!(record.nationality, "Unknown (123)");
    }

    #[test]
    fn test_no_identifier_is_terminal() {
        let result = FieldAssembler::new(2026).assemble_text("Name: Ali Hassan 01/01/1990", 1);
        assert!(matches!(result, Err(QidError::NoIdentifierFound)));
    }
}
