use crate::models::{ConfidenceScores, NameFields};

// Calibration constants. Changing any of these changes reported scores.
const QID_CONFIDENCE: f64 = 0.98;
const NATIONALITY_CONFIDENCE: f64 = 0.92;
const DATE_CONFIDENCE: f64 = 0.9;
const SINGLE_DATE_EXPIRY_CONFIDENCE: f64 = 0.5;
const SCORE_CAP: f64 = 0.95;

/// What the scorer needs to know about one extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionShape<'a> {
    pub identifier_decoded: bool,
    pub names: &'a NameFields,
    pub dates_found: usize,
    /// Characters in the trimmed merged text.
    pub merged_text_chars: usize,
    /// Recognizer modes that returned non-blank text.
    pub variants_with_text: usize,
}

pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn english_name_score(name: Option<&str>) -> f64 {
        match name {
            Some(name) => {
                let words = name.split_whitespace().count() as f64;
                SCORE_CAP.min(words * 0.25 + 0.5)
            }
            None => 0.0,
        }
    }

    pub fn arabic_name_score(name: Option<&str>) -> f64 {
        match name {
            Some(name) => {
                let chars = name.chars().count() as f64;
                SCORE_CAP.min(chars * 0.03 + 0.4)
            }
            None => 0.0,
        }
    }

    pub fn ocr_quality_score(merged_text_chars: usize, variants_with_text: usize) -> f64 {
        let from_length = (merged_text_chars as f64 / 100.0) * 0.3;
        let from_variants = variants_with_text as f64 * 0.2;
        SCORE_CAP.min(from_length + from_variants)
    }

    pub fn score(shape: &ExtractionShape) -> ConfidenceScores {
        let qid_number = if shape.identifier_decoded { QID_CONFIDENCE } else { 0.0 };
        let name_english = Self::english_name_score(shape.names.english());
        let name_arabic = Self::arabic_name_score(shape.names.arabic());
        let name = name_english.max(name_arabic);

        let date_of_birth = if shape.dates_found >= 1 { DATE_CONFIDENCE } else { 0.0 };
        let expiry_date = match shape.dates_found {
            0 => 0.0,
            1 => SINGLE_DATE_EXPIRY_CONFIDENCE,
            _ => DATE_CONFIDENCE,
        };

        let nationality = if shape.identifier_decoded { NATIONALITY_CONFIDENCE } else { 0.0 };
        let ocr_quality = Self::ocr_quality_score(shape.merged_text_chars, shape.variants_with_text);

        // ocr_quality and expiry_date stay out of the mean
        let overall = (qid_number + name + date_of_birth + nationality) / 4.0;

        ConfidenceScores {
            qid_number,
            name_english,
            name_arabic,
            name,
            date_of_birth,
            expiry_date,
            nationality,
            ocr_quality,
            overall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_name_scores() {
        assert!(approx(ConfidenceScorer::english_name_score(Some("John Smith")), 0.95));
        assert!(approx(ConfidenceScorer::english_name_score(Some("Jo")), 0.75));
        assert!(approx(ConfidenceScorer::english_name_score(None), 0.0));
        assert!(approx(ConfidenceScorer::arabic_name_score(Some("محمد")), 0.52));
        assert!(approx(ConfidenceScorer::arabic_name_score(Some(&"م".repeat(40))), 0.95));
    }

    #[test]
    fn test_ocr_quality() {
        assert!(approx(ConfidenceScorer::ocr_quality_score(100, 1), 0.5));
        assert!(approx(ConfidenceScorer::ocr_quality_score(1000, 3), 0.95));
        assert!(approx(ConfidenceScorer::ocr_quality_score(0, 0), 0.0));
    }

    #[test]
    fn test_full_extraction_scores() {
        let names = NameFields {
            english: Some("Mohammed Ali Hassan".to_string()),
            arabic: None,
        };
        let scores = ConfidenceScorer::score(&ExtractionShape {
            identifier_decoded: true,
            names: &names,
            dates_found: 2,
            merged_text_chars: 200,
            variants_with_text: 3,
        });
        assert!(approx(scores.qid_number, 0.98));
        assert!(approx(scores.name, 0.95));
        assert!(approx(scores.expiry_date, 0.9));
        assert!(approx(scores.nationality, 0.92));
        assert!(approx(scores.ocr_quality, 0.95));
        assert!(approx(scores.overall, (0.98 + 0.95 + 0.9 + 0.92) / 4.0));
    }

    #[test]
    fn test_overall_is_mean_of_four() {
        let empty = NameFields::default();
        for dates_found in 0..3 {
            for decoded in [false, true] {
                let s = ConfidenceScorer::score(&ExtractionShape {
                    identifier_decoded: decoded,
                    names: &empty,
                    dates_found,
                    merged_text_chars: 50,
                    variants_with_text: 1,
                });
                let mean = (s.qid_number + s.name + s.date_of_birth + s.nationality) / 4.0;
                assert!(approx(s.overall, mean));
                assert!(s.overall >= 0.0 && s.overall <= 0.98);
            }
        }
    }

    #[test]
    fn test_single_date_expiry_score() {
        let empty = NameFields::default();
        let s = ConfidenceScorer::score(&ExtractionShape {
            identifier_decoded: true,
            names: &empty,
            dates_found: 1,
            merged_text_chars: 0,
            variants_with_text: 0,
        });
        assert!(approx(s.expiry_date, 0.5));
        assert!(approx(s.date_of_birth, 0.9));
    }
}
