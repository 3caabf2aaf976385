use crate::models::ExtractedRecord;
use crate::processing::confidence::ConfidenceScorer;
use crate::validation::FieldCheck;

pub struct NameValidator;

impl NameValidator {
    pub fn validate(record: &ExtractedRecord) -> FieldCheck {
        let mut check = FieldCheck::default();
        let names = &record.full_name;

        if names.is_empty() {
            check.warning("No name information extracted");
            check.score("name", 0.0);
            return check;
        }

        let mut best: f64 = 0.0;
        if let Some(english) = names.english() {
            let score = ConfidenceScorer::english_name_score(Some(english));
            check.score("name_english", score);
            best = best.max(score);
        }
        if let Some(arabic) = names.arabic() {
            let score = ConfidenceScorer::arabic_name_score(Some(arabic));
            check.score("name_arabic", score);
            best = best.max(score);
        }
        check.score("name", best);

        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameFields;

    fn record(english: Option<&str>, arabic: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            full_name: NameFields {
                english: english.map(str::to_string),
                arabic: arabic.map(str::to_string),
            },
            ..ExtractedRecord::default()
        }
    }

    #[test]
    fn test_no_names_is_warning() {
        let check = NameValidator::validate(&record(None, None));
        assert!(check.errors.is_empty());
        assert_eq!(check.warnings, vec!["No name information extracted"]);
        assert_eq!(check.scores["name"], 0.0);
    }

    #[test]
    fn test_best_name_score_wins() {
        let check = NameValidator::validate(&record(Some("Ali"), Some("محمد علي حسن")));
        assert!((check.scores["name_english"] - 0.75).abs() < 1e-9);
        assert!((check.scores["name_arabic"] - 0.76).abs() < 1e-9);
        assert!((check.scores["name"] - 0.76).abs() < 1e-9);
    }

    #[test]
    fn test_single_name_only_scores_that_name() {
        let check = NameValidator::validate(&record(None, Some("محمد علي")));
        assert!(!check.scores.contains_key("name_english"));
        assert!(check.warnings.is_empty());
    }
}
