use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::models::identifier::DecodedIdentifierInfo;

pub const DOCUMENT_TYPE: &str = "Qatar ID";

/// Bilingual name as printed on the card. Either, both or neither may be found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFields {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub arabic: Option<String>,
}

impl NameFields {
    pub fn english(&self) -> Option<&str> {
        non_empty(&self.english)
    }

    pub fn arabic(&self) -> Option<&str> {
        non_empty(&self.arabic)
    }

    pub fn is_empty(&self) -> bool {
        self.english().is_none() && self.arabic().is_none()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

pub const MIN_DATE_YEAR: i32 = 1900;
pub const MAX_DATE_YEAR: i32 = 2050;

/// A calendar date found in OCR text, normalized to `YYYY-MM-DD`.
///
/// Only the ranges are checked: year in 1900..=2050, month in 1..=12 and
/// day in 1..=31 for every month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateCandidate {
    year: i32,
    month: u32,
    day: u32,
}

impl DateCandidate {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        let in_range = (MIN_DATE_YEAR..=MAX_DATE_YEAR).contains(&year)
            && (1..=12).contains(&month)
            && (1..=31).contains(&day);
        in_range.then_some(DateCandidate { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }
}

impl fmt::Display for DateCandidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for DateCandidate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 3 {
            return Err(format!("expected YYYY-MM-DD, got {:?}", s));
        }

        let year = parts[0].parse::<i32>().map_err(|e| e.to_string())?;
        let month = parts[1].parse::<u32>().map_err(|e| e.to_string())?;
        let day = parts[2].parse::<u32>().map_err(|e| e.to_string())?;

        DateCandidate::new(year, month, day).ok_or_else(|| format!("date out of range: {}", s))
    }
}

impl Serialize for DateCandidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateCandidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Heuristic per-field confidence in [0, 1] computed at extraction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceScores {
    pub qid_number: f64,
    pub name_english: f64,
    pub name_arabic: f64,
    pub name: f64,
    pub date_of_birth: f64,
    pub expiry_date: f64,
    pub nationality: f64,
    pub ocr_quality: f64,
    pub overall: f64,
}

/// The structured result of one scan.
///
/// Dates are kept as their `YYYY-MM-DD` strings so a record received back
/// from a host application can be re-validated even if it was edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    #[serde(default)]
    pub qid_number: Option<String>,
    #[serde(default)]
    pub full_name: NameFields,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    #[serde(default)]
    pub confidence_scores: ConfidenceScores,
    #[serde(default)]
    pub qid_details: Option<DecodedIdentifierInfo>,
}

fn default_document_type() -> String {
    DOCUMENT_TYPE.to_string()
}

/// Result of re-validating an [`ExtractedRecord`]. Warnings never affect `valid`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub confidence_scores: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_candidate_ranges() {
        assert!(DateCandidate::new(1900, 1, 1).is_some());
        assert!(DateCandidate::new(2050, 12, 31).is_some());
        assert!(DateCandidate::new(1899, 1, 1).is_none());
        assert!(DateCandidate::new(2051, 1, 1).is_none());
        assert!(DateCandidate::new(2000, 13, 1).is_none());
        assert!(DateCandidate::new(2000, 1, 0).is_none());
        // no month-length check
        assert!(DateCandidate::new(2001, 2, 31).is_some());
    }

    #[test]
    fn test_date_candidate_display_and_order() {
        let a = DateCandidate::new(1990, 5, 2).unwrap();
        let b = DateCandidate::new(2019, 5, 1).unwrap();
        assert_eq!(a.to_string(), "1990-05-02");
        assert!(a < b);
        assert_eq!("2019-05-01".parse::<DateCandidate>(), Ok(b));
        assert!("01/05/2019".parse::<DateCandidate>().is_err());
    }

    #[test]
    fn test_name_fields_treat_blank_as_absent() {
        let names = NameFields {
            english: Some("  ".to_string()),
            arabic: None,
        };
        assert!(names.is_empty());
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let record: ExtractedRecord =
            serde_json::from_str(r#"{"qid_number": "28563401234", "date_of_birth": "1985-01-01"}"#).unwrap();
        assert_eq!(record.document_type, DOCUMENT_TYPE);
        assert!(record.full_name.is_empty());
        assert_eq!(record.expiry_date, None);
    }
}
