use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use crate::models::nationality::NationalityTable;
use crate::utils::InvalidIdentifier;

pub const QID_LENGTH: usize = 11;

/// ASCII value of a decimal digit written in ASCII, Arabic-Indic
/// (U+0660..U+0669) or Extended Arabic-Indic (U+06F0..U+06F9) form.
pub fn ascii_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '\u{0660}'..='\u{0669}' => char::from_digit(c as u32 - 0x0660, 10),
        '\u{06F0}'..='\u{06F9}' => char::from_digit(c as u32 - 0x06F0, 10),
        _ => None,
    }
}

/// Rewrites every supported digit as ASCII, leaving other characters alone.
pub fn normalize_digits(text: &str) -> String {
    text.chars().map(|c| ascii_digit(c).unwrap_or(c)).collect()
}

/// Current calendar year in local time.
pub fn current_year() -> i32 {
    Local::now().year()
}

/// The four segments of an 11-digit QID: `C YY NNN SSSSS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierComponents {
    pub century_digit: char,
    pub year_digits: String,
    pub nationality_code: String,
    pub sequence_number: String,
}

impl IdentifierComponents {
    /// 19YY for century digit 2, 20YY for century digit 3.
    pub fn birth_year(&self) -> Option<i32> {
        let yy: i32 = self.year_digits.parse().ok()?;
        match self.century_digit {
            '2' => Some(1900 + yy),
            '3' => Some(2000 + yy),
            _ => None,
        }
    }
}

/// Values derived from a decoded QID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedIdentifierInfo {
    pub birth_year: i32,
    pub age: i32,
    pub nationality: String,
    pub nationality_code: String,
}

/// A QID number that passed decoding. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCode {
    number: String,
    components: IdentifierComponents,
    info: DecodedIdentifierInfo,
}

impl IdentifierCode {
    /// Decodes `raw` against the current calendar year.
    pub fn decode(raw: &str) -> Result<Self, InvalidIdentifier> {
        Self::decode_at(raw, current_year())
    }

    /// Decodes `raw` against a fixed reference year. Every non-digit
    /// character is dropped before the length check. Arabic-Indic digits
    /// count, but the century digit must be an ASCII `2` or `3`.
    pub fn decode_at(raw: &str, current_year: i32) -> Result<Self, InvalidIdentifier> {
        let kept: Vec<char> = raw.chars().filter(|c| ascii_digit(*c).is_some()).collect();
        if kept.len() != QID_LENGTH {
            return Err(InvalidIdentifier::WrongLength(kept.len()));
        }
        if !matches!(kept[0], '2' | '3') {
            return Err(InvalidIdentifier::InvalidCenturyDigit(kept[0]));
        }

        // ASCII only from here, byte slicing is safe
        let digits: String = kept.iter().filter_map(|c| ascii_digit(*c)).collect();
        let components = IdentifierComponents {
            century_digit: digits.as_bytes()[0] as char,
            year_digits: digits[1..3].to_string(),
            nationality_code: digits[3..6].to_string(),
            sequence_number: digits[6..11].to_string(),
        };

        let birth_year = components
            .birth_year()
            .ok_or(InvalidIdentifier::InvalidCenturyDigit(components.century_digit))?;

        if birth_year > current_year {
            return Err(InvalidIdentifier::FutureBirthYear(birth_year));
        }
        if birth_year < 1900 {
            return Err(InvalidIdentifier::TooOldBirthYear(birth_year));
        }

        let nationality = NationalityTable::global().name_or_unknown(&components.nationality_code);
        let info = DecodedIdentifierInfo {
            birth_year,
            age: current_year - birth_year,
            nationality,
            nationality_code: components.nationality_code.clone(),
        };

        Ok(IdentifierCode {
            number: digits,
            components,
            info,
        })
    }

    /// The normalized 11-digit string.
    pub fn as_str(&self) -> &str {
        &self.number
    }

    pub fn components(&self) -> &IdentifierComponents {
        &self.components
    }

    pub fn info(&self) -> &DecodedIdentifierInfo {
        &self.info
    }

    pub fn birth_year(&self) -> i32 {
        self.info.birth_year
    }

    pub fn nationality(&self) -> &str {
        &self.info.nationality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_components() {
        let qid = IdentifierCode::decode_at("28563401234", 2026).unwrap();
        assert_eq!(qid.as_str(), "28563401234");
        assert_eq!(qid.components().century_digit, '2');
        assert_eq!(qid.components().year_digits, "85");
        assert_eq!(qid.components().nationality_code, "634");
        assert_eq!(qid.components().sequence_number, "01234");
        assert_eq!(qid.birth_year(), 1985);
        assert_eq!(qid.info().age, 41);
        assert_eq!(qid.nationality(), "Qatari");
    }

    #[test]
    fn test_century_digits() {
        assert_eq!(IdentifierCode::decode_at("22535600001", 2026).unwrap().birth_year(), 1925);
        assert_eq!(IdentifierCode::decode_at("32535600001", 2026).unwrap().birth_year(), 2025);
    }

    #[test]
    fn test_strips_separators() {
        let qid = IdentifierCode::decode_at("290 123-456 78", 2026).unwrap();
        assert_eq!(qid.as_str(), "29012345678");
    }

    #[test]
    fn test_wrong_length() {
        for raw in ["", "2901234567", "290123456789", "abc", "29-01"] {
            let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
            assert_eq!(
                IdentifierCode::decode_at(raw, 2026),
                Err(InvalidIdentifier::WrongLength(digits))
            );
        }
    }

    #[test]
    fn test_invalid_century_digit() {
        assert_eq!(
            IdentifierCode::decode_at("18563401234", 2026),
            Err(InvalidIdentifier::InvalidCenturyDigit('1'))
        );
    }

    #[test]
    fn test_future_birth_year() {
        assert_eq!(
            IdentifierCode::decode_at("33063401234", 2026),
            Err(InvalidIdentifier::FutureBirthYear(2030))
        );
        assert!(IdentifierCode::decode_at("32663401234", 2026).is_ok());
    }

    #[test]
    fn test_arabic_indic_digits() {
        let qid = IdentifierCode::decode_at("2٨٥ ٦٣٤ ۰۱۲۳۴", 2026).unwrap();
        assert_eq!(qid.as_str(), "28563401234");
        assert_eq!(qid.nationality(), "Qatari");

        assert_eq!(
            IdentifierCode::decode_at("٢٨٥٦٣٤٠١٢٣٤", 2026),
            Err(InvalidIdentifier::InvalidCenturyDigit('٢'))
        );
        assert_eq!(normalize_digits("٠٢/٠٥/١٩٩٠"), "02/05/1990");
        assert_eq!(ascii_digit('x'), None);
    }

    #[test]
    fn test_unknown_nationality_still_decodes() {
        let qid = IdentifierCode::decode_at("29012345678", 2026).unwrap();
        assert_eq!(qid.nationality(), "Unknown (123)");
        assert_eq!(qid.info().nationality_code, "123");
    }

    #[test]
    fn test_birth_year_recomputed_from_components() {
        for century in ['2', '3'] {
            for yy in 0..=26 {
                let raw = format!("{}{:02}634{:05}", century, yy, yy * 37);
                let qid = IdentifierCode::decode_at(&raw, 2026).unwrap();
                assert_eq!(qid.components().birth_year(), Some(qid.birth_year()));
            }
        }
    }
}
