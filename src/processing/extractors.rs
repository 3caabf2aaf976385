// Field-specific extraction functions over merged OCR text.
// Everything here is pure: text in, candidates out.
use std::collections::BTreeSet;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use crate::models::{current_year, normalize_digits, DateCandidate, IdentifierCode, NameFields};

/// Layout of a date match, used to know which capture holds the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    /// D/M/YYYY
    DayFirst,
    /// YYYY/M/D
    YearFirst,
    /// D/M/YY
    DayFirstShortYear,
}

// ASCII, Arabic-Indic and Extended Arabic-Indic digits
macro_rules! digit {
    () => {
        r"[0-9\x{0660}-\x{0669}\x{06F0}-\x{06F9}]"
    };
}

lazy_static! {
    // 11 digits starting with an ASCII century digit
    static ref QID_PATTERN: Regex = Regex::new(concat!(r"\b[23]", digit!(), r"{10}\b")).unwrap();

    // 2 to 4 capitalized words separated by single spaces
    static ref ENGLISH_NAME_PATTERN: Regex =
        Regex::new(r"\b[A-Z][a-z]+(?: [A-Z][a-z]+){1,3}\b").unwrap();

    // Runs of Arabic-block characters and whitespace
    static ref ARABIC_RUN_PATTERN: Regex = Regex::new(r"[\x{0600}-\x{06FF}\s]+").unwrap();

    static ref DATE_PATTERNS: Vec<(DateLayout, Regex)> = vec![
        (
            DateLayout::DayFirst,
            Regex::new(concat!(
                r"\b(", digit!(), r"{1,2})[/\-.](", digit!(), r"{1,2})[/\-.](", digit!(), r"{4})\b"
            ))
            .unwrap(),
        ),
        (
            DateLayout::YearFirst,
            Regex::new(concat!(
                r"\b(", digit!(), r"{4})[/\-.](", digit!(), r"{1,2})[/\-.](", digit!(), r"{1,2})\b"
            ))
            .unwrap(),
        ),
        (
            DateLayout::DayFirstShortYear,
            Regex::new(concat!(
                r"\b(", digit!(), r"{1,2})[/\-.](", digit!(), r"{1,2})[/\-.](", digit!(), r"{2})\b"
            ))
            .unwrap(),
        ),
    ];
}

/// Shortest Arabic run kept as a name, in characters.
const MIN_ARABIC_NAME_CHARS: usize = 4;

/// All 11-digit runs that decode as a QID, in the order they appear.
pub fn find_identifier_candidates(text: &str) -> Vec<String> {
    scan_identifiers_at(text, current_year())
        .into_iter()
        .map(|qid| qid.as_str().to_string())
        .collect()
}

/// Same scan as [`find_identifier_candidates`] but keeps the decoded value
/// of each candidate so callers never decode twice.
pub fn scan_identifiers_at(text: &str, current_year: i32) -> Vec<IdentifierCode> {
    QID_PATTERN
        .find_iter(text)
        .filter_map(|m| IdentifierCode::decode_at(m.as_str(), current_year).ok())
        .collect()
}

/// Longest run of 2-4 capitalized Latin words. Ties go to the first match.
pub fn find_english_name(text: &str) -> Option<String> {
    longest(ENGLISH_NAME_PATTERN.find_iter(text).map(|m| m.as_str())).map(str::to_string)
}

/// Longest trimmed run of Arabic script longer than three characters.
pub fn find_arabic_name(text: &str) -> Option<String> {
    let runs = ARABIC_RUN_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|run| run.chars().count() >= MIN_ARABIC_NAME_CHARS);
    longest(runs).map(str::to_string)
}

pub fn find_names(text: &str) -> NameFields {
    NameFields {
        english: find_english_name(text),
        arabic: find_arabic_name(text),
    }
}

/// Every distinct valid date in any supported layout. Matches that fall
/// outside the accepted ranges are dropped without error.
pub fn find_dates(text: &str) -> BTreeSet<DateCandidate> {
    let mut dates = BTreeSet::new();
    for (layout, pattern) in DATE_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            if let Some(date) = date_from_captures(*layout, &captures) {
                dates.insert(date);
            }
        }
    }
    dates
}

fn date_from_captures(layout: DateLayout, captures: &Captures) -> Option<DateCandidate> {
    let field = |i: usize| -> Option<u32> { normalize_digits(captures.get(i)?.as_str()).parse().ok() };

    let (year, month, day) = match layout {
        DateLayout::DayFirst => (field(3)? as i32, field(2)?, field(1)?),
        DateLayout::YearFirst => (field(1)? as i32, field(2)?, field(3)?),
        DateLayout::DayFirstShortYear => (expand_short_year(field(3)?), field(2)?, field(1)?),
    };

    DateCandidate::new(year, month, day)
}

/// 00-49 are 2000s, 50-99 are 1900s.
fn expand_short_year(yy: u32) -> i32 {
    let yy = yy as i32;
    if yy < 50 {
        2000 + yy
    } else {
        1900 + yy
    }
}

// First-found wins on ties, unlike Iterator::max_by_key.
fn longest<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    items.fold(None, |best: Option<&'a str>, item| match best {
        Some(current) if current.chars().count() >= item.chars().count() => Some(current),
        _ => Some(item),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> DateCandidate {
        s.parse().unwrap()
    }

    #[test]
    fn test_single_embedded_identifier() {
        assert_eq!(
            find_identifier_candidates("ID: 29012345678 EXP"),
            vec!["29012345678".to_string()]
        );
    }

    #[test]
    fn test_identifier_candidates_keep_text_order() {
        let text = "28563401234 x 12345678901 y 29935600011 z 290123456789";
        let found: Vec<String> = scan_identifiers_at(text, 2026)
            .iter()
            .map(|q| q.as_str().to_string())
            .collect();
        assert_eq!(found, vec!["28563401234", "29935600011"]);
    }

    #[test]
    fn test_identifier_candidates_drop_future_years() {
        // 2090 is in the future
        assert!(scan_identifiers_at("39063401234", 2026).is_empty());
    }

    #[test]
    fn test_english_name_longest_match() {
        let text = "State of Qatar\nResidency Permit\nName: Mohammed Ali Hassan Khan\nJohn Smith";
        assert_eq!(find_english_name(text), Some("Mohammed Ali Hassan Khan".to_string()));
    }

    #[test]
    fn test_english_name_tie_goes_to_first() {
        assert_eq!(find_english_name("Anna Bell\nBill Ames"), Some("Anna Bell".to_string()));
    }

    #[test]
    fn test_english_name_needs_two_words() {
        assert_eq!(find_english_name("Name: MOHAMMED qatar Doha"), None);
    }

    #[test]
    fn test_arabic_name() {
        // whitespace joins runs across lines, so the lines are split by Latin text
        let text = "Name: Mohammed Ali\nمحمد علي حسن\nQID: 28563401234\nدولة قطر";
        assert_eq!(find_arabic_name(text), Some("محمد علي حسن".to_string()));
    }

    #[test]
    fn test_arabic_runs_span_lines() {
        let text = "محمد علي\nدولة قطر";
        assert_eq!(find_arabic_name(text), Some("محمد علي\nدولة قطر".to_string()));
    }

    #[test]
    fn test_arabic_short_runs_discarded() {
        assert_eq!(find_arabic_name("ID 123 قطر  "), None);
    }

    #[test]
    fn test_find_dates_layouts() {
        let text = "DOB 02/05/1990 issued 2019.05.01 expiry 01-05-29";
        let dates: Vec<DateCandidate> = find_dates(text).into_iter().collect();
        assert_eq!(dates, vec![date("1990-05-02"), date("2019-05-01"), date("2029-05-01")]);
    }

    #[test]
    fn test_find_dates_short_year_pivot() {
        let dates = find_dates("01/01/49 01/01/50");
        assert!(dates.contains(&date("2049-01-01")));
        assert!(dates.contains(&date("1950-01-01")));
    }

    #[test]
    fn test_find_dates_discards_invalid_and_duplicates() {
        let dates = find_dates("45/13/2020 1990-05-02 02/05/1990 02.05.1990 1850-01-01");
        assert_eq!(dates.len(), 1);
        assert!(dates.contains(&date("1990-05-02")));
    }

    #[test]
    fn test_find_dates_arabic_indic_digits() {
        let dates = find_dates("تاريخ الميلاد ٠٢/٠٥/١٩٩٠ الانتهاء ۲۰۲۸-۰۱-۱۵");
        let dates: Vec<DateCandidate> = dates.into_iter().collect();
        assert_eq!(dates, vec![date("1990-05-02"), date("2028-01-15")]);
    }

    #[test]
    fn test_identifier_candidates_with_arabic_indic_digits() {
        let found: Vec<String> = scan_identifiers_at("رقم 2٨٥٦٣٤٠١٢٣٤ / ٢٨٥٦٣٤٠١٢٣٤", 2026)
            .iter()
            .map(|q| q.as_str().to_string())
            .collect();
        assert_eq!(found, vec!["28563401234"]);
    }

    #[test]
    fn test_find_dates_empty_text() {
        assert!(find_dates("").is_empty());
    }
}
