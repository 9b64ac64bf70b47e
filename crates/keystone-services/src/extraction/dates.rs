//! Lenient date parsing for dates found in insurance and license documents

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("ordinal suffix pattern")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$").expect("iso date pattern")
});

static TEXTUAL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-z]{3,9}\.?\s+\d{1,2},?\s+\d{4}|\d{1,2}\s+[a-z]{3,9}\.?,?\s+\d{4})$")
        .expect("textual date pattern")
});

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})$").expect("numeric date pattern")
});

/// Any date shape `parse_date` understands, used to locate a date inside a
/// longer string.
pub(crate) const DATE_TOKEN: &str = r"\b(?:\d{4}-\d{1,2}-\d{1,2}|\d{1,2}[/-]\d{1,2}[/-](?:\d{4}|\d{2})|[A-Za-z]{3,9}\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}(?:st|nd|rd|th)?\s+[A-Za-z]{3,9}\.?,?\s+\d{4})";

static EMBEDDED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE_TOKEN).expect("embedded date pattern"));

const TEXTUAL_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d %b %Y",
];

/// Two-digit years above 80 are 19xx, the rest 20xx.
fn infer_century(year: i32) -> i32 {
    if year >= 100 {
        year
    } else if year > 80 {
        year + 1900
    } else {
        year + 2000
    }
}

fn parse_exact(s: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(s) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if TEXTUAL_DATE.is_match(s) {
        let without_dots = s.replace('.', "");
        return TEXTUAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&without_dots, fmt).ok());
    }

    let caps = NUMERIC_DATE.captures(s)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = infer_century(caps[3].parse().ok()?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a date written the way documents and language models write them.
///
/// Accepts ISO dates (optionally followed by a time), month-name forms with or
/// without ordinal suffixes, and `MM/DD/YY[YY]` with slashes or dashes. When
/// the whole input is not a date, the first date-shaped substring is tried.
/// Returns `None` for anything else.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim().trim_end_matches([',', ';']);
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(trimmed, "$1");
    parse_exact(&cleaned).or_else(|| {
        EMBEDDED_DATE
            .find(&cleaned)
            .and_then(|m| parse_exact(m.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_common_forms_agree() {
        let expected = Some(date(2024, 4, 1));
        assert_eq!(parse_date("04/01/2024"), expected);
        assert_eq!(parse_date("04-01-24"), expected);
        assert_eq!(parse_date("April 1, 2024"), expected);
        assert_eq!(parse_date("2024-04-01"), expected);
    }

    #[test]
    fn test_invalid_input_is_none() {
        assert_eq!(parse_date("invalid"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("May 2024"), None);
        assert_eq!(parse_date("02/30/2024"), None);
        assert_eq!(parse_date("13/01/2024"), None);
    }

    #[test]
    fn test_ordinals_and_abbreviations() {
        assert_eq!(parse_date("April 1st, 2024"), Some(date(2024, 4, 1)));
        assert_eq!(parse_date("Sep 22nd 2025"), Some(date(2025, 9, 22)));
        assert_eq!(parse_date("Dec. 3, 2023"), Some(date(2023, 12, 3)));
        assert_eq!(parse_date("1 April 2024"), Some(date(2024, 4, 1)));
        assert_eq!(parse_date("march 15 2026"), Some(date(2026, 3, 15)));
    }

    #[test]
    fn test_century_inference() {
        assert_eq!(parse_date("12/31/99"), Some(date(1999, 12, 31)));
        assert_eq!(parse_date("01/15/81"), Some(date(1981, 1, 15)));
        assert_eq!(parse_date("01/15/80"), Some(date(2080, 1, 15)));
        assert_eq!(parse_date("6/1/30"), Some(date(2030, 6, 1)));
    }

    #[test]
    fn test_iso_datetime() {
        assert_eq!(parse_date("2025-03-31T00:00:00Z"), Some(date(2025, 3, 31)));
    }

    #[test]
    fn test_date_embedded_in_text() {
        assert_eq!(
            parse_date("on or about 04/01/2025 12:01 AM"),
            Some(date(2025, 4, 1))
        );
        assert_eq!(parse_date("through June 30th, 2025."), Some(date(2025, 6, 30)));
    }
}
