use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::base;

static MORE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\+\s*More.*$").expect("valid suffix regex"));

// The listing cell can glue the date and time together ("6/5/249:00 AM"), so
// the year tries four digits before two and the separator is optional.
static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}/\d{1,2}/(?:\d{4}|\d{2}))\s*(\d{1,2}:\d{2}\s*[AaPp][Mm])$")
        .expect("valid date-time regex")
});

/// Tried in order; the first that parses wins.
const FORMATS: [&str; 2] = ["%m/%d/%y %I:%M %p", "%m/%d/%Y %I:%M %p"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("could not parse date: {0:?}")]
    Unparseable(String),
}

/// Parses listing date text such as `6/5/24 9:00 AM+ More info` into its
/// calendar date. Time of day is dropped.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, DateError> {
    let without_suffix = MORE_SUFFIX_RE.replace(raw, "");
    let cleaned = base::clean_text(&without_suffix);

    let candidate = match DATE_TIME_RE.captures(&cleaned) {
        Some(caps) => format!("{} {}", &caps[1], base::clean_text(&caps[2])),
        None => cleaned,
    };

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&candidate, fmt).ok())
        .map(|moment| moment.date())
        .ok_or_else(|| DateError::Unparseable(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::canonical_date as render;

    fn canonical_date(raw: &str) -> Result<String, DateError> {
        normalize_date(raw).map(render)
    }

    #[test]
    fn two_digit_year_with_more_suffix() {
        assert_eq!(
            canonical_date("6/5/24 9:00 AM+ More info").as_deref(),
            Ok("2024-06-05")
        );
    }

    #[test]
    fn four_digit_year() {
        assert_eq!(canonical_date("12/31/2025 11:30 PM").as_deref(), Ok("2025-12-31"));
    }

    #[test]
    fn zero_padded_fields_and_lowercase_meridiem() {
        assert_eq!(canonical_date("06/05/2024 09:00 am").as_deref(), Ok("2024-06-05"));
    }

    #[test]
    fn glued_date_and_time() {
        assert_eq!(canonical_date("6/5/249:00 AM").as_deref(), Ok("2024-06-05"));
        assert_eq!(canonical_date("6/5/202410:15 PM").as_deref(), Ok("2024-06-05"));
        assert_eq!(canonical_date("6/5/2410:15 PM+More dates").as_deref(), Ok("2024-06-05"));
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        assert_eq!(
            canonical_date("  7/4/25 \n 1:00   PM  + More (3 dates)").as_deref(),
            Ok("2025-07-04")
        );
    }

    #[test]
    fn suffix_spanning_lines_is_stripped() {
        assert_eq!(
            canonical_date("6/5/24 9:00 AM+ More\ninfo").as_deref(),
            Ok("2024-06-05")
        );
    }

    #[test]
    fn two_digit_year_pivot() {
        assert_eq!(canonical_date("6/5/69 9:00 AM").as_deref(), Ok("2069-06-05"));
        assert_eq!(canonical_date("6/5/70 9:00 AM").as_deref(), Ok("1970-06-05"));
        assert_eq!(canonical_date("6/5/00 9:00 AM").as_deref(), Ok("2000-06-05"));
    }

    #[test]
    fn unparseable_text_is_an_error_value() {
        assert_eq!(
            normalize_date("next Tuesday"),
            Err(DateError::Unparseable("next Tuesday".to_string()))
        );
        assert!(normalize_date("").is_err());
        assert!(normalize_date("13/40/24 9:00 AM").is_err());
        assert!(normalize_date("6/5/24").is_err());
    }

    #[test]
    fn same_input_same_output() {
        let raw = "3/1/24 8:00 AM+ More";
        assert_eq!(normalize_date(raw), normalize_date(raw));
    }
}
