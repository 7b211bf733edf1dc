use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static DAY_MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})$").unwrap());

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Parse the part of `text` before the first comma as "5 June 2020".
///
/// Anything else (ISO dates, abbreviated months, 31 February) yields `None`.
pub fn parse_notice_date(text: &str) -> Option<NaiveDate> {
    let head = text.split(',').next().unwrap_or("").trim();
    let caps = DAY_MONTH_YEAR.captures(head)?;

    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Canonical `YYYY-MM-DD` form, as stored.
pub fn canonical(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> Option<String> {
        parse_notice_date(text).map(canonical)
    }

    #[test]
    fn trailing_boilerplate_ignored() {
        assert_eq!(parsed("5 June 2020, other text").as_deref(), Some("2020-06-05"));
        assert_eq!(parsed("  17 December 2019, 5:00pm ").as_deref(), Some("2019-12-17"));
    }

    #[test]
    fn zero_padded_day_and_case() {
        assert_eq!(parsed("05 june 2020").as_deref(), Some("2020-06-05"));
    }

    #[test]
    fn iso_input_rejected() {
        assert_eq!(parsed("2020-06-05"), None);
    }

    #[test]
    fn impossible_date_rejected() {
        assert_eq!(parsed("31 February 2020"), None);
        assert_eq!(parsed("0 June 2020"), None);
    }

    #[test]
    fn abbreviations_and_partials_rejected() {
        assert_eq!(parsed("5 Jun 2020"), None);
        assert_eq!(parsed("June 2020"), None);
        assert_eq!(parsed("5 June 20"), None);
        assert_eq!(parsed("Friday 5 June 2020"), None);
        assert_eq!(parsed(""), None);
    }

    #[test]
    fn leap_day() {
        assert_eq!(parsed("29 February 2020").as_deref(), Some("2020-02-29"));
        assert_eq!(parsed("29 February 2019"), None);
    }
}
