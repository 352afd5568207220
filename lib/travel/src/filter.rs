//! Filter primitives shared by the lookups.

use chrono::{Datelike, NaiveDate};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a date filter is neither a day nor a month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDateFilter {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for InvalidDateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid date '{}': expected YYYY-MM-DD or YYYY-MM",
            self.input
        )
    }
}

impl std::error::Error for InvalidDateFilter {}

/// A date constraint: a single day, or every day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DateFilter {
    /// Exactly this date.
    Day(NaiveDate),
    /// Any date within this month.
    Month { year: i32, month: u32 },
}

impl DateFilter {
    /// Returns true if `date` satisfies the filter.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Day(day) => date == day,
            Self::Month { year, month } => date.year() == year && date.month() == month,
        }
    }
}

impl FromStr for DateFilter {
    type Err = InvalidDateFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || InvalidDateFilter {
            input: s.to_string(),
        };

        match trimmed.len() {
            10 => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Self::Day)
                .map_err(|_| invalid()),
            7 => NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
                .map(|first| Self::Month {
                    year: first.year(),
                    month: first.month(),
                })
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for DateFilter {
    type Error = InvalidDateFilter;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateFilter> for String {
    fn from(filter: DateFilter) -> Self {
        match filter {
            DateFilter::Day(day) => day.format("%Y-%m-%d").to_string(),
            DateFilter::Month { year, month } => format!("{year:04}-{month:02}"),
        }
    }
}

/// Case-insensitive comparison of two locality names.
#[must_use]
pub fn same_locality(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Matches a free-text value against a user-supplied pattern.
///
/// The pattern is a case-insensitive regular expression found anywhere in the
/// value; a pattern that does not compile is searched for as a literal.
#[derive(Debug, Clone)]
pub enum TextMatcher {
    /// Compiled pattern.
    Pattern(Regex),
    /// Case-insensitive literal.
    Literal(String),
}

impl TextMatcher {
    /// Builds a matcher for `pattern`.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim();
        match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Self::Pattern(regex),
            Err(_) => Self::Literal(pattern.to_lowercase()),
        }
    }

    /// Returns true if `value` matches.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(value.trim()),
            Self::Literal(literal) => value.to_lowercase().contains(literal.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("date")
    }

    #[test]
    fn day_filter_matches_exact_date_only() {
        let filter: DateFilter = "2025-07-14".parse().expect("parse");
        assert!(filter.matches(date("2025-07-14")));
        assert!(!filter.matches(date("2025-07-15")));
    }

    #[test]
    fn month_filter_matches_whole_month() {
        let filter: DateFilter = "2025-07".parse().expect("parse");
        assert!(filter.matches(date("2025-07-01")));
        assert!(filter.matches(date("2025-07-31")));
        assert!(!filter.matches(date("2025-08-01")));
        assert!(!filter.matches(date("2024-07-14")));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for input in ["tomorrow", "2025-13", "2025-02-30", "14/07/2025", ""] {
            assert!(input.parse::<DateFilter>().is_err(), "{input} should fail");
        }
    }

    #[test]
    fn date_filter_deserializes_from_json_string() {
        let filter: DateFilter = serde_json::from_str("\"2025-08\"").expect("deserialize");
        assert_eq!(
            filter,
            DateFilter::Month {
                year: 2025,
                month: 8
            }
        );
        assert!(serde_json::from_str::<DateFilter>("\"soon\"").is_err());
    }

    #[test]
    fn locality_comparison_ignores_case_and_padding() {
        assert!(same_locality("Lisbon", " lisbon "));
        assert!(!same_locality("Lisbon", "Porto"));
    }

    #[test]
    fn text_matcher_supports_alternation() {
        let matcher = TextMatcher::new("italian|french");
        assert!(matcher.matches("Italian"));
        assert!(matcher.matches("FRENCH"));
        assert!(!matcher.matches("Japanese"));
    }

    #[test]
    fn text_matcher_finds_pattern_within_value() {
        assert!(TextMatcher::new("french").matches("French Bistro"));
        assert!(TextMatcher::new("^sea").matches("Seafood"));
        assert!(!TextMatcher::new("^food").matches("Seafood"));
    }

    #[test]
    fn invalid_pattern_falls_back_to_literal() {
        let matcher = TextMatcher::new("c++(");
        assert!(matches!(matcher, TextMatcher::Literal(_)));
        assert!(matcher.matches("C++("));
        assert!(matcher.matches("Modern c++( fusion"));
    }
}
