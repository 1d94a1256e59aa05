//! Date detection and day-offset conversion.
//!
//! A column is a date column when enough of its values parse with one
//! format, chosen by trying a fixed list against the first value, or with a
//! flexible day-first parser. Dates become whole days since the earliest
//! date so they can enter a correlation matrix.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::column::Column;
use crate::config::AnalysisConfig;
use crate::types::{DateConversion, DateDetection};

/// Formats tried against the first value, in order.
pub const DATE_FORMATS: [&str; 7] = [
    "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%y", "%d-%m-%y", "%Y/%m/%d",
];

/// Label recorded for dates read by the flexible parser.
pub const FLEXIBLE_FORMAT: &str = "flexible";

const FLEXIBLE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M",
];

const FLEXIBLE_DATE_FORMATS: [&str; 14] = [
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y",
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y",
];

/// Plain numbers are never dates, whatever a lenient parser would make of them.
static PLAIN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("number pattern is valid"));

/// Detects date columns and converts them to day offsets.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    threshold: f64,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl DateNormalizer {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            threshold: config.date_ratio_threshold,
        }
    }

    /// Detect and convert a cleaned column.
    pub fn detect_column(&self, column: &Column) -> DateDetection {
        let texts = column.texts();
        let values: Vec<Option<&str>> = texts.iter().map(|s| Some(s.as_str())).collect();
        self.detect(&values)
    }

    /// Detect and convert row-aligned values, `None` marking missing cells.
    ///
    /// Offsets in the result keep the input's positions.
    pub fn detect<S: AsRef<str>>(&self, values: &[Option<S>]) -> DateDetection {
        let present: Vec<&str> = values
            .iter()
            .flatten()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .collect();
        let Some(sample) = present.first() else {
            return DateDetection::NotDate;
        };

        for format in DATE_FORMATS {
            if parse_with_format(sample, format).is_none() {
                continue;
            }
            let parsed = parse_all(values, |s| parse_with_format(s, format));
            if self.accepts(&parsed, present.len()) {
                debug!(format, "Detected date column");
                return convert(format, parsed);
            }
        }

        let parsed = parse_all(values, parse_flexible);
        if self.accepts(&parsed, present.len()) {
            debug!("Detected date column with flexible parser");
            return convert(FLEXIBLE_FORMAT, parsed);
        }

        DateDetection::NotDate
    }

    fn accepts(&self, parsed: &[Option<NaiveDate>], present: usize) -> bool {
        let valid = parsed.iter().filter(|d| d.is_some()).count();
        present > 0 && valid as f64 / present as f64 >= self.threshold
    }
}

/// Detect a date column with the default threshold.
pub fn detect_and_convert(column: &Column) -> DateDetection {
    DateNormalizer::default().detect_column(column)
}

fn parse_all<S: AsRef<str>>(
    values: &[Option<S>],
    parse: impl Fn(&str) -> Option<NaiveDate>,
) -> Vec<Option<NaiveDate>> {
    values
        .iter()
        .map(|v| v.as_ref().and_then(|s| parse(s.as_ref().trim())))
        .collect()
}

fn convert(format: &str, parsed: Vec<Option<NaiveDate>>) -> DateDetection {
    let dates = parsed.iter().flatten();
    let (Some(min), Some(max)) = (dates.clone().min().copied(), dates.max().copied()) else {
        return DateDetection::NotDate;
    };

    DateDetection::Date(DateConversion {
        format: format.to_string(),
        min,
        max,
        range_days: (max - min).num_days(),
        parsed: parsed.iter().filter(|d| d.is_some()).count(),
        offsets: parsed
            .iter()
            .map(|d| d.map(|d| (d - min).num_days()))
            .collect(),
    })
}

/// Parse with one strftime format. Four-digit-year formats reject short
/// years such as `16/04/24`.
fn parse_with_format(value: &str, format: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(value, format).ok()?;
    if format.contains("%Y") && date.year() < 1000 {
        return None;
    }
    Some(date)
}

/// Day-first parser for mixed date and datetime strings.
fn parse_flexible(value: &str) -> Option<NaiveDate> {
    if value.is_empty() || PLAIN_NUMBER.is_match(value) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|format| {
            NaiveDateTime::parse_from_str(value, format)
                .ok()
                .filter(|dt| dt.year() >= 1000)
                .map(|dt| dt.date())
        })
        .or_else(|| {
            FLEXIBLE_DATE_FORMATS
                .iter()
                .find_map(|format| parse_with_format(value, format))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn conversion(detection: DateDetection) -> DateConversion {
        match detection {
            DateDetection::Date(c) => c,
            DateDetection::NotDate => panic!("expected a date column"),
        }
    }

    #[test]
    fn test_day_first_dates_to_offsets() {
        let column = Column::from_texts("d", &["16/04/2024", "23/04/2024", "30/04/2024"]);
        let c = conversion(detect_and_convert(&column));

        assert_eq!(c.format, "%d/%m/%Y");
        assert_eq!(c.offsets, vec![Some(0), Some(7), Some(14)]);
        assert_eq!(c.min, date(2024, 4, 16));
        assert_eq!(c.max, date(2024, 4, 30));
        assert_eq!(c.range_days, 14);
    }

    #[test]
    fn test_offsets_are_relative_to_minimum() {
        let column = Column::from_texts("d", &["2024-03-10", "2024-03-01", "2024-03-05"]);
        let c = conversion(detect_and_convert(&column));
        assert_eq!(c.format, "%Y-%m-%d");
        assert_eq!(c.offsets, vec![Some(9), Some(0), Some(4)]);
    }

    #[test]
    fn test_us_format_when_day_first_fails() {
        let column = Column::from_texts("d", &["04/16/2024", "04/23/2024"]);
        let c = conversion(detect_and_convert(&column));
        assert_eq!(c.format, "%m/%d/%Y");
        assert_eq!(c.offsets, vec![Some(0), Some(7)]);
    }

    #[test]
    fn test_two_digit_years() {
        let column = Column::from_texts("d", &["16/04/24", "17/04/24"]);
        let c = conversion(detect_and_convert(&column));
        assert_eq!(c.format, "%d/%m/%y");
        assert_eq!(c.min, date(2024, 4, 16));
    }

    #[test]
    fn test_threshold_tolerates_some_garbage() {
        let values = [
            Some("01/01/2024"),
            Some("02/01/2024"),
            Some("03/01/2024"),
            Some("04/01/2024"),
            Some("oops"),
            None,
        ];
        let c = conversion(DateNormalizer::default().detect(&values));
        assert_eq!(c.parsed, 4);
        assert_eq!(c.offsets, vec![Some(0), Some(1), Some(2), Some(3), None, None]);
    }

    #[test]
    fn test_flexible_fallback() {
        let column = Column::from_texts(
            "d",
            &["2024-04-16T10:00:00Z", "2024-04-18 08:30:00", "20.04.2024"],
        );
        let c = conversion(detect_and_convert(&column));
        assert_eq!(c.format, FLEXIBLE_FORMAT);
        assert_eq!(c.offsets, vec![Some(0), Some(2), Some(4)]);
    }

    #[test]
    fn test_non_dates() {
        let names = Column::from_texts("n", &["alice", "bob", "carol"]);
        assert_eq!(detect_and_convert(&names), DateDetection::NotDate);

        let numbers = Column::from_numbers("x", &[1.0, 2.0, 20240416.0]);
        assert_eq!(detect_and_convert(&numbers), DateDetection::NotDate);

        let empty: [Option<&str>; 2] = [None, None];
        assert_eq!(DateNormalizer::default().detect(&empty), DateDetection::NotDate);
    }
}
