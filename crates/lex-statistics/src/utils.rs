//! Shared numeric and parsing helpers.
//!
//! Small pure functions reused by several components: dtype checks, strict
//! numeric parsing of text cells, sorted-slice quantiles and central moments.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Conventional spellings of "not available" in exported tables.
///
/// Words such as "unknown" or "none" are legitimate categories and stay
/// out of this list.
pub const NA_MARKERS: [&str; 6] = ["na", "n/a", "#n/a", "<na>", "null", "nan"];

/// Check if a string is a not-available marker.
pub fn is_na_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    NA_MARKERS.iter().any(|&marker| lower == marker)
}

/// Check if a cell should be treated as missing: blank or an NA marker.
pub fn is_missing_text(s: &str) -> bool {
    s.trim().is_empty() || is_na_marker(s)
}

/// Parse a text cell as a finite number.
///
/// Unlike a formatting-tolerant parser this only trims whitespace, so
/// `"12%"` or `"1,5"` do not count as numbers.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Slice Statistics
// =============================================================================

/// Sort a copy of `values` ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Linear-interpolation quantile on pre-sorted values (Hyndman-Fan type 7).
///
/// Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], quantile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = quantile.clamp(0.0, 1.0) * (sorted.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Variance with `ddof` delta degrees of freedom; `None` when `n <= ddof`.
pub fn variance(values: &[f64], ddof: usize) -> Option<f64> {
    let n = values.len();
    if n <= ddof {
        return None;
    }
    let mean = mean(values)?;
    let ss = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(ss / (n - ddof) as f64)
}

/// Sample standard deviation (`ddof = 1`).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    variance(values, 1).map(f64::sqrt)
}

/// Central moment of order `k` about `mean`, divided by n.
pub fn central_moment(values: &[f64], mean: f64, k: i32) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(k)).sum::<f64>() / values.len() as f64
}

/// Median of an unsorted slice of floats.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile_sorted(&sorted(values), 0.5)
}

/// True when `value` is within `atol + rtol * |round(value)|` of its
/// rounded value.
#[inline]
pub fn is_integral(value: f64) -> bool {
    const TOL: f64 = 1e-9;
    let rounded = value.round();
    (value - rounded).abs() <= TOL + TOL * rounded.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_na_marker() {
        assert!(is_na_marker("N/A"));
        assert!(is_na_marker("  null "));
        assert!(is_na_marker("NaN"));
        assert!(!is_na_marker("42"));
        assert!(is_missing_text("   "));
    }

    #[test]
    fn test_category_words_are_not_missing() {
        for word in ["unknown", "error", "missing", "none", "None"] {
            assert!(!is_missing_text(word), "{word}");
        }
    }

    #[test]
    fn test_parse_number_is_strict() {
        assert_eq!(parse_number(" 3.5 "), Some(3.5));
        assert_eq!(parse_number("-1e3"), Some(-1000.0));
        assert_eq!(parse_number("12%"), None);
        assert_eq!(parse_number("1,5"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_quantile_sorted_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&values, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&values, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_variance_ddof() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(variance(&values, 0), Some(4.0));
        assert!((variance(&values, 1).unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(variance(&[1.0], 1), None);
    }

    #[test]
    fn test_central_moment() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(central_moment(&values, 2.0, 3), 0.0);
        assert!((central_moment(&values, 2.0, 2) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_integral_tolerance() {
        assert!(is_integral(3.0));
        assert!(is_integral(3.0 + 1e-12));
        assert!(is_integral(-7.0));
        assert!(!is_integral(3.5));
        assert!(!is_integral(3.0001));
    }

    #[test]
    fn test_dtype_checks() {
        assert!(is_numeric_dtype(&DataType::Int32));
        assert!(!is_numeric_dtype(&DataType::String));
    }
}
