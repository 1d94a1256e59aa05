//! Estimators for grouped data.
//!
//! Every estimator works from class marks and interval bounds, so results
//! are interpolated approximations of the underlying sample.

use crate::types::{Estimate, FrequencyTable, GroupedSummary, Interval};

/// A binned row usable by the estimators.
#[derive(Debug, Clone, Copy)]
struct GroupedRow {
    interval: Interval,
    mark: f64,
    frequency: f64,
    cumulative: f64,
}

/// Compute grouped estimators from a binned frequency table.
///
/// Only rows carrying both an interval and a class mark are used. Returns
/// `None` when no such row exists.
pub fn compute_grouped(table: &FrequencyTable) -> Option<GroupedSummary> {
    let rows = grouped_rows(table);
    let (first, last) = (rows.first()?, rows.last()?);
    let n = last.cumulative;
    if n <= 0.0 {
        return None;
    }

    let mean = rows.iter().map(|r| r.mark * r.frequency).sum::<f64>() / n;
    let moment = |k: i32| {
        rows.iter()
            .map(|r| r.frequency * (r.mark - mean).powi(k))
            .sum::<f64>()
    };

    let ss = moment(2);
    let population_variance = ss / n;
    let sample_variance = if n > 1.0 {
        ss / (n - 1.0)
    } else {
        population_variance
    };
    let population_std = population_variance.sqrt();
    let sample_std = sample_variance.sqrt();

    let (harmonic_mean, geometric_mean) = if rows.iter().all(|r| r.mark > 0.0) {
        let reciprocal = rows.iter().map(|r| r.frequency / r.mark).sum::<f64>();
        let log_sum = rows.iter().map(|r| r.frequency * r.mark.ln()).sum::<f64>();
        (
            Estimate::from_finite(n / reciprocal),
            Estimate::from_finite((log_sum / n).exp()),
        )
    } else {
        (Estimate::NotApplicable, Estimate::NotApplicable)
    };

    let (skewness, excess_kurtosis) = if population_std > 0.0 {
        (
            Estimate::from_finite(moment(3) / n / population_std.powi(3)),
            Estimate::from_finite(moment(4) / n / population_std.powi(4) - 3.0),
        )
    } else {
        (Estimate::NotApplicable, Estimate::NotApplicable)
    };

    let coefficient_of_variation = if mean != 0.0 {
        population_std / mean * 100.0
    } else {
        0.0
    };

    Some(GroupedSummary {
        n: n as usize,
        mean,
        median: median(&rows, n),
        mode: kings_mode(&rows),
        harmonic_mean,
        geometric_mean,
        population_variance,
        sample_variance,
        population_std,
        sample_std,
        coefficient_of_variation,
        skewness,
        excess_kurtosis,
        standard_error: Estimate::from_finite(sample_std / n.sqrt()),
        min_bound: first.interval.lower,
        max_bound: last.interval.upper,
        range: last.interval.upper - first.interval.lower,
    })
}

fn grouped_rows(table: &FrequencyTable) -> Vec<GroupedRow> {
    let mut cumulative = 0.0;
    table
        .data_rows()
        .filter_map(|row| {
            let interval = row.label.interval()?;
            let mark = row.class_mark?;
            let frequency = row.absolute as f64;
            cumulative += frequency;
            Some(GroupedRow {
                interval,
                mark,
                frequency,
                cumulative,
            })
        })
        .collect()
}

/// `L + ((n/2 - F_prev) / f) * c` in the first row reaching n/2.
fn median(rows: &[GroupedRow], n: f64) -> Estimate {
    let half = n / 2.0;
    let Some(idx) = rows.iter().position(|r| r.cumulative >= half) else {
        return Estimate::NotApplicable;
    };
    let row = rows[idx];
    let previous = if idx > 0 { rows[idx - 1].cumulative } else { 0.0 };
    if row.frequency <= 0.0 {
        return Estimate::NotApplicable;
    }
    Estimate::from_finite(
        row.interval.lower + (half - previous) / row.frequency * row.interval.width(),
    )
}

/// King's interpolation in the first modal row.
fn kings_mode(rows: &[GroupedRow]) -> Estimate {
    let Some(max) = rows.iter().map(|r| r.frequency).reduce(f64::max) else {
        return Estimate::NotApplicable;
    };
    let Some(idx) = rows.iter().position(|r| r.frequency == max) else {
        return Estimate::NotApplicable;
    };

    let row = rows[idx];
    let before = if idx > 0 { rows[idx - 1].frequency } else { 0.0 };
    let after = rows.get(idx + 1).map_or(0.0, |r| r.frequency);
    let d1 = row.frequency - before;
    let d2 = row.frequency - after;

    if d1 + d2 == 0.0 {
        Estimate::Value(row.mark)
    } else {
        Estimate::from_finite(row.interval.lower + d1 / (d1 + d2) * row.interval.width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::table_from_labels;
    use crate::types::VariableType;

    fn table(rows: &[(&str, usize)]) -> FrequencyTable {
        table_from_labels(VariableType::ContinuousQuantitative, rows).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_textbook_grouped_measures() {
        // Marks 5, 15, 25, 35 with frequencies 2, 3, 4, 1
        let t = table(&[
            ("[0 - 10)", 2),
            ("[10 - 20)", 3),
            ("[20 - 30)", 4),
            ("[30 - 40)", 1),
        ]);
        let s = compute_grouped(&t).unwrap();

        assert_eq!(s.n, 10);
        assert_close(s.mean, 19.0);
        // n/2 = 5 reached in row 2: 10 + (5 - 2) / 3 * 10
        assert_close(s.median.value().unwrap(), 20.0);
        // d1 = 1, d2 = 3: 20 + 1/4 * 10
        assert_close(s.mode.value().unwrap(), 22.5);
        assert_close(s.population_variance, 84.0);
        assert_close(s.sample_variance, 840.0 / 9.0);
        assert_close(s.coefficient_of_variation, 84f64.sqrt() / 19.0 * 100.0);
        assert_close(s.range, 40.0);

        // Deviations -14, -4, 6, 16: sum f*d^3 = -720, sum f*d^4 = 148320
        assert_close(s.skewness.value().unwrap(), -72.0 / 84f64.powf(1.5));
        assert_close(s.excess_kurtosis.value().unwrap(), 14832.0 / 7056.0 - 3.0);
        assert!((s.skewness.value().unwrap() + 0.09352).abs() < 1e-4);
        assert!((s.excess_kurtosis.value().unwrap() + 0.89796).abs() < 1e-4);

        // sum f/m = 2/5 + 3/15 + 4/25 + 1/35 = 27.6/35
        assert_close(s.harmonic_mean.value().unwrap(), 350.0 / 27.6);
        let product = 5f64.powi(2) * 15f64.powi(3) * 25f64.powi(4) * 35.0;
        assert_close(s.geometric_mean.value().unwrap(), product.powf(0.1));
        assert!((s.geometric_mean.value().unwrap() - 16.07697).abs() < 1e-4);

        // sqrt(840/9) / sqrt(10)
        assert_close(s.standard_error.value().unwrap(), (84.0f64 / 9.0).sqrt());
    }

    #[test]
    fn test_mode_uses_first_of_tied_rows() {
        let t = table(&[("[0 - 10)", 3), ("[10 - 20)", 3), ("[20 - 30)", 3)]);
        let s = compute_grouped(&t).unwrap();
        // First modal row: d1 = 3, d2 = 0
        assert_close(s.mode.value().unwrap(), 10.0);

        let single = table(&[("[0 - 10)", 0)]);
        assert!(compute_grouped(&single).is_none());
    }

    #[test]
    fn test_single_row_statistics() {
        let t = table(&[("[4.5 - 5.5)", 4)]);
        let s = compute_grouped(&t).unwrap();

        // d1 = 4 - 0 and d2 = 4 - 0 -> interpolated midpoint
        assert_close(s.mode.value().unwrap(), 5.0);
        assert_close(s.mean, 5.0);
        assert_eq!(s.skewness, Estimate::NotApplicable);
        assert_eq!(s.excess_kurtosis, Estimate::NotApplicable);
        assert_close(s.population_std, 0.0);
    }

    #[test]
    fn test_non_positive_marks_disable_hmean_and_gmean() {
        let t = table(&[("[-10 - 0)", 2), ("[0 - 10)", 2)]);
        let s = compute_grouped(&t).unwrap();

        assert_eq!(s.harmonic_mean, Estimate::NotApplicable);
        assert_eq!(s.geometric_mean, Estimate::NotApplicable);
        assert_close(s.mean, 0.0);
        assert_close(s.coefficient_of_variation, 0.0);
    }

    #[test]
    fn test_sample_variance_with_single_observation() {
        let t = table(&[("[0 - 2)", 1)]);
        let s = compute_grouped(&t).unwrap();
        assert_eq!(s.sample_variance, s.population_variance);
    }
}
