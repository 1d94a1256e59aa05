//! Estimators for ungrouped numeric data.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{Result, StatsError};
use crate::types::{ConfidenceInterval, Estimate, Modality, RawSummary};
use crate::utils::{central_moment, mean, quantile_sorted, sorted, variance};

/// Summarize raw numeric values.
///
/// `confidence_level` is the coverage of the t-based interval for the mean.
pub fn summarize_raw(values: &[f64], confidence_level: f64) -> Result<RawSummary> {
    let sorted = sorted(values);
    let n = sorted.len();
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Err(StatsError::insufficient(1, 0));
    };
    let quantile = |q: f64| quantile_sorted(&sorted, q).unwrap_or(min);

    let mean = mean(&sorted).unwrap_or(0.0);
    let population_variance = variance(&sorted, 0).unwrap_or(0.0);
    let population_std = population_variance.sqrt();
    let sample_variance = variance(&sorted, 1);
    let sample_std = sample_variance.map(f64::sqrt);

    let (modes, modality) = modes(&sorted);

    let all_positive = min > 0.0;
    let harmonic_mean = if all_positive {
        Estimate::from_finite(n as f64 / sorted.iter().map(|v| 1.0 / v).sum::<f64>())
    } else {
        Estimate::NotApplicable
    };
    let geometric_mean = if all_positive {
        Estimate::from_finite((sorted.iter().map(|v| v.ln()).sum::<f64>() / n as f64).exp())
    } else {
        Estimate::NotApplicable
    };

    let coefficient_of_variation = match sample_std {
        Some(_) if mean == 0.0 => Estimate::Value(0.0),
        Some(s) => Estimate::from_finite(s / mean * 100.0),
        None => Estimate::NotApplicable,
    };

    let skewness = adjusted_skewness(&sorted, mean, population_variance);
    let excess_kurtosis = adjusted_kurtosis(&sorted, mean, population_variance);

    let standard_error = sample_std.map(|s| s / (n as f64).sqrt());
    let confidence_interval = standard_error
        .and_then(|se| confidence_interval(mean, se, n, confidence_level));

    let q1 = quantile(0.25);
    let q3 = quantile(0.75);

    Ok(RawSummary {
        n,
        mean,
        median: quantile(0.5),
        modes,
        modality,
        harmonic_mean,
        geometric_mean,
        sample_variance: sample_variance.into(),
        population_variance,
        sample_std: sample_std.into(),
        population_std,
        coefficient_of_variation,
        min,
        max,
        range: max - min,
        q1,
        q3,
        iqr: q3 - q1,
        p10: quantile(0.10),
        p90: quantile(0.90),
        skewness_interpretation: skewness.value().map(|g| interpret_skewness(g).to_string()),
        skewness,
        kurtosis_interpretation: excess_kurtosis
            .value()
            .map(|g| interpret_kurtosis(g).to_string()),
        excess_kurtosis,
        standard_error: standard_error.into(),
        confidence_interval,
    })
}

/// Every value sharing the highest count, ascending.
fn modes(sorted: &[f64]) -> (Vec<f64>, Modality) {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &value in sorted {
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }

    let top = runs.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let modes: Vec<f64> = runs
        .into_iter()
        .filter(|(_, count)| *count == top)
        .map(|(value, _)| value)
        .collect();

    let modality = match modes.len() {
        0 | 1 => Modality::Unimodal,
        2 => Modality::Bimodal,
        _ => Modality::Multimodal,
    };
    (modes, modality)
}

/// Bias-corrected sample skewness `G1`; needs n >= 3 and non-zero spread.
fn adjusted_skewness(values: &[f64], mean: f64, m2: f64) -> Estimate {
    let n = values.len() as f64;
    if values.len() < 3 || m2 <= 0.0 {
        return Estimate::NotApplicable;
    }
    let g1 = central_moment(values, mean, 3) / m2.powf(1.5);
    Estimate::from_finite((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// Bias-corrected excess kurtosis `G2`; needs n >= 4 and non-zero spread.
fn adjusted_kurtosis(values: &[f64], mean: f64, m2: f64) -> Estimate {
    let n = values.len() as f64;
    if values.len() < 4 || m2 <= 0.0 {
        return Estimate::NotApplicable;
    }
    let g2 = central_moment(values, mean, 4) / (m2 * m2) - 3.0;
    Estimate::from_finite(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

fn confidence_interval(
    mean: f64,
    standard_error: f64,
    n: usize,
    level: f64,
) -> Option<ConfidenceInterval> {
    let t = StudentsT::new(0.0, 1.0, (n - 1) as f64).ok()?;
    let critical = t.inverse_cdf((1.0 + level) / 2.0);
    let margin = critical * standard_error;
    margin.is_finite().then_some(ConfidenceInterval {
        level,
        lower: mean - margin,
        upper: mean + margin,
        margin,
    })
}

/// Describe a skewness coefficient.
pub fn interpret_skewness(g: f64) -> &'static str {
    if g > 1.0 {
        "strongly positively skewed (right tail)"
    } else if g > 0.5 {
        "moderately positively skewed"
    } else if g > -0.5 {
        "approximately symmetric"
    } else if g > -1.0 {
        "moderately negatively skewed"
    } else {
        "strongly negatively skewed (left tail)"
    }
}

/// Describe an excess kurtosis coefficient.
pub fn interpret_kurtosis(g: f64) -> &'static str {
    if g > 1.0 {
        "leptokurtic (more peaked than normal)"
    } else if g < -1.0 {
        "platykurtic (flatter than normal)"
    } else {
        "mesokurtic (close to normal)"
    }
}
