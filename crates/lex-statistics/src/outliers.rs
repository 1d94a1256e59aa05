//! Outlier detection.
//!
//! Contains the IQR fence and Z-score detectors. Both report the outliers
//! in encounter order and never modify the input.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::types::{OutlierBounds, OutlierMethod, OutlierReport};
use crate::utils::{mean, quantile_sorted, sample_std, sorted};

/// Flags atypical values in numeric data.
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector {
    iqr_multiplier: f64,
    z_threshold: f64,
    max_values: usize,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl OutlierDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            iqr_multiplier: config.iqr_multiplier,
            z_threshold: config.z_threshold,
            max_values: config.max_outlier_values,
        }
    }

    /// Override the Z-score threshold.
    pub fn with_z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = threshold;
        self
    }

    /// Values outside `[Q1 - k*IQR, Q3 + k*IQR]`, with type-7 quartiles.
    pub fn detect_iqr(&self, values: &[f64]) -> Result<OutlierReport> {
        let sorted = sorted(values);
        let (Some(q1), Some(q3)) = (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75))
        else {
            return Err(StatsError::insufficient(1, 0));
        };

        let iqr = q3 - q1;
        let lower = q1 - self.iqr_multiplier * iqr;
        let upper = q3 + self.iqr_multiplier * iqr;

        let report = self.report(
            values,
            OutlierMethod::Iqr,
            OutlierBounds::Iqr {
                q1,
                q3,
                iqr,
                lower,
                upper,
            },
            |v| v < lower || v > upper,
        );
        debug!(lower, upper, count = report.count, "IQR outlier detection");
        Ok(report)
    }

    /// Values whose absolute z-score, from the sample standard deviation,
    /// exceeds the threshold. Zero spread yields no outliers.
    pub fn detect_zscore(&self, values: &[f64]) -> Result<OutlierReport> {
        let mean = mean(values).ok_or_else(|| StatsError::insufficient(1, 0))?;
        let std = sample_std(values).unwrap_or(0.0);
        let threshold = self.z_threshold;

        let bounds = OutlierBounds::ZScore {
            mean,
            std,
            threshold,
        };
        let report = if std > 0.0 {
            self.report(values, OutlierMethod::ZScore, bounds, |v| {
                ((v - mean) / std).abs() > threshold
            })
        } else {
            self.report(values, OutlierMethod::ZScore, bounds, |_| false)
        };
        debug!(mean, std, threshold, count = report.count, "Z-score outlier detection");
        Ok(report)
    }

    fn report(
        &self,
        values: &[f64],
        method: OutlierMethod,
        bounds: OutlierBounds,
        is_outlier: impl Fn(f64) -> bool,
    ) -> OutlierReport {
        let outliers: Vec<f64> = values.iter().copied().filter(|v| is_outlier(*v)).collect();
        let count = outliers.len();
        OutlierReport {
            method,
            bounds,
            count,
            percentage: count as f64 / values.len().max(1) as f64 * 100.0,
            values: outliers.into_iter().take(self.max_values).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iqr_flags_single_outlier() {
        let values = [10.0, 12.0, 11.0, 13.0, 12.0, 11.0, 14.0, 13.0, 100.0, 11.0, 12.0];
        let report = OutlierDetector::default().detect_iqr(&values).unwrap();

        assert_eq!(report.count, 1);
        assert_eq!(report.values, vec![100.0]);
        let OutlierBounds::Iqr { q1, q3, lower, upper, .. } = report.bounds else {
            panic!("expected IQR bounds");
        };
        assert_eq!(q1, 11.0);
        assert_eq!(q3, 13.0);
        assert_eq!(lower, 8.0);
        assert_eq!(upper, 16.0);
        assert!((report.percentage - 100.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_values_are_reported_in_encounter_order_and_capped() {
        let mut values = vec![0.0; 100];
        values.extend((1..=30).rev().map(|i| f64::from(i) * 1000.0));
        let report = OutlierDetector::default().detect_iqr(&values).unwrap();

        assert_eq!(report.count, 30);
        assert_eq!(report.values.len(), 20);
        assert_eq!(report.values[0], 30000.0);
        assert_eq!(report.values[19], 11000.0);
    }

    #[test]
    fn test_zscore_zero_variance() {
        let report = OutlierDetector::default()
            .detect_zscore(&[5.0, 5.0, 5.0, 5.0, 5.0])
            .unwrap();
        assert_eq!(report.count, 0);
        assert_eq!(report.percentage, 0.0);
    }

    #[test]
    fn test_zscore_threshold_monotonicity() {
        let mut values: Vec<f64> = (0..50).map(|i| f64::from(i % 10)).collect();
        values.extend([40.0, -25.0, 60.0]);

        let mut previous = usize::MAX;
        for threshold in [1.0, 1.5, 2.0, 3.0, 4.0, 6.0] {
            let count = OutlierDetector::default()
                .with_z_threshold(threshold)
                .detect_zscore(&values)
                .unwrap()
                .count;
            assert!(count <= previous, "threshold {threshold}");
            previous = count;
        }
    }

    #[test]
    fn test_zscore_detects_extreme_value() {
        let mut values = vec![10.0; 20];
        values[3] = 11.0;
        values[7] = 9.0;
        values.push(50.0);
        let report = OutlierDetector::default().detect_zscore(&values).unwrap();
        assert_eq!(report.values, vec![50.0]);
    }

    #[test]
    fn test_empty_input() {
        let detector = OutlierDetector::default();
        assert!(detector.detect_iqr(&[]).unwrap_err().is_recoverable());
        assert!(detector.detect_zscore(&[]).unwrap_err().is_recoverable());
    }
}
