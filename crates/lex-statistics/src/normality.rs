//! Normality testing.
//!
//! Runs Shapiro-Wilk (small and medium samples), a one-sample
//! Kolmogorov-Smirnov test against a normal fitted to the sample, and
//! D'Agostino-Pearson (n >= 8 by default). A test that cannot run is
//! reported as a failed entry; the other tests still run.

use normality::{dagostino_k_squared, shapiro_wilk};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::types::{NormalityOutcome, NormalityResult, NormalityTest};
use crate::utils::{mean, sample_std, sorted};

/// Fewest observations any test needs.
pub const MIN_OBSERVATIONS: usize = 3;

/// Orchestrates the normality tests.
#[derive(Debug, Clone, Copy)]
pub struct NormalityTester {
    alpha: f64,
    shapiro_max_n: usize,
    dagostino_min_n: usize,
}

impl Default for NormalityTester {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl NormalityTester {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            alpha: config.alpha,
            shapiro_max_n: config.shapiro_max_n,
            dagostino_min_n: config.dagostino_min_n,
        }
    }

    /// Run every applicable test on `values`.
    ///
    /// Fails with [`StatsError::InsufficientData`] below
    /// [`MIN_OBSERVATIONS`] values.
    pub fn run(&self, values: &[f64]) -> Result<Vec<NormalityResult>> {
        let n = values.len();
        if n < MIN_OBSERVATIONS {
            return Err(StatsError::insufficient(MIN_OBSERVATIONS, n));
        }

        let mut results = Vec::with_capacity(3);

        if n <= self.shapiro_max_n {
            let outcome = shapiro_wilk(values.to_vec())
                .map(|r| (r.statistic, r.p_value))
                .map_err(|e| e.to_string());
            results.push(self.result(NormalityTest::ShapiroWilk, outcome));
        }

        results.push(self.result(
            NormalityTest::KolmogorovSmirnov,
            kolmogorov_smirnov(values).map_err(|e| e.to_string()),
        ));

        if n >= self.dagostino_min_n {
            let outcome = dagostino_k_squared(values.to_vec())
                .map(|r| (r.statistic, r.p_value))
                .map_err(|e| e.to_string());
            results.push(self.result(NormalityTest::DagostinoPearson, outcome));
        }

        Ok(results)
    }

    fn result(
        &self,
        test: NormalityTest,
        outcome: std::result::Result<(f64, f64), String>,
    ) -> NormalityResult {
        let outcome = match outcome {
            Ok((statistic, p_value)) if statistic.is_finite() && p_value.is_finite() => {
                let is_normal = p_value > self.alpha;
                debug!(
                    test = test.display_name(),
                    statistic, p_value, is_normal, "Normality test"
                );
                NormalityOutcome::Completed {
                    statistic,
                    p_value,
                    is_normal,
                    interpretation: interpret(is_normal, self.alpha),
                }
            }
            Ok((statistic, p_value)) => failed(
                test,
                format!("non-finite result (statistic {statistic}, p-value {p_value})"),
            ),
            Err(error) => failed(test, error),
        };
        NormalityResult { test, outcome }
    }
}

fn failed(test: NormalityTest, error: String) -> NormalityOutcome {
    warn!("{} test failed: {}", test.display_name(), error);
    NormalityOutcome::Failed { error }
}

fn interpret(is_normal: bool, alpha: f64) -> String {
    if is_normal {
        format!("data are consistent with a normal distribution (alpha = {alpha})")
    } else {
        format!("data do not follow a normal distribution (alpha = {alpha})")
    }
}

/// One-sample KS test against `Normal(mean, s)` with the sample's own
/// mean and standard deviation. Returns `(D, p-value)`.
pub fn kolmogorov_smirnov(values: &[f64]) -> Result<(f64, f64)> {
    let n = values.len();
    let mu = mean(values).ok_or_else(|| StatsError::insufficient(1, 0))?;
    let sigma = sample_std(values).ok_or_else(|| StatsError::insufficient(2, n))?;
    if sigma <= 0.0 || !sigma.is_finite() {
        return Err(StatsError::DegenerateDistribution(
            "standard deviation is zero".to_string(),
        ));
    }

    let normal = Normal::new(mu, sigma)
        .map_err(|e| StatsError::DegenerateDistribution(e.to_string()))?;

    let nf = n as f64;
    let d = sorted(values)
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let cdf = normal.cdf(*x);
            let above = (i + 1) as f64 / nf - cdf;
            let below = cdf - i as f64 / nf;
            above.max(below)
        })
        .fold(0.0, f64::max);

    // Stephens' small-sample correction of the Kolmogorov argument
    let sqrt_n = nf.sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    Ok((d, kolmogorov_p_value(lambda)))
}

/// Survival function of the Kolmogorov distribution.
fn kolmogorov_p_value(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    if z > 3.0 {
        return (2.0 * (-2.0 * z * z).exp()).clamp(0.0, 1.0);
    }

    let mut p = 0.0;
    for k in 1..=100 {
        let term = (-2.0 * f64::from(k).powi(2) * z * z).exp();
        if k % 2 == 1 {
            p += term;
        } else {
            p -= term;
        }
        if term < 1e-12 {
            break;
        }
    }
    (2.0 * p).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::distributions::Distribution;
    use rand::rngs::StdRng;

    fn normal_sample(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let dist = Normal::new(50.0, 10.0).unwrap();
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    fn outcome_of(results: &[NormalityResult], test: NormalityTest) -> &NormalityOutcome {
        &results.iter().find(|r| r.test == test).unwrap().outcome
    }

    #[test]
    fn test_too_few_observations() {
        let err = NormalityTester::default().run(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            StatsError::InsufficientData {
                required: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_small_sample_skips_dagostino() {
        let results = NormalityTester::default()
            .run(&[1.0, 2.0, 4.0, 3.0, 5.0])
            .unwrap();
        let tests: Vec<NormalityTest> = results.iter().map(|r| r.test).collect();
        assert_eq!(
            tests,
            vec![NormalityTest::ShapiroWilk, NormalityTest::KolmogorovSmirnov]
        );
    }

    #[test]
    fn test_normal_sample_is_not_rejected_by_ks() {
        let values = normal_sample(200, 7);
        let results = NormalityTester::default().run(&values).unwrap();
        assert_eq!(results.len(), 3);

        match outcome_of(&results, NormalityTest::KolmogorovSmirnov) {
            NormalityOutcome::Completed {
                statistic, p_value, ..
            } => {
                assert!(*statistic < 0.1, "D = {statistic}");
                assert!(*p_value > 0.05, "p = {p_value}");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_skewed_sample_is_rejected_by_ks() {
        let values: Vec<f64> = (0..200).map(|i| (f64::from(i) / 20.0).exp()).collect();
        let (d, p) = kolmogorov_smirnov(&values).unwrap();
        assert!(d > 0.2, "D = {d}");
        assert!(p < 0.05, "p = {p}");
    }

    #[test]
    fn test_constant_sample_fails_ks_only() {
        let results = NormalityTester::default().run(&[5.0; 10]).unwrap();
        assert!(matches!(
            outcome_of(&results, NormalityTest::KolmogorovSmirnov),
            NormalityOutcome::Failed { .. }
        ));
        assert!(results.len() >= 2);
    }

    #[test]
    fn test_kolmogorov_p_value_bounds() {
        assert_eq!(kolmogorov_p_value(0.0), 1.0);
        // Known quantile: P(K > 1.36) ~ 0.049
        assert!((kolmogorov_p_value(1.36) - 0.0494).abs() < 1e-3);
        assert!(kolmogorov_p_value(4.0) < 1e-12);
    }

    #[test]
    fn test_interpretation_follows_alpha() {
        assert!(interpret(true, 0.05).contains("consistent"));
        assert!(interpret(false, 0.05).contains("do not follow"));
    }
}
