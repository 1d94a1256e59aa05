//! Numeric-column type rules.

use crate::types::VariableType;
use crate::utils::{is_integral, mean, median};

/// Decimal parts at or below this are treated as float noise.
const DECIMAL_EPSILON: f64 = 1e-10;

/// Classify a column whose values coerced to numbers.
///
/// `values` must be non-empty.
pub(crate) fn infer_numeric_type(values: &[f64]) -> VariableType {
    if values.iter().all(|v| is_integral(*v)) {
        return integer_type(values);
    }

    let has_decimals = values
        .iter()
        .any(|v| (v - v.round()).abs() > DECIMAL_EPSILON);
    if has_decimals {
        VariableType::ContinuousQuantitative
    } else {
        integer_type(values)
    }
}

fn integer_type(values: &[f64]) -> VariableType {
    let unique = sorted_unique(values);
    let unique_count = unique.len();
    let unique_ratio = unique_count as f64 / values.len() as f64;

    if unique_count <= 10 || (unique_count <= 20 && unique_ratio < 0.05) {
        return VariableType::DiscreteQuantitative;
    }

    if is_dense_sequence(&unique) {
        return VariableType::DiscreteQuantitativeIntervaled;
    }

    // Mostly-unique integers behave like identifiers or measurements
    if unique_ratio > 0.5 {
        VariableType::ContinuousQuantitative
    } else {
        VariableType::DiscreteQuantitativeIntervaled
    }
}

/// Median step of exactly 1 and mean step of at most 2.
fn is_dense_sequence(unique: &[f64]) -> bool {
    if unique.len() < 2 {
        return false;
    }
    let diffs: Vec<f64> = unique.windows(2).map(|w| w[1] - w[0]).collect();
    matches!(
        (median(&diffs), mean(&diffs)),
        (Some(med), Some(avg)) if med == 1.0 && avg <= 2.0
    )
}

fn sorted_unique(values: &[f64]) -> Vec<f64> {
    let mut unique = crate::utils::sorted(values);
    unique.dedup();
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_few_unique_integers_are_discrete() {
        let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 5.0];
        assert_eq!(infer_numeric_type(&values), VariableType::DiscreteQuantitative);
    }

    #[test]
    fn test_dense_integer_sequence_is_intervaled() {
        let values: Vec<f64> = (1..=40).map(f64::from).collect();
        assert_eq!(
            infer_numeric_type(&values),
            VariableType::DiscreteQuantitativeIntervaled
        );
    }

    #[test]
    fn test_sparse_unique_integers_are_continuous() {
        let values: Vec<f64> = (0..30).map(|i| f64::from(i * 7)).collect();
        assert_eq!(
            infer_numeric_type(&values),
            VariableType::ContinuousQuantitative
        );
    }

    #[test]
    fn test_sparse_repeated_integers_are_intervaled() {
        // 15 unique values, each repeated 4 times: ratio 0.25
        let values: Vec<f64> = (0..60).map(|i| f64::from((i % 15) * 10)).collect();
        assert_eq!(
            infer_numeric_type(&values),
            VariableType::DiscreteQuantitativeIntervaled
        );
    }

    #[test]
    fn test_many_repeats_of_few_values_are_discrete() {
        // 15 unique values over 400 observations: ratio < 0.05
        let values: Vec<f64> = (0..400).map(|i| f64::from((i % 15) * 3)).collect();
        assert_eq!(infer_numeric_type(&values), VariableType::DiscreteQuantitative);
    }

    #[test]
    fn test_decimals_are_continuous() {
        let values = [1.5, 2.25, 3.0];
        assert_eq!(
            infer_numeric_type(&values),
            VariableType::ContinuousQuantitative
        );
    }
}
