use std::collections::BTreeMap;

use crate::error::{Result, StatsError};
use crate::types::QualitativeSummary;

/// Summarize categorical values: mode, its share and the Shannon entropy.
///
/// Ties for the mode go to the smallest value in sort order.
pub fn summarize_qualitative<S: AsRef<str>>(values: &[S]) -> Result<QualitativeSummary> {
    if values.is_empty() {
        return Err(StatsError::insufficient(1, 0));
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value.as_ref()).or_insert(0) += 1;
    }

    let n = values.len() as f64;
    let mut mode = ("", 0usize);
    for (value, count) in &counts {
        if *count > mode.1 {
            mode = (*value, *count);
        }
    }

    let entropy = -counts
        .values()
        .map(|&count| {
            let p = count as f64 / n;
            p * p.log2()
        })
        .sum::<f64>();

    Ok(QualitativeSummary {
        n: values.len(),
        unique: counts.len(),
        mode: mode.0.to_string(),
        mode_frequency: mode.1,
        mode_proportion: mode.1 as f64 / n,
        entropy: entropy.max(0.0),
    })
}
