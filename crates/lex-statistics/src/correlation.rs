//! Correlation input preparation and the Pearson matrix.
//!
//! Date columns enter the matrix as day offsets, mostly-numeric columns as
//! numbers; everything else is dropped. Pairs use every row where both
//! columns have a value.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, warn};

use crate::column::series_cells;
use crate::config::AnalysisConfig;
use crate::dates::DateNormalizer;
use crate::error::{Result, ResultExt};
use crate::types::DateDetection;

/// How a prepared column was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnConversion {
    Numeric,
    Date {
        format: String,
        min: chrono::NaiveDate,
        max: chrono::NaiveDate,
        range_days: i64,
    },
}

/// A numeric column aligned with the source rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedColumn {
    pub name: String,
    pub conversion: ColumnConversion,
    pub values: Vec<Option<f64>>,
}

/// Columns ready for correlation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreparedTable {
    pub columns: Vec<PreparedColumn>,
    /// Columns that were neither dates nor numeric enough.
    pub dropped: Vec<String>,
}

/// Prepare `columns` of `df` (all columns when `None`) for correlation.
///
/// Unknown column names are skipped with a warning.
pub fn prepare_for_correlation(
    df: &DataFrame,
    columns: Option<&[String]>,
    config: &AnalysisConfig,
) -> Result<PreparedTable> {
    let names: Vec<String> = match columns {
        Some(columns) => columns.to_vec(),
        None => df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    let normalizer = DateNormalizer::from_config(config);
    let mut prepared = PreparedTable::default();

    for name in names {
        let Ok(column) = df.column(&name) else {
            warn!("Column '{}' not found, skipping", name);
            continue;
        };
        let cells = series_cells(column.as_materialized_series())
            .context(format!("Reading column '{name}'"))?;

        let texts: Vec<Option<String>> = cells
            .iter()
            .map(|c| c.as_ref().map(|c| c.as_text()))
            .collect();

        if let DateDetection::Date(conversion) = normalizer.detect(&texts) {
            debug!(column = %name, format = %conversion.format, "Using day offsets");
            prepared.columns.push(PreparedColumn {
                values: conversion
                    .offsets
                    .iter()
                    .map(|o| o.map(|days| days as f64))
                    .collect(),
                conversion: ColumnConversion::Date {
                    format: conversion.format,
                    min: conversion.min,
                    max: conversion.max,
                    range_days: conversion.range_days,
                },
                name,
            });
            continue;
        }

        let present = cells.iter().filter(|c| c.is_some()).count();
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| c.as_ref().and_then(|c| c.as_number()))
            .collect();
        let numeric = values.iter().filter(|v| v.is_some()).count();

        if present > 0 && numeric as f64 / present as f64 >= config.correlation_numeric_threshold {
            prepared.columns.push(PreparedColumn {
                name,
                conversion: ColumnConversion::Numeric,
                values,
            });
        } else {
            debug!(column = %name, numeric, present, "Dropping non-numeric column");
            prepared.dropped.push(name);
        }
    }

    Ok(prepared)
}

/// One pairwise correlation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationCell {
    pub r: f64,
    /// Rows where both columns have a value.
    pub n: usize,
    /// Two-sided p-value; `None` on the diagonal or below 3 observations.
    pub p_value: Option<f64>,
}

/// Symmetric Pearson correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<CorrelationCell>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<&CorrelationCell> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.cells[i][j].as_ref()
    }
}

/// Pairwise-complete Pearson matrix; `None` with fewer than 2 columns.
pub fn pearson_matrix(prepared: &PreparedTable) -> Option<CorrelationMatrix> {
    let size = prepared.columns.len();
    if size < 2 {
        return None;
    }

    let mut cells = vec![vec![None; size]; size];
    for i in 0..size {
        let values = &prepared.columns[i].values;
        cells[i][i] = Some(CorrelationCell {
            r: 1.0,
            n: values.iter().filter(|v| v.is_some()).count(),
            p_value: None,
        });

        for j in (i + 1)..size {
            let (x, y): (Vec<f64>, Vec<f64>) = values
                .iter()
                .zip(&prepared.columns[j].values)
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .unzip();

            let cell = pearson(&x, &y);
            cells[i][j] = cell;
            cells[j][i] = cell;
        }
    }

    Some(CorrelationMatrix {
        columns: prepared.columns.iter().map(|c| c.name.clone()).collect(),
        cells,
    })
}

fn pearson(x: &[f64], y: &[f64]) -> Option<CorrelationCell> {
    let n = x.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    Some(CorrelationCell {
        r,
        n,
        p_value: p_value(r, n),
    })
}

/// Two-sided t-test of `r = 0` with n - 2 degrees of freedom.
fn p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }
    let df = (n - 2) as f64;
    if (1.0 - r * r) <= f64::EPSILON {
        return Some(0.0);
    }
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}
