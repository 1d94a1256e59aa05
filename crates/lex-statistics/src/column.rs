//! Cleaned column values.
//!
//! A [`Column`] is the missing-value-free copy of a source `Series` that the
//! analysis components consume. Cells keep their original kind (number or
//! text) so that numeric coercion and string grouping can both be applied
//! downstream.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MissingValuePolicy;
use crate::error::Result;
use crate::utils::{is_missing_text, is_numeric_dtype, median, parse_number};

/// A non-missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric value of the cell, parsing text strictly.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => parse_number(s),
        }
    }

    /// Textual value of the cell; numbers use their shortest display form.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }
}

/// A named, cleaned sequence of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
    missing: usize,
    notes: Vec<String>,
}

impl Column {
    /// Column of numbers. Non-finite values count as missing.
    pub fn from_numbers(name: impl Into<String>, values: &[f64]) -> Self {
        let cells: Vec<Cell> = values
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| Cell::Number(*v))
            .collect();
        Self {
            name: name.into(),
            missing: values.len() - cells.len(),
            cells,
            notes: Vec::new(),
        }
    }

    /// Column of text values. Blank cells and missing markers count as missing.
    pub fn from_texts<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        let cells: Vec<Cell> = values
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| !is_missing_text(s))
            .map(|s| Cell::Text(s.trim().to_string()))
            .collect();
        Self {
            name: name.into(),
            missing: values.len() - cells.len(),
            cells,
            notes: Vec::new(),
        }
    }

    /// Build a cleaned column from a polars `Series`, applying `policy` to
    /// missing entries.
    pub fn from_series(series: &Series, policy: MissingValuePolicy) -> Result<Self> {
        let name = series.name().to_string();
        let cells = series_cells(series)?;
        let missing = cells.iter().filter(|c| c.is_none()).count();

        let mut column = Self {
            name,
            cells: Vec::with_capacity(cells.len()),
            missing,
            notes: Vec::new(),
        };

        if missing == 0 {
            column.cells = cells.into_iter().flatten().collect();
            return Ok(column);
        }

        let fill = match policy {
            MissingValuePolicy::Drop => None,
            MissingValuePolicy::Zero => Some(0.0),
            MissingValuePolicy::Mean | MissingValuePolicy::Median => {
                let present: Vec<&Cell> = cells.iter().flatten().collect();
                let numbers: Vec<f64> = present.iter().filter_map(|c| c.as_number()).collect();

                if numbers.is_empty() || numbers.len() < present.len() {
                    let note = format!(
                        "{policy:?} imputation needs numeric data; dropped {missing} missing value(s) in '{}' instead",
                        column.name
                    );
                    warn!("{}", note);
                    column.notes.push(note);
                    None
                } else if policy == MissingValuePolicy::Mean {
                    crate::utils::mean(&numbers)
                } else {
                    median(&numbers)
                }
            }
        };

        column.cells = match fill {
            Some(value) => {
                debug!(column = %column.name, value, count = missing, "Filling missing values");
                cells
                    .into_iter()
                    .map(|c| c.unwrap_or(Cell::Number(value)))
                    .collect()
            }
            None => cells.into_iter().flatten().collect(),
        };

        Ok(column)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Missing entries in the source, before the policy was applied.
    pub fn missing(&self) -> usize {
        self.missing
    }

    /// Messages produced while cleaning, e.g. an imputation fallback.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Values that coerce to numbers, in column order.
    pub fn numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_number).collect()
    }

    /// Share of cells that coerce to numbers; 0 for an empty column.
    pub fn numeric_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().filter(|c| c.as_number().is_some()).count() as f64
            / self.cells.len() as f64
    }

    /// All cells as text.
    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(Cell::as_text).collect()
    }

    /// Occurrence count of every distinct text value, sorted by value.
    pub fn text_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for cell in &self.cells {
            *counts.entry(cell.as_text()).or_insert(0) += 1;
        }
        counts
    }
}

/// Convert a `Series` into cells, `None` marking missing entries.
pub(crate) fn series_cells(series: &Series) -> Result<Vec<Option<Cell>>> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) {
        let casted = series.cast(&DataType::Float64)?;
        return Ok(casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()).map(Cell::Number))
            .collect());
    }

    if matches!(dtype, DataType::Boolean) {
        return Ok(series
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| Cell::Text(b.to_string())))
            .collect());
    }

    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| {
            v.filter(|s| !is_missing_text(s))
                .map(|s| Cell::Text(s.trim().to_string()))
        })
        .collect())
}
