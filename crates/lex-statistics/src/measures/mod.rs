//! Summary statistics.
//!
//! - [`grouped`]: interpolated estimators from a binned frequency table
//! - [`raw`]: exact estimators from ungrouped numeric values
//! - [`qualitative`]: mode and entropy of categorical values

pub mod grouped;
pub mod qualitative;
pub mod raw;

pub use grouped::compute_grouped;
pub use qualitative::summarize_qualitative;
pub use raw::{interpret_kurtosis, interpret_skewness, summarize_raw};
