//! Core data structures for TabReg
//!
//! `tr-core` holds the two lower layers of the toolkit: an immutable,
//! column-oriented [`DataFrame`](data::DataFrame) and the R-style
//! [`Formula`](formula::Formula) that turns a frame into a numeric
//! [`DesignMatrix`](formula::DesignMatrix).

pub mod data;
pub mod formula;

pub use data::{DataError, DataFrame, DataFrameBuilder, Factor, Series};
pub use formula::{DesignMatrix, Formula, FormulaError};
