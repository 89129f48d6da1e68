//! Core data structures for TabReg
//!
//! This module provides the tabular data layer: typed columns, the data
//! frame that owns them and a builder that enforces equal column lengths.
//! Frames are values: every transformation returns a new frame.

mod builder;
mod dataframe;
mod factor;
mod series;


// Re-exports
pub use builder::DataFrameBuilder;
pub use dataframe::{DataFrame, Row};
pub use factor::Factor;
pub use series::{Series, SeriesStats, SeriesValue};

// Type aliases for common use cases
pub type FloatArray = ndarray::Array1<f64>;
pub type IntArray = ndarray::Array1<i64>;
pub type BoolArray = ndarray::Array1<bool>;
pub type Matrix = ndarray::Array2<f64>;

/// Error types specific to data operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Malformed or mismatched input columns
    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Index out of bounds: index {index}, length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Invalid column type for '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Level '{level}' is not a level of column '{column}'")]
    UnknownLevel { column: String, level: String },
}

impl DataError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        DataError::Schema {
            message: message.into(),
        }
    }
}

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;
