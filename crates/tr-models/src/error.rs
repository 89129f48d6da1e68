//! Model-related error types

use thiserror::Error;

use tr_core::data::DataError;
use tr_core::formula::error::FormulaError;

/// Model-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Formula parsing or evaluation error
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Data-related error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Design matrix is not of full column rank
    #[error("Singular design matrix: rank {rank} < {columns} columns")]
    SingularMatrix {
        /// Numerical rank of the design
        rank: usize,
        /// Number of design columns
        columns: usize,
    },

    /// Model fitting failed to converge
    #[error("Failed to converge after {max_iter} iterations (last step norm {delta:.3e})")]
    NotConverged {
        /// Maximum number of iterations attempted
        max_iter: usize,
        /// Norm of the final coefficient update
        delta: f64,
    },

    /// Ordinal outcome with too few levels
    #[error("Ordinal model needs at least 3 ordered outcome levels, found {levels}")]
    Ordering { levels: usize },

    /// Invalid model configuration
    #[error("Invalid model configuration: {message}")]
    InvalidConfig {
        /// Configuration error message
        message: String,
    },

    /// Numerical computation error
    #[error("Numerical error: {message} (operation: {operation})")]
    NumericalError {
        /// Error message
        message: String,
        /// Operation that failed
        operation: String,
    },
}

impl ModelError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ModelError::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn numerical(message: impl Into<String>, operation: &str) -> Self {
        ModelError::NumericalError {
            message: message.into(),
            operation: operation.to_string(),
        }
    }
}
