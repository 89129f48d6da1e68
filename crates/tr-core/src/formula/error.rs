//! Formula-specific error types
//!
//! This module provides detailed error types for formula parsing and
//! design matrix construction.

use crate::data::DataError;
use thiserror::Error;

/// Errors that can occur during formula parsing and evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Syntax errors in the formula string
    #[error("Syntax error at position {position}: {message}")]
    Syntax {
        position: usize,
        message: String,
        context: Option<String>,
    },

    /// Variable not found in the DataFrame
    #[error(
        "Variable '{variable}' not found in DataFrame. Available variables: {available_vars:?}"
    )]
    VariableNotFound {
        variable: String,
        available_vars: Vec<String>,
    },

    /// Variable type mismatch
    #[error("Variable '{variable}' has type {actual_type}, but {expected_type} was expected")]
    TypeMismatch {
        variable: String,
        expected_type: &'static str,
        actual_type: String,
    },

    /// Baseline level that is not a level of its column
    #[error("Baseline '{level}' is not a level of '{variable}' (levels: {levels:?})")]
    UnknownBaseline {
        variable: String,
        level: String,
        levels: Vec<String>,
    },

    /// Fewer retained observations than design columns
    #[error("Design has {rows} complete rows but {columns} columns")]
    InsufficientRows { rows: usize, columns: usize },

    /// Missing response variable
    #[error("Response variable is required but not provided")]
    MissingResponse,

    /// Dimension mismatch between supplied arrays
    #[error("Dimension mismatch: {message}. Expected {expected}, got {actual}")]
    DimensionMismatch {
        message: String,
        expected: String,
        actual: String,
    },

    /// Data-related errors that bubble up from the data layer
    #[error("Data error in formula evaluation: {0}")]
    Data(#[from] DataError),
}

/// Result type alias for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

impl FormulaError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Syntax {
            position,
            message: message.into(),
            context: None,
        }
    }

    /// Create a syntax error with context
    pub fn syntax_with_context(
        position: usize,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        FormulaError::Syntax {
            position,
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a variable not found error
    pub fn variable_not_found(variable: &str, available_vars: &[&str]) -> Self {
        FormulaError::VariableNotFound {
            variable: variable.to_string(),
            available_vars: available_vars.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub(crate) fn dimension(
        message: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        FormulaError::DimensionMismatch {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
