//! Core types for statistical models
//!
//! This module defines the fitted model value, the family and iteration
//! options a fit is requested with, and the coefficient / statistics /
//! summary structures the reporting layer fills in.

pub use coefficient::Coefficient;
pub use model::{Family, FitOptions, FittedModel, Ties};
pub use statistics::{GoodnessOfFit, ResidualStatistics};
pub use summary::{ModelSummary, ModelType};

pub use crate::error::ModelError;

pub mod coefficient;
pub mod model;
pub mod statistics;
pub mod summary;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
