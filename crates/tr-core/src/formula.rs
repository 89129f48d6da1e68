//! R-style formula parsing and design matrix construction
//!
//! This module provides formula parsing similar to R's formula syntax,
//! used for specifying statistical models, and the builder that turns a
//! formula plus a [`DataFrame`](crate::data::DataFrame) into a numeric
//! [`DesignMatrix`].

pub use crate::formula::error::{FormulaError, FormulaResult};

use indexmap::IndexMap;
use std::str::FromStr;

mod design;
pub mod error;
mod parser;
mod term;


pub use design::DesignMatrix;
pub use parser::FormulaParser;
pub use term::{Interaction, Term, TermKind, TermType};

pub type Result<T> = std::result::Result<T, FormulaError>;

/// Left-hand side of a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// A single column: numeric, or categorical for multinomial/ordinal models
    Variable(String),
    /// `Surv(time, event)` for survival models
    Survival { time: String, event: String },
}

impl Response {
    /// Columns the response reads
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Response::Variable(name) => vec![name.as_str()],
            Response::Survival { time, event } => vec![time.as_str(), event.as_str()],
        }
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Variable(name) => write!(f, "{}", name),
            Response::Survival { time, event } => write!(f, "Surv({}, {})", time, event),
        }
    }
}

/// A parsed formula specifying a statistical model
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// Response (left-hand side)
    pub response: Option<Response>,

    /// Terms on the right-hand side
    pub terms: Vec<Term>,

    /// Whether to include an intercept
    pub has_intercept: bool,

    /// Reference level per categorical column; the first level otherwise
    pub baselines: IndexMap<String, String>,

    /// Original formula string
    pub original: String,
}

impl Formula {
    /// Parse a formula from a string
    pub fn parse(formula: &str) -> Result<Self> {
        FormulaParser::parse(formula)
    }

    /// Use `level` as the reference level of categorical column `column`
    pub fn with_baseline(mut self, column: &str, level: &str) -> Self {
        self.baselines.insert(column.to_string(), level.to_string());
        self
    }

    /// Remove the intercept from the formula
    pub fn without_intercept(mut self) -> Self {
        self.has_intercept = false;
        self
    }

    /// All columns the formula reads, response first, in order of appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut vars: Vec<&str> = Vec::new();

        if let Some(response) = &self.response {
            for name in response.variables() {
                if !vars.contains(&name) {
                    vars.push(name);
                }
            }
        }

        for term in &self.terms {
            term.collect_variable_names(&mut vars);
        }

        vars
    }

    /// Check if formula has a response variable
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    /// Check if the response is `Surv(time, event)`
    pub fn is_survival(&self) -> bool {
        matches!(self.response, Some(Response::Survival { .. }))
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self> {
        Formula::parse(s)
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(response) = &self.response {
            write!(f, "{} ~ ", response)?;
        } else {
            write!(f, "~ ")?;
        }

        if self.terms.is_empty() {
            if self.has_intercept {
                write!(f, "1")?;
            } else {
                write!(f, "0")?;
            }
        } else {
            let mut first = true;

            if !self.has_intercept {
                write!(f, "0")?;
                first = false;
            }

            for term in &self.terms {
                if !first {
                    write!(f, " + ")?;
                }
                write!(f, "{}", term)?;
                first = false;
            }
        }

        Ok(())
    }
}
