//! Term types for formula specification
//!
//! This module defines the types representing terms in a formula (numeric
//! main effects, categorical main effects and interactions) and how each
//! term is encoded into named design columns.

use crate::data::*;
use crate::formula::error::{FormulaError, FormulaResult};
use indexmap::IndexMap;
use std::fmt;

/// Type of term in a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermType {
    /// Main effect
    Main,
    /// Interaction effect
    Interaction,
}

/// Kind of term
#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
    /// Column used as-is: numeric columns give one column, categorical
    /// columns are treatment coded
    Variable(String),
    /// `C(x)`: column forced to treatment coding even when numeric
    Categorical(String),
    /// Interaction between main effects
    Interaction(Box<Interaction>),
}

/// A term in a formula
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// The kind of term
    pub kind: TermKind,
    /// Type of term
    pub term_type: TermType,
}

/// One encoded design column
pub(crate) type Column = (String, FloatArray);

impl Term {
    /// Create a new variable term
    pub fn variable(name: &str) -> Self {
        Self {
            kind: TermKind::Variable(name.to_string()),
            term_type: TermType::Main,
        }
    }

    /// Create a forced-categorical term, `C(name)`
    pub fn categorical(name: &str) -> Self {
        Self {
            kind: TermKind::Categorical(name.to_string()),
            term_type: TermType::Main,
        }
    }

    /// Create a new interaction term from main effects
    pub fn interaction(terms: Vec<Term>) -> Self {
        Self {
            kind: TermKind::Interaction(Box::new(Interaction::new(terms))),
            term_type: TermType::Interaction,
        }
    }

    /// Check if the term is an interaction
    pub fn is_interaction(&self) -> bool {
        matches!(self.kind, TermKind::Interaction(_))
    }

    /// Column name of a main-effect term
    pub fn as_variable(&self) -> Option<&str> {
        match &self.kind {
            TermKind::Variable(name) | TermKind::Categorical(name) => Some(name),
            TermKind::Interaction(_) => None,
        }
    }

    /// Get interaction if this is an interaction term
    pub fn as_interaction(&self) -> Option<&Interaction> {
        if let TermKind::Interaction(interaction) = &self.kind {
            Some(interaction)
        } else {
            None
        }
    }

    /// Main effects making up this term, itself for a main effect
    pub fn factors(&self) -> Vec<&Term> {
        match &self.kind {
            TermKind::Interaction(interaction) => interaction.terms.iter().collect(),
            _ => vec![self],
        }
    }

    /// Collect all variable names referenced by this term
    pub fn collect_variable_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        for factor in self.factors() {
            if let Some(name) = factor.as_variable() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }

    /// Same term up to the order of its interaction factors
    pub(crate) fn same_as(&self, other: &Term) -> bool {
        let mine = self.factors();
        let theirs = other.factors();
        mine.len() == theirs.len() && mine.iter().all(|f| theirs.contains(f))
    }

    /// Encode the term into named columns over `df`
    ///
    /// `df` must already be restricted to complete rows.
    pub(crate) fn encode(
        &self,
        df: &DataFrame,
        baselines: &IndexMap<String, String>,
    ) -> FormulaResult<Vec<Column>> {
        match &self.kind {
            TermKind::Variable(name) => {
                let series = lookup(df, name)?;
                match series.to_f64() {
                    Some(values) => Ok(vec![(name.clone(), values)]),
                    None => encode_categorical(name, series, baselines),
                }
            }
            TermKind::Categorical(name) => encode_categorical(name, lookup(df, name)?, baselines),
            TermKind::Interaction(interaction) => interaction.encode(df, baselines),
        }
    }

    /// Whether this term treatment-codes `column` when evaluated on `df`
    pub(crate) fn codes_column(&self, column: &str, df: &DataFrame) -> bool {
        self.factors().iter().any(|factor| match &factor.kind {
            TermKind::Categorical(name) => name == column,
            TermKind::Variable(name) => {
                name == column && df.get_column(name).is_some_and(|s| !s.is_numeric())
            }
            TermKind::Interaction(_) => false,
        })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TermKind::Variable(name) => write!(f, "{}", name),
            TermKind::Categorical(name) => write!(f, "C({})", name),
            TermKind::Interaction(interaction) => write!(f, "{}", interaction),
        }
    }
}

/// Interaction between variables
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// Main effects involved in the interaction
    pub terms: Vec<Term>,
    /// Order of interaction (2-way, 3-way, etc.)
    pub order: usize,
}

impl Interaction {
    /// Create a new interaction
    pub fn new(terms: Vec<Term>) -> Self {
        let order = terms.len();
        Self { terms, order }
    }

    /// Names of the interacting columns
    pub fn variables(&self) -> Vec<&str> {
        self.terms.iter().filter_map(|t| t.as_variable()).collect()
    }

    /// Elementwise products of every combination of the factors' columns
    fn encode(
        &self,
        df: &DataFrame,
        baselines: &IndexMap<String, String>,
    ) -> FormulaResult<Vec<Column>> {
        let mut result: Vec<Column> = Vec::new();

        for (i, term) in self.terms.iter().enumerate() {
            let columns = term.encode(df, baselines)?;
            if i == 0 {
                result = columns;
                continue;
            }

            let mut combined = Vec::with_capacity(result.len() * columns.len());
            for (name_a, col_a) in &result {
                for (name_b, col_b) in &columns {
                    combined.push((format!("{}:{}", name_a, name_b), col_a * col_b));
                }
            }
            result = combined;
        }

        Ok(result)
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

fn lookup<'a>(df: &'a DataFrame, name: &str) -> FormulaResult<&'a Series> {
    df.get_column(name)
        .ok_or_else(|| FormulaError::variable_not_found(name, &df.column_names()))
}

/// Level codes and labels of a column treated as categorical
///
/// Numeric columns get one level per distinct value, in ascending order.
pub(crate) fn levels_of(series: &Series) -> (Vec<Option<u32>>, Vec<String>) {
    if let Some(factor) = series.as_factor() {
        return (factor.codes().to_vec(), factor.levels().to_vec());
    }

    let values = series.to_f64().unwrap_or_default();
    let mut distinct: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();

    let codes = values
        .iter()
        .map(|v| {
            distinct
                .binary_search_by(|d| d.total_cmp(v))
                .ok()
                .map(|i| i as u32)
        })
        .collect();
    let levels = distinct.iter().map(|v| v.to_string()).collect();
    (codes, levels)
}

/// Baseline position for `name`, the first level unless overridden
pub(crate) fn baseline_index(
    name: &str,
    levels: &[String],
    baselines: &IndexMap<String, String>,
) -> FormulaResult<usize> {
    match baselines.get(name) {
        None => Ok(0),
        Some(level) => levels
            .iter()
            .position(|l| l == level)
            .ok_or_else(|| FormulaError::UnknownBaseline {
                variable: name.to_string(),
                level: level.clone(),
                levels: levels.to_vec(),
            }),
    }
}

/// Treatment coding: one indicator per non-baseline level
fn encode_categorical(
    name: &str,
    series: &Series,
    baselines: &IndexMap<String, String>,
) -> FormulaResult<Vec<Column>> {
    let (codes, levels) = levels_of(series);
    let baseline = baseline_index(name, &levels, baselines)?;

    Ok(levels
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != baseline)
        .map(|(idx, level)| {
            let indicator = codes
                .iter()
                .map(|code| match code {
                    Some(c) if *c as usize == idx => 1.0,
                    Some(_) => 0.0,
                    None => f64::NAN,
                })
                .collect();
            (format!("{}[T.{}]", name, level), indicator)
        })
        .collect())
}
