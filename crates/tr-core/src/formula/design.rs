//! Design matrix construction
//!
//! [`DesignMatrix::build`] restricts a frame to the rows complete in every
//! formula column, then encodes each term into named numeric columns.

use crate::data::{BoolArray, DataError, DataFrame, FloatArray, Matrix, Series};
use crate::formula::error::{FormulaError, FormulaResult};
use crate::formula::term::Column;
use crate::formula::{Formula, Response};
use log::{debug, warn};
use ndarray::Array2;
use serde::Serialize;

const INTERCEPT: &str = "(Intercept)";

/// Numeric encoding of a formula over the complete rows of a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignMatrix {
    x: Matrix,
    response: FloatArray,
    event: Option<BoolArray>,
    response_levels: Option<Vec<String>>,
    response_ordered: bool,
    column_names: Vec<String>,
    has_intercept: bool,
    retained_rows: Vec<usize>,
    dropped_rows: usize,
    formula: String,
}

impl DesignMatrix {
    /// Build the design matrix and response for `formula` over `df`
    pub fn build(df: &DataFrame, formula: &Formula) -> FormulaResult<Self> {
        let response = formula.response.as_ref().ok_or(FormulaError::MissingResponse)?;

        let variables = formula.variables();
        for name in &variables {
            if !df.has_column(name) {
                return Err(FormulaError::variable_not_found(name, &df.column_names()));
            }
        }

        let retained_rows = df.complete_rows(&variables)?;
        let dropped_rows = df.nrows() - retained_rows.len();
        if dropped_rows > 0 {
            warn!(
                "{}: dropped {} of {} rows with missing values",
                formula,
                dropped_rows,
                df.nrows()
            );
        }
        let complete = df.take(&retained_rows)?;

        for column in formula.baselines.keys() {
            check_baseline_column(column, formula, &complete)?;
        }

        let mut columns: Vec<Column> = Vec::new();
        if formula.has_intercept {
            columns.push((INTERCEPT.to_string(), FloatArray::ones(complete.nrows())));
        }
        for term in &formula.terms {
            columns.extend(term.encode(&complete, &formula.baselines)?);
        }

        let rows = complete.nrows();
        if rows == 0 || rows < columns.len() {
            return Err(FormulaError::InsufficientRows {
                rows,
                columns: columns.len(),
            });
        }

        let mut x = Array2::zeros((rows, columns.len()));
        for (j, (_, values)) in columns.iter().enumerate() {
            x.column_mut(j).assign(values);
        }

        let mut design = Self {
            x,
            response: FloatArray::zeros(rows),
            event: None,
            response_levels: None,
            response_ordered: false,
            column_names: columns.into_iter().map(|(name, _)| name).collect(),
            has_intercept: formula.has_intercept,
            retained_rows,
            dropped_rows,
            formula: formula.to_string(),
        };

        match response {
            Response::Variable(name) => {
                let series = complete.column(name)?;
                match series {
                    Series::Categorical(factor) => {
                        design.response = factor
                            .codes()
                            .iter()
                            .map(|c| c.map_or(f64::NAN, |c| c as f64))
                            .collect();
                        design.response_levels = Some(factor.levels().to_vec());
                        design.response_ordered = factor.is_ordered();
                    }
                    _ => design.response = numeric(name, series)?,
                }
            }
            Response::Survival { time, event } => {
                let times = numeric(time, complete.column(time)?)?;
                if let Some(bad) = times.iter().find(|&&t| t < 0.0) {
                    return Err(DataError::Schema {
                        message: format!("negative survival time {} in '{}'", bad, time),
                    }
                    .into());
                }
                let status = numeric(event, complete.column(event)?)?;
                design.response = times;
                design.event = Some(status.mapv(|s| s != 0.0));
            }
        }

        debug!(
            "built {} x {} design for {}",
            design.nrows(),
            design.ncols(),
            design.formula
        );
        Ok(design)
    }

    /// Wrap raw arrays; a leading `(Intercept)` name marks the intercept column
    pub fn from_arrays(
        x: Matrix,
        response: FloatArray,
        column_names: Vec<String>,
    ) -> FormulaResult<Self> {
        if x.nrows() != response.len() {
            return Err(FormulaError::dimension(
                "response length must equal the number of rows",
                x.nrows(),
                response.len(),
            ));
        }
        if x.ncols() != column_names.len() {
            return Err(FormulaError::dimension(
                "one name per design column",
                x.ncols(),
                column_names.len(),
            ));
        }

        let rows = x.nrows();
        Ok(Self {
            has_intercept: column_names.first().is_some_and(|n| n == INTERCEPT),
            formula: format!("y ~ {}", column_names.join(" + ")),
            x,
            response,
            event: None,
            response_levels: None,
            response_ordered: false,
            column_names,
            retained_rows: (0..rows).collect(),
            dropped_rows: 0,
        })
    }

    /// Attach an event indicator, turning the response into survival times
    pub fn with_event(mut self, event: BoolArray) -> FormulaResult<Self> {
        if event.len() != self.response.len() {
            return Err(FormulaError::dimension(
                "event indicator length must equal the number of rows",
                self.response.len(),
                event.len(),
            ));
        }
        self.event = Some(event);
        Ok(self)
    }

    /// Copy of this design with the intercept column removed
    pub fn without_intercept(&self) -> Self {
        if !self.has_intercept {
            return self.clone();
        }

        let mut design = self.clone();
        design.x = self.x.slice(ndarray::s![.., 1..]).to_owned();
        design.column_names.remove(0);
        design.has_intercept = false;
        design
    }

    pub fn x(&self) -> &Matrix {
        &self.x
    }

    pub fn response(&self) -> &FloatArray {
        &self.response
    }

    /// Event indicator of a `Surv(time, event)` response
    pub fn event(&self) -> Option<&BoolArray> {
        self.event.as_ref()
    }

    /// Levels of a categorical response; the response holds their codes
    pub fn response_levels(&self) -> Option<&[String]> {
        self.response_levels.as_deref()
    }

    pub fn is_ordered_response(&self) -> bool {
        self.response_ordered
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn has_intercept(&self) -> bool {
        self.has_intercept
    }

    /// Positions in the source frame of the rows kept, in order
    pub fn retained_rows(&self) -> &[usize] {
        &self.retained_rows
    }

    /// Rows removed for missing values
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }
}

fn numeric(name: &str, series: &Series) -> FormulaResult<FloatArray> {
    series.to_f64().ok_or_else(|| FormulaError::TypeMismatch {
        variable: name.to_string(),
        expected_type: "numeric",
        actual_type: series.dtype().to_string(),
    })
}

/// A baseline must name a column that some term codes categorically
fn check_baseline_column(column: &str, formula: &Formula, df: &DataFrame) -> FormulaResult<()> {
    let series = df
        .get_column(column)
        .ok_or_else(|| FormulaError::variable_not_found(column, &df.column_names()))?;

    if formula.terms.iter().any(|t| t.codes_column(column, df)) {
        return Ok(());
    }

    Err(FormulaError::TypeMismatch {
        variable: column.to_string(),
        expected_type: "categorical",
        actual_type: series.dtype().to_string(),
    })
}
