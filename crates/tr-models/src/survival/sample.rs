//! Right-censored survival observations

use log::warn;
use serde::{Deserialize, Serialize};

use tr_core::data::{DataError, DataFrame};

use crate::base::{ModelError, Result};

/// Label given to every subject of an ungrouped sample
pub const ALL_SUBJECTS: &str = "all";

/// Ordered `(time, event, group)` triples
///
/// Times are finite and non-negative; `event == false` marks a censored
/// subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalSample {
    time: Vec<f64>,
    event: Vec<bool>,
    group: Vec<String>,
}

impl SurvivalSample {
    pub fn new<S: AsRef<str>>(time: &[f64], event: &[bool], group: &[S]) -> Result<Self> {
        if time.len() != event.len() || time.len() != group.len() {
            return Err(schema(format!(
                "survival columns differ in length: time {}, event {}, group {}",
                time.len(),
                event.len(),
                group.len()
            )));
        }
        if let Some(bad) = time.iter().find(|t| !(t.is_finite() && **t >= 0.0)) {
            return Err(schema(format!(
                "survival times must be finite and non-negative, found {}",
                bad
            )));
        }

        Ok(Self {
            time: time.to_vec(),
            event: event.to_vec(),
            group: group.iter().map(|g| g.as_ref().to_string()).collect(),
        })
    }

    /// A single-group sample
    pub fn ungrouped(time: &[f64], event: &[bool]) -> Result<Self> {
        Self::new(time, event, &vec![ALL_SUBJECTS; time.len()])
    }

    /// Read time, event and optional group columns from a frame
    ///
    /// Rows missing any of the named columns are dropped. Any non-zero
    /// event value counts as an event.
    pub fn from_frame(
        df: &DataFrame,
        time: &str,
        event: &str,
        group: Option<&str>,
    ) -> Result<Self> {
        let mut columns = vec![time, event];
        columns.extend(group);

        let rows = df.complete_rows(&columns)?;
        if rows.len() < df.nrows() {
            warn!(
                "survival sample: dropped {} of {} rows with missing values",
                df.nrows() - rows.len(),
                df.nrows()
            );
        }
        let df = df.take(&rows)?;

        let times = numeric(&df, time)?;
        let events: Vec<bool> = numeric(&df, event)?.into_iter().map(|e| e != 0.0).collect();
        let groups: Vec<String> = match group {
            Some(name) => {
                let series = df.column(name)?;
                (0..df.nrows())
                    .map(|i| series.get(i).map(|v| v.to_string()).unwrap_or_default())
                    .collect()
            }
            None => vec![ALL_SUBJECTS.to_string(); df.nrows()],
        };

        Self::new(&times, &events, &groups)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn event(&self) -> &[bool] {
        &self.event
    }

    pub fn group(&self) -> &[String] {
        &self.group
    }

    /// Distinct group labels in order of first appearance
    pub fn groups(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for g in &self.group {
            if !seen.contains(&g.as_str()) {
                seen.push(g.as_str());
            }
        }
        seen
    }

    /// Number of observed events
    pub fn n_events(&self) -> usize {
        self.event.iter().filter(|&&e| e).count()
    }

    /// Subsample of one group
    pub(crate) fn subset(&self, label: &str) -> (Vec<f64>, Vec<bool>) {
        self.time
            .iter()
            .zip(&self.event)
            .zip(&self.group)
            .filter(|(_, g)| g.as_str() == label)
            .map(|((&t, &e), _)| (t, e))
            .unzip()
    }
}

fn numeric(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df.column(name)?;
    series
        .to_f64()
        .map(|values| values.to_vec())
        .ok_or_else(|| {
            DataError::TypeMismatch {
                column: name.to_string(),
                expected: "numeric",
                actual: series.dtype(),
            }
            .into()
        })
}

fn schema(message: String) -> ModelError {
    DataError::Schema { message }.into()
}
