//! DataFrame implementation for tabular data
//!
//! A DataFrame is a 2-dimensional labeled data structure with columns of
//! potentially different types. Frames are never mutated in place: every
//! transformation returns a new frame, so a row position handed out by one
//! frame keeps its meaning for as long as that frame lives.

use super::*;

use indexmap::IndexMap;

/// Main DataFrame structure
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataFrame {
    pub(crate) columns: IndexMap<String, Series>,
    pub(crate) nrows: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create DataFrame from columns
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Series)>,
        S: Into<String>,
    {
        let mut builder = DataFrameBuilder::new();

        for (name, series) in columns.into_iter() {
            builder = builder.with_column(name, series)?;
        }

        builder.build()
    }

    /// Get the shape of the DataFrame (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.columns.len())
    }

    /// Get the number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Get the number of columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    /// Get a reference to a column
    pub fn get_column(&self, name: &str) -> Option<&Series> {
        self.columns.get(name)
    }

    /// Get a column or fail with `ColumnNotFound`
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Select specific columns
    pub fn select<I, S>(&self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DataFrameBuilder::new();

        for name in names.into_iter() {
            let name = name.as_ref();
            builder = builder.with_column(name, self.column(name)?.clone())?;
        }

        let mut selected = builder.build()?;
        // Keep the row count when zero columns are selected
        if selected.columns.is_empty() {
            selected.nrows = self.nrows;
        }
        Ok(selected)
    }

    /// Filter rows with a boolean mask
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.nrows {
            return Err(DataError::schema(format!(
                "mask length {} does not match {} rows",
                mask.len(),
                self.nrows
            )));
        }

        let mut columns = IndexMap::with_capacity(self.columns.len());
        for (name, series) in &self.columns {
            columns.insert(name.clone(), series.filter(mask)?);
        }

        Ok(Self {
            columns,
            nrows: mask.iter().filter(|&&keep| keep).count(),
        })
    }

    /// Filter rows with a predicate
    pub fn filter_with<F>(&self, predicate: F) -> Result<Self>
    where
        F: Fn(&Row) -> bool,
    {
        let mask: Vec<bool> = self.rows().map(|row| predicate(&row)).collect();
        self.filter(&mask)
    }

    /// Gather rows by position
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(self.columns.len());
        for (name, series) in &self.columns {
            columns.insert(name.clone(), series.take(indices)?);
        }

        Ok(Self {
            columns,
            nrows: indices.len(),
        })
    }

    /// Row-wise missing detection: `true` where any of `names` is missing
    pub fn missing_mask<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<bool>> {
        let series: Vec<&Series> = names
            .iter()
            .map(|n| self.column(n.as_ref()))
            .collect::<Result<_>>()?;

        Ok((0..self.nrows)
            .map(|i| series.iter().any(|s| s.is_missing(i)))
            .collect())
    }

    /// Positions of rows complete in every named column, in row order
    pub fn complete_rows<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        Ok(self
            .missing_mask(names)?
            .iter()
            .enumerate()
            .filter(|(_, missing)| !**missing)
            .map(|(i, _)| i)
            .collect())
    }

    /// New frame with only the rows complete in every named column
    pub fn drop_missing<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mask: Vec<bool> = self.missing_mask(names)?.iter().map(|m| !m).collect();
        self.filter(&mask)
    }

    /// Add a new column
    pub fn with_column<S: Into<String>>(&self, name: S, series: Series) -> Result<Self> {
        let name = name.into();

        if self.columns.contains_key(&name) {
            return Err(DataError::schema(format!("duplicate column name '{}'", name)));
        }

        if !self.columns.is_empty() && series.len() != self.nrows {
            return Err(DataError::schema(format!(
                "column '{}' has {} rows, expected {}",
                name,
                series.len(),
                self.nrows
            )));
        }

        let mut next = self.clone();
        if next.columns.is_empty() {
            next.nrows = series.len();
        }
        next.columns.insert(name, series);
        Ok(next)
    }

    /// Replace an existing column, keeping its position
    pub fn replace_column(&self, name: &str, series: Series) -> Result<Self> {
        self.column(name)?;
        if series.len() != self.nrows {
            return Err(DataError::schema(format!(
                "replacement for '{}' has {} rows, expected {}",
                name,
                series.len(),
                self.nrows
            )));
        }

        let mut next = self.clone();
        next.columns.insert(name.to_string(), series);
        Ok(next)
    }

    /// Retype a numeric code column into a categorical column
    ///
    /// `labels` maps each numeric code to a level label; the order of
    /// `labels` is the level order. Codes without a label are a schema
    /// error, missing values stay missing.
    pub fn to_categorical<L: AsRef<str>>(
        &self,
        name: &str,
        labels: &[(f64, L)],
        ordered: bool,
    ) -> Result<Self> {
        let values = self.column(name)?.to_f64().ok_or(DataError::TypeMismatch {
            column: name.to_string(),
            expected: "numeric",
            actual: "categorical",
        })?;

        let codes = values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    return Ok(None);
                }
                labels
                    .iter()
                    .position(|(code, _)| *code == v)
                    .map(|i| Some(i as u32))
                    .ok_or_else(|| {
                        DataError::schema(format!("value {} of '{}' has no label", v, name))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let levels = labels.iter().map(|(_, l)| l.as_ref().to_string()).collect();
        let mut factor = Factor::from_codes(codes, levels)?;
        if ordered {
            factor = factor.into_ordered();
        }

        self.replace_column(name, Series::Categorical(factor))
    }

    /// Make `level` the first (reference) level of a categorical column
    pub fn relevel(&self, name: &str, level: &str) -> Result<Self> {
        let factor = self.factor(name)?;
        let releveled = factor.relevel(level).ok_or_else(|| DataError::UnknownLevel {
            column: name.to_string(),
            level: level.to_string(),
        })?;
        self.replace_column(name, Series::Categorical(releveled))
    }

    /// Re-order the levels of a categorical column
    pub fn reorder_levels<L: AsRef<str>>(&self, name: &str, levels: &[L]) -> Result<Self> {
        let reordered = self.factor(name)?.reorder_levels(levels)?;
        self.replace_column(name, Series::Categorical(reordered))
    }

    /// Level counts of a categorical column, in level order
    pub fn value_counts(&self, name: &str) -> Result<Vec<(String, usize)>> {
        let factor = self.factor(name)?;
        Ok(factor
            .levels()
            .iter()
            .cloned()
            .zip(factor.counts())
            .collect())
    }

    fn factor(&self, name: &str) -> Result<&Factor> {
        let series = self.column(name)?;
        series.as_factor().ok_or(DataError::TypeMismatch {
            column: name.to_string(),
            expected: "categorical",
            actual: series.dtype(),
        })
    }

    /// Get a row as a Row view
    pub fn get_row(&self, idx: usize) -> Result<Row<'_>> {
        if idx >= self.nrows {
            return Err(DataError::IndexOutOfBounds {
                index: idx,
                len: self.nrows,
            });
        }

        Ok(Row {
            df: self,
            row_idx: idx,
        })
    }

    /// Iterate over rows
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.nrows).map(move |row_idx| Row { df: self, row_idx })
    }
}

/// Row view into a DataFrame
pub struct Row<'a> {
    df: &'a DataFrame,
    row_idx: usize,
}

impl<'a> Row<'a> {
    /// Position of this row in its frame
    pub fn index(&self) -> usize {
        self.row_idx
    }

    /// Get a value from the row; `Ok(None)` when missing
    pub fn get(&self, col: &str) -> Result<Option<SeriesValue>> {
        Ok(self.df.column(col)?.get(self.row_idx))
    }

    /// Get value as float
    pub fn get_float(&self, col: &str) -> Result<Option<f64>> {
        Ok(self.get(col)?.and_then(|v| v.as_f64()))
    }

    /// Get a categorical label
    pub fn get_label(&self, col: &str) -> Result<Option<String>> {
        match self.get(col)? {
            Some(SeriesValue::Label(v)) => Ok(Some(v)),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Display for DataFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataFrame({} rows × {} cols)", self.nrows, self.ncols())
    }
}
