//! Series data structure for holding homogeneous data
//!
//! A Series is a one-dimensional typed column. Numeric columns use `NaN`
//! as their missing marker; categorical columns use a `None` code.

use super::*;

/// A Series is a typed, one-dimensional array of data
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// Floating point numbers (f64), `NaN` = missing
    Float(FloatArray),
    /// Integer numbers (i64)
    Int(IntArray),
    /// Boolean values, encoded as 0/1 when used numerically
    Bool(BoolArray),
    /// Level-coded categorical data
    Categorical(Factor),
}

impl Series {
    /// Create a new Float series
    pub fn float(data: impl Into<FloatArray>) -> Self {
        Series::Float(data.into())
    }

    /// Create a Float series where `None` marks a missing value
    pub fn float_with_missing(data: &[Option<f64>]) -> Self {
        Series::Float(data.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    /// Create a new Int series
    pub fn int(data: impl Into<IntArray>) -> Self {
        Series::Int(data.into())
    }

    /// Create a new Bool series
    pub fn bool(data: impl Into<BoolArray>) -> Self {
        Series::Bool(data.into())
    }

    /// Create a categorical series, levels sorted lexically
    pub fn categorical<T: AsRef<str>>(data: &[T]) -> Self {
        Series::Categorical(Factor::from_labels(data))
    }

    /// Create a categorical series with an explicit level order
    pub fn categorical_with_levels<T, L>(data: &[Option<T>], levels: &[L]) -> Result<Self>
    where
        T: AsRef<str>,
        L: AsRef<str>,
    {
        Factor::with_levels(data, levels).map(Series::Categorical)
    }

    /// Create an ordered categorical series (for ordinal outcomes)
    pub fn ordered<T, L>(data: &[Option<T>], levels: &[L]) -> Result<Self>
    where
        T: AsRef<str>,
        L: AsRef<str>,
    {
        Factor::with_levels(data, levels).map(|f| Series::Categorical(f.into_ordered()))
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        match self {
            Series::Float(arr) => arr.len(),
            Series::Int(arr) => arr.len(),
            Series::Bool(arr) => arr.len(),
            Series::Categorical(f) => f.len(),
        }
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the type name of the series
    pub fn dtype(&self) -> &'static str {
        match self {
            Series::Float(_) => "float64",
            Series::Int(_) => "int64",
            Series::Bool(_) => "bool",
            Series::Categorical(_) => "categorical",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Series::Categorical(_))
    }

    pub fn as_factor(&self) -> Option<&Factor> {
        match self {
            Series::Categorical(f) => Some(f),
            _ => None,
        }
    }

    /// Whether row `idx` holds the missing marker
    pub fn is_missing(&self, idx: usize) -> bool {
        match self {
            Series::Float(arr) => arr.get(idx).is_some_and(|v| v.is_nan()),
            Series::Categorical(f) => f.codes().get(idx).is_some_and(|c| c.is_none()),
            Series::Int(_) | Series::Bool(_) => false,
        }
    }

    /// Count of missing values
    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Get a value at index; `None` when out of range or missing
    pub fn get(&self, idx: usize) -> Option<SeriesValue> {
        if idx >= self.len() || self.is_missing(idx) {
            return None;
        }

        match self {
            Series::Float(arr) => Some(SeriesValue::Float(arr[idx])),
            Series::Int(arr) => Some(SeriesValue::Int(arr[idx])),
            Series::Bool(arr) => Some(SeriesValue::Bool(arr[idx])),
            Series::Categorical(f) => f.label(idx).map(|l| SeriesValue::Label(l.to_string())),
        }
    }

    /// Numeric view as f64 (`NaN` for missing); categorical columns are rejected
    pub fn to_f64(&self) -> Option<FloatArray> {
        match self {
            Series::Float(arr) => Some(arr.clone()),
            Series::Int(arr) => Some(arr.mapv(|v| v as f64)),
            Series::Bool(arr) => Some(arr.mapv(|v| if v { 1.0 } else { 0.0 })),
            Series::Categorical(_) => None,
        }
    }

    /// Filter the series with a boolean mask
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(DataError::schema(format!(
                "mask length {} does not match series length {}",
                mask.len(),
                self.len()
            )));
        }

        fn keep<T: Clone>(arr: &ndarray::Array1<T>, mask: &[bool]) -> ndarray::Array1<T> {
            arr.iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(v, _)| v.clone())
                .collect()
        }

        Ok(match self {
            Series::Float(arr) => Series::Float(keep(arr, mask)),
            Series::Int(arr) => Series::Int(keep(arr, mask)),
            Series::Bool(arr) => Series::Bool(keep(arr, mask)),
            Series::Categorical(f) => Series::Categorical(f.filter(mask)),
        })
    }

    /// Gather rows by position, in the given order
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(DataError::IndexOutOfBounds {
                index: bad,
                len: self.len(),
            });
        }

        Ok(match self {
            Series::Float(arr) => Series::Float(indices.iter().map(|&i| arr[i]).collect()),
            Series::Int(arr) => Series::Int(indices.iter().map(|&i| arr[i]).collect()),
            Series::Bool(arr) => Series::Bool(indices.iter().map(|&i| arr[i]).collect()),
            Series::Categorical(f) => Series::Categorical(f.take(indices)),
        })
    }

    /// Compute basic statistics over the non-missing values of a numeric series
    pub fn describe(&self) -> Result<SeriesStats> {
        let values = self.to_f64().ok_or(DataError::TypeMismatch {
            column: String::new(),
            expected: "numeric",
            actual: "categorical",
        })?;

        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            return Ok(SeriesStats::empty(values.len()));
        }
        present.sort_by(|a, b| a.total_cmp(b));

        let present = FloatArray::from(present);
        let n = present.len();
        Ok(SeriesStats {
            count: n,
            missing: values.len() - n,
            mean: present.mean().unwrap_or(f64::NAN),
            std: if n > 1 { present.std(1.0) } else { f64::NAN },
            min: present[0],
            q25: quantile(&present, 0.25),
            q50: quantile(&present, 0.5),
            q75: quantile(&present, 0.75),
            max: present[n - 1],
        })
    }
}

/// Linear-interpolated quantile of an already sorted array
fn quantile(sorted: &FloatArray, q: f64) -> f64 {
    let n = sorted.len();
    let index = (n as f64 - 1.0) * q;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Statistical summary of a series
#[derive(Debug, Clone, serde::Serialize)]
pub struct SeriesStats {
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl SeriesStats {
    fn empty(missing: usize) -> Self {
        Self {
            count: 0,
            missing,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Enum for type-safe value access
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Label(String),
}

impl SeriesValue {
    /// Numeric value, if this is not a label
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SeriesValue::Float(v) => Some(*v),
            SeriesValue::Int(v) => Some(*v as f64),
            SeriesValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            SeriesValue::Label(_) => None,
        }
    }
}

impl std::fmt::Display for SeriesValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesValue::Float(v) => write!(f, "{}", v),
            SeriesValue::Int(v) => write!(f, "{}", v),
            SeriesValue::Bool(v) => write!(f, "{}", v),
            SeriesValue::Label(v) => write!(f, "{}", v),
        }
    }
}
