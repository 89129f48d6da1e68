//! Categorical column storage
//!
//! A `Factor` stores one level code per row plus the ordered set of level
//! labels the codes refer to. `None` marks a missing value.

use super::*;

/// Level-coded categorical data
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    codes: Vec<Option<u32>>,
    levels: Vec<String>,
    ordered: bool,
}

impl Factor {
    /// Encode labels with levels sorted lexically
    pub fn from_labels<T: AsRef<str>>(data: &[T]) -> Self {
        let mut levels: Vec<String> = data.iter().map(|s| s.as_ref().to_string()).collect();
        levels.sort();
        levels.dedup();

        let codes = data
            .iter()
            .map(|s| {
                levels
                    .binary_search_by(|l| l.as_str().cmp(s.as_ref()))
                    .ok()
                    .map(|i| i as u32)
            })
            .collect();

        Self {
            codes,
            levels,
            ordered: false,
        }
    }

    /// Encode optional labels against an explicit level order
    ///
    /// A label outside `levels` is a schema error.
    pub fn with_levels<T, L>(data: &[Option<T>], levels: &[L]) -> Result<Self>
    where
        T: AsRef<str>,
        L: AsRef<str>,
    {
        let levels: Vec<String> = levels.iter().map(|l| l.as_ref().to_string()).collect();
        for (i, level) in levels.iter().enumerate() {
            if levels[..i].contains(level) {
                return Err(DataError::schema(format!("duplicate level '{}'", level)));
            }
        }

        let codes = data
            .iter()
            .map(|value| match value {
                None => Ok(None),
                Some(label) => levels
                    .iter()
                    .position(|l| l == label.as_ref())
                    .map(|i| Some(i as u32))
                    .ok_or_else(|| {
                        DataError::schema(format!(
                            "label '{}' is not in the level set {:?}",
                            label.as_ref(),
                            levels
                        ))
                    }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            codes,
            levels,
            ordered: false,
        })
    }

    /// Build directly from codes; every code must index into `levels`
    pub fn from_codes(codes: Vec<Option<u32>>, levels: Vec<String>) -> Result<Self> {
        if let Some(bad) = codes.iter().flatten().find(|&&c| c as usize >= levels.len()) {
            return Err(DataError::schema(format!(
                "code {} out of range for {} levels",
                bad,
                levels.len()
            )));
        }
        Ok(Self {
            codes,
            levels,
            ordered: false,
        })
    }

    /// Mark the level order as meaningful
    pub fn into_ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[Option<u32>] {
        &self.codes
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Label at row `idx`, `None` when missing or out of range
    pub fn label(&self, idx: usize) -> Option<&str> {
        self.codes
            .get(idx)
            .copied()
            .flatten()
            .map(|c| self.levels[c as usize].as_str())
    }

    /// Position of a level label
    pub fn level_index(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }

    /// Number of rows per level, in level order
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.levels.len()];
        for code in self.codes.iter().flatten() {
            counts[*code as usize] += 1;
        }
        counts
    }

    /// Re-code against a permutation of the same level set
    pub fn reorder_levels<L: AsRef<str>>(&self, levels: &[L]) -> Result<Self> {
        if levels.len() != self.levels.len() {
            return Err(DataError::schema(format!(
                "expected {} levels, got {}",
                self.levels.len(),
                levels.len()
            )));
        }

        // old code -> new code
        let mut remap = vec![0u32; self.levels.len()];
        let mut seen = vec![false; self.levels.len()];
        for (new_code, level) in levels.iter().enumerate() {
            let old = self.level_index(level.as_ref()).ok_or_else(|| {
                DataError::schema(format!("'{}' is not an existing level", level.as_ref()))
            })?;
            if seen[old] {
                return Err(DataError::schema(format!(
                    "duplicate level '{}'",
                    level.as_ref()
                )));
            }
            seen[old] = true;
            remap[old] = new_code as u32;
        }

        Ok(Self {
            codes: self
                .codes
                .iter()
                .map(|c| c.map(|c| remap[c as usize]))
                .collect(),
            levels: levels.iter().map(|l| l.as_ref().to_string()).collect(),
            ordered: self.ordered,
        })
    }

    /// Move `level` to the front so it becomes the reference level
    pub fn relevel(&self, level: &str) -> Option<Self> {
        let idx = self.level_index(level)?;
        let mut order: Vec<&str> = Vec::with_capacity(self.levels.len());
        order.push(&self.levels[idx]);
        order.extend(
            self.levels
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != idx)
                .map(|(_, l)| l.as_str()),
        );
        self.reorder_levels(&order).ok()
    }

    pub(crate) fn filter(&self, mask: &[bool]) -> Self {
        Self {
            codes: self
                .codes
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(c, _)| *c)
                .collect(),
            levels: self.levels.clone(),
            ordered: self.ordered,
        }
    }

    pub(crate) fn take(&self, indices: &[usize]) -> Self {
        Self {
            codes: indices.iter().map(|&i| self.codes[i]).collect(),
            levels: self.levels.clone(),
            ordered: self.ordered,
        }
    }
}
