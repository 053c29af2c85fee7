//! Logical column names to spreadsheet column letters

use std::collections::HashMap;
use tabula_common::{generate_column_name, Result, TabulaError};

/// Maximum number of physical columns a store may span.
///
/// Row-wide ranges end at column `Z`, so anything past the 26th column would
/// be left behind by deletes.
pub const MAX_COLUMNS: usize = 26;

/// One configured column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Name used by callers in statements and records
    pub logical_name: String,
    /// Spreadsheet column letter(s)
    pub physical_name: String,
    /// 0-based position
    pub ordinal: usize,
}

/// Ordered, immutable column layout of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    specs: Vec<ColumnSpec>,
    by_name: HashMap<String, usize>,
}

impl ColumnMapping {
    /// Build a mapping from an ordered list of logical names.
    ///
    /// # Errors
    ///
    /// Returns `TabulaError::Config` when the list is empty, longer than
    /// [`MAX_COLUMNS`], or contains a name twice.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut specs = Vec::new();
        let mut by_name = HashMap::new();

        for (ordinal, name) in columns.into_iter().enumerate() {
            let logical_name = name.into();
            if by_name.insert(logical_name.clone(), ordinal).is_some() {
                return Err(TabulaError::Config(format!(
                    "duplicate column name: {}",
                    logical_name
                )));
            }
            specs.push(ColumnSpec {
                logical_name,
                physical_name: generate_column_name(ordinal),
                ordinal,
            });
        }

        if specs.is_empty() {
            return Err(TabulaError::Config(
                "columns must have at least one column".to_string(),
            ));
        }
        if specs.len() > MAX_COLUMNS {
            return Err(TabulaError::Config(format!(
                "you can only have up to {} columns",
                MAX_COLUMNS
            )));
        }

        Ok(Self { specs, by_name })
    }

    pub fn get(&self, logical_name: &str) -> Option<&ColumnSpec> {
        self.by_name.get(logical_name).map(|&idx| &self.specs[idx])
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.by_name.contains_key(logical_name)
    }

    /// Columns in ordinal order
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.specs
    }

    /// Logical names in ordinal order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.logical_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// `(logical, physical)` pairs, the seed for a column replacer
    pub fn name_pairs(&self) -> Vec<(String, String)> {
        self.specs
            .iter()
            .map(|spec| (spec.logical_name.clone(), spec.physical_name.clone()))
            .collect()
    }
}
