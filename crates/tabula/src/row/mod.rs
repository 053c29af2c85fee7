//! Row store: SQL-like statements over one sheet.
//!
//! Every configured schema gets a leading `_rid` column holding `=ROW()`.
//! Rows without it are unused capacity, which lets Update and Delete without
//! a WHERE clause touch only rows that were actually inserted.

mod stmt;
mod store;

pub use stmt::{CountStmt, DeleteStmt, InsertStmt, SelectStmt, UpdateStmt};
pub use store::RowStore;

/// Row store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStoreConfig {
    /// Ordered logical column names; the order fixes the column letters
    pub columns: Vec<String>,
    /// Columns whose values are written as formulas (strings only)
    pub formula_columns: Vec<String>,
}

impl RowStoreConfig {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            formula_columns: Vec::new(),
        }
    }

    pub fn with_formula_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formula_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}
