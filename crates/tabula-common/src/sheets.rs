//! Sheet operations capability.
//!
//! The stores never talk HTTP themselves; they are written against
//! [`SheetOperations`], which a transport crate implements for a concrete
//! spreadsheet backend.

use crate::error::Result;
use crate::range::CellRange;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Row-major cell values, as sent to and echoed by the backend
pub type Rows = Vec<Vec<Value>>;

/// How appended rows are placed relative to the detected table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppendMode {
    /// Insert new rows, shifting existing data down
    Insert,
    /// Write into the empty rows after the table
    Overwrite,
}

impl AppendMode {
    /// Returns the backend's name for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppendMode::Insert => "INSERT_ROWS",
            AppendMode::Overwrite => "OVERWRITE",
        }
    }
}

/// Result of an append call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertRowsResult {
    pub updated_range: CellRange,
    pub updated_rows: i64,
    pub updated_columns: i64,
    pub updated_cells: i64,
    pub inserted_values: Rows,
}

/// Result of an update call; `updated_values` holds the values as rendered by
/// the backend after formulas were evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRowsResult {
    pub updated_range: CellRange,
    pub updated_rows: i64,
    pub updated_columns: i64,
    pub updated_cells: i64,
    pub updated_values: Rows,
}

/// One range write inside a batch update
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpdateRowsRequest {
    pub range: CellRange,
    pub values: Rows,
}

/// Rows returned by a query. Numbers are `f64`, date-like columns come back as
/// their formatted string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRowsResult {
    pub rows: Rows,
}

/// Cell-range level operations offered by a spreadsheet backend
#[async_trait]
pub trait SheetOperations: Send + Sync {
    /// Create a sheet (tab) named `sheet_name`
    async fn create_sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<()>;

    /// Delete sheets by their numeric ids
    async fn delete_sheets(&self, spreadsheet_id: &str, sheet_ids: &[i64]) -> Result<()>;

    /// Map of sheet title to sheet id
    async fn sheet_name_to_id(&self, spreadsheet_id: &str) -> Result<HashMap<String, i64>>;

    /// Append `values` after the table found in `range`
    async fn insert_rows(
        &self,
        spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
        mode: AppendMode,
    ) -> Result<InsertRowsResult>;

    /// Write `values` into exactly `range`
    async fn update_rows(
        &self,
        spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
    ) -> Result<UpdateRowsResult>;

    /// Write several ranges in one call
    async fn batch_update_rows(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchUpdateRowsRequest>,
    ) -> Result<Vec<UpdateRowsResult>>;

    /// Evaluate a query-language string against `sheet_name`
    async fn query_rows(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        query: &str,
        skip_header: bool,
    ) -> Result<QueryRowsResult>;

    /// Clear the given ranges, returning the ranges the backend reports as cleared
    async fn clear(&self, spreadsheet_id: &str, ranges: &[CellRange]) -> Result<Vec<String>>;
}

#[async_trait]
impl<T: SheetOperations + ?Sized> SheetOperations for Arc<T> {
    async fn create_sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<()> {
        (**self).create_sheet(spreadsheet_id, sheet_name).await
    }

    async fn delete_sheets(&self, spreadsheet_id: &str, sheet_ids: &[i64]) -> Result<()> {
        (**self).delete_sheets(spreadsheet_id, sheet_ids).await
    }

    async fn sheet_name_to_id(&self, spreadsheet_id: &str) -> Result<HashMap<String, i64>> {
        (**self).sheet_name_to_id(spreadsheet_id).await
    }

    async fn insert_rows(
        &self,
        spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
        mode: AppendMode,
    ) -> Result<InsertRowsResult> {
        (**self).insert_rows(spreadsheet_id, range, values, mode).await
    }

    async fn update_rows(
        &self,
        spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
    ) -> Result<UpdateRowsResult> {
        (**self).update_rows(spreadsheet_id, range, values).await
    }

    async fn batch_update_rows(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchUpdateRowsRequest>,
    ) -> Result<Vec<UpdateRowsResult>> {
        (**self).batch_update_rows(spreadsheet_id, requests).await
    }

    async fn query_rows(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        query: &str,
        skip_header: bool,
    ) -> Result<QueryRowsResult> {
        (**self)
            .query_rows(spreadsheet_id, sheet_name, query, skip_header)
            .await
    }

    async fn clear(&self, spreadsheet_id: &str, ranges: &[CellRange]) -> Result<Vec<String>> {
        (**self).clear(spreadsheet_id, ranges).await
    }
}

/// Render a cell value the way a formatted backend read would show it.
///
/// Null becomes the empty string; numbers and booleans use their JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
