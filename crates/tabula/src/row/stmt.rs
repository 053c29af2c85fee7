//! Row store statements.
//!
//! Statements are plain descriptions; only `exec` talks to the backend.

use super::store::RowStore;
use crate::query::dialect::{row_range, ROW_FULL_TABLE_RANGE, ROW_ID_COLUMN, ROW_ID_FORMULA};
use crate::query::{ColumnOrderBy, QueryArg, QueryBuilder};
use crate::values::{check_safe_integer, escape_value, MAX_SAFE_INTEGER};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tabula_common::{AppendMode, BatchUpdateRowsRequest, Result, Rows, TabulaError};
use tracing::{debug, instrument};

/// `select` statement returning records of type `T`
pub struct SelectStmt<'a, T> {
    store: &'a RowStore,
    columns: Vec<String>,
    builder: QueryBuilder,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> SelectStmt<'a, T> {
    pub(super) fn new(store: &'a RowStore, columns: Vec<String>) -> Self {
        Self {
            builder: store.query_builder(columns.iter().cloned()),
            store,
            columns,
            _marker: PhantomData,
        }
    }

    pub fn where_clause(mut self, condition: impl Into<String>, args: Vec<QueryArg>) -> Self {
        self.builder = self.builder.where_clause(condition, args);
        self
    }

    pub fn order_by(mut self, ordering: Vec<ColumnOrderBy>) -> Self {
        self.builder = self.builder.order_by(ordering);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.builder = self.builder.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.builder = self.builder.offset(offset);
        self
    }

    #[instrument(skip(self), fields(sheet = %self.store.sheet_name))]
    pub async fn exec(self) -> Result<Vec<T>> {
        let query = self.builder.build()?;
        debug!(query = %query, "select");

        let result = self
            .store
            .ops
            .query_rows(&self.store.spreadsheet_id, &self.store.sheet_name, &query, true)
            .await?;

        result
            .rows
            .into_iter()
            .map(|row| decode_record(&self.columns, row))
            .collect()
    }
}

fn decode_record<T: DeserializeOwned>(columns: &[String], row: Vec<Value>) -> Result<T> {
    let mut record = Map::with_capacity(columns.len());
    for (column, value) in columns.iter().zip(row) {
        if value.is_null() {
            continue;
        }
        record.insert(column.clone(), normalize_number(value));
    }

    serde_json::from_value(Value::Object(record))
        .map_err(|e| TabulaError::Decode(format!("cannot map row into output record: {}", e)))
}

/// Query results carry every number as a double; whole values within the safe
/// range become integers so they decode into integer fields.
fn normalize_number(value: Value) -> Value {
    if let Value::Number(n) = &value {
        if let Some(f) = n.as_f64() {
            if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER as f64 {
                return Value::from(f as i64);
            }
        }
    }
    value
}

/// `insert` statement
pub struct InsertStmt<'a, R> {
    store: &'a RowStore,
    rows: &'a [R],
}

impl<'a, R: Serialize> InsertStmt<'a, R> {
    pub(super) fn new(store: &'a RowStore, rows: &'a [R]) -> Self {
        Self { store, rows }
    }

    /// Append every row in one call. Any invalid row fails the whole batch
    /// before anything is written.
    #[instrument(skip(self), fields(sheet = %self.store.sheet_name, rows = self.rows.len()))]
    pub async fn exec(self) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }

        let values = self
            .rows
            .iter()
            .map(|row| self.to_physical_row(row))
            .collect::<Result<Rows>>()?;

        self.store
            .ops
            .insert_rows(
                &self.store.spreadsheet_id,
                &self.store.range(ROW_FULL_TABLE_RANGE),
                values,
                AppendMode::Overwrite,
            )
            .await?;
        Ok(())
    }

    fn to_physical_row(&self, row: &R) -> Result<Vec<Value>> {
        let record = match serde_json::to_value(row)? {
            Value::Object(record) => record,
            Value::Null => {
                return Err(TabulaError::InvalidArgument(
                    "row must not be null".to_string(),
                ))
            }
            other => {
                return Err(TabulaError::InvalidArgument(format!(
                    "row must be a record, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mapping = &self.store.mapping;
        let mut physical = vec![Value::Null; mapping.len()];
        physical[0] = Value::from(ROW_ID_FORMULA);

        for (column, value) in record {
            if column == ROW_ID_COLUMN {
                continue;
            }
            if let Some(spec) = mapping.get(&column) {
                let escaped = escape_value(&column, value, &self.store.formula_columns)?;
                check_safe_integer(&escaped)?;
                physical[spec.ordinal] = escaped;
            }
        }

        Ok(physical)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a record",
    }
}

/// `update` statement
pub struct UpdateStmt<'a> {
    store: &'a RowStore,
    values: BTreeMap<String, Value>,
    builder: QueryBuilder,
}

impl<'a> UpdateStmt<'a> {
    pub(super) fn new(store: &'a RowStore, values: BTreeMap<String, Value>) -> Self {
        Self {
            store,
            values,
            builder: store.query_builder([ROW_ID_COLUMN]),
        }
    }

    /// Restrict the update; without it every materialized row is updated.
    pub fn where_clause(mut self, condition: impl Into<String>, args: Vec<QueryArg>) -> Self {
        self.builder = self.builder.where_clause(condition, args);
        self
    }

    /// Returns the number of rows updated.
    #[instrument(skip(self), fields(sheet = %self.store.sheet_name, columns = self.values.len()))]
    pub async fn exec(self) -> Result<usize> {
        if self.values.is_empty() {
            return Err(TabulaError::InvalidArgument(
                "empty update values, at least one column must be updated".to_string(),
            ));
        }

        let mut cells = Vec::with_capacity(self.values.len());
        for (column, value) in self.values {
            let spec = match self.store.mapping.get(&column) {
                Some(spec) if column != ROW_ID_COLUMN => spec,
                _ => return Err(TabulaError::UnknownColumn(column)),
            };
            let escaped = escape_value(&column, value, &self.store.formula_columns)?;
            check_safe_integer(&escaped)?;
            cells.push((spec.physical_name.clone(), escaped));
        }

        let rows = self.store.discover_rows(&self.builder).await?;
        if rows.is_empty() {
            debug!("no rows to update");
            return Ok(0);
        }

        let mut requests = Vec::with_capacity(cells.len() * rows.len());
        for (letter, value) in &cells {
            for row in &rows {
                requests.push(BatchUpdateRowsRequest {
                    range: self.store.range(&format!("{}{}", letter, row)),
                    values: vec![vec![value.clone()]],
                });
            }
        }

        self.store
            .ops
            .batch_update_rows(&self.store.spreadsheet_id, requests)
            .await?;
        Ok(rows.len())
    }
}

/// `delete` statement
pub struct DeleteStmt<'a> {
    store: &'a RowStore,
    builder: QueryBuilder,
}

impl<'a> DeleteStmt<'a> {
    pub(super) fn new(store: &'a RowStore) -> Self {
        Self {
            store,
            builder: store.query_builder([ROW_ID_COLUMN]),
        }
    }

    pub fn where_clause(mut self, condition: impl Into<String>, args: Vec<QueryArg>) -> Self {
        self.builder = self.builder.where_clause(condition, args);
        self
    }

    /// Clears each matching row across the full row width and returns the
    /// number of rows cleared.
    #[instrument(skip(self), fields(sheet = %self.store.sheet_name))]
    pub async fn exec(self) -> Result<usize> {
        let rows = self.store.discover_rows(&self.builder).await?;
        if rows.is_empty() {
            debug!("no rows to delete");
            return Ok(0);
        }

        let ranges: Vec<_> = rows
            .iter()
            .map(|&row| self.store.range(&row_range(row)))
            .collect();
        self.store
            .ops
            .clear(&self.store.spreadsheet_id, &ranges)
            .await?;
        Ok(rows.len())
    }
}

/// `count` statement
pub struct CountStmt<'a> {
    store: &'a RowStore,
    builder: QueryBuilder,
}

impl<'a> CountStmt<'a> {
    pub(super) fn new(store: &'a RowStore) -> Self {
        Self {
            store,
            builder: store.query_builder([format!("COUNT({})", ROW_ID_COLUMN)]),
        }
    }

    pub fn where_clause(mut self, condition: impl Into<String>, args: Vec<QueryArg>) -> Self {
        self.builder = self.builder.where_clause(condition, args);
        self
    }

    #[instrument(skip(self), fields(sheet = %self.store.sheet_name))]
    pub async fn exec(self) -> Result<u64> {
        let query = self.builder.build()?;
        let result = self
            .store
            .ops
            .query_rows(&self.store.spreadsheet_id, &self.store.sheet_name, &query, true)
            .await?;

        let cell = match result.rows.as_slice() {
            [row] if row.len() == 1 => &row[0],
            _ => {
                return Err(TabulaError::Retrieval(format!(
                    "unexpected count result shape: {:?}",
                    result.rows
                )))
            }
        };

        parse_count(cell)
    }
}

fn parse_count(cell: &Value) -> Result<u64> {
    let count = match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match count {
        Some(c) if c.is_finite() && c >= 0.0 && c.fract() == 0.0 => Ok(c as u64),
        _ => Err(TabulaError::Retrieval(format!(
            "count result is not a non-negative integer: {}",
            cell
        ))),
    }
}
