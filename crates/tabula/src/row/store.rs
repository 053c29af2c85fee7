//! RowStore struct and lifecycle.

use super::stmt::{CountStmt, DeleteStmt, InsertStmt, SelectStmt, UpdateStmt};
use super::RowStoreConfig;
use crate::columns::ColumnMapping;
use crate::query::dialect::{
    row_id_interceptor, scratchpad_sheet_name, ROW_HEADER_RANGE, ROW_ID_COLUMN,
};
use crate::query::{ColumnReplacer, QueryBuilder};
use crate::scratchpad::{ensure_sheets, RowIndexPlan, Scratchpad};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tabula_common::{CellRange, Result, SheetOperations, TabulaError};
use tracing::{debug, info, instrument};

/// Tabular store bound to one sheet.
///
/// Statements are built from the store and run with `exec()`:
///
/// ```ignore
/// let n = store.count().where_clause("age > ?", args![30]).exec().await?;
/// store.update([("age", json!(31))]).where_clause("name = ?", args!["bob"]).exec().await?;
/// ```
///
/// There is no locking: concurrent writers can interleave between row
/// discovery and the write that follows it.
pub struct RowStore {
    pub(super) ops: Arc<dyn SheetOperations>,
    pub(super) spreadsheet_id: String,
    pub(super) sheet_name: String,
    /// Physical layout, `_rid` first
    pub(super) mapping: ColumnMapping,
    pub(super) user_columns: Vec<String>,
    pub(super) formula_columns: HashSet<String>,
    pub(super) replacer: ColumnReplacer,
    scratchpad: Scratchpad,
}

impl RowStore {
    /// Open a row store on `sheet_name`.
    ///
    /// Creates the data sheet and its `<sheet>_scratch` companion if missing,
    /// rewrites the header row with the configured columns and books a
    /// scratchpad cell.
    ///
    /// # Errors
    ///
    /// `TabulaError::Config` for an invalid column layout; backend errors from
    /// the header write or scratchpad allocation.
    #[instrument(skip(ops, config), fields(columns = config.columns.len()))]
    pub async fn new(
        ops: Arc<dyn SheetOperations>,
        spreadsheet_id: &str,
        sheet_name: &str,
        config: RowStoreConfig,
    ) -> Result<Self> {
        if config.columns.is_empty() {
            return Err(TabulaError::Config(
                "columns must have at least one column".to_string(),
            ));
        }
        if config.columns.iter().any(|c| c == ROW_ID_COLUMN) {
            return Err(TabulaError::Config(format!(
                "column name {} is reserved",
                ROW_ID_COLUMN
            )));
        }
        let mapping = ColumnMapping::new(
            std::iter::once(ROW_ID_COLUMN.to_string()).chain(config.columns.iter().cloned()),
        )?;

        let formula_columns: HashSet<String> = config.formula_columns.iter().cloned().collect();
        if let Some(unknown) = formula_columns.iter().find(|c| !mapping.contains(c)) {
            return Err(TabulaError::Config(format!(
                "formula column {} is not a configured column",
                unknown
            )));
        }

        let scratch_sheet = scratchpad_sheet_name(sheet_name);
        ensure_sheets(ops.as_ref(), spreadsheet_id, &[sheet_name, scratch_sheet.as_str()]).await;
        write_header(ops.as_ref(), spreadsheet_id, sheet_name, &mapping).await?;
        let scratchpad = Scratchpad::allocate(ops.clone(), spreadsheet_id, &scratch_sheet).await?;

        info!(sheet = sheet_name, scratchpad = %scratchpad.location(), "row store ready");
        Ok(Self {
            ops,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            replacer: ColumnReplacer::from_mapping(&mapping),
            mapping,
            user_columns: config.columns,
            formula_columns,
            scratchpad,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Configured columns, without `_rid`
    pub fn columns(&self) -> &[String] {
        &self.user_columns
    }

    /// Full physical layout including `_rid`
    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn scratchpad(&self) -> &Scratchpad {
        &self.scratchpad
    }

    /// Select `columns` into records of type `T`; an empty slice selects every
    /// configured column.
    ///
    /// Result rows are matched to fields by column name. Unknown fields are
    /// ignored; fields without a value need `#[serde(default)]`.
    pub fn select<T: DeserializeOwned>(&self, columns: &[&str]) -> SelectStmt<'_, T> {
        let columns: Vec<String> = if columns.is_empty() {
            self.user_columns.clone()
        } else {
            columns.iter().map(|c| c.to_string()).collect()
        };
        SelectStmt::new(self, columns)
    }

    /// Insert records; each must serialize to a map keyed by column name.
    pub fn insert<'a, R: Serialize>(&'a self, rows: &'a [R]) -> InsertStmt<'a, R> {
        InsertStmt::new(self, rows)
    }

    /// Set columns to new values on every matching row.
    pub fn update<I, K, V>(&self, values: I) -> UpdateStmt<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        UpdateStmt::new(
            self,
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Clear every matching row.
    pub fn delete(&self) -> DeleteStmt<'_> {
        DeleteStmt::new(self)
    }

    /// Count matching rows.
    pub fn count(&self) -> CountStmt<'_> {
        CountStmt::new(self)
    }

    /// Release the scratchpad cell.
    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    pub async fn close(&self) -> Result<()> {
        self.scratchpad.release().await
    }

    /// Query builder with the `_rid is not null` guard installed
    pub(super) fn query_builder<I, S>(&self, columns: I) -> QueryBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryBuilder::new(self.replacer.clone(), columns).interceptor(row_id_interceptor)
    }

    /// Plan and discover the rows a builder (selecting `_rid`) matches
    pub(super) async fn discover_rows(&self, builder: &QueryBuilder) -> Result<Vec<u64>> {
        let plan = RowIndexPlan::new(&self.sheet_name, builder.build()?);
        debug!(query = %plan.query, "row index plan");
        self.scratchpad.discover(&plan).await
    }

    pub(super) fn range(&self, range: &str) -> CellRange {
        CellRange::new(&self.sheet_name, range)
    }
}

impl std::fmt::Debug for RowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStore")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("columns", &self.user_columns)
            .field("scratchpad", &self.scratchpad)
            .finish()
    }
}

async fn write_header(
    ops: &dyn SheetOperations,
    spreadsheet_id: &str,
    sheet_name: &str,
    mapping: &ColumnMapping,
) -> Result<()> {
    let header = CellRange::new(sheet_name, ROW_HEADER_RANGE);
    ops.clear(spreadsheet_id, std::slice::from_ref(&header)).await?;

    let names: Vec<Value> = mapping.names().map(Value::from).collect();
    ops.update_rows(spreadsheet_id, &header, vec![names]).await?;
    Ok(())
}
