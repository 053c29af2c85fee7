//! Key-value store on top of a two-column row store.

use super::{KvMode, KvStoreConfig};
use crate::args;
use crate::codec::Codec;
use crate::query::dialect::ROW_ID_COLUMN;
use crate::query::ColumnOrderBy;
use crate::row::{RowStore, RowStoreConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tabula_common::{Result, SheetOperations, TabulaError};
use tracing::{debug, instrument};

const KEY_COLUMN: &str = "key";
const VALUE_COLUMN: &str = "value";

#[derive(Debug, Serialize, Deserialize)]
struct KvRow {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

/// Key-value store whose sheet is a [`RowStore`] with `key` and `value`
/// columns.
///
/// Lookups are plain select statements, so no lookup formulas are written to
/// the scratchpad; row discovery for updates and deletes still uses it.
/// Keys are bound as byte arguments so they are always quoted, even when they
/// look like `date` or `timeofday` literals.
pub struct RowKvStore {
    store: RowStore,
    mode: KvMode,
    codec: Arc<dyn Codec>,
}

impl RowKvStore {
    /// Open a store on `sheet_name`, writing its `_rid, key, value` header.
    #[instrument(skip(ops, config), fields(mode = ?config.mode))]
    pub async fn new(
        ops: Arc<dyn SheetOperations>,
        spreadsheet_id: &str,
        sheet_name: &str,
        config: KvStoreConfig,
    ) -> Result<Self> {
        let store = RowStore::new(
            ops,
            spreadsheet_id,
            sheet_name,
            RowStoreConfig::new([KEY_COLUMN, VALUE_COLUMN]),
        )
        .await?;

        Ok(Self {
            store,
            mode: config.mode,
            codec: config.codec,
        })
    }

    pub fn mode(&self) -> KvMode {
        self.mode
    }

    /// Underlying row store
    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// `TabulaError::KeyNotFound` when no row exists or the newest row holds
    /// an empty value.
    #[instrument(skip(self), fields(sheet = %self.store.sheet_name()))]
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut stmt = self
            .store
            .select::<KvRow>(&[VALUE_COLUMN])
            .where_clause(format!("{} = ?", KEY_COLUMN), args![key.as_bytes()])
            .limit(1);
        if self.mode == KvMode::AppendOnly {
            stmt = stmt.order_by(vec![ColumnOrderBy::desc(ROW_ID_COLUMN)]);
        }

        let rows = stmt.exec().await?;
        match rows.into_iter().next() {
            Some(row) if !row.value.is_empty() => self.codec.decode(&row.value),
            _ => Err(TabulaError::KeyNotFound(key.to_string())),
        }
    }

    /// Store `value` under `key`.
    #[instrument(skip(self, value), fields(sheet = %self.store.sheet_name(), len = value.len()))]
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let encoded = self.codec.encode(value)?;
        if self.mode == KvMode::AppendOnly {
            return self.append(key, encoded).await;
        }

        let existing = self
            .store
            .count()
            .where_clause(format!("{} = ?", KEY_COLUMN), args![key.as_bytes()])
            .exec()
            .await?;
        if existing == 0 {
            return self.append(key, encoded).await;
        }

        let updated = self
            .store
            .update([(VALUE_COLUMN, encoded)])
            .where_clause(format!("{} = ?", KEY_COLUMN), args![key.as_bytes()])
            .exec()
            .await?;
        debug!(rows = updated, "value overwritten");
        Ok(())
    }

    /// Remove `key`; absent keys are not an error.
    #[instrument(skip(self), fields(sheet = %self.store.sheet_name()))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self.mode {
            KvMode::Default => {
                let deleted = self
                    .store
                    .delete()
                    .where_clause(format!("{} = ?", KEY_COLUMN), args![key.as_bytes()])
                    .exec()
                    .await?;
                debug!(rows = deleted, "key deleted");
                Ok(())
            }
            KvMode::AppendOnly => self.append(key, String::new()).await,
        }
    }

    /// Release the underlying store's scratchpad.
    pub async fn close(&self) -> Result<()> {
        self.store.close().await
    }

    async fn append(&self, key: &str, encoded: String) -> Result<()> {
        let row = KvRow {
            key: key.to_string(),
            value: encoded,
        };
        self.store.insert(std::slice::from_ref(&row)).exec().await
    }
}

impl std::fmt::Debug for RowKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowKvStore")
            .field("store", &self.store)
            .field("mode", &self.mode)
            .finish()
    }
}
