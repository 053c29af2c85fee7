//! Key-value store over raw `A:C` ranges.

use super::{KvMode, KvStoreConfig};
use crate::codec::Codec;
use crate::query::dialect::{
    is_error_value, kv_find_key_formula, kv_get_append_only_formula, kv_get_default_formula,
    kv_row_range, scratchpad_sheet_name, KV_FIRST_ROW_RANGE, KV_TABLE_RANGE, NA_VALUE,
};
use crate::scratchpad::{ensure_sheets, Scratchpad};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tabula_common::{AppendMode, CellRange, Result, SheetOperations, TabulaError};
use tracing::{debug, info, instrument, warn};

/// Key-value store keeping `(key, encoded value, timestamp ms)` rows in
/// columns `A:C` of one sheet.
///
/// Default-mode `set` and `delete` look the key up and then write, in two
/// calls; concurrent writers to the same key can race.
pub struct KvStore {
    ops: Arc<dyn SheetOperations>,
    spreadsheet_id: String,
    sheet_name: String,
    scratchpad: Scratchpad,
    mode: KvMode,
    codec: Arc<dyn Codec>,
}

impl KvStore {
    /// Open a store on `sheet_name`, creating it and `<sheet>_scratch` when
    /// missing and booking a scratchpad cell.
    #[instrument(skip(ops, config), fields(mode = ?config.mode))]
    pub async fn new(
        ops: Arc<dyn SheetOperations>,
        spreadsheet_id: &str,
        sheet_name: &str,
        config: KvStoreConfig,
    ) -> Result<Self> {
        let scratch_sheet = scratchpad_sheet_name(sheet_name);
        ensure_sheets(ops.as_ref(), spreadsheet_id, &[sheet_name, scratch_sheet.as_str()]).await;
        let scratchpad = Scratchpad::allocate(ops.clone(), spreadsheet_id, &scratch_sheet).await?;

        info!(sheet = sheet_name, scratchpad = %scratchpad.location(), "kv store ready");
        Ok(Self {
            ops,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            scratchpad,
            mode: config.mode,
            codec: config.codec,
        })
    }

    pub fn mode(&self) -> KvMode {
        self.mode
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn scratchpad(&self) -> &Scratchpad {
        &self.scratchpad
    }

    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// `TabulaError::KeyNotFound` when the key is absent or its newest row is
    /// a tombstone.
    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let formula = match self.mode {
            KvMode::Default => kv_get_default_formula(key, &self.sheet_name),
            KvMode::AppendOnly => kv_get_append_only_formula(key, &self.sheet_name),
        };

        let value = self.scratchpad.evaluate(&formula).await?;
        if value.is_empty() || value == NA_VALUE {
            return Err(TabulaError::KeyNotFound(key.to_string()));
        }
        if is_error_value(&value) {
            warn!(value = %value, "lookup formula failed");
            return Err(TabulaError::Retrieval(format!(
                "error looking up key {}: {}",
                key, value
            )));
        }

        self.codec.decode(&value)
    }

    /// Store `value` under `key`.
    #[instrument(skip(self, value), fields(sheet = %self.sheet_name, len = value.len()))]
    pub async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let encoded = self.codec.encode(value)?;
        match self.mode {
            KvMode::Default => self.set_default(key, encoded).await,
            KvMode::AppendOnly => self.append(key, encoded).await,
        }
    }

    /// Remove `key`; absent keys are not an error.
    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self.mode {
            KvMode::Default => match self.find_key_row(key).await? {
                Some(range) => {
                    self.ops
                        .clear(&self.spreadsheet_id, std::slice::from_ref(&range))
                        .await?;
                    Ok(())
                }
                None => {
                    debug!("key absent, nothing to delete");
                    Ok(())
                }
            },
            KvMode::AppendOnly => self.append(key, String::new()).await,
        }
    }

    /// Release the scratchpad cell.
    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    pub async fn close(&self) -> Result<()> {
        self.scratchpad.release().await
    }

    async fn set_default(&self, key: &str, encoded: String) -> Result<()> {
        let row = record(key, encoded);
        match self.find_key_row(key).await? {
            Some(range) => {
                self.ops
                    .update_rows(&self.spreadsheet_id, &range, vec![row])
                    .await?;
            }
            None => {
                self.ops
                    .insert_rows(
                        &self.spreadsheet_id,
                        &CellRange::new(&self.sheet_name, KV_FIRST_ROW_RANGE),
                        vec![row],
                        AppendMode::Overwrite,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn append(&self, key: &str, encoded: String) -> Result<()> {
        self.ops
            .insert_rows(
                &self.spreadsheet_id,
                &CellRange::new(&self.sheet_name, KV_TABLE_RANGE),
                vec![record(key, encoded)],
                AppendMode::Insert,
            )
            .await?;
        Ok(())
    }

    /// Row range holding `key`, if any
    async fn find_key_row(&self, key: &str) -> Result<Option<CellRange>> {
        let offset = self
            .scratchpad
            .evaluate(&kv_find_key_formula(key, &self.sheet_name))
            .await?;
        if offset.is_empty() || offset == NA_VALUE {
            return Ok(None);
        }

        let row: u64 = offset.trim().parse().map_err(|_| {
            TabulaError::Retrieval(format!("error finding row of key {}: {}", key, offset))
        })?;
        Ok(Some(CellRange::new(&self.sheet_name, &kv_row_range(row))))
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("mode", &self.mode)
            .field("scratchpad", &self.scratchpad)
            .finish()
    }
}

fn record(key: &str, encoded: String) -> Vec<Value> {
    vec![
        Value::from(key),
        Value::from(encoded),
        Value::from(Utc::now().timestamp_millis()),
    ]
}
