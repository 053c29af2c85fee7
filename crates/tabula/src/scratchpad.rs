//! Scratchpad cell and row-index discovery.
//!
//! The backend cannot update or delete "rows matching a condition". Instead a
//! store writes a formula into a cell it owns (the scratchpad), reads back the
//! value the backend computed, and turns that into concrete row numbers:
//!
//! 1. Plan: render the query and wrap it in a formula ([`RowIndexPlan`])
//! 2. Discover: evaluate it in the scratchpad ([`Scratchpad::discover`])
//! 3. Execute: the caller issues range writes for the returned rows
//!
//! A scratchpad belongs to exactly one store instance. Two stores evaluating
//! formulas in the same cell overwrite each other's results.

use crate::query::dialect::{
    is_error_value, row_indices_formula, KV_TABLE_RANGE, NA_VALUE, SCRATCHPAD_BOOKED,
};
use std::sync::Arc;
use tabula_common::{value_to_text, AppendMode, CellRange, Result, SheetOperations, TabulaError};
use tracing::{debug, instrument, warn};

/// A reserved cell used to evaluate formulas
pub struct Scratchpad {
    ops: Arc<dyn SheetOperations>,
    spreadsheet_id: String,
    location: CellRange,
}

impl std::fmt::Debug for Scratchpad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scratchpad")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("location", &self.location)
            .finish()
    }
}

impl Scratchpad {
    /// Book a fresh cell in `scratch_sheet` by appending a sentinel and
    /// keeping the range the backend reports it landed in.
    #[instrument(skip(ops))]
    pub async fn allocate(
        ops: Arc<dyn SheetOperations>,
        spreadsheet_id: &str,
        scratch_sheet: &str,
    ) -> Result<Self> {
        let result = ops
            .insert_rows(
                spreadsheet_id,
                &CellRange::new(scratch_sheet, KV_TABLE_RANGE),
                vec![vec![SCRATCHPAD_BOOKED.into()]],
                AppendMode::Overwrite,
            )
            .await?;

        if result.updated_range.from_cell.is_empty() {
            return Err(TabulaError::Retrieval(format!(
                "no scratchpad location reported in sheet {}",
                scratch_sheet
            )));
        }

        debug!(location = %result.updated_range, "scratchpad allocated");
        Ok(Self {
            ops,
            spreadsheet_id: spreadsheet_id.to_string(),
            location: result.updated_range,
        })
    }

    pub fn location(&self) -> &CellRange {
        &self.location
    }

    /// Write `formula` into the scratchpad and return the computed text.
    ///
    /// An empty string means the backend echoed nothing back.
    pub async fn evaluate(&self, formula: &str) -> Result<String> {
        let result = self
            .ops
            .update_rows(
                &self.spreadsheet_id,
                &self.location,
                vec![vec![formula.into()]],
            )
            .await?;

        Ok(result
            .updated_values
            .first()
            .and_then(|row| row.first())
            .map(value_to_text)
            .unwrap_or_default())
    }

    /// Evaluate a row-index plan and parse the matching row numbers.
    #[instrument(skip(self, plan), fields(scratchpad = %self.location))]
    pub async fn discover(&self, plan: &RowIndexPlan) -> Result<Vec<u64>> {
        let raw = self.evaluate(&plan.formula).await?;
        let rows = parse_row_indices(&raw)?;
        debug!(matches = rows.len(), "row indices discovered");
        Ok(rows)
    }

    /// Clear the scratchpad cell
    #[instrument(skip(self), fields(scratchpad = %self.location))]
    pub async fn release(&self) -> Result<()> {
        self.ops
            .clear(&self.spreadsheet_id, std::slice::from_ref(&self.location))
            .await?;
        Ok(())
    }
}

/// Create each sheet, ignoring failures (most commonly "already exists").
pub(crate) async fn ensure_sheets(
    ops: &dyn SheetOperations,
    spreadsheet_id: &str,
    sheet_names: &[&str],
) {
    for name in sheet_names {
        if let Err(e) = ops.create_sheet(spreadsheet_id, name).await {
            debug!(sheet = %name, error = %e, "create sheet skipped");
        }
    }
}

/// Formula that evaluates a query against a row store and joins the matching
/// row numbers with commas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIndexPlan {
    pub query: String,
    pub formula: String,
}

impl RowIndexPlan {
    /// `query` must select the row-identity column only.
    pub fn new(sheet_name: &str, query: impl Into<String>) -> Self {
        let query = query.into();
        let formula = row_indices_formula(sheet_name, &query);
        Self { query, formula }
    }
}

/// Parse a scratchpad result into row numbers.
///
/// `""` and `#N/A` mean no rows; a formula error becomes
/// `TabulaError::Retrieval`; anything else must be a comma-separated list of
/// row numbers.
pub fn parse_row_indices(raw: &str) -> Result<Vec<u64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == NA_VALUE {
        return Ok(Vec::new());
    }
    if is_error_value(raw) {
        warn!(value = raw, "row index formula failed");
        return Err(TabulaError::Retrieval(format!(
            "error retrieving row indices: {}",
            raw
        )));
    }

    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<u64>().map_err(|_| {
                TabulaError::Retrieval(format!("error converting row index: {:?}", token))
            })
        })
        .collect()
}
