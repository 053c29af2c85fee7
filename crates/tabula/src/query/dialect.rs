//! Formula and range templates understood by the backend.

/// Synthetic first column of every row store
pub const ROW_ID_COLUMN: &str = "_rid";
/// Value written into [`ROW_ID_COLUMN`]; evaluates to the physical row number
pub const ROW_ID_FORMULA: &str = "=ROW()";

/// Header row of a row store (`A1` up to the last allowed column)
pub const ROW_HEADER_RANGE: &str = "A1:Z1";
/// Data area of a row store, below the header
pub const ROW_FULL_TABLE_RANGE: &str = "A2:Z";

pub const SCRATCHPAD_BOOKED: &str = "BOOKED";
pub const SCRATCHPAD_SHEET_SUFFIX: &str = "_scratch";

pub const KV_TABLE_RANGE: &str = "A1:C5000000";
pub const KV_KEY_COLUMN_RANGE: &str = "A1:A5000000";
pub const KV_FIRST_ROW_RANGE: &str = "A1:C1";

/// Returned by lookup formulas that found nothing
pub const NA_VALUE: &str = "#N/A";

const ERROR_VALUES: &[&str] = &[
    "#ERROR!", "#VALUE!", "#REF!", "#NAME?", "#DIV/0!", "#NUM!", "#NULL!",
];

/// True for formula error results other than [`NA_VALUE`]
pub fn is_error_value(value: &str) -> bool {
    ERROR_VALUES.contains(&value)
}

/// Full-width range of a single row, e.g. `A5:Z5`
pub fn row_range(row: u64) -> String {
    format!("A{}:Z{}", row, row)
}

/// Key/value/timestamp cells of a KV row, e.g. `A5:C5`
pub fn kv_row_range(row: u64) -> String {
    format!("A{}:C{}", row, row)
}

/// Scratchpad sheet name paired with a data sheet
pub fn scratchpad_sheet_name(sheet_name: &str) -> String {
    format!("{}{}", sheet_name, SCRATCHPAD_SHEET_SUFFIX)
}

/// Wrap a sheet reference for use inside a formula: `'it''s'!A1:C5`
pub fn sheet_range_ref(sheet_name: &str, range: &str) -> String {
    format!("'{}'!{}", sheet_name.replace('\'', "''"), range)
}

/// Quote text as a formula string literal, doubling embedded quotes
pub fn formula_string(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// First-match lookup of `key` in the KV data range
pub fn kv_get_default_formula(key: &str, sheet_name: &str) -> String {
    format!(
        "=VLOOKUP({}, {}, 2, FALSE)",
        formula_string(key),
        sheet_range_ref(sheet_name, KV_TABLE_RANGE)
    )
}

/// Lookup of `key` in the KV data range sorted by timestamp, newest first
pub fn kv_get_append_only_formula(key: &str, sheet_name: &str) -> String {
    format!(
        "=VLOOKUP({}, SORT({}, 3, FALSE), 2, FALSE)",
        formula_string(key),
        sheet_range_ref(sheet_name, KV_TABLE_RANGE)
    )
}

/// 1-based row of `key` in the KV key column
pub fn kv_find_key_formula(key: &str, sheet_name: &str) -> String {
    format!(
        "=MATCH({}, {}, 0)",
        formula_string(key),
        sheet_range_ref(sheet_name, KV_KEY_COLUMN_RANGE)
    )
}

/// Evaluate `query` over the row store data and join the first column with commas
pub fn row_indices_formula(sheet_name: &str, query: &str) -> String {
    format!(
        "=JOIN(\",\", QUERY({}, {}, 0))",
        sheet_range_ref(sheet_name, ROW_FULL_TABLE_RANGE),
        formula_string(query)
    )
}

/// Restrict a WHERE condition to materialized rows.
///
/// The caller's condition is parenthesized so a top-level `OR` cannot widen
/// the match past the row-id guard.
pub fn row_id_interceptor(condition: &str) -> String {
    if condition.trim().is_empty() {
        format!("{} is not null", ROW_ID_COLUMN)
    } else {
        format!("{} is not null AND ({})", ROW_ID_COLUMN, condition)
    }
}
