//! Wire types for the Sheets values API and the gviz query endpoint

use crate::error::{HttpError, HttpResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_common::{CellRange, InsertRowsResult, QueryRowsResult, Rows, UpdateRowsResult};

pub(crate) const MAJOR_DIMENSION_ROWS: &str = "ROWS";
pub(crate) const VALUE_INPUT_USER_ENTERED: &str = "USER_ENTERED";
pub(crate) const RENDER_FORMATTED_VALUE: &str = "FORMATTED_VALUE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub range: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub major_dimension: String,
    #[serde(default)]
    pub values: Rows,
}

impl ValueRange {
    pub fn rows(range: &CellRange, values: Rows) -> Self {
        Self {
            range: range.to_string(),
            major_dimension: MAJOR_DIMENSION_ROWS.to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: i64,
    #[serde(default)]
    pub updated_columns: i64,
    #[serde(default)]
    pub updated_cells: i64,
    #[serde(default)]
    pub updated_data: Option<ValueRange>,
}

impl UpdateValuesResponse {
    pub fn into_update_result(self) -> UpdateRowsResult {
        UpdateRowsResult {
            updated_range: CellRange::parse(&self.updated_range),
            updated_rows: self.updated_rows,
            updated_columns: self.updated_columns,
            updated_cells: self.updated_cells,
            updated_values: self.updated_data.map(|d| d.values).unwrap_or_default(),
        }
    }

    pub fn into_insert_result(self) -> InsertRowsResult {
        InsertRowsResult {
            updated_range: CellRange::parse(&self.updated_range),
            updated_rows: self.updated_rows,
            updated_columns: self.updated_columns,
            updated_cells: self.updated_cells,
            inserted_values: self.updated_data.map(|d| d.values).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendValuesResponse {
    pub updates: UpdateValuesResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub data: Vec<ValueRange>,
    pub value_input_option: &'static str,
    pub include_values_in_response: bool,
    pub response_value_render_option: &'static str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub responses: Vec<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchClearValuesRequest {
    pub ranges: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchClearValuesResponse {
    #[serde(default)]
    pub cleared_ranges: Vec<String>,
}

/// One entry of a spreadsheet `batchUpdate` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpreadsheetRequest {
    AddSheet { properties: SheetProperties },
    DeleteSheet {
        #[serde(rename = "sheetId")]
        sheet_id: i64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateSpreadsheetRequest {
    pub requests: Vec<SpreadsheetRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub properties: Option<SheetProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

/// gviz response body, after the JSON object has been cut out of its wrapper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GvizResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<GvizError>,
    #[serde(default)]
    pub table: GvizTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GvizError {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GvizTable {
    #[serde(default)]
    pub cols: Vec<GvizColumn>,
    #[serde(default)]
    pub rows: Vec<GvizRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GvizColumn {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GvizRow {
    #[serde(rename = "c", default)]
    pub cells: Vec<Option<GvizCell>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GvizCell {
    #[serde(rename = "v", default)]
    pub value: Value,
    #[serde(rename = "f", default)]
    pub formatted: Option<String>,
}

impl GvizResponse {
    /// Cut the JSON object out of a gviz body (`/*O_o*/\ncallback({...});`) and decode it
    pub fn parse(body: &str) -> HttpResult<Self> {
        let first = body.find('{').ok_or_else(|| {
            HttpError::ResponseError(format!("opening curly bracket not found: {}", body))
        })?;
        let last = body.rfind('}').ok_or_else(|| {
            HttpError::ResponseError(format!("closing curly bracket not found: {}", body))
        })?;
        if last < first {
            return Err(HttpError::ResponseError(format!(
                "malformed query response: {}",
                body
            )));
        }

        serde_json::from_str(&body[first..=last])
            .map_err(|e| HttpError::Json(format!("Failed to parse query response: {}", e)))
    }

    /// Convert cells per their column type
    pub fn into_query_rows(self) -> HttpResult<QueryRowsResult> {
        if self.status.as_deref() == Some("error") {
            let messages: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.reason, e.message))
                .collect();
            return Err(HttpError::ResponseError(format!(
                "query failed: {}",
                messages.join("; ")
            )));
        }

        let cols = self.table.cols;
        let mut rows = Vec::with_capacity(self.table.rows.len());
        for row in self.table.rows {
            let mut out = Vec::with_capacity(row.cells.len());
            for (idx, cell) in row.cells.into_iter().enumerate() {
                let col = cols.get(idx).ok_or_else(|| {
                    HttpError::ResponseError(format!("cell {} has no column descriptor", idx))
                })?;
                out.push(convert_cell(col, cell.unwrap_or_default())?);
            }
            rows.push(out);
        }

        Ok(QueryRowsResult { rows })
    }
}

fn convert_cell(col: &GvizColumn, cell: GvizCell) -> HttpResult<Value> {
    match col.kind.as_str() {
        "boolean" | "number" | "string" => Ok(cell.value),
        "date" | "datetime" | "timeofday" => Ok(Value::String(cell.formatted.unwrap_or_default())),
        other => Err(HttpError::ResponseError(format!(
            "unsupported cell value: {}",
            other
        ))),
    }
}
