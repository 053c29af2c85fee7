//! `SheetOperations` over the Google Sheets v4 REST API

use crate::auth::AccessTokenProvider;
use crate::client::SheetsHttpClient;
use crate::config::SheetsClientConfig;
use crate::error::{HttpError, HttpResult};
use crate::response::{
    AppendValuesResponse, BatchClearValuesRequest, BatchClearValuesResponse,
    BatchUpdateSpreadsheetRequest, BatchUpdateValuesRequest, BatchUpdateValuesResponse,
    GvizResponse, SheetProperties, Spreadsheet, SpreadsheetRequest, UpdateValuesResponse,
    ValueRange, RENDER_FORMATTED_VALUE, VALUE_INPUT_USER_ENTERED,
};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tabula_common::{
    AppendMode, BatchUpdateRowsRequest, CellRange, InsertRowsResult, QueryRowsResult, Result,
    Rows, SheetOperations, UpdateRowsResult,
};
use tracing::instrument;
use url::Url;

/// Google Sheets backend
#[derive(Clone)]
pub struct GoogleSheets {
    client: SheetsHttpClient,
}

impl GoogleSheets {
    pub fn new(config: SheetsClientConfig, auth: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        Ok(Self {
            client: SheetsHttpClient::new(config, auth)?,
        })
    }

    pub fn from_client(client: SheetsHttpClient) -> Self {
        Self { client }
    }

    fn sheets_url(&self, segments: &[&str]) -> HttpResult<Url> {
        self.client
            .endpoint(&self.client.config().sheets_base_url, segments)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &CellRange, suffix: &str) -> HttpResult<Url> {
        let last = format!("{}{}", range, suffix);
        let mut url = self.sheets_url(&[spreadsheet_id, "values", &last])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_USER_ENTERED)
            .append_pair("includeValuesInResponse", "true")
            .append_pair("responseValueRenderOption", RENDER_FORMATTED_VALUE);
        Ok(url)
    }

    async fn batch_update_spreadsheet(
        &self,
        spreadsheet_id: &str,
        requests: Vec<SpreadsheetRequest>,
    ) -> HttpResult<()> {
        let url = self.sheets_url(&[&format!("{}:batchUpdate", spreadsheet_id)])?;
        let body = BatchUpdateSpreadsheetRequest { requests };
        let _: serde_json::Value = self.client.send_json(Method::POST, url, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl SheetOperations for GoogleSheets {
    #[instrument(skip(self))]
    async fn create_sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<()> {
        let request = SpreadsheetRequest::AddSheet {
            properties: SheetProperties {
                sheet_id: None,
                title: sheet_name.to_string(),
            },
        };
        Ok(self
            .batch_update_spreadsheet(spreadsheet_id, vec![request])
            .await?)
    }

    #[instrument(skip(self))]
    async fn delete_sheets(&self, spreadsheet_id: &str, sheet_ids: &[i64]) -> Result<()> {
        let requests = sheet_ids
            .iter()
            .map(|&sheet_id| SpreadsheetRequest::DeleteSheet { sheet_id })
            .collect();
        Ok(self.batch_update_spreadsheet(spreadsheet_id, requests).await?)
    }

    #[instrument(skip(self))]
    async fn sheet_name_to_id(&self, spreadsheet_id: &str) -> Result<HashMap<String, i64>> {
        let url = self.sheets_url(&[spreadsheet_id])?;
        let spreadsheet: Spreadsheet = self.client.get_json(url).await?;

        let mut result = HashMap::with_capacity(spreadsheet.sheets.len());
        for sheet in spreadsheet.sheets {
            let props = sheet.properties.ok_or_else(|| {
                HttpError::ResponseError("empty sheet properties".to_string())
            })?;
            result.insert(props.title, props.sheet_id.unwrap_or_default());
        }
        Ok(result)
    }

    #[instrument(skip(self, values), fields(rows = values.len(), range = %range))]
    async fn insert_rows(
        &self,
        spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
        mode: AppendMode,
    ) -> Result<InsertRowsResult> {
        let mut url = self.values_url(spreadsheet_id, range, ":append")?;
        url.query_pairs_mut()
            .append_pair("insertDataOption", mode.as_str());

        let body = ValueRange::rows(range, values);
        let resp: AppendValuesResponse = self.client.send_json(Method::POST, url, &body).await?;
        Ok(resp.updates.into_insert_result())
    }

    #[instrument(skip(self, values), fields(rows = values.len(), range = %range))]
    async fn update_rows(
        &self,
        spreadsheet_id: &str,
        range: &CellRange,
        values: Rows,
    ) -> Result<UpdateRowsResult> {
        let url = self.values_url(spreadsheet_id, range, "")?;
        let body = ValueRange::rows(range, values);
        let resp: UpdateValuesResponse = self.client.send_json(Method::PUT, url, &body).await?;
        Ok(resp.into_update_result())
    }

    #[instrument(skip(self, requests), fields(requests = requests.len()))]
    async fn batch_update_rows(
        &self,
        spreadsheet_id: &str,
        requests: Vec<BatchUpdateRowsRequest>,
    ) -> Result<Vec<UpdateRowsResult>> {
        let url = self.sheets_url(&[spreadsheet_id, "values:batchUpdate"])?;
        let body = BatchUpdateValuesRequest {
            data: requests
                .into_iter()
                .map(|req| ValueRange::rows(&req.range, req.values))
                .collect(),
            value_input_option: VALUE_INPUT_USER_ENTERED,
            include_values_in_response: true,
            response_value_render_option: RENDER_FORMATTED_VALUE,
        };

        let resp: BatchUpdateValuesResponse =
            self.client.send_json(Method::POST, url, &body).await?;
        Ok(resp
            .responses
            .into_iter()
            .map(UpdateValuesResponse::into_update_result)
            .collect())
    }

    #[instrument(skip(self))]
    async fn query_rows(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        query: &str,
        skip_header: bool,
    ) -> Result<QueryRowsResult> {
        let mut url = self.client.endpoint(
            &self.client.config().query_base_url,
            &[spreadsheet_id, "gviz", "tq"],
        )?;
        url.query_pairs_mut()
            .append_pair("sheet", sheet_name)
            .append_pair("tqx", "responseHandler:tabula")
            .append_pair("tq", query)
            .append_pair("headers", if skip_header { "1" } else { "0" });

        let body = self.client.get_text(url).await?;
        Ok(GvizResponse::parse(&body)?.into_query_rows()?)
    }

    #[instrument(skip(self, ranges), fields(ranges = ranges.len()))]
    async fn clear(&self, spreadsheet_id: &str, ranges: &[CellRange]) -> Result<Vec<String>> {
        let url = self.sheets_url(&[spreadsheet_id, "values:batchClear"])?;
        let body = BatchClearValuesRequest {
            ranges: ranges.iter().map(|r| r.to_string()).collect(),
        };
        let resp: BatchClearValuesResponse =
            self.client.send_json(Method::POST, url, &body).await?;
        Ok(resp.cleared_ranges)
    }
}
