use crate::error::StoreError;
use crate::google_auth::TokenSource;
use crate::row_store::RowStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Google Sheets v4 values API, one worksheet treated as a row store.
pub struct SheetsRowStore {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    api_base: String,
    spreadsheet_id: String,
    worksheet: String,
}

#[derive(Serialize)]
struct ValueRange<'a> {
    values: Vec<&'a [String]>,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsRowStore {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Self {
        Self {
            http,
            tokens,
            api_base: api_base.into(),
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_base,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    async fn check(&self, response: reqwest::Response, what: &str) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Sheets {} failed with {}: {}", what, status, body);
        Err(StoreError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// 1 → A, 26 → Z, 27 → AA
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Sheet name as it must appear in an A1 range
pub fn quoted_sheet(sheet: &str) -> String {
    let plain = !sheet.is_empty() && sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

pub fn a1_cell(sheet: &str, row: usize, column: usize) -> String {
    format!("{}!{}{}", quoted_sheet(sheet), column_letter(column), row)
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn append_row(&self, fields: Vec<String>) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}:append", self.values_url(&quoted_sheet(&self.worksheet)));

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&ValueRange {
                values: vec![fields.as_slice()],
            })
            .send()
            .await?;
        self.check(response, "append").await?;
        Ok(())
    }

    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(self.values_url(&quoted_sheet(&self.worksheet)))
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;
        let response = self.check(response, "read").await?;

        let parsed: ValuesResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(format!("values response: {}", e)))?;

        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn update_cell(
        &self,
        row: usize,
        column: usize,
        value: String,
    ) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;
        let range = a1_cell(&self.worksheet, row, column);
        let cells = [value];

        let response = self
            .http
            .put(self.values_url(&range))
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&serde_json::json!({ "range": range, "values": [&cells] }))
            .send()
            .await?;
        self.check(response, "update").await?;
        Ok(())
    }
}
