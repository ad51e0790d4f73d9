//! HTTP client for the spreadsheet-backed endpoint.
//!
//! The endpoint exposes two actions: `getData` returns the whole sheet as a
//! table and `saveData` replaces the whole sheet with the rows it is given.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::rows::RawRow;
use super::{ApiError, RemoteStore, Sheet, WriteEncoding};

/// Status value the endpoint uses for a successful read.
const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
struct SheetEnvelope {
    status: String,
    #[serde(default)]
    data: Value,
}

/// Client for one sheet endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    endpoint: String,
}

impl SheetClient {
    /// Create a client for `endpoint`. Without a timeout a request that never
    /// answers stays pending.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Parse a `getData` response body into its table rows, header included.
    fn parse_envelope(text: &str) -> Result<Vec<RawRow>, ApiError> {
        let envelope: SheetEnvelope = serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("malformed JSON: {}", e)))?;

        if envelope.status != STATUS_SUCCESS {
            return Err(ApiError::EndpointStatus(envelope.status));
        }

        serde_json::from_value(envelope.data)
            .map_err(|e| ApiError::InvalidResponse(format!("data is not a table: {}", e)))
    }

    /// `GET <endpoint>?action=getData[&sheet=<name>]`
    fn read_request(&self, sheet: Sheet) -> Result<reqwest::Request, ApiError> {
        let mut query = vec![("action", "getData")];
        if let Some(name) = sheet.query_name() {
            query.push(("sheet", name));
        }
        Ok(self.client.get(&self.endpoint).query(&query).build()?)
    }

    /// `POST` replacing the sheet with `rows`, in the sheet's write encoding.
    fn write_request(&self, sheet: Sheet, rows: &[Vec<String>]) -> Result<reqwest::Request, ApiError> {
        let request = match sheet.write_encoding() {
            WriteEncoding::Form => {
                let payload = serde_json::to_string(rows).map_err(ApiError::EncodeError)?;
                let mut form = vec![("action", "saveData")];
                if let Some(name) = sheet.query_name() {
                    form.push(("sheet", name));
                }
                form.push(("data", payload.as_str()));
                self.client.post(&self.endpoint).form(&form).build()?
            }
            WriteEncoding::Json => self
                .client
                .post(&self.endpoint)
                .query(&[("action", "saveData")])
                .json(&json!({ "data": rows }))
                .build()?,
        };
        Ok(request)
    }

    pub async fn get_data(&self, sheet: Sheet) -> Result<Vec<RawRow>, ApiError> {
        let request = self.read_request(sheet)?;
        let response = self.client.execute(request).await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;

        let rows = Self::parse_envelope(&text)?;
        info!(sheet = sheet.name(), rows = rows.len(), "Fetched sheet");
        Ok(rows)
    }

    /// Replace the sheet contents with `rows`.
    ///
    /// The reply is not inspected; the endpoint does not promise a meaningful
    /// body. A write counts as accepted once the request has been delivered,
    /// so only transport failures are reported.
    pub async fn save_data(&self, sheet: Sheet, rows: &[Vec<String>]) -> Result<(), ApiError> {
        let request = self.write_request(sheet, rows)?;
        let response = self.client.execute(request).await?;
        debug!(
            sheet = sheet.name(),
            status = %response.status(),
            rows = rows.len(),
            "Sheet write delivered"
        );
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SheetClient {
    async fn fetch_rows(&self, sheet: Sheet) -> Result<Vec<RawRow>, ApiError> {
        self.get_data(sheet).await
    }

    async fn persist_rows(&self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), ApiError> {
        self.save_data(sheet, &rows).await
    }
}
