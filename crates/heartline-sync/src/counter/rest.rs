//! Counter row in a Supabase table, over the PostgREST API.

use async_trait::async_trait;
use heartline_common::StoreError;
use tracing::debug;

use super::{Counter, CounterPatch, CounterStore};

pub struct RestCounterStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    row_id: i64,
}

impl std::fmt::Debug for RestCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCounterStore")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("table", &self.table)
            .field("row_id", &self.row_id)
            .finish()
    }
}

impl RestCounterStore {
    pub fn new(
        project_ref: &str,
        api_key: &str,
        table: &str,
        row_id: i64,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: format!("https://{project_ref}.supabase.co/rest/v1"),
            api_key: api_key.to_string(),
            table: table.to_string(),
            row_id,
        })
    }

    pub(crate) fn select_url(&self) -> String {
        format!(
            "{}/{}?id=eq.{}&select=count_a,count_b",
            self.base_url, self.table, self.row_id
        )
    }

    /// Update URL for `patch`. Each written column carries an `lt` filter
    /// so the row only changes when the new value is higher.
    pub(crate) fn update_url(&self, patch: &CounterPatch) -> String {
        let mut url = format!("{}/{}?id=eq.{}", self.base_url, self.table, self.row_id);
        if let Some(a) = patch.count_a {
            url.push_str(&format!("&count_a=lt.{a}"));
        }
        if let Some(b) = patch.count_b {
            url.push_str(&format!("&count_b=lt.{b}"));
        }
        url
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let text = text.chars().take(200).collect::<String>();
    Err(StoreError::Rejected(format!("HTTP {status}: {text}")))
}

/// The first row of a PostgREST select.
pub(crate) fn parse_rows(rows: serde_json::Value) -> Result<Counter, StoreError> {
    let rows: Vec<Counter> =
        serde_json::from_value(rows).map_err(|e| StoreError::Parse(e.to_string()))?;
    rows.into_iter().next().ok_or(StoreError::NotFound)
}

#[async_trait]
impl CounterStore for RestCounterStore {
    async fn get(&self) -> Result<Counter, StoreError> {
        let response = self
            .request(reqwest::Method::GET, self.select_url())
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let response = check_status(response).await?;
        let rows: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        parse_rows(rows)
    }

    async fn set(&self, patch: CounterPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        debug!(table = %self.table, row = self.row_id, ?patch, "Counter PATCH");
        let response = self
            .request(reqwest::Method::PATCH, self.update_url(&patch))
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}
