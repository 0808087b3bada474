use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::{BotError, Result};
use crate::google::auth::TokenSource;
use crate::ledger::DealLedger;
use crate::storage::DealRecord;

/// Appends one row per deal to a Google Sheets range.
pub struct SheetsLedger {
    http: reqwest::Client,
    auth: Arc<dyn TokenSource>,
    api_url: String,
    spreadsheet_id: String,
    range: String,
}

impl SheetsLedger {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<dyn TokenSource>,
        api_url: &str,
        spreadsheet_id: String,
        range: String,
    ) -> Self {
        Self {
            http,
            auth,
            api_url: api_url.trim_end_matches('/').to_string(),
            spreadsheet_id,
            range,
        }
    }

    fn append_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}:append",
            self.api_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range)
        )
    }
}

#[async_trait]
impl DealLedger for SheetsLedger {
    async fn record(&self, record: &DealRecord) -> Result<()> {
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .post(self.append_url())
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [record.to_row()] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::from_response(response).await);
        }

        info!("Deal '{}' appended to spreadsheet {}", record.deal, self.spreadsheet_id);
        Ok(())
    }
}
