use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row in the deal ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealRecord {
    /// Assigned by the database; 0 until saved.
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub chat_id: i64,
    pub client: String,
    pub deal: String,
    pub folder_id: String,
    pub folder_link: String,
}

impl DealRecord {
    pub fn new(
        chat_id: i64,
        client: impl Into<String>,
        deal: impl Into<String>,
        folder_id: impl Into<String>,
        folder_link: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            chat_id,
            client: client.into(),
            deal: deal.into(),
            folder_id: folder_id.into(),
            folder_link: folder_link.into(),
        }
    }

    /// Cells written to a spreadsheet row, in column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.client.clone(),
            self.deal.clone(),
            self.folder_link.clone(),
            self.folder_id.clone(),
            self.chat_id.to_string(),
        ]
    }
}
