use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::deal::{DealContext, DealRequest, DEFAULT_TARGET, SUBFOLDERS};
use crate::error::Result;
use crate::google::drive::DriveItem;
use crate::ledger::DealLedger;
use crate::storage::DealRecord;

/// Folder operations the deal workflow needs from the file store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn get_or_create_folder(&self, name: &str, parent_id: &str) -> Result<DriveItem>;

    async fn upload_file(&self, parent_id: &str, filename: &str, data: Vec<u8>) -> Result<DriveItem>;
}

/// Result of an upload, as reported back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub target: String,
    pub link: String,
}

/// Builds the `<year>/<client>/<deal>/<subfolders>` tree and uploads into it.
pub struct DealService {
    folders: Arc<dyn FolderStore>,
    ledger: Option<Arc<dyn DealLedger>>,
    root_folder_id: String,
}

impl DealService {
    pub fn new(
        folders: Arc<dyn FolderStore>,
        ledger: Option<Arc<dyn DealLedger>>,
        root_folder_id: impl Into<String>,
    ) -> Self {
        Self {
            folders,
            ledger,
            root_folder_id: root_folder_id.into(),
        }
    }

    pub async fn open_deal(&self, chat_id: i64, request: &DealRequest) -> Result<DealContext> {
        self.open_deal_at(chat_id, request, Utc::now()).await
    }

    /// Same as [`open_deal`](Self::open_deal) with the year taken from `now`.
    pub async fn open_deal_at(
        &self,
        chat_id: i64,
        request: &DealRequest,
        now: DateTime<Utc>,
    ) -> Result<DealContext> {
        let year = now.year().to_string();
        let year_folder = self.folders.get_or_create_folder(&year, &self.root_folder_id).await?;
        let client_folder = self
            .folders
            .get_or_create_folder(&request.client, &year_folder.id)
            .await?;
        let deal_folder = self
            .folders
            .get_or_create_folder(&request.deal, &client_folder.id)
            .await?;

        let mut subfolder_ids = HashMap::with_capacity(SUBFOLDERS.len());
        for name in SUBFOLDERS {
            let folder = self.folders.get_or_create_folder(name, &deal_folder.id).await?;
            subfolder_ids.insert(name.to_string(), folder.id);
        }

        let ctx = DealContext {
            deal_link: deal_folder.web_view_link.clone().unwrap_or_default(),
            deal_id: deal_folder.id,
            subfolder_ids,
            target: DEFAULT_TARGET.to_string(),
        };

        info!(
            "Deal folder ready for chat {}: {} / {} / {} ({})",
            chat_id, year, request.client, request.deal, ctx.deal_id
        );

        if let Some(ledger) = &self.ledger {
            let mut record = DealRecord::new(
                chat_id,
                &request.client,
                &request.deal,
                &ctx.deal_id,
                &ctx.deal_link,
            );
            record.created_at = now;
            if let Err(e) = ledger.record(&record).await {
                warn!("Failed to record deal {} in ledger: {}", ctx.deal_id, e);
            }
        }

        Ok(ctx)
    }

    /// Uploads into the context's target subfolder.
    pub async fn upload(&self, ctx: &DealContext, filename: &str, data: Vec<u8>) -> Result<UploadReceipt> {
        let size = data.len();
        let file = self
            .folders
            .upload_file(ctx.target_folder_id(), filename, data)
            .await?;

        info!("Uploaded {} ({} bytes) to {}", filename, size, ctx.target);

        Ok(UploadReceipt {
            target: ctx.target.clone(),
            link: file.web_view_link.unwrap_or_default(),
        })
    }
}
