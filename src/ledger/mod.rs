pub mod sheets;

pub use sheets::SheetsLedger;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{Config, LedgerBackend};
use crate::error::{BotError, Result};
use crate::google::auth::TokenSource;
use crate::storage::{Database, DealRecord};

/// Where created deals are written down.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DealLedger: Send + Sync {
    async fn record(&self, record: &DealRecord) -> Result<()>;
}

/// Deal table kept in a local SQLite file.
pub struct SqliteLedger {
    database: Mutex<Database>,
}

impl SqliteLedger {
    pub fn new(database: Database) -> Self {
        Self {
            database: Mutex::new(database),
        }
    }

    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(Database::new(path)?))
    }
}

#[async_trait]
impl DealLedger for SqliteLedger {
    async fn record(&self, record: &DealRecord) -> Result<()> {
        let db = self.database.lock().await;
        let id = db.save_deal(record)?;
        info!("Deal #{} recorded in SQLite ledger", id);
        Ok(())
    }
}

/// Builds the configured ledger, or `None` when recording is off.
pub fn from_config(
    config: &Config,
    http: reqwest::Client,
    auth: Arc<dyn TokenSource>,
) -> Result<Option<Arc<dyn DealLedger>>> {
    match config.ledger.backend {
        LedgerBackend::None => Ok(None),
        LedgerBackend::Sqlite => Ok(Some(Arc::new(SqliteLedger::open(&config.ledger.sqlite_path)?))),
        LedgerBackend::Sheets => {
            let spreadsheet_id = config.ledger.spreadsheet_id.clone().ok_or_else(|| {
                BotError::Config("ledger.spreadsheet_id is required for the sheets ledger".into())
            })?;
            Ok(Some(Arc::new(SheetsLedger::new(
                http,
                auth,
                &config.google.sheets_api_url,
                spreadsheet_id,
                config.ledger.sheet_range.clone(),
            ))))
        }
    }
}
