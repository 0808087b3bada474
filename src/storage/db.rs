use rusqlite::{params, types::Type, Connection, Row};
use crate::{error::Result, storage::models::DealRecord};
use chrono::{DateTime, Utc};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let db = Self { conn: Connection::open_in_memory()? };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS deals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                chat_id INTEGER NOT NULL,
                client TEXT NOT NULL,
                deal TEXT NOT NULL,
                folder_id TEXT NOT NULL,
                folder_link TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_deals_chat ON deals(chat_id)",
            [],
        )?;

        Ok(())
    }

    /// Inserts the deal and returns its new row id.
    pub fn save_deal(&self, record: &DealRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO deals
             (created_at, chat_id, client, deal, folder_id, folder_link)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.created_at.to_rfc3339(),
                record.chat_id,
                record.client,
                record.deal,
                record.folder_id,
                record.folder_link,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent deals first.
    pub fn recent_deals(&self, limit: usize) -> Result<Vec<DealRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, chat_id, client, deal, folder_id, folder_link
             FROM deals
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;

        let deals = stmt
            .query_map([limit as i64], row_to_deal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(deals)
    }

    pub fn deals_for_chat(&self, chat_id: i64) -> Result<Vec<DealRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, chat_id, client, deal, folder_id, folder_link
             FROM deals
             WHERE chat_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let deals = stmt
            .query_map([chat_id], row_to_deal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(deals)
    }

    pub fn count_deals(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM deals", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_deal(row: &Row<'_>) -> rusqlite::Result<DealRecord> {
    let created_at: String = row.get(1)?;
    let created_at = created_at
        .parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(DealRecord {
        id: row.get(0)?,
        created_at,
        chat_id: row.get(2)?,
        client: row.get(3)?,
        deal: row.get(4)?,
        folder_id: row.get(5)?,
        folder_link: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(chat_id: i64, client: &str, minutes_ago: i64) -> DealRecord {
        let mut record = DealRecord::new(chat_id, client, "deal", "folder", "https://drive/folder");
        record.created_at = Utc::now() - Duration::minutes(minutes_ago);
        record
    }

    #[test]
    fn save_and_list_recent_deals() {
        let db = Database::in_memory().unwrap();
        db.save_deal(&record(1, "old", 30)).unwrap();
        let id = db.save_deal(&record(2, "new", 1)).unwrap();

        let deals = db.recent_deals(10).unwrap();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].client, "new");
        assert_eq!(deals[0].id, id);
        assert_eq!(db.count_deals().unwrap(), 2);

        assert_eq!(db.recent_deals(1).unwrap().len(), 1);
    }

    #[test]
    fn deals_are_filtered_by_chat() {
        let db = Database::in_memory().unwrap();
        db.save_deal(&record(1, "a", 3)).unwrap();
        db.save_deal(&record(1, "b", 2)).unwrap();
        db.save_deal(&record(2, "c", 1)).unwrap();

        let chat_deals = db.deals_for_chat(1).unwrap();
        assert_eq!(chat_deals.iter().map(|d| d.client.as_str()).collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn schema_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deals.db");
        let path = path.to_str().unwrap();

        Database::new(path).unwrap().save_deal(&record(5, "kept", 0)).unwrap();
        assert_eq!(Database::new(path).unwrap().count_deals().unwrap(), 1);
    }
}
