use super::{SnapshotStore, StoreKey};
use crate::error::{LotteryError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                LotteryError::internal(format!("Failed to create directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema().await?;
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Unix time of the last save for `key`.
    pub async fn updated_at(&self, key: StoreKey) -> Result<Option<i64>> {
        let conn = self.conn.lock().await;
        let updated = conn
            .query_row(
                "SELECT updated_at FROM snapshots WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn load(&self, key: StoreKey) -> Result<Option<serde_json::Value>> {
        let conn = self.conn.lock().await;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM snapshots WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, key: StoreKey, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "INSERT OR REPLACE INTO snapshots (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key.as_str(), value.to_string(), Utc::now().timestamp()],
        )?;

        tracing::debug!("Saved snapshot '{}'", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_reload() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("lotto.db");

        {
            let store = SqliteStore::new(&path).await.unwrap();
            assert!(store.load(StoreKey::Bets).await.unwrap().is_none());
            store
                .save(StoreKey::Bets, &json!({"a": [1, 2, 3]}))
                .await
                .unwrap();
            assert!(store.updated_at(StoreKey::Bets).await.unwrap().is_some());
        }

        let store = SqliteStore::new(&path).await.unwrap();
        assert_eq!(
            store.load(StoreKey::Bets).await.unwrap(),
            Some(json!({"a": [1, 2, 3]}))
        );
        assert!(store.load(StoreKey::Accounts).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.save(StoreKey::DrawHistory, &json!([1])).await.unwrap();
        store.save(StoreKey::DrawHistory, &json!([2])).await.unwrap();
        assert_eq!(
            store.load(StoreKey::DrawHistory).await.unwrap(),
            Some(json!([2]))
        );
    }
}
