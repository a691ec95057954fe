pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// The three logical snapshot stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Accounts,
    Bets,
    DrawHistory,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [StoreKey::Accounts, StoreKey::Bets, StoreKey::DrawHistory];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Accounts => "accounts",
            StoreKey::Bets => "bets",
            StoreKey::DrawHistory => "draw_history",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value persistence of JSON snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, key: StoreKey) -> Result<Option<serde_json::Value>>;

    async fn save(&self, key: StoreKey, value: &serde_json::Value) -> Result<()>;
}

pub(crate) async fn load_as<T: DeserializeOwned + Default>(
    store: &dyn SnapshotStore,
    key: StoreKey,
) -> Result<T> {
    match store.load(key).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(T::default()),
    }
}

pub(crate) async fn save_as<T: Serialize + ?Sized>(
    store: &dyn SnapshotStore,
    key: StoreKey,
    value: &T,
) -> Result<()> {
    let value = serde_json::to_value(value)?;
    store.save(key, &value).await
}
