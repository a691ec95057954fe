use super::{SnapshotStore, StoreKey};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    snapshots: RwLock<HashMap<StoreKey, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: StoreKey) -> Option<serde_json::Value> {
        self.snapshots.read().get(&key).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self, key: StoreKey) -> Result<Option<serde_json::Value>> {
        Ok(self.get(key))
    }

    async fn save(&self, key: StoreKey, value: &serde_json::Value) -> Result<()> {
        self.snapshots.write().insert(key, value.clone());
        Ok(())
    }
}
