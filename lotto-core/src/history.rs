use crate::numbers::Selection;
use crate::types::DrawId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub id: DrawId,
    pub numbers: Selection,
    pub drawn_at: DateTime<Utc>,
}

impl DrawRecord {
    pub fn new(numbers: Selection) -> Self {
        Self {
            id: DrawId::new(),
            numbers,
            drawn_at: Utc::now(),
        }
    }
}

/// Concluded draws, newest first. Records are never removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    records: VecDeque<DrawRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: DrawRecord) {
        self.records.push_front(record);
    }

    pub fn recent(&self, n: usize) -> Vec<DrawRecord> {
        self.records.iter().take(n).cloned().collect()
    }

    pub fn latest(&self) -> Option<&DrawRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
