use std::collections::HashMap;

use async_trait::async_trait;

use super::{RecordStore, StoreError};
use crate::models::RawRecord;

/// Tables held in process, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<RawRecord>>,
    unreachable: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, records: Vec<RawRecord>) -> Self {
        self.tables.insert(table.to_string(), records);
        self
    }

    /// Every fetch fails with a transport error carrying `reason`.
    pub fn unreachable(reason: &str) -> Self {
        Self {
            tables: HashMap::new(),
            unreachable: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn fetch_all_records(&self, table: &str) -> Result<Vec<RawRecord>, StoreError> {
        if let Some(reason) = &self.unreachable {
            return Err(StoreError::Transport(reason.clone()));
        }
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }
}
