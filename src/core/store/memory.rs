//! In-memory record store, a test substitute for the file-backed store
//! with the same append/prune/read contract.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{check_uniform_type, RecordStore, StoreError};
use crate::core::probe::types::{now_millis, PingRecord};

#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<String, Vec<PingRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(
        &self,
        target_id: &str,
        record: PingRecord,
        max_record_history: u64,
    ) -> Result<(), StoreError> {
        let mut map = self.records.lock().await;
        let records = map.entry(target_id.to_string()).or_default();
        records.push(record);

        let not_before = now_millis() - max_record_history as i64;
        records.retain(|record| record.ran_at() >= not_before);

        Ok(())
    }

    async fn read_all(&self, target_id: &str) -> Result<Vec<PingRecord>, StoreError> {
        let map = self.records.lock().await;
        let records = map.get(target_id).cloned().unwrap_or_default();
        check_uniform_type(&records)?;
        Ok(records)
    }
}
