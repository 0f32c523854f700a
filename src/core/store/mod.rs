/*!
Append-and-prune persistence of ping records per monitored target.

The store is an explicit interface injected into the probe driver, so
tests can substitute an in-memory implementation for the file-backed
production store.
*/

mod file;
mod memory;

pub use file::FileRecordStore;
pub use memory::InMemoryRecordStore;

use async_trait::async_trait;

use crate::core::probe::types::PingRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record file io error: {0}")]
    Io(#[from] std::io::Error),
    /// Unknown record types and malformed shapes both land here.
    #[error("invalid record data: {0}")]
    Parse(#[from] serde_json::Error),
    /// A record file must hold one server type only; a mix is a
    /// data-integrity fault requiring operator intervention, never
    /// silently dropped or repaired.
    #[error("invalid record type: found \"{found}\" in a \"{expected}\" record file")]
    MixedRecordTypes {
        expected: &'static str,
        found: &'static str,
    },
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append one record to a target's history and prune entries whose
    /// `ranAt` falls outside the retention window (milliseconds,
    /// measured backwards from now). Pruning is lazy: it only ever
    /// happens here, at write time.
    async fn append(
        &self,
        target_id: &str,
        record: PingRecord,
        max_record_history: u64,
    ) -> Result<(), StoreError>;

    /// All retained records for a target, oldest first. Empty when the
    /// target has no history yet.
    async fn read_all(&self, target_id: &str) -> Result<Vec<PingRecord>, StoreError>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    async fn append(
        &self,
        target_id: &str,
        record: PingRecord,
        max_record_history: u64,
    ) -> Result<(), StoreError> {
        (**self).append(target_id, record, max_record_history).await
    }

    async fn read_all(&self, target_id: &str) -> Result<Vec<PingRecord>, StoreError> {
        (**self).read_all(target_id).await
    }
}

/// Every record in a sequence must share the first record's type.
pub(crate) fn check_uniform_type(records: &[PingRecord]) -> Result<(), StoreError> {
    let mut kinds = records.iter().map(PingRecord::kind);
    let Some(expected) = kinds.next() else {
        return Ok(());
    };
    for found in kinds {
        if found != expected {
            return Err(StoreError::MixedRecordTypes { expected, found });
        }
    }
    Ok(())
}
