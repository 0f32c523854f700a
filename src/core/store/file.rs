/*!
File-backed record store.

Layout: `<data_dir>/<target_id>/record.json`, a pretty-printed JSON array
of ping records. Writes go through a temp file plus rename so a reader
either sees the previous state or the complete new one, and an exclusive
lock file serializes writers per target - the read-modify-write of
append-plus-prune is a single critical section. Writers of different
targets never contend.
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;

use super::{check_uniform_type, RecordStore, StoreError};
use crate::core::probe::types::{now_millis, PingRecord};

const RECORD_FILE: &str = "record.json";
const LOCK_FILE: &str = "record.lock";
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

pub struct FileRecordStore {
    data_dir: PathBuf,
}

impl FileRecordStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn target_dir(&self, target_id: &str) -> PathBuf {
        self.data_dir.join(target_id)
    }

    /// Acquire the per-target writer lock without blocking the runtime:
    /// contended attempts back off asynchronously instead of parking the
    /// thread. The lock releases when the returned handle drops.
    async fn lock_target(&self, dir: &Path) -> Result<std::fs::File, StoreError> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => return Ok(lock_file),
                Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                    tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                }
                Err(err) => return Err(StoreError::Io(err)),
            }
        }
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn append(
        &self,
        target_id: &str,
        record: PingRecord,
        max_record_history: u64,
    ) -> Result<(), StoreError> {
        let dir = self.target_dir(target_id);
        tokio::fs::create_dir_all(&dir).await?;

        let _lock = self.lock_target(&dir).await?;

        let path = dir.join(RECORD_FILE);
        let mut records = read_records(&path).await?;
        records.push(record);

        let not_before = now_millis() - max_record_history as i64;
        records.retain(|record| record.ran_at() >= not_before);

        write_atomic(&path, &records).await
    }

    async fn read_all(&self, target_id: &str) -> Result<Vec<PingRecord>, StoreError> {
        let path = self.target_dir(target_id).join(RECORD_FILE);
        let records = read_records(&path).await?;
        check_uniform_type(&records)?;
        Ok(records)
    }
}

async fn read_records(path: &Path) -> Result<Vec<PingRecord>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StoreError::Io(err)),
    };

    let records: Vec<PingRecord> = serde_json::from_str(&content)?;
    Ok(records)
}

/// Write via temp file + rename so no partial write is ever visible.
async fn write_atomic(path: &Path, records: &[PingRecord]) -> Result<(), StoreError> {
    let temp_path = path.with_extension("tmp");
    let content = serde_json::to_string_pretty(records)?;

    tokio::fs::write(&temp_path, content).await?;
    tokio::fs::rename(&temp_path, path).await?;

    Ok(())
}
