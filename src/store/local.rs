use crate::errors::StoreError;
use crate::models::{ProgressMap, ProgressRecord, RecordId};
use crate::store::{ProgressStore, Scope};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tokio::{fs, sync::Mutex};
use tracing::debug;

/// Keeps the whole progress map in one JSON file on this device.
///
/// The scope is implicit; every mutation rewrites the file.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_blob(&self) -> Result<ProgressMap, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::BackendUnavailable(format!("failed to parse progress file: {err}"))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(ProgressMap::new()),
            Err(err) => Err(StoreError::BackendUnavailable(format!(
                "failed to read progress file: {err}"
            ))),
        }
    }

    async fn write_blob(&self, progress: &ProgressMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(StoreError::unavailable)?;
            }
        }
        let payload = serde_json::to_vec_pretty(progress).map_err(StoreError::unavailable)?;
        fs::write(&self.path, payload)
            .await
            .map_err(StoreError::unavailable)?;
        debug!(path = %self.path.display(), records = progress.len(), "wrote progress file");
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for LocalStore {
    async fn load_all(&self, _scope: &Scope) -> Result<ProgressMap, StoreError> {
        self.read_blob().await
    }

    async fn upsert_complete(
        &self,
        _scope: &Scope,
        day: u32,
        notes: &str,
        completed_at: NaiveDate,
    ) -> Result<ProgressRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut progress = self.read_blob().await?;
        let record = ProgressRecord::completed(day, notes, completed_at);
        progress.insert(day, record.clone());
        self.write_blob(&progress).await?;
        Ok(record)
    }

    async fn delete_day(
        &self,
        _scope: &Scope,
        day: u32,
        _record_id: Option<&RecordId>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut progress = self.read_blob().await?;
        if progress.remove(&day).is_none() {
            return Err(StoreError::RecordNotFound(day));
        }
        self.write_blob(&progress).await
    }
}
