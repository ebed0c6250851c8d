use crate::errors::StoreError;
use crate::models::{ProgressMap, ProgressRecord, RecordId};
use crate::store::{ProgressStore, Scope};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// A call received by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    LoadAll,
    UpsertComplete { day: u32, notes: String },
    DeleteDay { day: u32, record_id: Option<RecordId> },
}

/// Simple in-memory store for testing and prototyping.
///
/// Issues record ids the way the remote backend does, so deletes must carry
/// the id handed out at insert time. Records are kept apart per scope.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, ProgressMap>>,
    calls: Mutex<Vec<StoreCall>>,
    next_id: AtomicU64,
    fail_loads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ProgressRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut guard) = store.records.lock() {
            let device = guard.entry(Scope::Device.label().to_string()).or_default();
            for record in records {
                device.insert(record.day, record);
            }
        }
        store
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Records held for [`Scope::Device`].
    pub fn snapshot(&self) -> ProgressMap {
        self.snapshot_for(&Scope::Device)
    }

    pub fn snapshot_for(&self, scope: &Scope) -> ProgressMap {
        self.records
            .lock()
            .ok()
            .and_then(|guard| guard.get(scope.label()).cloned())
            .unwrap_or_default()
    }

    fn record_call(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls
            .lock()
            .map_err(StoreError::unavailable)?
            .push(call);
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load_all(&self, scope: &Scope) -> Result<ProgressMap, StoreError> {
        self.record_call(StoreCall::LoadAll)?;
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StoreError::BackendUnavailable("simulated load failure".into()));
        }
        Ok(self.snapshot_for(scope))
    }

    async fn upsert_complete(
        &self,
        scope: &Scope,
        day: u32,
        notes: &str,
        completed_at: NaiveDate,
    ) -> Result<ProgressRecord, StoreError> {
        self.record_call(StoreCall::UpsertComplete {
            day,
            notes: notes.to_string(),
        })?;
        self.check_writes()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = ProgressRecord::completed(day, notes, completed_at)
            .with_record_id(RecordId::new(id.to_string()));
        self.records
            .lock()
            .map_err(StoreError::unavailable)?
            .entry(scope.label().to_string())
            .or_default()
            .insert(day, record.clone());
        Ok(record)
    }

    async fn delete_day(
        &self,
        scope: &Scope,
        day: u32,
        record_id: Option<&RecordId>,
    ) -> Result<(), StoreError> {
        self.record_call(StoreCall::DeleteDay {
            day,
            record_id: record_id.cloned(),
        })?;
        self.check_writes()?;

        let mut guard = self.records.lock().map_err(StoreError::unavailable)?;
        let records = guard.entry(scope.label().to_string()).or_default();
        let matches = records
            .get(&day)
            .is_some_and(|record| record.record_id.as_ref() == record_id);
        if !matches {
            return Err(StoreError::RecordNotFound(day));
        }
        records.remove(&day);
        Ok(())
    }
}
