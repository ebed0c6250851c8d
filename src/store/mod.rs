//! Durable storage of progress records.
//!
//! Two interchangeable backends implement [`ProgressStore`]: a device-local
//! JSON blob and a remote per-user record table. The backend is chosen once
//! at startup and never mixed.

pub mod local;
pub mod memory;
pub mod remote;

use crate::errors::StoreError;
use crate::identity::Identity;
use crate::models::{ProgressMap, ProgressRecord, RecordId};
use async_trait::async_trait;
use chrono::NaiveDate;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use remote::{RemoteConfig, RemoteStore};

/// Whose records a store call touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Records belong to this device; the local backend's only scope.
    Device,
    /// Records belong to a signed-in user.
    User(Identity),
}

impl Scope {
    pub fn label(&self) -> &str {
        match self {
            Scope::Device => "device",
            Scope::User(identity) => identity.user_id.as_str(),
        }
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fetch every record stored for `scope`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the medium cannot be read,
    /// or `StoreError::IdentityMissing` if the backend needs a user scope.
    async fn load_all(&self, scope: &Scope) -> Result<ProgressMap, StoreError>;

    /// Store `day` as completed on `completed_at` with `notes`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::BackendUnavailable` if the write fails.
    async fn upsert_complete(
        &self,
        scope: &Scope,
        day: u32,
        notes: &str,
        completed_at: NaiveDate,
    ) -> Result<ProgressRecord, StoreError>;

    /// Remove the record for `day`. Backends that key records by their own
    /// identifier need `record_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RecordNotFound` if nothing was stored for `day`.
    async fn delete_day(
        &self,
        scope: &Scope,
        day: u32,
        record_id: Option<&RecordId>,
    ) -> Result<(), StoreError>;
}
