use crate::errors::StoreError;
use crate::identity::Identity;
use crate::models::{ProgressMap, ProgressRecord, RecordId};
use crate::store::{ProgressStore, Scope};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub anon_key: String,
    pub table: String,
}

/// Per-user progress rows in a hosted record table.
///
/// Completion is the presence of a row: completing inserts a fresh row and
/// reopening deletes it by id. Rows are never updated in place.
#[derive(Clone, Debug)]
pub struct RemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl RemoteStore {
    pub fn new(client: Client, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    fn authorized(&self, request: RequestBuilder, identity: &Identity) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&identity.access_token)
    }
}

fn signed_in(scope: &Scope) -> Result<&Identity, StoreError> {
    match scope {
        Scope::User(identity) => Ok(identity),
        Scope::Device => Err(StoreError::IdentityMissing),
    }
}

async fn rows(response: Response) -> Result<Vec<RemoteRow>, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::BackendUnavailable(format!(
            "record store answered {status}: {body}"
        )));
    }
    response.json().await.map_err(StoreError::unavailable)
}

/// Row ids come back as numbers or strings depending on the table schema.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(value) => RecordId::new(value.to_string()),
            RawId::Text(value) => RecordId::new(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteRow {
    id: RawId,
    day: u32,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    completed_at: Option<NaiveDate>,
}

impl From<RemoteRow> for ProgressRecord {
    fn from(row: RemoteRow) -> Self {
        ProgressRecord {
            day: row.day,
            completed: row.completed,
            notes: row.notes.unwrap_or_default(),
            completed_at: row.completed_at,
            record_id: Some(row.id.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewRow<'a> {
    user_id: &'a str,
    day: u32,
    completed: bool,
    notes: &'a str,
    completed_at: NaiveDate,
}

#[async_trait]
impl ProgressStore for RemoteStore {
    async fn load_all(&self, scope: &Scope) -> Result<ProgressMap, StoreError> {
        let identity = signed_in(scope)?;
        let request = self
            .client
            .get(self.table_url())
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", identity.user_id)),
                // Oldest row first per day, so the newest insert wins below.
                ("order", "day.asc,id.asc".to_string()),
            ]);
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        let mut progress = ProgressMap::new();
        for row in rows(response).await? {
            let record = ProgressRecord::from(row);
            if let Some(previous) = progress.insert(record.day, record) {
                warn!(
                    day = previous.day,
                    "multiple progress rows for one day; keeping the latest"
                );
            }
        }
        debug!(user = %identity.user_id, records = progress.len(), "loaded remote progress");
        Ok(progress)
    }

    async fn upsert_complete(
        &self,
        scope: &Scope,
        day: u32,
        notes: &str,
        completed_at: NaiveDate,
    ) -> Result<ProgressRecord, StoreError> {
        let identity = signed_in(scope)?;
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&NewRow {
                user_id: identity.user_id.as_str(),
                day,
                completed: true,
                notes,
                completed_at,
            });
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        rows(response)
            .await?
            .into_iter()
            .next()
            .map(ProgressRecord::from)
            .ok_or_else(|| StoreError::BackendUnavailable("insert returned no row".into()))
    }

    async fn delete_day(
        &self,
        scope: &Scope,
        day: u32,
        record_id: Option<&RecordId>,
    ) -> Result<(), StoreError> {
        let identity = signed_in(scope)?;
        let record_id = record_id.ok_or(StoreError::RecordNotFound(day))?;
        let request = self
            .client
            .delete(self.table_url())
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{record_id}"))]);
        let response = self
            .authorized(request, identity)
            .send()
            .await
            .map_err(StoreError::unavailable)?;

        if rows(response).await?.is_empty() {
            return Err(StoreError::RecordNotFound(day));
        }
        Ok(())
    }
}
