//! Reconciles the curriculum, the in-memory progress map and the store.

use crate::curriculum::Curriculum;
use crate::errors::{StoreError, ToggleError};
use crate::identity::Identity;
use crate::models::{DayDescriptor, DayState, ProgressMap, ViewModel};
use crate::store::{ProgressStore, Scope};
use chrono::{NaiveDate, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Build one view model per curriculum day, ordered by day number.
pub fn build_view_models(descriptors: &[DayDescriptor], progress: &ProgressMap) -> Vec<ViewModel> {
    let mut views: Vec<ViewModel> = descriptors
        .iter()
        .map(|descriptor| ViewModel::from_state(descriptor, DayState::of(progress, descriptor.day)))
        .collect();
    views.sort_by_key(|view| view.day);
    views
}

/// Percentage of `total_days` that are complete. Not clamped.
pub fn completion_ratio(progress: &ProgressMap, total_days: usize) -> f64 {
    if total_days == 0 {
        return 0.0;
    }
    let completed = progress.values().filter(|record| record.completed).count();
    completed as f64 / total_days as f64 * 100.0
}

/// The calendar date completions are stamped with.
///
/// UTC, so a server and its clients agree regardless of the host's zone.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Outcome of toggling one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Completed(ViewModel),
    Reopened(ViewModel),
}

impl Transition {
    pub fn view(&self) -> &ViewModel {
        match self {
            Transition::Completed(view) | Transition::Reopened(view) => view,
        }
    }

    pub fn into_view(self) -> ViewModel {
        match self {
            Transition::Completed(view) | Transition::Reopened(view) => view,
        }
    }
}

/// One user's (or device's) progress for the lifetime of a session.
///
/// The map is a cache over the store; every mutation goes through
/// [`Tracker::toggle`] and is only applied after the store accepts it.
pub struct Tracker {
    curriculum: Arc<Curriculum>,
    store: Arc<dyn ProgressStore>,
    scope: Scope,
    progress: ProgressMap,
    timeout: Option<Duration>,
}

impl Tracker {
    /// Load all progress for `scope`. A failed load starts from an empty map.
    pub async fn open(
        curriculum: Arc<Curriculum>,
        store: Arc<dyn ProgressStore>,
        scope: Scope,
        timeout: Option<Duration>,
    ) -> Self {
        let loaded = with_timeout(timeout, store.load_all(&scope)).await;
        let progress = match loaded {
            Ok(progress) => retain_known(&curriculum, progress),
            Err(err) => {
                error!(scope = scope.label(), "failed to load progress, starting empty: {err}");
                ProgressMap::new()
            }
        };
        info!(scope = scope.label(), completed = progress.len(), "progress loaded");

        Self {
            curriculum,
            store,
            scope,
            progress,
            timeout,
        }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Swap in a fresher access token for the user this tracker belongs to.
    pub fn reauthorize(&mut self, identity: Identity) {
        self.scope = Scope::User(identity);
    }

    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    pub fn state(&self, day: u32) -> DayState<'_> {
        DayState::of(&self.progress, day)
    }

    pub fn view_models(&self) -> Vec<ViewModel> {
        build_view_models(self.curriculum.days(), &self.progress)
    }

    pub fn view(&self, day: u32) -> Option<ViewModel> {
        self.curriculum
            .get(day)
            .map(|descriptor| ViewModel::from_state(descriptor, self.state(day)))
    }

    pub fn completion_ratio(&self) -> f64 {
        completion_ratio(&self.progress, self.curriculum.len())
    }

    /// Flip `day` between incomplete and complete, dated [`today`].
    pub async fn toggle(&mut self, day: u32, notes: &str) -> Result<Transition, ToggleError> {
        self.toggle_on(day, notes, today()).await
    }

    /// Flip `day`, stamping a completion with `today`.
    ///
    /// On error the map is left exactly as it was.
    pub async fn toggle_on(
        &mut self,
        day: u32,
        notes: &str,
        today: NaiveDate,
    ) -> Result<Transition, ToggleError> {
        let descriptor = self
            .curriculum
            .get(day)
            .cloned()
            .ok_or(ToggleError::UnknownDay(day))?;

        match self.state(day) {
            DayState::Incomplete => {
                let record = with_timeout(
                    self.timeout,
                    self.store.upsert_complete(&self.scope, day, notes, today),
                )
                .await?;
                self.progress.insert(day, record);
                info!(day, "marked day complete");
                Ok(Transition::Completed(ViewModel::from_state(
                    &descriptor,
                    self.state(day),
                )))
            }
            DayState::Complete(record) => {
                let record_id = record.record_id.clone();
                let deleted = with_timeout(
                    self.timeout,
                    self.store.delete_day(&self.scope, day, record_id.as_ref()),
                )
                .await;
                match deleted {
                    Ok(()) => {}
                    Err(StoreError::RecordNotFound(_)) => {
                        warn!(day, "progress record already gone");
                    }
                    Err(err) => return Err(err.into()),
                }
                self.progress.remove(&day);
                info!(day, "reopened day");
                Ok(Transition::Reopened(ViewModel::from_state(
                    &descriptor,
                    DayState::Incomplete,
                )))
            }
        }
    }
}

fn retain_known(curriculum: &Curriculum, mut progress: ProgressMap) -> ProgressMap {
    progress.retain(|day, record| {
        if !curriculum.contains(*day) {
            warn!(day, "dropping progress for a day outside the curriculum");
            return false;
        }
        if !record.completed {
            warn!(day, "dropping progress record that is not complete");
            return false;
        }
        true
    });
    progress
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            StoreError::BackendUnavailable(format!("no answer within {}s", limit.as_secs_f64()))
        })?,
        None => call.await,
    }
}
