use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One entry of the curriculum: a day number and what to study that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDescriptor {
    pub day: u32,
    pub topic: String,
}

/// Backend-assigned identifier of a stored record.
///
/// Opaque to everything but the backend that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub day: u32,
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub completed_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
}

impl ProgressRecord {
    pub fn completed(day: u32, notes: impl Into<String>, completed_at: NaiveDate) -> Self {
        Self {
            day,
            completed: true,
            notes: notes.into(),
            completed_at: Some(completed_at),
            record_id: None,
        }
    }

    pub fn with_record_id(mut self, record_id: RecordId) -> Self {
        self.record_id = Some(record_id);
        self
    }
}

/// Sparse map of every day that has a stored record. A missing key means the
/// day is incomplete and has no notes.
pub type ProgressMap = BTreeMap<u32, ProgressRecord>;

/// Completion state of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState<'a> {
    Incomplete,
    Complete(&'a ProgressRecord),
}

impl<'a> DayState<'a> {
    pub fn of(progress: &'a ProgressMap, day: u32) -> Self {
        match progress.get(&day) {
            Some(record) if record.completed => DayState::Complete(record),
            _ => DayState::Incomplete,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DayState::Complete(_))
    }
}

/// What the page shows for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub day: u32,
    pub topic: String,
    pub completed: bool,
    pub completed_at: Option<NaiveDate>,
    pub notes: String,
}

impl ViewModel {
    pub fn from_state(descriptor: &DayDescriptor, state: DayState<'_>) -> Self {
        match state {
            DayState::Complete(record) => Self {
                day: descriptor.day,
                topic: descriptor.topic.clone(),
                completed: true,
                completed_at: record.completed_at,
                notes: record.notes.clone(),
            },
            DayState::Incomplete => Self {
                day: descriptor.day,
                topic: descriptor.topic.clone(),
                completed: false,
                completed_at: None,
                notes: String::new(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub day: ViewModel,
    pub percent: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DaysResponse {
    pub days: Vec<ViewModel>,
    pub percent: f64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub completed: usize,
    pub percent: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyCompletions {
    pub date: NaiveDate,
    pub completed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub completed: usize,
    pub total_days: usize,
    pub percent: f64,
    pub next_day: Option<u32>,
    pub last_completed_at: Option<NaiveDate>,
    pub last_7_days: Vec<DailyCompletions>,
}
