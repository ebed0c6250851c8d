use crate::models::DayDescriptor;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

pub const MAX_DAY: u32 = 100;

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("failed to read curriculum {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse curriculum: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("curriculum has no days")]
    Empty,
    #[error("day {0} appears more than once")]
    DuplicateDay(u32),
    #[error("day {0} is outside 1..=100")]
    DayOutOfRange(u32),
}

/// The fixed, ordered list of days. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Curriculum {
    days: Vec<DayDescriptor>,
}

impl Curriculum {
    pub fn new(mut days: Vec<DayDescriptor>) -> Result<Self, CurriculumError> {
        if days.is_empty() {
            return Err(CurriculumError::Empty);
        }

        let mut seen = BTreeSet::new();
        for descriptor in &days {
            if descriptor.day == 0 || descriptor.day > MAX_DAY {
                return Err(CurriculumError::DayOutOfRange(descriptor.day));
            }
            if !seen.insert(descriptor.day) {
                return Err(CurriculumError::DuplicateDay(descriptor.day));
            }
        }

        days.sort_by_key(|descriptor| descriptor.day);
        Ok(Self { days })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, CurriculumError> {
        let days: Vec<DayDescriptor> = serde_json::from_slice(bytes)?;
        Self::new(days)
    }

    pub fn days(&self) -> &[DayDescriptor] {
        &self.days
    }

    pub fn get(&self, day: u32) -> Option<&DayDescriptor> {
        self.days
            .binary_search_by_key(&day, |descriptor| descriptor.day)
            .ok()
            .map(|index| &self.days[index])
    }

    pub fn contains(&self, day: u32) -> bool {
        self.get(day).is_some()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

pub async fn load_curriculum(path: &Path) -> Result<Curriculum, CurriculumError> {
    let bytes = fs::read(path).await.map_err(|source| CurriculumError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Curriculum::from_json(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(day: u32) -> DayDescriptor {
        DayDescriptor {
            day,
            topic: format!("Topic {day}"),
        }
    }

    #[test]
    fn days_are_sorted_ascending() {
        let curriculum = Curriculum::new(vec![descriptor(3), descriptor(1), descriptor(2)]).unwrap();
        let days: Vec<u32> = curriculum.days().iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 2, 3]);
        assert_eq!(curriculum.get(2).map(|d| d.topic.as_str()), Some("Topic 2"));
        assert!(!curriculum.contains(4));
    }

    #[test]
    fn rejects_duplicates_and_out_of_range() {
        assert!(matches!(
            Curriculum::new(vec![descriptor(1), descriptor(1)]),
            Err(CurriculumError::DuplicateDay(1))
        ));
        assert!(matches!(
            Curriculum::new(vec![descriptor(0)]),
            Err(CurriculumError::DayOutOfRange(0))
        ));
        assert!(matches!(
            Curriculum::new(vec![descriptor(101)]),
            Err(CurriculumError::DayOutOfRange(101))
        ));
        assert!(matches!(Curriculum::new(Vec::new()), Err(CurriculumError::Empty)));
    }

    #[test]
    fn parses_json_array() {
        let json = br#"[{"day": 2, "topic": "Ownership"}, {"day": 1, "topic": "Setup"}]"#;
        let curriculum = Curriculum::from_json(json).unwrap();
        assert_eq!(curriculum.len(), 2);
        assert_eq!(curriculum.days()[0].topic, "Setup");
    }

    #[tokio::test]
    async fn shipped_curriculum_has_one_hundred_days() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/days.json");
        let curriculum = load_curriculum(&path).await.unwrap();
        assert_eq!(curriculum.len(), 100);
        assert_eq!(curriculum.days()[0].day, 1);
        assert_eq!(curriculum.days()[99].day, 100);
    }
}
