use crate::models::{DailyCompletions, ProgressMap, StatsResponse};
use crate::reconcile::{completion_ratio, today, Tracker};
use chrono::{Duration, NaiveDate};

pub fn build_stats(tracker: &Tracker) -> StatsResponse {
    build_stats_at(
        today(),
        tracker.progress(),
        tracker.curriculum().days().iter().map(|descriptor| descriptor.day),
    )
}

pub fn build_stats_at(
    today: NaiveDate,
    progress: &ProgressMap,
    days: impl IntoIterator<Item = u32>,
) -> StatsResponse {
    let days: Vec<u32> = days.into_iter().collect();
    let completed_dates: Vec<NaiveDate> = progress
        .values()
        .filter(|record| record.completed)
        .filter_map(|record| record.completed_at)
        .collect();

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset);
        let completed = completed_dates.iter().filter(|done| **done == date).count();
        last_7_days.push(DailyCompletions { date, completed });
    }

    let next_day = days
        .iter()
        .copied()
        .filter(|day| !progress.get(day).is_some_and(|record| record.completed))
        .min();

    StatsResponse {
        completed: progress.values().filter(|record| record.completed).count(),
        total_days: days.len(),
        percent: completion_ratio(progress, days.len()),
        next_day,
        last_completed_at: completed_dates.iter().max().copied(),
        last_7_days,
    }
}
