//src/records.rs
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::cmp::Ordering;

use crate::model::{ExerciseId, ExerciseSet, SetId, SetValues};
use crate::store::Store;

/// Number of days back for which a relative label ("N days ago") is used.
const RELATIVE_DAYS_WINDOW: i64 = 31;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonalRecord {
    pub set_id: SetId,
    pub values: SetValues,
    pub timestamp: DateTime<Utc>,
}

/// Orders two sets by volume, then by reps.
fn compare_rank(a: &ExerciseSet, b: &ExerciseSet) -> Ordering {
    a.volume()
        .partial_cmp(&b.volume())
        .unwrap_or(Ordering::Equal)
        .then(a.reps.cmp(&b.reps))
}

/// Picks the highest ranked set. Among true ties the first one seen is kept.
pub fn best_set<'a, I>(sets: I) -> Option<&'a ExerciseSet>
where
    I: IntoIterator<Item = &'a ExerciseSet>,
{
    sets.into_iter().fold(None, |best, candidate| match best {
        Some(current) if compare_rank(candidate, current) != Ordering::Greater => Some(current),
        _ => Some(candidate),
    })
}

/// The best live set of an exercise, or `None` when it has no live sets.
pub fn personal_record(store: &Store, exercise_id: ExerciseId) -> Option<PersonalRecord> {
    best_set(store.live_sets_of_exercise(exercise_id)).map(|set| PersonalRecord {
        set_id: set.id,
        values: set.values(),
        timestamp: set.timestamp,
    })
}

/// True iff the set is live, has reps, and no other live set of its exercise outranks it.
pub fn is_personal_record(store: &Store, set_id: SetId) -> bool {
    let Some(set) = store.set(set_id) else {
        return false;
    };
    if !set.is_live() || set.reps == 0 {
        return false;
    }
    !store
        .live_sets_of_exercise(set.exercise_id)
        .filter(|other| other.id != set.id)
        .any(|other| compare_rank(other, set) == Ordering::Greater)
}

/// "No history" or "<weight> × <reps>".
pub fn personal_record_display(store: &Store, exercise_id: ExerciseId) -> String {
    personal_record(store, exercise_id)
        .map_or_else(|| "No history".to_string(), |pr| pr.values.to_string())
}

/// Relative date of the PR set, measured against the local calendar.
pub fn personal_record_display_date(store: &Store, exercise_id: ExerciseId) -> String {
    personal_record_display_date_on(store, exercise_id, Local::now().date_naive())
}

/// Like [`personal_record_display_date`] with an explicit local "today".
pub fn personal_record_display_date_on(
    store: &Store,
    exercise_id: ExerciseId,
    today: NaiveDate,
) -> String {
    personal_record(store, exercise_id).map_or_else(String::new, |pr| {
        relative_day_label(pr.timestamp.with_timezone(&Local).date_naive(), today)
    })
}

/// "Today", "1 day ago" .. "31 days ago", otherwise `YYYY-MM-DD`.
/// Dates after `today` also fall back to the absolute form.
pub fn relative_day_label(date: NaiveDate, today: NaiveDate) -> String {
    let days = (today - date).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        2..=RELATIVE_DAYS_WINDOW => format!("{days} days ago"),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}
