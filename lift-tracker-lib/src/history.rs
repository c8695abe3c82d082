//src/history.rs
use chrono::{DateTime, Utc};

use crate::model::{ExerciseId, ExerciseSet, SessionId, SetId, SetValues};
use crate::ordering::session_exercises;
use crate::records::{is_personal_record, personal_record};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct SetLine {
    pub set_id: SetId,
    pub values: SetValues,
    pub timestamp: DateTime<Utc>,
    pub is_personal_record: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseBlock {
    pub exercise_id: ExerciseId,
    pub name: String,
    /// Live sets of this exercise in the session, oldest first. Empty for templates.
    pub sets: Vec<SetLine>,
    /// The exercise's all-time record, which may come from another session.
    pub personal_record: Option<SetValues>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub name: String,
    pub date: DateTime<Utc>,
    pub is_active: bool,
    pub total_sets: usize,
    pub exercises: Vec<ExerciseBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub session_id: SessionId,
    pub name: String,
    pub date: DateTime<Utc>,
    pub exercise_count: usize,
    pub set_count: usize,
}

fn sorted_live_sets(store: &Store, session_id: SessionId, exercise_id: ExerciseId) -> Vec<&ExerciseSet> {
    let mut sets: Vec<&ExerciseSet> = store
        .live_sets_of_session(session_id)
        .filter(|set| set.exercise_id == exercise_id)
        .collect();
    sets.sort_by_key(|set| (set.timestamp, set.id));
    sets
}

/// Builds the per-exercise breakdown of a session.
/// # Errors
/// `SessionNotFound` if the id is unknown.
pub fn session_summary(store: &Store, session_id: SessionId) -> Result<SessionSummary, StoreError> {
    let session = store
        .session(session_id)
        .ok_or(StoreError::SessionNotFound(session_id))?;

    let exercises = session_exercises(store, session_id)
        .into_iter()
        .map(|exercise| ExerciseBlock {
            exercise_id: exercise.id,
            name: exercise.name.clone(),
            sets: sorted_live_sets(store, session_id, exercise.id)
                .into_iter()
                .map(|set| SetLine {
                    set_id: set.id,
                    values: set.values(),
                    timestamp: set.timestamp,
                    is_personal_record: is_personal_record(store, set.id),
                })
                .collect(),
            personal_record: personal_record(store, exercise.id).map(|pr| pr.values),
        })
        .collect();

    Ok(SessionSummary {
        session_id,
        name: session.name.clone(),
        date: session.date,
        is_active: session.is_active,
        total_sets: store.live_sets_of_session(session_id).count(),
        exercises,
    })
}

/// Finished workouts, most recent first.
pub fn history(store: &Store) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = store
        .sessions()
        .filter(|session| !session.is_active)
        .map(|session| HistoryEntry {
            session_id: session.id,
            name: session.name.clone(),
            date: session.date,
            exercise_count: session_exercises(store, session.id).len(),
            set_count: store.live_sets_of_session(session.id).count(),
        })
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.session_id.cmp(&a.session_id)));
    entries
}
