//src/lifecycle.rs
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{ExerciseId, SessionId, SetId};
use crate::ordering::session_exercise_ids;
use crate::store::{Store, StoreError};

#[derive(Error, Debug, PartialEq)]
pub enum WorkoutError {
    #[error("Workout {0} is already finished.")]
    SessionNotActive(SessionId),
    #[error("Workout {0} is still active; finish it before reusing it.")]
    SessionStillActive(SessionId),
    #[error("Workout {0} is already in progress. Finish it first.")]
    AnotherSessionActive(SessionId),
    #[error("Invalid set: {0}")]
    InvalidSet(String),
    #[error("Exercise name cannot be empty.")]
    EmptyExerciseName,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What finishing a workout did to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// Had live sets; now inactive. Unused template placeholders were dropped.
    Finished { pruned_templates: usize },
    /// Had no live sets; the session was deleted.
    Cancelled,
}

fn ensure_no_active_session(store: &Store) -> Result<(), WorkoutError> {
    match store.active_session() {
        Some(active) => Err(WorkoutError::AnotherSessionActive(active.id)),
        None => Ok(()),
    }
}

/// Starts a new, empty, active workout.
/// # Errors
/// `AnotherSessionActive` if a workout is already in progress.
pub fn start_workout(
    store: &mut Store,
    name: &str,
    now: DateTime<Utc>,
) -> Result<SessionId, WorkoutError> {
    ensure_no_active_session(store)?;
    let id = store.create_session(name.trim(), now, Vec::new());
    info!(session = %id, "Started workout");
    Ok(id)
}

/// Finishes an active workout, or cancels it when nothing was logged.
/// # Errors
/// `SessionNotFound` or `SessionNotActive`.
pub fn finish_workout(
    store: &mut Store,
    session_id: SessionId,
) -> Result<FinishOutcome, WorkoutError> {
    let session = store
        .session(session_id)
        .ok_or(StoreError::SessionNotFound(session_id))?;
    if !session.is_active {
        return Err(WorkoutError::SessionNotActive(session_id));
    }

    let logged: HashSet<ExerciseId> = store
        .live_sets_of_session(session_id)
        .map(|set| set.exercise_id)
        .collect();

    if logged.is_empty() {
        store.delete_session(session_id)?;
        info!(session = %session_id, "Cancelled workout with no sets");
        return Ok(FinishOutcome::Cancelled);
    }

    let session = store
        .session_mut(session_id)
        .ok_or(StoreError::SessionNotFound(session_id))?;
    let before = session.templates.len();
    session.templates.retain(|id| logged.contains(id));
    let pruned_templates = before - session.templates.len();
    session.is_active = false;

    info!(session = %session_id, pruned_templates, "Finished workout");
    Ok(FinishOutcome::Finished { pruned_templates })
}

/// Starts a new workout with the same name as a finished one, carrying its
/// exercise list (not its sets) over as templates.
/// # Errors
/// `SessionNotFound`, `SessionStillActive` for an unfinished source, or
/// `AnotherSessionActive` while some workout is in progress.
pub fn reuse_workout(
    store: &mut Store,
    source_id: SessionId,
    now: DateTime<Utc>,
) -> Result<SessionId, WorkoutError> {
    let source = store
        .session(source_id)
        .ok_or(StoreError::SessionNotFound(source_id))?;
    if source.is_active {
        return Err(WorkoutError::SessionStillActive(source_id));
    }
    ensure_no_active_session(store)?;

    let name = source.name.clone();
    let templates = session_exercise_ids(store, source_id);
    let id = store.create_session(&name, now, templates);
    info!(session = %id, source = %source_id, "Reused workout");
    Ok(id)
}

/// Adds an exercise placeholder to a session. Returns `false` if it was already there.
/// # Errors
/// `SessionNotFound` / `ExerciseNotFound`.
pub fn add_template_exercise(
    store: &mut Store,
    session_id: SessionId,
    exercise_id: ExerciseId,
) -> Result<bool, WorkoutError> {
    if store.exercise(exercise_id).is_none() {
        return Err(StoreError::ExerciseNotFound(exercise_id).into());
    }
    let session = store
        .session_mut(session_id)
        .ok_or(StoreError::SessionNotFound(session_id))?;
    if session.templates.contains(&exercise_id) {
        return Ok(false);
    }
    session.templates.push(exercise_id);
    debug!(session = %session_id, exercise = %exercise_id, "Added template exercise");
    Ok(true)
}

/// Logs a set.
/// # Errors
/// `InvalidSet` for zero reps or a negative/non-finite weight; not-found errors
/// if the session or exercise is unknown.
pub fn log_set(
    store: &mut Store,
    session_id: SessionId,
    exercise_id: ExerciseId,
    weight: f64,
    reps: u32,
    now: DateTime<Utc>,
) -> Result<SetId, WorkoutError> {
    if reps == 0 {
        return Err(WorkoutError::InvalidSet("reps must be at least 1".into()));
    }
    if !weight.is_finite() || weight < 0.0 {
        return Err(WorkoutError::InvalidSet(format!(
            "weight must be a non-negative number, got {weight}"
        )));
    }
    // -0.0 would otherwise rank below 0.0 volumes
    let weight = weight.abs();
    let id = store.insert_set(session_id, exercise_id, weight, reps, now)?;
    debug!(set = %id, session = %session_id, exercise = %exercise_id, weight, reps, "Logged set");
    Ok(id)
}

/// Renames an exercise in place. Sets reference the exercise, so they see the new name.
/// # Errors
/// `EmptyExerciseName` or `ExerciseNotFound`.
pub fn rename_exercise(
    store: &mut Store,
    exercise_id: ExerciseId,
    new_name: &str,
) -> Result<(), WorkoutError> {
    let trimmed = new_name.trim();
    if trimmed.is_empty() {
        return Err(WorkoutError::EmptyExerciseName);
    }
    let exercise = store
        .exercise_mut(exercise_id)
        .ok_or(StoreError::ExerciseNotFound(exercise_id))?;
    exercise.name = trimmed.to_string();
    Ok(())
}

/// Soft-deletes a set.
/// # Errors
/// `SetNotFound`.
pub fn delete_set(store: &mut Store, set_id: SetId) -> Result<(), WorkoutError> {
    store.soft_delete_set(set_id)?;
    debug!(set = %set_id, "Soft-deleted set");
    Ok(())
}
