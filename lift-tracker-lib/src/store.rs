//src/store.rs
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

use crate::model::{
    normalize_name, Exercise, ExerciseId, ExerciseSet, SessionId, SetId, WorkoutSession,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Exercise not found: ID {0}")]
    ExerciseNotFound(ExerciseId),
    #[error("Workout session not found: ID {0}")]
    SessionNotFound(SessionId),
    #[error("Set not found: ID {0}")]
    SetNotFound(SetId),
    #[error("Duplicate record ID: {0}")]
    DuplicateId(String),
    #[error("A set needs at least one rep")]
    ZeroReps,
}

/// In-memory entity store holding exercises, sessions and sets.
///
/// Sets are indexed by their owning exercise and session so that per-owner
/// queries only touch that owner's sets. Every derived computation goes
/// through the `live_sets_*` accessors, which skip soft-deleted sets.
#[derive(Debug, Default, Clone)]
pub struct Store {
    exercises: BTreeMap<ExerciseId, Exercise>,
    sessions: BTreeMap<SessionId, WorkoutSession>,
    sets: BTreeMap<SetId, ExerciseSet>,
    sets_by_exercise: HashMap<ExerciseId, BTreeSet<SetId>>,
    sets_by_session: HashMap<SessionId, BTreeSet<SetId>>,
    last_exercise_id: i64,
    last_session_id: i64,
    last_set_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Insert ----

    /// Creates an exercise; the name is trimmed.
    pub fn create_exercise(&mut self, name: &str) -> ExerciseId {
        let id = ExerciseId(next_id(&mut self.last_exercise_id));
        self.exercises.insert(id, Exercise::new(id, name));
        id
    }

    pub fn create_session(
        &mut self,
        name: &str,
        date: DateTime<Utc>,
        templates: Vec<ExerciseId>,
    ) -> SessionId {
        let id = SessionId(next_id(&mut self.last_session_id));
        self.sessions.insert(
            id,
            WorkoutSession {
                id,
                name: name.to_string(),
                date,
                is_active: true,
                templates,
            },
        );
        id
    }

    /// Attaches a new set to an existing exercise and session.
    /// # Errors
    /// `ZeroReps`, or `ExerciseNotFound` / `SessionNotFound` if either owner is unknown.
    pub fn insert_set(
        &mut self,
        session_id: SessionId,
        exercise_id: ExerciseId,
        weight: f64,
        reps: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<SetId, StoreError> {
        if reps == 0 {
            return Err(StoreError::ZeroReps);
        }
        self.check_owners(exercise_id, session_id)?;
        let id = SetId(next_id(&mut self.last_set_id));
        self.index_set(ExerciseSet {
            id,
            exercise_id,
            session_id,
            weight,
            reps,
            timestamp,
            deleted: false,
        });
        Ok(id)
    }

    // ---- Restore (verbatim, keeps persisted ids) ----

    /// Inserts an exercise exactly as persisted. The name is not re-trimmed.
    /// # Errors
    /// `DuplicateId` if the id is already taken.
    pub fn restore_exercise(&mut self, exercise: Exercise) -> Result<(), StoreError> {
        if self.exercises.contains_key(&exercise.id) {
            return Err(StoreError::DuplicateId(format!("exercise {}", exercise.id)));
        }
        self.last_exercise_id = self.last_exercise_id.max(exercise.id.0);
        self.exercises.insert(exercise.id, exercise);
        Ok(())
    }

    /// # Errors
    /// `DuplicateId` if the id is already taken.
    pub fn restore_session(&mut self, session: WorkoutSession) -> Result<(), StoreError> {
        if self.sessions.contains_key(&session.id) {
            return Err(StoreError::DuplicateId(format!("session {}", session.id)));
        }
        self.last_session_id = self.last_session_id.max(session.id.0);
        self.sessions.insert(session.id, session);
        Ok(())
    }

    /// # Errors
    /// `DuplicateId` if the id is taken, `ZeroReps`, or a not-found error if an owner is missing.
    pub fn restore_set(&mut self, set: ExerciseSet) -> Result<(), StoreError> {
        if self.sets.contains_key(&set.id) {
            return Err(StoreError::DuplicateId(format!("set {}", set.id)));
        }
        if set.reps == 0 {
            return Err(StoreError::ZeroReps);
        }
        self.check_owners(set.exercise_id, set.session_id)?;
        self.last_set_id = self.last_set_id.max(set.id.0);
        self.index_set(set);
        Ok(())
    }

    fn check_owners(
        &self,
        exercise_id: ExerciseId,
        session_id: SessionId,
    ) -> Result<(), StoreError> {
        if !self.exercises.contains_key(&exercise_id) {
            return Err(StoreError::ExerciseNotFound(exercise_id));
        }
        if !self.sessions.contains_key(&session_id) {
            return Err(StoreError::SessionNotFound(session_id));
        }
        Ok(())
    }

    fn index_set(&mut self, set: ExerciseSet) {
        self.sets_by_exercise
            .entry(set.exercise_id)
            .or_default()
            .insert(set.id);
        self.sets_by_session
            .entry(set.session_id)
            .or_default()
            .insert(set.id);
        self.sets.insert(set.id, set);
    }

    // ---- Lookup ----

    pub fn exercise(&self, id: ExerciseId) -> Option<&Exercise> {
        self.exercises.get(&id)
    }

    pub(crate) fn exercise_mut(&mut self, id: ExerciseId) -> Option<&mut Exercise> {
        self.exercises.get_mut(&id)
    }

    pub fn session(&self, id: SessionId) -> Option<&WorkoutSession> {
        self.sessions.get(&id)
    }

    pub(crate) fn session_mut(&mut self, id: SessionId) -> Option<&mut WorkoutSession> {
        self.sessions.get_mut(&id)
    }

    pub fn set(&self, id: SetId) -> Option<&ExerciseSet> {
        self.sets.get(&id)
    }

    /// Moves a set to another point in time. Its owners and values stay fixed.
    /// # Errors
    /// `SetNotFound` if the id is unknown.
    pub fn set_timestamp(&mut self, id: SetId, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let set = self.sets.get_mut(&id).ok_or(StoreError::SetNotFound(id))?;
        set.timestamp = timestamp;
        Ok(())
    }

    /// All exercises in id order.
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.exercises.values()
    }

    /// All sessions in id order.
    pub fn sessions(&self) -> impl Iterator<Item = &WorkoutSession> {
        self.sessions.values()
    }

    /// Every set, soft-deleted ones included.
    pub fn sets(&self) -> impl Iterator<Item = &ExerciseSet> {
        self.sets.values()
    }

    /// The lowest-id active session, if any.
    pub fn active_session(&self) -> Option<&WorkoutSession> {
        self.sessions.values().find(|s| s.is_active)
    }

    /// Finds an exercise whose trimmed name matches case-insensitively. Lowest id wins.
    pub fn find_exercise_by_name(&self, name: &str) -> Option<&Exercise> {
        let wanted = normalize_name(name);
        self.exercises
            .values()
            .find(|e| e.normalized_name() == wanted)
    }

    // ---- Set enumeration ----

    fn sets_with_ids<'a>(
        &'a self,
        ids: Option<&'a BTreeSet<SetId>>,
    ) -> impl Iterator<Item = &'a ExerciseSet> + 'a {
        ids.into_iter()
            .flatten()
            .filter_map(move |id| self.sets.get(id))
    }

    /// Live (not soft-deleted) sets of an exercise, across all sessions.
    pub fn live_sets_of_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> impl Iterator<Item = &ExerciseSet> {
        self.all_sets_of_exercise(exercise_id)
            .filter(|s| s.is_live())
    }

    /// All sets of an exercise, soft-deleted ones included.
    pub fn all_sets_of_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> impl Iterator<Item = &ExerciseSet> {
        self.sets_with_ids(self.sets_by_exercise.get(&exercise_id))
    }

    /// Live sets logged in a session.
    pub fn live_sets_of_session(&self, session_id: SessionId) -> impl Iterator<Item = &ExerciseSet> {
        self.all_sets_of_session(session_id).filter(|s| s.is_live())
    }

    pub fn all_sets_of_session(&self, session_id: SessionId) -> impl Iterator<Item = &ExerciseSet> {
        self.sets_with_ids(self.sets_by_session.get(&session_id))
    }

    // ---- Delete ----

    /// Marks a set as deleted. It stays reachable until purged.
    /// # Errors
    /// `SetNotFound` if the id is unknown.
    pub fn soft_delete_set(&mut self, id: SetId) -> Result<(), StoreError> {
        let set = self.sets.get_mut(&id).ok_or(StoreError::SetNotFound(id))?;
        set.deleted = true;
        Ok(())
    }

    /// Physically removes every soft-deleted set. Returns how many were removed.
    pub fn purge_deleted_sets(&mut self) -> usize {
        let doomed: Vec<SetId> = self
            .sets
            .values()
            .filter(|s| !s.is_live())
            .map(|s| s.id)
            .collect();
        for id in &doomed {
            self.remove_set(*id);
        }
        doomed.len()
    }

    /// Removes an exercise together with all its sets and template references.
    /// Returns the number of sets removed.
    /// # Errors
    /// `ExerciseNotFound` if the id is unknown.
    pub fn delete_exercise(&mut self, id: ExerciseId) -> Result<usize, StoreError> {
        if self.exercises.remove(&id).is_none() {
            return Err(StoreError::ExerciseNotFound(id));
        }
        let set_ids = self.sets_by_exercise.remove(&id).unwrap_or_default();
        for set_id in &set_ids {
            if let Some(set) = self.sets.remove(set_id) {
                if let Some(owned) = self.sets_by_session.get_mut(&set.session_id) {
                    owned.remove(set_id);
                }
            }
        }
        for session in self.sessions.values_mut() {
            session.templates.retain(|t| *t != id);
        }
        Ok(set_ids.len())
    }

    /// Removes a session together with all its sets. Returns the number of sets removed.
    /// # Errors
    /// `SessionNotFound` if the id is unknown.
    pub fn delete_session(&mut self, id: SessionId) -> Result<usize, StoreError> {
        if self.sessions.remove(&id).is_none() {
            return Err(StoreError::SessionNotFound(id));
        }
        let set_ids = self.sets_by_session.remove(&id).unwrap_or_default();
        for set_id in &set_ids {
            if let Some(set) = self.sets.remove(set_id) {
                if let Some(owned) = self.sets_by_exercise.get_mut(&set.exercise_id) {
                    owned.remove(set_id);
                }
            }
        }
        Ok(set_ids.len())
    }

    fn remove_set(&mut self, id: SetId) {
        if let Some(set) = self.sets.remove(&id) {
            if let Some(owned) = self.sets_by_exercise.get_mut(&set.exercise_id) {
                owned.remove(&id);
            }
            if let Some(owned) = self.sets_by_session.get_mut(&set.session_id) {
                owned.remove(&id);
            }
        }
    }
}
