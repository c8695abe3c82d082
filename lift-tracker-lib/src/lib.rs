// src/lib.rs
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// --- Declare modules ---
mod cleanup;
mod config;
pub mod db;
mod defaults;
mod history;
mod lifecycle;
mod model;
mod ordering;
mod records;
mod search;
mod store;

// --- Expose public types ---
pub use cleanup::{run_duplicate_cleanup, CleanupReport, MergedGroup};
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, HeaderColor, Theme, Units,
};
pub use db::{get_db_path as get_db_path_util, DbError};
pub use defaults::smart_defaults;
pub use history::{history, session_summary, ExerciseBlock, HistoryEntry, SessionSummary, SetLine};
pub use lifecycle::{
    add_template_exercise, delete_set, finish_workout, log_set, rename_exercise, reuse_workout,
    start_workout, FinishOutcome, WorkoutError,
};
pub use model::{
    format_weight, normalize_name, Exercise, ExerciseId, ExerciseSet, SessionId, SetId,
    SetValues, WorkoutSession,
};
pub use ordering::{session_exercise_ids, session_exercises};
pub use records::{
    best_set, is_personal_record, personal_record, personal_record_display,
    personal_record_display_date, personal_record_display_date_on, relative_day_label,
    PersonalRecord,
};
pub use search::{search_exercises, should_offer_create};
pub use store::{Store, StoreError};

/// Owns the configuration, the database connection and the loaded entity store.
///
/// Reads go straight to the in-memory store. Mutations run against a copy of
/// the store which replaces the live one only after it was saved, so a failed
/// save leaves both the database and memory unchanged.
pub struct AppService {
    pub config: Config,
    pub conn: Connection,
    pub store: Store,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service from the default config and data locations.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;

        Self::from_parts(config, conn, db_path, config_path)
    }

    /// Builds a service over an already opened connection: creates the schema,
    /// loads the store and, if configured, merges duplicate exercises.
    /// # Errors
    /// Returns `anyhow::Error` if the schema, load, or startup cleanup fails.
    pub fn from_parts(
        config: Config,
        conn: Connection,
        db_path: PathBuf,
        config_path: PathBuf,
    ) -> Result<Self> {
        db::init_db(&conn).context("Failed to initialize database schema")?;
        let store = db::load_store(&conn).context("Failed to load workout data")?;

        let mut service = Self {
            config,
            conn,
            store,
            db_path,
            config_path,
        };

        if service.config.cleanup_duplicates_on_startup {
            let report = service.run_duplicate_cleanup()?;
            if !report.is_noop() {
                info!(
                    removed = report.removed_exercises(),
                    "Merged duplicate exercises on startup"
                );
            }
        }
        Ok(service)
    }

    /// Applies `change` to a copy of the store, saves it, then swaps it in.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Store) -> Result<T>) -> Result<T> {
        let mut draft = self.store.clone();
        let outcome = change(&mut draft)?;
        db::save_store(&mut self.conn, &draft).context("Failed to save workout data")?;
        self.store = draft;
        Ok(outcome)
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    pub const fn weight_label(&self) -> &'static str {
        self.config.units.weight_label()
    }

    // ---- Exercises ----

    /// Resolves an identifier (numeric ID first, then trimmed case-insensitive name).
    /// # Errors
    /// Returns `anyhow::Error` if the identifier is empty.
    pub fn resolve_exercise(&self, identifier: &str) -> Result<Option<&Exercise>> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            bail!("Exercise identifier cannot be empty.");
        }
        if let Ok(id) = trimmed.parse::<i64>() {
            if let Some(exercise) = self.store.exercise(ExerciseId(id)) {
                return Ok(Some(exercise));
            }
        }
        Ok(self.store.find_exercise_by_name(trimmed))
    }

    /// Like [`Self::resolve_exercise`] but a missing exercise is an error.
    /// # Errors
    /// Returns `anyhow::Error` if nothing matches.
    pub fn require_exercise(&self, identifier: &str) -> Result<ExerciseId> {
        self.resolve_exercise(identifier)?
            .map(|exercise| exercise.id)
            .ok_or_else(|| anyhow::anyhow!("Exercise '{}' not found.", identifier.trim()))
    }

    /// Creates a new exercise.
    /// # Errors
    /// Returns `anyhow::Error` if the name is empty, already taken, or saving fails.
    pub fn create_exercise(&mut self, name: &str) -> Result<ExerciseId> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!(WorkoutError::EmptyExerciseName);
        }
        if let Some(existing) = self.store.find_exercise_by_name(trimmed) {
            bail!(
                "Exercise '{}' already exists (ID {}).",
                existing.name,
                existing.id
            );
        }
        self.mutate(|store| Ok(store.create_exercise(trimmed)))
    }

    /// Resolves an exercise by identifier, creating it by name if nothing matches.
    /// # Errors
    /// Returns `anyhow::Error` if the identifier is empty or saving fails.
    pub fn find_or_create_exercise(&mut self, identifier: &str) -> Result<ExerciseId> {
        match self.resolve_exercise(identifier)? {
            Some(exercise) => Ok(exercise.id),
            None => {
                info!(name = identifier.trim(), "Creating exercise on first use");
                self.create_exercise(identifier)
            }
        }
    }

    /// Renames an exercise in place.
    /// # Errors
    /// Returns `anyhow::Error` if not found, the new name is empty or taken, or saving fails.
    pub fn rename_exercise(&mut self, identifier: &str, new_name: &str) -> Result<()> {
        let id = self.require_exercise(identifier)?;
        if let Some(other) = self.store.find_exercise_by_name(new_name) {
            if other.id != id {
                bail!("Name '{}' is already taken.", new_name.trim());
            }
        }
        self.mutate(|store| Ok(lifecycle::rename_exercise(store, id, new_name)?))
    }

    /// Deletes an exercise and all its sets. Returns the number of sets removed.
    /// # Errors
    /// Returns `anyhow::Error` if not found or saving fails.
    pub fn delete_exercise(&mut self, identifier: &str) -> Result<usize> {
        let id = self.require_exercise(identifier)?;
        let removed = self.mutate(|store| Ok(store.delete_exercise(id)?))?;
        if removed > 0 {
            warn!(exercise = %id, sets = removed, "Deleted exercise together with its sets");
        }
        Ok(removed)
    }

    pub fn search_exercises(&self, query: &str) -> Vec<&Exercise> {
        search::search_exercises(&self.store, query)
    }

    pub fn should_offer_create(&self, query: &str) -> bool {
        search::should_offer_create(&self.store, query)
    }

    // ---- Records ----

    pub fn personal_record(&self, exercise_id: ExerciseId) -> Option<PersonalRecord> {
        records::personal_record(&self.store, exercise_id)
    }

    pub fn is_personal_record(&self, set_id: SetId) -> bool {
        records::is_personal_record(&self.store, set_id)
    }

    pub fn personal_record_display(&self, exercise_id: ExerciseId) -> String {
        records::personal_record_display(&self.store, exercise_id)
    }

    pub fn personal_record_display_date(&self, exercise_id: ExerciseId) -> String {
        records::personal_record_display_date(&self.store, exercise_id)
    }

    // ---- Workouts ----

    pub fn active_session(&self) -> Option<&WorkoutSession> {
        self.store.active_session()
    }

    /// # Errors
    /// Returns `anyhow::Error` if no workout is in progress.
    pub fn require_active_session(&self) -> Result<SessionId> {
        self.active_session()
            .map(|session| session.id)
            .ok_or_else(|| anyhow::anyhow!("No workout in progress. Start one with 'start'."))
    }

    /// # Errors
    /// Returns `anyhow::Error` if a workout is already active or saving fails.
    pub fn start_workout(&mut self, name: &str) -> Result<SessionId> {
        self.mutate(|store| Ok(lifecycle::start_workout(store, name, Utc::now())?))
    }

    /// # Errors
    /// Returns `anyhow::Error` if the session is unknown, already finished, or saving fails.
    pub fn finish_workout(&mut self, session_id: SessionId) -> Result<FinishOutcome> {
        self.mutate(|store| Ok(lifecycle::finish_workout(store, session_id)?))
    }

    /// # Errors
    /// Returns `anyhow::Error` if the source is unknown or active, another
    /// workout is active, or saving fails.
    pub fn reuse_workout(&mut self, source_id: SessionId) -> Result<SessionId> {
        self.mutate(|store| Ok(lifecycle::reuse_workout(store, source_id, Utc::now())?))
    }

    /// Adds an exercise placeholder (created on first use) to a session.
    /// Returns the exercise and whether it was newly added.
    /// # Errors
    /// Returns `anyhow::Error` if the session is unknown or saving fails.
    pub fn add_template_exercise(
        &mut self,
        session_id: SessionId,
        exercise_identifier: &str,
    ) -> Result<(ExerciseId, bool)> {
        let exercise_id = self.find_or_create_exercise(exercise_identifier)?;
        let added = self.mutate(|store| {
            Ok(lifecycle::add_template_exercise(store, session_id, exercise_id)?)
        })?;
        Ok((exercise_id, added))
    }

    /// # Errors
    /// Returns `anyhow::Error` for invalid values, unknown ids, or a failed save.
    pub fn log_set(
        &mut self,
        session_id: SessionId,
        exercise_id: ExerciseId,
        weight: f64,
        reps: u32,
    ) -> Result<SetId> {
        self.mutate(|store| {
            Ok(lifecycle::log_set(
                store,
                session_id,
                exercise_id,
                weight,
                reps,
                Utc::now(),
            )?)
        })
    }

    /// Logs a set against an exercise identifier, creating the exercise on first
    /// use. Both happen in one save, so a rejected set creates nothing.
    /// # Errors
    /// Returns `anyhow::Error` for an empty identifier, invalid values, an
    /// unknown session, or a failed save.
    pub fn log_set_for(
        &mut self,
        session_id: SessionId,
        exercise_identifier: &str,
        weight: f64,
        reps: u32,
    ) -> Result<(ExerciseId, SetId)> {
        let existing = self.resolve_exercise(exercise_identifier)?.map(|e| e.id);
        let name = exercise_identifier.trim();
        self.mutate(|store| {
            let exercise_id = match existing {
                Some(id) => id,
                None => {
                    info!(exercise = name, "Creating exercise on first use");
                    store.create_exercise(name)
                }
            };
            let set_id =
                lifecycle::log_set(store, session_id, exercise_id, weight, reps, Utc::now())?;
            Ok((exercise_id, set_id))
        })
    }

    /// Soft-deletes a set.
    /// # Errors
    /// Returns `anyhow::Error` if the set is unknown or saving fails.
    pub fn delete_set(&mut self, set_id: SetId) -> Result<()> {
        self.mutate(|store| Ok(lifecycle::delete_set(store, set_id)?))
    }

    /// Deletes a workout and its sets. Returns the number of sets removed.
    /// # Errors
    /// Returns `anyhow::Error` if the session is unknown or saving fails.
    pub fn delete_workout(&mut self, session_id: SessionId) -> Result<usize> {
        self.mutate(|store| Ok(store.delete_session(session_id)?))
    }

    pub fn session_exercises(&self, session_id: SessionId) -> Vec<&Exercise> {
        ordering::session_exercises(&self.store, session_id)
    }

    pub fn smart_defaults(&self, session_id: SessionId, exercise_id: ExerciseId) -> Option<SetValues> {
        defaults::smart_defaults(&self.store, session_id, exercise_id)
    }

    /// # Errors
    /// Returns `anyhow::Error` if the session is unknown.
    pub fn session_summary(&self, session_id: SessionId) -> Result<SessionSummary> {
        history::session_summary(&self.store, session_id).map_err(Into::into)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        history::history(&self.store)
    }

    // ---- Maintenance ----

    /// Merges duplicate exercises. Saves only when something changed.
    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn run_duplicate_cleanup(&mut self) -> Result<CleanupReport> {
        let mut draft = self.store.clone();
        let report = cleanup::run_duplicate_cleanup(&mut draft)?;
        if !report.is_noop() {
            db::save_store(&mut self.conn, &draft).context("Failed to save cleaned-up data")?;
            self.store = draft;
        }
        Ok(report)
    }

    /// Physically removes soft-deleted sets.
    /// # Errors
    /// Returns `anyhow::Error` if saving fails.
    pub fn purge_deleted_sets(&mut self) -> Result<usize> {
        self.mutate(|store| Ok(store.purge_deleted_sets()))
    }
}
