//src/db.rs
use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, Connection, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::APP_DIR;
use crate::model::{Exercise, ExerciseId, ExerciseSet, SessionId, SetId, WorkoutSession};
use crate::store::{Store, StoreError};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
    #[error("Stored data is inconsistent: {0}")]
    Inconsistent(#[from] StoreError),
}

const DB_FILE_NAME: &str = "lift_tracker.sqlite";

/// Gets the path to the SQLite database file within the app's data directory.
/// # Errors
/// `DataDir` or `Io`.
pub fn get_db_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DIR); // Same dir name as config
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
/// # Errors
/// `Connection` if SQLite cannot open the file.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    let conn = Connection::open(path).map_err(DbError::Connection)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    Ok(conn)
}

/// Initializes the database tables if they don't exist.
/// # Errors
/// `Connection` on any SQL failure.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS exercises (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL -- Stored verbatim; duplicates are merged by the cleanup pass
        );
        CREATE TABLE IF NOT EXISTS workout_sessions (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL, -- RFC3339
            is_active INTEGER NOT NULL CHECK(is_active IN (0, 1))
        );
        CREATE TABLE IF NOT EXISTS exercise_sets (
            id INTEGER PRIMARY KEY,
            exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
            session_id INTEGER NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
            weight REAL NOT NULL CHECK(weight >= 0),
            reps INTEGER NOT NULL CHECK(reps >= 1),
            timestamp TEXT NOT NULL, -- RFC3339
            deleted INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS session_templates (
            session_id INTEGER NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
            PRIMARY KEY (session_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_sets_exercise ON exercise_sets(exercise_id);
        CREATE INDEX IF NOT EXISTS idx_sets_session ON exercise_sets(session_id);",
    )
    .map_err(DbError::Connection)?;
    Ok(())
}

fn parse_timestamp(value: &str, column: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_row_to_exercise(row: &Row) -> Result<Exercise, rusqlite::Error> {
    Ok(Exercise {
        id: ExerciseId(row.get(0)?),
        name: row.get(1)?,
    })
}

fn map_row_to_session(row: &Row) -> Result<WorkoutSession, rusqlite::Error> {
    let date_str: String = row.get(2)?;
    Ok(WorkoutSession {
        id: SessionId(row.get(0)?),
        name: row.get(1)?,
        date: parse_timestamp(&date_str, 2)?,
        is_active: row.get(3)?,
        templates: Vec::new(), // Filled from session_templates
    })
}

fn map_row_to_set(row: &Row) -> Result<ExerciseSet, rusqlite::Error> {
    let timestamp_str: String = row.get(5)?;
    Ok(ExerciseSet {
        id: SetId(row.get(0)?),
        exercise_id: ExerciseId(row.get(1)?),
        session_id: SessionId(row.get(2)?),
        weight: row.get(3)?,
        reps: row.get(4)?,
        timestamp: parse_timestamp(&timestamp_str, 5)?,
        deleted: row.get(6)?,
    })
}

/// Reads every record into a fresh [`Store`].
/// # Errors
/// `QueryFailed` on SQL/mapping failures, `Inconsistent` if rows reference missing owners.
pub fn load_store(conn: &Connection) -> Result<Store, DbError> {
    let mut store = Store::new();

    let mut stmt = conn
        .prepare("SELECT id, name FROM exercises ORDER BY id")
        .map_err(DbError::QueryFailed)?;
    let exercises = stmt
        .query_map([], map_row_to_exercise)
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;
    for exercise in exercises {
        store.restore_exercise(exercise)?;
    }

    let mut templates: BTreeMap<i64, Vec<ExerciseId>> = BTreeMap::new();
    let mut stmt = conn
        .prepare("SELECT session_id, exercise_id FROM session_templates ORDER BY session_id, position")
        .map_err(DbError::QueryFailed)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, ExerciseId(row.get(1)?))))
        .map_err(DbError::QueryFailed)?;
    for row in rows {
        let (session_id, exercise_id) = row.map_err(DbError::QueryFailed)?;
        if store.exercise(exercise_id).is_none() {
            warn!(session = session_id, exercise = %exercise_id, "Dropping template for missing exercise");
            continue;
        }
        templates.entry(session_id).or_default().push(exercise_id);
    }

    let mut stmt = conn
        .prepare("SELECT id, name, date, is_active FROM workout_sessions ORDER BY id")
        .map_err(DbError::QueryFailed)?;
    let sessions = stmt
        .query_map([], map_row_to_session)
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;
    for mut session in sessions {
        session.templates = templates.remove(&session.id.0).unwrap_or_default();
        store.restore_session(session)?;
    }

    let mut stmt = conn
        .prepare(
            "SELECT id, exercise_id, session_id, weight, reps, timestamp, deleted
             FROM exercise_sets ORDER BY id",
        )
        .map_err(DbError::QueryFailed)?;
    let sets = stmt
        .query_map([], map_row_to_set)
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;
    for set in sets {
        if set.reps == 0 {
            warn!(set = %set.id, "Dropping set without reps");
            continue;
        }
        store.restore_set(set)?;
    }

    debug!(
        exercises = store.exercises().count(),
        sessions = store.sessions().count(),
        sets = store.sets().count(),
        "Loaded store"
    );
    Ok(store)
}

/// Replaces the database contents with a snapshot of `store`, in one transaction.
/// # Errors
/// `DeleteFailed` / `InsertFailed` on SQL failures; nothing is written then.
pub fn save_store(conn: &mut Connection, store: &Store) -> Result<(), DbError> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "DELETE FROM session_templates;
         DELETE FROM exercise_sets;
         DELETE FROM workout_sessions;
         DELETE FROM exercises;",
    )
    .map_err(DbError::DeleteFailed)?;

    {
        let mut insert_exercise = tx
            .prepare("INSERT INTO exercises (id, name) VALUES (?1, ?2)")
            .map_err(DbError::InsertFailed)?;
        for exercise in store.exercises() {
            insert_exercise
                .execute(params![exercise.id.0, exercise.name])
                .map_err(DbError::InsertFailed)?;
        }

        let mut insert_session = tx
            .prepare(
                "INSERT INTO workout_sessions (id, name, date, is_active)
                 VALUES (:id, :name, :date, :active)",
            )
            .map_err(DbError::InsertFailed)?;
        let mut insert_template = tx
            .prepare(
                "INSERT INTO session_templates (session_id, position, exercise_id)
                 VALUES (?1, ?2, ?3)",
            )
            .map_err(DbError::InsertFailed)?;
        for session in store.sessions() {
            insert_session
                .execute(named_params! {
                    ":id": session.id.0,
                    ":name": session.name,
                    ":date": session.date.to_rfc3339(),
                    ":active": session.is_active,
                })
                .map_err(DbError::InsertFailed)?;
            for (position, exercise_id) in session.templates.iter().enumerate() {
                insert_template
                    .execute(params![session.id.0, position as i64, exercise_id.0])
                    .map_err(DbError::InsertFailed)?;
            }
        }

        let mut insert_set = tx
            .prepare(
                "INSERT INTO exercise_sets (id, exercise_id, session_id, weight, reps, timestamp, deleted)
                 VALUES (:id, :exercise, :session, :weight, :reps, :ts, :deleted)",
            )
            .map_err(DbError::InsertFailed)?;
        for set in store.sets() {
            insert_set
                .execute(named_params! {
                    ":id": set.id.0,
                    ":exercise": set.exercise_id.0,
                    ":session": set.session_id.0,
                    ":weight": set.weight,
                    ":reps": set.reps,
                    ":ts": set.timestamp.to_rfc3339(),
                    ":deleted": set.deleted,
                })
                .map_err(DbError::InsertFailed)?;
        }
    }

    tx.commit()?;
    Ok(())
}
