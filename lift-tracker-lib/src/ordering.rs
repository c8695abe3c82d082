//src/ordering.rs
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::model::{Exercise, ExerciseId, SessionId, SetId};
use crate::store::Store;

/// Sort key for an exercise within a session.
///
/// Variant order matters: every logged exercise sorts before every
/// template-only exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Logged {
        first_set_at: DateTime<Utc>,
        first_set: SetId,
    },
    Template {
        position: usize,
    },
}

/// Exercises "in" a session: those with live sets, ordered by their first set,
/// then template exercises that have no live set yet, in template order.
/// No exercise appears twice.
pub fn session_exercises(store: &Store, session_id: SessionId) -> Vec<&Exercise> {
    let mut slots: HashMap<ExerciseId, SlotKey> = HashMap::new();

    for set in store.live_sets_of_session(session_id) {
        let key = SlotKey::Logged {
            first_set_at: set.timestamp,
            first_set: set.id,
        };
        slots
            .entry(set.exercise_id)
            .and_modify(|current| *current = (*current).min(key))
            .or_insert(key);
    }

    if let Some(session) = store.session(session_id) {
        for (position, exercise_id) in session.templates.iter().enumerate() {
            // Logged exercises keep their set slot; repeated templates keep the first position.
            slots
                .entry(*exercise_id)
                .or_insert(SlotKey::Template { position });
        }
    }

    let mut ordered: Vec<(SlotKey, &Exercise)> = slots
        .into_iter()
        .filter_map(|(id, key)| store.exercise(id).map(|exercise| (key, exercise)))
        .collect();
    ordered.sort_by_key(|(key, _)| *key);
    ordered.into_iter().map(|(_, exercise)| exercise).collect()
}

/// Ids of [`session_exercises`], in the same order.
pub fn session_exercise_ids(store: &Store, session_id: SessionId) -> Vec<ExerciseId> {
    session_exercises(store, session_id)
        .into_iter()
        .map(|exercise| exercise.id)
        .collect()
}
