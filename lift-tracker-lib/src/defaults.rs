//src/defaults.rs
use crate::model::{ExerciseId, SessionId, SetValues};
use crate::records::personal_record;
use crate::store::Store;

/// Suggests starting values for a new set of `exercise_id` in `session_id`.
///
/// The latest live set of that exercise in the same session wins (latest
/// timestamp, later id on a tie). Without one, the exercise's personal record
/// is used. `None` means there is nothing to pre-fill.
pub fn smart_defaults(
    store: &Store,
    session_id: SessionId,
    exercise_id: ExerciseId,
) -> Option<SetValues> {
    store
        .live_sets_of_session(session_id)
        .filter(|set| set.exercise_id == exercise_id)
        .max_by_key(|set| (set.timestamp, set.id))
        .map(|set| set.values())
        .or_else(|| personal_record(store, exercise_id).map(|pr| pr.values))
}
