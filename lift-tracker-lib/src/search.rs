//src/search.rs
use crate::model::{normalize_name, Exercise};
use crate::store::Store;

/// Exercises sorted by name (case-insensitive), optionally filtered by a
/// case-insensitive substring of the name.
pub fn search_exercises<'a>(store: &'a Store, query: &str) -> Vec<&'a Exercise> {
    let needle = normalize_name(query);
    let mut found: Vec<&Exercise> = store
        .exercises()
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .collect();
    found.sort_by_cached_key(|e| (e.name.to_lowercase(), e.id));
    found
}

/// Whether a search should offer to create a new exercise named after the query:
/// the trimmed query is non-empty and matches no existing name.
pub fn should_offer_create(store: &Store, query: &str) -> bool {
    !query.trim().is_empty() && store.find_exercise_by_name(query).is_none()
}
