//src/cleanup.rs
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::model::ExerciseId;
use crate::store::{Store, StoreError};

/// One group of exercises whose names collided after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGroup {
    pub normalized_name: String,
    pub kept: ExerciseId,
    pub removed: Vec<ExerciseId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub groups: Vec<MergedGroup>,
    pub removed_sets: usize,
}

impl CleanupReport {
    pub fn removed_exercises(&self) -> usize {
        self.groups.iter().map(|g| g.removed.len()).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Merges exercises whose names are equal once trimmed and case-folded.
///
/// In each group the exercise with the most sets (soft-deleted ones count)
/// is kept unchanged, name included; the others are deleted with their sets.
/// On equal set counts the lowest id, i.e. the oldest record, is kept.
/// Running it again on the result changes nothing.
/// # Errors
/// Only if the store loses a record mid-pass, which a single writer rules out.
pub fn run_duplicate_cleanup(store: &mut Store) -> Result<CleanupReport, StoreError> {
    let mut grouped: BTreeMap<String, Vec<(usize, ExerciseId)>> = BTreeMap::new();
    for exercise in store.exercises() {
        let usage = store.all_sets_of_exercise(exercise.id).count();
        grouped
            .entry(exercise.normalized_name())
            .or_default()
            .push((usage, exercise.id));
    }

    let mut report = CleanupReport::default();
    for (normalized_name, mut members) in grouped {
        if members.len() < 2 {
            continue;
        }
        debug!(name = %normalized_name, count = members.len(), "Found duplicate exercises");
        // Most used first; ids ascend within equal usage
        members.sort_by(|(usage_a, id_a), (usage_b, id_b)| {
            usage_b.cmp(usage_a).then(id_a.cmp(id_b))
        });

        let kept = members[0].1;
        let mut removed = Vec::with_capacity(members.len() - 1);
        for &(usage, id) in &members[1..] {
            report.removed_sets += store.delete_exercise(id)?;
            debug!(exercise = %id, sets = usage, kept = %kept, "Deleted duplicate exercise");
            removed.push(id);
        }
        report.groups.push(MergedGroup {
            normalized_name,
            kept,
            removed,
        });
    }

    if !report.is_noop() {
        info!(
            removed = report.removed_exercises(),
            groups = report.groups.len(),
            "Duplicate cleanup complete"
        );
    }
    Ok(report)
}
