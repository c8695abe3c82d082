//src/model.rs
use chrono::{DateTime, Utc};
use std::fmt;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(ExerciseId);
entity_id!(SessionId);
entity_id!(SetId);

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
}

impl Exercise {
    /// Builds an exercise with its display name trimmed of surrounding whitespace.
    pub fn new(id: ExerciseId, name: &str) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
        }
    }

    /// Name used to detect duplicates: trimmed and case-folded.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSet {
    pub id: SetId,
    pub exercise_id: ExerciseId,
    pub session_id: SessionId,
    pub weight: f64,
    pub reps: u32,
    pub timestamp: DateTime<Utc>,
    pub deleted: bool, // Soft delete marker, purged later by the store
}

impl ExerciseSet {
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }

    pub const fn is_live(&self) -> bool {
        !self.deleted
    }

    pub fn values(&self) -> SetValues {
        SetValues {
            weight: self.weight,
            reps: self.reps,
        }
    }

    /// e.g. "135 lbs × 5 reps"
    pub fn display_string(&self, weight_unit: &str) -> String {
        format!(
            "{} {} × {} reps",
            format_weight(self.weight),
            weight_unit,
            self.reps
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub id: SessionId,
    pub name: String,
    pub date: DateTime<Utc>,
    pub is_active: bool,
    /// Placeholder exercises added before any set was logged for them, in insertion order.
    pub templates: Vec<ExerciseId>,
}

/// A (weight, reps) pair, used for personal records and pre-filled set values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetValues {
    pub weight: f64,
    pub reps: u32,
}

impl fmt::Display for SetValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", format_weight(self.weight), self.reps)
    }
}

/// Formats a weight with at most one fractional digit, dropping it for whole numbers.
pub fn format_weight(weight: f64) -> String {
    let rounded = (weight * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}
