// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Track strength workouts, sets and personal records", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print tabular output as CSV instead of a table
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new workout
    Start {
        /// Optional workout name (e.g., "Push Day")
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// Start a new workout with the exercises of a finished one
    Reuse {
        /// ID of the finished workout to copy
        session: i64,
    },
    /// Add an exercise placeholder to the active workout
    AddExercise {
        /// Exercise name or ID (created if it doesn't exist)
        exercise: String,
    },
    /// Log a set in the active workout
    Log {
        /// Exercise name or ID (created if it doesn't exist)
        exercise: String,
        /// Weight lifted; defaults to the suggested value
        #[arg(short, long)]
        weight: Option<f64>,
        /// Repetitions; defaults to the suggested value
        #[arg(short, long)]
        reps: Option<u32>,
    },
    /// Remove a logged set
    DeleteSet {
        /// ID of the set
        id: i64,
    },
    /// Finish the active workout (cancels it if nothing was logged)
    Finish,
    /// Show a workout (the active one by default)
    Show {
        /// Workout ID
        session: Option<i64>,
    },
    /// List finished workouts, most recent first
    History,
    /// List exercises with their personal records
    Exercises {
        /// Only show exercises whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Rename an exercise
    RenameExercise {
        /// Exercise name or ID
        exercise: String,
        /// New name
        name: String,
    },
    /// Delete an exercise and all of its sets
    DeleteExercise {
        /// Exercise name or ID
        exercise: String,
    },
    /// Delete a workout and all of its sets
    DeleteWorkout {
        /// Workout ID
        session: i64,
    },
    /// Show the personal record of an exercise
    Pr {
        /// Exercise name or ID
        exercise: String,
    },
    /// Show the suggested weight and reps for the next set of an exercise
    Defaults {
        /// Exercise name or ID
        exercise: String,
    },
    /// Merge exercises whose names differ only in case or surrounding whitespace
    Cleanup,
    /// Permanently remove deleted sets
    Purge,
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion script
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
