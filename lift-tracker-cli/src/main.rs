//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lift_tracker_lib::{
    format_weight, AppService, Exercise, ExerciseId, FinishOutcome, HistoryEntry, SessionId,
    SessionSummary, SetId,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Loads config, opens the DB and merges duplicate exercises if configured
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    tracing::debug!(
        db = ?service.get_db_path(),
        config = ?service.get_config_path(),
        "Service ready"
    );
    let header_color = service.config.theme.header_color();

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }

        // --- Workout lifecycle ---
        cli::Commands::Start { name } => {
            let id = service.start_workout(&name)?;
            println!("Started workout {id}.");
        }
        cli::Commands::Reuse { session } => {
            let id = service.reuse_workout(SessionId(session))?;
            let exercises = service.session_exercises(id);
            println!(
                "Started workout {id} from workout {session} with {} exercise(s):",
                exercises.len()
            );
            for exercise in exercises {
                println!("  - {}", exercise.name);
            }
        }
        cli::Commands::AddExercise { exercise } => {
            let session_id = service.require_active_session()?;
            let (exercise_id, added) = service.add_template_exercise(session_id, &exercise)?;
            if added {
                println!(
                    "Added '{}' to workout {session_id}. Best: {}",
                    exercise_name(&service, exercise_id),
                    service.personal_record_display(exercise_id)
                );
            } else {
                println!("'{}' is already part of workout {session_id}.", exercise.trim());
            }
        }
        cli::Commands::Log {
            exercise,
            weight,
            reps,
        } => {
            let session_id = service.require_active_session()?;
            let existing = service.resolve_exercise(&exercise)?.map(|e| e.id);
            let suggested = existing.and_then(|id| service.smart_defaults(session_id, id));
            let (Some(weight), Some(reps)) = (
                weight.or(suggested.map(|v| v.weight)),
                reps.or(suggested.map(|v| v.reps)),
            ) else {
                bail!(
                    "No history for '{}'. Provide both --weight and --reps.",
                    exercise.trim()
                );
            };
            let (exercise_id, set_id) = service.log_set_for(session_id, &exercise, weight, reps)?;
            print!(
                "Logged set {set_id}: {} {} × {} reps for '{}'",
                format_weight(weight),
                service.weight_label(),
                reps,
                exercise_name(&service, exercise_id)
            );
            if service.is_personal_record(set_id) {
                print!(" 🏆 New personal record!");
            }
            println!();
        }
        cli::Commands::DeleteSet { id } => {
            service.delete_set(SetId(id))?;
            println!("Deleted set {id}.");
        }
        cli::Commands::Finish => {
            let session_id = service.require_active_session()?;
            match service.finish_workout(session_id)? {
                FinishOutcome::Cancelled => {
                    println!("Workout {session_id} had no sets and was cancelled.");
                }
                FinishOutcome::Finished { pruned_templates } => {
                    println!("Workout {session_id} finished.");
                    if pruned_templates > 0 {
                        println!("Removed {pruned_templates} unused exercise placeholder(s).");
                    }
                    let summary = service.session_summary(session_id)?;
                    print_summary(&summary, service.weight_label(), header_color, export_csv)?;
                }
            }
        }
        cli::Commands::Show { session } => {
            let session_id = match session {
                Some(id) => SessionId(id),
                None => service.require_active_session()?,
            };
            let summary = service.session_summary(session_id)?;
            print_summary(&summary, service.weight_label(), header_color, export_csv)?;
        }
        cli::Commands::History => {
            let entries = service.history();
            if entries.is_empty() {
                println!("No finished workouts yet.");
            } else if export_csv {
                print_history_csv(&entries)?;
            } else {
                print_history_table(&entries, header_color);
            }
        }
        cli::Commands::DeleteWorkout { session } => {
            let removed = service.delete_workout(SessionId(session))?;
            println!("Deleted workout {session} ({removed} set(s) removed).");
        }

        // --- Exercises ---
        cli::Commands::Exercises { search } => {
            let query = search.unwrap_or_default();
            let exercises = service.search_exercises(&query);
            if exercises.is_empty() {
                println!("No exercises found.");
            } else if export_csv {
                print_exercises_csv(&service, &exercises)?;
            } else {
                print_exercises_table(&service, &exercises, header_color);
            }
            if service.should_offer_create(&query) {
                println!(
                    "No exercise named '{}'. Log a set or use 'add-exercise' to create it.",
                    query.trim()
                );
            }
        }
        cli::Commands::RenameExercise { exercise, name } => {
            service.rename_exercise(&exercise, &name)?;
            println!("Renamed '{}' to '{}'.", exercise.trim(), name.trim());
        }
        cli::Commands::DeleteExercise { exercise } => {
            let removed = service.delete_exercise(&exercise)?;
            println!(
                "Deleted exercise '{}' ({removed} set(s) removed).",
                exercise.trim()
            );
        }
        cli::Commands::Pr { exercise } => {
            let exercise_id = service.require_exercise(&exercise)?;
            let name = exercise_name(&service, exercise_id);
            match service.personal_record(exercise_id) {
                Some(pr) => println!(
                    "{name}: {} {} × {} reps ({})",
                    format_weight(pr.values.weight),
                    service.weight_label(),
                    pr.values.reps,
                    service.personal_record_display_date(exercise_id)
                ),
                None => println!("{name}: No history"),
            }
        }
        cli::Commands::Defaults { exercise } => {
            let session_id = service.require_active_session()?;
            let exercise_id = service.require_exercise(&exercise)?;
            match service.smart_defaults(session_id, exercise_id) {
                Some(values) => println!(
                    "Suggested: {} {} × {} reps",
                    format_weight(values.weight),
                    service.weight_label(),
                    values.reps
                ),
                None => println!("No suggestion for '{}'.", exercise.trim()),
            }
        }

        // --- Maintenance ---
        cli::Commands::Cleanup => {
            let report = service.run_duplicate_cleanup()?;
            if report.is_noop() {
                println!("No duplicate exercises found.");
            } else {
                for group in &report.groups {
                    println!(
                        "'{}': kept ID {}, removed {:?}",
                        group.normalized_name,
                        group.kept,
                        group.removed.iter().map(|id| id.0).collect::<Vec<_>>()
                    );
                }
                println!(
                    "Removed {} duplicate exercise(s).",
                    report.removed_exercises()
                );
            }
        }
        cli::Commands::Purge => {
            let purged = service.purge_deleted_sets()?;
            println!("Permanently removed {purged} deleted set(s).");
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

// --- CLI Specific Helper Functions ---

fn exercise_name(service: &AppService, id: ExerciseId) -> String {
    service
        .store
        .exercise(id)
        .map_or_else(|| id.to_string(), |exercise| exercise.name.clone())
}

/// Prints a workout with one row per set, grouped by exercise.
fn print_summary(
    summary: &SessionSummary,
    weight_label: &str,
    header_color: Color,
    export_csv: bool,
) -> Result<()> {
    if export_csv {
        let mut writer = csv::Writer::from_writer(stdout());
        writer.write_record(["Exercise", "Set ID", "Time", "Weight", "Reps", "PR"])?;
        for block in &summary.exercises {
            for line in &block.sets {
                writer.write_record([
                    block.name.clone(),
                    line.set_id.to_string(),
                    line.timestamp.to_rfc3339(),
                    line.values.weight.to_string(),
                    line.values.reps.to_string(),
                    line.is_personal_record.to_string(),
                ])?;
            }
        }
        writer.flush()?;
        return Ok(());
    }

    let title = if summary.name.is_empty() {
        format!("Workout {}", summary.session_id)
    } else {
        format!("Workout {} ({})", summary.session_id, summary.name)
    };
    println!(
        "{title} on {}{} | {} exercise(s), {} set(s)",
        summary.date.with_timezone(&Local).format("%a %b %-d"),
        if summary.is_active { " [active]" } else { "" },
        summary.exercises.len(),
        summary.total_sets
    );
    if summary.exercises.is_empty() {
        println!("No exercises yet. Use 'add-exercise' or 'log' to add one.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new("ID").fg(header_color),
            Cell::new(format!("Weight ({weight_label})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("PR").fg(header_color),
            Cell::new("Best").fg(header_color),
        ]);

    for block in &summary.exercises {
        let best = block
            .personal_record
            .map_or_else(|| "No history".to_string(), |pr| pr.to_string());
        if block.sets.is_empty() {
            table.add_row(vec![
                Cell::new(&block.name),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(""),
                Cell::new(&best),
            ]);
            continue;
        }
        for (index, line) in block.sets.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if index == 0 { block.name.as_str() } else { "" }),
                Cell::new(index + 1),
                Cell::new(line.set_id.to_string()),
                Cell::new(format_weight(line.values.weight)),
                Cell::new(line.values.reps),
                Cell::new(if line.is_personal_record { "🏆" } else { "" }),
                Cell::new(if index == 0 { best.as_str() } else { "" }),
            ]);
        }
    }
    println!("{table}");
    Ok(())
}

fn print_history_table(entries: &[HistoryEntry], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Date").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
        ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.session_id.to_string()),
            Cell::new(entry.date.with_timezone(&Local).format("%a %b %-d %Y")),
            Cell::new(if entry.name.is_empty() { "-" } else { &entry.name }),
            Cell::new(entry.exercise_count),
            Cell::new(entry.set_count),
        ]);
    }
    println!("{table}");
}

fn print_history_csv(entries: &[HistoryEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(stdout());
    writer.write_record(["ID", "Date", "Name", "Exercises", "Sets"])?;
    for entry in entries {
        writer.write_record([
            entry.session_id.to_string(),
            entry.date.to_rfc3339(),
            entry.name.clone(),
            entry.exercise_count.to_string(),
            entry.set_count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_exercises_table(service: &AppService, exercises: &[&Exercise], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Best").fg(header_color),
            Cell::new("Achieved").fg(header_color),
        ]);
    for exercise in exercises {
        let achieved = service.personal_record_display_date(exercise.id);
        table.add_row(vec![
            Cell::new(exercise.id.to_string()),
            Cell::new(&exercise.name),
            Cell::new(service.personal_record_display(exercise.id)),
            Cell::new(if achieved.is_empty() { "-".to_string() } else { achieved }),
        ]);
    }
    println!("{table}");
}

fn print_exercises_csv(service: &AppService, exercises: &[&Exercise]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(stdout());
    writer.write_record(["ID", "Name", "PR Weight", "PR Reps", "PR Date"])?;
    for exercise in exercises {
        let pr = service.personal_record(exercise.id);
        writer.write_record([
            exercise.id.to_string(),
            exercise.name.clone(),
            pr.map_or_else(String::new, |pr| pr.values.weight.to_string()),
            pr.map_or_else(String::new, |pr| pr.values.reps.to_string()),
            pr.map_or_else(String::new, |pr| pr.timestamp.to_rfc3339()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
