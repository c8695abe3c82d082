use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use lift_tracker_lib::{
    add_template_exercise, best_set, delete_set, finish_workout, is_personal_record, log_set,
    personal_record, personal_record_display, personal_record_display_date_on,
    relative_day_label, rename_exercise, reuse_workout, run_duplicate_cleanup, search_exercises,
    session_exercise_ids, session_exercises, session_summary, should_offer_create, smart_defaults,
    start_workout, Exercise, ExerciseId, ExerciseSet, FinishOutcome, SessionId, SetId, SetValues,
    Store, StoreError, WorkoutError,
};

// Minutes after a fixed morning, so ordering in tests never depends on the clock
fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn names(exercises: &[&Exercise]) -> Vec<String> {
    exercises.iter().map(|e| e.name.clone()).collect()
}

// Store with one active session, for tests that only care about sets
fn store_with_session() -> (Store, SessionId) {
    let mut store = Store::new();
    let session = store.create_session("", at(0), Vec::new());
    (store, session)
}

// ---- Personal records ----

#[test]
fn test_pr_absent_without_live_sets() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");
    assert!(personal_record(&store, squat).is_none());
    assert_eq!(personal_record_display(&store, squat), "No history");

    let set = log_set(&mut store, session, squat, 100.0, 5, at(1))?;
    assert!(personal_record(&store, squat).is_some());

    delete_set(&mut store, set)?;
    assert!(personal_record(&store, squat).is_none());
    assert!(!is_personal_record(&store, set));
    Ok(())
}

#[test]
fn test_pr_higher_reps_same_weight() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");
    let five = log_set(&mut store, session, squat, 100.0, 5, at(1))?;
    let six = log_set(&mut store, session, squat, 100.0, 6, at(2))?;

    let pr = personal_record(&store, squat).expect("squat has sets");
    assert_eq!(pr.set_id, six);
    assert_eq!(pr.values, SetValues { weight: 100.0, reps: 6 });
    assert!(is_personal_record(&store, six));
    assert!(!is_personal_record(&store, five));
    Ok(())
}

#[test]
fn test_pr_equal_volume_prefers_more_reps() -> Result<()> {
    let (mut store, session) = store_with_session();
    let bench = store.create_exercise("Bench");
    let light = log_set(&mut store, session, bench, 100.0, 10, at(1))?;
    let heavy = log_set(&mut store, session, bench, 200.0, 5, at(2))?;

    let pr = personal_record(&store, bench).expect("bench has sets");
    assert_eq!(pr.set_id, light);
    assert_eq!(personal_record_display(&store, bench), "100 × 10");
    assert!(is_personal_record(&store, light));
    assert!(!is_personal_record(&store, heavy));
    Ok(())
}

#[test]
fn test_pr_falls_back_after_soft_delete() -> Result<()> {
    let (mut store, session) = store_with_session();
    let deadlift = store.create_exercise("Deadlift");
    let first = log_set(&mut store, session, deadlift, 140.0, 5, at(1))?;
    let best = log_set(&mut store, session, deadlift, 160.0, 5, at(2))?;
    log_set(&mut store, session, deadlift, 120.0, 5, at(3))?;

    assert_eq!(personal_record(&store, deadlift).map(|pr| pr.set_id), Some(best));
    delete_set(&mut store, best)?;
    assert_eq!(personal_record(&store, deadlift).map(|pr| pr.set_id), Some(first));
    assert!(is_personal_record(&store, first));
    Ok(())
}

#[test]
fn test_pr_spans_sessions() -> Result<()> {
    let mut store = Store::new();
    let press = store.create_exercise("Overhead Press");

    let old = start_workout(&mut store, "A", at(0))?;
    let old_best = log_set(&mut store, old, press, 60.0, 5, at(1))?;
    finish_workout(&mut store, old)?;

    let new = start_workout(&mut store, "A", at(60 * 24))?;
    let weaker = log_set(&mut store, new, press, 50.0, 5, at(60 * 24 + 1))?;

    assert_eq!(personal_record(&store, press).map(|pr| pr.set_id), Some(old_best));
    assert!(!is_personal_record(&store, weaker));
    Ok(())
}

#[test]
fn test_bodyweight_sets_rank_by_reps() -> Result<()> {
    let (mut store, session) = store_with_session();
    let pullup = store.create_exercise("Pull-up");
    let eight = log_set(&mut store, session, pullup, 0.0, 8, at(1))?;
    let ten = log_set(&mut store, session, pullup, 0.0, 10, at(2))?;

    assert_eq!(personal_record(&store, pullup).map(|pr| pr.set_id), Some(ten));
    assert!(!is_personal_record(&store, eight));
    assert_eq!(personal_record_display(&store, pullup), "0 × 10");
    Ok(())
}

#[test]
fn test_identical_sets_are_both_records() -> Result<()> {
    let (mut store, session) = store_with_session();
    let row = store.create_exercise("Row");
    let first = log_set(&mut store, session, row, 80.0, 8, at(1))?;
    let second = log_set(&mut store, session, row, 80.0, 8, at(2))?;

    assert!(is_personal_record(&store, first));
    assert!(is_personal_record(&store, second));
    // Among exact ties the earliest logged set is reported
    assert_eq!(personal_record(&store, row).map(|pr| pr.set_id), Some(first));
    Ok(())
}

#[test]
fn test_best_set_of_empty_iterator() {
    let sets: Vec<ExerciseSet> = Vec::new();
    assert!(best_set(&sets).is_none());
}

#[test]
fn test_relative_day_label() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    assert_eq!(relative_day_label(today, today), "Today");
    assert_eq!(relative_day_label(today - Duration::days(1), today), "1 day ago");
    assert_eq!(relative_day_label(today - Duration::days(2), today), "2 days ago");
    assert_eq!(relative_day_label(today - Duration::days(31), today), "31 days ago");
    assert_eq!(relative_day_label(today - Duration::days(32), today), "2024-02-28");
    assert_eq!(relative_day_label(today + Duration::days(1), today), "2024-04-01");
}

fn local(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
        .earliest()
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn test_pr_display_date_empty_without_record() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    assert_eq!(personal_record_display_date_on(&store, squat, today), "");

    let set = log_set(&mut store, session, squat, 100.0, 5, local(15, 8, 0))?;
    assert_eq!(personal_record_display_date_on(&store, squat, today), "Today");
    delete_set(&mut store, set)?;
    assert_eq!(personal_record_display_date_on(&store, squat, today), "");
    Ok(())
}

#[test]
fn test_pr_display_date_uses_calendar_days() -> Result<()> {
    let (mut store, session) = store_with_session();
    let late = store.create_exercise("Late Night Squat");
    let early = store.create_exercise("Early Bench");
    let old = store.create_exercise("Old Deadlift");
    let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

    // Less than an hour before midnight still counts as yesterday
    log_set(&mut store, session, late, 100.0, 5, local(14, 23, 30))?;
    log_set(&mut store, session, early, 60.0, 5, local(15, 0, 10))?;
    // 2024-02-12 is 32 days before 2024-03-15
    store.insert_set(
        session,
        old,
        140.0,
        3,
        Local
            .with_ymd_and_hms(2024, 2, 12, 12, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc),
    )?;

    assert_eq!(personal_record_display_date_on(&store, late, today), "1 day ago");
    assert_eq!(personal_record_display_date_on(&store, early, today), "Today");
    assert_eq!(personal_record_display_date_on(&store, old, today), "2024-02-12");
    Ok(())
}

#[test]
fn test_zero_rep_sets_are_rejected_by_the_store() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");

    assert_eq!(
        store.insert_set(session, squat, 50.0, 0, at(1)),
        Err(StoreError::ZeroReps)
    );
    assert_eq!(
        store.restore_set(ExerciseSet {
            id: SetId(10),
            exercise_id: squat,
            session_id: session,
            weight: 50.0,
            reps: 0,
            timestamp: at(1),
            deleted: false,
        }),
        Err(StoreError::ZeroReps)
    );
    assert_eq!(store.sets().count(), 0);
    assert!(personal_record(&store, squat).is_none());
    Ok(())
}

#[test]
fn test_backfilled_timestamp_reorders_session() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");
    let bench = store.create_exercise("Bench Press");
    let heavy = log_set(&mut store, session, squat, 100.0, 5, at(5))?;
    let volume = log_set(&mut store, session, squat, 90.0, 8, at(6))?;
    log_set(&mut store, session, bench, 60.0, 8, at(10))?;

    assert_eq!(session_exercise_ids(&store, session), vec![squat, bench]);
    assert_eq!(
        smart_defaults(&store, session, squat),
        Some(SetValues { weight: 90.0, reps: 8 })
    );

    store.set_timestamp(heavy, at(30))?;
    // Squat's first set is now the 90 × 8 at minute 6, still ahead of bench
    assert_eq!(session_exercise_ids(&store, session), vec![squat, bench]);
    assert_eq!(
        smart_defaults(&store, session, squat),
        Some(SetValues { weight: 100.0, reps: 5 })
    );

    let squat_sets: Vec<SetId> = store
        .live_sets_of_session(session)
        .filter(|set| set.exercise_id == squat)
        .map(|set| set.id)
        .collect();
    for id in squat_sets {
        store.set_timestamp(id, at(40))?;
    }
    assert_eq!(session_exercise_ids(&store, session), vec![bench, squat]);
    // Moving sets in time leaves ownership and records alone
    assert_eq!(personal_record(&store, squat).map(|pr| pr.set_id), Some(volume));
    assert_eq!(store.delete_exercise(bench)?, 1);
    assert_eq!(store.all_sets_of_exercise(squat).count(), 2);
    assert_eq!(
        store.set_timestamp(SetId(99), at(0)),
        Err(StoreError::SetNotFound(SetId(99)))
    );
    Ok(())
}

#[test]
fn test_set_display_string() -> Result<()> {
    let (mut store, session) = store_with_session();
    let curl = store.create_exercise("Curl");
    let whole = log_set(&mut store, session, curl, 135.0, 5, at(1))?;
    let fractional = log_set(&mut store, session, curl, 22.5, 12, at(2))?;

    let display = |id| store.set(id).map(|s| s.display_string("lbs"));
    assert_eq!(display(whole).as_deref(), Some("135 lbs × 5 reps"));
    assert_eq!(display(fractional).as_deref(), Some("22.5 lbs × 12 reps"));
    Ok(())
}

// ---- Session ordering ----

#[test]
fn test_logged_exercises_precede_templates() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let deadlift = store.create_exercise("Deadlift");
    let bench = store.create_exercise("Bench Press");
    let session = store.create_session("", at(0), vec![squat, deadlift]);
    log_set(&mut store, session, bench, 80.0, 5, at(1))?;

    assert_eq!(
        names(&session_exercises(&store, session)),
        ["Bench Press", "Squat", "Deadlift"]
    );
    Ok(())
}

#[test]
fn test_logged_template_keeps_set_position() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let deadlift = store.create_exercise("Deadlift");
    let bench = store.create_exercise("Bench Press");
    let session = store.create_session("", at(0), vec![squat, deadlift]);
    log_set(&mut store, session, deadlift, 180.0, 3, at(1))?;
    log_set(&mut store, session, bench, 80.0, 5, at(2))?;
    log_set(&mut store, session, deadlift, 180.0, 3, at(3))?;

    assert_eq!(
        session_exercise_ids(&store, session),
        vec![deadlift, bench, squat]
    );
    Ok(())
}

#[test]
fn test_deleted_sets_do_not_place_exercises() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let lunge = store.create_exercise("Lunge");
    let session = store.create_session("", at(0), vec![squat]);
    let set = log_set(&mut store, session, lunge, 20.0, 10, at(1))?;
    assert_eq!(session_exercise_ids(&store, session), vec![lunge, squat]);

    delete_set(&mut store, set)?;
    assert_eq!(session_exercise_ids(&store, session), vec![squat]);
    Ok(())
}

#[test]
fn test_repeated_template_listed_once() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let dip = store.create_exercise("Dip");
    let session = store.create_session("", at(0), vec![squat, dip, squat]);

    assert_eq!(session_exercise_ids(&store, session), vec![squat, dip]);
    assert!(session_exercise_ids(&store, SessionId(99)).is_empty());
    Ok(())
}

#[test]
fn test_add_template_exercise_ignores_repeats() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");

    assert!(add_template_exercise(&mut store, session, squat)?);
    assert!(!add_template_exercise(&mut store, session, squat)?);
    assert_eq!(
        store.session(session).map(|s| s.templates.clone()),
        Some(vec![squat])
    );
    assert_eq!(
        add_template_exercise(&mut store, session, ExerciseId(42)),
        Err(WorkoutError::Store(StoreError::ExerciseNotFound(ExerciseId(42))))
    );
    Ok(())
}

// ---- Smart defaults ----

#[test]
fn test_smart_defaults_prefer_latest_session_set() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");

    let earlier = start_workout(&mut store, "", at(0))?;
    log_set(&mut store, earlier, squat, 140.0, 5, at(1))?;
    finish_workout(&mut store, earlier)?;

    let today = start_workout(&mut store, "", at(60 * 48))?;
    assert_eq!(
        smart_defaults(&store, today, squat),
        Some(SetValues { weight: 140.0, reps: 5 })
    );

    log_set(&mut store, today, squat, 100.0, 8, at(60 * 48 + 1))?;
    let latest = log_set(&mut store, today, squat, 110.0, 6, at(60 * 48 + 2))?;
    assert_eq!(
        smart_defaults(&store, today, squat),
        Some(SetValues { weight: 110.0, reps: 6 })
    );

    delete_set(&mut store, latest)?;
    assert_eq!(
        smart_defaults(&store, today, squat),
        Some(SetValues { weight: 100.0, reps: 8 })
    );
    Ok(())
}

#[test]
fn test_smart_defaults_absent_for_new_exercise() {
    let (mut store, session) = store_with_session();
    let new_move = store.create_exercise("New Move");
    assert_eq!(smart_defaults(&store, session, new_move), None);
}

// ---- Lifecycle ----

#[test]
fn test_finish_without_sets_deletes_session() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let session = start_workout(&mut store, "Leg Day", at(0))?;
    add_template_exercise(&mut store, session, squat)?;

    assert_eq!(finish_workout(&mut store, session)?, FinishOutcome::Cancelled);
    assert!(store.session(session).is_none());
    assert!(store.active_session().is_none());
    Ok(())
}

#[test]
fn test_finish_with_only_deleted_sets_cancels() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let session = start_workout(&mut store, "", at(0))?;
    let set = log_set(&mut store, session, squat, 100.0, 5, at(1))?;
    delete_set(&mut store, set)?;

    assert_eq!(finish_workout(&mut store, session)?, FinishOutcome::Cancelled);
    assert!(store.session(session).is_none());
    assert!(store.set(set).is_none());
    Ok(())
}

#[test]
fn test_finish_prunes_unused_templates() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let deadlift = store.create_exercise("Deadlift");
    let session = start_workout(&mut store, "Legs", at(0))?;
    add_template_exercise(&mut store, session, squat)?;
    add_template_exercise(&mut store, session, deadlift)?;
    log_set(&mut store, session, squat, 100.0, 5, at(1))?;

    assert_eq!(
        finish_workout(&mut store, session)?,
        FinishOutcome::Finished { pruned_templates: 1 }
    );
    let finished = store.session(session).expect("session kept");
    assert!(!finished.is_active);
    assert_eq!(finished.templates, vec![squat]);

    assert_eq!(
        finish_workout(&mut store, session),
        Err(WorkoutError::SessionNotActive(session))
    );
    Ok(())
}

#[test]
fn test_only_one_workout_active() -> Result<()> {
    let mut store = Store::new();
    let first = start_workout(&mut store, "  Push  ", at(0))?;
    assert_eq!(store.session(first).map(|s| s.name.as_str()), Some("Push"));
    assert_eq!(
        start_workout(&mut store, "Pull", at(1)),
        Err(WorkoutError::AnotherSessionActive(first))
    );
    Ok(())
}

#[test]
fn test_reuse_copies_exercises_not_sets() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let bench = store.create_exercise("Bench Press");
    let row = store.create_exercise("Row");

    let source = start_workout(&mut store, "Full Body", at(0))?;
    add_template_exercise(&mut store, source, row)?;
    log_set(&mut store, source, bench, 80.0, 5, at(1))?;
    log_set(&mut store, source, squat, 100.0, 5, at(2))?;
    log_set(&mut store, source, row, 60.0, 8, at(3))?;
    finish_workout(&mut store, source)?;

    let reused = reuse_workout(&mut store, source, at(60 * 24))?;
    let session = store.session(reused).expect("reused session exists");
    assert!(session.is_active);
    assert_eq!(session.name, "Full Body");
    assert_eq!(session.templates, vec![bench, squat, row]);
    assert_eq!(store.live_sets_of_session(reused).count(), 0);
    assert_eq!(session_exercise_ids(&store, reused), vec![bench, squat, row]);
    Ok(())
}

#[test]
fn test_reuse_rejections() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let finished = start_workout(&mut store, "", at(0))?;
    log_set(&mut store, finished, squat, 100.0, 5, at(1))?;
    finish_workout(&mut store, finished)?;

    let active = start_workout(&mut store, "", at(10))?;
    assert_eq!(
        reuse_workout(&mut store, active, at(11)),
        Err(WorkoutError::SessionStillActive(active))
    );
    assert_eq!(
        reuse_workout(&mut store, finished, at(11)),
        Err(WorkoutError::AnotherSessionActive(active))
    );
    assert_eq!(
        reuse_workout(&mut store, SessionId(77), at(11)),
        Err(WorkoutError::Store(StoreError::SessionNotFound(SessionId(77))))
    );
    Ok(())
}

#[test]
fn test_log_set_validation() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");

    assert!(matches!(
        log_set(&mut store, session, squat, 100.0, 0, at(1)),
        Err(WorkoutError::InvalidSet(_))
    ));
    assert!(matches!(
        log_set(&mut store, session, squat, -5.0, 5, at(1)),
        Err(WorkoutError::InvalidSet(_))
    ));
    assert!(matches!(
        log_set(&mut store, session, squat, f64::NAN, 5, at(1)),
        Err(WorkoutError::InvalidSet(_))
    ));
    assert_eq!(
        log_set(&mut store, SessionId(9), squat, 100.0, 5, at(1)),
        Err(WorkoutError::Store(StoreError::SessionNotFound(SessionId(9))))
    );
    assert_eq!(store.sets().count(), 0);

    // Bodyweight sets are valid
    log_set(&mut store, session, squat, 0.0, 12, at(2))?;
    assert_eq!(store.sets().count(), 1);
    Ok(())
}

#[test]
fn test_rename_exercise_trims_and_rejects_empty() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");

    rename_exercise(&mut store, squat, "  Back Squat ")?;
    assert_eq!(store.exercise(squat).map(|e| e.name.as_str()), Some("Back Squat"));
    assert_eq!(
        rename_exercise(&mut store, squat, "   "),
        Err(WorkoutError::EmptyExerciseName)
    );
    Ok(())
}

#[test]
fn test_session_summary_marks_records() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let lunge = store.create_exercise("Lunge");
    let session = start_workout(&mut store, "Legs", at(0))?;
    add_template_exercise(&mut store, session, lunge)?;
    log_set(&mut store, session, squat, 100.0, 5, at(1))?;
    let top = log_set(&mut store, session, squat, 110.0, 5, at(2))?;

    let summary = session_summary(&store, session)?;
    assert_eq!(summary.total_sets, 2);
    assert_eq!(summary.exercises.len(), 2);

    let squat_block = &summary.exercises[0];
    assert_eq!(squat_block.name, "Squat");
    let flags: Vec<bool> = squat_block.sets.iter().map(|l| l.is_personal_record).collect();
    assert_eq!(flags, vec![false, true]);
    assert_eq!(squat_block.sets[1].set_id, top);
    assert_eq!(
        squat_block.personal_record,
        Some(SetValues { weight: 110.0, reps: 5 })
    );

    let lunge_block = &summary.exercises[1];
    assert!(lunge_block.sets.is_empty());
    assert_eq!(lunge_block.personal_record, None);

    assert_eq!(
        session_summary(&store, SessionId(5)),
        Err(StoreError::SessionNotFound(SessionId(5)))
    );
    Ok(())
}

// ---- Duplicate cleanup ----

fn restore_exercise(store: &mut Store, id: i64, name: &str) -> Result<ExerciseId> {
    store.restore_exercise(Exercise {
        id: ExerciseId(id),
        name: name.to_string(),
    })?;
    Ok(ExerciseId(id))
}

#[test]
fn test_cleanup_keeps_most_used_duplicate() -> Result<()> {
    let mut store = Store::new();
    let plain = restore_exercise(&mut store, 1, "Squat")?;
    let padded = restore_exercise(&mut store, 2, " Squat ")?;
    let newline = restore_exercise(&mut store, 3, "Squat\n")?;
    let session = store.create_session("", at(0), vec![plain]);
    let set = log_set(&mut store, session, padded, 100.0, 5, at(1))?;

    let report = run_duplicate_cleanup(&mut store)?;
    assert_eq!(report.removed_exercises(), 2);
    assert_eq!(report.groups[0].kept, padded);
    assert_eq!(report.groups[0].removed, vec![plain, newline]);

    let remaining: Vec<&Exercise> = store.exercises().collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, " Squat ");
    assert_eq!(store.set(set).map(|s| s.exercise_id), Some(padded));
    // Template pointing at a removed duplicate is gone too
    assert!(store.session(session).is_some_and(|s| s.templates.is_empty()));
    Ok(())
}

#[test]
fn test_cleanup_is_idempotent() -> Result<()> {
    let mut store = Store::new();
    restore_exercise(&mut store, 1, "Bench")?;
    restore_exercise(&mut store, 2, "bench")?;
    restore_exercise(&mut store, 3, "Row")?;

    let first = run_duplicate_cleanup(&mut store)?;
    assert!(!first.is_noop());
    let second = run_duplicate_cleanup(&mut store)?;
    assert!(second.is_noop());
    assert_eq!(store.exercises().count(), 2);
    Ok(())
}

#[test]
fn test_cleanup_tie_keeps_oldest() -> Result<()> {
    let mut store = Store::new();
    let older = restore_exercise(&mut store, 4, "Dip")?;
    let newer = restore_exercise(&mut store, 9, "DIP")?;

    let report = run_duplicate_cleanup(&mut store)?;
    assert_eq!(report.groups[0].kept, older);
    assert!(store.exercise(newer).is_none());
    Ok(())
}

#[test]
fn test_cleanup_counts_deleted_sets_as_usage() -> Result<()> {
    let mut store = Store::new();
    let first = restore_exercise(&mut store, 1, "Curl")?;
    let second = restore_exercise(&mut store, 2, "curl")?;
    let session = store.create_session("", at(0), Vec::new());
    let set = log_set(&mut store, session, second, 20.0, 10, at(1))?;
    delete_set(&mut store, set)?;

    let report = run_duplicate_cleanup(&mut store)?;
    assert_eq!(report.groups[0].kept, second);
    assert_eq!(report.removed_sets, 0);
    assert!(store.exercise(first).is_none());
    Ok(())
}

// ---- Store ----

#[test]
fn test_purge_removes_only_deleted_sets() -> Result<()> {
    let (mut store, session) = store_with_session();
    let squat = store.create_exercise("Squat");
    let kept = log_set(&mut store, session, squat, 100.0, 5, at(1))?;
    let gone = log_set(&mut store, session, squat, 100.0, 4, at(2))?;
    delete_set(&mut store, gone)?;

    assert_eq!(store.all_sets_of_exercise(squat).count(), 2);
    assert_eq!(store.purge_deleted_sets(), 1);
    assert!(store.set(gone).is_none());
    assert!(store.set(kept).is_some());
    assert_eq!(store.all_sets_of_session(session).count(), 1);
    Ok(())
}

#[test]
fn test_delete_exercise_cascades() -> Result<()> {
    let mut store = Store::new();
    let squat = store.create_exercise("Squat");
    let bench = store.create_exercise("Bench");
    let session = store.create_session("", at(0), vec![squat, bench]);
    log_set(&mut store, session, squat, 100.0, 5, at(1))?;
    log_set(&mut store, session, squat, 100.0, 5, at(2))?;

    assert_eq!(store.delete_exercise(squat)?, 2);
    assert_eq!(store.live_sets_of_session(session).count(), 0);
    assert_eq!(store.session(session).map(|s| s.templates.clone()), Some(vec![bench]));
    assert_eq!(
        store.delete_exercise(squat),
        Err(StoreError::ExerciseNotFound(squat))
    );
    Ok(())
}

#[test]
fn test_restore_rejects_duplicate_ids_and_advances_counter() -> Result<()> {
    let mut store = Store::new();
    restore_exercise(&mut store, 7, "Squat")?;
    assert!(matches!(
        restore_exercise(&mut store, 7, "Bench"),
        Err(e) if e.downcast_ref::<StoreError>().is_some()
    ));
    assert_eq!(store.create_exercise("Row"), ExerciseId(8));
    Ok(())
}

// ---- Search ----

#[test]
fn test_search_and_create_offer() {
    let mut store = Store::new();
    store.create_exercise("Bench Press");
    store.create_exercise("Incline Bench");
    store.create_exercise("Squat");

    assert_eq!(
        names(&search_exercises(&store, "bench")),
        ["Bench Press", "Incline Bench"]
    );
    assert_eq!(search_exercises(&store, "  ").len(), 3);
    assert!(search_exercises(&store, "curl").is_empty());

    assert!(!should_offer_create(&store, " squat "));
    assert!(should_offer_create(&store, "Bench"));
    assert!(!should_offer_create(&store, "   "));
}
