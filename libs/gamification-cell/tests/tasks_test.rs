// libs/gamification-cell/tests/tasks_test.rs
//
// Pure daily-task streak tests.

use chrono::NaiveDate;

use gamification_cell::models::{PinType, ProgressCounters, ProgressEvent};
use gamification_cell::services::tasks::{
    evaluate_daily_task_completion, record_daily_task_completion, week_key_for,
    WEEKLY_STREAK_TARGET,
};

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

// ==============================================================================
// EVALUATION TESTS
// ==============================================================================

#[test]
fn all_three_conditions_are_required() {
    assert!(evaluate_daily_task_completion(true, true, true));
    assert!(!evaluate_daily_task_completion(false, true, true));
    assert!(!evaluate_daily_task_completion(true, false, true));
    assert!(!evaluate_daily_task_completion(true, true, false));
    assert!(!evaluate_daily_task_completion(false, false, false));
}

#[test]
fn week_key_uses_iso_weeks() {
    // 2025-07-07 is the Monday of ISO week 28.
    assert_eq!(week_key_for(day(7, 7)), "2025-W28");
    assert_eq!(week_key_for(day(7, 13)), "2025-W28");
    assert_eq!(week_key_for(day(7, 14)), "2025-W29");
    // ISO year differs from the calendar year at the boundary.
    assert_eq!(week_key_for(day(12, 29)), "2026-W01");
}

// ==============================================================================
// STREAK TESTS
// ==============================================================================

#[test]
fn first_completion_of_the_day_increments_the_streak() {
    let counters = ProgressCounters::default();
    let week = week_key_for(day(7, 7));

    let (updated, events) = record_daily_task_completion(day(7, 7), &week, true, &counters);

    assert_eq!(updated.weekly_streak_count, 1);
    assert_eq!(updated.all_tasks_done_on, Some(day(7, 7)));
    assert!(events.is_empty());
}

#[test]
fn repeated_recording_same_day_is_idempotent() {
    let counters = ProgressCounters::default();
    let week = week_key_for(day(7, 7));

    let (updated, _) = record_daily_task_completion(day(7, 7), &week, true, &counters);
    let (again, events) = record_daily_task_completion(day(7, 7), &week, true, &updated);

    assert_eq!(again.weekly_streak_count, 1);
    assert!(events.is_empty());
}

#[test]
fn incomplete_day_changes_nothing() {
    let counters = ProgressCounters::default();
    let week = week_key_for(day(7, 7));

    let (updated, events) = record_daily_task_completion(day(7, 7), &week, false, &counters);

    assert_eq!(updated.weekly_streak_count, 0);
    assert_eq!(updated.all_tasks_done_on, None);
    assert!(events.is_empty());
}

#[test]
fn reaching_the_weekly_target_completes_a_tier_and_resets() {
    // Scenario E: five completed days within one week.
    let mut counters = ProgressCounters::default();
    let week = week_key_for(day(7, 7));

    let mut last_events = Vec::new();
    for offset in 0..WEEKLY_STREAK_TARGET {
        let d = day(7, 7 + offset);
        let (updated, events) = record_daily_task_completion(d, &week, true, &counters);
        counters = updated;
        last_events = events;
    }

    assert_eq!(counters.total_task_tiers_completed, 1);
    assert_eq!(counters.weekly_streak_count, 0);
    assert_eq!(
        last_events,
        vec![ProgressEvent::TierUnlocked {
            tier: "full-week".to_string(),
            pin_type: PinType::Task,
        }]
    );
    assert!(counters.has_pin("full-week", PinType::Task));
}

#[test]
fn second_completed_week_does_not_replay_the_unlock() {
    // full-week unlocks at 1 completed tier; the second completion sits
    // between thresholds and must stay silent.
    let mut counters = ProgressCounters::default();
    counters.total_task_tiers_completed = 1;
    counters.earned_pins.push(gamification_cell::models::EarnedPin {
        name: "full-week".to_string(),
        pin_type: PinType::Task,
    });
    counters.week_key = week_key_for(day(7, 14));
    counters.weekly_streak_count = 4;

    let week = week_key_for(day(7, 18));
    let (updated, events) = record_daily_task_completion(day(7, 18), &week, true, &counters);

    assert_eq!(updated.total_task_tiers_completed, 2);
    assert_eq!(updated.weekly_streak_count, 0);
    assert!(events.is_empty());
}

#[test]
fn week_rollover_resets_a_partial_streak() {
    let mut counters = ProgressCounters::default();
    counters.week_key = week_key_for(day(7, 7));
    counters.weekly_streak_count = 3;

    // Next Monday: a fresh week starts counting from zero.
    let next_week = week_key_for(day(7, 14));
    let (updated, _) = record_daily_task_completion(day(7, 14), &next_week, true, &counters);

    assert_eq!(updated.week_key, next_week);
    assert_eq!(updated.weekly_streak_count, 1);
}
