//! Pure daily-task streak progression.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::models::{EarnedPin, ProgressCounters, ProgressEvent};
use crate::services::tiers::TierTable;

/// Completed-day count at which a weekly streak converts into a tier
/// completion and the streak resets.
pub const WEEKLY_STREAK_TARGET: u32 = 5;

/// ISO week of the UTC date, e.g. `2025-W28`. All day/week boundaries in the
/// engine use UTC.
pub fn week_key_for(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Whether every daily task holds: hydration goal met, at least one food
/// diary entry, and the whole habit checklist ticked. Recomputable on any
/// state change without side effects.
pub fn evaluate_daily_task_completion(
    hydration_goal_met: bool,
    food_diary_has_entry: bool,
    all_habits_checked: bool,
) -> bool {
    hydration_goal_met && food_diary_has_entry && all_habits_checked
}

/// Record the all-tasks-done outcome for one day.
///
/// The streak increments only the first time the condition holds on a given
/// day (`all_tasks_done_on` guard). Reaching the weekly target converts the
/// streak into a tier completion, resets the weekly count, and fires the
/// tier unlock at most once per `(tier, type)`.
pub fn record_daily_task_completion(
    day: NaiveDate,
    week_key: &str,
    all_tasks_done_today: bool,
    counters: &ProgressCounters,
) -> (ProgressCounters, Vec<ProgressEvent>) {
    let mut updated = counters.clone();
    let mut events = Vec::new();

    // Week rollover: the streak is keyed per week.
    if updated.week_key != week_key {
        updated.week_key = week_key.to_string();
        updated.weekly_streak_count = 0;
    }

    let already_recorded_today = updated.all_tasks_done_today(day);

    if !all_tasks_done_today || already_recorded_today {
        return (updated, events);
    }

    updated.all_tasks_done_on = Some(day);
    updated.weekly_streak_count += 1;
    debug!(
        "Daily tasks complete on {} (streak: {}/{})",
        day, updated.weekly_streak_count, WEEKLY_STREAK_TARGET
    );

    if updated.weekly_streak_count >= WEEKLY_STREAK_TARGET {
        let prior_completed = updated.total_task_tiers_completed;
        updated.total_task_tiers_completed += 1;
        updated.weekly_streak_count = 0;

        let table = TierTable::tasks();
        let prior_tier = table.highest_for(prior_completed);
        let current_tier = table.highest_for(updated.total_task_tiers_completed);

        if current_tier.name != prior_tier.name
            && current_tier.threshold > 0
            && !updated.has_pin(current_tier.name, table.pin_type())
        {
            updated.earned_pins.push(EarnedPin {
                name: current_tier.name.to_string(),
                pin_type: table.pin_type(),
            });
            events.push(ProgressEvent::TierUnlocked {
                tier: current_tier.name.to_string(),
                pin_type: table.pin_type(),
            });
        }
    }

    (updated, events)
}
