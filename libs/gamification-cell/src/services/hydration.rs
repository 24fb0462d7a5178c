//! Pure hydration progression. Callers load prior state, apply, persist.

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{EarnedPin, HydrationState, ProgressCounters, ProgressEvent};
use crate::services::tiers::TierTable;

/// How far past the goal intake may be recorded. Keeps runaway client input
/// bounded while allowing generous overshoot.
pub const INTAKE_OVERSHOOT_ML: i32 = 5000;

/// Apply an intake update for one day.
///
/// The goal can be met at most once per calendar day: the first time intake
/// reaches the goal, `goal_met` latches, `total_goal_met_days` increments
/// and `GoalMetToday` fires. Later updates the same day, including dips back
/// below the goal, change nothing but the stored intake. Tier unlocks fire
/// at most once per `(tier, type)` thanks to the earned-pin set.
pub fn record_hydration_intake(
    day: NaiveDate,
    new_intake_ml: i32,
    goal_ml: i32,
    prior_goal_met: bool,
    counters: &ProgressCounters,
) -> (HydrationState, ProgressCounters, Vec<ProgressEvent>) {
    let intake_ml = new_intake_ml.clamp(0, goal_ml + INTAKE_OVERSHOOT_ML);

    let mut updated = counters.clone();
    let mut events = Vec::new();

    let goal_met_now = prior_goal_met || intake_ml >= goal_ml;

    if goal_met_now && !prior_goal_met {
        updated.total_goal_met_days += 1;
        events.push(ProgressEvent::GoalMetToday { day });
        debug!(
            "Hydration goal first met on {} (total days: {})",
            day, updated.total_goal_met_days
        );
    }

    let table = TierTable::hydration();
    let prior_tier = table.highest_for(counters.total_goal_met_days);
    let current_tier = table.highest_for(updated.total_goal_met_days);

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

    let state = HydrationState {
        day,
        intake_ml,
        goal_ml,
        goal_met: goal_met_now,
    };

    (state, updated, events)
}
