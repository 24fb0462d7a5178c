// libs/gamification-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// HYDRATION MODELS
// ==============================================================================

/// Per-patient, per-calendar-day hydration record. `goal_met` latches true
/// the first time intake reaches the goal and never unlatches within the
/// day, so streak counters cannot double-count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationState {
    pub day: NaiveDate,
    pub intake_ml: i32,
    pub goal_ml: i32,
    pub goal_met: bool,
}

impl HydrationState {
    /// Starting state for a day with no record yet. The goal carries over
    /// from the caller (it persists across days until changed).
    pub fn fresh(day: NaiveDate, goal_ml: i32) -> Self {
        Self {
            day,
            intake_ml: 0,
            goal_ml,
            goal_met: false,
        }
    }
}

// ==============================================================================
// PIN / COUNTER MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    Hydration,
    Task,
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinType::Hydration => write!(f, "hydration"),
            PinType::Task => write!(f, "task"),
        }
    }
}

/// One unlocked reward pin. The `(name, pin_type)` pair is unique per
/// patient; membership here is what makes unlock notifications fire at most
/// once over the patient's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EarnedPin {
    pub name: String,
    pub pin_type: PinType,
}

/// Cumulative counters driving reward-tier unlocks, one row per patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressCounters {
    /// Lifetime count of days on which the hydration goal was first met.
    pub total_goal_met_days: u32,
    /// ISO week (UTC) the streak below belongs to, e.g. `2025-W28`.
    pub week_key: String,
    /// Days this week on which every daily task was completed. Resets to 0
    /// when it reaches the weekly target, and when the week rolls over.
    pub weekly_streak_count: u32,
    /// Number of completed weekly streaks over the patient's lifetime.
    pub total_task_tiers_completed: u32,
    /// Last day on which the all-tasks-done condition was recorded, the
    /// once-per-day guard for the streak increment.
    pub all_tasks_done_on: Option<NaiveDate>,
    pub earned_pins: Vec<EarnedPin>,
}

impl Default for ProgressCounters {
    fn default() -> Self {
        Self {
            total_goal_met_days: 0,
            week_key: String::new(),
            weekly_streak_count: 0,
            total_task_tiers_completed: 0,
            all_tasks_done_on: None,
            earned_pins: Vec::new(),
        }
    }
}

impl ProgressCounters {
    pub fn has_pin(&self, name: &str, pin_type: PinType) -> bool {
        self.earned_pins
            .iter()
            .any(|pin| pin.name == name && pin.pin_type == pin_type)
    }

    pub fn all_tasks_done_today(&self, day: NaiveDate) -> bool {
        self.all_tasks_done_on == Some(day)
    }
}

// ==============================================================================
// EVENTS
// ==============================================================================

/// Reward events produced by the pure engine. The caller decides how to
/// surface them (toast, push, nothing); emitting them here never mutates
/// state by itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The hydration goal was met for the first time on `day`.
    GoalMetToday { day: NaiveDate },
    /// A reward tier was crossed for the first time ever.
    TierUnlocked { tier: String, pin_type: PinType },
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHydrationRequest {
    pub patient_id: Uuid,
    pub day: NaiveDate,
    pub intake_ml: i32,
    /// When present, updates the persistent daily goal before recording.
    pub goal_ml: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationResponse {
    pub state: HydrationState,
    pub total_goal_met_days: u32,
    pub current_tier: String,
    pub events: Vec<ProgressEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDailyTasksRequest {
    pub patient_id: Uuid,
    pub day: NaiveDate,
    pub food_diary_has_entry: bool,
    pub all_habits_checked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTasksResponse {
    pub all_tasks_done: bool,
    pub weekly_streak_count: u32,
    pub total_task_tiers_completed: u32,
    pub current_tier: String,
    pub events: Vec<ProgressEvent>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProgressError {
    #[error("Could not load progress state: {0}")]
    StateFetchFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
