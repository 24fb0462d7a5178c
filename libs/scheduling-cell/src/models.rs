// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// The bookable start times the nutritionist has declared for one calendar
/// date. Upserted keyed on `date`; a window with an empty time set is
/// equivalent to no availability and is removed from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub date: NaiveDate,
    pub times: Vec<NaiveTime>,
}

impl AvailabilityWindow {
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

/// A confirmed booking of exactly one declared time slot by one patient.
/// Never mutated in place except through cancellation; the datastore enforces
/// that no two confirmed appointments share the same `start_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled_end_time(&self) -> DateTime<Utc> {
        self.start_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// Cancelled appointments do not occupy their slot.
    pub fn is_active(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }

    /// Exact-slot match: same date, same hour, same minute. All appointments
    /// share one fixed duration, so conflicts are equality, not overlap.
    pub fn occupies(&self, date: NaiveDate, time: NaiveTime) -> bool {
        use chrono::Timelike;
        self.start_time.date_naive() == date
            && self.start_time.time().hour() == time.hour()
            && self.start_time.time().minute() == time.minute()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// MONTH GRID MODELS
// ==============================================================================

/// Classification of one cell in the scheduling month grid. Only `Bookable`
/// days are interactive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    OutOfMonth,
    Past,
    NoAvailability,
    FullyBooked,
    Bookable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthDay {
    pub date: NaiveDate,
    pub status: DayStatus,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertAvailabilityRequest {
    pub times: Vec<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
    pub start_time: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    /// The store rejected the insert because another confirmed appointment
    /// already holds this start time. Recoverable: refresh slots and retry.
    #[error("Slot already booked")]
    SlotAlreadyBooked,

    /// The requested slot is not in the locally computed bookable set
    /// (stale view). Treated like `SlotAlreadyBooked` by callers.
    #[error("Selected slot is no longer available")]
    InvalidSlotSelection,

    #[error("Could not load availability: {0}")]
    AvailabilityFetchFailed(String),

    #[error("Could not load appointments: {0}")]
    AppointmentFetchFailed(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
