//! Pure slot resolution. No I/O and no clock reads: callers pass the full
//! availability and appointment state plus `now`, and recompute on any
//! trigger (poll, push, manual refresh).

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{Appointment, AvailabilityWindow, DayStatus, MonthDay, ScheduleError};

/// Declared start times for a date, deduplicated and ascending. A missing or
/// empty window yields an empty set.
pub fn declared_times(date: NaiveDate, windows: &[AvailabilityWindow]) -> Vec<chrono::NaiveTime> {
    let mut times: Vec<chrono::NaiveTime> = windows
        .iter()
        .filter(|w| w.date == date)
        .flat_map(|w| w.times.iter().copied())
        .collect();
    times.sort();
    times.dedup();
    times
}

/// `declared(date) - booked(date) - past(date, now)`, ascending.
///
/// A slot survives only if its full start datetime is strictly after `now`
/// (same-moment bookings are rejected) and no confirmed appointment occupies
/// the same date/hour/minute.
pub fn compute_bookable_slots(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> Vec<chrono::NaiveTime> {
    let mut slots = declared_times(date, windows);

    slots.retain(|time| {
        let start = date.and_time(*time).and_utc();
        if start <= now {
            return false;
        }
        !appointments
            .iter()
            .any(|apt| apt.is_active() && apt.occupies(date, *time))
    });

    slots
}

/// Classify every cell of the month grid, Sunday-aligned, with leading and
/// trailing days from adjacent months included to fill complete week rows.
///
/// A day whose declared slots have all slipped into the past classifies as
/// `FullyBooked` when bookings consumed them and `NoAvailability` otherwise;
/// either way it is non-interactive, never `Bookable`.
pub fn month_overview(
    year: i32,
    month: u32,
    windows: &[AvailabilityWindow],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> Result<Vec<MonthDay>, ScheduleError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ScheduleError::InvalidTime(format!("invalid month {}-{}", year, month)))?;

    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| ScheduleError::InvalidTime(format!("invalid month {}-{}", year, month)))?;
    let last = next_month_first - Duration::days(1);

    let lead = first.weekday().num_days_from_sunday() as i64;
    let trail = 6 - last.weekday().num_days_from_sunday() as i64;

    let grid_start = first - Duration::days(lead);
    let grid_end = last + Duration::days(trail);

    let today = now.date_naive();
    let mut days = Vec::new();
    let mut date = grid_start;

    while date <= grid_end {
        let status = if date.month() != month {
            DayStatus::OutOfMonth
        } else if date < today {
            DayStatus::Past
        } else {
            classify_day(date, windows, appointments, now)
        };

        days.push(MonthDay { date, status });
        date += Duration::days(1);
    }

    Ok(days)
}

fn classify_day(
    date: NaiveDate,
    windows: &[AvailabilityWindow],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> DayStatus {
    let declared = declared_times(date, windows);
    if declared.is_empty() {
        return DayStatus::NoAvailability;
    }

    if !compute_bookable_slots(date, windows, appointments, now).is_empty() {
        return DayStatus::Bookable;
    }

    let any_booked = declared.iter().any(|time| {
        appointments
            .iter()
            .any(|apt| apt.is_active() && apt.occupies(date, *time))
    });

    if any_booked {
        DayStatus::FullyBooked
    } else {
        // Declared slots exist but all lie in the past.
        DayStatus::NoAvailability
    }
}
