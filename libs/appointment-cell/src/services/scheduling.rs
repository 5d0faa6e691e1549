// libs/appointment-cell/src/services/scheduling.rs
//
// Pure scheduling calculations: interval overlap and slot enumeration.
// No I/O here; callers fetch the relevant appointments and pass them in.
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::DurationMinutes;

/// Daily booking window. Candidate slot starts are generated every
/// `slot_step_minutes` and a slot must fit entirely before `work_end`.
#[derive(Debug, Clone)]
pub struct SchedulingWindow {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub slot_step_minutes: u32,
}

impl Default for SchedulingWindow {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            slot_step_minutes: 30,
        }
    }
}

/// Half-open time interval `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeInterval {
    pub fn from_start(start: NaiveDateTime, duration: DurationMinutes) -> Self {
        Self {
            start,
            end: start + duration.to_chrono(),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Two intervals overlap iff each starts before the other ends.
    /// Back-to-back intervals (`self.start == other.end`) do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// True when the candidate overlaps any of the given intervals.
///
/// `existing` must already be narrowed to the same professional's
/// `scheduled` appointments, minus the record under edit if any; that
/// filtering belongs to the fetch layer. Stops at the first match.
pub fn has_conflict(candidate: &TimeInterval, existing: &[TimeInterval]) -> bool {
    existing.iter().any(|taken| candidate.overlaps(taken))
}

/// Enumerates the free slot start times for one day.
///
/// Past dates and weekends produce an empty list rather than an error.
/// `today` comes from the caller so the calculation stays deterministic
/// under test.
pub fn available_slots(
    date: NaiveDate,
    duration: DurationMinutes,
    existing: &[TimeInterval],
    today: NaiveDate,
    window: &SchedulingWindow,
) -> Vec<NaiveTime> {
    if date < today {
        return Vec::new();
    }
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Vec::new();
    }

    let day_end = date.and_time(window.work_end);
    let step = chrono::Duration::minutes(window.slot_step_minutes as i64);

    let mut slots = Vec::new();
    let mut current = date.and_time(window.work_start);

    while current + duration.to_chrono() <= day_end {
        let candidate = TimeInterval::from_start(current, duration);
        if !has_conflict(&candidate, existing) {
            slots.push(current.time());
        }
        current += step;
    }

    slots
}
