use chrono::{NaiveTime, Timelike};
use crate::error::AppError;

/// Upper bound for any step, duration or gap in a generation request.
const MINUTES_PER_DAY: u32 = 24 * 60;

/// How candidate slots are spaced when generating a day's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCadence {
    /// `start, start+interval, ...` up to and including `end`.
    Interval { interval_minutes: u32 },
    /// Steps of `duration + gap`; a slot is kept only if it ends by `end`.
    Promotional { duration_minutes: u32, gap_minutes: u32 },
}

pub fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid time '{}' (expected HH:MM)", value)))
}

/// Canonical `HH:MM` form of a slot string.
pub fn normalize_slot(value: &str) -> Result<String, AppError> {
    Ok(format_minutes(minute_of_day(parse_time(value)?)))
}

pub fn normalize_slots<I, S>(values: I) -> Result<Vec<String>, AppError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().map(|v| normalize_slot(v.as_ref())).collect()
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn generate_slots(start: NaiveTime, end: NaiveTime, interval_minutes: u32) -> Result<Vec<String>, AppError> {
    if interval_minutes == 0 || interval_minutes > MINUTES_PER_DAY {
        return Err(AppError::Validation(format!(
            "Interval must be between 1 and {} minutes",
            MINUTES_PER_DAY
        )));
    }

    let end_idx = minute_of_day(end);
    let mut cursor = minute_of_day(start);
    let mut slots = Vec::new();

    while cursor <= end_idx {
        slots.push(format_minutes(cursor));
        cursor += interval_minutes;
    }
    Ok(slots)
}

pub fn generate_promotional_slots(
    start: NaiveTime,
    end: NaiveTime,
    duration_minutes: u32,
    gap_minutes: u32,
) -> Result<Vec<String>, AppError> {
    if duration_minutes == 0 || duration_minutes > MINUTES_PER_DAY {
        return Err(AppError::Validation(format!(
            "Duration must be between 1 and {} minutes",
            MINUTES_PER_DAY
        )));
    }
    if gap_minutes > MINUTES_PER_DAY {
        return Err(AppError::Validation(format!("Gap must not exceed {} minutes", MINUTES_PER_DAY)));
    }

    let step = duration_minutes + gap_minutes;
    let end_idx = minute_of_day(end);
    let mut cursor = minute_of_day(start);
    let mut slots = Vec::new();

    while cursor + duration_minutes <= end_idx {
        slots.push(format_minutes(cursor));
        cursor += step;
    }
    Ok(slots)
}

pub fn generate(start: NaiveTime, end: NaiveTime, cadence: SlotCadence) -> Result<Vec<String>, AppError> {
    match cadence {
        SlotCadence::Interval { interval_minutes } => generate_slots(start, end, interval_minutes),
        SlotCadence::Promotional { duration_minutes, gap_minutes } => {
            generate_promotional_slots(start, end, duration_minutes, gap_minutes)
        }
    }
}
