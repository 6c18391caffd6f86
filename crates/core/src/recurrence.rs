//! Alarm recurrence day-sets and due evaluation.
//!
//! An alarm's schedule is a time-of-day (minutes since midnight UTC) plus
//! a set of weekdays encoded as a bitmask: bit 0 = Monday through bit 6 =
//! Sunday, matching `chrono::Weekday::num_days_from_monday`. The probe
//! evaluates due-ness at minute granularity, so these functions compare
//! whole minutes and ignore seconds.

use chrono::{Datelike, Timelike, Weekday};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Bitmask with every weekday set.
pub const EVERY_DAY: i32 = 0b111_1111;

/// Minutes in a day; `ring_at_minutes` must be below this.
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// The bitmask bit for a weekday.
pub fn day_bit(weekday: Weekday) -> i32 {
    1 << weekday.num_days_from_monday()
}

/// Whether the day-set contains the given weekday.
pub fn contains_day(days: i32, weekday: Weekday) -> bool {
    days & day_bit(weekday) != 0
}

/// Whether an alarm schedule is due at `now`.
///
/// True when the current UTC weekday is in the day-set and the current
/// minute-of-day equals `ring_at_minutes`. The caller is responsible for
/// checking the active flag and the trigger idempotency window.
pub fn is_due(ring_at_minutes: i32, days: i32, now: Timestamp) -> bool {
    let minute_of_day = (now.hour() * 60 + now.minute()) as i32;
    contains_day(days, now.weekday()) && minute_of_day == ring_at_minutes
}

/// Validate a schedule before persisting it.
///
/// Rules:
/// - `ring_at_minutes` must be in `0..MINUTES_PER_DAY`.
/// - `days` must select at least one weekday and no unknown bits.
pub fn validate_schedule(ring_at_minutes: i32, days: i32) -> Result<(), CoreError> {
    if !(0..MINUTES_PER_DAY).contains(&ring_at_minutes) {
        return Err(CoreError::Validation(format!(
            "ring_at_minutes must be in 0..{MINUTES_PER_DAY}, got {ring_at_minutes}"
        )));
    }
    if days == 0 {
        return Err(CoreError::Validation(
            "recurrence must select at least one weekday".to_string(),
        ));
    }
    if days & !EVERY_DAY != 0 {
        return Err(CoreError::Validation(format!(
            "recurrence bitmask has unknown bits set: {days:#b}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn day_bits_cover_the_week() {
        assert_eq!(day_bit(Weekday::Mon), 0b000_0001);
        assert_eq!(day_bit(Weekday::Sun), 0b100_0000);
        let all: i32 = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .iter()
        .map(|d| day_bit(*d))
        .sum();
        assert_eq!(all, EVERY_DAY);
    }

    #[test]
    fn due_on_matching_day_and_minute() {
        // 2024-01-01 is a Monday; 07:30 UTC = 450 minutes.
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap();
        assert!(is_due(450, day_bit(Weekday::Mon), now));
    }

    #[test]
    fn not_due_on_other_day() {
        let monday = Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 0).unwrap();
        assert!(!is_due(450, day_bit(Weekday::Tue), monday));
    }

    #[test]
    fn not_due_on_other_minute() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 7, 31, 0).unwrap();
        assert!(!is_due(450, EVERY_DAY, now));
    }

    #[test]
    fn seconds_do_not_affect_due() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 7, 30, 59).unwrap();
        assert!(is_due(450, EVERY_DAY, now));
    }

    #[test]
    fn validate_accepts_normal_schedule() {
        assert!(validate_schedule(450, EVERY_DAY).is_ok());
        assert!(validate_schedule(0, day_bit(Weekday::Sat)).is_ok());
        assert!(validate_schedule(MINUTES_PER_DAY - 1, 0b101_0101).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_minute() {
        assert!(validate_schedule(-1, EVERY_DAY).is_err());
        assert!(validate_schedule(MINUTES_PER_DAY, EVERY_DAY).is_err());
    }

    #[test]
    fn validate_rejects_empty_day_set() {
        let err = validate_schedule(450, 0).unwrap_err();
        assert!(err.to_string().contains("at least one weekday"));
    }

    #[test]
    fn validate_rejects_unknown_bits() {
        assert!(validate_schedule(450, 1 << 7).is_err());
    }
}
