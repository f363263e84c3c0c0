//! The fixed bookable-time grid: 30-minute slots from 09:00 to 17:30, and a
//! rolling window of days offered for booking.

use chrono::{Days, NaiveDate, NaiveTime, Timelike};

pub const SLOT_MINUTES: u32 = 30;
pub const OPENING_MINUTE: u32 = 9 * 60;
pub const SLOTS_PER_DAY: u32 = 18;
pub const CLOSING_MINUTE: u32 = OPENING_MINUTE + SLOTS_PER_DAY * SLOT_MINUTES;
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// The day's slot grid, in order. Infallible: the constants above always
/// describe valid times of day.
pub fn day_slots() -> Vec<NaiveTime> {
    (0..SLOTS_PER_DAY)
        .filter_map(|i| {
            let minute = OPENING_MINUTE + i * SLOT_MINUTES;
            NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
        })
        .collect()
}

/// The rolling window of bookable days starting at `from`.
pub fn date_range(from: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .filter_map(|offset| from.checked_add_days(Days::new(u64::from(offset))))
        .collect()
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Index into the day grid, or `None` when the time is off-grid (wrong
/// granularity, outside opening hours, or carrying seconds).
pub fn slot_index(time: NaiveTime) -> Option<u32> {
    if time.second() != 0 || time.nanosecond() != 0 {
        return None;
    }
    let minute = minute_of_day(time);
    if minute < OPENING_MINUTE || minute >= CLOSING_MINUTE {
        return None;
    }
    let offset = minute - OPENING_MINUTE;
    if offset % SLOT_MINUTES != 0 {
        return None;
    }
    Some(offset / SLOT_MINUTES)
}

/// Number of grid cells a service occupies: whole slots, rounded up. The
/// catalog sells 20- and 25-minute services; each still blocks a full cell.
pub fn span_slots(duration_min: i64) -> u32 {
    let duration = duration_min.max(1) as u32;
    duration.div_ceil(SLOT_MINUTES)
}

/// Minute-of-day at which the occupied span ends, slot-aligned.
pub fn span_end_minute(time: NaiveTime, duration_min: i64) -> u32 {
    minute_of_day(time) + span_slots(duration_min) * SLOT_MINUTES
}

/// A span must not run past closing: the grid has no cell to absorb it.
pub fn span_fits(time: NaiveTime, duration_min: i64) -> bool {
    span_end_minute(time, duration_min) <= CLOSING_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn grid_has_eighteen_slots() {
        let slots = day_slots();
        assert_eq!(slots.len(), 18);
        assert_eq!(slots[0], at(9, 0));
        assert_eq!(slots[17], at(17, 30));
    }

    #[test]
    fn date_range_is_contiguous() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let range = date_range(from, DEFAULT_WINDOW_DAYS);
        assert_eq!(range.len(), 14);
        assert_eq!(range[0], from);
        for pair in range.windows(2) {
            assert_eq!(pair[1] - pair[0], chrono::Duration::days(1));
        }
    }

    #[test]
    fn slot_index_accepts_the_grid_only() {
        assert_eq!(slot_index(at(9, 0)), Some(0));
        assert_eq!(slot_index(at(17, 30)), Some(17));
        assert_eq!(slot_index(at(8, 30)), None);
        assert_eq!(slot_index(at(18, 0)), None);
        assert_eq!(slot_index(at(10, 15)), None);
        assert_eq!(slot_index(NaiveTime::from_hms_opt(10, 0, 30).unwrap()), None);
    }

    #[test]
    fn spans_round_up_to_whole_slots() {
        assert_eq!(span_slots(20), 1);
        assert_eq!(span_slots(25), 1);
        assert_eq!(span_slots(30), 1);
        assert_eq!(span_slots(45), 2);
        assert_eq!(span_slots(60), 2);
        assert_eq!(span_slots(61), 3);
    }

    #[test]
    fn span_end_is_slot_aligned() {
        assert_eq!(span_end_minute(at(10, 0), 45), 11 * 60);
        assert_eq!(span_end_minute(at(10, 0), 60), 11 * 60);
        assert_eq!(span_end_minute(at(17, 30), 30), CLOSING_MINUTE);
    }

    #[test]
    fn long_services_cannot_start_at_the_last_slot() {
        assert!(span_fits(at(17, 30), 30));
        assert!(!span_fits(at(17, 30), 45));
        assert!(span_fits(at(17, 0), 60));
        assert!(!span_fits(at(17, 30), 60));
    }
}
