//! The canonical slot type.
//!
//! A [`Slot`] is one candidate meeting start. Two slots are the same slot when
//! they share date and start time; the duration travels along but never takes
//! part in matching.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for slot times ("2:00 PM").
pub const DISPLAY_TIME_FORMAT: &str = "%-I:%M %p";

/// One candidate meeting time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Slot {
    /// Local calendar date of the slot.
    pub date: NaiveDate,
    /// Local start time of the slot.
    pub time: NaiveTime,
    /// Requested meeting length.
    pub duration_minutes: u32,
}

impl Slot {
    /// Creates a new slot.
    pub fn new(date: NaiveDate, time: NaiveTime, duration_minutes: u32) -> Self {
        Self {
            date,
            time,
            duration_minutes,
        }
    }

    /// Creates a slot from an instant, rendered at the given offset.
    pub fn from_instant(start: DateTime<Utc>, offset: &FixedOffset, duration_minutes: u32) -> Self {
        let local = start.with_timezone(offset).naive_local();
        Self::new(local.date(), local.time(), duration_minutes)
    }

    /// Returns the matching key of this slot.
    pub fn key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }

    /// Returns the date as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Returns the time in display form, e.g. `10:00 AM`.
    pub fn display_time(&self) -> String {
        self.time.format(DISPLAY_TIME_FORMAT).to_string()
    }

    /// Returns the duration as `<n>min`.
    pub fn duration_label(&self) -> String {
        format!("{}min", self.duration_minutes)
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Slot {}

impl Hash for Slot {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Removes repeated slots, keeping the first occurrence of each key.
///
/// Applying it to an already deduplicated list returns the list unchanged.
pub fn dedup_slots(slots: &[Slot]) -> Vec<Slot> {
    let mut seen = std::collections::HashSet::with_capacity(slots.len());
    slots.iter().filter(|s| seen.insert(s.key())).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot(d: u32, h: u32, m: u32, dur: u32) -> Slot {
        Slot::new(
            NaiveDate::from_ymd_opt(2024, 6, d).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            dur,
        )
    }

    #[test]
    fn equality_ignores_duration() {
        assert_eq!(slot(3, 14, 0, 30), slot(3, 14, 0, 60));
        assert_ne!(slot(3, 14, 0, 30), slot(3, 14, 30, 30));
    }

    #[test]
    fn display_forms() {
        let s = slot(3, 14, 0, 30);
        assert_eq!(s.date_string(), "2024-06-03");
        assert_eq!(s.display_time(), "2:00 PM");
        assert_eq!(s.duration_label(), "30min");
        assert_eq!(slot(3, 0, 15, 30).display_time(), "12:15 AM");
        assert_eq!(slot(3, 10, 0, 30).display_time(), "10:00 AM");
    }

    #[test]
    fn ordering_is_chronological() {
        let mut slots = vec![slot(4, 9, 0, 30), slot(3, 14, 0, 30), slot(3, 9, 0, 30), slot(3, 10, 0, 30)];
        slots.sort();
        assert_eq!(
            slots,
            vec![slot(3, 9, 0, 30), slot(3, 10, 0, 30), slot(3, 14, 0, 30), slot(4, 9, 0, 30)]
        );
    }

    #[test]
    fn from_instant_applies_offset() {
        let start = Utc.with_ymd_and_hms(2024, 6, 3, 23, 30, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(Slot::from_instant(start, &utc, 30), slot(3, 23, 30, 30));

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = Slot::from_instant(start, &plus_two, 30);
        assert_eq!(local.date_string(), "2024-06-04");
        assert_eq!(local.display_time(), "1:30 AM");
    }

    #[test]
    fn dedup_keeps_first_and_is_idempotent() {
        let input = vec![slot(3, 10, 0, 30), slot(3, 14, 0, 30), slot(3, 10, 0, 45)];
        let once = dedup_slots(&input);
        assert_eq!(once.len(), 2);
        assert_eq!(once[0].duration_minutes, 30);

        let twice = dedup_slots(&once);
        assert_eq!(once.len(), twice.len());
        assert!(once.iter().zip(&twice).all(|(a, b)| a.key() == b.key()));
    }
}
