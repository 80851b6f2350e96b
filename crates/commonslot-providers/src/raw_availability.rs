//! Provider-shaped availability payloads.
//!
//! A fetcher hands one [`RawAvailability`] to the normalizer per identity.
//! The three variants mirror the three ways a scheduling source can expose
//! free time: explicit bookable windows, busy intervals plus working-hour
//! rules, or date/time pairs extracted from free text.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Raw availability for one identity.
#[derive(Debug, Clone, PartialEq)]
pub enum RawAvailability {
    /// Explicit bookable start times.
    Windows(Vec<RawWindow>),
    /// Busy intervals plus a weekly working-hours schedule, evaluated at
    /// each candidate start time.
    BusyRules {
        candidates: Vec<DateTime<Utc>>,
        busy: Vec<BusyInterval>,
        schedule: WeeklySchedule,
    },
    /// Best-effort date/time pairs extracted from text.
    Extracted(Vec<ExtractedEntry>),
}

impl RawAvailability {
    /// Returns the shape name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Windows(_) => "windows",
            Self::BusyRules { .. } => "busy_rules",
            Self::Extracted(_) => "extracted",
        }
    }

    /// Returns the number of raw entries carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Windows(w) => w.len(),
            Self::BusyRules { candidates, .. } => candidates.len(),
            Self::Extracted(e) => e.len(),
        }
    }

    /// Returns true if no raw entries are carried.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One bookable start time as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawWindow {
    /// e.g. "available".
    pub status: String,
    pub start_time: DateTime<Utc>,
    /// Remaining capacity; absent when the source does not report it.
    #[serde(default, alias = "spots_available")]
    pub invitees_remaining: Option<u32>,
}

impl RawWindow {
    /// Creates an available window with no capacity information.
    pub fn available(start_time: DateTime<Utc>) -> Self {
        Self {
            status: "available".into(),
            start_time,
            invitees_remaining: None,
        }
    }

    /// Builder method to set remaining capacity.
    pub fn with_remaining(mut self, remaining: u32) -> Self {
        self.invitees_remaining = Some(remaining);
        self
    }
}

/// A half-open busy interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Creates a new busy interval.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns true if `[start, end)` overlaps this interval.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

/// Local working-hours interval `[from, to)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingInterval {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl WorkingInterval {
    /// Creates a new working interval.
    pub fn new(from: NaiveTime, to: NaiveTime) -> Self {
        Self { from, to }
    }
}

/// Which days a schedule rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    /// Every occurrence of a weekday.
    Weekday(Weekday),
    /// One specific date, overriding the weekday rule.
    Date(NaiveDate),
}

/// A working-hours rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRule {
    pub target: RuleTarget,
    /// An empty list on a date rule marks the whole day unavailable.
    pub intervals: Vec<WorkingInterval>,
}

/// Weekly working hours with date overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub rules: Vec<ScheduleRule>,
}

impl WeeklySchedule {
    /// Creates an empty schedule (never working).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a weekday rule.
    pub fn with_weekday(mut self, day: Weekday, intervals: Vec<WorkingInterval>) -> Self {
        self.rules.push(ScheduleRule {
            target: RuleTarget::Weekday(day),
            intervals,
        });
        self
    }

    /// Builder method to add a date override.
    pub fn with_date(mut self, date: NaiveDate, intervals: Vec<WorkingInterval>) -> Self {
        self.rules.push(ScheduleRule {
            target: RuleTarget::Date(date),
            intervals,
        });
        self
    }

    /// Returns the working intervals in effect on `date`.
    pub fn intervals_for(&self, date: NaiveDate) -> &[WorkingInterval] {
        use chrono::Datelike;

        let by_date = self
            .rules
            .iter()
            .find(|r| r.target == RuleTarget::Date(date));
        if let Some(rule) = by_date {
            return &rule.intervals;
        }

        let weekday = date.weekday();
        self.rules
            .iter()
            .find(|r| r.target == RuleTarget::Weekday(weekday))
            .map(|r| r.intervals.as_slice())
            .unwrap_or(&[])
    }
}

/// One date/time pair from unstructured extraction, kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntry {
    pub date: String,
    pub time: String,
}

impl ExtractedEntry {
    /// Creates a new extracted entry.
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, h, m, 0).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn overlap_is_half_open() {
        let busy = BusyInterval::new(at(10, 0), at(11, 0));
        assert!(busy.overlaps(at(10, 30), at(11, 30)));
        assert!(busy.overlaps(at(9, 30), at(10, 30)));
        assert!(!busy.overlaps(at(11, 0), at(11, 30)));
        assert!(!busy.overlaps(at(9, 30), at(10, 0)));
    }

    #[test]
    fn date_rule_overrides_weekday() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let next_monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let schedule = WeeklySchedule::new()
            .with_weekday(Weekday::Mon, vec![WorkingInterval::new(t(9), t(17))])
            .with_date(next_monday, vec![]);

        assert_eq!(schedule.intervals_for(monday).len(), 1);
        assert!(schedule.intervals_for(next_monday).is_empty());
        assert!(
            schedule
                .intervals_for(NaiveDate::from_ymd_opt(2024, 6, 4).unwrap())
                .is_empty()
        );
    }

    #[test]
    fn raw_window_accepts_spots_alias() {
        let json = r#"{"status":"available","start_time":"2024-06-03T14:00:00Z","spots_available":2}"#;
        let window: RawWindow = serde_json::from_str(json).unwrap();
        assert_eq!(window.invitees_remaining, Some(2));
    }

    #[test]
    fn kind_and_len() {
        let raw = RawAvailability::Windows(vec![RawWindow::available(at(9, 0))]);
        assert_eq!(raw.kind(), "windows");
        assert_eq!(raw.len(), 1);
        assert!(RawAvailability::Extracted(vec![]).is_empty());
    }
}
