//! RawAvailability to Slot conversion.
//!
//! One strategy per [`RawAvailability`] shape:
//! 1. Windows map 1:1 to slots when the entry is available and has capacity
//! 2. Busy rules turn each candidate start into a slot when it fits working
//!    hours and overlaps no busy interval
//! 3. Extracted pairs become slots when they pass a strict format check;
//!    they are read as UTC, and malformed pairs are dropped, never reported
//!    as errors
//!
//! Every output slot carries the requested duration.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use commonslot_core::{DateWindow, Slot, dedup_slots, utc_offset};
use regex::Regex;
use tracing::debug;

use crate::raw_availability::{
    BusyInterval, ExtractedEntry, RawAvailability, RawWindow, WeeklySchedule,
};

static STRICT_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

static STRICT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("valid time regex"));

/// Loose pair scanner; the strict check happens during normalization.
static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{1,2}-\d{1,2})(?:T|\s+)(\d{1,2}:\d{2})").expect("valid pair regex")
});

/// Parameters shared by all normalization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Duration stamped on every output slot, and the candidate length.
    pub duration_minutes: u32,
    /// Offset slots are rendered in and working hours are evaluated at.
    /// Extracted pairs carry no offset and are read as UTC before conversion.
    pub display_offset: FixedOffset,
}

impl NormalizeOptions {
    /// Creates options for the given duration, rendering in UTC.
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            duration_minutes,
            display_offset: utc_offset(),
        }
    }

    /// Builder method to set the display offset.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Converts raw availability into canonical slots.
///
/// The result is deduplicated but keeps source order.
pub fn normalize(raw: &RawAvailability, options: &NormalizeOptions) -> Vec<Slot> {
    let slots = match raw {
        RawAvailability::Windows(windows) => normalize_windows(windows, options),
        RawAvailability::BusyRules {
            candidates,
            busy,
            schedule,
        } => normalize_busy_rules(candidates, busy, schedule, options),
        RawAvailability::Extracted(entries) => normalize_extracted(entries, options),
    };

    let slots = dedup_slots(&slots);
    debug!(
        shape = raw.kind(),
        raw = raw.len(),
        slots = slots.len(),
        "normalized availability"
    );
    slots
}

/// Generates candidate start times from the window start to its end,
/// stepping by `duration_minutes`.
///
/// Only candidates whose full duration fits inside the window are kept.
pub fn candidate_grid(window: &DateWindow, duration_minutes: u32) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(i64::from(duration_minutes));
    if step <= Duration::zero() {
        return Vec::new();
    }

    let end = window.end();
    let mut cursor = window.start();
    let mut out = Vec::new();
    while cursor + step <= end {
        out.push(cursor);
        cursor += step;
    }
    out
}

/// Scans free text for `YYYY-MM-DD` followed by `HH:MM`.
///
/// The scan is loose on purpose: pairs such as `2024-6-3 9:00` are returned
/// here and dropped by [`normalize`].
pub fn extract_pairs(text: &str) -> Vec<ExtractedEntry> {
    PAIR_RE
        .captures_iter(text)
        .map(|caps| ExtractedEntry::new(&caps[1], &caps[2]))
        .collect()
}

fn normalize_windows(windows: &[RawWindow], options: &NormalizeOptions) -> Vec<Slot> {
    windows
        .iter()
        .filter(|w| is_bookable(w))
        .map(|w| Slot::from_instant(w.start_time, &options.display_offset, options.duration_minutes))
        .collect()
}

fn is_bookable(window: &RawWindow) -> bool {
    window.status.eq_ignore_ascii_case("available")
        && window.invitees_remaining.is_none_or(|n| n > 0)
}

fn normalize_busy_rules(
    candidates: &[DateTime<Utc>],
    busy: &[BusyInterval],
    schedule: &WeeklySchedule,
    options: &NormalizeOptions,
) -> Vec<Slot> {
    let duration = options.duration();

    candidates
        .iter()
        .filter(|&&start| {
            let end = start + duration;
            within_working_hours(start, end, schedule, &options.display_offset)
                && !busy.iter().any(|b| b.overlaps(start, end))
        })
        .map(|&start| Slot::from_instant(start, &options.display_offset, options.duration_minutes))
        .collect()
}

fn within_working_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    schedule: &WeeklySchedule,
    offset: &FixedOffset,
) -> bool {
    let local_start = start.with_timezone(offset).naive_local();
    let local_end = end.with_timezone(offset).naive_local();
    let date = local_start.date();

    schedule.intervals_for(date).iter().any(|iv| {
        let (from, to) = interval_bounds(date, iv.from, iv.to);
        from <= local_start && local_end <= to
    })
}

/// A `to` at or before `from` (typically `00:00`) means end of day.
fn interval_bounds(date: NaiveDate, from: NaiveTime, to: NaiveTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(from);
    let end = if to <= from {
        date.succ_opt().unwrap_or(date).and_time(NaiveTime::MIN)
    } else {
        date.and_time(to)
    };
    (start, end)
}

fn normalize_extracted(entries: &[ExtractedEntry], options: &NormalizeOptions) -> Vec<Slot> {
    entries
        .iter()
        .filter_map(extracted_instant)
        .map(|t| Slot::from_instant(t, &options.display_offset, options.duration_minutes))
        .collect()
}

/// Reads an extracted pair as a UTC instant.
///
/// Returns `None` for pairs that fail the strict `YYYY-MM-DD` / `HH:MM`
/// check or name an impossible date or time.
pub fn extracted_instant(entry: &ExtractedEntry) -> Option<DateTime<Utc>> {
    let date = entry.date.trim();
    let time = entry.time.trim();
    if !STRICT_DATE_RE.is_match(date) || !STRICT_TIME_RE.is_match(time) {
        debug!(date, time, "dropping malformed extracted pair");
        return None;
    }

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(date.and_time(time).and_utc())
}
