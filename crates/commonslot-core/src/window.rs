//! Date windows and the range validation policy.
//!
//! A [`DateWindow`] is the inclusive range of calendar dates a request asks
//! about. It is only ever produced by [`RangeValidator::validate`], so every
//! window in the system satisfies `end >= start` and the maximum-span policy.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use regex::Regex;

use crate::error::{AvailabilityError, AvailabilityResult};

/// Maximum span between start and end date, in days.
pub const MAX_WINDOW_DAYS: i64 = 7;

/// Wire format for request dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// An inclusive range of dates, anchored at a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start_date: NaiveDate,
    end_date: NaiveDate,
    offset: FixedOffset,
}

impl DateWindow {
    /// Returns the first date of the window.
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the last date of the window (inclusive).
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns the offset the window's midnights are anchored at.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Returns midnight of the start date.
    pub fn start(&self) -> DateTime<Utc> {
        self.midnight(self.start_date)
    }

    /// Returns midnight after the end date, making the end date inclusive.
    pub fn end(&self) -> DateTime<Utc> {
        let after = self.end_date.succ_opt().unwrap_or(self.end_date);
        self.midnight(after)
    }

    /// Returns the number of days between start and end date.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Returns true if the instant falls in `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start() <= dt && dt < self.end()
    }

    /// Splits the window's instant range into consecutive pieces no longer
    /// than `max`.
    ///
    /// Some upstream endpoints cap the span of a single query; callers issue
    /// one request per chunk.
    pub fn chunks(&self, max: Duration) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let end = self.end();
        let mut cursor = self.start();
        let mut out = Vec::new();

        if max <= Duration::zero() {
            return vec![(cursor, end)];
        }

        while cursor < end {
            let next = (cursor + max).min(end);
            out.push((cursor, next));
            cursor = next;
        }
        out
    }

    fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(chrono::NaiveTime::MIN);
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }
}

/// Enforces the date-window policy before any fetch is issued.
#[derive(Debug, Clone, Copy)]
pub struct RangeValidator {
    max_days: i64,
    offset: FixedOffset,
}

impl Default for RangeValidator {
    fn default() -> Self {
        Self::new(MAX_WINDOW_DAYS)
    }
}

impl RangeValidator {
    /// Creates a validator with the given maximum span, anchored at UTC.
    pub fn new(max_days: i64) -> Self {
        Self {
            max_days,
            offset: utc_offset(),
        }
    }

    /// Builder method to anchor produced windows at a UTC offset.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Returns the maximum allowed span in days.
    pub fn max_days(&self) -> i64 {
        self.max_days
    }

    /// Parses and validates a `YYYY-MM-DD` date pair.
    ///
    /// # Errors
    ///
    /// Returns [`AvailabilityError::InvalidRange`] if either date fails to
    /// parse, the end precedes the start, or the span exceeds the maximum.
    pub fn validate(&self, start_date: &str, end_date: &str) -> AvailabilityResult<DateWindow> {
        let start = parse_date(start_date, "startDate")?;
        let end = parse_date(end_date, "endDate")?;

        if end < start {
            return Err(AvailabilityError::invalid_range(format!(
                "endDate {} is before startDate {}",
                end, start
            )));
        }

        let span = (end - start).num_days();
        if span > self.max_days {
            return Err(AvailabilityError::invalid_range(format!(
                "range spans {} days, maximum is {}",
                span, self.max_days
            )));
        }

        Ok(DateWindow {
            start_date: start,
            end_date: end,
            offset: self.offset,
        })
    }
}

/// Validates a date pair with the default policy.
pub fn validate(start_date: &str, end_date: &str) -> AvailabilityResult<DateWindow> {
    RangeValidator::default().validate(start_date, end_date)
}

/// Returns the zero UTC offset.
pub fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is valid")
}

fn parse_date(value: &str, field: &str) -> AvailabilityResult<NaiveDate> {
    let value = value.trim();
    if !DATE_RE.is_match(value) {
        return Err(AvailabilityError::invalid_range(format!(
            "{} {:?} is not a YYYY-MM-DD date",
            field, value
        )));
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        AvailabilityError::invalid_range(format!("{} {:?} is not a valid date: {}", field, value, e))
    })
}
