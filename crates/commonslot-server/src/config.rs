//! Engine configuration.

use chrono::FixedOffset;
use commonslot_core::{DEFAULT_BOOKING_HOST, MAX_WINDOW_DAYS, RangeValidator, Resolver, utc_offset};
use commonslot_protocol::DEFAULT_DURATION_MINUTES;

use crate::error::{ServerError, ServerResult};

/// Longest meeting a request may ask for, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Availability engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Duration used when a request does not name one.
    pub default_duration_minutes: u32,

    /// Maximum span between start and end date, in days.
    pub max_window_days: i64,

    /// Offset slots are rendered in and working hours are evaluated at.
    pub display_offset: FixedOffset,

    /// Host booking-page URLs must point at.
    pub booking_host: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            max_window_days: MAX_WINDOW_DAYS,
            display_offset: utc_offset(),
            booking_host: DEFAULT_BOOKING_HOST.to_string(),
        }
    }
}

impl EngineConfig {
    /// Builder: set the default duration.
    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Builder: set the maximum window span.
    pub fn with_max_window_days(mut self, days: i64) -> Self {
        self.max_window_days = days;
        self
    }

    /// Builder: set the display offset.
    pub fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// Builder: set the display offset from minutes east of UTC.
    pub fn with_display_offset_minutes(self, minutes: i32) -> ServerResult<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ServerError::config(format!("display offset out of range: {minutes} minutes")))?;
        Ok(self.with_display_offset(offset))
    }

    /// Builder: set the booking host.
    pub fn with_booking_host(mut self, host: impl Into<String>) -> Self {
        self.booking_host = host.into();
        self
    }

    /// Checks that the configuration can serve requests.
    pub fn validate(&self) -> ServerResult<()> {
        if !(1..=MAX_DURATION_MINUTES).contains(&self.default_duration_minutes) {
            return Err(ServerError::config(format!(
                "default duration must be between 1 and {} minutes, got {}",
                MAX_DURATION_MINUTES, self.default_duration_minutes
            )));
        }
        if self.max_window_days < 0 {
            return Err(ServerError::config(format!(
                "max window days must not be negative, got {}",
                self.max_window_days
            )));
        }
        if self.booking_host.trim().is_empty() {
            return Err(ServerError::config("booking host must not be empty"));
        }
        Ok(())
    }

    /// Returns the range validator for this configuration.
    pub fn range_validator(&self) -> RangeValidator {
        RangeValidator::new(self.max_window_days).with_offset(self.display_offset)
    }

    /// Returns the identity resolver for this configuration.
    pub fn resolver(&self) -> Resolver {
        Resolver::new(&self.booking_host)
    }
}
