//! Request and response types for the availability boundary.

use commonslot_core::{AvailabilityError, ErrorKind, Slot};
use serde::{Deserialize, Serialize};

/// Meeting length used when a request does not name one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Message attached to an empty, successful response.
pub const NO_COMMON_AVAILABILITY: &str = "No common availability found";

/// A joint availability query.
///
/// Older callers sent the identity list as `usernames` or `eventUrls`; both
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    /// Usernames or booking page URLs, one per person.
    #[serde(default, alias = "usernames", alias = "eventUrls")]
    pub identities: Vec<String>,
    /// First date, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last date (inclusive), `YYYY-MM-DD`.
    pub end_date: String,
    /// Meeting length in minutes.
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

impl AvailabilityRequest {
    /// Creates a request for the given identities and dates.
    pub fn new(
        identities: impl IntoIterator<Item = impl Into<String>>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            identities: identities.into_iter().map(Into::into).collect(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            duration_minutes: None,
        }
    }

    /// Builder method to set the meeting length.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Returns the requested duration, or `default` when absent.
    pub fn duration_or(&self, default: u32) -> u32 {
        self.duration_minutes.unwrap_or(default)
    }
}

/// A slot as rendered on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Display time, e.g. `2:00 PM`.
    pub time: String,
    /// Duration label, e.g. `30min`.
    pub duration: String,
}

impl From<&Slot> for SlotView {
    fn from(slot: &Slot) -> Self {
        Self {
            date: slot.date_string(),
            time: slot.display_time(),
            duration: slot.duration_label(),
        }
    }
}

/// A successful availability response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Common slots, sorted by date then time.
    pub slots: Vec<SlotView>,
    /// Informational note, present when no slot is common.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AvailabilityResponse {
    /// Builds a response from intersected slots.
    pub fn from_slots(slots: &[Slot]) -> Self {
        let message = slots.is_empty().then(|| NO_COMMON_AVAILABILITY.to_string());
        Self {
            slots: slots.iter().map(SlotView::from).collect(),
            message,
        }
    }

    /// Returns true if no common slot was found.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Wire error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request body is malformed.
    InvalidRequest,
    /// An identity did not resolve.
    InvalidIdentity,
    /// The date range was rejected.
    InvalidRange,
    /// Server-side credentials are missing.
    AuthConfig,
    /// The credential exchange failed.
    AuthFetch,
    /// An upstream call failed.
    Upstream,
    /// Unexpected failure.
    Internal,
}

impl ErrorCode {
    /// Returns the HTTP status an outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest | Self::InvalidIdentity | Self::InvalidRange => 400,
            Self::AuthConfig | Self::AuthFetch => 401,
            Self::Upstream => 502,
            Self::Internal => 500,
        }
    }

    /// Returns a human-readable description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "The request was invalid",
            Self::InvalidIdentity => "An identity could not be resolved",
            Self::InvalidRange => "The date range was rejected",
            Self::AuthConfig => "Scheduling service authentication is not configured",
            Self::AuthFetch => "Scheduling service authentication failed",
            Self::Upstream => "The scheduling service returned an error",
            Self::Internal => "An internal error occurred",
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidRequest => Self::InvalidRequest,
            ErrorKind::InvalidIdentity => Self::InvalidIdentity,
            ErrorKind::InvalidRange => Self::InvalidRange,
            ErrorKind::AuthConfig => Self::AuthConfig,
            ErrorKind::AuthFetch => Self::AuthFetch,
            ErrorKind::Upstream => Self::Upstream,
            ErrorKind::Internal => Self::Internal,
        }
    }
}

/// A failed availability response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The surfaced message.
    pub error: String,
    /// Machine-readable code.
    pub code: ErrorCode,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }

    /// Creates an invalid request error.
    pub fn invalid_request(error: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, error)
    }

    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

impl From<&AvailabilityError> for ErrorResponse {
    fn from(err: &AvailabilityError) -> Self {
        Self::new(err.kind().into(), err.to_string())
    }
}

impl From<AvailabilityError> for ErrorResponse {
    fn from(err: AvailabilityError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.error)
    }
}

impl std::error::Error for ErrorResponse {}
