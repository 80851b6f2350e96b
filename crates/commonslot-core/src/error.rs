//! Request-level error taxonomy.
//!
//! Every failure that can end an availability request is one of the
//! [`AvailabilityError`] variants. Each variant reports a machine-readable
//! [`ErrorKind`] so outer layers can pick a status code without matching on
//! message text.

use std::fmt;

use thiserror::Error;

/// Machine-distinguishable category of an [`AvailabilityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is malformed (e.g. no identities).
    InvalidRequest,
    /// An identity string could not be resolved.
    InvalidIdentity,
    /// The requested date range is unparsable or violates the window policy.
    InvalidRange,
    /// Client credentials are missing from the configuration.
    AuthConfig,
    /// The token endpoint rejected the credential exchange.
    AuthFetch,
    /// An upstream lookup or availability call failed for one identity.
    Upstream,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Returns the stable snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidIdentity => "invalid_identity",
            Self::InvalidRange => "invalid_range",
            Self::AuthConfig => "auth_config",
            Self::AuthFetch => "auth_fetch",
            Self::Upstream => "upstream",
            Self::Internal => "internal",
        }
    }

    /// Returns true for faults the caller can fix by changing the request.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest | Self::InvalidIdentity | Self::InvalidRange
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that aborts an availability request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    /// The request named no identities.
    #[error("No identities provided")]
    NoIdentities,

    /// The requested meeting length is outside the supported range.
    #[error("invalid duration: {minutes} minutes (expected 1..=1440)")]
    InvalidDuration { minutes: u32 },

    /// The input is neither a bare username nor a booking-page URL.
    #[error("invalid identity {input:?}: expected a username or a booking page URL")]
    InvalidIdentity { input: String },

    /// The date range failed validation.
    #[error("invalid date range: {reason}")]
    InvalidRange { reason: String },

    /// Client credentials are not configured.
    #[error("authentication not configured: {message}")]
    AuthConfig { message: String },

    /// The token endpoint refused to issue a credential.
    #[error("failed to fetch access token: {message}")]
    AuthFetch { status: Option<u16>, message: String },

    /// Fetching availability for one identity failed.
    #[error("failed to fetch availability for {identity}: {message}")]
    Upstream {
        identity: String,
        status: Option<u16>,
        message: String,
    },

    /// A fan-out task ended without producing a result.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AvailabilityError {
    /// Creates an invalid identity error.
    pub fn invalid_identity(input: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            input: input.into(),
        }
    }

    /// Creates an invalid range error.
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }

    /// Creates an upstream error for the given identity.
    pub fn upstream(
        identity: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            identity: identity.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoIdentities | Self::InvalidDuration { .. } => ErrorKind::InvalidRequest,
            Self::InvalidIdentity { .. } => ErrorKind::InvalidIdentity,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::AuthConfig { .. } => ErrorKind::AuthConfig,
            Self::AuthFetch { .. } => ErrorKind::AuthFetch,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

/// A specialized Result type for availability operations.
pub type AvailabilityResult<T> = Result<T, AvailabilityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_from_variants() {
        assert_eq!(
            AvailabilityError::invalid_identity("x y").kind(),
            ErrorKind::InvalidIdentity
        );
        assert_eq!(
            AvailabilityError::invalid_range("end before start").kind(),
            ErrorKind::InvalidRange
        );
        assert_eq!(
            AvailabilityError::upstream("alice", Some(500), "boom").kind(),
            ErrorKind::Upstream
        );
        assert_eq!(AvailabilityError::NoIdentities.kind(), ErrorKind::InvalidRequest);
        assert_eq!(
            AvailabilityError::InvalidDuration { minutes: 0 }.kind(),
            ErrorKind::InvalidRequest
        );
    }

    #[test]
    fn client_faults() {
        assert!(ErrorKind::InvalidIdentity.is_client_fault());
        assert!(ErrorKind::InvalidRange.is_client_fault());
        assert!(!ErrorKind::AuthConfig.is_client_fault());
        assert!(!ErrorKind::Upstream.is_client_fault());
    }

    #[test]
    fn upstream_display_names_identity() {
        let err = AvailabilityError::upstream("bob", None, "not found");
        assert_eq!(
            err.to_string(),
            "failed to fetch availability for bob: not found"
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(ErrorKind::AuthFetch.as_str(), "auth_fetch");
        assert_eq!(ErrorKind::Upstream.to_string(), "upstream");
    }
}
