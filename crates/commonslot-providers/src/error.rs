//! Error types for availability provider operations.
//!
//! A [`ProviderError`] describes one failed call against the scheduling
//! service. The coordinator turns it into a request-level
//! [`AvailabilityError`] with [`ProviderError::into_availability`].

use std::fmt;

use commonslot_core::AvailabilityError;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Client credentials are missing or unusable.
    AuthConfig,
    /// The token endpoint refused the credential exchange.
    AuthFetch,
    /// The identity does not map to a provider resource.
    NotFound,
    /// Connection failed, timed out, or the body could not be read.
    Network,
    /// The service answered with a non-success status.
    Upstream,
    /// The service answered with something we could not parse.
    InvalidResponse,
    /// Unexpected provider state.
    Internal,
}

impl ProviderErrorCode {
    /// Returns a stable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthConfig => "auth_config",
            Self::AuthFetch => "auth_fetch",
            Self::NotFound => "not_found",
            Self::Network => "network",
            Self::Upstream => "upstream",
            Self::InvalidResponse => "invalid_response",
            Self::Internal => "internal",
        }
    }

    /// Returns true for errors raised while obtaining a credential.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthConfig | Self::AuthFetch)
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to a scheduling provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// HTTP status of the failed response, when there was one.
    status: Option<u16>,
    /// The provider that generated this error (e.g. "calendly").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            provider: None,
            source: None,
        }
    }

    /// Creates a missing-credentials error.
    pub fn auth_config(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthConfig, message)
    }

    /// Creates a token exchange error.
    pub fn auth_fetch(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthFetch, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Network, message)
    }

    /// Creates an error for a non-success HTTP response.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Upstream, message).with_status(status)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }

    /// Sets the HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if any.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Maps this error into the request-level taxonomy for one identity.
    ///
    /// Credential failures keep their auth kind; every other failure is an
    /// upstream error attributed to `identity`.
    pub fn into_availability(self, identity: impl Into<String>) -> AvailabilityError {
        match self.code {
            ProviderErrorCode::AuthConfig => AvailabilityError::AuthConfig {
                message: self.message,
            },
            ProviderErrorCode::AuthFetch => AvailabilityError::AuthFetch {
                status: self.status,
                message: self.message,
            },
            ProviderErrorCode::NotFound => {
                AvailabilityError::upstream(identity, self.status, "not found")
            }
            _ => AvailabilityError::upstream(identity, self.status, self.message),
        }
    }
}

impl Clone for ProviderError {
    fn clone(&self) -> Self {
        Self {
            code: self.code,
            message: self.message.clone(),
            status: self.status,
            provider: self.provider.clone(),
            source: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        Ok(())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
