//! Identity resolution.
//!
//! Users name the people they want to meet with either by bare username
//! (`alice`) or by pasting a booking page URL
//! (`https://www.calendly.com/alice/30min?month=2024-06`). Both resolve to an
//! [`Identity`]. Resolution is purely syntactic; no network access happens
//! here.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AvailabilityError, AvailabilityResult};

/// The booking host used when none is configured.
pub const DEFAULT_BOOKING_HOST: &str = "calendly.com";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid username regex"));

/// Canonical reference to one person (and optionally one of their event types).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// The provider-side user slug, lowercased.
    pub provider_user: String,
    /// The event type slug, when the input named one.
    pub event_kind: Option<String>,
}

impl Identity {
    /// Creates an identity for a user without an event kind.
    pub fn user(provider_user: impl Into<String>) -> Self {
        Self {
            provider_user: provider_user.into(),
            event_kind: None,
        }
    }

    /// Builder method to set the event kind.
    pub fn with_event_kind(mut self, event_kind: impl Into<String>) -> Self {
        self.event_kind = Some(event_kind.into());
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event_kind {
            Some(ref kind) => write!(f, "{}/{}", self.provider_user, kind),
            None => f.write_str(&self.provider_user),
        }
    }
}

/// Parses user-supplied strings into [`Identity`] values for one booking host.
#[derive(Debug, Clone)]
pub struct Resolver {
    booking_host: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_BOOKING_HOST)
    }
}

impl Resolver {
    /// Creates a resolver that accepts URLs on the given host.
    ///
    /// A leading `www.` on the configured host is ignored.
    pub fn new(booking_host: impl AsRef<str>) -> Self {
        let host = booking_host.as_ref().trim().to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        Self { booking_host: host }
    }

    /// Returns the booking host this resolver matches.
    pub fn booking_host(&self) -> &str {
        &self.booking_host
    }

    /// Resolves a username or booking page URL.
    ///
    /// # Errors
    ///
    /// Returns [`AvailabilityError::InvalidIdentity`] when the input is not a
    /// bare username and not a URL on the booking host with at least a
    /// `/{user}/{event}` path.
    pub fn resolve(&self, input: &str) -> AvailabilityResult<Identity> {
        let trimmed = input.trim();

        if USERNAME_RE.is_match(trimmed) {
            return Ok(Identity::user(trimmed.to_lowercase()));
        }

        self.resolve_url(trimmed)
            .ok_or_else(|| AvailabilityError::invalid_identity(input))
    }

    /// Resolves every input, stopping at the first invalid one.
    pub fn resolve_all<S: AsRef<str>>(&self, inputs: &[S]) -> AvailabilityResult<Vec<Identity>> {
        inputs.iter().map(|i| self.resolve(i.as_ref())).collect()
    }

    fn resolve_url(&self, input: &str) -> Option<Identity> {
        if input.is_empty() || input.chars().any(char::is_whitespace) {
            return None;
        }

        let lower = input.to_lowercase();
        let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
            input.to_string()
        } else if lower.contains("://") {
            return None;
        } else {
            format!("https://{}", input)
        };

        let url = Url::parse(&with_scheme).ok()?;
        let host = url.host_str()?.to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if host != self.booking_host {
            return None;
        }

        let mut segments = url
            .path_segments()?
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());

        let user = segments.next()?;
        let event = segments.next()?;

        Some(Identity::user(user).with_event_kind(event))
    }
}

/// Resolves an input against the default booking host.
pub fn resolve(input: &str) -> AvailabilityResult<Identity> {
    Resolver::default().resolve(input)
}
