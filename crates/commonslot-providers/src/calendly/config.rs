//! Calendly provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// How requests to the Calendly API are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Exchange a client id and secret for a short-lived token.
    #[default]
    ClientCredentials,
    /// Send a fixed personal access token.
    PersonalToken,
    /// Send no credential (only public booking pages are reachable).
    Public,
}

impl AccessMode {
    /// Returns the config-file name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::PersonalToken => "personal_token",
            Self::Public => "public",
        }
    }
}

/// Which upstream shape availability is fetched in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Bookable start times of the identity's event type.
    #[default]
    AvailableTimes,
    /// Busy intervals plus the user's working-hours schedule.
    BusyTimes,
    /// Date/time pairs scraped from the public booking page.
    PageExtract,
}

impl FetchStrategy {
    /// Returns the config-file name of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AvailableTimes => "available_times",
            Self::BusyTimes => "busy_times",
            Self::PageExtract => "page_extract",
        }
    }
}

/// Configuration for the Calendly provider.
#[derive(Debug, Clone)]
pub struct CalendlyConfig {
    /// Base URL of the REST API.
    pub api_base: Url,
    /// Base URL of the OAuth token endpoint.
    pub auth_base: Url,
    /// Base URL of public booking pages.
    pub booking_base: Url,
    /// Fetch strategy.
    pub strategy: FetchStrategy,
    /// Request timeout, applied to every call.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl CalendlyConfig {
    /// Default API base URL.
    pub const DEFAULT_API_BASE: &'static str = "https://api.calendly.com";

    /// Default auth base URL.
    pub const DEFAULT_AUTH_BASE: &'static str = "https://auth.calendly.com";

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Longest span a single availability query may cover.
    pub const MAX_QUERY_DAYS: i64 = 7;

    /// Sets the API base URL.
    pub fn with_api_base(mut self, url: Url) -> Self {
        self.api_base = url;
        self
    }

    /// Sets the auth base URL.
    pub fn with_auth_base(mut self, url: Url) -> Self {
        self.auth_base = url;
        self
    }

    /// Sets the booking page base URL.
    pub fn with_booking_base(mut self, url: Url) -> Self {
        self.booking_base = url;
        self
    }

    /// Sets the booking page base from a bare host name.
    pub fn with_booking_host(self, host: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(&format!("https://{}", host))?;
        Ok(self.with_booking_base(url))
    }

    /// Sets the fetch strategy.
    pub fn with_strategy(mut self, strategy: FetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns `api_base` joined with `path`.
    pub fn api_url(&self, path: &str) -> String {
        join(&self.api_base, path)
    }

    /// Returns the token endpoint URL.
    pub fn token_url(&self) -> String {
        join(&self.auth_base, "/oauth/token")
    }

    /// Returns the public booking page URL for a user and event slug.
    pub fn booking_url(&self, user: &str, event_kind: Option<&str>) -> String {
        let mut path = format!("/{}", urlencoding::encode(user));
        if let Some(kind) = event_kind {
            path.push('/');
            path.push_str(&urlencoding::encode(kind));
        }
        join(&self.booking_base, &path)
    }
}

impl Default for CalendlyConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(Self::DEFAULT_API_BASE).expect("valid default API URL"),
            auth_base: Url::parse(Self::DEFAULT_AUTH_BASE).expect("valid default auth URL"),
            booking_base: Url::parse("https://calendly.com").expect("valid default booking URL"),
            strategy: FetchStrategy::default(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("commonslot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn join(base: &Url, path: &str) -> String {
    format!("{}{}", base.as_str().trim_end_matches('/'), path)
}
