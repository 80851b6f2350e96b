//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/commonslot/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`, `personal_token`) support
//! secret references:
//! - `pass::path/in/store`, resolved via `pass show`
//! - `env::VAR_NAME`, resolved from the environment
//! - plain text, used as-is

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use commonslot_core::DEFAULT_BOOKING_HOST;
use commonslot_protocol::DEFAULT_DURATION_MINUTES;
use commonslot_providers::calendly::{
    AccessMode, CalendlyConfig, CalendlyProvider, ClientCredentialsSource, FetchStrategy,
};
use commonslot_providers::{
    AvailabilityProvider, CredentialCache, CredentialProvider, StaticCredential,
};
use commonslot_server::EngineConfig;

use crate::error::{ClientError, ClientResult};
use crate::secret;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the commonslot client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Calendly provider settings.
    pub calendly: CalendlySettings,

    /// Engine settings.
    pub engine: EngineSettings,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Duration used when a query does not name one.
    pub default_duration_minutes: u32,

    /// Maximum span between start and end date, in days.
    pub max_window_days: i64,

    /// Fixed offset east of UTC slots are rendered in.
    pub display_offset_minutes: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            max_window_days: commonslot_core::MAX_WINDOW_DAYS,
            display_offset_minutes: 0,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ClientError::config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("commonslot")
    }

    /// Builds the engine configuration.
    pub fn engine_config(&self) -> ClientResult<EngineConfig> {
        let config = EngineConfig::default()
            .with_default_duration(self.engine.default_duration_minutes)
            .with_max_window_days(self.engine.max_window_days)
            .with_display_offset_minutes(self.engine.display_offset_minutes)?
            .with_booking_host(&self.calendly.booking_host);
        config.validate()?;
        Ok(config)
    }

    /// Checks every setting without contacting the provider.
    ///
    /// Secret references are resolved, so a dangling `env::` or `pass::`
    /// reference is reported here.
    pub fn validate(&self) -> ClientResult<()> {
        self.engine_config()?;
        self.calendly.to_provider_config()?;
        self.calendly.credentials()?;
        Ok(())
    }

    /// Builds the availability provider described by this configuration.
    pub fn build_provider(&self) -> ClientResult<Arc<dyn AvailabilityProvider>> {
        let config = self.calendly.to_provider_config()?;
        let credentials = self.calendly.credentials()?;
        let provider = CalendlyProvider::new(config, credentials)?;
        Ok(Arc::new(provider))
    }
}

// ---------------------------------------------------------------------------
// CalendlySettings (in config.toml, including credentials)
// ---------------------------------------------------------------------------

/// Calendly provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendlySettings {
    /// How API requests are authenticated.
    pub access: AccessMode,

    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Personal access token (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_token: Option<String>,

    /// Upstream shape availability is fetched in.
    pub strategy: FetchStrategy,

    /// REST API base URL.
    pub api_base: String,

    /// OAuth base URL.
    pub auth_base: String,

    /// Host of public booking pages.
    pub booking_host: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CalendlySettings {
    fn default() -> Self {
        Self {
            access: AccessMode::default(),
            client_id: None,
            client_secret: None,
            personal_token: None,
            strategy: FetchStrategy::default(),
            api_base: CalendlyConfig::DEFAULT_API_BASE.to_string(),
            auth_base: CalendlyConfig::DEFAULT_AUTH_BASE.to_string(),
            booking_host: DEFAULT_BOOKING_HOST.to_string(),
            timeout_secs: CalendlyConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CalendlySettings {
    /// Converts to provider configuration.
    pub fn to_provider_config(&self) -> ClientResult<CalendlyConfig> {
        if self.timeout_secs == 0 {
            return Err(ClientError::config("timeout_secs must be at least 1"));
        }

        let api_base = parse_url("api_base", &self.api_base)?;
        let auth_base = parse_url("auth_base", &self.auth_base)?;

        CalendlyConfig::default()
            .with_api_base(api_base)
            .with_auth_base(auth_base)
            .with_strategy(self.strategy)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_booking_host(&self.booking_host)
            .map_err(|e| {
                ClientError::config(format!("invalid booking_host `{}`: {}", self.booking_host, e))
            })
    }

    /// Builds the credential provider for the configured access mode.
    ///
    /// Under `client_credentials`, absent ids are not an error here: the
    /// token source reports them on first use.
    pub fn credentials(&self) -> ClientResult<Option<Arc<dyn CredentialProvider>>> {
        match self.access {
            AccessMode::ClientCredentials => {
                let client_id = secret::resolve_opt(self.client_id.as_deref())?;
                let client_secret = secret::resolve_opt(self.client_secret.as_deref())?;
                let config = self.to_provider_config()?;
                let source = ClientCredentialsSource::new(
                    config.token_url(),
                    client_id,
                    client_secret,
                    config.timeout,
                )?;
                Ok(Some(Arc::new(CredentialCache::new(source))))
            }
            AccessMode::PersonalToken => {
                let raw = self.personal_token.as_deref().ok_or_else(|| {
                    ClientError::config(
                        "personal_token is required in the [calendly] section when access = \"personal_token\"",
                    )
                })?;
                let token = secret::resolve(raw)?;
                if token.trim().is_empty() {
                    return Err(ClientError::config("personal_token must not be empty"));
                }
                Ok(Some(Arc::new(StaticCredential::new(token))))
            }
            AccessMode::Public => Ok(None),
        }
    }
}

fn parse_url(field: &str, value: &str) -> ClientResult<Url> {
    Url::parse(value).map_err(|e| ClientError::config(format!("invalid {} `{}`: {}", field, value, e)))
}
