//! Calendly availability provider implementation.

use std::sync::Arc;

use chrono::Duration;
use commonslot_core::{DateWindow, Identity};
use tracing::debug;

use crate::credential::CredentialProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::normalize::{candidate_grid, extract_pairs, extracted_instant};
use crate::provider::{AvailabilityProvider, BoxFuture};
use crate::raw_availability::RawAvailability;

use super::client::{CalendlyClient, EventType};
use super::config::{CalendlyConfig, FetchStrategy};

const PROVIDER_NAME: &str = "calendly";

/// Calendly availability provider.
///
/// Maps an identity to a Calendly user (and event type), then fetches raw
/// availability in the configured [`FetchStrategy`].
pub struct CalendlyProvider {
    client: CalendlyClient,
}

impl CalendlyProvider {
    /// Creates a new provider. `credentials` is `None` for public access.
    pub fn new(
        config: CalendlyConfig,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> ProviderResult<Self> {
        Ok(Self {
            client: CalendlyClient::new(config, credentials)?,
        })
    }

    /// Returns the configured fetch strategy.
    pub fn strategy(&self) -> FetchStrategy {
        self.client.config().strategy
    }

    async fn fetch(
        &self,
        identity: &Identity,
        window: &DateWindow,
        duration_minutes: u32,
    ) -> ProviderResult<RawAvailability> {
        match self.strategy() {
            FetchStrategy::AvailableTimes => self.fetch_available_times(identity, window).await,
            FetchStrategy::BusyTimes => {
                self.fetch_busy_times(identity, window, duration_minutes)
                    .await
            }
            FetchStrategy::PageExtract => self.fetch_page_extract(identity, window).await,
        }
    }

    async fn fetch_available_times(
        &self,
        identity: &Identity,
        window: &DateWindow,
    ) -> ProviderResult<RawAvailability> {
        let user_uri = self.client.user_uri(&identity.provider_user).await?;
        let event_types = self.client.event_types(&user_uri).await?;
        let event_type = pick_event_type(&event_types, identity.event_kind.as_deref())?;

        let mut windows = Vec::new();
        for (start, end) in window.chunks(max_query_span()) {
            windows.extend(
                self.client
                    .available_times(&event_type.uri, start, end)
                    .await?,
            );
        }

        debug!(identity = %identity, windows = windows.len(), "fetched available times");
        Ok(RawAvailability::Windows(windows))
    }

    async fn fetch_busy_times(
        &self,
        identity: &Identity,
        window: &DateWindow,
        duration_minutes: u32,
    ) -> ProviderResult<RawAvailability> {
        let user_uri = self.client.user_uri(&identity.provider_user).await?;

        let mut busy = Vec::new();
        for (start, end) in window.chunks(max_query_span()) {
            busy.extend(self.client.busy_times(&user_uri, start, end).await?);
        }
        let schedule = self.client.working_hours(&user_uri).await?;

        debug!(identity = %identity, busy = busy.len(), "fetched busy times");
        Ok(RawAvailability::BusyRules {
            candidates: candidate_grid(window, duration_minutes),
            busy,
            schedule,
        })
    }

    /// Pages list whatever the booking widget rendered, so pairs outside the
    /// window are discarded here. Malformed pairs are left for the
    /// normalizer to drop.
    async fn fetch_page_extract(
        &self,
        identity: &Identity,
        window: &DateWindow,
    ) -> ProviderResult<RawAvailability> {
        let page = self
            .client
            .booking_page(&identity.provider_user, identity.event_kind.as_deref())
            .await?;
        let found = extract_pairs(&page);
        let total = found.len();
        let entries: Vec<_> = found
            .into_iter()
            .filter(|e| extracted_instant(e).is_none_or(|t| window.contains(t)))
            .collect();

        debug!(
            identity = %identity,
            entries = entries.len(),
            outside_window = total - entries.len(),
            "extracted booking page pairs"
        );
        Ok(RawAvailability::Extracted(entries))
    }
}

impl AvailabilityProvider for CalendlyProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch_availability<'a>(
        &'a self,
        identity: &'a Identity,
        window: &'a DateWindow,
        duration_minutes: u32,
    ) -> BoxFuture<'a, ProviderResult<RawAvailability>> {
        Box::pin(async move {
            self.fetch(identity, window, duration_minutes)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}

fn max_query_span() -> Duration {
    Duration::days(CalendlyConfig::MAX_QUERY_DAYS)
}

/// Picks the event type matching `kind`, or the first active one.
fn pick_event_type<'a>(
    event_types: &'a [EventType],
    kind: Option<&str>,
) -> ProviderResult<&'a EventType> {
    let found = match kind {
        Some(kind) => event_types
            .iter()
            .find(|et| et.slug.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(kind))),
        None => event_types.iter().find(|et| et.active),
    };
    found.ok_or_else(|| match kind {
        Some(kind) => ProviderError::not_found(format!("event type {:?} not found", kind)),
        None => ProviderError::not_found("user has no active event type"),
    })
}
