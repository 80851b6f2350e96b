//! Availability request coordination.
//!
//! [`AvailabilityHandler`] runs one request end to end: validate the range,
//! resolve every identity, fan out one fetch per identity, normalize each
//! result and intersect. Everything that can be rejected locally is rejected
//! before the first fetch is spawned.

use std::sync::Arc;

use commonslot_core::{
    AvailabilityError, AvailabilityResult, DateWindow, Identity, RangeValidator, Resolver, Slot,
    intersect,
};
use commonslot_protocol::{AvailabilityRequest, AvailabilityResponse, ErrorResponse, decode, encode};
use commonslot_providers::{AvailabilityProvider, NormalizeOptions, normalize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, MAX_DURATION_MINUTES};
use crate::error::ServerResult;

/// Coordinates availability requests against one provider.
///
/// Cheap to share: wrap it in an `Arc` and call it from as many tasks as
/// needed. The provider (and any credential cache behind it) is the only
/// shared state.
pub struct AvailabilityHandler {
    provider: Arc<dyn AvailabilityProvider>,
    config: EngineConfig,
    validator: RangeValidator,
    resolver: Resolver,
}

impl AvailabilityHandler {
    /// Creates a new handler.
    pub fn new(provider: Arc<dyn AvailabilityProvider>, config: EngineConfig) -> Self {
        let validator = config.range_validator();
        let resolver = config.resolver();
        Self {
            provider,
            config,
            validator,
            resolver,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the slots common to every identity in the request.
    ///
    /// # Errors
    ///
    /// Fails without any network call on an empty identity list, a bad
    /// duration, a rejected date range or an unresolvable identity. Fails
    /// with the first fetch error otherwise; there is no partial result.
    #[tracing::instrument(
        name = "availability",
        skip_all,
        fields(identities = request.identities.len())
    )]
    pub async fn find(&self, request: &AvailabilityRequest) -> AvailabilityResult<Vec<Slot>> {
        if request.identities.is_empty() {
            return Err(AvailabilityError::NoIdentities);
        }

        let duration = request.duration_or(self.config.default_duration_minutes);
        if !(1..=MAX_DURATION_MINUTES).contains(&duration) {
            return Err(AvailabilityError::InvalidDuration { minutes: duration });
        }

        let window = self.validator.validate(&request.start_date, &request.end_date)?;
        let identities = self.resolver.resolve_all(&request.identities)?;
        debug!(
            start = %window.start_date(),
            end = %window.end_date(),
            duration,
            "request validated"
        );

        let per_identity = self.fetch_all(identities, window, duration).await?;
        let common = intersect(&per_identity);

        info!(common = common.len(), "availability computed");
        Ok(common)
    }

    /// Runs [`find`](Self::find) and maps the outcome to wire types.
    pub async fn handle(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResponse, ErrorResponse> {
        match self.find(request).await {
            Ok(slots) => Ok(AvailabilityResponse::from_slots(&slots)),
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "availability request failed");
                Err(ErrorResponse::from(&e))
            }
        }
    }

    /// Handles a JSON request body, returning the status code and JSON body
    /// an HTTP layer would send.
    pub async fn handle_json(&self, body: &str) -> ServerResult<(u16, String)> {
        let request: AvailabilityRequest = match decode(body) {
            Ok(request) => request,
            Err(e) => {
                let error = ErrorResponse::invalid_request(e.to_string());
                return Ok((error.status_code(), encode(&error)?));
            }
        };

        match self.handle(&request).await {
            Ok(response) => Ok((200, encode(&response)?)),
            Err(error) => Ok((error.status_code(), encode(&error)?)),
        }
    }

    /// Fetches and normalizes every identity concurrently.
    ///
    /// Results come back in identity order. The first failure is returned
    /// as soon as it is observed and the remaining fetches are aborted.
    async fn fetch_all(
        &self,
        identities: Vec<Identity>,
        window: DateWindow,
        duration: u32,
    ) -> AvailabilityResult<Vec<Vec<Slot>>> {
        let options = NormalizeOptions::new(duration).with_offset(self.config.display_offset);
        let mut results = vec![Vec::new(); identities.len()];
        let mut tasks = JoinSet::new();

        for (index, identity) in identities.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            tasks.spawn(async move {
                let raw = provider
                    .fetch_availability(&identity, &window, duration)
                    .await
                    .map_err(|e| {
                        warn!(identity = %identity, error = %e, "fetch failed");
                        e.into_availability(identity.to_string())
                    })?;
                let slots = normalize(&raw, &options);
                debug!(identity = %identity, slots = slots.len(), "fetched availability");
                Ok::<_, AvailabilityError>((index, slots))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, slots))) => results[index] = slots,
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(AvailabilityError::internal(format!("fetch task failed: {}", e)));
                }
            }
        }

        Ok(results)
    }
}
