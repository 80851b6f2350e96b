//! AvailabilityProvider trait definition.
//!
//! An [`AvailabilityProvider`] turns one identity plus a date window into the
//! raw availability its scheduling service reports. Providers own
//! authentication and transport; they never normalize or intersect.

use std::future::Future;
use std::pin::Pin;

use commonslot_core::{DateWindow, Identity};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_availability::RawAvailability;

/// A boxed future for async trait methods.
///
/// Keeps the traits object-safe so providers can sit behind `Arc<dyn _>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core abstraction for availability sources.
///
/// One call fetches one identity; the coordinator issues calls for all
/// identities of a request concurrently, so implementations must be
/// `Send + Sync` and keep no per-call mutable state.
pub trait AvailabilityProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "calendly").
    fn name(&self) -> &str;

    /// Fetches raw availability for one identity over the window.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the identity cannot be mapped to a
    /// provider resource, the service answers with a non-success status, or
    /// a credential cannot be obtained.
    fn fetch_availability<'a>(
        &'a self,
        identity: &'a Identity,
        window: &'a DateWindow,
        duration_minutes: u32,
    ) -> BoxFuture<'a, ProviderResult<RawAvailability>>;
}

/// A provider that always returns an error.
///
/// Stands in for a provider that failed to initialize, so the failure is
/// reported per request instead of at startup.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    /// Creates a new error provider.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl AvailabilityProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_availability<'a>(
        &'a self,
        _identity: &'a Identity,
        _window: &'a DateWindow,
        _duration_minutes: u32,
    ) -> BoxFuture<'a, ProviderResult<RawAvailability>> {
        let error = self.error.clone().with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}
