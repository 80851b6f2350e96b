//! Bearer credentials for server-to-server calls.
//!
//! [`CredentialCache`] is the one piece of state shared by every request and
//! every concurrent fetch. It is an ordinary value: build it once, wrap it in
//! an `Arc`, and hand it to whatever needs a token.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::ProviderResult;
use crate::provider::BoxFuture;

/// Seconds before expiry at which a credential is treated as stale.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// A bearer token and its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    /// `None` for tokens that never expire.
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a credential that expires at the given instant.
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Creates a credential that expires `secs` seconds from now.
    pub fn expiring_in(token: impl Into<String>, secs: i64) -> Self {
        Self::new(token, Utc::now() + Duration::seconds(secs))
    }

    /// Creates a credential that never expires.
    pub fn non_expiring(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Returns the bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the expiry instant, if any.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true once `now` is within the refresh margin of expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - Duration::seconds(REFRESH_MARGIN_SECS),
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Something that can hand out a bearer credential.
pub trait CredentialProvider: Send + Sync {
    /// Returns a credential valid for at least the refresh margin.
    fn get_credential(&self) -> BoxFuture<'_, ProviderResult<Credential>>;

    /// Drops any cached credential so the next call fetches a fresh one.
    fn invalidate(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Fetches a fresh credential from an issuer, with no caching.
pub trait TokenSource: Send + Sync {
    /// Exchanges configured secrets for a new credential.
    fn fetch_token(&self) -> BoxFuture<'_, ProviderResult<Credential>>;
}

/// Caches a credential from a [`TokenSource`], refreshing it before expiry.
///
/// Concurrent callers that find the cache empty or stale queue on a single
/// refresh gate; the first one fetches, the rest pick up its result. A failed
/// refresh leaves the cache empty.
pub struct CredentialCache<S> {
    source: S,
    cached: RwLock<Option<Credential>>,
    refresh_gate: Mutex<()>,
}

impl<S: TokenSource> CredentialCache<S> {
    /// Creates an empty cache over the given source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Returns the cached credential, refreshing it if absent or stale.
    pub async fn get(&self) -> ProviderResult<Credential> {
        if let Some(credential) = self.fresh().await {
            return Ok(credential);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if let Some(credential) = self.fresh().await {
            debug!("credential refreshed by concurrent caller");
            return Ok(credential);
        }

        debug!("fetching new credential");
        match self.source.fetch_token().await {
            Ok(credential) => {
                info!(expires_at = ?credential.expires_at(), "credential refreshed");
                *self.cached.write().await = Some(credential.clone());
                Ok(credential)
            }
            Err(e) => {
                warn!(error = %e, "credential refresh failed");
                *self.cached.write().await = None;
                Err(e)
            }
        }
    }

    /// Drops the cached credential.
    pub async fn clear(&self) {
        let _gate = self.refresh_gate.lock().await;
        *self.cached.write().await = None;
    }

    /// Returns true if a non-stale credential is cached.
    pub async fn is_fresh(&self) -> bool {
        self.fresh().await.is_some()
    }

    async fn fresh(&self) -> Option<Credential> {
        let cached = self.cached.read().await;
        cached
            .as_ref()
            .filter(|c| !c.needs_refresh(Utc::now()))
            .cloned()
    }
}

impl<S: TokenSource> CredentialProvider for CredentialCache<S> {
    fn get_credential(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
        Box::pin(self.get())
    }

    fn invalidate(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.clear())
    }
}

impl<S> fmt::Debug for CredentialCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache").finish_non_exhaustive()
    }
}

/// A fixed, configured token (e.g. a personal access token).
#[derive(Debug, Clone)]
pub struct StaticCredential {
    credential: Credential,
}

impl StaticCredential {
    /// Wraps a token that never expires.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credential: Credential::non_expiring(token),
        }
    }
}

impl CredentialProvider for StaticCredential {
    fn get_credential(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
        let credential = self.credential.clone();
        Box::pin(async move { Ok(credential) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderErrorCode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches; each fetch yields a token valid for `ttl` seconds.
    struct CountingSource {
        calls: AtomicUsize,
        ttl: i64,
        fail: bool,
    }

    impl CountingSource {
        fn new(ttl: i64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                ttl,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(3600)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TokenSource for CountingSource {
        fn fetch_token(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
            Box::pin(async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                if self.fail {
                    return Err(ProviderError::auth_fetch("rejected").with_status(401));
                }
                Ok(Credential::expiring_in(format!("tok-{n}"), self.ttl))
            })
        }
    }

    #[test]
    fn refresh_margin() {
        let now = Utc::now();
        assert!(!Credential::new("a", now + Duration::seconds(61)).needs_refresh(now));
        assert!(Credential::new("a", now + Duration::seconds(60)).needs_refresh(now));
        assert!(Credential::new("a", now - Duration::seconds(1)).needs_refresh(now));
        assert!(!Credential::non_expiring("a").needs_refresh(now));
    }

    #[test]
    fn debug_redacts_token() {
        let dbg = format!("{:?}", Credential::non_expiring("super-secret"));
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[tokio::test]
    async fn cached_until_stale() {
        let cache = CredentialCache::new(CountingSource::new(3600));
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert_eq!(first.token(), "tok-1");
        assert_eq!(second.token(), "tok-1");
        assert_eq!(cache.source.calls(), 1);
        assert!(cache.is_fresh().await);
    }

    #[tokio::test]
    async fn stale_credential_is_refreshed() {
        // Inside the margin from the start.
        let cache = CredentialCache::new(CountingSource::new(30));
        assert_eq!(cache.get().await.unwrap().token(), "tok-1");
        assert_eq!(cache.get().await.unwrap().token(), "tok-2");
        assert_eq!(cache.source.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let cache = Arc::new(CredentialCache::new(CountingSource::new(3600)));

        let a = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_credential().await })
        };
        let b = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_credential().await })
        };

        let (a, b) = tokio::join!(a, b);
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();
        assert_eq!(a.token(), b.token());
        assert_eq!(cache.source.calls(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_cache_empty() {
        let cache = CredentialCache::new(CountingSource::failing());
        let err = cache.get().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthFetch);
        assert!(!cache.is_fresh().await);

        // No negative caching: the next call tries again.
        assert!(cache.get().await.is_err());
        assert_eq!(cache.source.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = CredentialCache::new(CountingSource::new(3600));
        cache.get().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.get().await.unwrap().token(), "tok-2");
    }

    #[tokio::test]
    async fn static_credential_never_fetches() {
        let provider = StaticCredential::new("pat-123");
        let credential = provider.get_credential().await.unwrap();
        assert_eq!(credential.token(), "pat-123");
        assert!(credential.expires_at().is_none());
    }
}
