//! Client-credentials token exchange against the Calendly auth server.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::credential::{Credential, TokenSource};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;

use super::client::transport_error;

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

/// Exchanges a client id and secret for a bearer token.
///
/// Missing secrets are reported when a token is first requested, not at
/// construction, so a misconfigured deployment still starts and answers
/// each request with an auth configuration error.
pub struct ClientCredentialsSource {
    http: Client,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl ClientCredentialsSource {
    /// Creates a new token source for the given endpoint.
    pub fn new(
        token_url: impl Into<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.filter(|s| !s.trim().is_empty()),
            client_secret: client_secret.filter(|s| !s.trim().is_empty()),
        })
    }

    async fn exchange(&self) -> ProviderResult<Credential> {
        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            (None, _) => return Err(ProviderError::auth_config("client_id is not configured")),
            (_, None) => {
                return Err(ProviderError::auth_config("client_secret is not configured"));
            }
        };

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];

        debug!(url = %self.token_url, "requesting client-credentials token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::auth_fetch(format!("token request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ProviderError::auth_fetch(format!(
                "token endpoint returned {}: {}",
                status,
                body.trim()
            ))
            .with_status(status.as_u16()));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::auth_fetch(format!("invalid token response: {}", e))
                .with_status(status.as_u16())
        })?;

        debug!(
            token_type = ?token.token_type,
            expires_in = token.expires_in,
            scope = ?token.scope,
            "token issued"
        );
        Ok(Credential::expiring_in(token.access_token, token.expires_in))
    }
}

impl TokenSource for ClientCredentialsSource {
    fn fetch_token(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
        Box::pin(self.exchange())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{CredentialCache, CredentialProvider};
    use crate::error::ProviderErrorCode;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;

    fn source(server: &MockServer, id: Option<&str>, secret: Option<&str>) -> ClientCredentialsSource {
        ClientCredentialsSource::new(
            server.url("/oauth/token"),
            id.map(String::from),
            secret.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn exchanges_client_credentials() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/oauth/token")
                .body_includes("grant_type=client_credentials")
                .body_includes("client_id=my-client")
                .body_includes("client_secret=my-secret");
            then.status(200).json_body(json!({
                "access_token": "tok-abc",
                "token_type": "Bearer",
                "expires_in": 7200,
                "scope": "default"
            }));
        });

        let credential = source(&server, Some("my-client"), Some("my-secret"))
            .fetch_token()
            .await
            .unwrap();
        assert_eq!(credential.token(), "tok-abc");
        assert!(!credential.needs_refresh(chrono::Utc::now()));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn missing_secret_is_auth_config() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200);
        });

        let err = source(&server, Some("my-client"), Some("  "))
            .fetch_token()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthConfig);
        assert_eq!(mock.calls(), 0);

        let err = source(&server, None, Some("s")).fetch_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthConfig);
    }

    #[tokio::test]
    async fn rejected_exchange_is_auth_fetch() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(401).body(r#"{"error":"invalid_client"}"#);
        });

        let err = source(&server, Some("id"), Some("wrong"))
            .fetch_token()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthFetch);
        assert_eq!(err.status(), Some(401));
        assert!(err.message().contains("invalid_client"));
    }

    #[tokio::test]
    async fn malformed_token_body_is_auth_fetch() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = source(&server, Some("id"), Some("secret"))
            .fetch_token()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthFetch);
    }

    #[tokio::test]
    async fn concurrent_callers_hit_token_endpoint_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .delay(std::time::Duration::from_millis(50))
                .json_body(json!({"access_token": "shared", "token_type": "Bearer", "expires_in": 3600}));
        });

        let cache = Arc::new(CredentialCache::new(source(&server, Some("id"), Some("secret"))));
        let (a, b) = tokio::join!(cache.get_credential(), cache.get_credential());

        assert_eq!(a.unwrap().token(), "shared");
        assert_eq!(b.unwrap().token(), "shared");
        assert_eq!(mock.calls(), 1);
    }
}
