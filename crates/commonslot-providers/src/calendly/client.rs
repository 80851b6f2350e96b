//! Calendly REST API client.
//!
//! Thin typed wrappers over the endpoints the provider needs. Every call is
//! a single attempt; retry policy belongs to whoever calls the engine.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc, Weekday};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::credential::CredentialProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::raw_availability::{BusyInterval, RawWindow, WeeklySchedule, WorkingInterval};

use super::config::CalendlyConfig;

/// Maps a transport failure to a provider error.
pub(super) fn transport_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::network(message).with_source(e)
}

/// Calendly API client.
pub struct CalendlyClient {
    http: Client,
    config: CalendlyConfig,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl CalendlyClient {
    /// Creates a new client. `credentials` is `None` for public access.
    pub fn new(
        config: CalendlyConfig,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &CalendlyConfig {
        &self.config
    }

    /// Looks up a user by slug and returns its resource URI.
    pub async fn user_uri(&self, user: &str) -> ProviderResult<String> {
        let path = format!("/users/{}", urlencoding::encode(user));
        let response: Resource<UserResource> = self.get_json(&path, &[]).await?;
        Ok(response.resource.uri)
    }

    /// Lists the event types owned by a user.
    pub async fn event_types(&self, user_uri: &str) -> ProviderResult<Vec<EventType>> {
        let response: Collection<EventType> = self
            .get_json("/event_types", &[("user", user_uri.to_string())])
            .await?;
        Ok(response.collection)
    }

    /// Lists bookable start times of an event type in `[start, end)`.
    pub async fn available_times(
        &self,
        event_type_uri: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ProviderResult<Vec<RawWindow>> {
        let response: Collection<RawWindow> = self
            .get_json(
                "/event_type_available_times",
                &[
                    ("event_type", event_type_uri.to_string()),
                    ("start_time", rfc3339(start)),
                    ("end_time", rfc3339(end)),
                ],
            )
            .await?;
        Ok(response.collection)
    }

    /// Lists a user's busy intervals in `[start, end)`.
    pub async fn busy_times(
        &self,
        user_uri: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ProviderResult<Vec<BusyInterval>> {
        let response: Collection<ApiBusyTime> = self
            .get_json(
                "/user_busy_times",
                &[
                    ("user", user_uri.to_string()),
                    ("start_time", rfc3339(start)),
                    ("end_time", rfc3339(end)),
                ],
            )
            .await?;
        Ok(response
            .collection
            .into_iter()
            .map(|b| BusyInterval::new(b.start_time, b.end_time))
            .collect())
    }

    /// Returns the user's default working-hours schedule, or the first one.
    pub async fn working_hours(&self, user_uri: &str) -> ProviderResult<WeeklySchedule> {
        let response: Collection<ApiSchedule> = self
            .get_json("/user_availability_schedules", &[("user", user_uri.to_string())])
            .await?;

        let mut schedules = response.collection;
        let index = schedules.iter().position(|s| s.default).unwrap_or(0);
        if schedules.is_empty() {
            return Err(ProviderError::not_found("user has no availability schedule"));
        }
        Ok(schedules.swap_remove(index).into_schedule())
    }

    /// Fetches a public booking page as text.
    pub async fn booking_page(&self, user: &str, event_kind: Option<&str>) -> ProviderResult<String> {
        let url = self.config.booking_url(user, event_kind);
        debug!(%url, "fetching booking page");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        check_status(status, &body)?;
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<T> {
        let url = self.config.api_url(path);
        let mut request = self.http.get(&url).query(query);

        if let Some(ref credentials) = self.credentials {
            let credential = credentials.get_credential().await?;
            request = request.bearer_auth(credential.token());
        }

        debug!(%url, "calendly request");
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if status == StatusCode::UNAUTHORIZED
            && let Some(ref credentials) = self.credentials
        {
            warn!(%url, "bearer token rejected, dropping cached credential");
            credentials.invalidate().await;
        }
        check_status(status, &body)?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response from {}: {}", path, e))
        })
    }
}

fn check_status(status: StatusCode, body: &str) -> ProviderResult<()> {
    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::not_found("resource not found").with_status(404));
    }
    if !status.is_success() {
        return Err(ProviderError::upstream(
            status.as_u16(),
            format!("API error ({}): {}", status, error_detail(body)),
        ));
    }
    Ok(())
}

/// Pulls the `message` field out of a Calendly error body, else the raw text.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiErrorBody {
        message: Option<String>,
    }

    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    resource: T,
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    collection: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    uri: String,
}

/// An event type as listed by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct EventType {
    pub uri: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ApiBusyTime {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ApiSchedule {
    #[serde(default)]
    default: bool,
    #[serde(default)]
    rules: Vec<ApiRule>,
}

#[derive(Debug, Deserialize)]
struct ApiRule {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    wday: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    intervals: Vec<ApiInterval>,
}

#[derive(Debug, Deserialize)]
struct ApiInterval {
    from: String,
    to: String,
}

impl ApiSchedule {
    fn into_schedule(self) -> WeeklySchedule {
        let mut schedule = WeeklySchedule::new();
        for rule in self.rules {
            let intervals: Vec<WorkingInterval> = rule
                .intervals
                .iter()
                .filter_map(|iv| {
                    let from = NaiveTime::parse_from_str(&iv.from, "%H:%M").ok()?;
                    let to = NaiveTime::parse_from_str(&iv.to, "%H:%M").ok()?;
                    Some(WorkingInterval::new(from, to))
                })
                .collect();

            match (rule.kind.as_str(), rule.wday.as_deref(), rule.date.as_deref()) {
                ("wday", Some(day), _) => match parse_weekday(day) {
                    Some(day) => schedule = schedule.with_weekday(day, intervals),
                    None => warn!(wday = day, "skipping rule with unknown weekday"),
                },
                ("date", _, Some(date)) => match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                    Ok(date) => schedule = schedule.with_date(date, intervals),
                    Err(_) => warn!(date, "skipping rule with unparsable date"),
                },
                (kind, _, _) => warn!(kind, "skipping unsupported schedule rule"),
            }
        }
        schedule
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name.to_ascii_lowercase().as_str() {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Credential, StaticCredential};
    use crate::error::ProviderErrorCode;
    use crate::provider::BoxFuture;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    fn client(server: &MockServer, token: Option<&str>) -> CalendlyClient {
        let config = CalendlyConfig::default()
            .with_api_base(Url::parse(&server.base_url()).unwrap())
            .with_booking_base(Url::parse(&server.base_url()).unwrap());
        let credentials = token.map(|t| Arc::new(StaticCredential::new(t)) as Arc<dyn CredentialProvider>);
        CalendlyClient::new(config, credentials).unwrap()
    }

    #[tokio::test]
    async fn user_lookup_sends_bearer_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/alice")
                .header("authorization", "Bearer pat-1");
            then.status(200).json_body(json!({
                "resource": {"uri": "https://api.calendly.com/users/AAA", "slug": "alice"}
            }));
        });

        let uri = client(&server, Some("pat-1")).user_uri("alice").await.unwrap();
        assert_eq!(uri, "https://api.calendly.com/users/AAA");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/ghost");
            then.status(404).json_body(json!({"title": "Resource Not Found", "message": "The server could not find the requested resource."}));
        });

        let err = client(&server, None).user_uri("ghost").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/alice");
            then.status(503).json_body(json!({"message": "try later"}));
        });

        let err = client(&server, None).user_uri("alice").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::Upstream);
        assert_eq!(err.status(), Some(503));
        assert!(err.message().contains("try later"));
    }

    #[tokio::test]
    async fn available_times_passes_window() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/event_type_available_times")
                .query_param("event_type", "et-1")
                .query_param("start_time", "2024-06-03T00:00:00Z")
                .query_param("end_time", "2024-06-04T00:00:00Z");
            then.status(200).json_body(json!({
                "collection": [
                    {"status": "available", "start_time": "2024-06-03T14:00:00Z", "invitees_remaining": 1},
                    {"status": "available", "start_time": "2024-06-03T15:00:00Z", "invitees_remaining": 0}
                ]
            }));
        });

        let start = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 0).unwrap();
        let windows = client(&server, None)
            .available_times("et-1", start, end)
            .await
            .unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].invitees_remaining, Some(0));
        assert_eq!(mock.calls(), 1);
    }

    /// Hands out a fixed token and counts invalidations.
    #[derive(Default)]
    struct CountingCredential {
        invalidated: AtomicUsize,
    }

    impl CredentialProvider for CountingCredential {
        fn get_credential(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
            Box::pin(async { Ok(Credential::expiring_in("stale", 3600)) })
        }

        fn invalidate(&self) -> BoxFuture<'_, ()> {
            self.invalidated.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    #[tokio::test]
    async fn rejected_token_invalidates_credential() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/alice")
                .header("authorization", "Bearer stale");
            then.status(401).json_body(json!({"message": "Unauthenticated"}));
        });

        let credentials = Arc::new(CountingCredential::default());
        let config = CalendlyConfig::default().with_api_base(Url::parse(&server.base_url()).unwrap());
        let client = CalendlyClient::new(config, Some(credentials.clone() as Arc<dyn CredentialProvider>))
            .unwrap();

        let err = client.user_uri("alice").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::Upstream);
        assert_eq!(err.status(), Some(401));
        assert!(err.message().contains("Unauthenticated"));
        assert_eq!(credentials.invalidated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_failures_keep_credential() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/alice");
            then.status(403).json_body(json!({"message": "Permission Denied"}));
        });

        let credentials = Arc::new(CountingCredential::default());
        let config = CalendlyConfig::default().with_api_base(Url::parse(&server.base_url()).unwrap());
        let client = CalendlyClient::new(config, Some(credentials.clone() as Arc<dyn CredentialProvider>))
            .unwrap();

        let err = client.user_uri("alice").await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(credentials.invalidated.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/event_types");
            then.status(200).body("not json");
        });

        let err = client(&server, None).event_types("u").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn working_hours_prefers_default_schedule() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/user_availability_schedules");
            then.status(200).json_body(json!({
                "collection": [
                    {"default": false, "rules": [
                        {"type": "wday", "wday": "monday", "intervals": [{"from": "06:00", "to": "07:00"}]}
                    ]},
                    {"default": true, "rules": [
                        {"type": "wday", "wday": "monday", "intervals": [{"from": "09:00", "to": "17:00"}]},
                        {"type": "date", "date": "2024-06-10", "intervals": []},
                        {"type": "wday", "wday": "funday", "intervals": []}
                    ]}
                ]
            }));
        });

        let schedule = client(&server, None).working_hours("u").await.unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let intervals = schedule.intervals_for(monday);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].from, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(
            schedule
                .intervals_for(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap())
                .is_empty()
        );
    }

    #[tokio::test]
    async fn no_schedule_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/user_availability_schedules");
            then.status(200).json_body(json!({"collection": []}));
        });

        let err = client(&server, None).working_hours("u").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
    }

    #[test]
    fn weekday_names() {
        assert_eq!(parse_weekday("Sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("mon"), None);
    }
}
