//! The `query` command.

use std::io::Read;
use std::path::Path;

use commonslot_protocol::{AvailabilityRequest, AvailabilityResponse, ErrorResponse, decode, encode};
use commonslot_server::AvailabilityHandler;

use crate::cli::QueryArgs;
use crate::error::{ClientError, ClientResult};

/// Runs a query and returns the text to print on stdout.
///
/// A rejected request still renders its error document when JSON output
/// is selected; the error is returned alongside so the caller can exit
/// non-zero.
pub async fn run(handler: &AvailabilityHandler, args: &QueryArgs) -> (String, ClientResult<()>) {
    match &args.request {
        Some(path) => match read_request(path) {
            Ok(body) => run_document(handler, &body).await,
            Err(e) => (String::new(), Err(e)),
        },
        None => match build_request(args) {
            Ok(request) => run_request(handler, &request, args.json).await,
            Err(e) => (String::new(), Err(e)),
        },
    }
}

/// Builds a request from command-line arguments.
pub fn build_request(args: &QueryArgs) -> ClientResult<AvailabilityRequest> {
    let (Some(start), Some(end)) = (&args.start, &args.end) else {
        return Err(ClientError::config("--start and --end are required"));
    };

    let mut request = AvailabilityRequest::new(&args.identities, start, end);
    if let Some(minutes) = args.duration {
        request = request.with_duration(minutes);
    }
    Ok(request)
}

async fn run_request(
    handler: &AvailabilityHandler,
    request: &AvailabilityRequest,
    json: bool,
) -> (String, ClientResult<()>) {
    match handler.handle(request).await {
        Ok(response) => {
            let output = if json {
                encode(&response).map_err(ClientError::from)
            } else {
                Ok(render_table(&response))
            };
            match output {
                Ok(text) => (text, Ok(())),
                Err(e) => (String::new(), Err(e)),
            }
        }
        Err(error) => {
            let text = if json { encode(&error).unwrap_or_default() } else { String::new() };
            (text, Err(error.into()))
        }
    }
}

async fn run_document(handler: &AvailabilityHandler, body: &str) -> (String, ClientResult<()>) {
    let (status, text) = match handler.handle_json(body).await {
        Ok(result) => result,
        Err(e) => return (String::new(), Err(e.into())),
    };

    if status == 200 {
        return (text, Ok(()));
    }

    let result = match decode::<ErrorResponse>(&text) {
        Ok(error) => Err(error.into()),
        Err(e) => Err(e.into()),
    };
    (text, result)
}

fn read_request(path: &Path) -> ClientResult<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        return Ok(body);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Renders slots as an aligned table.
pub fn render_table(response: &AvailabilityResponse) -> String {
    if response.is_empty() {
        return response.message.clone().unwrap_or_default();
    }

    let mut out = format!("{:<12}{:<10}{}\n", "DATE", "TIME", "DURATION");
    for slot in &response.slots {
        out.push_str(&format!("{:<12}{:<10}{}\n", slot.date, slot.time, slot.duration));
    }
    out.truncate(out.trim_end().len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use commonslot_core::{DateWindow, Identity};
    use commonslot_providers::{
        AvailabilityProvider, BoxFuture, ErrorProvider, ProviderError, ProviderResult,
        RawAvailability, RawWindow,
    };
    use commonslot_server::EngineConfig;

    /// Offers 09:00 and 10:00 UTC on 2024-06-03 to everyone.
    struct MorningProvider;

    impl AvailabilityProvider for MorningProvider {
        fn name(&self) -> &str {
            "morning"
        }

        fn fetch_availability<'a>(
            &'a self,
            _identity: &'a Identity,
            _window: &'a DateWindow,
            _duration_minutes: u32,
        ) -> BoxFuture<'a, ProviderResult<RawAvailability>> {
            Box::pin(async {
                Ok(RawAvailability::Windows(vec![
                    RawWindow::available(Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap()),
                    RawWindow::available(Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()),
                ]))
            })
        }
    }

    fn handler(provider: impl AvailabilityProvider + 'static) -> AvailabilityHandler {
        AvailabilityHandler::new(Arc::new(provider), EngineConfig::default())
    }

    fn args(identities: &[&str]) -> QueryArgs {
        QueryArgs {
            identities: identities.iter().map(|s| s.to_string()).collect(),
            start: Some("2024-06-03".to_string()),
            end: Some("2024-06-05".to_string()),
            duration: None,
            request: None,
            json: false,
        }
    }

    #[test]
    fn build_request_from_args() {
        let mut query = args(&["alice", "bob"]);
        query.duration = Some(60);
        let request = build_request(&query).unwrap();
        assert_eq!(request.identities, vec!["alice", "bob"]);
        assert_eq!(request.start_date, "2024-06-03");
        assert_eq!(request.duration_minutes, Some(60));

        query.end = None;
        assert!(build_request(&query).is_err());
    }

    #[tokio::test]
    async fn renders_table() {
        let (text, result) = run(&handler(MorningProvider), &args(&["alice", "bob"])).await;
        assert!(result.is_ok());
        assert_eq!(
            text,
            "DATE        TIME      DURATION\n\
             2024-06-03  9:00 AM   30min\n\
             2024-06-03  10:00 AM  30min"
        );
    }

    #[tokio::test]
    async fn renders_json() {
        let mut query = args(&["alice"]);
        query.json = true;
        let (text, result) = run(&handler(MorningProvider), &query).await;
        assert!(result.is_ok());
        let response: AvailabilityResponse = decode(&text).unwrap();
        assert_eq!(response.slots.len(), 2);
        assert_eq!(response.slots[0].time, "9:00 AM");
    }

    #[tokio::test]
    async fn invalid_identity_fails_with_status() {
        let (text, result) = run(&handler(MorningProvider), &args(&["not a url"])).await;
        assert!(text.is_empty());
        match result.unwrap_err() {
            ClientError::Request { status, .. } => assert_eq!(status, 400),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn provider_failure_renders_error_document() {
        let provider = ErrorProvider::new(
            "calendly",
            ProviderError::auth_config("client_id is not set"),
        );
        let mut query = args(&["alice"]);
        query.json = true;

        let (text, result) = run(&handler(provider), &query).await;
        let error: ErrorResponse = decode(&text).unwrap();
        assert_eq!(error.status_code(), 401);
        assert!(matches!(result, Err(ClientError::Request { status: 401, .. })));
    }

    #[tokio::test]
    async fn request_document_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{"usernames":["alice","bob"],"startDate":"2024-06-03","endDate":"2024-06-04","duration":15}"#,
        )
        .unwrap();

        let query = QueryArgs {
            identities: vec![],
            start: None,
            end: None,
            duration: None,
            request: Some(path),
            json: true,
        };
        let (text, result) = run(&handler(MorningProvider), &query).await;
        assert!(result.is_ok());
        let response: AvailabilityResponse = decode(&text).unwrap();
        assert!(response.slots.iter().all(|s| s.duration == "15min"));
    }

    #[tokio::test]
    async fn malformed_request_document() {
        let (text, result) = run_document(&handler(MorningProvider), "{not json").await;
        let error: ErrorResponse = decode(&text).unwrap();
        assert_eq!(error.status_code(), 400);
        assert!(matches!(result, Err(ClientError::Request { status: 400, .. })));
    }

    #[test]
    fn empty_response_prints_message() {
        let response = AvailabilityResponse::from_slots(&[]);
        assert_eq!(render_table(&response), "No common availability found");
    }
}
