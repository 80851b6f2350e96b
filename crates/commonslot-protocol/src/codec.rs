//! JSON encoding and decoding of protocol documents.

use std::io::Read;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProtocolError, ProtocolResult};

/// Decodes a JSON document.
pub fn decode<T: DeserializeOwned>(input: &str) -> ProtocolResult<T> {
    if input.trim().is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(input)?)
}

/// Reads a whole JSON document from a reader and decodes it.
pub fn decode_from<T: DeserializeOwned, R: Read>(mut reader: R) -> ProtocolResult<T> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    decode(&buf)
}

/// Encodes a value as pretty-printed JSON.
pub fn encode<T: Serialize>(value: &T) -> ProtocolResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AvailabilityRequest, ErrorResponse};

    #[test]
    fn decode_request() {
        let request: AvailabilityRequest =
            decode(r#"{"identities":["alice"],"startDate":"2024-06-01","endDate":"2024-06-02"}"#)
                .unwrap();
        assert_eq!(request.identities, vec!["alice"]);
    }

    #[test]
    fn decode_from_reader() {
        let body = br#"{"identities":[],"startDate":"2024-06-01","endDate":"2024-06-02"}"#;
        let request: AvailabilityRequest = decode_from(&body[..]).unwrap();
        assert!(request.identities.is_empty());
    }

    #[test]
    fn empty_input_is_rejected() {
        let result: ProtocolResult<AvailabilityRequest> = decode("  \n");
        assert!(matches!(result, Err(ProtocolError::Empty)));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let result: ProtocolResult<AvailabilityRequest> = decode(r#"{"identities": "#);
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn encode_error_body() {
        let body = encode(&ErrorResponse::invalid_request("No identities provided")).unwrap();
        assert!(body.contains(r#""error": "No identities provided""#));
        assert!(body.contains(r#""code": "invalid_request""#));
    }
}
