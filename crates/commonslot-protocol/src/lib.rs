//! Request/response types for commonslot.
//!
//! These are the documents exchanged with whatever sits in front of the
//! availability engine (an HTTP route, the CLI's `--request` mode).
//!
//! # Example
//!
//! ```rust
//! use commonslot_protocol::{AvailabilityRequest, decode};
//!
//! let request: AvailabilityRequest = decode(
//!     r#"{"identities":["alice"],"startDate":"2024-06-01","endDate":"2024-06-07"}"#,
//! ).unwrap();
//! assert_eq!(request.duration_or(30), 30);
//! ```

mod codec;
mod error;
mod types;

pub use codec::{decode, decode_from, encode};
pub use error::{ProtocolError, ProtocolResult};
pub use types::{
    AvailabilityRequest, AvailabilityResponse, DEFAULT_DURATION_MINUTES, ErrorCode,
    ErrorResponse, NO_COMMON_AVAILABILITY, SlotView,
};
