//! AvailabilityProvider trait and implementations.
//!
//! This crate provides the fetch and normalization layer:
//!
//! - [`AvailabilityProvider`] - The trait availability sources implement
//! - [`RawAvailability`] - Provider-shaped availability payloads
//! - [`normalize`] - Converts raw availability into canonical slots
//! - [`CredentialCache`] - Shared bearer credential, refreshed before expiry
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────────┐       ┌───────────────────┐
//!   │ CalendlyProvider │──────▶│ CredentialProvider│
//!   └────────┬─────────┘       └───────────────────┘
//!            │ AvailabilityProvider
//!            ▼
//!   ┌──────────────────┐
//!   │ RawAvailability  │
//!   └────────┬─────────┘
//!            ▼ normalize()
//!   ┌──────────────────┐
//!   │    Vec<Slot>     │
//!   └──────────────────┘
//! ```

pub mod calendly;
pub mod credential;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod raw_availability;

pub use credential::{
    Credential, CredentialCache, CredentialProvider, REFRESH_MARGIN_SECS, StaticCredential,
    TokenSource,
};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{NormalizeOptions, candidate_grid, extract_pairs, extracted_instant, normalize};
pub use provider::{AvailabilityProvider, BoxFuture, ErrorProvider};
pub use raw_availability::{
    BusyInterval, ExtractedEntry, RawAvailability, RawWindow, RuleTarget, ScheduleRule,
    WeeklySchedule, WorkingInterval,
};
