//! Availability engine: request coordination.
//!
//! This crate ties the pieces together for one request:
//! - Range validation and identity resolution, before any network call
//! - One concurrent fetch per identity, failing fast on the first error
//! - Normalization and intersection of the fetched slots
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use commonslot_protocol::AvailabilityRequest;
//! use commonslot_providers::AvailabilityProvider;
//! use commonslot_server::{AvailabilityHandler, EngineConfig};
//!
//! async fn run(provider: Arc<dyn AvailabilityProvider>) {
//!     let handler = AvailabilityHandler::new(provider, EngineConfig::default());
//!     let request = AvailabilityRequest::new(["alice", "bob"], "2024-06-03", "2024-06-07");
//!     match handler.handle(&request).await {
//!         Ok(response) => println!("{} common slots", response.slots.len()),
//!         Err(error) => eprintln!("{} ({})", error.error, error.status_code()),
//!     }
//! }
//! ```

mod config;
mod error;
mod handler;

pub use config::{EngineConfig, MAX_DURATION_MINUTES};
pub use error::{ServerError, ServerResult};
pub use handler::AvailabilityHandler;
