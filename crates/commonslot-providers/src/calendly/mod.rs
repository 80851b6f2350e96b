//! Calendly availability provider.
//!
//! This module provides a [`CalendlyProvider`] that fetches raw availability
//! from the Calendly API or, for public access, from booking pages.
//!
//! # Features
//!
//! - Client-credentials token exchange ([`ClientCredentialsSource`])
//! - Three fetch strategies: available times, busy times + working hours,
//!   booking page extraction
//! - Queries split into spans the API accepts
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use commonslot_providers::CredentialCache;
//! use commonslot_providers::calendly::{CalendlyConfig, CalendlyProvider, ClientCredentialsSource};
//!
//! let config = CalendlyConfig::default();
//! let source = ClientCredentialsSource::new(config.token_url(), id, secret, config.timeout)?;
//! let provider = CalendlyProvider::new(config, Some(Arc::new(CredentialCache::new(source))))?;
//! ```

mod auth;
mod client;
mod config;
mod provider;

pub use auth::ClientCredentialsSource;
pub use client::{CalendlyClient, EventType};
pub use config::{AccessMode, CalendlyConfig, FetchStrategy};
pub use provider::CalendlyProvider;
