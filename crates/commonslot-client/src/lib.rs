//! Command-line interface for the availability engine.
//!
//! This crate provides the `commonslot` binary: configuration loading,
//! provider construction, and the `query`, `resolve` and `config` commands.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
