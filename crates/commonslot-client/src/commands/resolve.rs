//! The `resolve` command.

use commonslot_core::Resolver;
use commonslot_protocol::ErrorResponse;

use crate::error::{ClientError, ClientResult};

/// Resolves each input and returns one `input -> identity` line per entry.
///
/// Resolution stops at the first invalid input, as a query would.
pub fn run(resolver: &Resolver, inputs: &[String]) -> ClientResult<String> {
    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        let identity = resolver.resolve(input).map_err(|e| ClientError::Request {
            status: ErrorResponse::from(&e).status_code(),
            message: e.to_string(),
        })?;
        lines.push(format!("{} -> {}", input, identity));
    }
    Ok(lines.join("\n"))
}
