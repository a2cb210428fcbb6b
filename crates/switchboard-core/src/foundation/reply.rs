//! Encoding outcomes for structured transports.
//!
//! HTTP, WebSocket and socket adapters all emit either the handler's JSON
//! result or an [`ErrorResponse`]. The helpers here produce those bodies so each
//! adapter only has to decide on framing.

use super::envelope::ErrorResponse;
use super::error::{DispatchError, DispatchResult};
use super::outcome::Outcome;

/// Encodes the `{"Status":"NOK","Error":...}` body for `err`.
pub fn encode_error(err: &DispatchError) -> Vec<u8> {
    encode_error_message(&err.to_string())
}

/// Encodes the error envelope for an arbitrary message.
pub fn encode_error_message(message: &str) -> Vec<u8> {
    // A two-string struct cannot fail to serialize.
    serde_json::to_vec(&ErrorResponse::nok(message)).unwrap_or_default()
}

/// Encodes the result slot of `outcome` as JSON.
pub fn encode_result(outcome: &Outcome) -> DispatchResult<Vec<u8>> {
    serde_json::to_vec(&outcome.result).map_err(|e| DispatchError::serialization(e.to_string()))
}

/// Encodes the body a structured transport should send for `outcome`.
///
/// Failures become an error envelope; successes (including attachments,
/// whose filename is ignored here) become the JSON result.
pub fn encode_outcome(outcome: &Outcome) -> Vec<u8> {
    if let Some(err) = outcome.failure_error() {
        return encode_error(err);
    }
    match encode_result(outcome) {
        Ok(body) => body,
        Err(err) => encode_error(&err),
    }
}
