//! Unified error types for the Switchboard core.
//!
//! Every failure that can occur between a transport receiving bytes and a
//! transport writing bytes back is expressed as a [`DispatchError`]. Transport
//! adapters convert these into their own wire shape (an error envelope, an
//! HTTP status, a non-zero CLI exit) at the edge.
//!
//! The `Display` output of each variant is exactly the message that ends up in
//! the `Error` field of the error envelope, so it carries no prefixes.

use thiserror::Error;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors produced while decoding, validating, routing, or executing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The inbound payload is not a well-formed envelope.
    #[error("{0}")]
    Decode(String),

    /// The envelope decoded but a required field is missing or empty.
    #[error("{0}")]
    Validation(String),

    /// No handler is registered under the requested method.
    #[error("no handler")]
    NotFound {
        /// The method that was requested.
        method: String,
    },

    /// The request carried the wrong token, or an auth middleware refused it.
    #[error("{0}")]
    Auth(String),

    /// Error returned by a handler or middleware.
    #[error("{0}")]
    Handler(String),

    /// The outcome could not be encoded for the wire.
    #[error("{0}")]
    Serialization(String),
}

impl DispatchError {
    /// Message used when an envelope is structurally valid JSON but unusable.
    pub const WRONG_FORMAT: &'static str = "Wrong message format";

    /// Message used when the configured token does not match the request.
    pub const WRONG_TOKEN: &'static str = "Wrong token";

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not-found error for `method`.
    pub fn not_found(method: impl Into<String>) -> Self {
        Self::NotFound {
            method: method.into(),
        }
    }

    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Returns the HTTP-equivalent status code for this error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Decode(_) | Self::Validation(_) => 400,
            Self::Auth(_) => 401,
            Self::NotFound { .. } => 404,
            Self::Handler(_) | Self::Serialization(_) => 500,
        }
    }

    /// Short machine-friendly name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Auth(_) => "auth",
            Self::Handler(_) => "handler",
            Self::Serialization(_) => "serialization",
        }
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised while building a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two descriptors were registered under the same method name.
    #[error("duplicate handler for method '{0}'")]
    Duplicate(String),

    /// A descriptor was registered with an empty method name.
    #[error("handler name must not be empty")]
    EmptyName,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_message() {
        assert_eq!(DispatchError::handler("boom").to_string(), "boom");
        assert_eq!(DispatchError::not_found("x").to_string(), "no handler");
        assert_eq!(
            DispatchError::auth(DispatchError::WRONG_TOKEN).to_string(),
            "Wrong token"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DispatchError::decode("bad").status_code(), 400);
        assert_eq!(DispatchError::validation("bad").status_code(), 400);
        assert_eq!(DispatchError::auth("no").status_code(), 401);
        assert_eq!(DispatchError::not_found("m").status_code(), 404);
        assert_eq!(DispatchError::handler("e").status_code(), 500);
        assert_eq!(DispatchError::serialization("e").status_code(), 500);
    }
}
