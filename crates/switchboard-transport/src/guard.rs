//! Shared-token check used by the HTTP and WebSocket adapters.

use std::str::FromStr;

use switchboard_core::{DispatchError, DispatchResult};

/// Header that carries the caller's token.
pub const TOKEN_HEADER: &str = "Token";

/// What the HTTP adapter does after a token mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// Answer `401`, write the error envelope, and still dispatch the request.
    /// The dispatch output follows the error envelope in the same body.
    #[default]
    Continue,
    /// Answer `401` with the error envelope only.
    Reject,
}

impl FromStr for TokenPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown token policy '{other}'")),
        }
    }
}

/// Compares presented tokens against the configured one.
///
/// An empty configured token disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenGuard {
    token: String,
}

impl TokenGuard {
    /// Creates a guard for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Whether a token is configured.
    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty()
    }

    /// Checks a presented token; a missing header counts as an empty token.
    pub fn check(&self, presented: Option<&str>) -> DispatchResult<()> {
        if !self.is_enabled() || presented.unwrap_or_default() == self.token {
            return Ok(());
        }
        Err(DispatchError::auth(DispatchError::WRONG_TOKEN))
    }
}
