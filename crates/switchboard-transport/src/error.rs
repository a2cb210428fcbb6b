//! Transport error types.

use std::io;

use thiserror::Error;

/// Errors raised while running a listener.
///
/// Per-request failures never surface here; they are answered on the wire.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure on the listening or accepted socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
