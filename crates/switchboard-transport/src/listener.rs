//! Listening address shared by all adapters.

use std::fmt;

use tokio::net::TcpListener;
use tracing::error;

use crate::error::{TransportError, TransportResult};

/// Host and port an adapter listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    /// Interface to bind, `0.0.0.0` for all.
    pub host: String,
    /// TCP port, `0` for an ephemeral one.
    pub port: u16,
}

impl ListenAddr {
    /// Creates an address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Binds a TCP listener on this address.
    pub async fn bind(&self) -> TransportResult<TcpListener> {
        let addr = self.to_string();
        TcpListener::bind(&addr).await.map_err(|source| {
            error!(addr = %addr, error = %source, "Failed to bind listener");
            TransportError::Bind { addr, source }
        })
    }
}

impl Default for ListenAddr {
    fn default() -> Self {
        Self::new("0.0.0.0", 0)
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
