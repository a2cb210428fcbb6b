//! Socket server.
//!
//! Frames are newline-terminated JSON envelopes; each answer is one
//! newline-terminated JSON document.
//!
//! The listener accepts exactly one connection for its whole lifetime and
//! serves it until the peer closes its write half. Later clients are never
//! accepted.

use switchboard_core::{
    DispatchError, Dispatcher, Envelope, encode_error_message, encode_outcome,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::TransportResult;
use crate::listener::ListenAddr;

const EOS: &[u8] = b"\n";

/// Serves envelopes over a single TCP connection.
pub struct SocketServer {
    addr: ListenAddr,
    dispatcher: Dispatcher,
}

impl SocketServer {
    /// Creates a server on `addr`.
    pub fn new(addr: ListenAddr, dispatcher: Dispatcher) -> Self {
        Self { addr, dispatcher }
    }

    /// Binds the configured address and serves until the connection ends or
    /// `shutdown` fires.
    pub async fn serve(self, shutdown: CancellationToken) -> TransportResult<()> {
        let listener = self.addr.bind().await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        let local = listener.local_addr()?;
        info!(addr = %local, "Socket server has been started");

        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = shutdown.cancelled() => {
                info!(addr = %local, "Socket server shutting down");
                return Ok(());
            }
        };
        drop(listener);
        info!(remote_addr = %peer, "Socket connection established");

        tokio::select! {
            result = self.handle_connection(stream) => result?,
            _ = shutdown.cancelled() => {
                info!(addr = %local, "Socket server shutting down");
            }
        }
        Ok(())
    }

    async fn handle_connection(&self, stream: TcpStream) -> TransportResult<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            trace!(len = line.len(), "Received socket line");
            if let Some(mut reply) = self.answer(&line).await {
                reply.extend_from_slice(EOS);
                writer.write_all(&reply).await?;
            }
        }

        info!("Socket connection closed by peer");
        Ok(())
    }

    /// Builds the reply for one line; blank and non-JSON lines get none.
    async fn answer(&self, line: &[u8]) -> Option<Vec<u8>> {
        if line.trim_ascii().is_empty() {
            return None;
        }

        let envelope = match Envelope::decode(line) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(error = %err, "Ignoring non-JSON socket line");
                return None;
            }
        };

        if let Err(err) = envelope.validate() {
            warn!(error = %err, "Socket envelope has no method");
            return Some(encode_error_message(DispatchError::WRONG_FORMAT));
        }

        let method = envelope.method.clone();
        let outcome = self.dispatcher.dispatch(envelope).await;
        if let Some(err) = outcome.failure_error() {
            warn!(method = %method, status = outcome.status, error = %err, "Request failed");
        }
        Some(encode_outcome(&outcome))
    }
}
