//! WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use switchboard_core::{
    DispatchError, Dispatcher, Envelope, encode_error, encode_error_message, encode_outcome,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::TransportResult;
use crate::guard::{TOKEN_HEADER, TokenGuard};
use crate::listener::ListenAddr;

/// Path the upgrade is served on.
pub const WS_PATH: &str = "/ws";

struct ServerState {
    token: TokenGuard,
    dispatcher: Dispatcher,
}

/// Serves envelopes over WebSocket.
pub struct WsServer {
    addr: ListenAddr,
    state: Arc<ServerState>,
}

impl WsServer {
    /// Creates a server on `addr` checking every frame against `token`.
    pub fn new(addr: ListenAddr, token: TokenGuard, dispatcher: Dispatcher) -> Self {
        Self {
            addr,
            state: Arc::new(ServerState { token, dispatcher }),
        }
    }

    /// Builds the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route(WS_PATH, get(ws_handler))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn serve(self, shutdown: CancellationToken) -> TransportResult<()> {
        let listener = self.addr.bind().await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` fires.
    pub async fn serve_listener(
        self,
        listener: tokio::net::TcpListener,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        let local = listener.local_addr()?;
        info!(addr = %local, path = WS_PATH, "WS server has been started");

        let router = self.router();
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        );

        // Upgraded connections are not tracked by graceful shutdown, so the
        // server future is dropped outright on cancellation.
        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    error!(addr = %local, error = %e, "WS server error");
                    return Err(e.into());
                }
            }
            _ = shutdown.cancelled() => {
                info!(addr = %local, "WS server shutting down");
            }
        }
        Ok(())
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!(remote_addr = %addr, "New WebSocket connection request");

    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    ws.on_upgrade(move |socket| handle_socket(socket, addr, state, token))
}

/// Builds the reply for one frame.
async fn answer(state: &ServerState, payload: &[u8], token: Option<&str>) -> Vec<u8> {
    let envelope = match Envelope::parse(payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "Malformed WebSocket frame");
            return encode_error_message(DispatchError::WRONG_FORMAT);
        }
    };

    if let Err(err) = state.token.check(token) {
        warn!(method = %envelope.method, "Wrong token");
        return encode_error(&err);
    }

    let method = envelope.method.clone();
    let outcome = state.dispatcher.dispatch(envelope).await;
    if let Some(err) = outcome.failure_error() {
        warn!(method = %method, status = outcome.status, error = %err, "Request failed");
    }
    encode_outcome(&outcome)
}

/// Serves one connection until the peer closes it.
async fn handle_socket(
    socket: WebSocket,
    addr: SocketAddr,
    state: Arc<ServerState>,
    token: Option<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    info!(remote_addr = %addr, "WebSocket connection established");

    while let Some(result) = ws_rx.next().await {
        let reply = match result {
            Ok(Message::Text(text)) => {
                trace!(remote_addr = %addr, len = text.len(), "Received text message");
                answer(&state, text.as_str().as_bytes(), token.as_deref()).await
            }
            Ok(Message::Binary(data)) => {
                trace!(remote_addr = %addr, len = data.len(), "Received binary message");
                answer(&state, &data, token.as_deref()).await
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => {
                debug!(remote_addr = %addr, "WebSocket connection closed by client");
                break;
            }
            Err(e) => {
                warn!(remote_addr = %addr, error = %e, "WebSocket error");
                break;
            }
        };

        let text = String::from_utf8_lossy(&reply).into_owned();
        if ws_tx.send(Message::Text(text.into())).await.is_err() {
            warn!(remote_addr = %addr, "Failed to send message, connection closed");
            break;
        }
    }

    info!(remote_addr = %addr, "WebSocket connection closed");
}
