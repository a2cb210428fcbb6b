//! HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use switchboard_core::{
    DispatchError, Dispatcher, Envelope, Outcome, Payload, encode_error, encode_result,
};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::client_ip::{client_ip, query_map};
use crate::error::TransportResult;
use crate::guard::{TOKEN_HEADER, TokenGuard, TokenPolicy};
use crate::listener::ListenAddr;

const JSON_CONTENT: &str = "application/json";
const BINARY_CONTENT: &str = "application/octet-stream";

/// Settings for the HTTP adapter.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Listening address.
    pub addr: ListenAddr,
    /// Deadline for receiving the request body.
    pub read_timeout: Duration,
    /// Deadline for producing the response.
    pub write_timeout: Duration,
    /// Whether `/` answers CORS preflights and adds CORS headers.
    pub cors: bool,
    /// Shared-token check.
    pub token: TokenGuard,
    /// What to do after a token mismatch.
    pub token_policy: TokenPolicy,
    /// Reported by `/version`.
    pub version: String,
    /// Reported by `/version`.
    pub build_date: String,
    /// Largest accepted request body in bytes.
    pub body_limit: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            addr: ListenAddr::new("0.0.0.0", 8080),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            cors: true,
            token: TokenGuard::default(),
            token_policy: TokenPolicy::default(),
            version: "0.1".to_string(),
            build_date: "no build date".to_string(),
            body_limit: 2 * 1024 * 1024,
        }
    }
}

struct ServerState {
    options: HttpOptions,
    dispatcher: Dispatcher,
}

/// Serves envelopes over HTTP.
pub struct HttpServer {
    state: Arc<ServerState>,
}

impl HttpServer {
    /// Creates a server that dispatches through `dispatcher`.
    pub fn new(options: HttpOptions, dispatcher: Dispatcher) -> Self {
        Self {
            state: Arc::new(ServerState {
                options,
                dispatcher,
            }),
        }
    }

    /// Builds the router.
    pub fn router(&self) -> Router {
        let mut dispatch = Router::new()
            .route("/", get(dispatch_request).post(dispatch_request))
            .with_state(Arc::clone(&self.state));
        if self.state.options.cors {
            dispatch = dispatch.layer(CorsLayer::permissive());
        }

        let health = Router::new()
            .route("/check", get(health_check))
            .route("/version", get(version_check))
            .with_state(Arc::clone(&self.state));

        dispatch.merge(health).layer(TraceLayer::new_for_http())
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn serve(self, shutdown: CancellationToken) -> TransportResult<()> {
        let listener = self.state.options.addr.bind().await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` fires.
    pub async fn serve_listener(
        self,
        listener: tokio::net::TcpListener,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        let local = listener.local_addr()?;
        info!(addr = %local, "Http server has been started");

        let router = self.router();
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await;

        match result {
            Ok(()) => {
                info!(addr = %local, "Http server shutting down");
                Ok(())
            }
            Err(e) => {
                error!(addr = %local, error = %e, "Http server error");
                Err(e.into())
            }
        }
    }
}

// ─── Responses ────────────────────────────────────────────────────────────────

/// A fully rendered HTTP answer.
struct Reply {
    status: StatusCode,
    content_type: &'static str,
    disposition: Option<String>,
    body: Vec<u8>,
}

impl Reply {
    fn error(status: StatusCode, err: &DispatchError) -> Self {
        Self {
            status,
            content_type: JSON_CONTENT,
            disposition: None,
            body: encode_error(err),
        }
    }

    fn from_outcome(outcome: &Outcome) -> Self {
        if outcome.is_attachment() {
            let body = match &outcome.result {
                Payload::Binary(bytes) => bytes.clone(),
                Payload::Json(_) => match encode_result(outcome) {
                    Ok(body) => body,
                    Err(err) => {
                        warn!(error = %err, "Failed to encode attachment payload");
                        return Self::error(StatusCode::INTERNAL_SERVER_ERROR, &err);
                    }
                },
            };
            return Self {
                status: StatusCode::OK,
                content_type: BINARY_CONTENT,
                disposition: outcome
                    .attachment_filename()
                    .map(|name| format!("attachment; filename={name}")),
                body,
            };
        }

        let status =
            StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let Some(err) = outcome.failure_error() {
            return Self::error(status, err);
        }

        match encode_result(outcome) {
            Ok(body) => Self {
                status,
                content_type: JSON_CONTENT,
                disposition: None,
                body,
            },
            Err(err) => Self::error(StatusCode::INTERNAL_SERVER_ERROR, &err),
        }
    }

    /// Puts `preamble` in front of this reply and answers `401`.
    fn unauthorized_with(self, mut preamble: Vec<u8>) -> Self {
        preamble.extend(self.body);
        Self {
            status: StatusCode::UNAUTHORIZED,
            content_type: JSON_CONTENT,
            disposition: None,
            body: preamble,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut response = (self.status, [(header::CONTENT_TYPE, self.content_type)], self.body)
            .into_response();
        if let Some(disposition) = self.disposition
            && let Ok(value) = disposition.parse::<HeaderValue>()
        {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn dispatch_request(State(state): State<Arc<ServerState>>, request: Request) -> Reply {
    let options = &state.options;
    let (parts, body) = request.into_parts();
    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(&parts.headers, peer);

    let bytes = match timeout(options.read_timeout, to_bytes(body, options.body_limit)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            let err = DispatchError::decode(e.to_string());
            warn!(ip = %ip, error = %err, "Failed to read request body");
            return Reply::error(StatusCode::BAD_REQUEST, &err);
        }
        Err(_) => {
            let err = DispatchError::decode("request body read timed out");
            warn!(ip = %ip, "Request body read timed out");
            return Reply::error(StatusCode::BAD_REQUEST, &err);
        }
    };

    let envelope = match Envelope::decode(&bytes) {
        Ok(envelope) => envelope
            .with_metadata("ip", ip.clone())
            .with_query(query_map(parts.uri.query())),
        Err(err) => {
            warn!(ip = %ip, error = %err, "Malformed request envelope");
            return Reply::error(StatusCode::BAD_REQUEST, &err);
        }
    };

    if let Err(err) = envelope.validate() {
        warn!(ip = %ip, error = %err, "Request envelope has no method");
        return Reply::error(StatusCode::BAD_REQUEST, &err);
    }

    let presented = parts
        .headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    let mut preamble = None;
    if let Err(err) = options.token.check(presented) {
        warn!(ip = %ip, method = %envelope.method, "Wrong token");
        match options.token_policy {
            TokenPolicy::Reject => return Reply::error(StatusCode::UNAUTHORIZED, &err),
            TokenPolicy::Continue => preamble = Some(encode_error(&err)),
        }
    }

    let method = envelope.method.clone();
    debug!(ip = %ip, method = %method, "Dispatching HTTP request");

    let outcome = match timeout(options.write_timeout, state.dispatcher.dispatch(envelope)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(method = %method, "Request processing timed out");
            Outcome::failure(
                StatusCode::GATEWAY_TIMEOUT.as_u16(),
                DispatchError::handler("request processing timed out"),
            )
        }
    };

    if let Some(err) = outcome.failure_error() {
        warn!(method = %method, status = outcome.status, error = %err, "Request failed");
    }

    let reply = Reply::from_outcome(&outcome);
    match preamble {
        Some(preamble) => reply.unauthorized_with(preamble),
        None => reply,
    }
}

async fn health_check() -> impl IntoResponse {
    Json(json!({"Status": "OK"}))
}

async fn version_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "Version": state.options.version,
        "Built": state.options.build_date,
    }))
}
