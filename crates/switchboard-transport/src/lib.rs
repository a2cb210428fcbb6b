//! # Switchboard Transport
//!
//! Transport adapters that feed a [`Dispatcher`](switchboard_core::Dispatcher).
//!
//! Every adapter decodes its native input into an envelope, calls the
//! dispatcher, and writes the outcome back in its own framing. They share the
//! dispatcher and the process configuration and nothing else.
//!
//! ## Features
//!
//! - `http-server`: one JSON envelope per request on `/`, plus `/check` and
//!   `/version`
//! - `ws-server`: one JSON envelope per frame on `/ws`
//! - `socket-server`: newline-delimited JSON over a bare TCP port
//! - `full` (default): all of the above
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │  switchboard-runtime    │  (reads config, starts listeners)
//! ├─────────────────────────┤
//! │  switchboard-transport  │  <- This crate
//! ├─────────────────────────┤
//! │  switchboard-core       │  (envelope, dispatcher)
//! └─────────────────────────┘
//! ```
//!
//! ## Error envelope
//!
//! All adapters that answer in JSON use the same error shape:
//!
//! ```json
//! {"Status": "NOK", "Error": "<message>"}
//! ```

mod error;
mod guard;
mod listener;

pub use error::{TransportError, TransportResult};
pub use guard::{TOKEN_HEADER, TokenGuard, TokenPolicy};
pub use listener::ListenAddr;

#[cfg(feature = "http-server")]
pub mod http;
#[cfg(feature = "http-server")]
pub use http::{HttpOptions, HttpServer};

#[cfg(feature = "ws-server")]
pub mod websocket;
#[cfg(feature = "ws-server")]
pub use websocket::WsServer;

#[cfg(feature = "socket-server")]
pub mod socket;
#[cfg(feature = "socket-server")]
pub use socket::SocketServer;

pub use tokio_util::sync::CancellationToken;
