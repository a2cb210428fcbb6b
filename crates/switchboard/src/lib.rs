//! # Switchboard
//!
//! A small microservice runtime. Every transport decodes the same JSON
//! envelope and hands it to one dispatcher:
//!
//! ```text
//! ┌──────────────┐
//! │ HTTP  :8080  │──┐
//! │ WS    :8081  │──┤     ┌────────────┐     ┌──────────────────────────────────┐
//! │ TCP   :8000  │──┼────▶│ Dispatcher │────▶│ globals → locals → handler       │──▶ Outcome
//! │ CLI          │──┘     └────────────┘     └──────────────────────────────────┘
//! └──────────────┘
//! ```
//!
//! The envelope is `{"method": ..., "metadata": {...}, "data": ...}`. A handler
//! returns an [`Outcome`](switchboard_core::Outcome): a result, a status, and an
//! optional error. Status `210` marks a binary attachment whose filename rides
//! in the error slot.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchboard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Service::new("echo")
//!         .load_config()?
//!         .handlers(vec![HandlerDescriptor::new("echo", |req: Request| async move {
//!             Outcome::ok(req.data)
//!         })])
//!         .middlewares(vec![logging_middleware("Logging")])
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `yaml-config` *(default)*, `toml-config`: configuration file formats
//! - `full-transport` *(default)*: `http-server`, `ws-server` and `socket-server`
//! - `http-client`: [`HttpAuthVerifier`](switchboard_framework::HttpAuthVerifier)
//! - `json-log`: JSON log lines in production mode

pub use switchboard_core as core;
pub use switchboard_framework as framework;
pub use switchboard_runtime as runtime;
pub use switchboard_transport as transport;

/// Everything a service binary usually needs.
///
/// ```rust,ignore
/// use switchboard::prelude::*;
/// ```
pub mod prelude {
    pub use switchboard_runtime::{Service, Task};

    pub use switchboard_core::{
        DispatchError, Dispatcher, Envelope, HandlerDescriptor, Middleware, Next, Outcome,
        Registry, Request, ServiceContext, Settings,
    };

    pub use switchboard_framework::{AuthVerifier, auth_middleware, logging_middleware};

    #[cfg(feature = "http-client")]
    pub use switchboard_framework::HttpAuthVerifier;
}
