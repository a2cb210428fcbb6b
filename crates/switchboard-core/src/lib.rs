//! # Switchboard Core
//!
//! The dispatch engine of the Switchboard microservice runtime.
//!
//! Every transport (HTTP, WebSocket, line socket, CLI) decodes its input into an
//! [`Envelope`] and hands it to the [`Dispatcher`]. The dispatcher looks up the
//! handler registered for the envelope's method, runs the middleware chain
//! around it, and returns an [`Outcome`]: a result, a status code, and an
//! optional error.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Wire types**: [`Envelope`], [`Request`], [`ErrorResponse`]
//! - **Outcomes**: [`Outcome`] and [`Payload`], including binary attachments
//!   (status [`STATUS_ATTACHMENT`])
//! - **Errors**: [`DispatchError`] with its status mapping, [`RegistryError`]
//! - **Configuration values**: [`Settings`] and the shared [`ServiceContext`]
//!
//! ### Framework Layer
//!
//! - **Handlers**: [`HandlerDescriptor`], [`Pipeline`]
//! - **Middleware**: [`Middleware`], [`Next`], [`compose`]
//! - **Routing**: [`Registry`], [`Dispatcher`]
//!
//! ## Request Flow
//!
//! ```text
//! ┌───────────┐     ┌────────────┐     ┌─────────┐     ┌────────┐     ┌─────────┐
//! │ Transport │────▶│ Dispatcher │────▶│ globals │────▶│ locals │────▶│ Handler │
//! └───────────┘     └────────────┘     └─────────┘     └────────┘     └─────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchboard_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let get = HandlerDescriptor::new("get", |req| async move {
//!         Outcome::ok(format!("Get:80:{}", req.data.as_str().unwrap_or_default()))
//!     });
//!     let registry = Registry::register([get]).unwrap();
//!     let dispatcher = Dispatcher::new(registry, Vec::new());
//!
//!     let outcome = dispatcher.dispatch(Envelope::new("get", "X")).await;
//!     assert_eq!(outcome, Outcome::ok("Get:80:X"));
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;

// Re-export foundation types
pub use foundation::{
    DispatchError, DispatchResult, Envelope, ErrorResponse, Outcome, Payload, RegistryError,
    RegistryResult, Request, STATUS_ATTACHMENT, STATUS_OK, ServiceContext, Settings, encode_error,
    encode_error_message, encode_outcome, encode_result,
};

// Re-export framework types
pub use framework::{Dispatcher, HandlerDescriptor, Middleware, Next, Pipeline, Registry, compose};

pub use futures::future::BoxFuture;

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::framework::{Dispatcher, HandlerDescriptor, Middleware, Next, Registry};
}
