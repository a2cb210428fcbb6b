//! # Switchboard Framework
//!
//! Ready-made middlewares for Switchboard services.
//!
//! - [`logging_middleware`]: traces every request before and after the rest
//!   of the chain runs.
//! - [`auth_middleware`]: asks an [`AuthVerifier`] whether the caller's token
//!   may invoke a method, and answers `401` when it may not.
//! - `HttpAuthVerifier` (feature `http-client`): an [`AuthVerifier`] backed by
//!   a remote auth service.
//!
//! ```rust,ignore
//! use switchboard_core::HandlerDescriptor;
//! use switchboard_framework::{HttpAuthVerifier, auth_middleware, logging_middleware};
//!
//! let verifier = HttpAuthVerifier::new("http://auth:8080")?;
//! let get = HandlerDescriptor::new("get", get_handler)
//!     .middleware(logging_middleware("storage"))
//!     .middleware(auth_middleware(verifier, "storage", "get"));
//! ```

pub mod auth;
pub mod logging;

pub use auth::{AuthCheck, AuthCheckData, AuthError, AuthResult, AuthVerifier, auth_middleware};
#[cfg(feature = "http-client")]
pub use auth::HttpAuthVerifier;
pub use logging::logging_middleware;
