//! Configuration loading and the typed view the runtime reads.
//!
//! Handlers see configuration as a [`Settings`](switchboard_core::Settings)
//! tree; the runtime itself reads the `common.*` keys through
//! [`ServiceConfig`].

pub mod error;
pub mod loader;
pub mod service;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use service::{HttpConfig, ListenerConfig, LogMode, ServiceConfig};
