//! Switchboard Runtime - service orchestration for the Switchboard
//! microservice runtime.
//!
//! This crate provides:
//! - Configuration loading (`config`) into [`Settings`](switchboard_core::Settings)
//! - Logging setup driven by `common.log_mode` (`logging`)
//! - The command-line adapter (`cli`)
//! - The [`Service`] object that starts listeners and background tasks
//!
//! # Listeners
//!
//! `start` spawns every listener enabled in configuration and compiled in:
//!
//! - `http-server`: `common.http.*`, port 8080 by default
//! - `ws-server`: `common.ws.*`, port 8081 by default
//! - `socket-server`: `common.socket.*`, port 8000 by default
//!
//! ```ignore
//! use switchboard_runtime::Service;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Service::new("storage")
//!         .config_file("config.yml")?
//!         .handlers(handlers())
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use cli::{Cli, Invocation};
pub use config::{ConfigError, ConfigLoader, ConfigResult, ServiceConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LogFormat, LogOutput, LoggingBuilder};
pub use service::{BUILD_DATE, Service, Task, wait_for_shutdown};
