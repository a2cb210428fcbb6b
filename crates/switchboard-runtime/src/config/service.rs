//! Typed view of the `common.*` configuration keys.
//!
//! Every key has a default, so an empty configuration is a working one:
//!
//! | Key | Default |
//! |-----|---------|
//! | `common.host` | `0.0.0.0` |
//! | `common.token` | `""` (no token check) |
//! | `common.version` | `0.1` |
//! | `common.log_mode` | `debug` |
//! | `common.http.enabled` / `port` | `true` / `8080` |
//! | `common.http.read_timeout` / `write_timeout` | `5` / `5` seconds |
//! | `common.http.cors` | `true` |
//! | `common.http.token_policy` | `continue` |
//! | `common.ws.enabled` / `port` | `true` / `8081` |
//! | `common.socket.enabled` / `port` | `true` / `8000` |

use std::path::PathBuf;
use std::time::Duration;

use switchboard_core::Settings;
use switchboard_transport::TokenPolicy;
use tracing::warn;

/// Logging profile selected by `common.log_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Debug level with source locations.
    #[default]
    Debug,
    /// Info level, compact (or JSON) output.
    Production,
}

impl LogMode {
    /// `"debug"` selects [`LogMode::Debug`]; anything else is production.
    pub fn from_name(name: &str) -> Self {
        if name == "debug" {
            Self::Debug
        } else {
            Self::Production
        }
    }
}

/// An on/off listener with a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Whether the listener is started.
    pub enabled: bool,
    /// TCP port.
    pub port: u16,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Whether the listener is started.
    pub enabled: bool,
    /// TCP port.
    pub port: u16,
    /// Body read deadline.
    pub read_timeout: Duration,
    /// Response deadline.
    pub write_timeout: Duration,
    /// CORS on `/`.
    pub cors: bool,
    /// Behaviour after a token mismatch.
    pub token_policy: TokenPolicy,
}

/// Everything the runtime reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Interface every listener binds.
    pub host: String,
    /// Shared token for HTTP and WebSocket; empty disables the check.
    pub token: String,
    /// Reported by `/version`.
    pub version: String,
    /// Logging profile.
    pub log_mode: LogMode,
    /// Optional log file (`common.log.file`).
    pub log_file: Option<PathBuf>,
    /// Optional log format override (`common.log.format`).
    pub log_format: Option<String>,
    /// HTTP listener.
    pub http: HttpConfig,
    /// WebSocket listener.
    pub ws: ListenerConfig,
    /// Socket listener.
    pub socket: ListenerConfig,
}

impl ServiceConfig {
    /// Reads the typed view, falling back to defaults key by key.
    pub fn from_settings(settings: &Settings) -> Self {
        let policy_name = settings.get_str("common.http.token_policy", "continue");
        let token_policy = policy_name.parse().unwrap_or_else(|e: String| {
            warn!(error = %e, "Falling back to the continue token policy");
            TokenPolicy::Continue
        });

        let log_file = settings.get_str("common.log.file", "");
        let log_format = settings.get_str("common.log.format", "");

        Self {
            host: settings.get_str("common.host", "0.0.0.0"),
            token: settings.get_str("common.token", ""),
            version: settings.get_str("common.version", "0.1"),
            log_mode: LogMode::from_name(&settings.get_str("common.log_mode", "debug")),
            log_file: (!log_file.is_empty()).then(|| PathBuf::from(log_file)),
            log_format: (!log_format.is_empty()).then_some(log_format),
            http: HttpConfig {
                enabled: settings.get_bool("common.http.enabled", true),
                port: settings.get_u16("common.http.port", 8080),
                read_timeout: Duration::from_secs(settings.get_u64("common.http.read_timeout", 5)),
                write_timeout: Duration::from_secs(
                    settings.get_u64("common.http.write_timeout", 5),
                ),
                cors: settings.get_bool("common.http.cors", true),
                token_policy,
            },
            ws: ListenerConfig {
                enabled: settings.get_bool("common.ws.enabled", true),
                port: settings.get_u16("common.ws.port", 8081),
            },
            socket: ListenerConfig {
                enabled: settings.get_bool("common.socket.enabled", true),
                port: settings.get_u16("common.socket.port", 8000),
            },
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::empty())
    }
}
