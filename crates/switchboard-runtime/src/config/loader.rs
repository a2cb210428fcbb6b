//! Configuration loader using figment.
//!
//! # Sources (lowest to highest priority)
//!
//! 1. Programmatic defaults passed to [`ConfigLoader::merge`]
//! 2. One configuration file: an explicit [`ConfigLoader::file`], or the first
//!    of `config.yml`, `config.yaml`, `config.toml` found in the search paths
//! 3. Environment variables (`SWITCHBOARD_*`)
//!
//! # Feature Flags
//!
//! - `yaml-config` *(default)*: `.yml` / `.yaml` files
//! - `toml-config`: `.toml` files
//!
//! # Environment Variable Mapping
//!
//! Variables use the `SWITCHBOARD_` prefix with `__` as the path separator:
//!
//! - `SWITCHBOARD_COMMON__HTTP__PORT=9000` → `common.http.port = 9000`
//! - `SWITCHBOARD_COMMON__TOKEN=secret` → `common.token = "secret"`
//!
//! # Example
//!
//! ```rust,ignore
//! use switchboard_runtime::config::ConfigLoader;
//!
//! let settings = ConfigLoader::new().file("config.yml").load()?;
//! let port = settings.get_u16("common.http.port", 8080);
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde_json::Value;
use switchboard_core::Settings;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SWITCHBOARD_";

/// File names tried, in order, in every search path.
const DEFAULT_FILES: &[&str] = &["config.yml", "config.yaml", "config.toml"];

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that searches the current directory and reads the
    /// environment.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the user config directory (`~/.config/switchboard` on Linux).
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("switchboard"))
        } else {
            self
        }
    }

    /// Loads exactly this file; a missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables environment overrides (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables environment overrides.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges programmatic defaults below every other source.
    pub fn merge(mut self, defaults: Value) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(defaults));
        self
    }

    /// Loads the configuration tree.
    pub fn load(self) -> ConfigResult<Settings> {
        let figment = self.build_figment()?;

        let value: Value = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let settings = Settings::from(value);
        debug!(
            sections = settings.section("").map_or(0, |s| s.len()),
            "Configuration loaded successfully"
        );
        Ok(settings)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = std::mem::take(&mut self.figment);

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_default_file(figment)?;
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Merges a single file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            std::env::current_dir().into_iter().collect()
        } else {
            self.search_paths.clone()
        }
    }

    /// Loads the first default file found; none found is only a warning.
    fn load_default_file(&self, figment: Figment) -> ConfigResult<Figment> {
        for search_path in self.resolve_search_paths() {
            for name in DEFAULT_FILES {
                let path = search_path.join(name);
                if !path.exists() {
                    continue;
                }
                match Self::merge_config_file(figment.clone(), &path) {
                    Ok(merged) => {
                        info!(path = %path.display(), "Loading configuration file");
                        return Ok(merged);
                    }
                    Err(ConfigError::UnsupportedFormat(ext)) => {
                        debug!(path = %path.display(), ext = %ext, "Skipping config file of disabled format");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        warn!("No configuration file found, using defaults");
        Ok(figment)
    }
}

/// Loads configuration from the current directory, then the user config
/// directory.
pub fn load_config() -> ConfigResult<Settings> {
    let mut loader = ConfigLoader::new();
    if let Ok(dir) = std::env::current_dir() {
        loader = loader.search_path(dir);
    }
    loader.with_user_config_dir().load()
}

/// Loads configuration from `path` plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Settings> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_empty_search_path_yields_empty_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(settings.get_u16("common.http.port", 8080), 8080);
        assert!(settings.get("common").is_absent());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = ConfigLoader::new()
            .file("/definitely/not/here/config.yml")
            .without_env()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.ini", "a=1");

        let err = ConfigLoader::new().file(path).without_env().load().unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_yaml_file_from_search_path() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir,
            "config.yml",
            "common:\n  http:\n    enabled: true\n    port: 9090\n  token: abc\ntest: \"81\"\n",
        );

        let settings = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(settings.get_u16("common.http.port", 8080), 9090);
        assert!(settings.get_bool("common.http.enabled", false));
        assert_eq!(settings.get_str("common.token", ""), "abc");
        assert_eq!(settings.get_str("test", "80"), "81");
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yml", "common: [unclosed\n");

        let err = ConfigLoader::new().file(path).without_env().load().unwrap_err();

        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_file_overrides_programmatic_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.yml", "common:\n  ws:\n    port: 7000\n");

        let settings = ConfigLoader::new()
            .merge(json!({"common": {"ws": {"port": 1, "enabled": false}}}))
            .file(path)
            .without_env()
            .load()
            .unwrap();

        assert_eq!(settings.get_u16("common.ws.port", 8081), 7000);
        assert!(!settings.get_bool("common.ws.enabled", true));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "config.toml", "[common.socket]\nport = 8100\n");

        let settings = ConfigLoader::new().file(path).without_env().load().unwrap();

        assert_eq!(settings.get_u16("common.socket.port", 8000), 8100);
    }

    #[test]
    fn test_user_config_dir_is_searched_last() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new()
            .search_path(dir.path())
            .with_user_config_dir();

        assert_eq!(loader.search_paths[0], dir.path());
        if let Some(config_dir) = dirs::config_dir() {
            assert_eq!(
                loader.search_paths.last(),
                Some(&config_dir.join("switchboard"))
            );
        }
    }

    #[cfg(feature = "yaml-config")]
    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "service.yml", "common:\n  token: from-file\n");

        let settings = load_config_from_file(path).unwrap();

        assert_eq!(settings.get_str("common.token", ""), "from-file");
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: the variable name is unique to this test and removed right after.
        unsafe {
            std::env::set_var("SWITCHBOARD_COMMON__VERSION", "v9");
        }
        let settings = ConfigLoader::new().search_path(dir.path()).load().unwrap();
        unsafe {
            std::env::remove_var("SWITCHBOARD_COMMON__VERSION");
        }

        assert_eq!(settings.get_str("common.version", "0.1"), "v9");
    }
}
