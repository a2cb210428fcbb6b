//! Process-wide service context.
//!
//! [`ServiceContext`] is constructed once at startup and shared by reference
//! (`Arc<ServiceContext>`) with handlers that need configuration or a place to
//! stash process-wide values. Writes go through a lock, so concurrent writers
//! are safe; the last write for a key wins.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use super::settings::Settings;

/// Shared configuration plus a small key/value store.
#[derive(Debug, Default)]
pub struct ServiceContext {
    settings: Settings,
    values: RwLock<HashMap<String, Value>>,
}

impl ServiceContext {
    /// Creates a context around loaded settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            values: RwLock::new(HashMap::new()),
        }
    }

    /// The loaded configuration.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shorthand for `settings().get_str(path, default)`.
    pub fn config_str(&self, path: &str, default: &str) -> String {
        self.settings.get_str(path, default)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.write().insert(key.into(), value.into());
    }

    /// Returns a clone of the value stored under `key`.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove_value(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_values_overwrite() {
        let ctx = ServiceContext::new(Settings::from(json!({"test": "80"})));
        ctx.set_value("k", 1);
        ctx.set_value("k", 2);
        assert_eq!(ctx.value("k"), Some(json!(2)));
        assert_eq!(ctx.remove_value("k"), Some(json!(2)));
        assert_eq!(ctx.value("k"), None);
        assert_eq!(ctx.config_str("test", "x"), "80");
    }

    #[test]
    fn test_concurrent_writers() {
        let ctx = Arc::new(ServiceContext::default());
        let threads: Vec<_> = (0..8)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || ctx.set_value(format!("k{i}"), i))
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        for i in 0..8 {
            assert_eq!(ctx.value(&format!("k{i}")), Some(json!(i)));
        }
    }
}
