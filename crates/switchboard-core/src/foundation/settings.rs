//! Typed configuration values with dotted-path lookup.
//!
//! A loaded configuration tree is represented as [`Settings`], a tagged union
//! over the shapes a YAML/TOML/JSON document can take. Lookups walk a dotted
//! path such as `common.http.port` and every typed accessor takes the
//! caller's default, which is returned when the path is absent **or** when the
//! value found there has a different type.
//!
//! ```rust,ignore
//! let port = settings.get_u16("common.http.port", 8080);
//! let enabled = settings.get_bool("common.ws.enabled", true);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

static ABSENT: Settings = Settings::Absent;

/// A node of the configuration tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Settings {
    /// Nested section.
    Map(BTreeMap<String, Settings>),
    /// String value.
    String(String),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
    /// Sequence value.
    List(Vec<Settings>),
    /// Missing or `null`.
    #[default]
    Absent,
}

impl Settings {
    /// An empty configuration.
    pub fn empty() -> Self {
        Self::Map(BTreeMap::new())
    }

    /// Resolves a dotted path.
    ///
    /// Returns [`Settings::Absent`] if any step is missing or if a step other
    /// than the last lands on a non-map value. An empty path returns `self`.
    pub fn get(&self, path: &str) -> &Settings {
        if path.is_empty() {
            return self;
        }

        let mut node = self;
        for step in path.split('.') {
            node = match node {
                Self::Map(map) => match map.get(step) {
                    Some(next) => next,
                    None => return &ABSENT,
                },
                _ => return &ABSENT,
            };
        }
        node
    }

    /// Whether this node is absent.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the string at `path`, or `default`.
    pub fn get_str(&self, path: &str, default: &str) -> String {
        match self.get(path) {
            Self::String(s) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Returns the integer at `path`, or `default`.
    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        match self.get(path) {
            Self::Integer(i) => *i,
            _ => default,
        }
    }

    /// Returns the integer at `path` if it fits in a port number, or `default`.
    pub fn get_u16(&self, path: &str, default: u16) -> u16 {
        match self.get(path) {
            Self::Integer(i) => u16::try_from(*i).unwrap_or(default),
            _ => default,
        }
    }

    /// Returns the non-negative integer at `path`, or `default`.
    pub fn get_u64(&self, path: &str, default: u64) -> u64 {
        match self.get(path) {
            Self::Integer(i) => u64::try_from(*i).unwrap_or(default),
            _ => default,
        }
    }

    /// Returns the boolean at `path`, or `default`.
    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        match self.get(path) {
            Self::Boolean(b) => *b,
            _ => default,
        }
    }

    /// Returns the number at `path`, or `default`. Integers are widened.
    pub fn get_float(&self, path: &str, default: f64) -> f64 {
        match self.get(path) {
            Self::Float(f) => *f,
            Self::Integer(i) => *i as f64,
            _ => default,
        }
    }

    /// Returns the section at `path` as a map, if it is one.
    pub fn section(&self, path: &str) -> Option<&BTreeMap<String, Settings>> {
        match self.get(path) {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Converts this node back into JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::String(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Boolean(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Absent => Value::Null,
        }
    }
}

impl From<Value> for Settings {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}
