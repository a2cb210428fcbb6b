//! The canonical request envelope.
//!
//! Every transport decodes its native input into an [`Envelope`] before calling
//! the dispatcher. On the wire the envelope is:
//!
//! ```text
//! {"method": string, "metadata": object | null, "data": any}
//! ```
//!
//! Unknown fields are ignored. A missing or `null` `metadata` becomes an empty
//! map, so downstream code never sees an absent value.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{DispatchError, DispatchResult};

/// A decoded inbound request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Name of the handler to invoke.
    #[serde(default)]
    pub method: String,

    /// Free-form request metadata (tokens, client IP, ...).
    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: Map<String, Value>,

    /// The request body forwarded to the handler untouched.
    #[serde(default)]
    pub data: Value,

    /// Transport-supplied GET data, e.g. parsed query parameters.
    ///
    /// Never read from or written to the wire.
    #[serde(skip)]
    pub query: Value,
}

fn metadata_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Envelope {
    /// Creates an envelope for `method` carrying `data`.
    pub fn new(method: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            method: method.into(),
            data: data.into(),
            ..Default::default()
        }
    }

    /// Decodes an envelope from raw JSON bytes.
    ///
    /// Only the JSON shape is checked here; use [`validate`](Self::validate)
    /// (or [`parse`](Self::parse)) to enforce a non-empty method.
    pub fn decode(bytes: &[u8]) -> DispatchResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| DispatchError::decode(e.to_string()))
    }

    /// Ensures the envelope names a method.
    pub fn validate(&self) -> DispatchResult<()> {
        if self.method.is_empty() {
            return Err(DispatchError::validation(DispatchError::WRONG_FORMAT));
        }
        Ok(())
    }

    /// Decodes and validates in one step.
    pub fn parse(bytes: &[u8]) -> DispatchResult<Self> {
        let envelope = Self::decode(bytes)?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Sets a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Sets the transport GET data.
    pub fn with_query(mut self, query: impl Into<Value>) -> Self {
        self.query = query.into();
        self
    }

    /// Splits the envelope into its method and the parts handed to handlers.
    pub fn into_parts(self) -> (String, Request) {
        (
            self.method,
            Request {
                data: self.data,
                metadata: self.metadata,
                query: self.query,
            },
        )
    }
}

/// The three request parts every middleware and handler receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// The envelope's `data` field.
    pub data: Value,
    /// The envelope's `metadata` field, never absent.
    pub metadata: Map<String, Value>,
    /// Transport GET data, `null` where the transport supplies none.
    pub query: Value,
}

impl Request {
    /// Creates a request with only a body.
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Looks up a metadata value.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// The outgoing error shape shared by every structured transport.
///
/// ```text
/// {"Status": "NOK", "Error": "<message>"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"NOK"` for errors.
    #[serde(rename = "Status")]
    pub status: String,
    /// Human-readable error message.
    #[serde(rename = "Error")]
    pub error: String,
}

impl ErrorResponse {
    /// Builds the standard `NOK` envelope for `message`.
    pub fn nok(message: impl Into<String>) -> Self {
        Self {
            status: "NOK".to_string(),
            error: message.into(),
        }
    }
}

impl From<&DispatchError> for ErrorResponse {
    fn from(err: &DispatchError) -> Self {
        Self::nok(err.to_string())
    }
}
