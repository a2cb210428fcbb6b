//! The uniform `(result, status, error)` produced by every dispatch.
//!
//! # Attachments
//!
//! Status [`STATUS_ATTACHMENT`] (`210`) is reserved: the result is a raw byte
//! payload and the error slot holds the *filename* used for the
//! `Content-Disposition` header, not an error. [`Outcome::attachment`] builds
//! it; transports check [`Outcome::is_attachment`] before treating the error
//! slot as a failure.

use serde::Serialize;
use serde_json::Value;

use super::error::DispatchError;

/// Status code signalling a raw binary payload.
pub const STATUS_ATTACHMENT: u16 = 210;

/// Default success status.
pub const STATUS_OK: u16 = 200;

/// The result slot of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// A JSON result.
    Json(Value),
    /// Raw bytes, used with [`STATUS_ATTACHMENT`].
    Binary(Vec<u8>),
}

impl Payload {
    /// Returns the JSON value, if this is a JSON payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Binary(_) => None,
        }
    }

    /// Returns the raw bytes, if this is a binary payload.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Json(_) => None,
            Self::Binary(b) => Some(b),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Json(Value::Null)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// The result of dispatching a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The handler's result.
    pub result: Payload,
    /// HTTP-equivalent status code.
    pub status: u16,
    /// The error, or the filename for attachment outcomes.
    pub error: Option<DispatchError>,
}

impl Outcome {
    /// A `200` outcome carrying `value`.
    pub fn ok(value: impl Into<Value>) -> Self {
        Self::with_status(value, STATUS_OK)
    }

    /// A successful outcome with an explicit status.
    pub fn with_status(value: impl Into<Value>, status: u16) -> Self {
        Self {
            result: Payload::Json(value.into()),
            status,
            error: None,
        }
    }

    /// A failed outcome with a `null` result and the error's own status code.
    pub fn from_error(error: DispatchError) -> Self {
        let status = error.status_code();
        Self::failure(status, error)
    }

    /// A failed outcome with an explicit status.
    pub fn failure(status: u16, error: DispatchError) -> Self {
        Self {
            result: Payload::default(),
            status,
            error: Some(error),
        }
    }

    /// A handler failure carrying `message` with the given status.
    pub fn handler_error(status: u16, message: impl Into<String>) -> Self {
        Self::failure(status, DispatchError::handler(message))
    }

    /// A raw binary download; `filename` rides in the error slot.
    pub fn attachment(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            result: Payload::Binary(bytes.into()),
            status: STATUS_ATTACHMENT,
            error: Some(DispatchError::handler(filename)),
        }
    }

    /// Whether this outcome uses the reserved binary status.
    pub fn is_attachment(&self) -> bool {
        self.status == STATUS_ATTACHMENT
    }

    /// The attachment filename carried in the error slot, if any.
    pub fn attachment_filename(&self) -> Option<String> {
        if self.is_attachment() {
            self.error.as_ref().map(ToString::to_string)
        } else {
            None
        }
    }

    /// Returns the error only when it is a real failure.
    pub fn failure_error(&self) -> Option<&DispatchError> {
        if self.is_attachment() {
            None
        } else {
            self.error.as_ref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attachment_keeps_filename_in_error_slot() {
        let outcome = Outcome::attachment(vec![0x01, 0x02], "report.bin");
        assert_eq!(outcome.status, 210);
        assert_eq!(outcome.result.as_bytes(), Some(&[0x01, 0x02][..]));
        assert_eq!(
            outcome.error.as_ref().map(ToString::to_string).as_deref(),
            Some("report.bin")
        );
        assert_eq!(outcome.attachment_filename().as_deref(), Some("report.bin"));
        assert!(outcome.failure_error().is_none());
    }

    #[test]
    fn test_from_error_uses_error_status() {
        let outcome = Outcome::from_error(DispatchError::not_found("nope"));
        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.result, Payload::Json(Value::Null));
        assert!(outcome.failure_error().is_some());
        assert!(outcome.attachment_filename().is_none());
    }

    #[test]
    fn test_payload_serializes_untagged() {
        assert_eq!(
            serde_json::to_value(Payload::Json(json!({"a": 1}))).unwrap(),
            json!({"a": 1})
        );
        assert_eq!(
            serde_json::to_value(Payload::Binary(vec![1, 2])).unwrap(),
            json!([1, 2])
        );
    }
}
