//! Foundation layer: wire types, errors, and configuration values.

pub mod context;
pub mod envelope;
pub mod error;
pub mod outcome;
pub mod reply;
pub mod settings;

pub use context::ServiceContext;
pub use envelope::{Envelope, ErrorResponse, Request};
pub use error::{DispatchError, DispatchResult, RegistryError, RegistryResult};
pub use outcome::{Outcome, Payload, STATUS_ATTACHMENT, STATUS_OK};
pub use reply::{encode_error, encode_error_message, encode_outcome, encode_result};
pub use settings::Settings;
