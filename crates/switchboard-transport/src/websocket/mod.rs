//! WebSocket adapter.
//!
//! One JSON envelope per frame on `/ws`, one JSON answer per envelope, in
//! order. Malformed frames are answered with an error envelope and the
//! connection stays open.

mod server;

pub use server::WsServer;
