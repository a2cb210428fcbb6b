//! HTTP adapter.
//!
//! ```text
//! 0.0.0.0:8080
//! ├── GET|POST /         → envelope in body, query string as GET data
//! ├── GET      /check    → {"Status":"OK"}
//! └── GET      /version  → {"Version": ..., "Built": ...}
//! ```

mod client_ip;
mod server;

pub use client_ip::{client_ip, query_map};
pub use server::{HttpOptions, HttpServer};
