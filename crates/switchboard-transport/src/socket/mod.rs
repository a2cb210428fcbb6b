//! Line-delimited TCP adapter.

mod server;

pub use server::SocketServer;
