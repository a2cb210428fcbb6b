//! Framework layer: handlers, middleware composition, the registry, and the
//! dispatcher.

pub mod dispatcher;
pub mod handler;
pub mod middleware;
pub mod registry;

pub use dispatcher::Dispatcher;
pub use handler::{HandlerDescriptor, Middleware, Next, Pipeline};
pub use middleware::compose;
pub use registry::Registry;
