//! Handler and middleware callables.
//!
//! A handler is any async function `Request -> Outcome`. A middleware receives
//! a [`Next`] plus the request and returns an [`Outcome`]; it forwards by
//! calling [`Next::run`] and short-circuits by returning without doing so.
//! `Next::run` consumes `self`, so a middleware can call the rest of the
//! chain at most once.
//!
//! ```rust,ignore
//! use switchboard_core::{HandlerDescriptor, Middleware, Outcome};
//!
//! let get = HandlerDescriptor::new("get", |req| async move {
//!     Outcome::ok(format!("Get:{}", req.data))
//! })
//! .description("Get value from the storage")
//! .middleware(Middleware::new(|next, req| async move {
//!     tracing::info!("before");
//!     let outcome = next.run(req).await;
//!     tracing::info!("after");
//!     outcome
//! }));
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::{Outcome, Request};

type PipelineFn = dyn Fn(Request) -> BoxFuture<'static, Outcome> + Send + Sync;
type MiddlewareFn = dyn Fn(Next, Request) -> BoxFuture<'static, Outcome> + Send + Sync;

// ============================================================================
// Pipeline
// ============================================================================

/// A type-erased, cheaply clonable `Request -> Outcome` callable.
///
/// Both bare handler functions and fully composed middleware chains are
/// pipelines.
#[derive(Clone)]
pub struct Pipeline(Arc<PipelineFn>);

impl Pipeline {
    /// Wraps an async function.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self(Arc::new(move |req| f(req).boxed()))
    }

    /// Runs the pipeline.
    pub fn call(&self, request: Request) -> BoxFuture<'static, Outcome> {
        (self.0)(request)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pipeline")
    }
}

// ============================================================================
// Next
// ============================================================================

/// The remainder of a middleware chain.
pub struct Next(Pipeline);

impl Next {
    /// Forwards the request to the next stage.
    pub fn run(self, request: Request) -> BoxFuture<'static, Outcome> {
        self.0.call(request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// A stage that runs around the rest of the chain.
#[derive(Clone)]
pub struct Middleware(Arc<MiddlewareFn>);

impl Middleware {
    /// Wraps an async function taking `(next, request)`.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Next, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self(Arc::new(move |next, req| f(next, req).boxed()))
    }

    /// Wraps this middleware around `inner`.
    ///
    /// `inner` is captured by value now; later changes elsewhere cannot alter
    /// what this stage forwards to.
    pub fn wrap(&self, inner: Pipeline) -> Pipeline {
        let stage = Arc::clone(&self.0);
        Pipeline(Arc::new(move |req| stage(Next(inner.clone()), req)))
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Middleware")
    }
}

// ============================================================================
// HandlerDescriptor
// ============================================================================

/// A registered handler with its metadata and local middlewares.
#[derive(Clone, Debug)]
pub struct HandlerDescriptor {
    name: String,
    description: String,
    function: Pipeline,
    middlewares: Vec<Middleware>,
}

impl HandlerDescriptor {
    /// Creates a descriptor for `name` backed by an async function.
    pub fn new<F, Fut>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self::from_pipeline(name, Pipeline::new(function))
    }

    /// Creates a descriptor around an existing pipeline.
    pub fn from_pipeline(name: impl Into<String>, function: Pipeline) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            function,
            middlewares: Vec::new(),
        }
    }

    /// Sets the human-readable description (used as CLI help text).
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a local middleware. Local middlewares run in the order added.
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Appends several local middlewares.
    pub fn middlewares(mut self, middlewares: impl IntoIterator<Item = Middleware>) -> Self {
        self.middlewares.extend(middlewares);
        self
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description.
    pub fn describe(&self) -> &str {
        &self.description
    }

    /// The bare handler function.
    pub fn function(&self) -> &Pipeline {
        &self.function
    }

    /// The local middlewares in declared order.
    pub fn local_middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }
}
