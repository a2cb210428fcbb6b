//! The transport-agnostic dispatcher.
//!
//! [`Dispatcher::dispatch`] is the single choke point every transport calls:
//!
//! 1. Reject an empty method with a validation error (no lookup happens).
//! 2. Look up the descriptor; on a miss return a not-found outcome without
//!    touching any handler.
//! 3. Run the composed middleware chain and return its outcome verbatim.
//!
//! Chains are composed once, when the dispatcher is built. Composition is pure,
//! so this is observably identical to composing on every call.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{Instrument, Level, debug, span};

use super::handler::{Middleware, Pipeline};
use super::middleware::compose;
use super::registry::Registry;
use crate::foundation::{DispatchError, Envelope, Outcome};

/// Routes envelopes to registered handlers through their middleware chains.
///
/// `Dispatcher` holds no request-scoped state and is shared between transports
/// behind an `Arc`.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    globals: Arc<[Middleware]>,
    chains: Arc<HashMap<String, Pipeline>>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry` with process-wide `globals`.
    pub fn new(registry: Registry, globals: Vec<Middleware>) -> Self {
        let chains = registry
            .iter()
            .map(|descriptor| {
                let chain = compose(
                    &globals,
                    descriptor.local_middlewares(),
                    descriptor.function().clone(),
                );
                (descriptor.name().to_string(), chain)
            })
            .collect();

        Self {
            registry: Arc::new(registry),
            globals: globals.into(),
            chains: Arc::new(chains),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatches one envelope.
    pub async fn dispatch(&self, envelope: Envelope) -> Outcome {
        if let Err(err) = envelope.validate() {
            debug!(error = %err, "Rejected envelope without method");
            return Outcome::from_error(err);
        }

        let (method, request) = envelope.into_parts();

        let Some(chain) = self.chains.get(&method) else {
            debug!(method = %method, "No handler registered for method");
            return Outcome::from_error(DispatchError::not_found(method));
        };

        let span = span!(Level::DEBUG, "dispatch", method = %method);
        let outcome = chain.call(request).instrument(span).await;

        debug!(
            method = %method,
            status = outcome.status,
            failed = outcome.failure_error().is_some(),
            "Dispatch finished"
        );
        outcome
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.registry.len())
            .field("globals", &self.globals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Request, STATUS_ATTACHMENT};
    use crate::framework::HandlerDescriptor;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(name: &'static str, calls: &Arc<Mutex<Vec<(String, Value)>>>) -> HandlerDescriptor {
        let calls = Arc::clone(calls);
        HandlerDescriptor::new(name, move |req: Request| {
            let calls = Arc::clone(&calls);
            async move {
                calls.lock().push((name.to_string(), req.data.clone()));
                Outcome::ok(req.data)
            }
        })
    }

    fn storage_dispatcher() -> Dispatcher {
        let get = HandlerDescriptor::new("get", |req: Request| async move {
            let data = req.data.as_str().unwrap_or_default().to_string();
            Outcome::ok(format!("Get:80:{data}"))
        })
        .description("Get value from the storage");
        Dispatcher::new(Registry::register([get]).unwrap(), Vec::new())
    }

    #[tokio::test]
    async fn test_dispatch_worked_example() {
        let dispatcher = storage_dispatcher();
        let outcome = dispatcher.dispatch(Envelope::new("get", "X")).await;
        assert_eq!(outcome.result.as_json(), Some(&json!("Get:80:X")));
        assert_eq!(outcome.status, 200);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_exact_handler() {
        let calls = Arc::default();
        let registry =
            Registry::register([counting("a", &calls), counting("b", &calls)]).unwrap();
        let dispatcher = Dispatcher::new(registry, Vec::new());

        dispatcher.dispatch(Envelope::new("b", json!({"k": [1, 2]}))).await;
        dispatcher.dispatch(Envelope::new("a", "payload")).await;

        assert_eq!(
            *calls.lock(),
            [
                ("b".to_string(), json!({"k": [1, 2]})),
                ("a".to_string(), json!("payload")),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_method_is_not_found_without_side_effects() {
        let calls = Arc::default();
        let registry = Registry::register([counting("get", &calls)]).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let global = Middleware::new(move |next, req| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            next.run(req)
        });
        let dispatcher = Dispatcher::new(registry, vec![global]);

        let outcome = dispatcher.dispatch(Envelope::new("unknown", "X")).await;

        assert_eq!(outcome.status, 404);
        assert_eq!(outcome.error, Some(DispatchError::not_found("unknown")));
        assert!(calls.lock().is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_method_fails_validation_before_lookup() {
        let calls = Arc::default();
        // Even a handler registered under "" could never be reached.
        let registry = Registry::register([counting("get", &calls)]).unwrap();
        let dispatcher = Dispatcher::new(registry, Vec::new());

        let outcome = dispatcher.dispatch(Envelope::new("", "X")).await;

        assert_eq!(outcome.status, 400);
        assert!(matches!(outcome.error, Some(DispatchError::Validation(_))));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_globals_and_locals_order_through_dispatch() {
        let trace = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let mw = |pre: &'static str, post: &'static str| {
            let trace = Arc::clone(&trace);
            Middleware::new(move |next, req| {
                let trace = Arc::clone(&trace);
                async move {
                    trace.lock().push(pre);
                    let outcome = next.run(req).await;
                    trace.lock().push(post);
                    outcome
                }
            })
        };
        let trace_h = Arc::clone(&trace);
        let handler = HandlerDescriptor::new("h", move |_req| {
            let trace = Arc::clone(&trace_h);
            async move {
                trace.lock().push("H");
                Outcome::ok("done")
            }
        })
        .middleware(mw("C-pre", "C-post"));

        let dispatcher = Dispatcher::new(
            Registry::register([handler]).unwrap(),
            vec![mw("A-pre", "A-post"), mw("B-pre", "B-post")],
        );
        dispatcher.dispatch(Envelope::new("h", Value::Null)).await;

        assert_eq!(
            *trace.lock(),
            ["A-pre", "B-pre", "C-pre", "H", "C-post", "B-post", "A-post"]
        );
    }

    #[tokio::test]
    async fn test_metadata_and_query_reach_handler() {
        let handler = HandlerDescriptor::new("echo", |req: Request| async move {
            Outcome::ok(json!({"meta": req.metadata, "query": req.query}))
        });
        let dispatcher = Dispatcher::new(Registry::register([handler]).unwrap(), Vec::new());

        let envelope = Envelope::new("echo", Value::Null)
            .with_metadata("ip", "10.0.0.1")
            .with_query(json!({"page": ["2"]}));
        let outcome = dispatcher.dispatch(envelope).await;

        assert_eq!(
            outcome.result.as_json(),
            Some(&json!({"meta": {"ip": "10.0.0.1"}, "query": {"page": ["2"]}}))
        );
    }

    #[tokio::test]
    async fn test_attachment_outcome_passes_through() {
        let handler = HandlerDescriptor::new("download", |_req| async {
            Outcome::attachment(vec![0x01, 0x02], "report.bin")
        });
        let dispatcher = Dispatcher::new(Registry::register([handler]).unwrap(), Vec::new());

        let outcome = dispatcher.dispatch(Envelope::new("download", Value::Null)).await;

        assert_eq!(outcome.status, STATUS_ATTACHMENT);
        assert_eq!(outcome.attachment_filename().as_deref(), Some("report.bin"));
    }

    #[tokio::test]
    async fn test_repeated_dispatch_is_idempotent() {
        let dispatcher = storage_dispatcher();
        let first = dispatcher.dispatch(Envelope::new("get", "X")).await;
        let second = dispatcher.dispatch(Envelope::new("get", "X")).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_dispatch_blocking_runtime() {
        let dispatcher = storage_dispatcher();
        let outcome = tokio_test::block_on(dispatcher.dispatch(Envelope::new("get", "Y")));
        assert_eq!(outcome, Outcome::ok("Get:80:Y"));
    }
}
