//! Middleware chain composition.
//!
//! Given global middlewares `[g0..gn]` and a handler's local middlewares
//! `[l0..lm]`, [`compose`] returns one pipeline that executes
//!
//! ```text
//! g0 → g1 → … → gn → l0 → … → lm → handler
//! ```
//!
//! and unwinds in reverse. The chain is built from the inside out: the handler
//! is wrapped by `lm` first and by `g0` last, so `g0` is outermost.

use super::handler::{Middleware, Pipeline};

/// Composes globals, locals, and a terminal handler into a single pipeline.
pub fn compose(globals: &[Middleware], locals: &[Middleware], handler: Pipeline) -> Pipeline {
    locals
        .iter()
        .rev()
        .chain(globals.iter().rev())
        .fold(handler, |inner, middleware| middleware.wrap(inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Outcome, Request};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn recording(name: &'static str, trace: &Trace) -> Middleware {
        let trace = Arc::clone(trace);
        Middleware::new(move |next, req| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().push(format!("{name}-pre"));
                let outcome = next.run(req).await;
                trace.lock().push(format!("{name}-post"));
                outcome
            }
        })
    }

    fn blocking(name: &'static str, trace: &Trace) -> Middleware {
        let trace = Arc::clone(trace);
        Middleware::new(move |_next, _req| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().push(format!("{name}-block"));
                Outcome::handler_error(403, "blocked")
            }
        })
    }

    fn handler(trace: &Trace) -> Pipeline {
        let trace = Arc::clone(trace);
        Pipeline::new(move |req: Request| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().push("H".to_string());
                Outcome::ok(req.data)
            }
        })
    }

    #[tokio::test]
    async fn test_globals_then_locals_then_handler() {
        let trace: Trace = Arc::default();
        let chain = compose(
            &[recording("A", &trace), recording("B", &trace)],
            &[recording("C", &trace)],
            handler(&trace),
        );

        let outcome = chain.call(Request::new("X")).await;

        assert_eq!(outcome, Outcome::ok("X"));
        assert_eq!(
            *trace.lock(),
            ["A-pre", "B-pre", "C-pre", "H", "C-post", "B-post", "A-post"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_inner_stages() {
        let trace: Trace = Arc::default();
        let chain = compose(
            &[recording("A", &trace), blocking("B", &trace)],
            &[recording("C", &trace)],
            handler(&trace),
        );

        let outcome = chain.call(Request::new("X")).await;

        assert_eq!(outcome, Outcome::handler_error(403, "blocked"));
        assert_eq!(*trace.lock(), ["A-pre", "B-block", "A-post"]);
    }

    #[tokio::test]
    async fn test_no_middlewares_is_bare_handler() {
        let trace: Trace = Arc::default();
        let chain = compose(&[], &[], handler(&trace));
        assert_eq!(chain.call(Request::new(json!(1))).await, Outcome::ok(1));
        assert_eq!(*trace.lock(), ["H"]);
    }

    #[tokio::test]
    async fn test_multiple_locals_keep_declared_order() {
        let trace: Trace = Arc::default();
        let chain = compose(
            &[],
            &[recording("L0", &trace), recording("L1", &trace), recording("L2", &trace)],
            handler(&trace),
        );
        chain.call(Request::default()).await;
        assert_eq!(
            *trace.lock(),
            ["L0-pre", "L1-pre", "L2-pre", "H", "L2-post", "L1-post", "L0-post"]
        );
    }

    #[tokio::test]
    async fn test_each_stage_captures_its_inner_pipeline() {
        // Every wrap step must forward to the pipeline it was built around,
        // not whatever the builder holds at call time.
        let trace: Trace = Arc::default();
        let middlewares: Vec<Middleware> =
            ["M0", "M1", "M2"].iter().map(|&n| recording(n, &trace)).collect();

        let first = compose(&middlewares, &[], handler(&trace));
        let second = compose(&middlewares[..1], &[], handler(&trace));

        first.call(Request::default()).await;
        second.call(Request::default()).await;
        first.call(Request::default()).await;

        let expected_first = ["M0-pre", "M1-pre", "M2-pre", "H", "M2-post", "M1-post", "M0-post"];
        let expected_second = ["M0-pre", "H", "M0-post"];
        let got = trace.lock().clone();
        assert_eq!(got[..7], expected_first);
        assert_eq!(got[7..10], expected_second);
        assert_eq!(got[10..], expected_first);
    }

    #[tokio::test]
    async fn test_middleware_can_rewrite_request_and_outcome() {
        let rewrite = Middleware::new(|next, mut req: Request| async move {
            req.metadata.insert("seen".into(), json!(true));
            let mut outcome = next.run(req).await;
            outcome.status = 201;
            outcome
        });
        let echo_meta = Pipeline::new(|req: Request| async move {
            Outcome::ok(serde_json::Value::Object(req.metadata))
        });

        let outcome = compose(&[rewrite], &[], echo_meta).call(Request::default()).await;

        assert_eq!(outcome, Outcome::with_status(json!({"seen": true}), 201));
    }
}
