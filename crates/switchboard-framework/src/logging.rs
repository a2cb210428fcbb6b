//! Request logging middleware.

use std::time::Instant;

use switchboard_core::{Middleware, Next, Outcome, Request};
use tracing::info;

/// Returns a middleware that logs each request around the rest of the chain.
///
/// `label` is attached to both log lines so several logging middlewares in one
/// chain can be told apart.
pub fn logging_middleware(label: impl Into<String>) -> Middleware {
    let label = label.into();
    Middleware::new(move |next: Next, request: Request| {
        let label = label.clone();
        async move {
            let ip = request
                .meta("ip")
                .and_then(|ip| ip.as_str())
                .unwrap_or_default()
                .to_string();
            info!(middleware = %label, ip = %ip, "Request received");

            let started = Instant::now();
            let outcome: Outcome = next.run(request).await;

            info!(
                middleware = %label,
                status = outcome.status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Request processed"
            );
            outcome
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchboard_core::{Pipeline, compose};

    #[tokio::test]
    async fn test_logging_middleware_is_transparent() {
        let handler = Pipeline::new(|req: Request| async move {
            Outcome::with_status(req.data, 201)
        });
        let chain = compose(&[logging_middleware("outer")], &[logging_middleware("inner")], handler);

        let outcome = chain.call(Request::new(json!({"key": "value"}))).await;

        assert_eq!(outcome, Outcome::with_status(json!({"key": "value"}), 201));
    }

    #[tokio::test]
    async fn test_logging_middleware_keeps_failures() {
        let handler = Pipeline::new(|_req| async { Outcome::handler_error(500, "boom") });
        let chain = compose(&[logging_middleware("log")], &[], handler);

        let outcome = chain.call(Request::default()).await;

        assert_eq!(outcome, Outcome::handler_error(500, "boom"));
    }
}
