//! Storage handlers and middlewares.

use std::sync::Arc;

use switchboard::prelude::*;
use tracing::info;

/// Key of the prefix read from configuration.
const PREFIX_KEY: &str = "test";

pub fn handlers(ctx: Arc<ServiceContext>) -> Vec<HandlerDescriptor> {
    vec![
        storage_handler("get", "Get", "Get value from the storage", Arc::clone(&ctx)),
        storage_handler(
            "post",
            "Post",
            "Post value to the storage with specified key",
            ctx,
        ),
        HandlerDescriptor::new("export", |req: Request| async move {
            let body = serde_json::to_vec_pretty(&req.data).unwrap_or_default();
            Outcome::attachment(body, "export.json")
        })
        .description("Download the request data as a file"),
    ]
}

fn storage_handler(
    method: &'static str,
    label: &'static str,
    description: &'static str,
    ctx: Arc<ServiceContext>,
) -> HandlerDescriptor {
    HandlerDescriptor::new(method, move |req: Request| {
        let prefix = ctx.config_str(PREFIX_KEY, "80");
        async move {
            match req.data.as_str() {
                Some(value) => Outcome::ok(format!("{label}:{prefix}:{value}")),
                None => Outcome::handler_error(400, "data must be a string"),
            }
        }
    })
    .description(description)
}

fn announce(name: &'static str) -> Middleware {
    Middleware::new(move |next: Next, req: Request| async move {
        info!("{name}: Request received");
        let outcome = next.run(req).await;
        info!("{name}: Request processed");
        outcome
    })
}

pub fn middlewares() -> Vec<Middleware> {
    vec![logging_middleware("loggingMiddleware"), announce("secondMiddleware")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatcher(settings: serde_json::Value) -> Dispatcher {
        let ctx = Arc::new(ServiceContext::new(Settings::from(settings)));
        let registry = Registry::register(handlers(ctx)).unwrap();
        Dispatcher::new(registry, middlewares())
    }

    #[tokio::test]
    async fn test_get_with_default_prefix() {
        let outcome = dispatcher(json!({}))
            .dispatch(Envelope::new("get", "X"))
            .await;
        assert_eq!(outcome, Outcome::ok("Get:80:X"));
    }

    #[tokio::test]
    async fn test_post_with_configured_prefix() {
        let outcome = dispatcher(json!({"test": "81"}))
            .dispatch(Envelope::new("post", "key"))
            .await;
        assert_eq!(outcome, Outcome::ok("Post:81:key"));
    }

    #[test]
    fn test_non_string_data() {
        let outcome =
            tokio_test::block_on(dispatcher(json!({})).dispatch(Envelope::new("get", 5)));
        assert_eq!(outcome.status, 400);
    }

    #[tokio::test]
    async fn test_export_is_attachment() {
        let outcome = dispatcher(json!({}))
            .dispatch(Envelope::new("export", json!({"a": 1})))
            .await;
        assert!(outcome.is_attachment());
        assert_eq!(outcome.attachment_filename().as_deref(), Some("export.json"));
    }
}
