//! Token authentication middleware.
//!
//! [`auth_middleware`] reads the caller's token from `metadata.token`, wraps
//! it together with the request body into an [`AuthCheck`], and hands that to
//! an [`AuthVerifier`]. A refusal becomes a `401` outcome whose error reads
//! `unauthorized:<reason>`; acceptance forwards the untouched request.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use switchboard_core::{DispatchError, Middleware, Next, Outcome, Request};
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "http-client")]
mod http;

#[cfg(feature = "http-client")]
pub use http::HttpAuthVerifier;

/// Status returned for every refused request.
const UNAUTHORIZED: u16 = 401;

// =============================================================================
// Errors
// =============================================================================

/// Reasons an auth check can fail.
///
/// The `Display` text follows `unauthorized:` in the outcome's error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The verifier has no service URL configured.
    #[error("authServiceURL")]
    MissingServiceUrl,

    /// The request metadata carries no token.
    #[error("empty bodyMetadata token")]
    MissingToken,

    /// The auth service could not be reached.
    #[error("sending request -> {0}")]
    Request(String),

    /// The auth service response body could not be read.
    #[error("reading body -> {0}")]
    Body(String),

    /// The auth service response was not a JSON object.
    #[error("Unmarshal -> {0}")]
    Decode(String),

    /// The auth service answered, but not with `"result": "Ok"`.
    #[error("Result -> {0}")]
    Rejected(String),

    /// Any other verifier-specific reason.
    #[error("{0}")]
    Other(String),
}

/// Result type for auth checks.
pub type AuthResult<T = ()> = Result<T, AuthError>;

// =============================================================================
// Check payload
// =============================================================================

/// The request sent to an auth service.
///
/// ```json
/// {"method":"check","data":{"microservice":"storage","method":"get","metadata":null,"data":{"token":"..."}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCheck {
    /// Always `"check"`.
    pub method: String,
    /// What is being checked.
    pub data: AuthCheckData,
}

/// Body of an [`AuthCheck`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCheckData {
    /// Name of the calling microservice.
    pub microservice: String,
    /// Method the caller wants to invoke.
    pub method: String,
    /// Reserved, always `null`.
    pub metadata: Value,
    /// The request body as an object, with the caller's `token` added.
    pub data: Map<String, Value>,
}

impl AuthCheck {
    /// Builds the check for `request`.
    ///
    /// Fails with [`AuthError::MissingToken`] when `metadata.token` is absent
    /// or `null`. A body that is not a JSON object contributes no fields.
    pub fn from_request(microservice: &str, method: &str, request: &Request) -> AuthResult<Self> {
        let token = match request.meta("token") {
            None | Some(Value::Null) => return Err(AuthError::MissingToken),
            Some(token) => token.clone(),
        };

        let mut data = match &request.data {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        data.insert("token".to_string(), token);

        Ok(Self {
            method: "check".to_string(),
            data: AuthCheckData {
                microservice: microservice.to_string(),
                method: method.to_string(),
                metadata: Value::Null,
                data,
            },
        })
    }
}

// =============================================================================
// Verifier
// =============================================================================

/// Decides whether an [`AuthCheck`] passes.
#[async_trait]
pub trait AuthVerifier: Send + Sync + 'static {
    /// Called before the token is inspected; a misconfigured verifier refuses
    /// every request.
    fn ready(&self) -> AuthResult {
        Ok(())
    }

    /// Verifies one check.
    async fn verify(&self, check: &AuthCheck) -> AuthResult;
}

#[async_trait]
impl<V: AuthVerifier + ?Sized> AuthVerifier for Arc<V> {
    fn ready(&self) -> AuthResult {
        (**self).ready()
    }

    async fn verify(&self, check: &AuthCheck) -> AuthResult {
        (**self).verify(check).await
    }
}

fn unauthorized(err: &AuthError) -> Outcome {
    Outcome::failure(UNAUTHORIZED, DispatchError::auth(format!("unauthorized:{err}")))
}

/// Returns a middleware that authenticates requests for `method` of
/// `microservice` against `verifier`.
pub fn auth_middleware(
    verifier: impl AuthVerifier,
    microservice: impl Into<String>,
    method: impl Into<String>,
) -> Middleware {
    let verifier: Arc<dyn AuthVerifier> = Arc::new(verifier);
    let microservice = microservice.into();
    let method = method.into();

    Middleware::new(move |next: Next, request: Request| {
        let verifier = Arc::clone(&verifier);
        let microservice = microservice.clone();
        let method = method.clone();
        async move {
            if let Err(err) = verifier.ready() {
                warn!(method = %method, error = %err, "Auth verifier is not configured");
                return unauthorized(&err);
            }

            let check = match AuthCheck::from_request(&microservice, &method, &request) {
                Ok(check) => check,
                Err(err) => {
                    debug!(method = %method, error = %err, "Request carries no token");
                    return unauthorized(&err);
                }
            };

            if let Err(err) = verifier.verify(&check).await {
                warn!(method = %method, error = %err, "Auth check refused request");
                return unauthorized(&err);
            }

            next.run(request).await
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use switchboard_core::{Pipeline, compose};

    #[derive(Default)]
    struct RecordingVerifier {
        accept: bool,
        seen: Mutex<Vec<AuthCheck>>,
    }

    #[async_trait]
    impl AuthVerifier for RecordingVerifier {
        async fn verify(&self, check: &AuthCheck) -> AuthResult {
            self.seen.lock().push(check.clone());
            if self.accept {
                Ok(())
            } else {
                Err(AuthError::Rejected(r#"{"result":"No"}"#.to_string()))
            }
        }
    }

    struct Unconfigured;

    #[async_trait]
    impl AuthVerifier for Unconfigured {
        fn ready(&self) -> AuthResult {
            Err(AuthError::MissingServiceUrl)
        }

        async fn verify(&self, _check: &AuthCheck) -> AuthResult {
            Ok(())
        }
    }

    fn echo() -> Pipeline {
        Pipeline::new(|req: Request| async move { Outcome::ok(req.data) })
    }

    fn request_with_token(data: Value) -> Request {
        let mut request = Request::new(data);
        request.metadata.insert("token".into(), json!("secret"));
        request
    }

    #[test]
    fn test_check_merges_token_into_object_body() {
        let request = request_with_token(json!({"key": "a"}));
        let check = AuthCheck::from_request("storage", "get", &request).unwrap();

        assert_eq!(
            serde_json::to_value(&check).unwrap(),
            json!({
                "method": "check",
                "data": {
                    "microservice": "storage",
                    "method": "get",
                    "metadata": null,
                    "data": {"key": "a", "token": "secret"}
                }
            })
        );
    }

    #[test]
    fn test_check_with_scalar_body_only_carries_token() {
        let check = AuthCheck::from_request("storage", "get", &request_with_token(json!("X")))
            .unwrap();
        assert_eq!(Value::Object(check.data.data), json!({"token": "secret"}));
    }

    #[test]
    fn test_check_requires_token() {
        let mut request = Request::new("X");
        assert_eq!(
            AuthCheck::from_request("s", "m", &request),
            Err(AuthError::MissingToken)
        );
        request.metadata.insert("token".into(), Value::Null);
        assert_eq!(
            AuthCheck::from_request("s", "m", &request),
            Err(AuthError::MissingToken)
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let verifier = Arc::new(RecordingVerifier {
            accept: true,
            ..Default::default()
        });
        let chain = compose(&[], &[auth_middleware(Arc::clone(&verifier), "storage", "get")], echo());

        let outcome = chain.call(Request::new("X")).await;

        assert_eq!(outcome.status, 401);
        assert_eq!(
            outcome.error.map(|e| e.to_string()).as_deref(),
            Some("unauthorized:empty bodyMetadata token")
        );
        assert!(verifier.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_request_reaches_handler() {
        let verifier = Arc::new(RecordingVerifier {
            accept: true,
            ..Default::default()
        });
        let chain = compose(&[], &[auth_middleware(Arc::clone(&verifier), "storage", "get")], echo());

        let outcome = chain.call(request_with_token(json!({"key": "a"}))).await;

        assert_eq!(outcome, Outcome::ok(json!({"key": "a"})));
        let seen = verifier.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data.microservice, "storage");
        assert_eq!(seen[0].data.method, "get");
    }

    #[tokio::test]
    async fn test_rejected_request_is_unauthorized() {
        let verifier = RecordingVerifier::default();
        let chain = compose(&[], &[auth_middleware(verifier, "storage", "get")], echo());

        let outcome = chain.call(request_with_token(json!("X"))).await;

        assert_eq!(outcome.status, 401);
        assert_eq!(
            outcome.error,
            Some(DispatchError::auth(r#"unauthorized:Result -> {"result":"No"}"#))
        );
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_rejects_before_token_check() {
        let chain = compose(&[], &[auth_middleware(Unconfigured, "storage", "get")], echo());

        let outcome = chain.call(Request::new("X")).await;

        assert_eq!(
            outcome.error,
            Some(DispatchError::auth("unauthorized:authServiceURL"))
        );
    }
}
