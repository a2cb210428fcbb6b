//! Auth verifier backed by a remote auth service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::{Map, Value};
use tracing::debug;

use super::{AuthCheck, AuthError, AuthResult, AuthVerifier};

/// POSTs each [`AuthCheck`] as JSON to an auth service.
///
/// The check passes only when the service answers with a JSON object whose
/// `result` field is the string `"Ok"`.
#[derive(Debug, Clone)]
pub struct HttpAuthVerifier {
    client: Client,
    url: String,
}

impl HttpAuthVerifier {
    /// Creates a verifier for `url` with a 30 second timeout.
    pub fn new(url: impl Into<String>) -> AuthResult<Self> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    /// Creates a verifier with a custom request timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> AuthResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Other(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The auth service URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AuthVerifier for HttpAuthVerifier {
    fn ready(&self) -> AuthResult {
        if self.url.is_empty() {
            return Err(AuthError::MissingServiceUrl);
        }
        Ok(())
    }

    async fn verify(&self, check: &AuthCheck) -> AuthResult {
        debug!(url = %self.url, method = %check.data.method, "Sending auth check");

        let response = self
            .client
            .post(&self.url)
            .json(check)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Body(e.to_string()))?;

        let answer: Map<String, Value> =
            serde_json::from_str(&body).map_err(|e| AuthError::Decode(e.to_string()))?;

        match answer.get("result") {
            Some(Value::String(result)) if result == "Ok" => Ok(()),
            _ => Err(AuthError::Rejected(body)),
        }
    }
}
