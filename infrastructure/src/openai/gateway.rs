//! OpenAI-compatible LLM Gateway implementation

use super::session::OpenAiSession;
use async_trait::async_trait;
use combiner_application::{GatewayError, LlmGateway, LlmSession, SessionRequest};
use std::time::Duration;
use tracing::{debug, info};

/// LLM Gateway for any OpenAI-compatible `/chat/completions` endpoint
/// (Groq by default).
///
/// The credential is read on every call, so a missing key surfaces as a
/// failed model call rather than a startup error.
pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key_env: String,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(
        base_url: &str,
        api_key_env: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        info!("OpenAiGateway initialized for {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            api_key_env: api_key_env.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Caller-supplied key first, then the configured environment variable.
    fn resolve_api_key(&self, caller_key: Option<&str>) -> Result<String, GatewayError> {
        if let Some(key) = caller_key.filter(|k| !k.trim().is_empty()) {
            debug!("Using caller-supplied API key");
            return Ok(key.to_string());
        }
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(GatewayError::MissingCredential(format!(
                "set {} or pass api_key in the request",
                self.api_key_env
            ))),
        }
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        let api_key = self.resolve_api_key(request.api_key.as_deref())?;
        Ok(Box::new(OpenAiSession::new(
            self.client.clone(),
            self.endpoint.clone(),
            api_key,
            self.timeout,
            request,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combiner_domain::Model;

    const UNSET_ENV: &str = "LLM_COMBINER_TEST_KEY_THAT_IS_NEVER_SET";

    fn gateway() -> OpenAiGateway {
        OpenAiGateway::new("https://example.test/v1/", UNSET_ENV, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        assert_eq!(gateway().endpoint(), "https://example.test/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_at_call_time() {
        let result = gateway()
            .create_session(SessionRequest::new(Model::default()))
            .await;
        match result {
            Err(GatewayError::MissingCredential(msg)) => assert!(msg.contains(UNSET_ENV)),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected missing credential"),
        }
    }

    #[tokio::test]
    async fn test_caller_key_overrides_environment() {
        let request = SessionRequest::new(Model::default()).with_api_key(Some("sk-test".into()));
        let session = gateway().create_session(request).await.unwrap();
        assert_eq!(session.model(), &Model::default());
    }
}
