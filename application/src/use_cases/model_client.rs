//! Model Client
//!
//! Wraps an [`LlmGateway`] with the per-call time bound and turns every
//! failure into a [`ModelResult`] value instead of an error.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, SessionRequest, StreamHandle};
use combiner_domain::core::string::truncate;
use combiner_domain::{ModelResult, StreamEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct ModelClient<G: LlmGateway + ?Sized> {
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G: LlmGateway + ?Sized> Clone for ModelClient<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            timeout: self.timeout,
        }
    }
}

impl<G: LlmGateway + ?Sized> ModelClient<G> {
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one non-streaming call.
    ///
    /// Never fails: transport errors, bad statuses, malformed bodies and
    /// timeouts all come back as a failed [`ModelResult`].
    pub async fn complete(&self, request: SessionRequest, prompt: &str) -> ModelResult {
        let model = request.model.clone();
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.call(request, prompt)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::Timeout),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(text) => debug!(
                model = %model,
                elapsed_ms,
                chars = text.chars().count(),
                preview = %truncate(text, 80),
                "Model call succeeded"
            ),
            Err(e) => warn!(model = %model, elapsed_ms, error = %e, "Model call failed"),
        }

        ModelResult::from_outcome(model, outcome)
    }

    async fn call(&self, request: SessionRequest, prompt: &str) -> Result<String, GatewayError> {
        let session = self.gateway.create_session(request).await?;
        session.send(prompt).await
    }

    /// Open a streaming call; the wait until the stream is open is bounded.
    pub async fn open_stream(
        &self,
        request: SessionRequest,
        prompt: &str,
    ) -> Result<StreamHandle, GatewayError> {
        let model = request.model.clone();
        let open = async {
            let session = self.gateway.create_session(request).await?;
            session.send_streaming(prompt).await
        };
        match tokio::time::timeout(self.timeout, open).await {
            Ok(result) => result,
            Err(_) => {
                warn!(model = %model, "Timed out opening stream");
                Err(GatewayError::Timeout)
            }
        }
    }

    /// Next event of an open stream, failing if none arrives within the timeout.
    ///
    /// `Ok(None)` means the stream ended without a terminal event.
    pub async fn next_event(
        &self,
        handle: &mut StreamHandle,
    ) -> Result<Option<StreamEvent>, GatewayError> {
        tokio::time::timeout(self.timeout, handle.receiver.recv())
            .await
            .map_err(|_| GatewayError::Timeout)
    }
}
