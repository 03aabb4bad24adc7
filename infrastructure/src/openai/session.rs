//! OpenAI-compatible session: one chat completion per call

use super::error::{HttpClientError, Result};
use super::protocol::{ChatChunk, ChatRequest, ChatResponse, WireMessage};
use super::sse::{SseLine, SseLineBuffer};
use async_trait::async_trait;
use combiner_application::{GatewayError, LlmSession, SessionRequest, StreamHandle};
use combiner_domain::{Message, Model, StreamEvent};
use futures::{Stream, StreamExt};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const STREAM_BUFFER: usize = 64;

pub struct OpenAiSession {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    request: SessionRequest,
}

impl OpenAiSession {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        timeout: Duration,
        request: SessionRequest,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            timeout,
            request,
        }
    }

    fn body<'a>(&'a self, messages: &'a [Message], stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: self.request.model.as_str(),
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: self.request.options.temperature,
            max_tokens: self.request.options.max_tokens,
            stream,
        }
    }

    /// POST the body and check the status.
    ///
    /// Only non-streaming calls get a whole-request timeout; streamed replies
    /// are bounded per chunk by the caller.
    async fn post(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body);
        if !body.stream {
            builder = builder.timeout(self.timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        info!(
            method = "POST",
            target = %self.endpoint,
            status = status.as_u16(),
            model = %self.request.model,
            stream = body.stream,
            "Completion request"
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(HttpClientError::UnknownModel(
                self.request.model.to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = self.request.messages(prompt);
        let response = self.post(&self.body(&messages, false)).await?;
        let bytes = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)?;
        parsed
            .into_content()
            .ok_or(HttpClientError::MissingField("choices[0].message.content"))
    }
}

#[async_trait]
impl LlmSession for OpenAiSession {
    fn model(&self) -> &Model {
        &self.request.model
    }

    async fn send(&self, prompt: &str) -> std::result::Result<String, GatewayError> {
        Ok(self.complete(prompt).await?)
    }

    async fn send_streaming(
        &self,
        prompt: &str,
    ) -> std::result::Result<StreamHandle, GatewayError> {
        let messages = self.request.messages(prompt);
        let response = self.post(&self.body(&messages, true)).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let model = self.request.model.clone();
        tokio::spawn(pump(response.bytes_stream(), tx, model));
        Ok(StreamHandle::new(rx))
    }
}

/// Turn an SSE byte stream into [`StreamEvent`]s.
///
/// Ends with `Completed` carrying the concatenated text, or `Error` if the
/// transport breaks. Stops early if the receiver goes away.
async fn pump<S, B, E>(stream: S, tx: mpsc::Sender<StreamEvent>, model: Model)
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);
    let mut buffer = SseLineBuffer::new();
    let mut full = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(model = %model, error = %e, "Stream transport error");
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                return;
            }
        };
        for line in buffer.push(chunk.as_ref()) {
            if forward(line, &tx, &mut full, &model).await.is_break() {
                return;
            }
        }
    }

    if let Some(line) = buffer.finish()
        && forward(line, &tx, &mut full, &model).await.is_break()
    {
        return;
    }

    // Closed without [DONE]; what arrived is the answer
    let _ = tx.send(StreamEvent::Completed(full)).await;
}

async fn forward(
    line: SseLine,
    tx: &mpsc::Sender<StreamEvent>,
    full: &mut String,
    model: &Model,
) -> ControlFlow<()> {
    match line {
        SseLine::Done => {
            let _ = tx.send(StreamEvent::Completed(std::mem::take(full))).await;
            ControlFlow::Break(())
        }
        SseLine::Data(data) => match serde_json::from_str::<ChatChunk>(&data) {
            Ok(chunk) => match chunk.into_delta() {
                Some(delta) if !delta.is_empty() => {
                    full.push_str(&delta);
                    if tx.send(StreamEvent::Delta(delta)).await.is_err() {
                        debug!(model = %model, "Stream receiver dropped");
                        return ControlFlow::Break(());
                    }
                    ControlFlow::Continue(())
                }
                _ => ControlFlow::Continue(()),
            },
            Err(e) => {
                warn!(model = %model, error = %e, "Skipping undecodable stream chunk");
                ControlFlow::Continue(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(chunks: Vec<std::result::Result<&'static str, String>>) -> Vec<StreamEvent> {
        let (tx, mut rx) = mpsc::channel(32);
        let stream = futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| c.map(|s| s.as_bytes().to_vec())),
        );
        pump(stream, tx, Model::default()).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_pump_emits_deltas_then_completed() {
        let events = run(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choices\":[{\"delta\":"),
            Ok("{\"content\":\"lo\"}}]}\n\n"),
            Ok("data: [DONE]\n\n"),
        ])
        .await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".into()),
                StreamEvent::Delta("lo".into()),
                StreamEvent::Completed("Hello".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_pump_reports_transport_error() {
        let events = run(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"),
            Err("connection reset".to_string()),
        ])
        .await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("a".into()),
                StreamEvent::Error("connection reset".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_pump_completes_without_done_marker() {
        let events = run(vec![Ok(
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}",
        )])
        .await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("x".into()),
                StreamEvent::Completed("x".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_pump_skips_garbage_lines() {
        let events = run(vec![Ok("data: not-json\n\ndata: [DONE]\n")]).await;
        assert_eq!(events, vec![StreamEvent::Completed(String::new())]);
    }
}
