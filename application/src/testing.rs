//! Scripted test doubles shared by the use case tests.

use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession, SessionRequest, StreamHandle};
use async_trait::async_trait;
use combiner_domain::{
    ConversationMemory, ConversationRepository, ConversationTurn, DomainError, Model, SessionId,
    StreamEvent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// What a scripted model does when called
#[derive(Debug, Clone)]
pub enum Reply {
    Chunks(Vec<String>),
    Fail(GatewayError),
    /// Streams the chunks, then breaks with an error
    FailAfter(Vec<String>, String),
    Delay(Duration, Box<Reply>),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Chunks(vec![text.to_string()])
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        Reply::Chunks(chunks.iter().map(|c| c.to_string()).collect())
    }

    pub fn fail(error: GatewayError) -> Self {
        Reply::Fail(error)
    }

    pub fn delayed(seconds: u64, reply: Reply) -> Self {
        Reply::Delay(Duration::from_secs(seconds), Box::new(reply))
    }

    async fn resolve(self) -> Reply {
        let mut reply = self;
        while let Reply::Delay(delay, inner) = reply {
            tokio::time::sleep(delay).await;
            reply = *inner;
        }
        reply
    }
}

/// One call seen by the gateway
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system_prompt: Option<String>,
    pub history_len: usize,
    pub prompt: String,
    pub streaming: bool,
}

/// Replies per model; the last scripted reply repeats once the rest are used
#[derive(Default)]
pub struct ScriptedGateway {
    replies: HashMap<String, Vec<Reply>>,
    served: Mutex<HashMap<String, usize>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, model: &str, reply: Reply) -> Self {
        self.replies(model, vec![reply])
    }

    /// One reply per successive call to `model`
    pub fn replies(mut self, model: &str, replies: Vec<Reply>) -> Self {
        self.replies.insert(model.to_string(), replies);
        self
    }

    fn next_reply(&self, model: &str) -> Option<Reply> {
        let replies = self.replies.get(model)?;
        let mut served = self.served.lock().unwrap();
        let count = served.entry(model.to_string()).or_default();
        let reply = replies.get(*count).or_else(|| replies.last()).cloned();
        *count += 1;
        reply
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, model: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.model == model)
            .collect()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn create_session(
        &self,
        request: SessionRequest,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        let reply = self
            .next_reply(request.model.as_str())
            .unwrap_or_else(|| {
                Reply::Fail(GatewayError::ModelNotAvailable(
                    request.model.as_str().to_string(),
                ))
            });
        Ok(Box::new(ScriptedSession {
            request,
            reply,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct ScriptedSession {
    request: SessionRequest,
    reply: Reply,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedSession {
    fn record(&self, prompt: &str, streaming: bool) {
        self.calls.lock().unwrap().push(RecordedCall {
            model: self.request.model.as_str().to_string(),
            system_prompt: self.request.system_prompt.clone(),
            history_len: self.request.history.len(),
            prompt: prompt.to_string(),
            streaming,
        });
    }
}

#[async_trait]
impl LlmSession for ScriptedSession {
    fn model(&self) -> &Model {
        &self.request.model
    }

    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        self.record(prompt, false);
        match self.reply.clone().resolve().await {
            Reply::Chunks(chunks) => Ok(chunks.concat()),
            Reply::Fail(e) => Err(e),
            Reply::FailAfter(_, e) => Err(GatewayError::RequestFailed(e)),
            Reply::Delay(..) => unreachable!(),
        }
    }

    async fn send_streaming(&self, prompt: &str) -> Result<StreamHandle, GatewayError> {
        self.record(prompt, true);
        let (chunks, error) = match self.reply.clone().resolve().await {
            Reply::Chunks(chunks) => (chunks, None),
            Reply::Fail(e) => return Err(e),
            Reply::FailAfter(chunks, e) => (chunks, Some(e)),
            Reply::Delay(..) => unreachable!(),
        };
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let full = chunks.concat();
            for chunk in chunks {
                if tx.send(StreamEvent::Delta(chunk)).await.is_err() {
                    return;
                }
            }
            let terminal = match error {
                Some(e) => StreamEvent::Error(e),
                None => StreamEvent::Completed(full),
            };
            let _ = tx.send(terminal).await;
        });
        Ok(StreamHandle::new(rx))
    }
}

/// Conversation memory kept in a plain map
#[derive(Default)]
pub struct TestMemory {
    sessions: Mutex<HashMap<SessionId, ConversationMemory>>,
}

impl TestMemory {
    pub fn turns(&self, session: &str) -> Vec<ConversationTurn> {
        self.sessions
            .lock()
            .unwrap()
            .get(&SessionId::new(session))
            .map(|m| m.turns().to_vec())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationRepository for TestMemory {
    async fn load(&self, session: &SessionId) -> Result<Vec<ConversationTurn>, DomainError> {
        Ok(self.turns(session.as_str()))
    }

    async fn append(&self, session: &SessionId, turn: ConversationTurn) -> Result<(), DomainError> {
        self.sessions
            .lock()
            .unwrap()
            .entry(session.clone())
            .or_default()
            .append(turn);
        Ok(())
    }

    async fn clear(&self, session: &SessionId) -> Result<(), DomainError> {
        self.sessions.lock().unwrap().remove(session);
        Ok(())
    }
}
