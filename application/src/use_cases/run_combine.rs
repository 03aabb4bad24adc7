//! Run Combine use case
//!
//! The chat pipeline: fan a query out to the target models, normalize their
//! answers, combine them according to the policy, emit the result to the
//! caller and persist the finished turn.

use crate::config::CombineParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, SessionRequest};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::use_cases::model_client::ModelClient;
use combiner_domain::memory::entities::turns_to_messages;
use combiner_domain::prompt::{DEFAULT_ASSISTANT_SYSTEM, DIRECT_ANSWER_SYSTEM};
use combiner_domain::{
    CombineMode, CombinePolicy, CombinedAnswer, ConversationRepository, ConversationTurn,
    DomainError, Message, Model, ModelResult, NO_VALID_RESPONSES, Phase, Question, SessionId,
    StreamEvent, normalize, pick_best, valid_results,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Capacity of the channel returned by [`RunCombineUseCase::spawn_streaming`]
const EVENT_BUFFER: usize = 64;

/// Errors that abort a combine run before its turn is persisted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunCombineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conversation memory error: {0}")]
    Memory(String),
}

impl RunCombineError {
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, RunCombineError::InvalidRequest(_))
    }
}

impl From<DomainError> for RunCombineError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Memory(msg) => RunCombineError::Memory(msg),
            other => RunCombineError::InvalidRequest(other.to_string()),
        }
    }
}

/// Input for the RunCombine use case
#[derive(Debug, Clone)]
pub struct CombineInput {
    pub question: Question,
    /// Target models in caller order; empty falls back to the default model
    pub models: Vec<Model>,
    pub session: SessionId,
    /// Overrides the configured policy for this request
    pub policy: Option<CombinePolicy>,
    /// Overrides the configured credential for this request
    pub api_key: Option<String>,
}

impl CombineInput {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            models: Vec::new(),
            session: SessionId::default(),
            policy: None,
            api_key: None,
        }
    }

    /// Validate raw request fields.
    pub fn parse(
        query: &str,
        models: &[String],
        policy: Option<&str>,
    ) -> Result<Self, RunCombineError> {
        let question = Question::new(query)?;
        let models = Model::parse_list(models.iter().cloned())?;
        let policy = policy
            .filter(|p| !p.trim().is_empty())
            .map(str::parse::<CombinePolicy>)
            .transpose()?;
        Ok(Self::new(question)
            .with_models(models)
            .with_policy(policy))
    }

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn with_policy(mut self, policy: Option<CombinePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }
}

/// What the caller sees while a run is in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombineEvent {
    /// Sent once, before any answer text
    Started {
        mode: CombineMode,
        targets: Vec<Model>,
    },
    /// A piece of the combined answer, in order
    Fragment(String),
}

impl CombineEvent {
    /// Render the event as caller-facing text.
    pub fn render(&self) -> String {
        match self {
            CombineEvent::Started { mode, targets } => {
                let first = targets.first().map(Model::as_str).unwrap_or_default();
                mode.banner(first)
            }
            CombineEvent::Fragment(text) => text.clone(),
        }
    }
}

/// Output of a completed run
#[derive(Debug, Clone)]
pub struct CombineOutput {
    pub answer: CombinedAnswer,
    /// Models the query was actually sent to
    pub targets: Vec<Model>,
    /// Per-model results of the (last) fan-out round
    pub results: Vec<ModelResult>,
}

/// Forwards events to the caller until the caller goes away
struct Emitter {
    tx: Option<mpsc::Sender<CombineEvent>>,
}

impl Emitter {
    fn silent() -> Self {
        Self { tx: None }
    }

    fn new(tx: mpsc::Sender<CombineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    async fn send(&mut self, event: CombineEvent) {
        if let Some(tx) = &self.tx
            && tx.send(event).await.is_err()
        {
            debug!("Caller disconnected; continuing without emission");
            self.tx = None;
        }
    }

    async fn fragment(&mut self, text: &str) {
        if !text.is_empty() {
            self.send(CombineEvent::Fragment(text.to_string())).await;
        }
    }
}

/// Per-run values shared by every stage
struct Turn<'a> {
    question: &'a str,
    history: Vec<Message>,
    api_key: Option<String>,
}

/// Use case for answering a query with several models
pub struct RunCombineUseCase<G, R>
where
    G: LlmGateway + ?Sized + 'static,
    R: ConversationRepository + ?Sized + 'static,
{
    client: ModelClient<G>,
    memory: Arc<R>,
    params: CombineParams,
    logger: Arc<dyn ConversationLogger>,
}

impl<G, R> RunCombineUseCase<G, R>
where
    G: LlmGateway + ?Sized + 'static,
    R: ConversationRepository + ?Sized + 'static,
{
    pub fn new(gateway: Arc<G>, memory: Arc<R>, params: CombineParams) -> Self {
        Self {
            client: ModelClient::new(gateway, params.timeout),
            memory,
            params,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &CombineParams {
        &self.params
    }

    /// Forget every turn of a session
    pub async fn clear_session(&self, session: &SessionId) -> Result<(), RunCombineError> {
        self.memory.clear(session).await?;
        info!(session = %session, "Cleared conversation session");
        Ok(())
    }

    /// Models a request will be sent to, in caller order
    pub fn resolve_targets(&self, models: &[Model]) -> Vec<Model> {
        if models.is_empty() {
            vec![self.params.default_model.clone()]
        } else {
            models.to_vec()
        }
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: CombineInput) -> Result<CombineOutput, RunCombineError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: CombineInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<CombineOutput, RunCombineError> {
        self.run(input, &mut Emitter::silent(), progress).await
    }

    /// Execute the use case, emitting the answer on `events` as it is produced.
    ///
    /// If the receiver is dropped the run still completes and persists.
    pub async fn execute_streaming(
        &self,
        input: CombineInput,
        events: mpsc::Sender<CombineEvent>,
        progress: &dyn ProgressNotifier,
    ) -> Result<CombineOutput, RunCombineError> {
        self.run(input, &mut Emitter::new(events), progress).await
    }

    /// Run in a background task and hand back the event stream.
    ///
    /// The session snapshot is loaded before the task starts, so a memory
    /// failure is returned here instead of ending the stream early.
    pub async fn spawn_streaming(
        self: &Arc<Self>,
        input: CombineInput,
    ) -> Result<
        (
            mpsc::Receiver<CombineEvent>,
            JoinHandle<Result<CombineOutput, RunCombineError>>,
        ),
        RunCombineError,
    > {
        let history = self.snapshot(&input.session).await?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            this.run_with_history(input, history, &mut Emitter::new(tx), &NoProgress)
                .await
        });
        Ok((rx, handle))
    }

    /// Session history as chat messages, taken before any model call
    async fn snapshot(&self, session: &SessionId) -> Result<Vec<Message>, RunCombineError> {
        Ok(turns_to_messages(&self.memory.load(session).await?))
    }

    async fn run(
        &self,
        input: CombineInput,
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> Result<CombineOutput, RunCombineError> {
        let history = self.snapshot(&input.session).await?;
        self.run_with_history(input, history, emitter, progress)
            .await
    }

    async fn run_with_history(
        &self,
        input: CombineInput,
        history: Vec<Message>,
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> Result<CombineOutput, RunCombineError> {
        let policy = input.policy.unwrap_or(self.params.policy);
        let targets = self.resolve_targets(&input.models);
        let mode = policy.mode_for(targets.len());

        info!(
            session = %input.session,
            mode = %mode,
            models = targets.len(),
            "Starting combine run"
        );
        progress.on_run_start(mode, &targets);

        emitter
            .send(CombineEvent::Started {
                mode,
                targets: targets.clone(),
            })
            .await;

        let turn = Turn {
            question: input.question.content(),
            history,
            api_key: input.api_key.clone(),
        };

        let (answer, results) = match mode {
            CombineMode::Single => {
                // resolve_targets never returns an empty list
                self.run_single(&turn, &targets[0], emitter, progress).await
            }
            CombineMode::PickBest => self.run_pick_best(&turn, &targets, emitter, progress).await,
            CombineMode::Synthesize => {
                self.run_synthesize(&turn, &targets, emitter, progress)
                    .await
            }
            CombineMode::Layered => self.run_layered(&turn, &targets, emitter, progress).await,
        };

        self.persist(&input.session, turn.question, &targets, &answer, progress)
            .await?;

        info!(
            session = %input.session,
            mode = %answer.mode,
            chars = answer.text.chars().count(),
            "Combine run complete"
        );

        Ok(CombineOutput {
            answer,
            targets,
            results,
        })
    }

    // ==================== Stages ====================

    async fn run_single(
        &self,
        turn: &Turn<'_>,
        model: &Model,
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> (CombinedAnswer, Vec<ModelResult>) {
        progress.on_phase_start(&Phase::StreamSynthesis, 1);

        let request = SessionRequest::new(model.clone())
            .with_system_prompt(DEFAULT_ASSISTANT_SYSTEM)
            .with_history(turn.history.clone())
            .with_options(self.params.single_options)
            .with_api_key(turn.api_key.clone());

        let (text, result) = match self.relay(request, turn.question, emitter).await {
            Ok(text) if !normalize(&text).is_empty() => {
                (text.clone(), ModelResult::success(model.clone(), text))
            }
            Ok(_) => {
                warn!(model = %model, "Single model returned an empty answer");
                emitter.fragment(NO_VALID_RESPONSES).await;
                (
                    NO_VALID_RESPONSES.to_string(),
                    ModelResult::success(model.clone(), ""),
                )
            }
            Err(e) => {
                warn!(model = %model, error = %e, "Single model call failed");
                emitter.fragment(NO_VALID_RESPONSES).await;
                (
                    NO_VALID_RESPONSES.to_string(),
                    ModelResult::failure(model.clone(), e),
                )
            }
        };

        progress.on_task_complete(&Phase::StreamSynthesis, model, result.is_valid());
        progress.on_phase_complete(&Phase::StreamSynthesis);

        (CombinedAnswer::new(text, CombineMode::Single), vec![result])
    }

    async fn run_pick_best(
        &self,
        turn: &Turn<'_>,
        targets: &[Model],
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> (CombinedAnswer, Vec<ModelResult>) {
        let requests = targets
            .iter()
            .map(|m| self.participant_request(turn, m, DIRECT_ANSWER_SYSTEM, true))
            .collect();
        let results = self.fan_out(requests, turn.question, progress).await;
        self.normalize_results(&results, progress);

        progress.on_phase_start(&Phase::Aggregate, 1);
        let answer = pick_best(&results, self.params.max_answer_chars);
        debug!(
            source = ?answer.source_model.as_ref().map(Model::as_str),
            "Picked best answer"
        );
        progress.on_phase_complete(&Phase::Aggregate);

        progress.on_phase_start(&Phase::EmitSingle, 1);
        emitter.fragment(&answer.text).await;
        progress.on_phase_complete(&Phase::EmitSingle);

        (answer, results)
    }

    async fn run_synthesize(
        &self,
        turn: &Turn<'_>,
        targets: &[Model],
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> (CombinedAnswer, Vec<ModelResult>) {
        let requests = targets
            .iter()
            .map(|m| self.participant_request(turn, m, DIRECT_ANSWER_SYSTEM, false))
            .collect();
        let results = self.fan_out(requests, turn.question, progress).await;
        let valid = self.normalize_results(&results, progress);

        progress.on_phase_start(&Phase::Aggregate, 1);
        if valid.is_empty() {
            warn!("No valid responses; skipping synthesis");
            progress.on_phase_complete(&Phase::Aggregate);
            emitter.fragment(NO_VALID_RESPONSES).await;
            return (
                CombinedAnswer::new(NO_VALID_RESPONSES, CombineMode::Synthesize),
                results,
            );
        }
        let system = self.params.prompts.synthesizer_system(&valid);
        progress.on_phase_complete(&Phase::Aggregate);

        let answer = self
            .stream_synthesis(turn, system, &results, CombineMode::Synthesize, emitter, progress)
            .await;
        (answer, results)
    }

    async fn run_layered(
        &self,
        turn: &Turn<'_>,
        targets: &[Model],
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> (CombinedAnswer, Vec<ModelResult>) {
        let rounds = self.params.effective_layer_cycles();
        let mut helper: Option<String> = None;
        let mut results = Vec::new();
        // Last round with at least one valid answer; the pick-best fallback set
        let mut fallback = Vec::new();

        for round in 1..=rounds {
            progress.on_layer_start(round, rounds);
            let system = match &helper {
                Some(context) => self.params.prompts.layer_system(context),
                None => DIRECT_ANSWER_SYSTEM.to_string(),
            };
            let requests = targets
                .iter()
                .map(|m| self.participant_request(turn, m, &system, false))
                .collect();
            results = self.fan_out(requests, turn.question, progress).await;

            let valid = self.normalize_results(&results, progress);
            if valid.is_empty() {
                warn!(round, "Layer produced no valid responses");
                continue;
            }
            let texts: Vec<String> = valid.into_iter().map(|(_, text)| text).collect();
            helper = Some(self.params.prompts.reference_context(&texts));
            fallback = results.clone();
        }

        progress.on_phase_start(&Phase::Aggregate, 1);
        let Some(helper) = helper else {
            warn!("No layer produced a valid response; skipping synthesis");
            progress.on_phase_complete(&Phase::Aggregate);
            emitter.fragment(NO_VALID_RESPONSES).await;
            return (
                CombinedAnswer::new(NO_VALID_RESPONSES, CombineMode::Layered),
                results,
            );
        };
        let system = self.params.prompts.main_system(&helper);
        progress.on_phase_complete(&Phase::Aggregate);

        let answer = self
            .stream_synthesis(turn, system, &fallback, CombineMode::Layered, emitter, progress)
            .await;
        (answer, results)
    }

    /// Stream the synthesizer's answer; falls back to pick-best if it yields nothing.
    async fn stream_synthesis(
        &self,
        turn: &Turn<'_>,
        system: String,
        fallback: &[ModelResult],
        mode: CombineMode,
        emitter: &mut Emitter,
        progress: &dyn ProgressNotifier,
    ) -> CombinedAnswer {
        progress.on_phase_start(&Phase::StreamSynthesis, 1);
        let synthesizer = &self.params.synthesizer;

        let request = SessionRequest::new(synthesizer.clone())
            .with_system_prompt(system)
            .with_history(turn.history.clone())
            .with_options(self.params.synthesizer_options)
            .with_api_key(turn.api_key.clone());

        let (answer, success) = match self.relay(request, turn.question, emitter).await {
            Ok(text) if !normalize(&text).is_empty() => (CombinedAnswer::new(text, mode), true),
            outcome => {
                let reason = match outcome {
                    Err(e) => e.to_string(),
                    Ok(_) => "empty answer".to_string(),
                };
                warn!(
                    model = %synthesizer,
                    reason = %reason,
                    "Synthesizer produced nothing; falling back to pick-best"
                );
                let best = pick_best(fallback, self.params.max_answer_chars);
                emitter.fragment(&best.text).await;
                (best, false)
            }
        };

        progress.on_task_complete(&Phase::StreamSynthesis, synthesizer, success);
        progress.on_phase_complete(&Phase::StreamSynthesis);
        answer
    }

    async fn persist(
        &self,
        session: &SessionId,
        question: &str,
        targets: &[Model],
        answer: &CombinedAnswer,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), RunCombineError> {
        progress.on_phase_start(&Phase::Persist, 1);
        self.memory
            .append(session, ConversationTurn::new(question, answer.text.clone()))
            .await?;
        self.logger.log(ConversationEvent::turn_completed(
            session, targets, question, answer,
        ));
        progress.on_phase_complete(&Phase::Persist);
        Ok(())
    }

    // ==================== Helpers ====================

    fn participant_request(
        &self,
        turn: &Turn<'_>,
        model: &Model,
        system: &str,
        with_history: bool,
    ) -> SessionRequest {
        let history = if with_history {
            turn.history.clone()
        } else {
            Vec::new()
        };
        SessionRequest::new(model.clone())
            .with_system_prompt(system)
            .with_history(history)
            .with_options(self.params.participant_options)
            .with_api_key(turn.api_key.clone())
    }

    /// Query every target concurrently; results come back in request order.
    async fn fan_out(
        &self,
        requests: Vec<SessionRequest>,
        prompt: &str,
        progress: &dyn ProgressNotifier,
    ) -> Vec<ModelResult> {
        info!("Fan-out to {} models", requests.len());
        progress.on_phase_start(&Phase::Fanout, requests.len());

        let models: Vec<Model> = requests.iter().map(|r| r.model.clone()).collect();
        let mut join_set = JoinSet::new();

        for (index, request) in requests.into_iter().enumerate() {
            let client = self.client.clone();
            let prompt = prompt.to_string();
            join_set.spawn(async move { (index, client.complete(request, &prompt).await) });
        }

        let mut slots: Vec<Option<ModelResult>> = vec![None; models.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => {
                    progress.on_task_complete(&Phase::Fanout, &result.model, !result.is_failed());
                    slots[index] = Some(result);
                }
                Err(e) => warn!("Fan-out task failed: {}", e),
            }
        }

        progress.on_phase_complete(&Phase::Fanout);

        slots
            .into_iter()
            .zip(models)
            .map(|(slot, model)| {
                slot.unwrap_or_else(|| ModelResult::failure(model, "task aborted"))
            })
            .collect()
    }

    /// Valid answers as `(model label, normalized text)`, in request order.
    fn normalize_results(
        &self,
        results: &[ModelResult],
        progress: &dyn ProgressNotifier,
    ) -> Vec<(String, String)> {
        progress.on_phase_start(&Phase::Normalize, results.len());
        let valid: Vec<(String, String)> = valid_results(results)
            .into_iter()
            .map(|r| (r.model.to_string(), r.normalized_text()))
            .collect();
        debug!(valid = valid.len(), total = results.len(), "Normalized results");
        progress.on_phase_complete(&Phase::Normalize);
        valid
    }

    /// Forward a streamed reply to the caller and return its full text.
    ///
    /// Leading whitespace-only chunks are held back until real text arrives,
    /// so a reply that never gets past whitespace emits nothing and the
    /// caller can still fall back cleanly. Once text has been emitted, the
    /// returned string is exactly the concatenation of the emitted fragments.
    /// Fails only when nothing was emitted; a stream that breaks later keeps
    /// the partial text.
    async fn relay(
        &self,
        request: SessionRequest,
        prompt: &str,
        emitter: &mut Emitter,
    ) -> Result<String, GatewayError> {
        let model = request.model.clone();
        let mut handle = self.client.open_stream(request, prompt).await?;
        let mut text = String::new();
        let mut emitting = false;

        loop {
            match self.client.next_event(&mut handle).await {
                Ok(Some(StreamEvent::Delta(chunk))) => {
                    text.push_str(&chunk);
                    if emitting {
                        emitter.fragment(&chunk).await;
                    } else if !normalize(&text).is_empty() {
                        emitting = true;
                        emitter.fragment(&text).await;
                    }
                }
                Ok(Some(StreamEvent::Completed(full))) => {
                    if !emitting && !normalize(&full).is_empty() {
                        emitter.fragment(&full).await;
                        text = full;
                    }
                    break;
                }
                Ok(Some(StreamEvent::Error(e))) => {
                    if !emitting {
                        return Err(GatewayError::RequestFailed(e));
                    }
                    warn!(model = %model, error = %e, "Stream broke; keeping partial answer");
                    break;
                }
                Ok(None) => break,
                Err(e) => {
                    if !emitting {
                        return Err(e);
                    }
                    warn!(model = %model, error = %e, "Stream stalled; keeping partial answer");
                    break;
                }
            }
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedGateway, TestMemory};
    use std::sync::Mutex;
    use std::time::Duration;

    const SYNTH: &str = "synth";

    struct Harness {
        gateway: Arc<ScriptedGateway>,
        memory: Arc<TestMemory>,
        use_case: Arc<RunCombineUseCase<ScriptedGateway, TestMemory>>,
    }

    fn harness(gateway: ScriptedGateway, params: CombineParams) -> Harness {
        let gateway = Arc::new(gateway);
        let memory = Arc::new(TestMemory::default());
        let params = params.with_synthesizer(Model::new(SYNTH).unwrap());
        let use_case = Arc::new(RunCombineUseCase::new(
            Arc::clone(&gateway),
            Arc::clone(&memory),
            params,
        ));
        Harness {
            gateway,
            memory,
            use_case,
        }
    }

    fn input(query: &str, models: &[&str]) -> CombineInput {
        let models: Vec<String> = models.iter().map(|m| m.to_string()).collect();
        CombineInput::parse(query, &models, None).unwrap()
    }

    fn pick_best_params() -> CombineParams {
        CombineParams::default().with_policy(CombinePolicy::PickBest)
    }

    async fn collect(
        use_case: &RunCombineUseCase<ScriptedGateway, TestMemory>,
        input: CombineInput,
    ) -> (Vec<CombineEvent>, CombineOutput) {
        let (tx, mut rx) = mpsc::channel(64);
        let output = use_case
            .execute_streaming(input, tx, &NoProgress)
            .await
            .unwrap();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (events, output)
    }

    fn fragments(events: &[CombineEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                CombineEvent::Fragment(text) => Some(text.clone()),
                CombineEvent::Started { .. } => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_model_list_runs_single_default_model() {
        let h = harness(
            ScriptedGateway::new().reply("llama3-8b-8192", Reply::chunks(&["Hi ", "there"])),
            CombineParams::default(),
        );

        let (events, output) = collect(&h.use_case, input("hi", &[])).await;

        assert_eq!(output.answer.mode, CombineMode::Single);
        assert_eq!(output.answer.text, "Hi there");
        assert_eq!(output.targets, vec![Model::new("llama3-8b-8192").unwrap()]);
        assert!(matches!(
            &events[0],
            CombineEvent::Started { mode: CombineMode::Single, .. }
        ));
        assert_eq!(fragments(&events), vec!["Hi ", "there"]);

        let calls = h.gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].streaming);
        assert_eq!(calls[0].system_prompt.as_deref(), Some(DEFAULT_ASSISTANT_SYSTEM));
        assert!(h.gateway.calls_to(SYNTH).is_empty());
    }

    #[tokio::test]
    async fn test_pick_best_longest_answer() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("  short  "))
                .reply("B", Reply::text("a much longer valid answer")),
            pick_best_params(),
        );

        let (events, output) = collect(&h.use_case, input("Explain X", &["A", "B"])).await;

        assert_eq!(output.answer.text, "a much longer valid answer");
        assert_eq!(output.answer.source_model, Some(Model::new("B").unwrap()));
        assert_eq!(fragments(&events), vec!["a much longer valid answer"]);
        assert!(h.gateway.calls_to(SYNTH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pick_best_excludes_timed_out_model() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("  short  "))
                .reply(
                    "B",
                    Reply::delayed(60, Reply::text("a much longer valid answer")),
                ),
            pick_best_params().with_timeout(Duration::from_secs(5)),
        );

        let output = h.use_case.execute(input("Explain X", &["A", "B"])).await.unwrap();

        assert_eq!(output.answer.text, "short");
        assert_eq!(output.results.len(), 2);
        assert!(output.results[1].is_failed());
        assert_eq!(
            output.results[1].error_reason.as_deref(),
            Some("[model-error] Timeout")
        );
    }

    #[tokio::test]
    async fn test_all_failed_yields_sentinel_and_one_turn() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::fail(GatewayError::ConnectionError("down".into())))
                .reply(
                    "B",
                    Reply::fail(GatewayError::HttpStatus {
                        status: 500,
                        body: "oops".into(),
                    }),
                ),
            pick_best_params(),
        );

        let output = h.use_case.execute(input("Explain X", &["A", "B"])).await.unwrap();

        assert_eq!(output.answer.text, "No valid responses available.");
        assert_eq!(output.answer.source_model, None);
        let turns = h.memory.turns("default");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user_input, "Explain X");
        assert_eq!(turns[0].final_output, "No valid responses available.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pick_best_tie_goes_to_first_listed_even_when_it_arrives_last() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::delayed(5, Reply::text("abc")))
                .reply("B", Reply::text("xyz")),
            pick_best_params(),
        );
        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();
        assert_eq!(output.answer.text, "abc");
        assert_eq!(output.answer.source_model, Some(Model::new("A").unwrap()));
        let order: Vec<&str> = output.results.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fan_out_calls_models_concurrently() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::delayed(20, Reply::text("first")))
                .reply("B", Reply::delayed(20, Reply::text("second"))),
            pick_best_params().with_timeout(Duration::from_secs(30)),
        );
        let started = tokio::time::Instant::now();
        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();
        let elapsed = started.elapsed();

        assert!(output.results.iter().all(|r| !r.is_failed()));
        assert!(elapsed >= Duration::from_secs(20));
        assert!(elapsed < Duration::from_secs(30), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_pick_best_caps_answer_length() {
        let long = "é".repeat(800);
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text(&long))
                .reply("B", Reply::text("short")),
            pick_best_params(),
        );
        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();
        assert_eq!(output.answer.text.chars().count(), 500);
    }

    #[tokio::test]
    async fn test_pick_best_keeps_duplicate_targets() {
        let h = harness(
            ScriptedGateway::new().reply("A", Reply::text("same")),
            pick_best_params(),
        );
        let output = h.use_case.execute(input("q", &["A", "A"])).await.unwrap();
        assert_eq!(output.results.len(), 2);
        assert_eq!(h.gateway.calls_to("A").len(), 2);
        assert_eq!(output.answer.text, "same");
    }

    #[tokio::test]
    async fn test_synthesize_streams_synthesizer_chunks_and_persists_them() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text(" first answer "))
                .reply("B", Reply::text("second answer"))
                .reply(SYNTH, Reply::chunks(&["Merged ", "answer", "."])),
            CombineParams::default(),
        );

        let (events, output) = collect(&h.use_case, input("Explain X", &["A", "B"])).await;

        assert_eq!(output.answer.mode, CombineMode::Synthesize);
        assert_eq!(fragments(&events), vec!["Merged ", "answer", "."]);
        assert_eq!(output.answer.text, "Merged answer.");
        assert_eq!(h.memory.turns("default")[0].final_output, "Merged answer.");

        let synth_calls = h.gateway.calls_to(SYNTH);
        assert_eq!(synth_calls.len(), 1);
        assert!(synth_calls[0].streaming);
        assert_eq!(synth_calls[0].prompt, "Explain X");
        let system = synth_calls[0].system_prompt.clone().unwrap();
        assert!(system.contains("--- Response from model 'A' ---\nfirst answer\n"));
        assert!(system.contains("--- Response from model 'B' ---\nsecond answer\n"));

        for participant in ["A", "B"] {
            let calls = h.gateway.calls_to(participant);
            assert!(!calls[0].streaming);
            assert_eq!(calls[0].system_prompt.as_deref(), Some(DIRECT_ANSWER_SYSTEM));
        }
    }

    #[tokio::test]
    async fn test_synthesize_skips_synthesizer_when_nothing_is_valid() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("   "))
                .reply("B", Reply::fail(GatewayError::Timeout))
                .reply(SYNTH, Reply::text("should not run")),
            CombineParams::default(),
        );
        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();
        assert_eq!(output.answer.text, NO_VALID_RESPONSES);
        assert!(h.gateway.calls_to(SYNTH).is_empty());
        assert_eq!(h.memory.turns("default").len(), 1);
    }

    #[tokio::test]
    async fn test_synthesizer_failure_falls_back_to_pick_best() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("tiny"))
                .reply("B", Reply::text("the longer one"))
                .reply(SYNTH, Reply::fail(GatewayError::ModelNotAvailable(SYNTH.into()))),
            CombineParams::default(),
        );
        let (events, output) = collect(&h.use_case, input("q", &["A", "B"])).await;
        assert_eq!(output.answer.text, "the longer one");
        assert_eq!(output.answer.mode, CombineMode::PickBest);
        assert_eq!(fragments(&events), vec!["the longer one"]);
    }

    #[tokio::test]
    async fn test_whitespace_only_synthesizer_output_falls_back_cleanly() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("tiny"))
                .reply("B", Reply::text("the longer one"))
                .reply(SYNTH, Reply::FailAfter(vec!["\n".into()], "reset".into())),
            CombineParams::default(),
        );
        let (events, output) = collect(&h.use_case, input("q", &["A", "B"])).await;

        let emitted = fragments(&events).concat();
        assert_eq!(emitted, "the longer one");
        assert_eq!(output.answer.mode, CombineMode::PickBest);
        assert_eq!(h.memory.turns("default")[0].final_output, emitted);
    }

    #[tokio::test]
    async fn test_leading_whitespace_is_emitted_with_first_text() {
        let h = harness(
            ScriptedGateway::new().reply("solo", Reply::chunks(&["\n", " ", "Hi", "!"])),
            CombineParams::default(),
        );
        let (events, output) = collect(&h.use_case, input("q", &["solo"])).await;

        assert_eq!(fragments(&events), vec!["\n Hi", "!"]);
        assert_eq!(output.answer.text, "\n Hi!");
        assert_eq!(h.memory.turns("default")[0].final_output, "\n Hi!");
    }

    #[tokio::test]
    async fn test_synthesizer_break_mid_stream_keeps_partial_text() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("one"))
                .reply("B", Reply::text("two"))
                .reply(
                    SYNTH,
                    Reply::FailAfter(vec!["Partial ".into(), "answer".into()], "reset".into()),
                ),
            CombineParams::default(),
        );
        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();
        assert_eq!(output.answer.text, "Partial answer");
        assert_eq!(h.memory.turns("default")[0].final_output, "Partial answer");
    }

    #[tokio::test]
    async fn test_history_is_replayed_to_the_synthesizer_only() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("one"))
                .reply("B", Reply::text("two"))
                .reply(SYNTH, Reply::text("merged")),
            CombineParams::default(),
        );
        h.use_case.execute(input("first", &["A", "B"])).await.unwrap();
        h.use_case.execute(input("second", &["A", "B"])).await.unwrap();

        let synth_calls = h.gateway.calls_to(SYNTH);
        assert_eq!(synth_calls[0].history_len, 0);
        assert_eq!(synth_calls[1].history_len, 2);
        assert!(h.gateway.calls_to("A").iter().all(|c| c.history_len == 0));
        assert_eq!(h.memory.turns("default").len(), 2);
    }

    #[tokio::test]
    async fn test_pick_best_participants_receive_history() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("one"))
                .reply("B", Reply::text("two")),
            pick_best_params(),
        );
        h.use_case.execute(input("first", &["A", "B"])).await.unwrap();
        h.use_case.execute(input("second", &["A", "B"])).await.unwrap();
        assert_eq!(h.gateway.calls_to("B")[1].history_len, 2);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let h = harness(
            ScriptedGateway::new().reply("llama3-8b-8192", Reply::text("ok")),
            CombineParams::default(),
        );
        h.use_case
            .execute(input("q1", &[]).with_session(SessionId::new("alice")))
            .await
            .unwrap();
        h.use_case
            .execute(input("q2", &[]).with_session(SessionId::new("bob")))
            .await
            .unwrap();
        assert_eq!(h.memory.turns("alice").len(), 1);
        assert_eq!(h.memory.turns("bob").len(), 1);
        assert!(h.memory.turns("default").is_empty());

        h.use_case.clear_session(&SessionId::new("alice")).await.unwrap();
        assert!(h.memory.turns("alice").is_empty());
    }

    #[tokio::test]
    async fn test_layered_runs_every_round_then_synthesizes() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("alpha"))
                .reply("B", Reply::text("beta"))
                .reply(SYNTH, Reply::chunks(&["final"])),
            CombineParams::default()
                .with_policy(CombinePolicy::Layered)
                .with_layer_cycles(2),
        );

        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();

        assert_eq!(output.answer.mode, CombineMode::Layered);
        assert_eq!(output.answer.text, "final");
        let a_calls = h.gateway.calls_to("A");
        assert_eq!(a_calls.len(), 2);
        assert_eq!(a_calls[0].system_prompt.as_deref(), Some(DIRECT_ANSWER_SYSTEM));
        let second = a_calls[1].system_prompt.clone().unwrap();
        assert!(second.contains("0. alpha\n1. beta\n"));

        let synth = h.gateway.calls_to(SYNTH);
        assert_eq!(synth.len(), 1);
        assert!(
            synth[0]
                .system_prompt
                .as_deref()
                .unwrap()
                .starts_with("You are a helpful assistant.\n")
        );
    }

    #[tokio::test]
    async fn test_layered_fallback_uses_last_round_with_valid_answers() {
        let down = || Reply::fail(GatewayError::ConnectionError("down".into()));
        let h = harness(
            ScriptedGateway::new()
                .replies("A", vec![Reply::text("alpha"), down()])
                .replies("B", vec![Reply::text("beta, longer"), down()])
                .reply(SYNTH, Reply::fail(GatewayError::Timeout)),
            CombineParams::default()
                .with_policy(CombinePolicy::Layered)
                .with_layer_cycles(2),
        );

        let output = h.use_case.execute(input("q", &["A", "B"])).await.unwrap();

        assert_eq!(h.gateway.calls_to("A").len(), 2);
        assert!(output.results.iter().all(|r| r.is_failed()));
        assert_eq!(output.answer.text, "beta, longer");
        assert_eq!(output.answer.source_model, Some(Model::new("B").unwrap()));
    }

    #[tokio::test]
    async fn test_request_policy_overrides_configured_policy() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("one"))
                .reply("B", Reply::text("three")),
            CombineParams::default(),
        );
        let models = vec!["A".to_string(), "B".to_string()];
        let request = CombineInput::parse("q", &models, Some("pick-best")).unwrap();
        let output = h.use_case.execute(request).await.unwrap();
        assert_eq!(output.answer.mode, CombineMode::PickBest);
        assert_eq!(output.answer.text, "three");
    }

    #[tokio::test]
    async fn test_single_model_failure_persists_sentinel() {
        let h = harness(
            ScriptedGateway::new().reply(
                "solo",
                Reply::fail(GatewayError::MissingCredential("GROQ_API_KEY".into())),
            ),
            CombineParams::default(),
        );
        let (events, output) = collect(&h.use_case, input("q", &["solo"])).await;
        assert_eq!(output.answer.text, NO_VALID_RESPONSES);
        assert!(output.results[0].is_failed());
        assert_eq!(fragments(&events), vec![NO_VALID_RESPONSES]);
        assert_eq!(h.memory.turns("default")[0].final_output, NO_VALID_RESPONSES);
    }

    #[tokio::test]
    async fn test_api_key_is_forwarded() {
        struct KeyCheck(Mutex<Vec<Option<String>>>);

        #[async_trait::async_trait]
        impl LlmGateway for KeyCheck {
            async fn create_session(
                &self,
                request: SessionRequest,
            ) -> Result<Box<dyn crate::ports::llm_gateway::LlmSession>, GatewayError> {
                self.0.lock().unwrap().push(request.api_key.clone());
                Err(GatewayError::MissingCredential("none".into()))
            }
        }

        let gateway = Arc::new(KeyCheck(Mutex::new(Vec::new())));
        let use_case = RunCombineUseCase::new(
            Arc::clone(&gateway),
            Arc::new(TestMemory::default()),
            CombineParams::default(),
        );
        use_case
            .execute(input("q", &[]).with_api_key(Some("sk-caller".into())))
            .await
            .unwrap();
        assert_eq!(
            gateway.0.lock().unwrap().as_slice(),
            &[Some("sk-caller".to_string())]
        );
    }

    #[tokio::test]
    async fn test_disconnected_caller_still_persists() {
        let h = harness(
            ScriptedGateway::new()
                .reply("A", Reply::text("one"))
                .reply("B", Reply::text("two"))
                .reply(SYNTH, Reply::chunks(&["a", "b", "c"])),
            CombineParams::default(),
        );

        let (rx, handle) = h
            .use_case
            .spawn_streaming(input("q", &["A", "B"]))
            .await
            .unwrap();
        drop(rx);
        let output = handle.await.unwrap().unwrap();

        assert_eq!(output.answer.text, "abc");
        assert_eq!(h.memory.turns("default")[0].final_output, "abc");
    }

    #[tokio::test]
    async fn test_started_event_renders_banner() {
        let h = harness(
            ScriptedGateway::new().reply("solo", Reply::text("x")),
            CombineParams::default(),
        );
        let (events, _) = collect(&h.use_case, input("q", &["solo"])).await;
        assert_eq!(events[0].render(), "--- Running a single model: solo ---\n\n");
        assert_eq!(events[1].render(), "x");
    }

    #[test]
    fn test_parse_rejects_invalid_fields() {
        let err = CombineInput::parse("   ", &[], None).unwrap_err();
        assert!(err.is_invalid_request());

        let err = CombineInput::parse("q", &["".to_string()], None).unwrap_err();
        assert!(err.is_invalid_request());

        let err = CombineInput::parse("q", &[], Some("vote")).unwrap_err();
        assert!(err.is_invalid_request());

        let ok = CombineInput::parse("q", &[], Some("")).unwrap();
        assert_eq!(ok.policy, None);
    }
}
