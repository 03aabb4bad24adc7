//! Route table and handlers

use super::error::ApiError;
use super::state::AppState;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use combiner_application::{CombineInput, RunCombineError};
use combiner_domain::{Model, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::path::PathBuf;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Body accepted by `POST /chat` and `POST /generate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombineRequest {
    #[serde(default, alias = "prompt")]
    pub query: String,
    #[serde(default)]
    pub models: Option<Vec<String>>,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl CombineRequest {
    pub fn into_input(self) -> Result<CombineInput, RunCombineError> {
        let models = self.models.unwrap_or_default();
        let input = CombineInput::parse(&self.query, &models, self.policy.as_deref())?;
        Ok(input
            .with_session(SessionId::new(self.session_id.unwrap_or_default()))
            .with_api_key(self.api_key))
    }
}

/// Body returned by `POST /generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub combined_response: String,
    pub mode: String,
    pub source_model: Option<String>,
}

/// Build the application router.
///
/// `static_dir`, when given, is served under `/static`.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/chat", post(chat))
        .route("/generate", post(generate))
        .route("/sessions/{id}", delete(clear_session))
        .with_state(state);

    if let Some(dir) = static_dir {
        debug!(dir = %dir.display(), "Serving static files");
        app = app.nest_service("/static", ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "llm-combiner is running. POST /chat to stream a combined answer, POST /generate for JSON."
    }))
}

async fn health() -> &'static str {
    "ok"
}

async fn models(State(state): State<AppState>) -> Json<Value> {
    let models: Vec<&str> = state.catalog.iter().map(Model::as_str).collect();
    Json(json!({ "models": models }))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<CombineRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let input = request.into_input()?;

    let (events, handle) = state.pipeline.spawn_streaming(input).await?;
    tokio::spawn(async move {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "Streaming run failed"),
            Err(e) => warn!(error = %e, "Streaming run panicked"),
        }
    });

    let body = ReceiverStream::new(events).map(|event| Ok::<_, Infallible>(event.render()));
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<CombineRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = payload?;
    let output = state.pipeline.execute(request.into_input()?).await?;
    let answer = output.answer;
    Ok(Json(GenerateResponse {
        combined_response: answer.text,
        mode: answer.mode.as_str().to_string(),
        source_model: answer.source_model.map(|m| m.as_str().to_string()),
    }))
}

async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.pipeline.clear_session(&SessionId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
