use combiner_application::{LlmGateway, RunCombineUseCase};
use combiner_domain::{ConversationRepository, Model};
use std::sync::Arc;

/// The pipeline as the server sees it, with adapters erased
pub type CombineService = RunCombineUseCase<dyn LlmGateway, dyn ConversationRepository>;

/// State shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CombineService>,
    /// Model ids advertised by `GET /models`
    pub catalog: Arc<Vec<Model>>,
}

impl AppState {
    pub fn new(pipeline: Arc<CombineService>, catalog: Vec<Model>) -> Self {
        Self {
            pipeline,
            catalog: Arc::new(catalog),
        }
    }
}
