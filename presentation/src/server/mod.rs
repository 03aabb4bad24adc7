//! HTTP surface of the combiner
//!
//! Routes are thin adapters over [`RunCombineUseCase`]: `POST /chat` streams
//! the combined answer as `text/plain`, `POST /generate` waits for it and
//! returns JSON.
//!
//! [`RunCombineUseCase`]: combiner_application::RunCombineUseCase

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{CombineRequest, GenerateResponse, router};
pub use state::{AppState, CombineService};

use axum::Router;
use tracing::info;

/// Bind `address` and serve `app` until the process is stopped.
pub async fn serve(app: Router, address: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(address = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, app).await
}
