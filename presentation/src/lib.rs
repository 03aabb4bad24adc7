//! Presentation layer for llm-combiner
//!
//! This crate contains the CLI definition, the HTTP server, the interactive
//! chat loop, console output formatting and progress reporters.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;
pub mod server;

// Re-export commonly used types
pub use chat::{ChatRepl, ask, print_streaming};
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
pub use server::{AppState, ApiError, CombineRequest, CombineService, GenerateResponse, router, serve};
