//! REPL (Read-Eval-Print Loop) for interactive chat

use super::stream::print_streaming;
use crate::progress::reporter::ProgressReporter;
use crate::server::CombineService;
use combiner_application::{CombineInput, NoProgress, ProgressNotifier};
use combiner_domain::{Model, Question, SessionId};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::sync::Arc;

/// What a line typed at the prompt asks for
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Quit,
    Help,
    Models,
    Clear,
    Unknown(String),
    Ask(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        match line {
            "/quit" | "/exit" | "/q" | "sair" => ReplCommand::Quit,
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/models" => ReplCommand::Models,
            "/clear" => ReplCommand::Clear,
            other if other.starts_with('/') => ReplCommand::Unknown(other.to_string()),
            other => ReplCommand::Ask(other.to_string()),
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    pipeline: Arc<CombineService>,
    models: Vec<Model>,
    catalog: Vec<Model>,
    session: SessionId,
    show_progress: bool,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(pipeline: Arc<CombineService>, models: Vec<Model>) -> Self {
        Self {
            pipeline,
            models,
            catalog: Vec::new(),
            session: SessionId::default(),
            show_progress: true,
        }
    }

    /// Models listed by `/models` besides the active ones
    pub fn with_catalog(mut self, catalog: Vec<Model>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = dirs::data_dir().map(|p| p.join("llm-combiner").join("history.txt"));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match ReplCommand::parse(line) {
                        ReplCommand::Quit => {
                            println!("Bye!");
                            break;
                        }
                        ReplCommand::Help => self.print_help(),
                        ReplCommand::Models => self.print_models(),
                        ReplCommand::Clear => self.clear_session().await,
                        ReplCommand::Unknown(cmd) => {
                            println!("Unknown command: {}", cmd);
                            println!("Type /help for available commands");
                        }
                        ReplCommand::Ask(question) => {
                            let _ = rl.add_history_entry(&question);
                            self.process_question(&question).await;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn active_models(&self) -> Vec<Model> {
        self.pipeline.resolve_targets(&self.models)
    }

    fn print_welcome(&self) {
        let policy = self.pipeline.params().policy;
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          LLM Combiner - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Models: {}",
            self.active_models()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("Policy: {}", policy.description());
        println!("Session: {}", self.session);
        self.print_help();
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?          - Show this help");
        println!("  /models                - Show active and available models");
        println!("  /clear                 - Forget this conversation");
        println!("  /quit, /exit, sair     - Exit chat");
        println!();
    }

    fn print_models(&self) {
        println!();
        println!("Active models:");
        for model in self.active_models() {
            println!("  - {}", model);
        }
        if !self.catalog.is_empty() {
            println!("Available models:");
            for model in &self.catalog {
                println!("  - {}", model);
            }
        }
        println!();
    }

    async fn clear_session(&self) {
        match self.pipeline.clear_session(&self.session).await {
            Ok(()) => println!("Conversation cleared."),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    async fn process_question(&self, question: &str) {
        let question = match Question::new(question) {
            Ok(q) => q,
            Err(e) => {
                eprintln!("Error: {}", e);
                return;
            }
        };
        let input = CombineInput::new(question)
            .with_models(self.models.clone())
            .with_session(self.session.clone());

        println!();
        let result = if self.show_progress {
            let progress = ProgressReporter::new();
            print_streaming(&self.pipeline, input, &progress as &dyn ProgressNotifier).await
        } else {
            print_streaming(&self.pipeline, input, &NoProgress).await
        };

        if let Err(e) = result {
            eprintln!("Error: {}", e);
        }
        println!();
    }
}
