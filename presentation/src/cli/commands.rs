//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for one-shot answers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every model's answer followed by the combined answer
    Full,
    /// Only the combined answer
    #[default]
    Answer,
    /// JSON output
    Json,
}

/// CLI arguments for llm-combiner
#[derive(Parser, Debug)]
#[command(name = "llm-combiner")]
#[command(author, version, about = "Ask several LLMs at once and combine their answers")]
#[command(long_about = r#"
llm-combiner sends one question to several models and combines what they say.

Combine policies:
  synthesize   Every answer is handed to a synthesizer model (default)
  pick-best    The longest valid answer wins; no extra model call
  layered      Models refine each other over several rounds, then synthesize

With fewer than two models the question goes straight to a single model.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./combiner.toml     Project-level config
3. ~/.config/llm-combiner/config.toml   Global config

Example:
  llm-combiner serve --port 8000
  llm-combiner ask -m llama3-8b-8192 -m gemma2-9b-it "Explain Rust lifetimes"
  llm-combiner chat --policy pick-best
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Models to query (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL", global = true)]
    pub model: Vec<String>,

    /// Combine policy: synthesize, pick-best or layered
    #[arg(long, value_name = "POLICY", global = true)]
    pub policy: Option<String>,

    /// Model used to synthesize the combined answer
    #[arg(long, value_name = "MODEL", global = true)]
    pub synthesizer: Option<String>,

    /// Conversation session for chat and ask
    #[arg(long, value_name = "ID", global = true)]
    pub session: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,

        /// Directory served under /static
        #[arg(long, value_name = "DIR")]
        static_dir: Option<PathBuf>,
    },

    /// Start interactive chat mode
    Chat,

    /// Ask one question and print the combined answer
    Ask {
        /// The question to ask
        question: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "answer")]
        output: OutputFormat,
    },
}

impl Cli {
    /// The subcommand to run; a bare invocation starts the server.
    pub fn action(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            host: None,
            port: None,
            static_dir: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::parse_from(["llm-combiner"]);
        assert!(matches!(cli.action(), Command::Serve { port: None, .. }));
    }

    #[test]
    fn test_ask_with_repeated_models() {
        let cli = Cli::parse_from([
            "llm-combiner",
            "ask",
            "-m",
            "a",
            "-m",
            "b",
            "--policy",
            "pick-best",
            "hello there",
        ]);
        assert_eq!(cli.model, vec!["a", "b"]);
        assert_eq!(cli.policy.as_deref(), Some("pick-best"));
        assert_eq!(
            cli.action(),
            Command::Ask {
                question: "hello there".to_string(),
                output: OutputFormat::Answer,
            }
        );
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from(["llm-combiner", "serve", "--port", "9000", "-vv"]);
        assert_eq!(cli.verbose, 2);
        match cli.action() {
            Command::Serve { port, host, .. } => {
                assert_eq!(port, Some(9000));
                assert!(host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
