//! CLI entrypoint for llm-combiner
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use combiner_application::{CombineInput, LlmGateway, RunCombineUseCase};
use combiner_domain::{CombinePolicy, ConversationRepository, Model, Question, SessionId};
use combiner_infrastructure::{
    ConfigLoader, FileConfig, InMemoryConversationRepository, JsonlConversationLogger,
    ModelCatalog, OpenAiGateway,
};
use combiner_presentation::{AppState, ChatRepl, Cli, CombineService, Command, ask, router, serve};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    info!("Starting llm-combiner");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    let models = Model::parse_list(&cli.model).context("Invalid --model value")?;
    let session = SessionId::new(cli.session.clone().unwrap_or_default());
    let catalog = ModelCatalog::load(Path::new(&config.models.catalog_file));
    let pipeline = Arc::new(build_pipeline(&cli, &config)?);

    match cli.action() {
        Command::Serve {
            host,
            port,
            static_dir,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let static_dir =
                static_dir.or_else(|| config.server.static_dir.as_ref().map(PathBuf::from));

            let app = router(AppState::new(pipeline, catalog), static_dir);
            serve(app, &format!("{}:{}", host, port))
                .await
                .context("HTTP server failed")?;
        }
        Command::Chat => {
            ChatRepl::new(pipeline, models)
                .with_catalog(catalog)
                .with_session(session)
                .with_progress(!cli.quiet)
                .run()
                .await?;
        }
        Command::Ask { question, output } => {
            let input = CombineInput::new(Question::new(question)?)
                .with_models(models)
                .with_session(session);
            ask(&pipeline, input, output, !cli.quiet).await?;
        }
    }

    Ok(())
}

/// Build the pipeline from configuration plus command-line overrides.
fn build_pipeline(cli: &Cli, config: &FileConfig) -> Result<CombineService> {
    for issue in config.validate().iter().filter(|i| !i.is_error()) {
        warn!("{}", issue);
    }

    let mut params = config
        .to_combine_params()
        .context("Invalid configuration")?;
    if let Some(policy) = cli.policy.as_deref() {
        let policy = policy
            .parse::<CombinePolicy>()
            .context("Invalid --policy value")?;
        params = params.with_policy(policy);
    }
    if let Some(synthesizer) = cli.synthesizer.as_deref() {
        params = params.with_synthesizer(Model::new(synthesizer)?);
    }

    // === Dependency Injection ===
    let gateway: Arc<dyn LlmGateway> = Arc::new(OpenAiGateway::new(
        &config.provider.base_url,
        config.provider.api_key_env.clone(),
        config.provider.timeout(),
    )?);
    let memory: Arc<dyn ConversationRepository> = Arc::new(
        InMemoryConversationRepository::with_window(config.memory.max_turns),
    );

    let mut pipeline = RunCombineUseCase::new(gateway, memory, params);
    if let Some(path) = config.logging.transcript_path() {
        let logger = JsonlConversationLogger::open(&path)
            .with_context(|| format!("Failed to open transcript {}", path.display()))?;
        info!(path = %path.display(), "Writing conversation transcript");
        pipeline = pipeline.with_logger(Arc::new(logger));
    }

    Ok(pipeline)
}

/// Install the tracing subscriber.
///
/// Verbosity picks the level (`RUST_LOG` wins when set); `log_file` adds a
/// non-blocking file writer whose guard must outlive the program.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}
