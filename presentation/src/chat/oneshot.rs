use super::stream::print_streaming;
use crate::cli::commands::OutputFormat;
use crate::output::console::ConsoleFormatter;
use crate::progress::reporter::SimpleProgress;
use crate::server::CombineService;
use combiner_application::{CombineInput, NoProgress, ProgressNotifier, RunCombineError};

/// Answer one question and print the result in `format`.
pub async fn ask(
    pipeline: &CombineService,
    input: CombineInput,
    format: OutputFormat,
    show_progress: bool,
) -> Result<(), RunCombineError> {
    let progress: &dyn ProgressNotifier = if show_progress {
        &SimpleProgress
    } else {
        &NoProgress
    };

    match format {
        OutputFormat::Answer => {
            print_streaming(pipeline, input, progress).await?;
        }
        OutputFormat::Full => {
            let question = input.question.content().to_string();
            let output = pipeline.execute_with_progress(input, progress).await?;
            println!("{}", ConsoleFormatter::format_full(&question, &output));
        }
        OutputFormat::Json => {
            let question = input.question.content().to_string();
            let output = pipeline.execute(input).await?;
            println!("{}", ConsoleFormatter::format_json(&question, &output));
        }
    }
    Ok(())
}
