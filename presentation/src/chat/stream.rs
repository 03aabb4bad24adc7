use crate::server::CombineService;
use combiner_application::{
    CombineEvent, CombineInput, CombineOutput, ProgressNotifier, RunCombineError,
};
use std::io::Write;
use tokio::sync::mpsc;

const PRINT_BUFFER: usize = 64;

/// Run the pipeline and print each event to stdout as it arrives.
pub async fn print_streaming(
    pipeline: &CombineService,
    input: CombineInput,
    progress: &dyn ProgressNotifier,
) -> Result<CombineOutput, RunCombineError> {
    let (tx, mut rx) = mpsc::channel::<CombineEvent>(PRINT_BUFFER);

    let run = pipeline.execute_streaming(input, tx, progress);
    let print = async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            let _ = write!(stdout, "{}", event.render());
            let _ = stdout.flush();
        }
    };

    let (result, ()) = tokio::join!(run, print);
    println!();
    result
}
