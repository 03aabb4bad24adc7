//! Progress reporting for combine runs

use colored::Colorize;
use combiner_application::ProgressNotifier;
use combiner_domain::{CombineMode, Model, Phase};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports fan-out progress with a progress bar on stderr.
///
/// Only the waiting phases get a bar; the streamed answer owns stdout.
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn shows_bar(phase: &Phase) -> bool {
        matches!(phase, Phase::Fanout)
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut guard) = self.phase_bar.lock() {
            f(&mut guard);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_run_start(&self, mode: CombineMode, targets: &[Model]) {
        if mode.is_combined() {
            let _ = self.multi.println(format!(
                "{} {} ({} models)",
                "->".cyan(),
                mode.as_str().bold(),
                targets.len()
            ));
        }
    }

    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        if !Self::shows_bar(phase) {
            return;
        }
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(phase.display_name().to_string());
        pb.set_message("Waiting for models...");
        self.with_bar(|bar| *bar = Some(pb));
    }

    fn on_task_complete(&self, phase: &Phase, model: &Model, success: bool) {
        if !Self::shows_bar(phase) {
            return;
        }
        self.with_bar(|bar| {
            if let Some(pb) = bar.as_ref() {
                let status = if success {
                    format!("{} {}", "v".green(), model)
                } else {
                    format!("{} {}", "x".red(), model)
                };
                pb.set_message(status);
                pb.inc(1);
            }
        });
    }

    fn on_phase_complete(&self, phase: &Phase) {
        if !Self::shows_bar(phase) {
            return;
        }
        self.with_bar(|bar| {
            if let Some(pb) = bar.take() {
                pb.finish_and_clear();
            }
        });
    }

    fn on_layer_start(&self, round: usize, total_rounds: usize) {
        let _ = self.multi.println(format!(
            "{} {}",
            "->".cyan(),
            format!("Round {}/{}", round, total_rounds).bold()
        ));
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_run_start(&self, mode: CombineMode, targets: &[Model]) {
        let names: Vec<&str> = targets.iter().map(Model::as_str).collect();
        eprintln!("{} {} [{}]", "->".cyan(), mode.as_str().bold(), names.join(", "));
    }

    fn on_phase_start(&self, phase: &Phase, total_tasks: usize) {
        if matches!(phase, Phase::Fanout) {
            eprintln!(
                "{} {} ({} calls)",
                "->".cyan(),
                phase.display_name().bold(),
                total_tasks
            );
        }
    }

    fn on_task_complete(&self, phase: &Phase, model: &Model, success: bool) {
        if !matches!(phase, Phase::Fanout) {
            return;
        }
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_phase_complete(&self, _phase: &Phase) {}

    fn on_layer_start(&self, round: usize, total_rounds: usize) {
        eprintln!("{} Round {}/{}", "->".cyan(), round, total_rounds);
    }
}
