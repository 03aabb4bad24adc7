//! Console output formatter for combine results

use colored::Colorize;
use combiner_application::CombineOutput;
use combiner_domain::Model;
use serde_json::json;

/// Formats combine results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Every model's answer, then the combined answer
    pub fn format_full(question: &str, output: &CombineOutput) -> String {
        let mut text = String::new();

        text.push_str(&Self::header("LLM Combiner Results"));
        text.push('\n');

        text.push_str(&format!("{} {}\n\n", "Question:".cyan().bold(), question));
        text.push_str(&format!(
            "{} {}\n",
            "Models:".cyan().bold(),
            Self::model_list(&output.targets)
        ));

        if !output.results.is_empty() {
            text.push_str(&Self::section_header("Model Answers"));
            for result in &output.results {
                if result.is_valid() {
                    text.push_str(&format!(
                        "\n{}\n{}\n",
                        format!("── {} ──", result.model).yellow().bold(),
                        result.normalized_text()
                    ));
                } else {
                    text.push_str(&format!(
                        "\n{}\n{}\n",
                        format!("── {} ──", result.model).red().bold(),
                        result.error_reason.as_deref().unwrap_or("(empty answer)")
                    ));
                }
            }
        }

        let answer = &output.answer;
        text.push_str(&Self::section_header("Combined Answer"));
        let origin = match &answer.source_model {
            Some(model) => format!("{} (from {})", answer.mode, model),
            None => answer.mode.to_string(),
        };
        text.push_str(&format!("\n{}\n\n{}\n", origin.yellow().bold(), answer.text));
        text.push_str(&Self::footer());

        text
    }

    /// Format as JSON
    pub fn format_json(question: &str, output: &CombineOutput) -> String {
        let value = json!({
            "question": question,
            "models": output.targets,
            "results": output.results,
            "answer": output.answer,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    fn model_list(models: &[Model]) -> String {
        models
            .iter()
            .map(Model::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
