//! CLI output formatting utilities.

use crate::content::ContentDocument;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print where the summarized content came from.
    pub fn source(document: &ContentDocument) {
        let title = document.title.as_deref().unwrap_or("(untitled)");
        println!(
            "  {} {} ({}, {} words)",
            style("*").cyan(),
            style(title).bold(),
            style(document.kind).dim(),
            document.word_count()
        );
        println!("    {}", style(&document.source_url).dim());
    }

    /// Print a summary block.
    pub fn summary(text: &str) {
        Output::header("Summary");
        println!("\n{}\n", text);
    }

    /// Print an answer to a question.
    pub fn answer(text: &str) {
        println!("\n{} {}\n", style("Answer:").cyan().bold(), text);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
