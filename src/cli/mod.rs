//! CLI module for Gist.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Gist - Summarize & ask questions about YouTube videos and web pages
///
/// Fetches captions or page text from a URL, summarizes it with a hosted
/// language model, and answers follow-up questions from the same content.
#[derive(Parser, Debug)]
#[command(name = "gist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a YouTube video or web page
    Summarize {
        /// YouTube or website URL
        url: String,

        /// Target summary length in words (minimum 100)
        #[arg(short, long)]
        words: Option<u32>,

        /// Model to use (gemma2-9b-it, llama3-8b-8192, llama3-70b-8192)
        #[arg(short, long)]
        model: Option<String>,

        /// Also synthesize the summary as speech and write the MP3 here
        #[arg(short, long)]
        audio: Option<String>,

        /// Print an HTML download link for summary.txt
        #[arg(long)]
        link: bool,

        /// Directory for summary.txt (defaults to general.output_dir)
        #[arg(long)]
        output_dir: Option<String>,
    },

    /// Summarize a URL, then ask questions about it interactively
    Chat {
        /// YouTube or website URL
        url: String,

        /// Target summary length in words (minimum 100)
        #[arg(short, long)]
        words: Option<u32>,

        /// Model to use (gemma2-9b-it, llama3-8b-8192, llama3-70b-8192)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start HTTP API server with per-session summarize and ask endpoints
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

/// Log filter for the crate: `-v` flags win over the configured level.
pub fn log_directive(verbose: u8, configured: &str) -> String {
    let level = match verbose {
        0 => configured.trim(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let level = if level.is_empty() { "warn" } else { level };
    format!("gist={}", level)
}
