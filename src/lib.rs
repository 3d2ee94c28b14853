//! Gist - Summarize and question YouTube videos and web pages
//!
//! A CLI tool and HTTP service that turns a URL into a summary and answers
//! follow-up questions about the same content.
//!
//! # Overview
//!
//! Gist allows you to:
//! - Pull captions from YouTube videos, or readable text from web pages
//! - Summarize the content to a target length with a hosted language model
//! - Ask questions answered from the summarized content
//! - Download the summary as `summary.txt` or listen to it as MP3
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `content` - Content acquisition (YouTube captions, web pages)
//! - `llm` - Model selection and the chat completions client
//! - `summarize` - Summary and question prompts
//! - `session` - Per-user document, summary and model state
//! - `artifact` - The downloadable summary file
//! - `speech` - Text-to-speech synthesis
//!
//! # Example
//!
//! ```rust,no_run
//! use gist::config::Settings;
//! use gist::llm::SupportedModel;
//! use gist::session::{Session, SummaryRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut session = Session::new(&settings)?;
//!
//!     let active = session
//!         .summarize(SummaryRequest {
//!             url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
//!             words: 300,
//!             model: SupportedModel::Gemma2_9b,
//!         })
//!         .await?;
//!     println!("{}", active.summary);
//!
//!     println!("{}", session.ask("What is the main point?").await?);
//!
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod session;
pub mod speech;
pub mod summarize;

pub use error::{GistError, Result};
