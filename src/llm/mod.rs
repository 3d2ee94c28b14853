//! Language model abstraction.
//!
//! Summaries and answers come from an OpenAI-compatible chat completions API
//! (Groq by default). The traits here are the seam between the session logic
//! and the network client.

mod chat;
mod client;

pub use chat::{ChatModel, OpenAiConnector};
pub use client::{create_client, create_client_with_timeout};

use crate::error::{GistError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Models that can be selected for summarization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedModel {
    #[default]
    #[serde(rename = "gemma2-9b-it")]
    Gemma2_9b,
    #[serde(rename = "llama3-8b-8192")]
    Llama3_8b,
    #[serde(rename = "llama3-70b-8192")]
    Llama3_70b,
}

impl SupportedModel {
    /// Every selectable model, in display order.
    pub const ALL: [SupportedModel; 3] = [
        SupportedModel::Gemma2_9b,
        SupportedModel::Llama3_8b,
        SupportedModel::Llama3_70b,
    ];

    /// Model identifier as sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedModel::Gemma2_9b => "gemma2-9b-it",
            SupportedModel::Llama3_8b => "llama3-8b-8192",
            SupportedModel::Llama3_70b => "llama3-70b-8192",
        }
    }
}

impl std::str::FromStr for SupportedModel {
    type Err = GistError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                GistError::InvalidInput(format!(
                    "Unknown model: {}. Choose one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

impl std::fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A connected model that turns a prompt into a completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier.
    fn name(&self) -> &str;

    /// Send a single user prompt and return the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Creates model connections for a selected model and API key.
pub trait ModelConnector: Send + Sync {
    fn connect(&self, model: SupportedModel, api_key: &str) -> Result<Arc<dyn LanguageModel>>;
}
