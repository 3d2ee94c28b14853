//! Per-user session state.
//!
//! A [`Session`] owns the current document, its summary and the model
//! connection that produced it. `summarize` replaces that state only on
//! success; `ask` answers from it without changing it.

use crate::config::{Prompts, Settings};
use crate::content::{validate_url, ContentDocument, ContentFetcher, ContentSource};
use crate::error::{GistError, Result};
use crate::llm::{LanguageModel, ModelConnector, OpenAiConnector, SupportedModel};
use crate::summarize::Summarizer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// A request to summarize a URL.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub url: String,
    pub words: u32,
    pub model: SupportedModel,
}

/// The document and summary currently held by a session.
pub struct ActiveSummary {
    pub document: ContentDocument,
    pub summary: String,
    pub words: u32,
    pub model: Arc<dyn LanguageModel>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for ActiveSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSummary")
            .field("source_url", &self.document.source_url)
            .field("words", &self.words)
            .field("model", &self.model.name())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Shared components from which sessions are opened.
#[derive(Clone)]
pub struct SessionConfig {
    pub content: Arc<dyn ContentSource>,
    pub connector: Arc<dyn ModelConnector>,
    pub summarizer: Summarizer,
    pub api_key: String,
    pub api_key_env: String,
    pub min_words: u32,
}

impl SessionConfig {
    /// Build production components from settings and the process environment.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            content: Arc::new(ContentFetcher::new(settings)?),
            connector: Arc::new(OpenAiConnector::new(settings.llm.clone())),
            summarizer: Summarizer::new(prompts),
            api_key: settings.llm.api_key(),
            api_key_env: settings.llm.api_key_env.clone(),
            min_words: settings.summary.min_words,
        })
    }

    /// Open an empty session.
    pub fn open(&self) -> Session {
        Session {
            config: self.clone(),
            active: None,
        }
    }
}

/// A single user's summarize-then-ask context.
pub struct Session {
    config: SessionConfig,
    active: Option<ActiveSummary>,
}

impl Session {
    /// Open a session with production components.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(SessionConfig::from_settings(settings)?.open())
    }

    /// The current document and summary, if any.
    pub fn active(&self) -> Option<&ActiveSummary> {
        self.active.as_ref()
    }

    /// Drop the current document and summary.
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Check the request before any external call is made.
    fn validate(&self, request: &SummaryRequest) -> Result<url::Url> {
        if self.config.api_key.trim().is_empty() {
            return Err(GistError::Config(format!(
                "Please provide a valid API key (set {}).",
                self.config.api_key_env
            )));
        }

        let url = validate_url(&request.url)?;

        if request.words < self.config.min_words {
            return Err(GistError::InvalidInput(format!(
                "Summary length must be at least {} words (got {}).",
                self.config.min_words, request.words
            )));
        }

        Ok(url)
    }

    /// Acquire the URL's content, summarize it, and make it the active pair.
    #[instrument(skip(self, request), fields(url = %request.url, words = request.words, model = %request.model))]
    pub async fn summarize(&mut self, request: SummaryRequest) -> Result<&ActiveSummary> {
        let url = self.validate(&request)?;

        let document = self.config.content.fetch(&url).await?;
        let model = self
            .config
            .connector
            .connect(request.model, self.config.api_key.trim())?;
        let summary = self
            .config
            .summarizer
            .summarize(model.as_ref(), &document, request.words)
            .await?;

        info!("Summary generated ({} words)", summary.split_whitespace().count());

        Ok(self.active.insert(ActiveSummary {
            document,
            summary,
            words: request.words,
            model,
            created_at: Utc::now(),
        }))
    }

    /// Answer a question from the active document.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GistError::InvalidInput("Please enter a question.".to_string()));
        }

        let active = self.active.as_ref().ok_or_else(|| {
            GistError::InvalidInput(
                "Nothing has been summarized yet. Summarize a URL first.".to_string(),
            )
        })?;

        self.config
            .summarizer
            .answer(active.model.as_ref(), &active.document, question)
            .await
    }
}
