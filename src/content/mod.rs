//! Content acquisition for Gist.
//!
//! Turns a URL into a plain-text [`ContentDocument`]: captions or description
//! for YouTube videos, visible page text for everything else.

pub mod captions;
mod web;
mod youtube;

pub use web::{extract_page, PageText, WebSource};
pub use youtube::{VideoInfo, YoutubeSource};

use crate::config::Settings;
use crate::error::{GistError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

/// Kind of content a document was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Video,
    Web,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Video => write!(f, "video"),
            SourceKind::Web => write!(f, "web"),
        }
    }
}

/// Plain-text content acquired from a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    /// Text to summarize and answer questions from.
    pub text: String,
    /// URL the content was acquired from.
    pub source_url: String,
    /// Kind of source.
    pub kind: SourceKind,
    /// Video or page title (if available).
    pub title: Option<String>,
}

impl ContentDocument {
    /// Approximate number of words in the document.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Trait for content source providers.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Check if this source can handle the given URL.
    fn can_handle(&self, url: &Url) -> bool;

    /// Fetch the URL's content as a document.
    async fn fetch(&self, url: &Url) -> Result<ContentDocument>;
}

/// Dispatches a URL to the first source that can handle it.
pub struct ContentFetcher {
    sources: Vec<Box<dyn ContentSource>>,
}

impl ContentFetcher {
    /// Create a fetcher with the YouTube and web sources.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_sources(vec![
            Box::new(YoutubeSource::new(&settings.youtube)),
            Box::new(WebSource::new(&settings.web)?),
        ]))
    }

    /// Create a fetcher with custom sources, tried in order.
    pub fn with_sources(sources: Vec<Box<dyn ContentSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl ContentSource for ContentFetcher {
    fn can_handle(&self, url: &Url) -> bool {
        self.sources.iter().any(|s| s.can_handle(url))
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<ContentDocument> {
        let source = self
            .sources
            .iter()
            .find(|s| s.can_handle(url))
            .ok_or_else(|| GistError::InvalidInput(format!("Unsupported URL: {}", url)))?;

        let document = source.fetch(url).await?;
        info!(
            kind = %document.kind,
            words = document.word_count(),
            "Acquired content"
        );
        Ok(document)
    }
}

/// Validate user input as an absolute http(s) URL.
pub fn validate_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GistError::InvalidInput("Please enter a valid URL.".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| GistError::InvalidInput(format!("Please enter a valid URL ({}): {}", e, trimmed)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(GistError::InvalidInput(format!(
            "Please enter a valid URL (unsupported scheme '{}'): {}",
            url.scheme(),
            trimmed
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(GistError::InvalidInput(format!(
            "Please enter a valid URL (missing host): {}",
            trimmed
        ))),
    }
}
