//! Generic web page source.

use super::{ContentDocument, ContentSource, SourceKind};
use crate::config::WebSettings;
use crate::error::{GistError, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Elements whose text is never shown to a reader.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe", "head"];

/// Elements that start a new paragraph of text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "aside", "nav", "li", "ul",
    "ol", "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "table",
    "tr", "td", "th", "figure", "figcaption", "form", "body",
];

/// Web page content source.
pub struct WebSource {
    client: reqwest::Client,
}

impl WebSource {
    pub fn new(settings: &WebSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(|e| GistError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| GistError::ContentUnavailable(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GistError::ContentUnavailable(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| GistError::ContentUnavailable(format!("Failed to read {}: {}", url, e)))
    }
}

#[async_trait]
impl ContentSource for WebSource {
    fn can_handle(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<ContentDocument> {
        let html = self.fetch_html(url).await?;
        let page = extract_page(&html);

        if page.text.is_empty() {
            return Err(GistError::ContentUnavailable(format!(
                "No readable text found at {}",
                url
            )));
        }

        debug!(blocks = page.text.matches("\n\n").count() + 1, "Extracted page text");

        Ok(ContentDocument {
            text: page.text,
            source_url: url.to_string(),
            kind: SourceKind::Web,
            title: page.title,
        })
    }
}

/// Readable content of an HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub title: Option<String>,
    /// Visible text, one block per paragraph, separated by blank lines.
    pub text: String,
}

/// Extract the title and visible body text of an HTML document.
pub fn extract_page(html: &str) -> PageText {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("Invalid selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let body_selector = Selector::parse("body").expect("Invalid selector");
    let root = document
        .select(&body_selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    collect_blocks(root, &mut blocks, &mut current);
    push_block(&mut blocks, &mut current);

    PageText {
        title,
        text: blocks.join("\n\n"),
    }
}

fn collect_blocks(element: ElementRef<'_>, blocks: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    current.push(' ');
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let is_block = BLOCK_TAGS.contains(&name);
                if is_block {
                    push_block(blocks, current);
                }
                collect_blocks(child_element, blocks, current);
                if is_block {
                    push_block(blocks, current);
                }
            }
            _ => {}
        }
    }
}

fn push_block(blocks: &mut Vec<String>, current: &mut String) {
    let text = collapse_whitespace(current);
    if !text.is_empty() {
        blocks.push(text);
    }
    current.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
