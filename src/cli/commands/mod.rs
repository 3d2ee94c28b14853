//! CLI command implementations.

mod chat;
mod config;
mod doctor;
mod serve;
mod summarize;

pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::run_serve;
pub use summarize::run_summarize;

use crate::config::Settings;
use crate::content::{validate_url, ContentSource, YoutubeSource};
use crate::error::Result;
use crate::llm::SupportedModel;
use crate::session::SummaryRequest;

/// Fill in defaults for a summarize request from the command line.
pub(crate) fn build_request(
    url: &str,
    words: Option<u32>,
    model: Option<&str>,
    settings: &Settings,
) -> Result<SummaryRequest> {
    let model = match model {
        Some(name) => name.parse::<SupportedModel>()?,
        None => settings.llm.model,
    };

    Ok(SummaryRequest {
        url: url.to_string(),
        words: words.unwrap_or(settings.summary.default_words),
        model,
    })
}

/// Whether the URL will be handled by the YouTube source.
pub(crate) fn is_video_url(url: &str, settings: &Settings) -> bool {
    validate_url(url)
        .map(|u| YoutubeSource::new(&settings.youtube).can_handle(&u))
        .unwrap_or(false)
}
