//! Configuration module for Gist.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QuestionPrompts, SummaryPrompts};
pub use settings::{
    GeneralSettings, LlmSettings, PromptSettings, ServerSettings, Settings, SpeechSettings,
    SummarySettings, WebSettings, YoutubeSettings,
};
