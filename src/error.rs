//! Error types for Gist.

use thiserror::Error;

/// Library-level error type for Gist operations.
#[derive(Error, Debug)]
pub enum GistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not extract content: {0}")]
    ContentUnavailable(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

impl GistError {
    /// Whether the error was raised before any external call was attempted.
    pub fn is_user_error(&self) -> bool {
        matches!(self, GistError::Config(_) | GistError::InvalidInput(_))
    }
}

/// Result type alias for Gist operations.
pub type Result<T> = std::result::Result<T, GistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_user_error() {
        assert!(GistError::Config("no key".into()).is_user_error());
        assert!(GistError::InvalidInput("bad url".into()).is_user_error());
        assert!(!GistError::ContentUnavailable("offline".into()).is_user_error());
        assert!(!GistError::Llm("rate limited".into()).is_user_error());
        assert!(!GistError::ToolNotFound("yt-dlp".into()).is_user_error());
    }
}
