//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{GistError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Summarizing needs an API key, and yt-dlp for video URLs.
    Summarize { video: bool },
    /// Speech needs the TTS engine and ffmpeg.
    Speak,
    /// Serving needs an API key; tools are checked per request.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Summarize { video } => {
            check_api_key(settings)?;
            if video {
                check_tool(&settings.youtube.ytdlp_path)?;
            }
        }
        Operation::Speak => {
            check_tool(&settings.speech.engine_path)?;
            check_tool(&settings.speech.ffmpeg_path)?;
        }
        Operation::Serve => {
            check_api_key(settings)?;
        }
    }
    Ok(())
}

/// Check if the API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.llm.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(GistError::Config(format!(
            "{var} is empty. Set it with: export {var}='gsk_...' or add it to .env"
        ))),
        Err(_) => Err(GistError::Config(format!(
            "{var} not set. Set it with: export {var}='gsk_...' or add it to .env"
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg uses -version (single dash), others use --version
    let version_arg = if name.ends_with("ffmpeg") { "-version" } else { "--version" };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(GistError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GistError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(GistError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let err = check_tool("gist-test-no-such-tool").unwrap_err();
        assert!(matches!(err, GistError::ToolNotFound(_)));
    }

    #[test]
    fn test_missing_api_key() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "GIST_TEST_UNSET_API_KEY_VAR".to_string();
        let err = check(Operation::Summarize { video: false }, &settings).unwrap_err();
        assert!(matches!(err, GistError::Config(_)));
        assert!(err.to_string().contains("GIST_TEST_UNSET_API_KEY_VAR"));
    }
}
