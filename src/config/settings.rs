//! Configuration settings for Gist.

use crate::llm::SupportedModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub summary: SummarySettings,
    pub youtube: YoutubeSettings,
    pub web: WebSettings,
    pub speech: SpeechSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where `summary.txt` is written.
    pub output_dir: String,
    /// Directory for temporary files.
    pub temp_dir: String,
    /// Log level when neither `-v` nor `RUST_LOG` is given
    /// (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            temp_dir: "/tmp/gist".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible chat completions API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Default model when none is selected on the command line.
    pub model: SupportedModel,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: SupportedModel::default(),
            timeout_seconds: 300,
        }
    }
}

impl LlmSettings {
    /// Read the API key from the configured environment variable.
    ///
    /// A missing variable is returned as an empty string so the caller can
    /// report it as a configuration error at the point of use.
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env).unwrap_or_default()
    }
}

/// Summary generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Target summary length when none is given.
    pub default_words: u32,
    /// Smallest accepted target length.
    pub min_words: u32,
    /// File name of the downloadable summary.
    pub filename: String,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            default_words: 500,
            min_words: 100,
            filename: "summary.txt".to_string(),
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// Path or name of the yt-dlp binary.
    pub ytdlp_path: String,
    /// Caption languages to try, in order, before falling back to the
    /// alphabetically first available language.
    pub preferred_languages: Vec<String>,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            preferred_languages: vec!["en".to_string()],
        }
    }
}

/// Generic web page fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSettings {
    /// User-Agent header sent with page requests.
    pub user_agent: String,
    /// Accept invalid TLS certificates.
    pub accept_invalid_certs: bool,
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Path or name of the espeak-ng binary.
    pub engine_path: String,
    /// Path or name of the ffmpeg binary.
    pub ffmpeg_path: String,
    /// Engine default speaking rate in words per minute.
    pub base_rate: u32,
    /// Multiplier applied to the base rate.
    pub rate_factor: f32,
    /// Voice name (engine default when unset).
    pub voice: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            engine_path: "espeak-ng".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            base_rate: 175,
            rate_factor: 0.8,
            voice: None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Sessions unused for this many minutes are dropped.
    pub session_idle_minutes: u64,
    /// Upper bound on concurrently held sessions.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            session_idle_minutes: 60,
            max_sessions: 1000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GistError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gist")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.summary.default_words, 500);
        assert_eq!(settings.summary.min_words, 100);
        assert_eq!(settings.summary.filename, "summary.txt");
        assert_eq!(settings.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(settings.llm.model, SupportedModel::Gemma2_9b);
        assert_eq!(settings.web.user_agent, "Mozilla/5.0");
        assert!(settings.web.accept_invalid_certs);
        assert_eq!(settings.general.log_level, "warn");
        assert_eq!(settings.server.session_idle_minutes, 60);
        assert_eq!(settings.server.max_sessions, 1000);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "llama3-70b-8192"

[youtube]
preferred_languages = ["de", "en"]
"#,
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.llm.model, SupportedModel::Llama3_70b);
        assert_eq!(settings.llm.api_base, "https://api.groq.com/openai/v1");
        assert_eq!(settings.youtube.preferred_languages, vec!["de", "en"]);
        assert_eq!(settings.speech.base_rate, 175);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.general.output_dir, ".");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.summary.default_words = 250;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.summary.default_words, 250);
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let result: std::result::Result<Settings, _> = toml::from_str("[llm]\nmodel = \"gpt-9\"\n");
        assert!(result.is_err());
    }
}
