//! YouTube source implementation.

use super::captions::{extract_transcript, is_webvtt, select_track, CaptionTracks};
use super::{ContentDocument, ContentSource, SourceKind};
use crate::config::YoutubeSettings;
use crate::error::{GistError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Video metadata as reported by `yt-dlp --dump-json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subtitles: Option<CaptionTracks>,
    #[serde(default)]
    pub automatic_captions: Option<CaptionTracks>,
}

impl VideoInfo {
    /// Parse yt-dlp JSON output.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            GistError::ContentUnavailable(format!("Failed to parse yt-dlp output: {}", e))
        })
    }
}

/// YouTube content source: captions first, description as fallback.
pub struct YoutubeSource {
    video_id_regex: Regex,
    ytdlp_path: String,
    preferred_languages: Vec<String>,
    http: reqwest::Client,
}

impl YoutubeSource {
    pub fn new(settings: &YoutubeSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    pub fn with_client(settings: &YoutubeSettings, http: reqwest::Client) -> Self {
        let video_id_regex = Regex::new(
            r"(?x)
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            ytdlp_path: settings.ytdlp_path.clone(),
            preferred_languages: settings.preferred_languages.clone(),
            http,
        }
    }

    /// Extract the video ID from a YouTube URL.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        self.video_id_regex
            .captures(input.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch metadata using yt-dlp without downloading the video.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_info(&self, url: &str) -> Result<VideoInfo> {
        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                url,
            ])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GistError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    GistError::ContentUnavailable(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GistError::ContentUnavailable(format!(
                "Video {} not found or unavailable: {}",
                url,
                stderr.trim()
            )));
        }

        VideoInfo::from_json(&String::from_utf8_lossy(&output.stdout))
    }

    /// Build a transcript from the video's captions.
    ///
    /// Returns an empty string when there are no captions, the payload is not
    /// WebVTT, or the caption download fails.
    pub async fn transcript(&self, info: &VideoInfo) -> String {
        let empty = CaptionTracks::new();
        let subtitles = info.subtitles.as_ref().unwrap_or(&empty);
        let automatic = info.automatic_captions.as_ref().unwrap_or(&empty);

        let Some(choice) = select_track(subtitles, automatic, &self.preferred_languages) else {
            debug!("No caption tracks available");
            return String::new();
        };

        info!(
            language = %choice.language,
            automatic = choice.automatic,
            "Fetching captions"
        );

        let payload = match self.fetch_payload(&choice.url).await {
            Ok(p) => p,
            Err(e) => {
                warn!("Caption download failed: {}", e);
                return String::new();
            }
        };

        if !is_webvtt(&payload) {
            debug!("Caption payload is not WebVTT, ignoring");
            return String::new();
        }

        extract_transcript(&payload)
    }

    async fn fetch_payload(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Turn metadata into a document, falling back to the description when
    /// the captions yield no text.
    pub async fn document_from_info(&self, info: &VideoInfo, source_url: &str) -> Result<ContentDocument> {
        let transcript = self.transcript(info).await;

        let text = if transcript.is_empty() {
            info!("No transcript, using video description");
            info.description.clone().unwrap_or_default()
        } else {
            transcript
        };

        if text.trim().is_empty() {
            return Err(GistError::ContentUnavailable(format!(
                "Video {} has no captions and no description",
                if info.id.is_empty() { source_url } else { &info.id }
            )));
        }

        Ok(ContentDocument {
            text,
            source_url: source_url.to_string(),
            kind: SourceKind::Video,
            title: info.title.clone(),
        })
    }
}

#[async_trait]
impl ContentSource for YoutubeSource {
    fn can_handle(&self, url: &Url) -> bool {
        let host_matches = url.host_str().is_some_and(|host| {
            let host = host.to_lowercase();
            host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
        });
        host_matches || self.extract_video_id(url.as_str()).is_some()
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<ContentDocument> {
        if let Some(id) = self.extract_video_id(url.as_str()) {
            debug!(video_id = %id, "Resolved YouTube video");
        }
        let info = self.fetch_info(url.as_str()).await?;
        self.document_from_info(&info, url.as_str()).await
    }
}
