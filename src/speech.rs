//! Text-to-speech for summaries.
//!
//! Speech is rendered with espeak-ng to a WAV file and encoded to MP3 with
//! ffmpeg. Both files live in a temporary directory that is removed once the
//! MP3 bytes have been read back.

use crate::config::SpeechSettings;
use crate::error::{GistError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Trait for speech synthesis engines.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text and return MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Speaking rate in words per minute after applying the rate factor.
pub fn speaking_rate(base_rate: u32, factor: f32) -> u32 {
    ((base_rate as f32) * factor).round().max(1.0) as u32
}

/// espeak-ng + ffmpeg synthesizer.
pub struct EspeakSynthesizer {
    engine_path: String,
    ffmpeg_path: String,
    rate: u32,
    voice: Option<String>,
    temp_dir: PathBuf,
}

impl EspeakSynthesizer {
    pub fn new(settings: &SpeechSettings, temp_dir: &Path) -> Self {
        Self {
            engine_path: settings.engine_path.clone(),
            ffmpeg_path: settings.ffmpeg_path.clone(),
            rate: speaking_rate(settings.base_rate, settings.rate_factor),
            voice: settings.voice.clone(),
            temp_dir: temp_dir.to_path_buf(),
        }
    }

    /// Speaking rate passed to the engine.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    async fn render_wav(&self, text_path: &Path, wav_path: &Path) -> Result<()> {
        let mut command = Command::new(&self.engine_path);
        command.arg("-s").arg(self.rate.to_string());
        if let Some(voice) = &self.voice {
            command.arg("-v").arg(voice);
        }
        let result = command
            .arg("-w")
            .arg(wav_path)
            .arg("-f")
            .arg(text_path)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(GistError::Speech(format!("espeak-ng failed: {}", err.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GistError::ToolNotFound(self.engine_path.clone()))
            }
            Err(e) => Err(GistError::Speech(format!("espeak-ng error: {e}"))),
        }
    }

    /// Converts a WAV file to MP3 using ffmpeg.
    async fn encode_mp3(&self, source: &Path, dest: &Path) -> Result<()> {
        debug!("Encoding {:?} to MP3", source);

        let result = Command::new(&self.ffmpeg_path)
            .arg("-i").arg(source)
            .arg("-codec:a").arg("libmp3lame")
            .arg("-qscale:a").arg("4")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(GistError::Speech(format!("ffmpeg encoding failed: {}", err.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GistError::ToolNotFound(self.ffmpeg_path.clone()))
            }
            Err(e) => Err(GistError::Speech(format!("ffmpeg error: {e}"))),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for EspeakSynthesizer {
    #[instrument(skip(self, text), fields(chars = text.len(), rate = self.rate))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(GistError::Speech("Nothing to synthesize".to_string()));
        }

        std::fs::create_dir_all(&self.temp_dir)?;
        let workdir = tempfile::Builder::new()
            .prefix("gist-tts-")
            .tempdir_in(&self.temp_dir)?;

        let text_path = workdir.path().join("summary.txt");
        let wav_path = workdir.path().join("speech.wav");
        let mp3_path = workdir.path().join("speech.mp3");

        tokio::fs::write(&text_path, text).await?;
        self.render_wav(&text_path, &wav_path).await?;
        self.encode_mp3(&wav_path, &mp3_path).await?;

        let audio = tokio::fs::read(&mp3_path).await?;
        info!("Synthesized {} bytes of audio", audio.len());

        Ok(audio)
    }
}
