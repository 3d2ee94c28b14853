//! Summarize command implementation.

use super::{build_request, is_video_url};
use crate::artifact::save_summary;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use crate::speech::{EspeakSynthesizer, SpeechSynthesizer};
use anyhow::Result;
use std::path::PathBuf;

/// Run the summarize command.
pub async fn run_summarize(
    url: &str,
    words: Option<u32>,
    model: Option<&str>,
    audio: Option<&str>,
    link: bool,
    output_dir: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let request = match build_request(url, words, model, &settings) {
        Ok(r) => r,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    // Pre-flight checks
    let video = is_video_url(url, &settings);
    if let Err(e) = preflight::check(Operation::Summarize { video }, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'gist doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    if audio.is_some() {
        if let Err(e) = preflight::check(Operation::Speak, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'gist doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let mut session = Session::new(&settings)?;

    let spinner = Output::spinner("Extracting and summarizing...");
    let active = match session.summarize(request).await {
        Ok(active) => {
            spinner.finish_and_clear();
            active
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to summarize: {}", e));
            return Err(e.into());
        }
    };

    Output::success("Summary generated");
    Output::source(&active.document);
    Output::summary(&active.summary);

    let dir = output_dir
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.output_dir());
    let artifact = save_summary(&active.summary, &dir, &settings.summary.filename)?;
    Output::kv("Saved", &artifact.path.display().to_string());

    if link {
        println!("{}", artifact.download_link());
    }

    if let Some(audio_path) = audio {
        let synthesizer = EspeakSynthesizer::new(&settings.speech, &settings.temp_dir());
        let spinner = Output::spinner("Synthesizing speech...");
        let result = synthesizer.synthesize(&active.summary).await;
        spinner.finish_and_clear();

        match result {
            Ok(bytes) => {
                let path = PathBuf::from(audio_path);
                std::fs::write(&path, &bytes)?;
                Output::kv("Audio", &path.display().to_string());
            }
            Err(e) => {
                Output::error(&format!("Failed to synthesize speech: {}", e));
                return Err(e.into());
            }
        }
    }

    Ok(())
}
