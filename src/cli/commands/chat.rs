//! Interactive summarize-then-ask session.

use super::{build_request, is_video_url};
use crate::artifact::save_summary;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use crate::speech::{EspeakSynthesizer, SpeechSynthesizer};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// A line typed at the chat prompt.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Exit,
    ShowSummary,
    Speak(&'a str),
    Question(&'a str),
    Empty,
}

fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return ChatInput::Exit;
    }
    if line.eq_ignore_ascii_case("summary") {
        return ChatInput::ShowSummary;
    }
    if let Some(rest) = line.strip_prefix("speak ") {
        let path = rest.trim();
        if !path.is_empty() {
            return ChatInput::Speak(path);
        }
    }
    ChatInput::Question(line)
}

/// Run the interactive chat command.
pub async fn run_chat(
    url: &str,
    words: Option<u32>,
    model: Option<&str>,
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

    let mut session = Session::new(&settings)?;

    let spinner = Output::spinner("Extracting and summarizing...");
    let result = session.summarize(request).await;
    spinner.finish_and_clear();

    let summary = match result {
        Ok(active) => {
            Output::success("Summary generated");
            Output::source(&active.document);
            Output::summary(&active.summary);
            active.summary.clone()
        }
        Err(e) => {
            Output::error(&format!("Failed to summarize: {}", e));
            return Err(e.into());
        }
    };

    let artifact = save_summary(&summary, &settings.output_dir(), &settings.summary.filename)?;
    Output::kv("Saved", &artifact.path.display().to_string());

    println!("\n{}", style("Ask a question based on the content").bold().cyan());
    println!(
        "{}\n",
        style("Type 'summary' to reprint it, 'speak <file.mp3>' to save audio, or 'exit' to quit.").dim()
    );

    let synthesizer = EspeakSynthesizer::new(&settings.speech, &settings.temp_dir());
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        match parse_input(&input) {
            ChatInput::Empty => Output::warning("Please enter a question."),
            ChatInput::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatInput::ShowSummary => Output::summary(&summary),
            ChatInput::Speak(path) => {
                let spinner = Output::spinner("Synthesizing speech...");
                let result = synthesizer.synthesize(&summary).await;
                spinner.finish_and_clear();
                match result.map(|bytes| std::fs::write(path, bytes)) {
                    Ok(Ok(())) => Output::success(&format!("Audio written to {}", path)),
                    Ok(Err(e)) => Output::error(&format!("Failed to write {}: {}", path, e)),
                    Err(e) => Output::error(&format!("Failed to synthesize speech: {}", e)),
                }
            }
            ChatInput::Question(question) => {
                let spinner = Output::spinner("Thinking...");
                let result = session.ask(question).await;
                spinner.finish_and_clear();
                match result {
                    Ok(answer) => Output::answer(&answer),
                    Err(e) => Output::error(&format!("Error answering question: {}", e)),
                }
            }
        }
    }

    Ok(())
}
