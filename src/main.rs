//! Gist CLI entry point.

use anyhow::Result;
use clap::Parser;
use gist::cli::{commands, log_directive, Cli, Commands};
use gist::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the key may come from the shell.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            log_directive(cli.verbose, &settings.general.log_level)
        })))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Summarize {
            url,
            words,
            model,
            audio,
            link,
            output_dir,
        } => {
            commands::run_summarize(
                url,
                *words,
                model.as_deref(),
                audio.as_deref(),
                *link,
                output_dir.as_deref(),
                settings,
            )
            .await?;
        }

        Commands::Chat { url, words, model } => {
            commands::run_chat(url, *words, model.as_deref(), settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
