//! OpenReel Studio - command-line entry point

mod app;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::Studio;
use config::{Cli, Commands, KeysCommand, LogFormat, OutputFolderCommand};
use openreel_core::domain::GenerationConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    debug!("OpenReel Studio v{}", openreel_core::VERSION);

    let studio = Studio::open(&cli).await?;

    match cli.command {
        Commands::Generate {
            prompt,
            aspect_ratio,
            duration,
        } => {
            commands::generate(
                &studio,
                &prompt,
                GenerationConfig::new(aspect_ratio, duration),
            )
            .await
        }
        Commands::History { limit, json } => commands::history(&studio, limit, json).await,
        Commands::Delete { id } => commands::delete(&studio, &id).await,
        Commands::Keys { action } => match action {
            KeysCommand::Set {
                access_key,
                secret_key,
            } => {
                commands::set_keys(&studio, access_key.as_deref(), secret_key.as_deref()).await
            }
            KeysCommand::Clear => commands::clear_keys(&studio).await,
            KeysCommand::Status => commands::keys_status(&studio).await,
        },
        Commands::OutputFolder { action } => match action {
            OutputFolderCommand::Set { path } => commands::set_output_folder(&studio, &path).await,
            OutputFolderCommand::Show => commands::show_output_folder(&studio).await,
        },
    }
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("openreel=info"))
        .expect("Failed to create env filter");

    // Logs go to stderr so command output stays clean
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
