//! Mashup command line.
//!
//! `mashup <SingerName> <NumberOfVideos> <AudioDuration> <OutputFileName>`
//!
//! Stdout carries only the user-facing result; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mashup_core::{
    load_config_or_default, validate_config, MashupError, MashupOrchestrator, MashupRequest,
    MashupRunner,
};

const USAGE: &str = "Usage: mashup <SingerName> <NumberOfVideos> <AudioDuration> <OutputFileName>\n\
Example: mashup \"Sharry Maan\" 20 25 output.mp3";

/// Command-line arguments for mashup
#[derive(Parser, Debug)]
#[command(name = "mashup")]
#[command(about = "Build an audio mashup from a singer's songs")]
#[command(version)]
struct Args {
    /// Singer to search for
    #[arg(allow_hyphen_values = true)]
    singer: String,

    /// Number of videos to download (more than 10)
    #[arg(allow_hyphen_values = true)]
    number_of_videos: String,

    /// Seconds kept from each video (more than 20)
    #[arg(allow_hyphen_values = true)]
    audio_duration: String,

    /// Output file; the extension is forced to .mp3
    #[arg(allow_hyphen_values = true)]
    output_file: PathBuf,

    /// Configuration file
    #[arg(long, env = "MASHUP_CONFIG", default_value = "mashup.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return parse_failure(e),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(path) => {
            println!("Mashup created at {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", user_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Help and version exit cleanly; anything else is a bad argument list.
fn parse_failure(error: clap::Error) -> ExitCode {
    if is_usage_error(&error) {
        println!("Incorrect number of parameters.\n{}", USAGE);
        ExitCode::FAILURE
    } else {
        let _ = error.print();
        ExitCode::SUCCESS
    }
}

fn is_usage_error(error: &clap::Error) -> bool {
    !matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

async fn run(args: Args) -> Result<PathBuf> {
    let config = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Configuration loaded from {:?}", args.config);

    let request = MashupRequest::parse(
        args.singer,
        &args.number_of_videos,
        &args.audio_duration,
        &args.output_file,
    )?;

    let orchestrator = MashupOrchestrator::from_config(&config);
    let output = orchestrator.run(&request).await?;

    Ok(std::path::absolute(&output).unwrap_or(output))
}

/// Pipeline errors already carry their cause in the message; other errors
/// print their whole context chain.
fn user_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<MashupError>() {
        Some(e) => e.to_string(),
        None => format!("{:#}", error),
    }
}
