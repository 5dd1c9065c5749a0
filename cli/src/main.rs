//! facepass CLI: drive the handover flow and inspect verification state
//! against a facepass backend.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use facepass_client::{ApiClient, Backend};
use facepass_handover::PollOutcome;
use facepass_utils::{init_logging, LogFormat};
use facepass_verification::HttpArtifactSource;
use tokio::sync::broadcast;

use crate::config::FacepassConfig;

#[derive(Parser)]
#[command(name = "facepass", about = "Face verification and cross-device handover client")]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override it.
    #[arg(long, env = "FACEPASS_CONFIG")]
    config: Option<PathBuf>,

    /// Backend origin, e.g. "http://localhost:3000".
    #[arg(long, env = "FACEPASS_BACKEND_URL")]
    backend_url: Option<String>,

    /// Public web client URL used for handover links.
    #[arg(long, env = "FACEPASS_PUBLIC_URL")]
    public_url: Option<String>,

    /// Session cookie (e.g. "jwt=...") of an already signed-in user.
    #[arg(long, env = "FACEPASS_SESSION_COOKIE", hide_env_values = true)]
    session_cookie: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FACEPASS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "FACEPASS_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Hand a signed-in session over to a phone.
    Handover {
        #[command(subcommand)]
        action: HandoverAction,
    },
    /// Show whether the signed-in user is verified.
    Status,
    /// Face model artifacts.
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(clap::Subcommand)]
enum HandoverAction {
    /// Request a token, show the QR code, and wait for the phone.
    Code {
        /// Write the QR code as SVG instead of printing it.
        #[arg(long)]
        svg: Option<PathBuf>,
        /// Exit after showing the code.
        #[arg(long)]
        no_wait: bool,
    },
    /// Sign in with a handover link, as the phone would.
    Redeem {
        /// The scanned link, e.g. "https://app.example/handover?t=...".
        url: String,
    },
}

#[derive(clap::Subcommand)]
enum ModelsAction {
    /// Download the pinned model set and report its size.
    Prefetch,
}

/// Conventional status for a run stopped by SIGINT.
const INTERRUPTED: u8 = 130;

fn handover_status(outcome: Option<&PollOutcome>) -> u8 {
    match outcome {
        Some(PollOutcome::Cancelled) => INTERRUPTED,
        _ => 0,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FacepassConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FacepassConfig::default(),
    };
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if let Some(url) = cli.public_url {
        config.public_url = Some(url);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;

    init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    let backend: Arc<dyn Backend> = Arc::new(match &cli.session_cookie {
        Some(cookie) => ApiClient::with_session_cookie(&config.backend_url, cookie)?,
        None => ApiClient::new(&config.backend_url)?,
    });

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Handover { action } => match action {
            HandoverAction::Code { svg, no_wait } => {
                let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("received SIGINT, stopping");
                        let _ = shutdown_tx.send(());
                    }
                });
                let outcome = commands::handover_code(
                    &mut stdout,
                    backend,
                    &config,
                    svg.as_deref(),
                    !no_wait,
                    shutdown_rx,
                )
                .await?;
                return Ok(ExitCode::from(handover_status(outcome.as_ref())));
            }
            HandoverAction::Redeem { url } => {
                commands::handover_redeem(&mut stdout, backend, &url).await?;
            }
        },
        Command::Status => {
            commands::status(&mut stdout, backend.as_ref()).await?;
        }
        Command::Models { action } => match action {
            ModelsAction::Prefetch => {
                let source = HttpArtifactSource::new()?;
                commands::models_prefetch(&mut stdout, &source, &config).await?;
            }
        },
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_wait_exits_130() {
        assert_eq!(handover_status(Some(&PollOutcome::Cancelled)), 130);
        assert_eq!(handover_status(None), 0);
    }
}
