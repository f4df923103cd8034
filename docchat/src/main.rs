//! docchat - chat with your PDF collections from the terminal.
//!
//! Architecture:
//! - Gateway: thin HTTP client for the question-answering backend
//! - Session store: the single persisted session token (~/.docchat/session)
//! - Controller: login state machine, collections and the chat transcript
//! - CLI: one-shot commands and an interactive chat loop on top of the controller

mod cli;
mod config;
mod controller;
mod gateway;
mod models;
mod session;
mod validation;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{execute, Cli};

/// Log to stderr so chat output on stdout stays clean.
fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "warn,docchat=debug",
        _ => "debug,docchat=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    execute(cli).await
}
