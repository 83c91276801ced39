//! CLI entry point for Gamesmith.
//!
//! Reads a game description, runs one generation against the configured
//! chat-completion endpoint while drawing progress on stderr, and writes the
//! result to disk.

mod cli;
mod helpers;
mod terminal;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gamesmith_core::{CancellationToken, GenerationRequestFlow, HttpTransport};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::helpers::{init_tracing, read_prompt, resolve_config, write_output};
use crate::terminal::TerminalSink;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; keys may come from the real environment.
    let _ = dotenvy::dotenv();
    init_tracing(&cli.log_level);

    let config = resolve_config(&cli)?;
    let prompt = read_prompt(&cli, std::io::stdin().lock())?;

    let transport = Arc::new(
        HttpTransport::new(&config)
            .context("set GAMESMITH_API_KEY (or DEEPSEEK_API_KEY) or api_key in the config file")?,
    );
    info!(url = %transport.url(), model = %config.model, "endpoint configured");

    let flow = GenerationRequestFlow::new(config, transport, Arc::new(TerminalSink::new()));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling generation");
            on_interrupt.cancel();
        }
    });

    let extracted = flow.run_with_cancel(&prompt, cancel).await?;

    write_output(&cli.out, &extracted.code, &prompt, cli.raw)?;
    println!("{}", cli.out.display());
    Ok(())
}
