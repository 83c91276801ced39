//! CLI argument definitions for Gamesmith.

use std::path::PathBuf;

use clap::Parser;

/// Gamesmith -- generate a playable HTML5 game from a description.
#[derive(Debug, Parser)]
#[command(
    name = "gamesmith",
    version,
    about = "Gamesmith -- generate a playable HTML5 game from a description",
    long_about = "Sends a game description to a chat-completion endpoint, retries timed-out \
                  requests, and writes the generated game to an HTML file."
)]
pub struct Cli {
    /// Game description.  Read from stdin when omitted.
    pub prompt: Vec<String>,

    /// Path to a TOML configuration file.
    #[arg(long, short, default_value = "gamesmith.toml")]
    pub config: PathBuf,

    /// Model identifier (overrides config and environment).
    #[arg(long, short)]
    pub model: Option<String>,

    /// Chat-completion endpoint URL (overrides config and environment).
    #[arg(long)]
    pub api_url: Option<String>,

    /// Where to write the generated game.
    #[arg(long, short, default_value = "game.html")]
    pub out: PathBuf,

    /// Write the generated document as-is instead of wrapping it in a
    /// sandboxed host page.
    #[arg(long)]
    pub raw: bool,

    /// Default log level when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// The prompt given on the command line, if any.
    pub fn prompt_arg(&self) -> Option<String> {
        let joined = self.prompt.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}
