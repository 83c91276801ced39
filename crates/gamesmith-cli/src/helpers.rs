//! Shared helpers for the CLI: tracing, configuration, prompt input, output.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gamesmith_core::{GeneratorConfig, render_sandboxed_page};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Install a compact stderr subscriber.  `RUST_LOG` takes precedence over
/// `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Resolve the generator configuration: file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = GeneratorConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.apply_env();
    apply_flags(&mut config, cli);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn apply_flags(config: &mut GeneratorConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.model = model.clone();
    }
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
}

// ---------------------------------------------------------------------------
// Prompt input
// ---------------------------------------------------------------------------

/// The prompt from the command line, or one line read from `input`.
pub fn read_prompt<R: BufRead>(cli: &Cli, mut input: R) -> Result<String> {
    if let Some(prompt) = cli.prompt_arg() {
        return Ok(prompt);
    }

    eprint!("Describe your game: ");
    io::stderr().flush().ok();

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read prompt from stdin")?;
    Ok(line.trim().to_owned())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Write the generated document to `path`, wrapped in the sandboxed host
/// page unless `raw` is set.
pub fn write_output(path: &Path, code: &str, prompt: &str, raw: bool) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let contents = if raw {
        code.to_owned()
    } else {
        render_sandboxed_page(code, prompt)
    };

    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["gamesmith", "--model", "m2", "--api-url", "http://x/y"]);
        let mut config = GeneratorConfig::default();
        apply_flags(&mut config, &cli);
        assert_eq!(config.model, "m2");
        assert_eq!(config.api_url, "http://x/y");
    }

    #[test]
    fn prompt_prefers_arguments() {
        let cli = Cli::parse_from(["gamesmith", "space", "invaders"]);
        let prompt = read_prompt(&cli, io::Cursor::new("ignored\n")).unwrap();
        assert_eq!(prompt, "space invaders");
    }

    #[test]
    fn prompt_falls_back_to_input_line() {
        let cli = Cli::parse_from(["gamesmith"]);
        let prompt = read_prompt(&cli, io::Cursor::new("  tower defense \nmore\n")).unwrap();
        assert_eq!(prompt, "tower defense");
    }

    #[test]
    fn write_raw_and_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let code = "<html><canvas></canvas></html>";

        let raw = dir.path().join("nested/raw.html");
        write_output(&raw, code, "snake", true).unwrap();
        assert_eq!(std::fs::read_to_string(&raw).unwrap(), code);

        let wrapped = dir.path().join("wrapped.html");
        write_output(&wrapped, code, "snake", false).unwrap();
        let page = std::fs::read_to_string(&wrapped).unwrap();
        assert!(page.contains(r#"sandbox="allow-scripts""#));
        assert!(page.contains("<title>snake</title>"));
    }
}
