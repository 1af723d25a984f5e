//! keigo - Analyze Japanese text for keigo usage.
//!
//! Sends a block of Japanese text to a remote analysis API and shows the
//! returned breakdown (validity, counts per keigo form, proficiency, tips)
//! either in a full-screen TUI or as plain text for scripting.

mod client;
mod config;
mod error;
mod protocol;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::process::Command as ProcessCommand;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keigo")]
#[command(author, version, about = "Analyze Japanese text for keigo usage")]
#[command(long_about = "Sends Japanese text to a keigo analysis API and renders the result.\n\nThe endpoint comes from --endpoint, KEIGO_ANALYSIS_ENDPOINT, or the config file.")]
struct Cli {
    /// Text to analyze (pre-fills the editor in TUI mode)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// No TUI, print the analysis as plain text (reads stdin if TEXT is omitted)
    #[arg(long)]
    pipe: bool,

    /// In pipe mode, also print the raw API response
    #[arg(long)]
    raw: bool,

    /// Override the analysis endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open configuration file in $EDITOR
    Config {
        /// Print the resolved settings instead of opening the editor
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { show: true }) => handle_show_config(cli.endpoint),
        Some(Commands::Config { show: false }) => handle_config(),
        None => {
            // Without a terminal on stdout there is nothing to draw on
            let pipe_mode = cli.pipe || !atty::is(atty::Stream::Stdout);
            init_logging(pipe_mode)?;

            let config = config::Config::load().context("Failed to load configuration")?;
            let settings = config.resolve(cli.endpoint);
            info!("Endpoint source: {}", settings.endpoint_source);

            if pipe_mode {
                handle_pipe(cli.text, cli.raw, settings).await
            } else {
                handle_tui(cli.text, settings)
            }
        }
    }
}

/// Initialize logging. The TUI owns the terminal, so it logs to a file.
fn init_logging(to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("")
            .add_directive("keigo=info".parse().expect("static directive"))
            .add_directive("reqwest=warn".parse().expect("static directive"))
    });

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let log_path = config::Config::log_path()?;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the interactive analyzer.
fn handle_tui(text: Option<String>, settings: config::Settings) -> Result<()> {
    let client = client::AnalysisClient::new()?;
    let initial_text = text.unwrap_or(settings.sample_text);

    tokio::task::block_in_place(|| client::run_tui(client, settings.endpoint, initial_text))
}

/// Analyze once and print the result as plain text.
async fn handle_pipe(text: Option<String>, show_raw: bool, settings: config::Settings) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    let client = client::AnalysisClient::new()?;
    match client.analyze(&text, settings.endpoint.as_deref()).await {
        Ok(analysis) => {
            println!("{}\n", render::SUCCESS_BANNER);
            print!("{}", render::render_text(&render::render(&analysis)));
            if show_raw {
                println!("\n## View Raw Response");
                println!("{}", render::render_raw(client.last_raw_response().as_deref()));
            }
            Ok(())
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("Error: {}", e);
            if let Some(detail) = e.detail() {
                eprintln!("{}", detail);
            }
            std::process::exit(1);
        }
    }
}

/// Handle the config command.
fn handle_config() -> Result<()> {
    let config_path = config::Config::config_path()?;

    // Create default config if it doesn't exist
    if !config_path.exists() {
        config::Config::default().save()?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}

/// Print the settings the analyzer would run with.
fn handle_show_config(cli_endpoint: Option<String>) -> Result<()> {
    let config_path = config::Config::config_path()?;
    let config = config::Config::load()?;
    let settings = config.resolve(cli_endpoint);

    println!("Config file: {}", config_path.display());
    println!(
        "Endpoint: {} ({})",
        settings.endpoint.as_deref().unwrap_or("-"),
        settings.endpoint_source
    );
    println!("Log file: {}", config::Config::log_path()?.display());

    Ok(())
}
