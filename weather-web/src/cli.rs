use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{Config, HistoryStore, chart, provider_from_config};

use crate::server::{self, AppState};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookup web service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Run the web server.
    Serve {
        /// Address to listen on, e.g. "127.0.0.1:5000".
        #[arg(long)]
        bind: Option<String>,

        /// Path of the CSV history log.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Serve { bind, csv } => serve(bind, csv).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let path = Config::config_file_path()?;
    let mut cfg = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    cfg.set_api_key(api_key.trim().to_string());
    cfg.save_to(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn serve(bind: Option<String>, csv: Option<PathBuf>) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;
    if let Some(bind) = bind {
        cfg.server.bind = bind;
    }
    if let Some(csv) = csv {
        cfg.storage.csv_path = csv;
    }

    if let Some(Err(e)) = cfg.chart.font_path.as_deref().map(chart::register_font) {
        tracing::warn!("Using the bundled chart font: {}", e);
    }

    let provider = provider_from_config(&cfg)?;
    let store = HistoryStore::new(cfg.storage.csv_path.clone());
    tracing::info!("Recording lookups in {}", store.path().display());

    let state = AppState::new(provider, store)?;
    server::serve(&cfg.server.bind, state).await
}
