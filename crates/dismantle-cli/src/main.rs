use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dismantle::config::{ConfigResolver, Settings};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the agent to analyze a website and show the stored results
    Analyze {
        /// Website address; `example.com` and `www.example.com` are accepted
        url: String,

        /// Write the media URLs of the analysis to a JSON file
        #[arg(long, num_args = 0..=1, default_missing_value = "media_urls.json")]
        export_media: Option<PathBuf>,
    },

    /// List previous analyses, newest first
    History {
        /// Store prefix to list (defaults to the configured artifact prefix)
        #[arg(long)]
        prefix: Option<String>,

        /// Pick an analysis from the list and show it
        #[arg(short, long)]
        pick: bool,
    },

    /// Show a stored analysis
    Show {
        /// Store key, as printed by `history`
        key: String,

        /// Write the media URLs of the analysis to a JSON file
        #[arg(long, num_args = 0..=1, default_missing_value = "media_urls.json")]
        export_media: Option<PathBuf>,
    },

    /// Chat with the agent
    Chat {
        /// Continue a conversation the agent already knows
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Print the version
    Version,
}

fn load_settings() -> Result<Settings> {
    let resolver = ConfigResolver::standard().context("Failed to load configuration")?;
    Settings::resolve(&resolver).context("Incomplete configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Version => commands::version::execute().await,
        Command::Analyze { url, export_media } => {
            commands::analyze::execute(&load_settings()?, &url, export_media).await
        }
        Command::History { prefix, pick } => {
            commands::history::execute(&load_settings()?, prefix, pick).await
        }
        Command::Show { key, export_media } => {
            commands::show::execute(&load_settings()?, &key, export_media).await
        }
        Command::Chat { session_id } => {
            commands::chat::execute(&load_settings()?, session_id).await
        }
    }
}
