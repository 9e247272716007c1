//! setu CLI entry point

use clap::{Parser, Subcommand};
use setu::{
    assistant::{Assistant, DefaultModelProvider},
    commands::{cmd_init, cmd_status, print_init_summary, print_status},
    config::Config,
    error::Result,
    progress::LogWriterFactory,
    server,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "setu")]
#[command(version, about = "Retrieval-augmented funding assistant for startups", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default setu.toml and create the document folders
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show configuration, document counts and key status
    Status,

    /// Start the web assistant
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long, env = "SETU_BIND")]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path),
        None => Config::load_from(None),
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let base_dir = cli
                .config
                .as_deref()
                .and_then(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            let config = cmd_init(base_dir, force)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_init_summary(&config);
            }
        }

        Commands::Status => {
            let config = load_config(cli.config)?;
            let status = cmd_status(&config);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Serve { bind } => {
            let config = load_config(cli.config)?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let assistant = Assistant::new(config, Arc::new(DefaultModelProvider))?;
            server::serve(Arc::new(assistant), &bind).await?;
        }
    }

    Ok(())
}
