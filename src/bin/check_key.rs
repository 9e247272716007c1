//! Check which Gemini text-generation models an API key can use

use clap::Parser;
use setu::probe::{run_probe, GeminiModelClient, DEFAULT_GEMINI_BASE_URL};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "check-key")]
#[command(version, about = "List the text generation models available to an API key", long_about = None)]
struct Cli {
    /// Model listing API base URL
    #[arg(long, env = "SETU_GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = probe(&cli.base_url).await {
        tracing::error!("{}", e);
    }
}

async fn probe(base_url: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "Paste your API Key here: ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let key = line.trim();

    match GeminiModelClient::new(base_url, key) {
        Ok(client) => {
            run_probe(&client, &mut stdout).await?;
        }
        Err(e) => {
            writeln!(stdout, "\n❌ ERROR: Your API Key is invalid or there is a connection issue.")?;
            writeln!(stdout, "Error details: {}", e)?;
        }
    }
    Ok(())
}
