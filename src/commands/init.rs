//! Init command implementation

use crate::config::{Config, CONFIG_FILE_NAME, SECRETS_FILE_NAME};
use crate::error::{Error, Result};
use crate::workspace::Workspace;
use std::path::PathBuf;
use tracing::info;

/// Write a default `setu.toml` under `base_dir` and create the document stores
pub fn cmd_init(base_dir: PathBuf, force: bool) -> Result<Config> {
    let config_path = base_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        return Err(Error::AlreadyInitialized(format!(
            "{} (use --force to overwrite)",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.workspace.data_dir = base_dir.join("data");
    config.paths.config_file = config_path;
    config.paths.secrets_file = base_dir.join(SECRETS_FILE_NAME);
    config.paths.base_dir = base_dir;

    config.validate()?;
    config.save()?;
    Workspace::new(&config.workspace).ensure_dirs()?;

    info!("Initialized setu at {:?}", config.paths.base_dir);
    Ok(config)
}

pub fn print_init_summary(config: &Config) {
    println!("✓ Initialized setu at {:?}", config.paths.base_dir);
    println!("\nConfiguration: {:?}", config.paths.config_file);
    println!("Documents: {:?}", config.workspace.data_dir);
    println!("Uploads: {:?}", config.workspace.uploads_dir());
    println!("\nNext steps:");
    println!("  Copy scheme and investor files (pdf, txt, csv) into the documents folder");
    println!(
        "  Put GROQ_API_KEY = \"gsk_...\" in {:?} or export ${}",
        config.paths.secrets_file, config.llm.api_key_env
    );
    println!("  setu serve");
}
