//! Status command implementation

use crate::config::Config;
use crate::credentials::{resolve_stored_credential, KeySource};
use crate::workspace::Workspace;
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub config_exists: bool,
    pub data_dir: String,
    pub uploads_dir: String,
    pub document_count: usize,
    pub upload_count: usize,
    pub llm_model: String,
    pub llm_base_url: String,
    pub embedding_model: String,
    /// Where a stored key was found, if anywhere
    pub credential: Option<String>,
}

pub fn cmd_status(config: &Config) -> StatusInfo {
    info!("Getting status");

    let workspace = Workspace::new(&config.workspace);
    let documents = workspace.list_documents();
    let upload_count = documents
        .iter()
        .filter(|p| p.starts_with(workspace.transient_dir()))
        .count();

    let credential = resolve_stored_credential(config).map(|c| match c.source {
        KeySource::SecretsFile => config.paths.secrets_file.display().to_string(),
        KeySource::Environment => format!("${}", config.llm.api_key_env),
    });

    StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        config_exists: config.paths.config_file.exists(),
        data_dir: workspace.permanent_dir().display().to_string(),
        uploads_dir: workspace.transient_dir().display().to_string(),
        document_count: documents.len(),
        upload_count,
        llm_model: config.llm.model.clone(),
        llm_base_url: config.llm.base_url.clone(),
        embedding_model: config.embedding.model.clone(),
        credential,
    }
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 setu Status\n");
    let marker = if status.config_exists { "" } else { " (not found, using defaults)" };
    println!("Configuration: {}{}", status.config_path, marker);
    println!("\nDocuments: {}", status.data_dir);
    println!("  Files: {}", status.document_count);
    println!("  Of which uploads ({}): {}", status.uploads_dir, status.upload_count);
    println!("\nLLM: {} via {}", status.llm_model, status.llm_base_url);
    println!("Embedding Model: {}", status.embedding_model);
    match &status.credential {
        Some(source) => println!("API Key: ✓ loaded from {}", source),
        None => println!("API Key: ✗ none stored (enter one in the UI)"),
    }
}
