//! API key prober for the Gemini model-listing endpoint
//!
//! Lists every model the key can see and reports the ones that support text
//! generation. Failures are reported, never propagated: the prober always
//! finishes normally.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::io::Write;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const TEXT_GENERATION_METHOD: &str = "generateContent";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_text_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == TEXT_GENERATION_METHOD)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

pub struct GeminiModelClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiModelClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)?
            .join("models")
            .map_err(|e| Error::Config(format!("Invalid model listing URL: {}", e)))?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        })
    }

    /// Every model visible to the key, across all pages
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.endpoint.clone())
                .header(API_KEY_HEADER, self.api_key.as_str());
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<GoogleErrorBody>(&body)
                    .map(|b| b.error.message)
                    .unwrap_or(body);
                return Err(Error::ModelListing(format!("{} {}", status.as_u16(), message)));
            }

            let page: ListModelsResponse = response.json().await?;
            debug!("Model listing page with {} model(s)", page.models.len());
            models.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }
}

/// What the probe concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(usize),
    NoneFound,
    Failed,
}

/// List models and print the report to `out`
pub async fn run_probe<W: Write>(client: &GeminiModelClient, out: &mut W) -> std::io::Result<ProbeOutcome> {
    writeln!(out, "\n🔍 Checking available models for this key...\n")?;

    let models = match client.list_models().await {
        Ok(models) => models,
        Err(e) => {
            writeln!(out, "\n❌ ERROR: Your API Key is invalid or there is a connection issue.")?;
            writeln!(out, "Error details: {}", e)?;
            return Ok(ProbeOutcome::Failed);
        }
    };

    let mut count = 0;
    for model in models.iter().filter(|m| m.supports_text_generation()) {
        writeln!(out, "✅ FOUND: {}", model.name)?;
        count += 1;
    }

    if count == 0 {
        writeln!(out, "❌ No text generation models found! Your API key might be restricted.")?;
        Ok(ProbeOutcome::NoneFound)
    } else {
        writeln!(out, "\n🎉 Success! Found {} models.", count)?;
        Ok(ProbeOutcome::Found(count))
    }
}
