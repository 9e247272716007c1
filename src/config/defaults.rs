//! Default values for configuration

use std::path::PathBuf;

/// Default bind address for the web front-end
pub fn default_server_bind() -> String {
    std::env::var("SETU_BIND").unwrap_or_else(|_| "127.0.0.1:8501".to_string())
}

/// Default page title
pub fn default_server_title() -> String {
    "PolyVest : Your AI Funding Companion !!".to_string()
}

/// Default tagline shown under the title
pub fn default_server_tagline() -> String {
    "Ask about Funding Schemes, or Upload your own Document for analysis.".to_string()
}

/// Default upload size cap (25 MB)
pub fn default_server_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

/// Idle time after which a session is forgotten (6 hours)
pub fn default_server_session_ttl_secs() -> u64 {
    6 * 60 * 60
}

/// Default permanent document store
pub fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Default name of the transient upload folder inside the permanent store
pub fn default_uploads_dir_name() -> String {
    "uploads".to_string()
}

/// Extensions accepted by the uploader
pub fn default_allowed_upload_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "txt".to_string(), "csv".to_string()]
}

/// Default OpenAI-compatible endpoint (Groq)
pub fn default_llm_base_url() -> String {
    std::env::var("SETU_LLM_BASE_URL")
        .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string())
}

/// Default chat model
pub fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

/// Default environment variable holding the API key
pub fn default_llm_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

/// Default context window in tokens
pub fn default_llm_context_window() -> usize {
    8192
}

/// Default request timeout in seconds
pub fn default_llm_request_timeout() -> u64 {
    120
}

/// Default number of tokens kept free for the reply
pub fn default_llm_reserved_output_tokens() -> usize {
    1024
}

/// Default sampling temperature
pub fn default_llm_temperature() -> f32 {
    0.1
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension for all-MiniLM-L6-v2
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default chunk size in tokens
pub fn default_chunk_size() -> usize {
    512
}

/// Default overlap in tokens between chunks
pub fn default_chunk_overlap() -> usize {
    50
}

/// Default number of chunks retrieved per turn
pub fn default_retrieval_top_k() -> usize {
    2
}
