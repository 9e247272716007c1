//! setu: a retrieval-augmented funding assistant
//!
//! Documents in a local folder are chunked, embedded and indexed in memory;
//! a web UI relays chat turns to an OpenAI-compatible model with the
//! retrieved context attached.

pub mod assistant;
pub mod chat;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod embed;
pub mod error;
pub mod index;
pub mod llm;
pub mod parse;
pub mod probe;
pub mod progress;
pub mod server;
pub mod session;
pub mod workspace;
