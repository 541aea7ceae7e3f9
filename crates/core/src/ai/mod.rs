//! Embedding service access through Ollama

pub mod client;

pub use client::{EmbedRequest, ModelInfo, OllamaClient};
