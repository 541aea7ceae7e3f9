//! SDPM Core Library
//!
//! Semantic Double-Pass Merging: splits documents into semantically coherent,
//! size-bounded chunks for retrieval and embedding pipelines. Sentences are
//! embedded, grouped with their similar neighbours, and groups separated by
//! short digressions are merged back together before chunks are assembled.

pub mod ai;
pub mod config;
pub mod error;
pub mod semantic;

// Re-export commonly used types
pub use ai::OllamaClient;
pub use config::{EmbeddingConfig, LoggingConfig, SdpmConfig};
pub use error::{ErrorCategory, Result, SdpmError};
pub use semantic::{
    CachedEmbeddings, ChunkMetadata, ChunkerConfig, ChunkingError, EmbeddingError,
    EmbeddingProvider, OllamaEmbeddings, SdpmChunker, SemanticChunk, Sentence, SentenceGroup,
    SentenceSplitter, SkipMerger, Threshold,
};

/// Initialize logging with custom configuration
pub fn init_logging_with_config(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::new(level);

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        "text" | "pretty" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        "compact" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        _ => {
            return Err(SdpmError::validation(format!(
                "Unknown log format: {}",
                format
            )));
        }
    };

    result.map_err(|e| SdpmError::validation(format!("Failed to initialize logging: {}", e)))
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
