//! SDPM CLI Library
//!
//! Command-line interface components for the SDPM semantic chunker.

use sdpm_core::{ChunkingError, SdpmError};

pub mod commands;
pub mod config;
pub mod output;

pub use commands::*;
pub use config::*;
pub use output::*;

/// CLI version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the appropriate exit code for an error
pub fn exit_code_for_error(error: &SdpmError) -> i32 {
    match error {
        SdpmError::Validation { .. } | SdpmError::Config(_) => 2,
        SdpmError::Chunking(ChunkingError::InvalidConfiguration(_)) => 2,
        SdpmError::NotFound { .. } => 3,
        SdpmError::Network { .. } | SdpmError::Http(_) => 5,
        SdpmError::AiService { .. } | SdpmError::ModelNotAvailable { .. } => 6,
        SdpmError::Chunking(ChunkingError::EmbeddingGeneration(_)) => 6,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdpm_core::EmbeddingError;

    #[test]
    fn test_exit_codes() {
        let validation_error = SdpmError::validation("test");
        assert_eq!(exit_code_for_error(&validation_error), 2);

        let not_found_error = SdpmError::not_found("test");
        assert_eq!(exit_code_for_error(&not_found_error), 3);

        let network_error = SdpmError::network("test");
        assert_eq!(exit_code_for_error(&network_error), 5);

        let ai_error = SdpmError::ai("test");
        assert_eq!(exit_code_for_error(&ai_error), 6);
    }

    #[test]
    fn test_chunking_exit_codes() {
        let embedding = SdpmError::from(ChunkingError::EmbeddingGeneration(
            EmbeddingError::OllamaError("connection refused".to_string()),
        ));
        assert_eq!(exit_code_for_error(&embedding), 6);

        let config = SdpmError::from(ChunkingError::InvalidConfiguration(
            "chunk_size must be greater than 0".to_string(),
        ));
        assert_eq!(exit_code_for_error(&config), 2);

        let io = SdpmError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(exit_code_for_error(&io), 1);
    }
}
