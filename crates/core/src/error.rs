//! Error handling for the SDPM core library

use std::fmt;
use thiserror::Error;

use crate::semantic::chunker::ChunkingError;

/// Result type alias for SDPM operations
pub type Result<T> = std::result::Result<T, SdpmError>;

/// Main error type for SDPM operations
#[derive(Error, Debug)]
pub enum SdpmError {
    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Chunking pipeline errors
    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Embedding service errors
    #[error("AI service error: {message}")]
    AiService { message: String },

    /// Network connectivity errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Model not available error
    #[error("Model '{model}' is not available")]
    ModelNotAvailable { model: String },

    /// Resource not found errors
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },
}

impl SdpmError {
    /// Create an AI service error
    pub fn ai<S: Into<String>>(message: S) -> Self {
        Self::AiService {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a model not available error
    pub fn model_not_available<S: Into<String>>(model: S) -> Self {
        Self::ModelNotAvailable {
            model: model.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::Http(_) | Self::Network { .. } => ErrorCategory::Network,
            Self::Json(_) | Self::Yaml(_) => ErrorCategory::Serialization,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Url(_) => ErrorCategory::Url,
            Self::Chunking(_) => ErrorCategory::Chunking,
            Self::AiService { .. } | Self::ModelNotAvailable { .. } => ErrorCategory::AI,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Generic(_) => ErrorCategory::Generic,
        }
    }
}

/// Error categories for logging
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    FileSystem,
    Network,
    Serialization,
    Configuration,
    Url,
    Chunking,
    AI,
    Validation,
    NotFound,
    Generic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileSystem => write!(f, "filesystem"),
            Self::Network => write!(f, "network"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
            Self::Url => write!(f, "url"),
            Self::Chunking => write!(f, "chunking"),
            Self::AI => write!(f, "ai"),
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SdpmError::validation("bad skip window");
        assert!(matches!(err, SdpmError::Validation { .. }));
        assert_eq!(err.to_string(), "Validation error: bad skip window");
    }

    #[test]
    fn test_error_categories() {
        let err = SdpmError::ai("test");
        assert_eq!(err.category(), ErrorCategory::AI);

        let err = SdpmError::network("test");
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = SdpmError::from(ChunkingError::InvalidConfiguration("chunk_size".to_string()));
        assert_eq!(err.category(), ErrorCategory::Chunking);
    }

    #[test]
    fn test_error_from_conversions() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let sdpm_err: SdpmError = io_err.into();
        assert!(matches!(sdpm_err, SdpmError::Io(_)));

        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let sdpm_err: SdpmError = json_err.into();
        assert!(matches!(sdpm_err, SdpmError::Json(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SdpmError::model_not_available("nomic-embed-text");
        assert_eq!(err.to_string(), "Model 'nomic-embed-text' is not available");

        let err = SdpmError::not_found("sdpm.yaml");
        assert_eq!(err.to_string(), "Resource not found: sdpm.yaml");
        assert_eq!(err.category().to_string(), "not_found");
    }
}
