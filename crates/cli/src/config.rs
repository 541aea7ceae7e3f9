//! CLI configuration module

use clap::ValueEnum;
use sdpm_core::{LoggingConfig, Result, SdpmError};
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = SdpmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "text" | "txt" => Ok(Self::Text),
            _ => Err(SdpmError::validation(format!(
                "Invalid output format: {}",
                s
            ))),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies the global logging flags on top of the configured logging section
///
/// `--verbose` forces the `debug` level and `--log-format` replaces the
/// configured format. Without flags the configuration is used unchanged.
pub fn resolve_logging(
    mut logging: LoggingConfig,
    verbose: bool,
    format: Option<LogFormat>,
) -> LoggingConfig {
    if verbose {
        logging.level = "debug".to_string();
    }
    if let Some(format) = format {
        logging.format = format.as_str().to_string();
    }
    logging
}

/// Check if output supports colors
pub fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    // Check if we're connected to a terminal
    atty::is(atty::Stream::Stdout)
}
