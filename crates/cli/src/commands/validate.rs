//! Validate command implementation

use clap::Args;
use std::path::PathBuf;

use sdpm_core::{OllamaClient, Result, SdpmConfig, SdpmError};

use crate::commands::CliCommand;
use crate::config::OutputFormat;

/// Validate SDPM configuration and embedding service access
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Configuration file to validate
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Check Ollama connectivity and that the embedding model is available
    #[arg(long)]
    pub check_ollama: bool,

    /// Output format (json, yaml, text)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl CliCommand for ValidateCommand {
    async fn execute(&self) -> Result<()> {
        let mut validation_result = ValidationResult::new();
        let mut failure = None;

        if self.config.is_none() {
            validation_result.add_warning(
                "config",
                "No configuration file given; using defaults and environment".to_string(),
            );
        }

        match SdpmConfig::load(self.config.as_deref()) {
            Ok(config) => {
                validation_result.threshold = Some(config.chunker.threshold.to_string());
                validation_result.skip_window = Some(config.chunker.skip_window);

                if config.chunker.skip_window == 0 {
                    validation_result.add_warning(
                        "chunker",
                        "skip_window is 0; only adjacent groups can merge".to_string(),
                    );
                }

                if self.check_ollama {
                    if let Err(e) = Self::validate_ollama(&config).await {
                        validation_result.add_error("ollama", e.to_string());
                        failure = Some(e);
                    }
                }
            }
            Err(e) => {
                validation_result.add_error("config", e.to_string());
                failure = Some(e);
            }
        }

        self.output_results(&validation_result)?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "validate"
    }

    fn validate(&self) -> Result<()> {
        if let Some(path) = &self.config {
            if !path.exists() {
                return Err(SdpmError::not_found(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

impl ValidateCommand {
    /// Checks that Ollama answers and serves the configured model
    async fn validate_ollama(config: &SdpmConfig) -> Result<()> {
        let client = OllamaClient::with_timeout(
            config.embedding.url.to_string(),
            std::time::Duration::from_secs(config.embedding.timeout_seconds),
        )?;

        if !client.health_check().await? {
            return Err(SdpmError::network(format!(
                "Ollama is not reachable at {}",
                client.base_url()
            )));
        }

        client.ensure_model(&config.embedding.model).await
    }

    /// Output validation results in the specified format
    fn output_results(&self, result: &ValidationResult) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
            OutputFormat::Yaml => println!("{}", serde_yaml::to_string(result)?),
            OutputFormat::Text => Self::output_text_results(result),
        }
        Ok(())
    }

    /// Output results in human-readable text format
    fn output_text_results(result: &ValidationResult) {
        if result.has_errors() {
            println!(
                "❌ Validation failed with {} error(s):",
                result.errors.len()
            );
            for (category, errors) in &result.errors {
                for error in errors {
                    println!("  [{}] {}", category, error);
                }
            }
        }

        if !result.warnings.is_empty() {
            println!("⚠️  Warnings ({}):", result.warnings.len());
            for (category, warnings) in &result.warnings {
                for warning in warnings {
                    println!("  [{}] {}", category, warning);
                }
            }
        }

        if !result.has_errors() {
            println!("✅ Configuration is valid");
        }
    }
}

/// Validation result structure
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ValidationResult {
    pub errors: std::collections::BTreeMap<String, Vec<String>>,
    pub warnings: std::collections::BTreeMap<String, Vec<String>>,
    /// Effective threshold setting
    pub threshold: Option<String>,
    /// Effective skip window
    pub skip_window: Option<usize>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, category: &str, message: String) {
        self.errors
            .entry(category.to_string())
            .or_default()
            .push(message);
    }

    pub fn add_warning(&mut self, category: &str, message: String) {
        self.warnings
            .entry(category.to_string())
            .or_default()
            .push(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
