//! CLI command for semantic document chunking
//!
//! Splits documents into semantically coherent, size-bounded chunks using
//! embeddings from an Ollama server.
//!
//! # Examples
//!
//! ```bash
//! # Chunk a single document
//! sdpm chunk --input docs/guide.md
//!
//! # Chunk with the technical preset and a wider skip window
//! sdpm chunk --input docs/api.md --strategy technical --skip-window 3
//!
//! # Chunk a directory and write one JSON file per document
//! sdpm chunk --input docs --output ./chunks
//!
//! # Dry run to preview sentence splitting without calling Ollama
//! sdpm chunk --input docs/guide.md --dry-run
//! ```

use crate::commands::CliCommand;
use crate::config::OutputFormat;
use crate::output::{ChunkReport, OutputFormatter};

use clap::{Args, ValueEnum};
use sdpm_core::semantic::grouping::GroupingMode;
use sdpm_core::{
    ChunkMetadata, ChunkerConfig, SdpmChunker, SdpmConfig, SdpmError, Result, Threshold,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

/// File extensions picked up when walking input directories
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Chunking strategy presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChunkingStrategy {
    /// Default balanced chunking
    Default,
    /// Optimized for technical documentation
    Technical,
    /// Optimized for narrative content
    Narrative,
}

impl ChunkingStrategy {
    /// Convert strategy to chunker configuration
    pub fn to_config(&self) -> ChunkerConfig {
        match self {
            Self::Default => ChunkerConfig::default(),
            Self::Technical => ChunkerConfig::technical_docs(),
            Self::Narrative => ChunkerConfig::narrative(),
        }
    }
}

/// First-pass grouping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Window,
    Cumulative,
}

impl From<ModeArg> for GroupingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Window => GroupingMode::Window,
            ModeArg::Cumulative => GroupingMode::Cumulative,
        }
    }
}

/// Arguments for the chunk command
#[derive(Debug, Clone, Args)]
pub struct ChunkArgs {
    /// Input file(s) or directory to process
    ///
    /// Directories are searched recursively for .md, .markdown and .txt files.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Chunking strategy preset, replacing the configured chunker section
    #[arg(short, long, value_enum)]
    pub strategy: Option<ChunkingStrategy>,

    /// Similarity threshold: `auto`, a float in [0, 1] or a percentile in [1, 100]
    #[arg(long)]
    pub threshold: Option<Threshold>,

    /// Number of groups the second pass may skip over
    #[arg(long)]
    pub skip_window: Option<usize>,

    /// Maximum tokens per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// First-pass grouping mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Ollama server URL (overrides config)
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Embedding model (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Output directory; one `<name>_chunks.json` file is written per input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format for standard output
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Keep sentence embeddings in the output
    #[arg(long)]
    pub include_embeddings: bool,

    /// Split into sentences only, without embedding or merging
    #[arg(long)]
    pub dry_run: bool,
}

/// Sentence statistics reported by a dry run
#[derive(Debug, Clone, serde::Serialize)]
pub struct DryRunReport {
    pub source: String,
    pub sentences: usize,
    pub tokens: usize,
    pub characters: usize,
}

impl ChunkArgs {
    /// Validate command arguments
    pub fn validate(&self) -> Result<()> {
        for path in &self.input {
            if !path.exists() {
                return Err(SdpmError::not_found(format!(
                    "Input file not found: {:?}",
                    path
                )));
            }
        }

        if let Some(chunk_size) = self.chunk_size {
            if chunk_size == 0 {
                return Err(SdpmError::validation("chunk_size must be greater than 0"));
            }
        }

        if let Some(output) = &self.output {
            if output.exists() && !output.is_dir() {
                return Err(SdpmError::validation(format!(
                    "Output path exists but is not a directory: {:?}",
                    output
                )));
            }
        }

        Ok(())
    }

    /// Loads configuration and applies command-line overrides
    pub fn build_config(&self) -> Result<SdpmConfig> {
        let mut config = SdpmConfig::load(self.config.as_deref())?;

        if let Some(strategy) = self.strategy {
            config.chunker = strategy.to_config();
        }
        if let Some(threshold) = self.threshold {
            config.chunker.threshold = threshold;
        }
        if let Some(skip_window) = self.skip_window {
            config.chunker.skip_window = skip_window;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunker.chunk_size = chunk_size;
        }
        if let Some(mode) = self.mode {
            config.chunker.mode = mode.into();
        }
        if let Some(url) = &self.ollama_url {
            config.embedding.url = Url::parse(url)?;
        }
        if let Some(model) = &self.model {
            config.embedding.model = model.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Collect all files to process
    ///
    /// Expands directories and filters for supported file types.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in &self.input {
            if path.is_file() {
                files.push(path.clone());
            } else if path.is_dir() {
                files.extend(Self::find_documents(path));
            } else {
                warn!("Skipping invalid path: {:?}", path);
            }
        }

        if files.is_empty() {
            return Err(SdpmError::validation("No valid files found to process"));
        }

        info!("Found {} files to process", files.len());
        Ok(files)
    }

    /// Find all supported documents below a directory, in path order
    fn find_documents(dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn dry_run_report(config: &ChunkerConfig, path: &Path, content: &str) -> DryRunReport {
        let splitter = config.splitter();
        let counter = config.token_counter.counter();
        let spans = splitter.split(content);

        DryRunReport {
            source: path.display().to_string(),
            sentences: spans.len(),
            tokens: spans.iter().map(|s| counter.count_tokens(&s.text)).sum(),
            characters: content.chars().count(),
        }
    }

    async fn chunk_file(&self, chunker: &SdpmChunker, path: &Path) -> Result<ChunkReport> {
        let content = tokio::fs::read_to_string(path).await?;
        let source = path.display().to_string();
        let metadata = ChunkMetadata::new(source.clone(), &content);

        let mut chunks = chunker.chunk_document(&content, Some(metadata)).await?;
        if !self.include_embeddings {
            chunks.iter_mut().for_each(|chunk| chunk.strip_embeddings());
        }

        Ok(ChunkReport::new(source, chunks))
    }

    /// Write the chunk report for one input to the output directory
    ///
    /// Reports are named `<stem>_chunks.json`. When another input of the same
    /// run already took that name, a counter is added: `<stem>_2_chunks.json`.
    fn write_report(
        output_dir: &Path,
        file_path: &Path,
        report: &ChunkReport,
        written: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf> {
        let file_name = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        let mut output_path = output_dir.join(format!("{}_chunks.json", file_name));
        let mut counter = 2;
        while written.contains(&output_path) {
            output_path = output_dir.join(format!("{}_{}_chunks.json", file_name, counter));
            counter += 1;
        }

        std::fs::write(&output_path, serde_json::to_string_pretty(report)?)?;
        debug!("Wrote chunks to: {:?}", output_path);

        written.insert(output_path.clone());
        Ok(output_path)
    }

    fn print_summary(&self, total: usize, successful: usize, failed: usize, chunks: usize) {
        eprintln!();
        eprintln!("╔══════════════════════════════════════╗");
        eprintln!("║      Chunking Summary                ║");
        eprintln!("╠══════════════════════════════════════╣");
        eprintln!("║ Total files:      {:>18} ║", total);
        eprintln!("║ Successful:       {:>18} ║", successful);
        eprintln!("║ Failed:           {:>18} ║", failed);
        if !self.dry_run {
            eprintln!("║ Total chunks:     {:>18} ║", chunks);
        }
        eprintln!("╚══════════════════════════════════════╝");
    }
}

impl CliCommand for ChunkArgs {
    async fn execute(&self) -> Result<()> {
        info!("Starting document chunking");

        let config = self.build_config()?;
        let files = self.collect_files()?;

        info!("Configuration:");
        info!("  Threshold: {}", config.chunker.threshold);
        info!("  Skip window: {}", config.chunker.skip_window);
        info!("  Chunk size: {}", config.chunker.chunk_size);
        info!("  Model: {}", config.embedding.model);
        info!("  Dry run: {}", self.dry_run);

        let mut formatter = OutputFormatter::with_format(self.format, true);

        if self.dry_run {
            for path in &files {
                let content = tokio::fs::read_to_string(path).await?;
                formatter.output(&Self::dry_run_report(&config.chunker, path, &content))?;
            }
            self.print_summary(files.len(), files.len(), 0, 0);
            return Ok(());
        }

        if let Some(output_dir) = &self.output {
            if !output_dir.exists() {
                std::fs::create_dir_all(output_dir)?;
                info!("Created output directory: {:?}", output_dir);
            }
        }

        let provider = config.embedding.provider()?;
        let chunker = SdpmChunker::new(config.chunker, provider)?;

        let mut total_chunks = 0;
        let mut successful = 0;
        let mut first_error = None;
        let mut written = HashSet::new();

        for (index, file_path) in files.iter().enumerate() {
            info!(
                "Processing file {}/{}: {:?}",
                index + 1,
                files.len(),
                file_path
            );

            match self.chunk_file(&chunker, file_path).await {
                Ok(report) => {
                    total_chunks += report.chunk_count;
                    successful += 1;

                    match &self.output {
                        Some(output_dir) => {
                            Self::write_report(output_dir, file_path, &report, &mut written)?;
                        }
                        None => formatter.report(&report)?,
                    }
                }
                Err(e) => {
                    warn!("Failed to process {:?}: {}", file_path, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        let failed = files.len() - successful;
        self.print_summary(files.len(), successful, failed, total_chunks);

        match first_error {
            Some(e) => {
                warn!("{} files failed to process", failed);
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "chunk"
    }

    fn validate(&self) -> Result<()> {
        self.validate()
    }
}
