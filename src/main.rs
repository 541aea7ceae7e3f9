//! SDPM - Semantic Double-Pass Merging chunker
//!
//! Splits documents into semantically coherent, size-bounded chunks using
//! sentence embeddings from an Ollama server.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sdpm_cli::{
    execute_command, exit_code_for_error, resolve_logging, ChunkArgs, LogFormat, ValidateCommand,
};
use sdpm_core::{SdpmConfig, SdpmError};
use std::path::Path;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sdpm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SDPM - semantic chunking with double-pass merging")]
#[command(long_about = r#"
SDPM splits documents into chunks of semantically related sentences.

Adjacent sentences that are similar are grouped first. A second pass then
reunites groups about the same topic that were separated by a short
digression, such as a code sample or a quote, before size-bounded chunks
are assembled.

Configuration is read from an optional YAML/JSON file and SDPM__* environment
variables, e.g. SDPM__CHUNKER__SKIP_WINDOW=2.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (overrides the configured `logging.format`)
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk documents into semantic chunks
    Chunk(ChunkArgs),

    /// Validate configuration and embedding service access
    Validate(ValidateCommand),

    /// Show version information
    Version,
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Self::Chunk(args) => args.config.as_deref(),
            Self::Validate(cmd) => cmd.config.as_deref(),
            Self::Version => None,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let sdpm_error = e.downcast_ref::<SdpmError>();
        match sdpm_error {
            Some(err) => error!(category = %err.category(), "{:#}", e),
            None => error!("{:#}", e),
        }
        eprintln!("Error: {:#}", e);

        std::process::exit(sdpm_error.map(exit_code_for_error).unwrap_or(1));
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An unreadable config is reported by the command itself
    let configured = SdpmConfig::load(cli.command.config_path())
        .map(|config| config.logging)
        .unwrap_or_default();
    let logging = resolve_logging(configured, cli.verbose, cli.log_format);
    sdpm_core::init_logging_with_config(&logging.level, &logging.format)
        .context("Failed to initialize logging")?;

    info!("Starting SDPM v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Chunk(args) => execute_command(args).await?,
        Commands::Validate(cmd) => execute_command(cmd).await?,
        Commands::Version => handle_version(),
    }

    Ok(())
}

fn handle_version() {
    println!("{}", sdpm_core::version_info());
    println!("CLI version: {}", sdpm_cli::VERSION);
}
