//! CLI commands module

use sdpm_core::Result;

pub mod chunk;
pub mod validate;

pub use chunk::*;
pub use validate::*;

/// Base trait for CLI commands
#[allow(async_fn_in_trait)]
pub trait CliCommand {
    /// Execute the command
    async fn execute(&self) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;

    /// Validate command arguments
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Common command execution wrapper
pub async fn execute_command<T: CliCommand>(command: T) -> Result<()> {
    tracing::info!("Executing command: {}", command.name());

    // Validate command
    command.validate()?;

    // Execute command
    command.execute().await?;

    tracing::info!("Command {} completed successfully", command.name());
    Ok(())
}
