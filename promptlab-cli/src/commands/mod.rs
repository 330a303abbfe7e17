//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod execution;
mod pipeline;
mod provider;
mod template;

pub use execution::ExecutionCommands;
pub use pipeline::PipelineCommands;
pub use provider::ProviderCommands;
pub use template::TemplateCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use promptlab_core::domain::execution::ExecutionStatus;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Template management
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Pipeline management and runs
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Single-template runs
    Execution {
        #[command(subcommand)]
        command: ExecutionCommands,
    },
    /// Provider discovery
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Template { command } => template::handle_template_command(command, config).await,
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Execution { command } => {
            execution::handle_execution_command(command, config).await
        }
        Commands::Provider { command } => provider::handle_provider_command(command, config).await,
    }
}

/// Colorize an execution status for display
pub(crate) fn colorize_status(status: ExecutionStatus) -> ColoredString {
    let status_str = status.as_str();
    match status {
        ExecutionStatus::Pending => status_str.dimmed(),
        ExecutionStatus::Running => status_str.cyan(),
        ExecutionStatus::Completed => status_str.green(),
        ExecutionStatus::Failed => status_str.red(),
    }
}
