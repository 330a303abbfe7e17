//! Provider command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Provider subcommands
#[derive(Subcommand)]
pub enum ProviderCommands {
    /// List providers and their models
    List,
}

pub async fn handle_provider_command(command: ProviderCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        ProviderCommands::List => {
            let providers = client.list_providers().await?;

            if providers.is_empty() {
                println!("{}", "No providers available.".yellow());
            }
            for provider in providers {
                println!("  {} {}", "▸".cyan(), provider.name.bold());
                for model in &provider.models {
                    println!("    - {}", model.dimmed());
                }
            }
            Ok(())
        }
    }
}
