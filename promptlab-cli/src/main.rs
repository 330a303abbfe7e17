//! PromptLab CLI
//!
//! Command-line interface for managing templates and pipelines on a
//! PromptLab server and running them against LLM providers.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "promptlab")]
#[command(about = "PromptLab prompt template and pipeline CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(
        long,
        env = "PROMPTLAB_SERVER_URL",
        default_value = "http://localhost:8080"
    )]
    server_url: String,

    /// Request timeout in seconds; pipeline runs block until every step finishes
    #[arg(long, env = "PROMPTLAB_TIMEOUT", default_value = "600")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        timeout_secs: cli.timeout,
    };

    handle_command(cli.command, &config).await
}
