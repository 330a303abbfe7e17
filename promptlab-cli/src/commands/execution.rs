//! Single-template execution command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use promptlab_client::PromptLabClient;
use promptlab_core::domain::execution::TemplateExecution;
use promptlab_core::dto::Pagination;
use promptlab_core::dto::execution::ExecuteTemplate;

use super::colorize_status;
use crate::config::Config;
use crate::id_resolver::{resolve_template_execution_id, resolve_template_id};
use crate::types::parse_key_val;

/// Execution subcommands
#[derive(Subcommand)]
pub enum ExecutionCommands {
    /// Run one template against a provider
    Run {
        /// Template ID or unambiguous prefix
        template: String,

        #[arg(short, long, default_value = "mock")]
        provider: String,

        #[arg(short, long, default_value = "mock-model")]
        model: String,

        /// Variables as key=value pairs
        #[arg(short = 'v', long = "var", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// List single-template executions
    List {
        #[arg(long, default_value = "0")]
        skip: i64,

        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Get execution details
    Get {
        /// Execution ID or unambiguous prefix
        id: String,
    },
}

pub async fn handle_execution_command(command: ExecutionCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        ExecutionCommands::Run {
            template,
            provider,
            model,
            vars,
        } => run_template(&client, &template, provider, model, vars).await,
        ExecutionCommands::List { skip, limit } => {
            list_executions(&client, Pagination { skip, limit }).await
        }
        ExecutionCommands::Get { id } => {
            let uuid = resolve_template_execution_id(&client, &id).await?;
            let execution = client.get_template_execution(uuid).await?;
            print_execution_details(&execution);
            Ok(())
        }
    }
}

async fn run_template(
    client: &PromptLabClient,
    template: &str,
    provider: String,
    model: String,
    vars: Vec<(String, String)>,
) -> Result<()> {
    let template_id = resolve_template_id(client, template).await?;

    let execution = client
        .execute_template(ExecuteTemplate {
            template_id,
            provider,
            model,
            variables: vars.into_iter().collect(),
        })
        .await?;

    print_execution_details(&execution);

    Ok(())
}

async fn list_executions(client: &PromptLabClient, page: Pagination) -> Result<()> {
    let executions = client.list_template_executions(page).await?;

    if executions.is_empty() {
        println!("{}", "No executions found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} execution(s):", executions.len()).bold()
    );
    println!();
    for execution in executions {
        println!(
            "  {} {} v{}  [{}]",
            "▸".cyan(),
            execution.template_name.bold(),
            execution.template_version,
            colorize_status(execution.status)
        );
        println!("    ID:       {}", execution.id.to_string().dimmed());
        println!(
            "    Provider: {}",
            format!("{}/{}", execution.provider, execution.model).dimmed()
        );
        println!();
    }

    Ok(())
}

fn print_execution_details(execution: &TemplateExecution) {
    println!("{}", "Execution Details:".bold());
    println!("  ID:       {}", execution.id.to_string().cyan());
    println!(
        "  Template: {} (v{})",
        execution.template_name.bold(),
        execution.template_version
    );
    println!("  Provider: {}/{}", execution.provider, execution.model);
    println!("  Status:   {}", colorize_status(execution.status));

    if let Some(prompt) = &execution.input_prompt {
        println!("\n{}", "Prompt:".bold());
        println!("{}", prompt.dimmed());
    }
    if let Some(output) = &execution.output {
        println!("\n{}", "Output:".bold());
        println!("{}", output);
    }
    if let Some(error) = &execution.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }
}
