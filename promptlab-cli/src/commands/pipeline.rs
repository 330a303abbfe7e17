//! Pipeline command handlers
//!
//! Handles all pipeline-related CLI commands including creation,
//! listing, viewing, deletion, running and execution history.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use promptlab_client::PromptLabClient;
use promptlab_core::domain::execution::{PipelineExecution, StepExecution};
use promptlab_core::domain::pipeline::Pipeline;
use promptlab_core::dto::Pagination;
use promptlab_core::dto::pipeline::{CreatePipeline, CreatePipelineStep, UpdatePipeline};
use std::collections::HashMap;

use super::colorize_status;
use crate::config::Config;
use crate::id_resolver::{resolve_pipeline_execution_id, resolve_pipeline_id};
use crate::types::{parse_key_val, parse_step};

/// Step list given inline or as a JSON file
#[derive(Args)]
pub struct StepSource {
    /// Step as TEMPLATE_ID:PROVIDER:MODEL:OUTPUT_VARIABLE, repeatable, in run order
    #[arg(short, long = "step", value_parser = parse_step, conflicts_with = "steps_file")]
    steps: Vec<CreatePipelineStep>,

    /// JSON file holding an array of steps
    #[arg(long)]
    steps_file: Option<String>,
}

impl StepSource {
    fn read(self) -> Result<Option<Vec<CreatePipelineStep>>> {
        if let Some(path) = self.steps_file {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read steps file: {}", path))?;
            let steps = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse steps file: {}", path))?;
            return Ok(Some(steps));
        }

        if self.steps.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.steps))
        }
    }
}

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a new pipeline
    Create {
        /// Pipeline name
        #[arg(short, long)]
        name: String,

        /// Pipeline description
        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        steps: StepSource,
    },
    /// List pipelines
    List {
        #[arg(long, default_value = "0")]
        skip: i64,

        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Get pipeline details
    Get {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Update a pipeline; given steps replace the current ones
    Update {
        /// Pipeline ID or unambiguous prefix
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        steps: StepSource,
    },
    /// Delete a pipeline; its execution history is kept
    Delete {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Run a pipeline and wait for the result
    Run {
        /// Pipeline ID or unambiguous prefix
        id: String,

        /// Input variables as key=value pairs (e.g., -v text="Bonjour le monde")
        #[arg(short = 'v', long = "var", value_parser = parse_key_val)]
        vars: Vec<(String, String)>,
    },
    /// Show execution history
    History {
        /// Pipeline ID or prefix; omit for all pipelines
        id: Option<String>,

        /// Show a single execution in full
        #[arg(short, long, conflicts_with = "id")]
        execution: Option<String>,

        #[arg(long, default_value = "0")]
        skip: i64,

        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        PipelineCommands::Create {
            name,
            description,
            steps,
        } => create_pipeline(&client, name, description, steps).await,
        PipelineCommands::List { skip, limit } => {
            list_pipelines(&client, Pagination { skip, limit }).await
        }
        PipelineCommands::Get { id } => get_pipeline(&client, &id).await,
        PipelineCommands::Update {
            id,
            name,
            description,
            steps,
        } => update_pipeline(&client, &id, name, description, steps).await,
        PipelineCommands::Delete { id } => delete_pipeline(&client, &id).await,
        PipelineCommands::Run { id, vars } => run_pipeline(&client, &id, vars).await,
        PipelineCommands::History {
            id,
            execution,
            skip,
            limit,
        } => match execution {
            Some(execution_id) => get_execution(&client, &execution_id).await,
            None => show_history(&client, id.as_deref(), Pagination { skip, limit }).await,
        },
    }
}

async fn create_pipeline(
    client: &PromptLabClient,
    name: String,
    description: Option<String>,
    steps: StepSource,
) -> Result<()> {
    let Some(steps) = steps.read()? else {
        bail!("a pipeline needs at least one step: pass --step or --steps-file");
    };

    let pipeline = client
        .create_pipeline(CreatePipeline {
            name,
            description,
            steps,
        })
        .await?;

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:     {}", pipeline.id.to_string().cyan());
    println!("  Name:   {}", pipeline.name.bold());
    println!(
        "  Steps:  {}",
        pipeline
            .steps
            .iter()
            .map(|s| s.output_variable.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
            .dimmed()
    );

    Ok(())
}

async fn list_pipelines(client: &PromptLabClient, page: Pagination) -> Result<()> {
    let pipelines = client.list_pipelines(page).await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} pipeline(s):", pipelines.len()).bold()
        );
        println!();
        for pipeline in pipelines {
            print_pipeline_summary(&pipeline);
        }
    }

    Ok(())
}

async fn get_pipeline(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;
    let pipeline = client.get_pipeline(uuid).await?;

    print_pipeline_details(&pipeline);

    Ok(())
}

async fn update_pipeline(
    client: &PromptLabClient,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    steps: StepSource,
) -> Result<()> {
    let steps = steps.read()?;
    if name.is_none() && description.is_none() && steps.is_none() {
        bail!("nothing to update: pass --name, --description, --step or --steps-file");
    }

    let uuid = resolve_pipeline_id(client, id).await?;
    let pipeline = client
        .update_pipeline(
            uuid,
            UpdatePipeline {
                name,
                description,
                steps,
            },
        )
        .await?;

    println!("{}", "✓ Pipeline updated successfully!".green().bold());
    print_pipeline_details(&pipeline);

    Ok(())
}

async fn delete_pipeline(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;
    client.delete_pipeline(uuid).await?;

    println!(
        "{}",
        format!("✓ Pipeline {} deleted successfully!", uuid)
            .green()
            .bold()
    );

    Ok(())
}

async fn run_pipeline(
    client: &PromptLabClient,
    id: &str,
    vars: Vec<(String, String)>,
) -> Result<()> {
    let uuid = resolve_pipeline_id(client, id).await?;
    let variables: HashMap<String, String> = vars.into_iter().collect();

    println!("{}", format!("Running pipeline {}...", uuid).dimmed());
    let execution = match client.execute_pipeline(uuid, variables).await {
        Ok(execution) => execution,
        Err(e) if e.is_unprocessable() => bail!(
            "Pipeline {} cannot run: {}",
            uuid,
            e.server_message().unwrap_or_default()
        ),
        Err(e) => return Err(e.into()),
    };

    print_execution_details(&execution);

    Ok(())
}

async fn show_history(client: &PromptLabClient, id: Option<&str>, page: Pagination) -> Result<()> {
    let executions = match id {
        Some(id) => {
            let uuid = resolve_pipeline_id(client, id).await?;
            client.list_pipeline_executions(uuid, page).await?
        }
        None => client.list_all_pipeline_executions(page).await?,
    };

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
        print_execution_summary(&execution);
    }

    Ok(())
}

async fn get_execution(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_execution_id(client, id).await?;
    let execution = client.get_pipeline_execution(uuid).await?;

    print_execution_details(&execution);

    Ok(())
}

fn print_pipeline_summary(pipeline: &Pipeline) {
    println!("  {} {}", "▸".cyan(), pipeline.name.bold());
    println!("    ID:      {}", pipeline.id.to_string().dimmed());
    println!("    Steps:   {}", pipeline.steps.len().to_string().dimmed());
    println!(
        "    Created: {}",
        pipeline
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(desc) = &pipeline.description {
        println!("    Description: {}", desc.dimmed());
    }
    println!();
}

fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!("  ID:          {}", pipeline.id.to_string().cyan());
    println!("  Name:        {}", pipeline.name.bold());
    if let Some(desc) = &pipeline.description {
        println!("  Description: {}", desc);
    }
    println!(
        "  Created:     {}",
        pipeline.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(updated) = pipeline.updated_at {
        println!("  Updated:     {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }

    println!("\n{}", "Steps:".bold());
    for step in &pipeline.steps {
        println!(
            "  {}. {} {} {}/{} → {}",
            step.order,
            "template".dimmed(),
            step.template_id,
            step.provider.cyan(),
            step.model.cyan(),
            step.output_variable.bold()
        );
    }
}

fn print_execution_summary(execution: &PipelineExecution) {
    let done = execution
        .step_executions
        .iter()
        .filter(|s| s.status.is_terminal())
        .count();

    println!(
        "  {} Execution {}",
        "▸".cyan(),
        execution.id.to_string().dimmed()
    );
    println!("    Pipeline: {}", execution.pipeline_id.to_string().dimmed());
    println!("    Status:   {}", colorize_status(execution.status));
    println!(
        "    Steps:    {}/{}",
        done,
        execution.step_executions.len()
    );
    println!(
        "    Created:  {}",
        execution
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

fn print_execution_details(execution: &PipelineExecution) {
    println!("{}", "Execution Details:".bold());
    println!("  ID:          {}", execution.id.to_string().cyan());
    println!("  Pipeline ID: {}", execution.pipeline_id.to_string().dimmed());
    println!("  Status:      {}", colorize_status(execution.status));
    println!(
        "  Created:     {}",
        execution.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(completed) = execution.completed_at {
        println!("  Completed:   {}", completed.format("%Y-%m-%d %H:%M:%S"));
        let duration = completed.signed_duration_since(execution.created_at);
        println!("  Duration:    {}ms", duration.num_milliseconds());
    }

    if !execution.variables.is_empty() {
        println!("\n{}", "Variables:".bold());
        let mut keys: Vec<_> = execution.variables.keys().collect();
        keys.sort();
        for key in keys {
            println!("  {} = {}", key.cyan(), execution.variables[key]);
        }
    }

    for step in &execution.step_executions {
        print_step(step);
    }
}

fn print_step(step: &StepExecution) {
    println!(
        "\n{} {}  [{}]",
        "Step".bold(),
        step.step_order.to_string().bold(),
        colorize_status(step.status)
    );

    if let Some(prompt) = &step.input_prompt {
        println!("  {}", "Prompt:".dimmed());
        for line in prompt.lines() {
            println!("    {}", line.dimmed());
        }
    }
    if let Some(output) = &step.output {
        println!("  {}", "Output:".dimmed());
        for line in output.lines() {
            println!("    {}", line);
        }
    }
    if let Some(error) = &step.error {
        println!("  {} {}", "Error:".red(), error.red());
    }
}
