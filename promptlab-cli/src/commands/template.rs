//! Template command handlers
//!
//! Handles template creation, listing, viewing, editing (which adds a new
//! version), deletion and variable inspection.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use promptlab_client::PromptLabClient;
use promptlab_core::domain::template::{Template, TemplateVersion};
use promptlab_core::dto::Pagination;
use promptlab_core::dto::template::{CreateTemplate, UpdateTemplate};
use promptlab_core::placeholder::extract_variables;

use crate::config::Config;
use crate::id_resolver::resolve_template_id;

/// Template content given inline or read from a file
#[derive(Args)]
pub struct ContentSource {
    /// Template content
    #[arg(short, long, conflicts_with = "file")]
    content: Option<String>,

    /// Read template content from a file
    #[arg(short, long)]
    file: Option<String>,
}

impl ContentSource {
    fn read(self) -> Result<Option<String>> {
        match (self.content, self.file) {
            (Some(content), _) => Ok(Some(content)),
            (None, Some(path)) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template file: {}", path))
                .map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// Template subcommands
#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Create a new template
    Create {
        /// Template name
        #[arg(short, long)]
        name: String,

        /// Template description
        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        source: ContentSource,
    },
    /// List templates
    List {
        #[arg(long, default_value = "0")]
        skip: i64,

        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Get template details including its latest content
    Get {
        /// Template ID or unambiguous prefix
        id: String,
    },
    /// Update a template; new content creates a new version
    Update {
        /// Template ID or unambiguous prefix
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[command(flatten)]
        source: ContentSource,
    },
    /// Delete a template and all its versions
    Delete {
        /// Template ID or unambiguous prefix
        id: String,
    },
    /// List all versions of a template
    Versions {
        /// Template ID or unambiguous prefix
        id: String,
    },
    /// Show the variables a template expects
    Vars {
        /// Template ID or unambiguous prefix
        #[arg(required_unless_present = "file")]
        id: Option<String>,

        /// Inspect a local file instead of a stored template
        #[arg(short, long, conflicts_with = "id")]
        file: Option<String>,
    },
}

/// Handle template commands
pub async fn handle_template_command(command: TemplateCommands, config: &Config) -> Result<()> {
    // Local inspection needs no server
    if let TemplateCommands::Vars {
        file: Some(path), ..
    } = &command
    {
        return show_local_variables(path);
    }

    let client = config.client()?;

    match command {
        TemplateCommands::Create {
            name,
            description,
            source,
        } => create_template(&client, name, description, source).await,
        TemplateCommands::List { skip, limit } => {
            list_templates(&client, Pagination { skip, limit }).await
        }
        TemplateCommands::Get { id } => get_template(&client, &id).await,
        TemplateCommands::Update {
            id,
            name,
            description,
            source,
        } => update_template(&client, &id, name, description, source).await,
        TemplateCommands::Delete { id } => delete_template(&client, &id).await,
        TemplateCommands::Versions { id } => list_versions(&client, &id).await,
        TemplateCommands::Vars { id, .. } => match id {
            Some(id) => show_variables(&client, &id).await,
            None => bail!("either a template ID or --file is required"),
        },
    }
}

async fn create_template(
    client: &PromptLabClient,
    name: String,
    description: Option<String>,
    source: ContentSource,
) -> Result<()> {
    let Some(content) = source.read()? else {
        bail!("template content is required: pass --content or --file");
    };

    let template = client
        .create_template(CreateTemplate {
            name,
            description,
            content,
        })
        .await?;

    println!("{}", "✓ Template created successfully!".green().bold());
    println!("  ID:        {}", template.id.to_string().cyan());
    println!("  Name:      {}", template.name.bold());
    print_variables(&template.variables());

    Ok(())
}

async fn list_templates(client: &PromptLabClient, page: Pagination) -> Result<()> {
    let templates = client.list_templates(page).await?;

    if templates.is_empty() {
        println!("{}", "No templates found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} template(s):", templates.len()).bold()
        );
        println!();
        for template in templates {
            print_template_summary(&template);
        }
    }

    Ok(())
}

async fn get_template(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_template_id(client, id).await?;
    let template = client.get_template(uuid).await?;

    print_template_details(&template);

    Ok(())
}

async fn update_template(
    client: &PromptLabClient,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    source: ContentSource,
) -> Result<()> {
    let content = source.read()?;
    if name.is_none() && description.is_none() && content.is_none() {
        bail!("nothing to update: pass --name, --description, --content or --file");
    }

    let uuid = resolve_template_id(client, id).await?;
    let template = client
        .update_template(
            uuid,
            UpdateTemplate {
                name,
                description,
                content,
            },
        )
        .await?;

    println!("{}", "✓ Template updated successfully!".green().bold());
    println!(
        "  Version:   {}",
        template.latest_version.version_number.to_string().cyan()
    );

    Ok(())
}

async fn delete_template(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_template_id(client, id).await?;
    client.delete_template(uuid).await?;

    println!(
        "{}",
        format!("✓ Template {} deleted successfully!", uuid)
            .green()
            .bold()
    );

    Ok(())
}

async fn list_versions(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_template_id(client, id).await?;
    let versions = client.list_template_versions(uuid).await?;

    println!(
        "{}",
        format!("{} version(s) of template {}:", versions.len(), uuid).bold()
    );
    for version in versions {
        print_version(&version);
    }

    Ok(())
}

async fn show_variables(client: &PromptLabClient, id: &str) -> Result<()> {
    let uuid = resolve_template_id(client, id).await?;
    let vars = client.get_template_variables(uuid).await?;

    println!(
        "{}",
        format!("Template {} (version {})", uuid, vars.version_number).bold()
    );
    print_variables(&vars.variables);

    Ok(())
}

fn show_local_variables(path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file: {}", path))?;

    println!("{}", path.bold());
    print_variables(&extract_variables(&content));

    Ok(())
}

fn print_variables(variables: &[String]) {
    if variables.is_empty() {
        println!("  Variables: {}", "none".dimmed());
    } else {
        println!("  Variables: {}", variables.join(", ").cyan());
    }
}

fn print_template_summary(template: &Template) {
    println!("  {} {}", "▸".cyan(), template.name.bold());
    println!("    ID:      {}", template.id.to_string().dimmed());
    println!(
        "    Version: {}",
        template.latest_version.version_number.to_string().dimmed()
    );
    if let Some(desc) = &template.description {
        println!("    Description: {}", desc.dimmed());
    }
    println!();
}

fn print_template_details(template: &Template) {
    println!("{}", "Template Details:".bold());
    println!("  ID:          {}", template.id.to_string().cyan());
    println!("  Name:        {}", template.name.bold());
    if let Some(desc) = &template.description {
        println!("  Description: {}", desc);
    }
    println!(
        "  Version:     {}",
        template.latest_version.version_number
    );
    println!(
        "  Created:     {}",
        template.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(updated) = template.updated_at {
        println!("  Updated:     {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
    print_variables(&template.variables());

    println!("\n{}", "Content:".bold());
    println!("{}", "─".repeat(80).dimmed());
    println!("{}", template.latest_content());
    println!("{}", "─".repeat(80).dimmed());
}

fn print_version(version: &TemplateVersion) {
    println!(
        "\n  {} v{}  {}",
        "▸".cyan(),
        version.version_number.to_string().bold(),
        version
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    for line in version.content.lines() {
        println!("    {}", line);
    }
}
