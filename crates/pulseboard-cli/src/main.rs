use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulseboard_cli::cli::command::{parse_link, parse_repetition_change};
use pulseboard_cli::cli::{execute, render_json, AccessFields, CliCommand};
use pulseboard_core::config::DashboardConfig;
use pulseboard_core::logging::{init_logging, LogTarget};
use pulseboard_core::models::{ProfilePatch, Repetition, TaskLink, TaskStatus};
use pulseboard_core::HttpGateway;

#[derive(Parser)]
#[command(name = "pulseboard-cli")]
#[command(about = "Command-line client for the pulseboard worker")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (workerUrl, apiKey)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, transition and remove tasks
    #[command(subcommand)]
    Tasks(TaskCommands),

    /// Read or update the heartbeat
    #[command(subcommand)]
    Heartbeat(HeartbeatCommands),

    /// Read or update the assistant profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Manage access entries
    #[command(subcommand)]
    Access(AccessCommands),

    /// Write worker URL and API key to the config file
    Init {
        /// Worker base URL
        #[arg(long)]
        worker_url: String,
        /// API key sent as a Bearer token
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Delete all tasks, access entries, heartbeat and profile on the worker
    Reset {
        /// Required, the reset cannot be undone
        #[arg(long)]
        yes: bool,
    },

    /// Show the worker's public API manifest
    Discover,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks, newest first
    List {
        /// Only tasks with this status (pending, in_progress, completed)
        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// Add a pending task
    Add {
        /// What the assistant should do
        description: String,
        /// Short title (defaults to the start of the description)
        #[arg(long)]
        title: Option<String>,
        /// every-hour, few-times-daily, twice-daily, daily, weekly, monthly
        #[arg(long)]
        repetition: Option<Repetition>,
    },

    /// Mark a task in progress
    Start { id: String },

    /// Mark a task completed
    Complete {
        id: String,
        /// Outcome notes, replaces existing notes
        #[arg(long)]
        notes: Option<String>,
        /// Link as title=url, repeatable
        #[arg(long = "link", value_parser = parse_link)]
        links: Vec<TaskLink>,
    },

    /// Move a task back to pending
    Reset { id: String },

    /// Change a task's description or repetition
    Edit {
        id: String,
        #[arg(long)]
        description: Option<String>,
        /// New repetition, or `none` to make it one-off
        #[arg(long)]
        repetition: Option<String>,
    },

    /// Delete a task
    Delete { id: String },
}

#[derive(Subcommand)]
enum HeartbeatCommands {
    /// Show the heartbeat and its markdown content
    Show,

    /// Replace the heartbeat markdown content
    SetContent {
        /// Markdown text, or `-` to read stdin
        content: String,
    },

    /// Ask the assistant to check in every N minutes (15, 30, 60, 120, 360)
    SetInterval { minutes: u32 },
}

#[derive(Subcommand)]
enum ProfileCommands {
    Show,

    /// Update selected profile fields
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        initials: Option<String>,
        /// Avatar URL, or an empty string to remove it
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Hex color, e.g. #3b82f6
        #[arg(long)]
        color: Option<String>,
    },
}

#[derive(clap::Args)]
struct AccessArgs {
    #[arg(long)]
    name: Option<String>,
    /// Category, e.g. Email or Calendar
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// active, pending or revoked
    #[arg(long)]
    status: Option<String>,
    /// Free-form JSON details
    #[arg(long)]
    details: Option<String>,
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    order: Option<i64>,
}

impl AccessArgs {
    fn into_fields(self) -> Result<AccessFields> {
        let details = self
            .details
            .map(|raw| serde_json::from_str(&raw).context("--details must be valid JSON"))
            .transpose()?;
        Ok(AccessFields {
            name: self.name,
            kind: self.kind,
            description: self.description,
            status: self.status,
            details,
            icon: self.icon,
            order: self.order,
        })
    }
}

#[derive(Subcommand)]
enum AccessCommands {
    List,

    /// Add an access entry
    Add(AccessArgs),

    /// Update fields of an access entry
    Update {
        id: String,
        #[command(flatten)]
        fields: AccessArgs,
    },

    /// Remove an access entry
    Rm { id: String },

    /// Ask the assistant for an access change
    Request { request: String },
}

fn read_content(content: String) -> Result<String> {
    if content == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")
    } else {
        Ok(content)
    }
}

fn to_command(command: Commands) -> Result<CliCommand> {
    let command = match command {
        Commands::Tasks(cmd) => match cmd {
            TaskCommands::List { status } => CliCommand::ListTasks { status },
            TaskCommands::Add {
                description,
                title,
                repetition,
            } => CliCommand::AddTask {
                description,
                title,
                repetition,
            },
            TaskCommands::Start { id } => CliCommand::StartTask { id },
            TaskCommands::Complete { id, notes, links } => {
                CliCommand::CompleteTask { id, notes, links }
            }
            TaskCommands::Reset { id } => CliCommand::ResetTask { id },
            TaskCommands::Edit {
                id,
                description,
                repetition,
            } => CliCommand::EditTask {
                id,
                description,
                repetition: repetition
                    .as_deref()
                    .map(parse_repetition_change)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
            },
            TaskCommands::Delete { id } => CliCommand::DeleteTask { id },
        },
        Commands::Heartbeat(cmd) => match cmd {
            HeartbeatCommands::Show => CliCommand::ShowHeartbeat,
            HeartbeatCommands::SetContent { content } => CliCommand::SetHeartbeatContent {
                content: read_content(content)?,
            },
            HeartbeatCommands::SetInterval { minutes } => {
                CliCommand::SetHeartbeatInterval { minutes }
            }
        },
        Commands::Profile(cmd) => match cmd {
            ProfileCommands::Show => CliCommand::ShowProfile,
            ProfileCommands::Set {
                name,
                initials,
                avatar,
                description,
                color,
            } => CliCommand::SetProfile {
                patch: ProfilePatch {
                    name,
                    initials,
                    avatar: avatar.map(|a| Some(a).filter(|a| !a.is_empty())),
                    description,
                    color,
                },
            },
        },
        Commands::Access(cmd) => match cmd {
            AccessCommands::List => CliCommand::ListAccess,
            AccessCommands::Add(args) => CliCommand::AddAccess {
                fields: args.into_fields()?,
            },
            AccessCommands::Update { id, fields } => CliCommand::UpdateAccess {
                id,
                fields: fields.into_fields()?,
            },
            AccessCommands::Rm { id } => CliCommand::DeleteAccess { id },
            AccessCommands::Request { request } => CliCommand::RequestAccess { request },
        },
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset without --yes");
            }
            CliCommand::Reset
        }
        Commands::Discover => CliCommand::Discover,
        Commands::Init { .. } => anyhow::bail!("init is handled locally"),
    };
    Ok(command)
}

fn init_config(path: Option<&Path>, worker_url: String, api_key: Option<String>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => DashboardConfig::default_path().context("No config directory on this platform")?,
    };
    let mut config = if path.exists() {
        DashboardConfig::load(&path)?
    } else {
        DashboardConfig::default()
    };
    config.worker_url = Some(worker_url.trim_end_matches('/').to_string());
    if api_key.is_some() {
        config.api_key = api_key;
    }
    config.save(&path)?;
    Ok(path)
}

async fn run(cli: Cli) -> Result<String> {
    if let Commands::Init {
        worker_url,
        api_key,
    } = cli.command
    {
        let path = init_config(cli.config.as_deref(), worker_url, api_key)?;
        return Ok(render_json(
            &serde_json::json!({ "config": path.display().to_string() }),
            cli.pretty,
        ));
    }

    let config = DashboardConfig::resolve(cli.config.as_deref())?;
    let command = to_command(cli.command)?;
    let gateway = Arc::new(HttpGateway::from_config(&config));
    let value = execute(gateway, command).await?;
    Ok(render_json(&value, cli.pretty))
}

#[tokio::main]
async fn main() {
    init_logging("pulseboard-cli", LogTarget::Stderr);
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
