use pulseboard_core::models::{NewAccessEntry, ProfilePatch, Repetition, TaskLink, TaskStatus};
use serde_json::Value;

/// Fields accepted by `access add` and `access update`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessFields {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub details: Option<Value>,
    pub icon: Option<String>,
    pub order: Option<i64>,
}

impl From<AccessFields> for NewAccessEntry {
    fn from(fields: AccessFields) -> Self {
        NewAccessEntry {
            name: fields.name,
            kind: fields.kind,
            description: fields.description,
            status: fields.status,
            details: fields.details,
            icon: fields.icon,
            order: fields.order,
        }
    }
}

/// CLI command parsed from arguments
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// List tasks, optionally only one status
    ListTasks { status: Option<TaskStatus> },
    /// Create a task
    AddTask {
        description: String,
        title: Option<String>,
        repetition: Option<Repetition>,
    },
    /// Move a task to in_progress
    StartTask { id: String },
    /// Move a task to completed, with optional notes and links
    CompleteTask {
        id: String,
        notes: Option<String>,
        links: Vec<TaskLink>,
    },
    /// Move a task back to pending
    ResetTask { id: String },
    /// Change description and/or repetition
    EditTask {
        id: String,
        description: Option<String>,
        repetition: Option<Option<Repetition>>,
    },
    DeleteTask { id: String },
    /// Heartbeat and its markdown content
    ShowHeartbeat,
    /// Replace the heartbeat markdown content
    SetHeartbeatContent { content: String },
    /// Ask the assistant to adopt a new heartbeat interval
    SetHeartbeatInterval { minutes: u32 },
    ShowProfile,
    SetProfile { patch: ProfilePatch },
    ListAccess,
    AddAccess { fields: AccessFields },
    UpdateAccess { id: String, fields: AccessFields },
    DeleteAccess { id: String },
    /// File an access request as a task for the assistant
    RequestAccess { request: String },
    /// Wipe everything on the worker
    Reset,
    /// Public worker manifest
    Discover,
}

impl CliCommand {
    /// Commands that change data on the worker
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            CliCommand::ListTasks { .. }
                | CliCommand::ShowHeartbeat
                | CliCommand::ShowProfile
                | CliCommand::ListAccess
                | CliCommand::Discover
        )
    }
}

/// Parse `title=url` into a link; a bare url is its own title
pub fn parse_link(raw: &str) -> Result<TaskLink, String> {
    let (title, url) = match raw.split_once('=') {
        Some((title, url)) => (title.trim(), url.trim()),
        None => (raw.trim(), raw.trim()),
    };
    if url.is_empty() {
        return Err(format!("Invalid link '{}', expected title=url", raw));
    }
    Ok(TaskLink {
        url: url.to_string(),
        title: if title.is_empty() { url } else { title }.to_string(),
    })
}

/// Parse a repetition value, where `none` clears it
pub fn parse_repetition_change(raw: &str) -> Result<Option<Repetition>, String> {
    match raw {
        "none" | "" => Ok(None),
        other => other.parse().map(Some),
    }
}
