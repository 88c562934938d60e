use std::sync::Arc;

use anyhow::{bail, Context, Result};
use pulseboard_core::models::{NewTask, StatusExtras, TaskUpdate};
use pulseboard_core::views::{HeartbeatPanel, SettingsPanel};
use pulseboard_core::{Gateway, Store};
use serde_json::{json, Value};

use super::command::CliCommand;

/// Run one command against the worker and return its JSON result.
///
/// Commands that go through a panel use a throwaway in-memory store so the
/// CLI never touches the dashboard's saved preferences.
pub async fn execute<G: Gateway>(gateway: Arc<G>, command: CliCommand) -> Result<Value> {
    if command.is_mutation() {
        tracing::info!(?command, "executing");
    } else {
        tracing::debug!(?command, "executing");
    }

    let value = match command {
        CliCommand::ListTasks { status } => {
            let tasks = gateway.list_tasks().await?;
            let tasks: Vec<_> = tasks
                .into_iter()
                .filter(|t| status.map_or(true, |s| t.status == s))
                .collect();
            serde_json::to_value(tasks)?
        }

        CliCommand::AddTask {
            description,
            title,
            repetition,
        } => {
            if description.trim().is_empty() {
                bail!("Please enter a task description");
            }
            let task = gateway
                .create_task(NewTask {
                    title,
                    description: Some(description),
                    repetition,
                })
                .await?;
            serde_json::to_value(task)?
        }

        CliCommand::StartTask { id } => serde_json::to_value(gateway.start_task(&id).await?)?,

        CliCommand::CompleteTask { id, notes, links } => {
            let extras = StatusExtras {
                notes,
                links: (!links.is_empty()).then_some(links),
            };
            serde_json::to_value(gateway.complete_task(&id, extras).await?)?
        }

        CliCommand::ResetTask { id } => serde_json::to_value(gateway.reset_task(&id).await?)?,

        CliCommand::EditTask {
            id,
            description,
            repetition,
        } => {
            if description.is_none() && repetition.is_none() {
                bail!("Nothing to change: pass --description and/or --repetition");
            }
            if description.as_deref().is_some_and(|d| d.trim().is_empty()) {
                bail!("Please enter a task description");
            }
            let task = gateway
                .update_task(
                    &id,
                    TaskUpdate {
                        description,
                        repetition,
                    },
                )
                .await?;
            serde_json::to_value(task)?
        }

        CliCommand::DeleteTask { id } => {
            gateway.delete_task(&id).await?;
            json!({ "deleted": id })
        }

        CliCommand::ShowHeartbeat => {
            let (heartbeat, content) =
                tokio::join!(gateway.get_heartbeat(), gateway.get_heartbeat_content());
            json!({
                "heartbeat": heartbeat?,
                "content": content?,
            })
        }

        CliCommand::SetHeartbeatContent { content } => {
            let saved = gateway.update_heartbeat_content(&content).await?;
            json!({ "content": saved })
        }

        CliCommand::SetHeartbeatInterval { minutes } => {
            let panel = HeartbeatPanel::new(Arc::new(Store::in_memory()), gateway);
            // Keep agent-supplied fields when writing the new interval back
            panel
                .load()
                .await
                .context("Failed to read the current heartbeat")?;
            serde_json::to_value(panel.change_interval(minutes).await?)?
        }

        CliCommand::ShowProfile => serde_json::to_value(gateway.get_assistant_profile().await?)?,

        CliCommand::SetProfile { patch } => {
            if patch.is_empty() {
                bail!("Nothing to change: pass at least one profile field");
            }
            let mut profile = gateway.get_assistant_profile().await?;
            profile.merge(patch);
            serde_json::to_value(gateway.update_assistant_profile(&profile).await?)?
        }

        CliCommand::ListAccess => serde_json::to_value(gateway.list_access().await?)?,

        CliCommand::AddAccess { fields } => {
            if fields.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                bail!("Access entries need a name");
            }
            serde_json::to_value(gateway.create_access(fields.into()).await?)?
        }

        CliCommand::UpdateAccess { id, fields } => {
            serde_json::to_value(gateway.update_access(&id, fields.into()).await?)?
        }

        CliCommand::DeleteAccess { id } => {
            gateway.delete_access(&id).await?;
            json!({ "deleted": id })
        }

        CliCommand::RequestAccess { request } => {
            let panel = SettingsPanel::new(Arc::new(Store::in_memory()), gateway);
            panel.submit_access_request(&request).await?;
            json!({ "requested": request.trim() })
        }

        CliCommand::Reset => {
            gateway.reset().await?;
            json!({ "reset": true })
        }

        CliCommand::Discover => gateway.discover().await?,
    };

    Ok(value)
}
