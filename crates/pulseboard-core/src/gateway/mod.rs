//! Access to the worker API.
//!
//! [`Gateway`] is the seam every controller talks through. [`HttpGateway`]
//! speaks the worker's REST protocol; [`MemoryGateway`] implements the same
//! semantics in process for tests and offline demos.

pub mod http;
pub mod memory;

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

pub use crate::models::{NewTask, StatusExtras, TaskUpdate};
use crate::models::{
    AccessEntry, AssistantProfile, Heartbeat, NewAccessEntry, Task, TaskStatus,
};
pub use http::HttpGateway;
pub use memory::MemoryGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Worker URL not configured. Set workerUrl in the config file or PULSEBOARD_WORKER_URL.")]
    NotConfigured,

    #[error("Invalid worker URL '{0}'")]
    InvalidUrl(String),

    #[error("Unauthorized: check the API key")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// Missing configuration gets a setup prompt rather than an error banner
    pub fn is_configuration(&self) -> bool {
        matches!(self, GatewayError::NotConfigured | GatewayError::InvalidUrl(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized => Some(401),
            GatewayError::NotFound(_) => Some(404),
            GatewayError::Remote { status, .. } => Some(*status),
            GatewayError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// One method per worker endpoint. Timestamps come back as `DateTime<Utc>`.
pub trait Gateway: Send + Sync + 'static {
    fn list_tasks(&self) -> impl Future<Output = GatewayResult<Vec<Task>>> + Send;

    fn create_task(&self, task: NewTask) -> impl Future<Output = GatewayResult<Task>> + Send;

    fn update_task(
        &self,
        id: &str,
        update: TaskUpdate,
    ) -> impl Future<Output = GatewayResult<Task>> + Send;

    /// `extras.notes` replaces the task's notes, `extras.links` are appended
    fn update_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        extras: StatusExtras,
    ) -> impl Future<Output = GatewayResult<Task>> + Send;

    fn delete_task(&self, id: &str) -> impl Future<Output = GatewayResult<()>> + Send;

    fn get_heartbeat(&self) -> impl Future<Output = GatewayResult<Heartbeat>> + Send;

    fn update_heartbeat(
        &self,
        heartbeat: &Heartbeat,
    ) -> impl Future<Output = GatewayResult<Heartbeat>> + Send;

    /// Empty string when nothing was ever pushed
    fn get_heartbeat_content(&self) -> impl Future<Output = GatewayResult<String>> + Send;

    fn update_heartbeat_content(
        &self,
        content: &str,
    ) -> impl Future<Output = GatewayResult<String>> + Send;

    fn get_assistant_profile(&self)
        -> impl Future<Output = GatewayResult<AssistantProfile>> + Send;

    fn update_assistant_profile(
        &self,
        profile: &AssistantProfile,
    ) -> impl Future<Output = GatewayResult<AssistantProfile>> + Send;

    fn list_access(&self) -> impl Future<Output = GatewayResult<Vec<AccessEntry>>> + Send;

    fn create_access(
        &self,
        entry: NewAccessEntry,
    ) -> impl Future<Output = GatewayResult<AccessEntry>> + Send;

    fn update_access(
        &self,
        id: &str,
        entry: NewAccessEntry,
    ) -> impl Future<Output = GatewayResult<AccessEntry>> + Send;

    fn delete_access(&self, id: &str) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Wipe tasks, access entries, heartbeat and profile on the worker
    fn reset(&self) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Public manifest served at the worker root
    fn discover(&self) -> impl Future<Output = GatewayResult<Value>> + Send;

    fn start_task(&self, id: &str) -> impl Future<Output = GatewayResult<Task>> + Send {
        self.update_task_status(id, TaskStatus::InProgress, StatusExtras::default())
    }

    fn complete_task(
        &self,
        id: &str,
        extras: StatusExtras,
    ) -> impl Future<Output = GatewayResult<Task>> + Send {
        self.update_task_status(id, TaskStatus::Completed, extras)
    }

    fn reset_task(&self, id: &str) -> impl Future<Output = GatewayResult<Task>> + Send {
        self.update_task_status(id, TaskStatus::Pending, StatusExtras::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(GatewayError::NotConfigured.is_configuration());
        assert!(!GatewayError::Unauthorized.is_configuration());
        assert_eq!(GatewayError::NotFound("Task not found".into()).status(), Some(404));
        let remote = GatewayError::Remote {
            status: 400,
            message: "Name is required".into(),
        };
        assert_eq!(remote.status(), Some(400));
        assert_eq!(remote.to_string(), "Name is required");
    }
}
