//! In-process worker with the same rules as the real one.
//!
//! Besides backing `--demo` runs it carries test hooks: per-method failure
//! switches, an artificial latency and per-method call counters.

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::{Gateway, GatewayError, GatewayResult, NewTask, StatusExtras, TaskUpdate};
use crate::models::{
    AccessEntry, AssistantProfile, Heartbeat, NewAccessEntry, Task, TaskStatus,
};

#[derive(Default)]
struct WorkerData {
    /// Newest first
    tasks: Vec<Task>,
    heartbeat: Option<Heartbeat>,
    heartbeat_content: Option<String>,
    profile: Option<AssistantProfile>,
    access: Vec<AccessEntry>,
}

#[derive(Default)]
struct Hooks {
    failing: HashSet<&'static str>,
    fail_all: bool,
    latency: Duration,
    calls: HashMap<&'static str, usize>,
}

#[derive(Default)]
pub struct MemoryGateway {
    data: Mutex<WorkerData>,
    hooks: Mutex<Hooks>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with tasks, given newest first
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let gateway = Self::default();
        gateway.data.lock().tasks = tasks;
        gateway
    }

    pub fn with_heartbeat(self, heartbeat: Heartbeat) -> Self {
        self.data.lock().heartbeat = Some(heartbeat);
        self
    }

    /// Make every later call to `method` fail with a remote error
    pub fn fail_method(&self, method: &'static str) {
        self.hooks.lock().failing.insert(method);
    }

    pub fn fail_all(&self, fail: bool) {
        self.hooks.lock().fail_all = fail;
    }

    pub fn clear_failures(&self) {
        let mut hooks = self.hooks.lock();
        hooks.failing.clear();
        hooks.fail_all = false;
    }

    /// Delay applied to every call before it is served
    pub fn set_latency(&self, latency: Duration) {
        self.hooks.lock().latency = latency;
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.hooks.lock().calls.get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.hooks.lock().calls.values().sum()
    }

    pub fn reset_counts(&self) {
        self.hooks.lock().calls.clear();
    }

    /// Direct view of stored tasks, bypassing hooks
    pub fn tasks(&self) -> Vec<Task> {
        self.data.lock().tasks.clone()
    }

    pub fn task(&self, id: &str) -> Option<Task> {
        self.data.lock().tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Count the call, wait out the latency, then decide whether it fails
    async fn enter(&self, method: &'static str) -> GatewayResult<()> {
        let latency = {
            let mut hooks = self.hooks.lock();
            *hooks.calls.entry(method).or_default() += 1;
            hooks.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let hooks = self.hooks.lock();
        if hooks.fail_all || hooks.failing.contains(method) {
            return Err(GatewayError::Remote {
                status: 503,
                message: format!("{} unavailable", method),
            });
        }
        Ok(())
    }

    fn new_id(prefix: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), &suffix[..6])
    }

    fn task_not_found() -> GatewayError {
        GatewayError::NotFound("Task not found".to_string())
    }

    fn access_not_found() -> GatewayError {
        GatewayError::NotFound("Access entry not found".to_string())
    }
}

impl Gateway for MemoryGateway {
    async fn list_tasks(&self) -> GatewayResult<Vec<Task>> {
        self.enter("list_tasks").await?;
        let mut tasks = self.data.lock().tasks.clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn create_task(&self, task: NewTask) -> GatewayResult<Task> {
        self.enter("create_task").await?;
        let task = Task::new(
            Self::new_id("task"),
            task.title,
            task.description,
            task.repetition,
            Utc::now(),
        );
        self.data.lock().tasks.insert(0, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> GatewayResult<Task> {
        self.enter("update_task").await?;
        let mut data = self.data.lock();
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(Self::task_not_found)?;
        if let Some(description) = update.description {
            task.title = description.clone();
            task.description = description;
        }
        if let Some(repetition) = update.repetition {
            task.repetition = repetition;
        }
        Ok(task.clone())
    }

    async fn update_task_status(
        &self,
        id: &str,
        status: TaskStatus,
        extras: StatusExtras,
    ) -> GatewayResult<Task> {
        self.enter("update_task_status").await?;
        let mut data = self.data.lock();
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(Self::task_not_found)?;
        task.apply_status(status, Utc::now());
        if let Some(notes) = extras.notes.filter(|n| !n.is_empty()) {
            task.notes = Some(notes);
        }
        if let Some(links) = extras.links {
            task.links.extend(links);
        }
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> GatewayResult<()> {
        self.enter("delete_task").await?;
        self.data.lock().tasks.retain(|t| t.id != id);
        Ok(())
    }

    async fn get_heartbeat(&self) -> GatewayResult<Heartbeat> {
        self.enter("get_heartbeat").await?;
        Ok(self.data.lock().heartbeat.clone().unwrap_or_default())
    }

    async fn update_heartbeat(&self, heartbeat: &Heartbeat) -> GatewayResult<Heartbeat> {
        self.enter("update_heartbeat").await?;
        self.data.lock().heartbeat = Some(heartbeat.clone());
        Ok(heartbeat.clone())
    }

    async fn get_heartbeat_content(&self) -> GatewayResult<String> {
        self.enter("get_heartbeat_content").await?;
        Ok(self.data.lock().heartbeat_content.clone().unwrap_or_default())
    }

    async fn update_heartbeat_content(&self, content: &str) -> GatewayResult<String> {
        self.enter("update_heartbeat_content").await?;
        self.data.lock().heartbeat_content = Some(content.to_string());
        Ok(content.to_string())
    }

    async fn get_assistant_profile(&self) -> GatewayResult<AssistantProfile> {
        self.enter("get_assistant_profile").await?;
        Ok(self.data.lock().profile.clone().unwrap_or_default())
    }

    async fn update_assistant_profile(
        &self,
        profile: &AssistantProfile,
    ) -> GatewayResult<AssistantProfile> {
        self.enter("update_assistant_profile").await?;
        let or = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };
        let stored = AssistantProfile {
            name: or(&profile.name, "Assistant"),
            initials: or(&profile.initials, "A"),
            avatar: profile.avatar.clone().filter(|a| !a.is_empty()),
            description: or(&profile.description, "AI Assistant"),
            color: or(&profile.color, "#3b82f6"),
        };
        self.data.lock().profile = Some(stored.clone());
        Ok(stored)
    }

    async fn list_access(&self) -> GatewayResult<Vec<AccessEntry>> {
        self.enter("list_access").await?;
        let mut entries = self.data.lock().access.clone();
        entries.sort_by_key(|e| e.order);
        Ok(entries)
    }

    async fn create_access(&self, entry: NewAccessEntry) -> GatewayResult<AccessEntry> {
        self.enter("create_access").await?;
        if entry.name.as_deref().map_or(true, str::is_empty) {
            return Err(GatewayError::Remote {
                status: 400,
                message: "Name is required".to_string(),
            });
        }
        let entry = AccessEntry::from_new(Self::new_id("access"), entry, Utc::now());
        self.data.lock().access.push(entry.clone());
        Ok(entry)
    }

    async fn update_access(&self, id: &str, update: NewAccessEntry) -> GatewayResult<AccessEntry> {
        self.enter("update_access").await?;
        let mut data = self.data.lock();
        let entry = data
            .access
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(Self::access_not_found)?;
        entry.apply(update, Utc::now());
        Ok(entry.clone())
    }

    async fn delete_access(&self, id: &str) -> GatewayResult<()> {
        self.enter("delete_access").await?;
        let mut data = self.data.lock();
        let before = data.access.len();
        data.access.retain(|e| e.id != id);
        if data.access.len() == before {
            return Err(Self::access_not_found());
        }
        Ok(())
    }

    async fn reset(&self) -> GatewayResult<()> {
        self.enter("reset").await?;
        *self.data.lock() = WorkerData::default();
        Ok(())
    }

    async fn discover(&self) -> GatewayResult<Value> {
        self.enter("discover").await?;
        Ok(json!({
            "name": "pulseboard (in-memory)",
            "endpoints": [
                { "method": "GET", "path": "/api/tasks" },
                { "method": "POST", "path": "/api/tasks" },
                { "method": "PUT", "path": "/api/tasks/:id/status" },
                { "method": "GET", "path": "/api/heartbeat" },
                { "method": "PUT", "path": "/api/heartbeat" },
                { "method": "GET", "path": "/api/access" },
            ],
        }))
    }
}
