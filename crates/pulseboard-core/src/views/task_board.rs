//! Task list controller with optimistic status changes.
//!
//! The board never edits store data in place. It renders from `base` (the
//! task list it last accepted from the store or from a reload) with
//! per-task status overrides applied on top. A status click installs an
//! override, renders, and only then talks to the worker.
//!
//! While a status request or a delete is outstanding the board is
//! *mutating* and ignores store notifications, so a poll landing in that
//! window cannot flip the task back. Polls still write the store; the
//! forced reload after the request decides what is shown next.
//!
//! Critical section: finding the task, snapshotting its status triple,
//! installing the override and rendering all happen under one lock.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::runtime::Handle;

use super::{LoadFailure, ViewActivation};
use crate::constants::COMPLETED_TASKS_SHOWN;
use crate::emitter::{ChangeEmitter, Subscription};
use crate::gateway::{Gateway, GatewayError, NewTask, StatusExtras, TaskUpdate};
use crate::models::{
    Cooldown, Repetition, Section, SectionData, SectionPatch, Task, TaskStatus,
};
use crate::store::Store;

#[derive(Error, Debug)]
pub enum TaskBoardError {
    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The three fields a status change touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOverride {
    pub status: TaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusOverride {
    pub fn of(task: &Task) -> Self {
        Self {
            status: task.status,
            started_at: task.started_at,
            completed_at: task.completed_at,
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        task.status = self.status;
        task.started_at = self.started_at;
        task.completed_at = self.completed_at;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub task: Task,
    pub cooldown: Option<Cooldown>,
}

impl TaskRow {
    /// Pending recurring task still waiting out its cooldown
    pub fn waiting_for_cooldown(&self) -> bool {
        self.task.status == TaskStatus::Pending && self.cooldown.is_some_and(|c| c.on_cooldown)
    }

    /// In-progress recurring task started before its cooldown ended
    pub fn started_early(&self) -> bool {
        self.task.status == TaskStatus::InProgress && self.cooldown.is_some_and(|c| c.on_cooldown)
    }
}

/// What the tasks view draws
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardSnapshot {
    pub recurring: Vec<TaskRow>,
    pub current: Vec<TaskRow>,
    pub pending: Vec<TaskRow>,
    /// Most recent first, capped
    pub completed: Vec<TaskRow>,
    pub completed_total: usize,
    pub load_error: Option<LoadFailure>,
    pub loaded: bool,
    pub mutating: bool,
    pub generation: u64,
}

impl BoardSnapshot {
    pub fn is_empty(&self) -> bool {
        self.recurring.is_empty()
            && self.current.is_empty()
            && self.pending.is_empty()
            && self.completed.is_empty()
    }

    /// Rows in display order: recurring, current, pending, completed
    pub fn rows(&self) -> impl Iterator<Item = &TaskRow> {
        self.recurring
            .iter()
            .chain(&self.current)
            .chain(&self.pending)
            .chain(&self.completed)
    }
}

struct BoardState {
    base: Option<Vec<Task>>,
    displayed: Arc<Vec<Task>>,
    overrides: HashMap<String, StatusOverride>,
    mutating: bool,
    load_error: Option<LoadFailure>,
    generation: u64,
}

impl BoardState {
    fn render(&mut self) {
        let mut tasks = self.base.clone().unwrap_or_default();
        for task in &mut tasks {
            if let Some(over) = self.overrides.get(&task.id) {
                over.apply_to(task);
            }
        }
        self.displayed = Arc::new(tasks);
        self.generation += 1;
    }

    fn accept(&mut self, tasks: Vec<Task>) {
        self.base = Some(tasks);
        self.load_error = None;
    }
}

pub struct TaskBoard<G: Gateway> {
    gateway: Arc<G>,
    store: Arc<Store>,
    state: Mutex<BoardState>,
    emitter: ChangeEmitter,
    _store_subscription: Subscription,
}

impl<G: Gateway> TaskBoard<G> {
    pub fn new(store: Arc<Store>, gateway: Arc<G>) -> Arc<Self> {
        let base = store.get_state().tasks_section().map(<[Task]>::to_vec);
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let subscription = store.subscribe(move || {
                if let Some(board) = weak.upgrade() {
                    board.on_store_change();
                }
            });
            let mut state = BoardState {
                base,
                displayed: Arc::new(Vec::new()),
                overrides: HashMap::new(),
                mutating: false,
                load_error: None,
                generation: 0,
            };
            state.render();
            Self {
                gateway,
                store,
                state: Mutex::new(state),
                emitter: ChangeEmitter::new(),
                _store_subscription: subscription,
            }
        })
    }

    /// Notified after every render
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.emitter.subscribe(listener)
    }

    /// Tasks as currently shown, overrides applied
    pub fn displayed(&self) -> Arc<Vec<Task>> {
        self.state.lock().displayed.clone()
    }

    pub fn displayed_task(&self, id: &str) -> Option<Task> {
        self.state.lock().displayed.iter().find(|t| t.id == id).cloned()
    }

    pub fn is_mutating(&self) -> bool {
        self.state.lock().mutating
    }

    pub fn has_override(&self, id: &str) -> bool {
        self.state.lock().overrides.contains_key(id)
    }

    pub fn render_generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn load_error(&self) -> Option<LoadFailure> {
        self.state.lock().load_error.clone()
    }

    /// Group the displayed tasks the way the view lays them out
    pub fn snapshot(&self, now: DateTime<Utc>) -> BoardSnapshot {
        let (displayed, load_error, loaded, mutating, generation) = {
            let state = self.state.lock();
            (
                state.displayed.clone(),
                state.load_error.clone(),
                state.base.is_some(),
                state.mutating,
                state.generation,
            )
        };

        let mut snapshot = BoardSnapshot {
            load_error,
            loaded,
            mutating,
            generation,
            ..Default::default()
        };
        for task in displayed.iter() {
            let row = TaskRow {
                cooldown: task.cooldown(now),
                task: task.clone(),
            };
            if task.is_recurring() {
                snapshot.recurring.push(row);
                continue;
            }
            match task.status {
                TaskStatus::InProgress => snapshot.current.push(row),
                TaskStatus::Pending => snapshot.pending.push(row),
                TaskStatus::Completed => {
                    snapshot.completed_total += 1;
                    if snapshot.completed.len() < COMPLETED_TASKS_SHOWN {
                        snapshot.completed.push(row);
                    }
                }
            }
        }
        snapshot
    }

    fn on_store_change(&self) {
        let app = self.store.get_state();
        let Some(tasks) = app.tasks_section() else {
            return;
        };
        {
            let mut state = self.state.lock();
            if state.mutating || state.base.as_deref() == Some(tasks) {
                return;
            }
            state.accept(tasks.to_vec());
            state.render();
        }
        self.emitter.emit();
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        let result = f(&mut self.state.lock());
        self.emitter.emit();
        result
    }

    /// Fetch the task list into the store and re-render from it.
    /// A failure with nothing loaded yet is kept as the view's load error.
    pub async fn load(&self) -> Result<(), TaskBoardError> {
        self.store
            .set_section_data(Section::Tasks, SectionPatch::loading(true));
        match self.gateway.list_tasks().await {
            Ok(tasks) => {
                self.accept_reload(tasks, None);
                Ok(())
            }
            Err(e) => {
                self.store
                    .set_section_data(Section::Tasks, SectionPatch::loading(false));
                self.with_state(|state| {
                    if state.base.is_none() {
                        state.load_error = Some(LoadFailure::from(&e));
                    }
                    state.render();
                });
                tracing::warn!(error = %e, "Failed to load tasks");
                Err(e.into())
            }
        }
    }

    /// Take a fresh list as the new base, drop the override for `settled`, then publish to the store
    fn accept_reload(&self, tasks: Vec<Task>, settled: Option<&str>) {
        self.with_state(|state| {
            state.accept(tasks.clone());
            if let Some(id) = settled {
                state.overrides.remove(id);
            }
            state.render();
        });
        self.store
            .set_section_data(Section::Tasks, SectionPatch::loaded(SectionData::Tasks(tasks)));
    }

    /// Authoritative reload after a status request for `id` finished
    async fn reconcile(&self, id: &str, confirmed: Option<&Task>) {
        match self.gateway.list_tasks().await {
            Ok(tasks) => self.accept_reload(tasks, Some(id)),
            Err(e) => {
                tracing::warn!(task = %id, error = %e, "Reload after status change failed");
                let merged = confirmed.and_then(|task| {
                    let mut tasks = self.store.get_state().tasks_section()?.to_vec();
                    let slot = tasks.iter_mut().find(|t| t.id == task.id)?;
                    *slot = task.clone();
                    Some(tasks)
                });
                match merged {
                    Some(tasks) => self.accept_reload(tasks, Some(id)),
                    None => self.with_state(|state| {
                        state.overrides.remove(id);
                        state.render();
                    }),
                }
            }
        }
    }

    /// Advance a task one step through pending -> in_progress -> completed -> pending.
    ///
    /// The new status is shown immediately. On failure the previous status
    /// triple is restored before the reload.
    pub async fn cycle_status(&self, id: &str) -> Result<Task, TaskBoardError> {
        let (next, previous) = self.with_state(|state| {
            let task = state
                .displayed
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| TaskBoardError::NotFound(id.to_string()))?;
            let previous = StatusOverride::of(task);
            let next = task.status.next();

            let mut optimistic = task.clone();
            optimistic.apply_local_status(next, Utc::now());
            state
                .overrides
                .insert(id.to_string(), StatusOverride::of(&optimistic));
            state.mutating = true;
            state.render();
            Ok::<_, TaskBoardError>((next, previous))
        })?;
        tracing::debug!(task = %id, status = %next, "optimistic status change");

        let result = self
            .gateway
            .update_task_status(id, next, StatusExtras::default())
            .await;

        match result {
            Ok(confirmed) => {
                self.state.lock().mutating = false;
                self.reconcile(id, Some(&confirmed)).await;
                Ok(confirmed)
            }
            Err(e) => {
                tracing::warn!(task = %id, error = %e, "Status change rejected, rolling back");
                self.with_state(|state| {
                    state.overrides.insert(id.to_string(), previous);
                    state.render();
                });
                self.state.lock().mutating = false;
                self.reconcile(id, None).await;
                Err(e.into())
            }
        }
    }

    /// Delete and reload. Nothing is removed from the display until the worker confirms.
    pub async fn delete_task(&self, id: &str) -> Result<(), TaskBoardError> {
        self.state.lock().mutating = true;
        let result = match self.gateway.delete_task(id).await {
            Ok(()) => match self.gateway.list_tasks().await {
                Ok(tasks) => {
                    self.state.lock().overrides.remove(id);
                    self.accept_reload(tasks, None);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(task = %id, error = %e, "Reload after delete failed");
                    self.drop_deleted(id);
                    Ok(())
                }
            },
            Err(e) => {
                tracing::warn!(task = %id, error = %e, "Failed to delete task");
                Err(e.into())
            }
        };
        self.state.lock().mutating = false;
        result
    }

    /// Remove a confirmed deletion locally when the follow-up reload failed
    fn drop_deleted(&self, id: &str) {
        let remaining: Option<Vec<Task>> = self
            .store
            .get_state()
            .tasks_section()
            .map(|tasks| tasks.iter().filter(|t| t.id != id).cloned().collect());
        match remaining {
            Some(tasks) => self.accept_reload(tasks, Some(id)),
            None => self.with_state(|state| {
                if let Some(base) = state.base.as_mut() {
                    base.retain(|t| t.id != id);
                }
                state.overrides.remove(id);
                state.render();
            }),
        }
    }

    fn validate(description: &str) -> Result<String, TaskBoardError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TaskBoardError::Validation(
                "Please enter a task description".to_string(),
            ));
        }
        Ok(description.to_string())
    }

    pub async fn create_task(
        &self,
        description: &str,
        repetition: Option<Repetition>,
    ) -> Result<Task, TaskBoardError> {
        let description = Self::validate(description)?;
        let task = self
            .gateway
            .create_task(NewTask {
                title: None,
                description: Some(description),
                repetition,
            })
            .await?;
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Reload after create failed");
        }
        Ok(task)
    }

    /// Replace the description (and with it the title) and the repetition
    pub async fn edit_task(
        &self,
        id: &str,
        description: &str,
        repetition: Option<Repetition>,
    ) -> Result<Task, TaskBoardError> {
        let description = Self::validate(description)?;
        let task = self
            .gateway
            .update_task(
                id,
                TaskUpdate {
                    description: Some(description),
                    repetition: Some(repetition),
                },
            )
            .await?;
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Reload after edit failed");
        }
        Ok(task)
    }
}

impl<G: Gateway> ViewActivation for TaskBoard<G> {
    fn on_activate(self: Arc<Self>, runtime: &Handle) {
        runtime.spawn(async move {
            if let Err(e) = self.load().await {
                tracing::debug!(error = %e, "Task load on activation failed");
            }
        });
    }
}
