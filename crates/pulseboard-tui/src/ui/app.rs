//! Terminal dashboard state: the core controllers plus input modes and toasts.

use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use pulseboard_core::constants::HEARTBEAT_INTERVAL_CHOICES;
use pulseboard_core::models::{AppState, ProfilePatch, Repetition, View};
use pulseboard_core::scheduler::{access_poll_task, default_poll_tasks};
use pulseboard_core::views::{
    ConnectionStatus, HeartbeatPanel, SettingsPanel, TaskBoard, TaskRow, ViewRouter,
};
use pulseboard_core::{ActivitySignal, Gateway, PollingScheduler, Store};

use super::notifications::{Notification, NotificationQueue};
use super::text_input::TextInput;
use super::theme::{self, Palette};

/// Results of background actions, delivered back to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    Notify(Notification),
    Connection(ConnectionStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEditor {
    /// `None` while creating a new task
    pub editing: Option<String>,
    pub input: TextInput,
    pub repetition: Option<Repetition>,
}

impl TaskEditor {
    /// Tab steps through one-off and every repetition
    pub fn cycle_repetition(&mut self) {
        self.repetition = match self.repetition {
            None => Some(Repetition::ALL[0]),
            Some(current) => Repetition::ALL
                .iter()
                .position(|r| *r == current)
                .and_then(|i| Repetition::ALL.get(i + 1).copied()),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    TaskEditor(TaskEditor),
    ConfirmDelete {
        id: String,
        title: String,
    },
    IntervalPicker {
        index: usize,
    },
    ProfileName(TextInput),
    AccessRequest(TextInput),
    ConfirmReset,
}

pub struct App<G: Gateway> {
    pub store: Arc<Store>,
    pub board: Arc<TaskBoard<G>>,
    pub heartbeat: Arc<HeartbeatPanel<G>>,
    pub settings: Arc<SettingsPanel<G>>,
    scheduler: Arc<PollingScheduler>,
    router: ViewRouter,
    signals: mpsc::UnboundedSender<ActivitySignal>,
    events: mpsc::UnboundedSender<AppEvent>,
    runtime: Handle,

    pub selected: usize,
    pub mode: InputMode,
    pub notifications: NotificationQueue,
    pub connection: Option<ConnectionStatus>,
    pub worker_url: Option<String>,
    pub demo: bool,
    pub running: bool,
    pub pending_quit: bool,
    /// Cleared when the terminal reports focus loss
    pub focused: bool,
}

impl<G: Gateway> App<G> {
    /// Fetches every section once before polling starts, so the first frame has data
    pub async fn new(
        store: Arc<Store>,
        gateway: Arc<G>,
        poll_interval: Duration,
        worker_url: Option<String>,
        demo: bool,
    ) -> Result<(Self, mpsc::UnboundedReceiver<AppEvent>)> {
        let runtime = Handle::current();

        let board = TaskBoard::new(store.clone(), gateway.clone());
        let heartbeat = HeartbeatPanel::new(store.clone(), gateway.clone());
        let settings = SettingsPanel::new(store.clone(), gateway.clone());

        let mut tasks = default_poll_tasks(gateway.clone(), poll_interval);
        tasks.push(access_poll_task(gateway, poll_interval));
        let scheduler = Arc::new(PollingScheduler::new(store.clone(), tasks));
        scheduler.fetch_all().await;
        let (signals, signals_rx) = mpsc::unbounded_channel();
        scheduler.start_with_signals(signals_rx)?;

        let router = ViewRouter::new(store.clone());
        router.register(View::Tasks, board.clone());
        router.register(View::Heartbeat, heartbeat.clone());
        router.register(View::Settings, settings.clone());
        router.start(runtime.clone());

        let (events, events_rx) = mpsc::unbounded_channel();
        let app = Self {
            store,
            board,
            heartbeat,
            settings,
            scheduler,
            router,
            signals,
            events,
            runtime,
            selected: 0,
            mode: InputMode::Normal,
            notifications: NotificationQueue::new(),
            connection: None,
            worker_url,
            demo,
            running: true,
            pending_quit: false,
            focused: true,
        };
        Ok((app, events_rx))
    }

    pub fn state(&self) -> Arc<AppState> {
        self.store.get_state()
    }

    pub fn view(&self) -> View {
        self.store.get_state().current_view
    }

    pub fn palette(&self) -> Palette {
        theme::palette(self.store.get_state().theme)
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Notify(notification) => self.notify(notification),
            AppEvent::Connection(status) => self.connection = Some(status),
        }
    }

    pub fn tick(&mut self) {
        self.notifications.tick();
        let rows = self.board.snapshot(Utc::now()).rows().count();
        if self.selected >= rows {
            self.selected = rows.saturating_sub(1);
        }
    }

    /// Run `action` on the runtime and deliver its notification, if any
    fn spawn<F>(&self, action: F)
    where
        F: Future<Output = Option<Notification>> + Send + 'static,
    {
        let events = self.events.clone();
        self.runtime.spawn(async move {
            if let Some(notification) = action.await {
                let _ = events.send(AppEvent::Notify(notification));
            }
        });
    }

    fn signal(&self, signal: ActivitySignal) {
        if self.signals.send(signal).is_err() {
            tracing::debug!(?signal, "scheduler no longer listening");
        }
    }

    pub fn quit(&mut self) {
        self.router.stop();
        self.scheduler.stop();
        self.running = false;
    }

    // ---------------------------------------------------------------------
    // Navigation and activity
    // ---------------------------------------------------------------------

    pub fn navigate(&mut self, view: View) {
        if self.store.navigate_to_view(view) {
            self.selected = 0;
        }
    }

    pub fn next_view(&mut self) {
        let current = self.view();
        let idx = View::ALL.iter().position(|v| *v == current).unwrap_or(0);
        self.navigate(View::ALL[(idx + 1) % View::ALL.len()]);
    }

    pub fn cycle_theme(&mut self) {
        let next = self.store.get_state().theme.cycle();
        self.store.set_theme(next);
        self.notify(Notification::info(format!("Theme: {}", next.id())));
    }

    pub fn on_focus_lost(&mut self) {
        self.focused = false;
        self.signal(ActivitySignal::Hidden);
    }

    pub fn on_focus_gained(&mut self) {
        self.focused = true;
        self.signal(ActivitySignal::Visible);
        self.signal(ActivitySignal::Focus);
    }

    /// Poll the current view now; retry a view whose first load failed
    pub fn refresh(&mut self) {
        self.signal(ActivitySignal::Focus);
        match self.view() {
            View::Tasks if self.board.load_error().is_some() => {
                let board = self.board.clone();
                self.spawn(async move { board.load().await.err().map(|e| Notification::error(e.to_string())) });
            }
            View::Heartbeat if self.heartbeat.error().is_some() => {
                let heartbeat = self.heartbeat.clone();
                self.spawn(async move { heartbeat.load().await.err().map(|e| Notification::error(e.to_string())) });
            }
            View::Settings if self.settings.access_error().is_some() => {
                let settings = self.settings.clone();
                self.spawn(async move {
                    settings.load_access().await.err().map(|e| Notification::error(e.to_string()))
                });
            }
            _ => {}
        }
    }

    // ---------------------------------------------------------------------
    // Tasks
    // ---------------------------------------------------------------------

    pub fn selected_row(&self) -> Option<TaskRow> {
        self.board
            .snapshot(Utc::now())
            .rows()
            .nth(self.selected)
            .cloned()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let rows = self.board.snapshot(Utc::now()).rows().count();
        if rows == 0 {
            self.selected = 0;
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(rows - 1);
    }

    pub fn cycle_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let board = self.board.clone();
        self.spawn(async move {
            match board.cycle_status(&row.task.id).await {
                Ok(_) => None,
                Err(e) => Some(Notification::error(format!("Failed to update task: {}", e))),
            }
        });
    }

    pub fn open_new_task(&mut self) {
        self.mode = InputMode::TaskEditor(TaskEditor {
            editing: None,
            input: TextInput::new(),
            repetition: None,
        });
    }

    pub fn open_edit_task(&mut self) {
        if let Some(row) = self.selected_row() {
            self.mode = InputMode::TaskEditor(TaskEditor {
                editing: Some(row.task.id.clone()),
                input: TextInput::with_text(row.task.description.clone()),
                repetition: row.task.repetition,
            });
        }
    }

    pub fn submit_task_editor(&mut self) {
        let InputMode::TaskEditor(editor) = std::mem::take(&mut self.mode) else {
            return;
        };
        if editor.input.is_blank() {
            self.notify(Notification::warning("Please enter a task description"));
            self.mode = InputMode::TaskEditor(editor);
            return;
        }
        let board = self.board.clone();
        self.spawn(async move {
            let description = editor.input.value().to_string();
            let result = match &editor.editing {
                Some(id) => board.edit_task(id, &description, editor.repetition).await,
                None => board.create_task(&description, editor.repetition).await,
            };
            Some(match (result, editor.editing.is_some()) {
                (Ok(_), true) => Notification::success("Task updated"),
                (Ok(_), false) => Notification::success("Task created"),
                (Err(e), _) => Notification::error(format!("Failed to save task: {}", e)),
            })
        });
    }

    pub fn request_delete(&mut self) {
        if let Some(row) = self.selected_row() {
            self.mode = InputMode::ConfirmDelete {
                id: row.task.id.clone(),
                title: row.task.display_title().to_string(),
            };
        }
    }

    pub fn confirm_delete(&mut self) {
        let InputMode::ConfirmDelete { id, .. } = std::mem::take(&mut self.mode) else {
            return;
        };
        let board = self.board.clone();
        self.spawn(async move {
            Some(match board.delete_task(&id).await {
                Ok(()) => Notification::success("Task deleted"),
                Err(e) => Notification::error(format!("Failed to delete task: {}", e)),
            })
        });
    }

    // ---------------------------------------------------------------------
    // Heartbeat
    // ---------------------------------------------------------------------

    pub fn open_interval_picker(&mut self) {
        let current = self
            .store
            .get_state()
            .heartbeat()
            .map(|h| h.interval)
            .unwrap_or(pulseboard_core::constants::DEFAULT_HEARTBEAT_INTERVAL_MINUTES);
        let index = HEARTBEAT_INTERVAL_CHOICES
            .iter()
            .position(|m| *m == current)
            .unwrap_or(2);
        self.mode = InputMode::IntervalPicker { index };
    }

    pub fn apply_interval(&mut self) {
        let InputMode::IntervalPicker { index } = std::mem::take(&mut self.mode) else {
            return;
        };
        let Some(minutes) = HEARTBEAT_INTERVAL_CHOICES.get(index).copied() else {
            return;
        };
        let heartbeat = self.heartbeat.clone();
        self.spawn(async move {
            Some(match heartbeat.change_interval(minutes).await {
                Ok(_) => Notification::success(format!("Check-in interval set to {} min", minutes)),
                Err(e) => Notification::error(format!("Failed to update interval: {}", e)),
            })
        });
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    pub fn open_profile_name(&mut self) {
        let name = self.store.get_assistant_profile().name;
        self.mode = InputMode::ProfileName(TextInput::with_text(name));
    }

    pub fn submit_profile_name(&mut self) {
        let InputMode::ProfileName(input) = std::mem::take(&mut self.mode) else {
            return;
        };
        let name = input.value().trim().to_string();
        let initials = name.chars().next().map(|c| c.to_uppercase().to_string());
        let patch = ProfilePatch {
            name: Some(if name.is_empty() { "Assistant".to_string() } else { name }),
            initials,
            ..Default::default()
        };
        let settings = self.settings.clone();
        self.spawn(async move {
            let profile = settings.save_profile(patch).await;
            Some(Notification::success(format!("Profile saved: {}", profile.name)))
        });
    }

    pub fn reset_profile(&mut self) {
        let profile = self.settings.reset_profile();
        self.notify(Notification::info(format!("Profile reset to {}", profile.name)));
    }

    pub fn open_access_request(&mut self) {
        self.mode = InputMode::AccessRequest(TextInput::new());
    }

    pub fn submit_access_request(&mut self) {
        let InputMode::AccessRequest(input) = std::mem::take(&mut self.mode) else {
            return;
        };
        let settings = self.settings.clone();
        self.spawn(async move {
            Some(match settings.submit_access_request(input.value()).await {
                Ok(()) => Notification::success("Access request sent"),
                Err(e) => Notification::error(format!("Failed to send request: {}", e)),
            })
        });
    }

    pub fn check_connection(&mut self) {
        let settings = self.settings.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let status = settings.check_connection().await;
            let _ = events.send(AppEvent::Connection(status));
        });
    }

    pub fn confirm_reset(&mut self) {
        self.mode = InputMode::Normal;
        let settings = self.settings.clone();
        let scheduler = self.scheduler.clone();
        self.spawn(async move {
            settings.reset_all(&scheduler).await;
            Some(Notification::warning("All data cleared. Polling stopped; restart to reconnect.")
                .lasting(Duration::from_secs(10)))
        });
    }
}
