//! Background polling that follows the active view and terminal visibility.
//!
//! Pollers are either always-on or scoped to the view whose id equals the
//! poller's name. The scheduler starts and stops interval timers as the
//! user navigates and as the dashboard is hidden or shown again, and writes
//! every successful fetch into the poller's store section.
//!
//! Each timer tick spawns its fetch as a separate task. Stopping a timer
//! aborts only the ticking, never a fetch already in flight; a late response
//! still lands in its own section, last write wins.

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::emitter::Subscription;
use crate::gateway::{Gateway, GatewayError};
use crate::models::{Section, SectionData, SectionPatch, View};
use crate::store::Store;

pub type FetchFuture = BoxFuture<'static, Result<SectionData, GatewayError>>;
pub type FetchFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// One configured poller
#[derive(Clone)]
pub struct PollTask {
    pub name: String,
    pub interval: Duration,
    pub always_on: bool,
    pub target: Section,
    pub fetch: FetchFn,
}

impl PollTask {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        interval: Duration,
        always_on: bool,
        target: Section,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SectionData, GatewayError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            always_on,
            target,
            fetch: Arc::new(move || fetch().boxed()),
        }
    }

    /// Poller that only runs while `view` is current
    pub fn for_view<F, Fut>(view: View, interval: Duration, target: Section, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SectionData, GatewayError>> + Send + 'static,
    {
        Self::new(view.id(), interval, false, target, fetch)
    }

    fn is_named_for(&self, view: View) -> bool {
        self.name == view.id()
    }
}

impl std::fmt::Debug for PollTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollTask")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("always_on", &self.always_on)
            .field("target", &self.target)
            .finish()
    }
}

/// The two always-on pollers: heartbeat and tasks
pub fn default_poll_tasks<G: Gateway>(gateway: Arc<G>, interval: Duration) -> Vec<PollTask> {
    let heartbeat_gateway = gateway.clone();
    let tasks_gateway = gateway;
    vec![
        PollTask::new("heartbeat", interval, true, Section::Heartbeat, move || {
            let gateway = heartbeat_gateway.clone();
            async move { gateway.get_heartbeat().await.map(SectionData::Heartbeat) }
        }),
        PollTask::new("tasks", interval, true, Section::Tasks, move || {
            let gateway = tasks_gateway.clone();
            async move { gateway.list_tasks().await.map(SectionData::Tasks) }
        }),
    ]
}

/// Access list refresh, only while the settings view is open
pub fn access_poll_task<G: Gateway>(gateway: Arc<G>, interval: Duration) -> PollTask {
    PollTask::for_view(View::Settings, interval, Section::Access, move || {
        let gateway = gateway.clone();
        async move { gateway.list_access().await.map(SectionData::Access) }
    })
}

/// Visibility and focus events from the host terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    Hidden,
    Visible,
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    NotStarted,
    Active,
    Paused,
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Polling scheduler must be started from within a tokio runtime")]
    NoRuntime,
}

struct TimerHandle {
    id: u64,
    handle: JoinHandle<()>,
}

struct Control {
    phase: SchedulerPhase,
    current_view: View,
    visible: bool,
    timers: HashMap<String, TimerHandle>,
    subscription: Option<Subscription>,
    signal_task: Option<JoinHandle<()>>,
    runtime: Option<Handle>,
    next_timer_id: u64,
}

struct Inner {
    store: Arc<Store>,
    tasks: Vec<PollTask>,
    control: Mutex<Control>,
}

pub struct PollingScheduler {
    inner: Arc<Inner>,
}

impl PollingScheduler {
    pub fn new(store: Arc<Store>, tasks: Vec<PollTask>) -> Self {
        let current_view = store.get_state().current_view;
        Self {
            inner: Arc::new(Inner {
                store,
                tasks,
                control: Mutex::new(Control {
                    phase: SchedulerPhase::NotStarted,
                    current_view,
                    visible: true,
                    timers: HashMap::new(),
                    subscription: None,
                    signal_task: None,
                    runtime: None,
                    next_timer_id: 0,
                }),
            }),
        }
    }

    pub fn tasks(&self) -> &[PollTask] {
        &self.inner.tasks
    }

    /// Run every poller once and wait for all of them. Failures are logged and dropped.
    pub async fn fetch_all(&self) {
        join_all((0..self.inner.tasks.len()).map(|idx| self.inner.poll(idx))).await;
    }

    /// Begin polling without an external signal source
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.start_inner(None)
    }

    /// Begin polling and react to visibility/focus signals from `signals`
    pub fn start_with_signals(
        &self,
        signals: mpsc::UnboundedReceiver<ActivitySignal>,
    ) -> Result<(), SchedulerError> {
        self.start_inner(Some(signals))
    }

    fn start_inner(
        &self,
        signals: Option<mpsc::UnboundedReceiver<ActivitySignal>>,
    ) -> Result<(), SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let inner = &self.inner;
        let mut control = inner.control.lock();
        if control.phase != SchedulerPhase::NotStarted {
            return Ok(());
        }

        control.current_view = inner.store.get_state().current_view;
        control.visible = true;
        control.phase = SchedulerPhase::Active;
        control.runtime = Some(runtime.clone());

        let weak = Arc::downgrade(inner);
        control.subscription = Some(inner.store.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_store_change();
            }
        }));

        if let Some(signals) = signals {
            control.signal_task = Some(runtime.spawn(forward_signals(Arc::downgrade(inner), signals)));
        }

        for idx in 0..inner.tasks.len() {
            if inner.tasks[idx].always_on {
                inner.start_timer(&mut control, &runtime, idx);
            }
        }
        if let Some(idx) = inner.scoped_poller(control.current_view) {
            inner.start_timer(&mut control, &runtime, idx);
        }

        tracing::info!(
            view = %control.current_view,
            pollers = control.timers.len(),
            "polling started"
        );
        Ok(())
    }

    /// Clear every timer and stop following the store. Calling it again is a no-op.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn handle_signal(&self, signal: ActivitySignal) {
        self.inner.handle_signal(signal);
    }

    pub fn on_visibility_change(&self, visible: bool) {
        self.inner.on_visibility_change(visible);
    }

    pub fn on_focus(&self) {
        self.inner.on_focus();
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.inner.control.lock().phase
    }

    pub fn current_view(&self) -> View {
        self.inner.control.lock().current_view
    }

    /// Names of pollers with a live timer, sorted
    pub fn running_pollers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.control.lock().timers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Identity of the running timer for `name`; changes every time the timer is restarted
    pub fn timer_id(&self, name: &str) -> Option<u64> {
        self.inner.control.lock().timers.get(name).map(|t| t.id)
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

async fn forward_signals(weak: Weak<Inner>, mut signals: mpsc::UnboundedReceiver<ActivitySignal>) {
    while let Some(signal) = signals.recv().await {
        let Some(inner) = weak.upgrade() else {
            break;
        };
        inner.handle_signal(signal);
    }
}

impl Inner {
    /// View-scoped (not always-on) poller for `view`
    fn scoped_poller(&self, view: View) -> Option<usize> {
        self.tasks
            .iter()
            .position(|t| !t.always_on && t.is_named_for(view))
    }

    /// Any poller named for `view`, always-on or not
    fn view_poller(&self, view: View) -> Option<usize> {
        self.tasks.iter().position(|t| t.is_named_for(view))
    }

    async fn poll(&self, idx: usize) {
        let task = &self.tasks[idx];
        match (task.fetch)().await {
            Ok(data) => {
                let changed = self
                    .store
                    .set_section_data(task.target, SectionPatch::loaded(data));
                tracing::debug!(poller = %task.name, changed, "poll completed");
            }
            Err(e) => {
                tracing::debug!(poller = %task.name, error = %e, "poll failed, keeping previous data");
            }
        }
    }

    fn spawn_poll(self: &Arc<Self>, runtime: &Handle, idx: usize) {
        let inner = self.clone();
        runtime.spawn(async move { inner.poll(idx).await });
    }

    /// No-op when a timer for this poller already exists
    fn start_timer(self: &Arc<Self>, control: &mut Control, runtime: &Handle, idx: usize) {
        let task = &self.tasks[idx];
        if control.timers.contains_key(&task.name) {
            return;
        }

        let period = task.interval;
        let weak = Arc::downgrade(self);
        let ticker = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                tokio::spawn(async move { inner.poll(idx).await });
            }
        });

        control.next_timer_id += 1;
        control.timers.insert(
            task.name.clone(),
            TimerHandle {
                id: control.next_timer_id,
                handle: ticker,
            },
        );
        tracing::debug!(poller = %task.name, ?period, "timer started");
    }

    fn stop_timer(&self, control: &mut Control, name: &str) {
        if let Some(timer) = control.timers.remove(name) {
            timer.handle.abort();
            tracing::debug!(poller = %name, "timer stopped");
        }
    }

    fn stop_all_timers(&self, control: &mut Control) {
        for (name, timer) in control.timers.drain() {
            timer.handle.abort();
            tracing::debug!(poller = %name, "timer stopped");
        }
    }

    fn on_store_change(self: &Arc<Self>) {
        let view = self.store.get_state().current_view;
        let mut control = self.control.lock();
        if control.phase == SchedulerPhase::NotStarted || view == control.current_view {
            return;
        }
        let previous = std::mem::replace(&mut control.current_view, view);

        // Paused: remember the view, resume starts its poller
        if control.phase == SchedulerPhase::Paused {
            return;
        }
        let Some(runtime) = control.runtime.clone() else {
            return;
        };

        if let Some(idx) = self.scoped_poller(previous) {
            let name = self.tasks[idx].name.clone();
            self.stop_timer(&mut control, &name);
        }
        if let Some(idx) = self.scoped_poller(view) {
            self.start_timer(&mut control, &runtime, idx);
        }
        if let Some(idx) = self.view_poller(view) {
            self.spawn_poll(&runtime, idx);
        }
        tracing::debug!(from = %previous, to = %view, "view changed");
    }

    fn handle_signal(self: &Arc<Self>, signal: ActivitySignal) {
        match signal {
            ActivitySignal::Hidden => self.on_visibility_change(false),
            ActivitySignal::Visible => self.on_visibility_change(true),
            ActivitySignal::Focus => self.on_focus(),
        }
    }

    fn on_visibility_change(self: &Arc<Self>, visible: bool) {
        let mut control = self.control.lock();
        if control.phase == SchedulerPhase::NotStarted {
            return;
        }
        control.visible = visible;

        if !visible {
            self.stop_all_timers(&mut control);
            control.phase = SchedulerPhase::Paused;
            tracing::info!("polling paused");
            return;
        }

        let Some(runtime) = control.runtime.clone() else {
            return;
        };
        control.phase = SchedulerPhase::Active;
        for idx in 0..self.tasks.len() {
            if self.tasks[idx].always_on {
                self.spawn_poll(&runtime, idx);
                self.start_timer(&mut control, &runtime, idx);
            }
        }
        if let Some(idx) = self.scoped_poller(control.current_view) {
            self.spawn_poll(&runtime, idx);
            self.start_timer(&mut control, &runtime, idx);
        }
        tracing::info!(view = %control.current_view, "polling resumed");
    }

    /// Light refresh: only the current view's poller, only while visible
    fn on_focus(self: &Arc<Self>) {
        let control = self.control.lock();
        if control.phase != SchedulerPhase::Active || !control.visible {
            return;
        }
        let Some(runtime) = control.runtime.as_ref() else {
            return;
        };
        if let Some(idx) = self.view_poller(control.current_view) {
            self.spawn_poll(runtime, idx);
        }
    }

    fn stop(&self) {
        let (subscription, signal_task) = {
            let mut control = self.control.lock();
            self.stop_all_timers(&mut control);
            let was_running = control.phase != SchedulerPhase::NotStarted;
            control.phase = SchedulerPhase::NotStarted;
            control.runtime = None;
            if was_running {
                tracing::info!("polling stopped");
            }
            (control.subscription.take(), control.signal_task.take())
        };
        if let Some(task) = signal_task {
            task.abort();
        }
        drop(subscription);
    }
}
