//! Per-view controllers and the router that activates them.

pub mod heartbeat_panel;
pub mod settings_panel;
pub mod task_board;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

use crate::emitter::Subscription;
use crate::gateway::GatewayError;
use crate::models::View;
use crate::store::Store;

pub use heartbeat_panel::{HeartbeatPanel, HeartbeatPanelError};
pub use settings_panel::{ConnectionStatus, SettingsError, SettingsPanel};
pub use task_board::{BoardSnapshot, StatusOverride, TaskBoard, TaskBoardError, TaskRow};

/// Hook run whenever a view becomes the current one
pub trait ViewActivation: Send + Sync {
    fn on_activate(self: Arc<Self>, _runtime: &Handle) {}
}

/// Failed first load of a view's data, shown in place of the view with a retry hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub message: String,
    /// The worker URL is missing; show the setup prompt instead of an error
    pub needs_setup: bool,
}

impl From<&GatewayError> for LoadFailure {
    fn from(err: &GatewayError) -> Self {
        Self {
            message: err.to_string(),
            needs_setup: err.is_configuration(),
        }
    }
}

struct RouterInner {
    store: Arc<Store>,
    hooks: Mutex<HashMap<View, Arc<dyn ViewActivation>>>,
    current: Mutex<Option<(View, Handle)>>,
}

impl RouterInner {
    fn activate(&self, view: View, runtime: &Handle) {
        let hook = self.hooks.lock().get(&view).cloned();
        if let Some(hook) = hook {
            tracing::debug!(%view, "activating view");
            hook.on_activate(runtime);
        }
    }

    fn on_store_change(&self) {
        let view = self.store.get_state().current_view;
        let runtime = {
            let mut current = self.current.lock();
            match current.as_mut() {
                Some((active, runtime)) if *active != view => {
                    *active = view;
                    runtime.clone()
                }
                _ => return,
            }
        };
        self.activate(view, &runtime);
    }
}

/// Calls the registered [`ViewActivation`] hook once each time `current_view` changes
pub struct ViewRouter {
    inner: Arc<RouterInner>,
    subscription: Mutex<Option<Subscription>>,
}

impl ViewRouter {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                store,
                hooks: Mutex::new(HashMap::new()),
                current: Mutex::new(None),
            }),
            subscription: Mutex::new(None),
        }
    }

    pub fn register(&self, view: View, hook: Arc<dyn ViewActivation>) {
        self.inner.hooks.lock().insert(view, hook);
    }

    /// Follow the store and activate the current view right away
    pub fn start(&self, runtime: Handle) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return;
        }
        let view = self.inner.store.get_state().current_view;
        *self.inner.current.lock() = Some((view, runtime.clone()));

        let weak: Weak<RouterInner> = Arc::downgrade(&self.inner);
        *subscription = Some(self.inner.store.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_store_change();
            }
        }));
        drop(subscription);

        self.inner.activate(view, &runtime);
    }

    pub fn stop(&self) {
        let subscription = self.subscription.lock().take();
        *self.inner.current.lock() = None;
        drop(subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        activations: AtomicUsize,
    }

    impl ViewActivation for CountingHook {
        fn on_activate(self: Arc<Self>, _runtime: &Handle) {
            self.activations.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Silent;
    impl ViewActivation for Silent {}

    #[tokio::test]
    async fn test_router_activates_on_start_and_on_change() {
        let store = Arc::new(Store::in_memory());
        let router = ViewRouter::new(store.clone());
        let tasks = Arc::new(CountingHook::default());
        let heartbeat = Arc::new(CountingHook::default());
        router.register(View::Tasks, tasks.clone());
        router.register(View::Heartbeat, heartbeat.clone());
        router.register(View::Settings, Arc::new(Silent));

        router.start(Handle::current());
        assert_eq!(tasks.activations.load(Ordering::SeqCst), 1);

        store.navigate_to_view(View::Heartbeat);
        store.navigate_to_view(View::Heartbeat);
        assert_eq!(heartbeat.activations.load(Ordering::SeqCst), 1);

        // Unrelated store writes do not re-activate
        store.set_state(Default::default());
        assert_eq!(heartbeat.activations.load(Ordering::SeqCst), 1);

        store.navigate_to_view(View::Settings);
        store.navigate_to_view(View::Tasks);
        assert_eq!(tasks.activations.load(Ordering::SeqCst), 2);

        router.stop();
        store.navigate_to_view(View::Heartbeat);
        assert_eq!(heartbeat.activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_failure_from_error() {
        let failure = LoadFailure::from(&GatewayError::NotConfigured);
        assert!(failure.needs_setup);
        let failure = LoadFailure::from(&GatewayError::Unauthorized);
        assert!(!failure.needs_setup);
    }
}
