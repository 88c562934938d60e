use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;

use super::{LoadFailure, ViewActivation};
use crate::constants::HEARTBEAT_INTERVAL_CHOICES;
use crate::gateway::{Gateway, GatewayError, NewTask};
use crate::models::{Heartbeat, Section, SectionData, SectionPatch};
use crate::store::Store;

const LOAD_FAILED: &str =
    "Failed to load heartbeat data. Make sure the worker is running and configured.";

#[derive(Error, Debug)]
pub enum HeartbeatPanelError {
    #[error("Interval must be one of {choices:?} minutes, got {0}", choices = HEARTBEAT_INTERVAL_CHOICES)]
    InvalidInterval(u32),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Assistant status and the heartbeat checklist
pub struct HeartbeatPanel<G: Gateway> {
    gateway: Arc<G>,
    store: Arc<Store>,
    error: Mutex<Option<LoadFailure>>,
}

impl<G: Gateway> HeartbeatPanel<G> {
    pub fn new(store: Arc<Store>, gateway: Arc<G>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            store,
            error: Mutex::new(None),
        })
    }

    /// Error from the last load, cleared by the next successful one
    pub fn error(&self) -> Option<LoadFailure> {
        self.error.lock().clone()
    }

    pub fn heartbeat(&self) -> Option<Heartbeat> {
        self.store.get_state().heartbeat().cloned()
    }

    pub fn content(&self) -> Option<String> {
        self.store
            .get_state()
            .heartbeat_content()
            .map(str::to_string)
    }

    pub async fn load(&self) -> Result<(), GatewayError> {
        self.store
            .set_section_data(Section::Heartbeat, SectionPatch::loading(true));

        let (heartbeat, content) = tokio::join!(
            self.gateway.get_heartbeat(),
            self.gateway.get_heartbeat_content()
        );
        match heartbeat.and_then(|h| content.map(|c| (h, c))) {
            Ok((heartbeat, content)) => {
                *self.error.lock() = None;
                self.store.set_section_data(
                    Section::Heartbeat,
                    SectionPatch::loaded(SectionData::Heartbeat(heartbeat)),
                );
                self.store.set_section_data(
                    Section::HeartbeatContent,
                    SectionPatch::loaded(SectionData::HeartbeatContent(content)),
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load heartbeat data");
                let message = if e.is_configuration() {
                    e.to_string()
                } else {
                    LOAD_FAILED.to_string()
                };
                *self.error.lock() = Some(LoadFailure {
                    message,
                    needs_setup: e.is_configuration(),
                });
                self.store.set_section_data(
                    Section::Heartbeat,
                    SectionPatch::loaded(SectionData::Heartbeat(Heartbeat::default())),
                );
                Err(e)
            }
        }
    }

    /// Ask the assistant to adopt a new check-in interval, then record it on the heartbeat.
    ///
    /// The instruction task goes out first; if it fails nothing else is written.
    pub async fn change_interval(&self, minutes: u32) -> Result<Heartbeat, HeartbeatPanelError> {
        if !HEARTBEAT_INTERVAL_CHOICES.contains(&minutes) {
            return Err(HeartbeatPanelError::InvalidInterval(minutes));
        }

        self.gateway
            .create_task(NewTask {
                title: Some(format!("Update heartbeat interval to {} minutes", minutes)),
                description: Some(format!(
                    "Please update your heartbeat check-in interval to {m} minutes. \
                     Include \"interval\": {m} in your PUT /api/heartbeat requests.",
                    m = minutes
                )),
                repetition: None,
            })
            .await?;

        let current = self.heartbeat().unwrap_or_default();
        let updated = self
            .gateway
            .update_heartbeat(&current.with_interval(minutes))
            .await?;
        self.store.set_section_data(
            Section::Heartbeat,
            SectionPatch::data(SectionData::Heartbeat(updated.clone())),
        );
        tracing::info!(minutes, "heartbeat interval changed");
        Ok(updated)
    }

    pub async fn save_content(&self, content: &str) -> Result<(), GatewayError> {
        let saved = self.gateway.update_heartbeat_content(content).await?;
        self.store.set_section_data(
            Section::HeartbeatContent,
            SectionPatch::data(SectionData::HeartbeatContent(saved)),
        );
        Ok(())
    }
}

impl<G: Gateway> ViewActivation for HeartbeatPanel<G> {
    fn on_activate(self: Arc<Self>, runtime: &Handle) {
        runtime.spawn(async move {
            let _ = self.load().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;

    fn panel(gateway: MemoryGateway) -> (Arc<MemoryGateway>, Arc<Store>, Arc<HeartbeatPanel<MemoryGateway>>) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(Store::in_memory());
        let panel = HeartbeatPanel::new(store.clone(), gateway.clone());
        (gateway, store, panel)
    }

    #[tokio::test]
    async fn test_load_fills_both_sections() {
        let heartbeat = Heartbeat {
            assistant_status: "thinking".to_string(),
            active_threads: 2,
            ..Default::default()
        };
        let (gateway, store, panel) = panel(MemoryGateway::new().with_heartbeat(heartbeat));
        gateway.update_heartbeat_content("- check inbox").await.unwrap();

        panel.load().await.unwrap();
        let state = store.get_state();
        assert_eq!(state.heartbeat().unwrap().assistant_status, "thinking");
        assert_eq!(state.heartbeat_content(), Some("- check inbox"));
        assert!(!state.is_loading(Section::Heartbeat));
        assert!(panel.error().is_none());
    }

    #[tokio::test]
    async fn test_load_failure_writes_empty_heartbeat() {
        let (gateway, store, panel) = panel(MemoryGateway::new());
        gateway.fail_method("get_heartbeat_content");

        assert!(panel.load().await.is_err());
        let error = panel.error().unwrap();
        assert_eq!(error.message, LOAD_FAILED);
        assert!(!error.needs_setup);

        let state = store.get_state();
        assert_eq!(state.heartbeat(), Some(&Heartbeat::default()));
        assert!(!state.is_loading(Section::Heartbeat));

        gateway.clear_failures();
        panel.load().await.unwrap();
        assert!(panel.error().is_none());
    }

    #[tokio::test]
    async fn test_change_interval_creates_instruction_first() {
        let (gateway, store, panel) = panel(MemoryGateway::new());
        panel.load().await.unwrap();

        let updated = panel.change_interval(120).await.unwrap();
        assert_eq!(updated.interval, 120);
        assert_eq!(store.get_state().heartbeat().unwrap().interval, 120);

        let tasks = gateway.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Update heartbeat interval to 120 minutes");
        assert!(tasks[0].description.contains("\"interval\": 120"));
    }

    #[tokio::test]
    async fn test_change_interval_rejects_unknown_value() {
        let (gateway, _, panel) = panel(MemoryGateway::new());
        let err = panel.change_interval(45).await.unwrap_err();
        assert!(matches!(err, HeartbeatPanelError::InvalidInterval(45)));
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_change_interval_stops_when_task_fails() {
        let (gateway, store, panel) = panel(MemoryGateway::new());
        gateway.fail_method("create_task");
        assert!(panel.change_interval(30).await.is_err());
        assert_eq!(gateway.call_count("update_heartbeat"), 0);
        assert!(store.get_state().heartbeat().is_none());
    }

    #[tokio::test]
    async fn test_save_content() {
        let (gateway, store, panel) = panel(MemoryGateway::new());
        panel.save_content("# every hour\n- triage").await.unwrap();
        assert_eq!(store.get_state().heartbeat_content(), Some("# every hour\n- triage"));
        assert_eq!(gateway.get_heartbeat_content().await.unwrap(), "# every hour\n- triage");
    }
}
