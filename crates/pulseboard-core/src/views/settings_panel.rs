//! Settings: assistant profile, access entries, connection check and factory reset.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;

use super::{LoadFailure, ViewActivation};
use crate::gateway::{Gateway, GatewayError, NewTask};
use crate::models::{
    AccessEntry, AssistantProfile, NewAccessEntry, ProfilePatch, Section, SectionData,
    SectionPatch,
};
use crate::scheduler::PollingScheduler;
use crate::store::Store;

const ACCESS_LOAD_FAILED: &str =
    "Failed to load access data. Make sure the worker is running and configured.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    NotConfigured,
    Connected,
    Error(String),
}

impl ConnectionStatus {
    pub fn label(&self) -> String {
        match self {
            ConnectionStatus::NotConfigured => "Worker URL not configured".to_string(),
            ConnectionStatus::Connected => "Connected to worker".to_string(),
            ConnectionStatus::Error(message) => format!("Worker error: {}", message),
        }
    }
}

#[derive(Default)]
struct AccessState {
    loading: bool,
    error: Option<LoadFailure>,
}

pub struct SettingsPanel<G: Gateway> {
    gateway: Arc<G>,
    store: Arc<Store>,
    access: Mutex<AccessState>,
}

impl<G: Gateway> SettingsPanel<G> {
    pub fn new(store: Arc<Store>, gateway: Arc<G>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            store,
            access: Mutex::new(AccessState::default()),
        })
    }

    pub fn access_loading(&self) -> bool {
        self.access.lock().loading
    }

    pub fn access_error(&self) -> Option<LoadFailure> {
        self.access.lock().error.clone()
    }

    pub fn access_entries(&self) -> Vec<AccessEntry> {
        self.store.get_state().access().to_vec()
    }

    pub async fn load_access(&self) -> Result<(), GatewayError> {
        {
            let mut access = self.access.lock();
            access.loading = true;
            access.error = None;
        }
        let result = self.gateway.list_access().await;
        let mut access = self.access.lock();
        access.loading = false;
        match result {
            Ok(entries) => {
                drop(access);
                self.store.set_section_data(
                    Section::Access,
                    SectionPatch::loaded(SectionData::Access(entries)),
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load access data");
                // Once entries are on screen a failed refresh keeps them
                if self.store.get_state().section_data(Section::Access).is_some() {
                    return Err(e);
                }
                access.error = Some(LoadFailure {
                    message: if e.is_configuration() {
                        e.to_string()
                    } else {
                        ACCESS_LOAD_FAILED.to_string()
                    },
                    needs_setup: e.is_configuration(),
                });
                Err(e)
            }
        }
    }

    /// Merge into the local profile, then push the result to the worker.
    /// A failed push is logged; the local change stands.
    pub async fn save_profile(&self, patch: ProfilePatch) -> AssistantProfile {
        let profile = self.store.update_assistant_profile(patch);
        if let Err(e) = self.gateway.update_assistant_profile(&profile).await {
            tracing::warn!(error = %e, "Could not save profile to worker");
        }
        profile
    }

    pub fn reset_profile(&self) -> AssistantProfile {
        self.store.reset_assistant_profile();
        self.store.get_assistant_profile()
    }

    pub async fn submit_access_request(&self, request: &str) -> Result<(), SettingsError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(SettingsError::Validation(
                "Please describe the access changes you need".to_string(),
            ));
        }
        self.gateway
            .create_task(NewTask {
                title: None,
                description: Some(format!("ACCESS REQUEST: {}", request)),
                repetition: None,
            })
            .await?;
        Ok(())
    }

    pub async fn check_connection(&self) -> ConnectionStatus {
        match self.gateway.get_heartbeat().await {
            Ok(_) => ConnectionStatus::Connected,
            Err(e) if e.is_configuration() => ConnectionStatus::NotConfigured,
            Err(e) => ConnectionStatus::Error(e.to_string()),
        }
    }

    pub async fn create_access(&self, entry: NewAccessEntry) -> Result<AccessEntry, GatewayError> {
        let created = self.gateway.create_access(entry).await?;
        self.reload_access().await;
        Ok(created)
    }

    pub async fn update_access(
        &self,
        id: &str,
        entry: NewAccessEntry,
    ) -> Result<AccessEntry, GatewayError> {
        let updated = self.gateway.update_access(id, entry).await?;
        self.reload_access().await;
        Ok(updated)
    }

    pub async fn delete_access(&self, id: &str) -> Result<(), GatewayError> {
        self.gateway.delete_access(id).await?;
        self.reload_access().await;
        Ok(())
    }

    async fn reload_access(&self) {
        if let Err(e) = self.load_access().await {
            tracing::warn!(error = %e, "Reload of access entries failed");
        }
    }

    /// Wipe worker data (best effort), stop polling and clear local state
    pub async fn reset_all(&self, scheduler: &PollingScheduler) {
        if let Err(e) = self.gateway.reset().await {
            tracing::warn!(error = %e, "Could not reset server data");
        }
        scheduler.stop();
        self.store.reset_local();
        *self.access.lock() = AccessState::default();
        tracing::info!("dashboard reset");
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl<G: Gateway> ViewActivation for SettingsPanel<G> {
    fn on_activate(self: Arc<Self>, runtime: &Handle) {
        runtime.spawn(async move {
            let _ = self.load_access().await;
        });
    }
}
