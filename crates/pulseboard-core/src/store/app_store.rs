//! The single owner of [`AppState`].
//!
//! State lives behind a mutex as an `Arc` snapshot and is updated
//! copy-on-write, so `get_state()` hands out an immutable value that later
//! writes never touch. Two write paths exist:
//!
//! - change-detected (`navigate_to_view`, `set_theme`, `set_section_data`):
//!   the old and new state are compared and listeners are only notified when
//!   something actually differs. Polls rewrite the same data every 30 s, so
//!   this is what keeps redundant polls from triggering redraws.
//! - unconditional (`set_state` and the profile accessors): always notifies.
//!
//! Listeners are always called after the state lock is released.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::constants::keys;
use crate::emitter::{ChangeEmitter, Subscription};
use crate::models::{
    AppState, AssistantProfile, BadgeCounts, ProfilePatch, Section, SectionPatch, Theme, View,
};
use crate::store::persistence::{KeyValueStore, MemoryStore};

/// Root-level partial for [`Store::set_state`]
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub current_view: Option<View>,
    pub theme: Option<Theme>,
    pub assistant_profile: Option<AssistantProfile>,
}

pub struct Store {
    state: Mutex<Arc<AppState>>,
    emitter: ChangeEmitter,
    persistence: Arc<dyn KeyValueStore>,
}

impl Store {
    /// Build a store, restoring theme and assistant profile from `persistence`
    pub fn new(persistence: Arc<dyn KeyValueStore>) -> Self {
        let theme = persistence
            .read(keys::THEME)
            .and_then(|id| Theme::from_id(&id))
            .unwrap_or_default();
        let assistant_profile = Self::load_assistant_profile(persistence.as_ref());

        let state = AppState {
            theme,
            assistant_profile,
            ..AppState::default()
        };

        Self {
            state: Mutex::new(Arc::new(state)),
            emitter: ChangeEmitter::new(),
            persistence,
        }
    }

    /// Store backed by a throwaway [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn load_assistant_profile(persistence: &dyn KeyValueStore) -> AssistantProfile {
        let Some(saved) = persistence.read(keys::ASSISTANT_PROFILE) else {
            return AssistantProfile::default();
        };
        match serde_json::from_str(&saved) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse saved assistant profile");
                AssistantProfile::default()
            }
        }
    }

    /// Current state snapshot. Later writes produce a new snapshot and leave this one alone.
    pub fn get_state(&self) -> Arc<AppState> {
        self.state.lock().clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.emitter.subscribe(listener)
    }

    pub fn persistence(&self) -> &Arc<dyn KeyValueStore> {
        &self.persistence
    }

    /// Shallow-merge root fields and always notify, even if nothing changed
    pub fn set_state(&self, patch: StatePatch) {
        {
            let mut guard = self.state.lock();
            let state = Arc::make_mut(&mut guard);
            if let Some(view) = patch.current_view {
                state.current_view = view;
            }
            if let Some(theme) = patch.theme {
                state.theme = theme;
            }
            if let Some(profile) = patch.assistant_profile {
                state.assistant_profile = profile;
            }
        }
        self.emitter.emit();
    }

    /// Apply `mutator` and notify only if the resulting state differs from the previous one.
    /// Returns whether listeners were notified.
    fn with_change_detection<F>(&self, mutator: F) -> bool
    where
        F: FnOnce(&mut AppState),
    {
        let changed = {
            let mut guard = self.state.lock();
            let before = guard.clone();
            mutator(Arc::make_mut(&mut guard));
            if **guard == *before {
                // Keep the old allocation so unchanged snapshots stay pointer-equal
                *guard = before;
                false
            } else {
                true
            }
        };
        if changed {
            self.emitter.emit();
        }
        changed
    }

    pub fn navigate_to_view(&self, view: View) -> bool {
        self.with_change_detection(|state| state.current_view = view)
    }

    /// Set the theme and persist it. Persistence happens even when the theme is unchanged.
    pub fn set_theme(&self, theme: Theme) -> bool {
        let changed = self.with_change_detection(|state| state.theme = theme);
        self.persistence.persist(keys::THEME, theme.id());
        changed
    }

    /// Shallow-merge `patch` into one section, creating it if absent
    pub fn set_section_data(&self, section: Section, patch: SectionPatch) -> bool {
        self.with_change_detection(|state| {
            state.sections.entry(section).or_default().merge(patch);
        })
    }

    pub fn get_badge_counts(&self) -> BadgeCounts {
        BadgeCounts::from_tasks(self.get_state().tasks())
    }

    pub fn get_assistant_profile(&self) -> AssistantProfile {
        self.get_state().assistant_profile.clone()
    }

    /// Merge into the profile, notify unconditionally, and persist
    pub fn update_assistant_profile(&self, patch: ProfilePatch) -> AssistantProfile {
        let mut profile = self.get_assistant_profile();
        profile.merge(patch);
        self.set_state(StatePatch {
            assistant_profile: Some(profile.clone()),
            ..Default::default()
        });
        match serde_json::to_string(&profile) {
            Ok(json) => self.persistence.persist(keys::ASSISTANT_PROFILE, &json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize assistant profile"),
        }
        profile
    }

    /// Back to the default profile; the persisted copy is removed
    pub fn reset_assistant_profile(&self) {
        self.set_state(StatePatch {
            assistant_profile: Some(AssistantProfile::default()),
            ..Default::default()
        });
        self.persistence.remove(keys::ASSISTANT_PROFILE);
    }

    /// Drop every local preference and all section data. The current view is kept.
    pub fn reset_local(&self) {
        self.persistence.clear();
        {
            let mut guard = self.state.lock();
            let current_view = guard.current_view;
            *guard = Arc::new(AppState {
                current_view,
                ..AppState::default()
            });
        }
        self.emitter.emit();
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SectionData, Task, TaskStatus};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(store: &Store) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let sub = store.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, sub)
    }

    fn task(id: &str, status: TaskStatus) -> Task {
        let mut t = Task::new(id, None, Some(format!("task {}", id)), None, Utc::now());
        t.status = status;
        t
    }

    #[test]
    fn test_navigate_twice_emits_once() {
        let store = Store::in_memory();
        let (count, _sub) = counting(&store);

        assert!(store.navigate_to_view(View::Heartbeat));
        assert!(!store.navigate_to_view(View::Heartbeat));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_state().current_view, View::Heartbeat);
    }

    #[test]
    fn test_navigate_to_current_view_is_silent() {
        let store = Store::in_memory();
        let (count, _sub) = counting(&store);
        store.navigate_to_view(View::Tasks);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_repeated_section_write_emits_once() {
        let store = Store::in_memory();
        let (count, _sub) = counting(&store);

        store.set_section_data(Section::Tasks, SectionPatch::loading(true));
        store.set_section_data(Section::Tasks, SectionPatch::loading(true));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let tasks = vec![task("a", TaskStatus::Pending)];
        store.set_section_data(Section::Tasks, SectionPatch::loaded(SectionData::Tasks(tasks.clone())));
        store.set_section_data(Section::Tasks, SectionPatch::loaded(SectionData::Tasks(tasks)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_section_merge_preserves_siblings() {
        let store = Store::in_memory();
        let tasks = vec![task("a", TaskStatus::Pending)];
        store.set_section_data(Section::Tasks, SectionPatch::loaded(SectionData::Tasks(tasks)));
        store.set_section_data(Section::Tasks, SectionPatch::loading(true));

        let state = store.get_state();
        assert!(state.is_loading(Section::Tasks));
        assert_eq!(state.tasks().len(), 1);
        assert!(state.section(Section::Heartbeat).is_none());
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_writes() {
        let store = Store::in_memory();
        let before = store.get_state();
        store.navigate_to_view(View::Settings);
        assert_eq!(before.current_view, View::Tasks);
        assert_eq!(store.get_state().current_view, View::Settings);
    }

    #[test]
    fn test_unchanged_write_keeps_snapshot_identity() {
        let store = Store::in_memory();
        let before = store.get_state();
        store.navigate_to_view(View::Tasks);
        assert!(Arc::ptr_eq(&before, &store.get_state()));
    }

    #[test]
    fn test_set_state_always_emits() {
        let store = Store::in_memory();
        let (count, _sub) = counting(&store);
        store.set_state(StatePatch::default());
        store.set_state(StatePatch::default());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_can_read_state() {
        let store = Arc::new(Store::in_memory());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s, v) = (store.clone(), seen.clone());
        let _sub = store.subscribe(move || v.lock().push(s.get_state().current_view));

        store.navigate_to_view(View::Heartbeat);
        store.navigate_to_view(View::Settings);
        assert_eq!(*seen.lock(), vec![View::Heartbeat, View::Settings]);
    }

    #[test]
    fn test_badge_counts() {
        let store = Store::in_memory();
        assert_eq!(store.get_badge_counts(), BadgeCounts::default());

        let tasks = vec![
            task("a", TaskStatus::Pending),
            task("b", TaskStatus::InProgress),
            task("c", TaskStatus::Pending),
            task("d", TaskStatus::Completed),
        ];
        store.set_section_data(Section::Tasks, SectionPatch::loaded(SectionData::Tasks(tasks)));
        assert_eq!(
            store.get_badge_counts(),
            BadgeCounts {
                tasks: 2,
                tasks_running: true
            }
        );
    }

    #[test]
    fn test_theme_is_persisted_and_restored() {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = Store::new(persistence.clone());
        store.set_theme(Theme::Dark);
        assert_eq!(persistence.read(keys::THEME).as_deref(), Some("dark"));

        let restored = Store::new(persistence);
        assert_eq!(restored.get_state().theme, Theme::Dark);
    }

    #[test]
    fn test_profile_updates_always_emit_and_persist() {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = Store::new(persistence.clone());
        let (count, _sub) = counting(&store);

        let patch = ProfilePatch {
            name: Some("Atlas".into()),
            ..Default::default()
        };
        store.update_assistant_profile(patch.clone());
        store.update_assistant_profile(patch);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        let restored = Store::new(persistence.clone());
        assert_eq!(restored.get_assistant_profile().name, "Atlas");
        assert_eq!(restored.get_assistant_profile().initials, "N");

        store.reset_assistant_profile();
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(store.get_assistant_profile(), AssistantProfile::default());
        assert!(persistence.read(keys::ASSISTANT_PROFILE).is_none());
    }

    #[test]
    fn test_corrupt_saved_profile_falls_back_to_default() {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        persistence.persist(keys::ASSISTANT_PROFILE, "{broken");
        persistence.persist(keys::THEME, "sepia");
        let store = Store::new(persistence);
        assert_eq!(store.get_assistant_profile(), AssistantProfile::default());
        assert_eq!(store.get_state().theme, Theme::System);
    }

    #[test]
    fn test_reset_local_keeps_view() {
        let persistence: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = Store::new(persistence.clone());
        store.set_theme(Theme::Light);
        store.navigate_to_view(View::Settings);
        store.set_section_data(Section::Tasks, SectionPatch::loading(true));

        store.reset_local();
        let state = store.get_state();
        assert_eq!(state.current_view, View::Settings);
        assert_eq!(state.theme, Theme::System);
        assert!(state.sections.is_empty());
        assert!(persistence.read(keys::THEME).is_none());
    }
}
