use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{AccessEntry, AssistantProfile, Heartbeat, Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Tasks,
    Heartbeat,
    Settings,
}

impl View {
    pub const ALL: [View; 3] = [View::Tasks, View::Heartbeat, View::Settings];

    pub fn id(self) -> &'static str {
        match self {
            View::Tasks => "tasks",
            View::Heartbeat => "heartbeat",
            View::Settings => "settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Tasks => "Tasks",
            View::Heartbeat => "Heartbeat",
            View::Settings => "Settings",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        View::ALL.into_iter().find(|v| v.id() == id)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn id(self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "system" => Some(Theme::System),
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// system -> light -> dark -> system
    pub fn cycle(self) -> Self {
        match self {
            Theme::System => Theme::Light,
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::System,
        }
    }
}

/// Named slice of application state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Tasks,
    Heartbeat,
    HeartbeatContent,
    Access,
}

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Tasks => "tasks",
            Section::Heartbeat => "heartbeat",
            Section::HeartbeatContent => "heartbeat_content",
            Section::Access => "access",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionData {
    Tasks(Vec<Task>),
    Heartbeat(Heartbeat),
    HeartbeatContent(String),
    Access(Vec<AccessEntry>),
}

impl SectionData {
    pub fn as_tasks(&self) -> Option<&[Task]> {
        match self {
            SectionData::Tasks(tasks) => Some(tasks),
            _ => None,
        }
    }

    pub fn as_heartbeat(&self) -> Option<&Heartbeat> {
        match self {
            SectionData::Heartbeat(hb) => Some(hb),
            _ => None,
        }
    }

    pub fn as_heartbeat_content(&self) -> Option<&str> {
        match self {
            SectionData::HeartbeatContent(content) => Some(content),
            _ => None,
        }
    }

    pub fn as_access(&self) -> Option<&[AccessEntry]> {
        match self {
            SectionData::Access(entries) => Some(entries),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionState {
    pub data: Option<SectionData>,
    pub loading: bool,
}

impl SectionState {
    /// Shallow merge: only fields present in the patch are overwritten
    pub fn merge(&mut self, patch: SectionPatch) {
        if let Some(data) = patch.data {
            self.data = Some(data);
        }
        if let Some(loading) = patch.loading {
            self.loading = loading;
        }
    }
}

/// Partial update for one section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionPatch {
    pub data: Option<SectionData>,
    pub loading: Option<bool>,
}

impl SectionPatch {
    /// `{data, loading: false}`, what every successful fetch writes
    pub fn loaded(data: SectionData) -> Self {
        Self {
            data: Some(data),
            loading: Some(false),
        }
    }

    pub fn loading(loading: bool) -> Self {
        Self {
            data: None,
            loading: Some(loading),
        }
    }

    pub fn data(data: SectionData) -> Self {
        Self {
            data: Some(data),
            loading: None,
        }
    }
}

/// Root of all dashboard state. Only the [`crate::store::Store`] mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub current_view: View,
    pub theme: Theme,
    pub assistant_profile: AssistantProfile,
    /// Sections are absent until their first write
    pub sections: BTreeMap<Section, SectionState>,
}

impl AppState {
    pub fn section(&self, section: Section) -> Option<&SectionState> {
        self.sections.get(&section)
    }

    pub fn section_data(&self, section: Section) -> Option<&SectionData> {
        self.sections.get(&section).and_then(|s| s.data.as_ref())
    }

    pub fn is_loading(&self, section: Section) -> bool {
        self.sections.get(&section).is_some_and(|s| s.loading)
    }

    /// Tasks from the tasks section, empty when absent or holding something else
    pub fn tasks(&self) -> &[Task] {
        self.section_data(Section::Tasks)
            .and_then(SectionData::as_tasks)
            .unwrap_or(&[])
    }

    /// `None` until a task list has been written
    pub fn tasks_section(&self) -> Option<&[Task]> {
        self.section_data(Section::Tasks)
            .and_then(SectionData::as_tasks)
    }

    pub fn heartbeat(&self) -> Option<&Heartbeat> {
        self.section_data(Section::Heartbeat)
            .and_then(SectionData::as_heartbeat)
    }

    pub fn heartbeat_content(&self) -> Option<&str> {
        self.section_data(Section::HeartbeatContent)
            .and_then(SectionData::as_heartbeat_content)
    }

    pub fn access(&self) -> &[AccessEntry] {
        self.section_data(Section::Access)
            .and_then(SectionData::as_access)
            .unwrap_or(&[])
    }
}

/// Sidebar badge numbers derived from the tasks section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadgeCounts {
    /// Number of pending tasks
    pub tasks: usize,
    pub tasks_running: bool,
}

impl BadgeCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self {
            tasks: tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Pending)
                .count(),
            tasks_running: tasks.iter().any(|t| t.status == TaskStatus::InProgress),
        }
    }
}
