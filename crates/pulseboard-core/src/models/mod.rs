pub mod access;
pub mod heartbeat;
pub mod profile;
pub mod state;
pub mod task;

pub use access::{AccessEntry, NewAccessEntry};
pub use heartbeat::{ActiveWork, CompletedWork, Heartbeat};
pub use profile::{AssistantProfile, ProfilePatch};
pub use state::{
    AppState, BadgeCounts, Section, SectionData, SectionPatch, SectionState, Theme, View,
};
pub use task::{
    Cooldown, NewTask, Repetition, StatusExtras, Task, TaskLink, TaskStatus, TaskUpdate,
};
