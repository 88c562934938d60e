pub mod app_store;
pub mod persistence;

pub use crate::models::AppState;
pub use app_store::{StatePatch, Store};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore};
