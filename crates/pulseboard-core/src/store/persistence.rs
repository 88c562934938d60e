//! Durable key-value hook for user preferences (theme, assistant profile).
//!
//! Best effort throughout: failures are logged and swallowed, never returned.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn persist(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// All preferences in one pretty-printed JSON object at `<data_dir>/preferences.json`
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub const FILE_NAME: &'static str = "preferences.json";

    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join(Self::FILE_NAME);
        let values = Self::load_from_file(&path).unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(path: &Path) -> Option<BTreeMap<String, String>> {
        let contents = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(values) => Some(values),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences file");
                None
            }
        }
    }

    fn save_to_file(&self, values: &BTreeMap<String, String>) {
        if let Err(e) = self.write_atomically(values) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to save preferences");
        }
    }

    fn write_atomically(&self, values: &BTreeMap<String, String>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn persist(&self, key: &str, value: &str) {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.save_to_file(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.save_to_file(&values);
        }
    }

    fn clear(&self) {
        let mut values = self.values.lock();
        values.clear();
        self.save_to_file(&values);
    }
}

/// In-process store for tests and `--demo` runs
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn persist(&self, key: &str, value: &str) {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }

    fn clear(&self) {
        self.values.lock().clear();
    }
}
