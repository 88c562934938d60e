use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A capability the assistant reports having (mail, calendar, repos, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_status")]
    pub status: String,
    /// Free-form, either an object or a string
    #[serde(default)]
    pub details: Value,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessEntry {
    /// Build a stored entry from a creation request, applying the worker's defaults
    pub fn from_new(id: impl Into<String>, entry: NewAccessEntry, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: entry.name.unwrap_or_default(),
            kind: entry.kind.unwrap_or_else(default_kind),
            description: entry.description.unwrap_or_default(),
            status: entry.status.unwrap_or_else(default_status),
            details: entry
                .details
                .unwrap_or_else(|| Value::Object(Default::default())),
            icon: entry.icon.unwrap_or_else(default_icon),
            order: entry.order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge an update; id and creation time never change
    pub fn apply(&mut self, update: NewAccessEntry, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(details) = update.details {
            self.details = details;
        }
        if let Some(icon) = update.icon {
            self.icon = icon;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
        self.updated_at = now;
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

/// Body for creating or updating an access entry. Only present fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAccessEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

fn default_kind() -> String {
    "General".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

fn default_icon() -> String {
    "circle".to_string()
}
