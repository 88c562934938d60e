use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::DEFAULT_HEARTBEAT_INTERVAL_MINUTES;

/// Status document the assistant pushes on every check-in.
///
/// Agents are free to add their own fields; anything not modelled here is
/// kept in `extra` so a read-modify-write from the dashboard does not drop it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    #[serde(rename = "novaStatus", default = "default_status")]
    pub assistant_status: String,
    #[serde(default)]
    pub active_threads: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_threads: Option<u32>,
    #[serde(default)]
    pub active_tasks: Vec<ActiveWork>,
    #[serde(default)]
    pub recently_completed: Vec<CompletedWork>,
    /// Check-in interval in minutes
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            assistant_status: default_status(),
            active_threads: 0,
            total_threads: None,
            active_tasks: Vec::new(),
            recently_completed: Vec::new(),
            interval: DEFAULT_HEARTBEAT_INTERVAL_MINUTES,
            last_heartbeat: None,
            extra: Map::new(),
        }
    }
}

impl Heartbeat {
    /// Same document with a new check-in interval
    pub fn with_interval(&self, minutes: u32) -> Self {
        Self {
            interval: minutes,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWork {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub eta: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWork {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_status() -> String {
    "idle".to_string()
}

fn default_interval() -> u32 {
    DEFAULT_HEARTBEAT_INTERVAL_MINUTES
}

/// Agent-supplied timestamps are not always ISO-8601; unparsable ones read as absent
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_default_document() {
        let json = r#"{"novaStatus":"idle","activeThreads":0,"activeTasks":[],"recentlyCompleted":[],"interval":60}"#;
        let hb: Heartbeat = serde_json::from_str(json).unwrap();
        assert_eq!(hb, Heartbeat::default());
    }

    #[test]
    fn test_missing_interval_defaults_to_sixty() {
        let hb: Heartbeat = serde_json::from_str(r#"{"novaStatus":"busy"}"#).unwrap();
        assert_eq!(hb.interval, 60);
        assert_eq!(hb.assistant_status, "busy");
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"novaStatus":"active","interval":30,"mood":"focused","queue":{"depth":3}}"#;
        let hb: Heartbeat = serde_json::from_str(json).unwrap();
        let updated = hb.with_interval(120);

        let value = serde_json::to_value(&updated).unwrap();
        assert_eq!(value["interval"], 120);
        assert_eq!(value["mood"], "focused");
        assert_eq!(value["queue"]["depth"], 3);
        assert_eq!(value["novaStatus"], "active");
    }

    #[test]
    fn test_work_item_dates_are_normalized() {
        let json = r#"{
            "activeTasks": [{"title": "triage inbox", "startedAt": "2026-03-01T10:00:00Z", "eta": "soon"}],
            "recentlyCompleted": [{"title": "backup", "completedAt": 1772359200000}],
            "lastHeartbeat": "2026-03-01T10:05:00.000Z"
        }"#;
        let hb: Heartbeat = serde_json::from_str(json).unwrap();
        assert!(hb.active_tasks[0].started_at.is_some());
        assert!(hb.active_tasks[0].eta.is_none());
        assert!(hb.recently_completed[0].completed_at.is_some());
        assert!(hb.last_heartbeat.is_some());
    }
}
