use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Next state of the click cycle: pending -> in_progress -> completed -> pending
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "Status must be one of: pending, in_progress, completed (got '{}')",
                other
            )),
        }
    }
}

/// How often a recurring task comes back. `None` on a task means one-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Repetition {
    EveryHour,
    FewTimesDaily,
    TwiceDaily,
    Daily,
    Weekly,
    Monthly,
}

impl Repetition {
    pub const ALL: [Repetition; 6] = [
        Repetition::EveryHour,
        Repetition::FewTimesDaily,
        Repetition::TwiceDaily,
        Repetition::Daily,
        Repetition::Weekly,
        Repetition::Monthly,
    ];

    /// Minimum wait after completion before the task may run again
    pub fn cooldown(self) -> Duration {
        match self {
            Repetition::EveryHour => Duration::hours(1),
            Repetition::FewTimesDaily => Duration::hours(6),
            Repetition::TwiceDaily => Duration::hours(12),
            Repetition::Daily => Duration::hours(24),
            Repetition::Weekly => Duration::days(7),
            Repetition::Monthly => Duration::days(30),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Repetition::EveryHour => "every-hour",
            Repetition::FewTimesDaily => "few-times-daily",
            Repetition::TwiceDaily => "twice-daily",
            Repetition::Daily => "daily",
            Repetition::Weekly => "weekly",
            Repetition::Monthly => "monthly",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Repetition::EveryHour => "Every hour",
            Repetition::FewTimesDaily => "Few times a day",
            Repetition::TwiceDaily => "Twice a day",
            Repetition::Daily => "Daily",
            Repetition::Weekly => "Weekly",
            Repetition::Monthly => "Monthly",
        }
    }
}

impl std::str::FromStr for Repetition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Repetition::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown repetition '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    pub url: String,
    pub title: String,
}

/// Agents may send links as `{url, title}` objects or bare url strings; anything else is dropped
fn lenient_links<'de, D>(deserializer: D) -> Result<Vec<TaskLink>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(url) if !url.trim().is_empty() => Some(TaskLink {
                title: url.clone(),
                url,
            }),
            serde_json::Value::Object(map) => {
                let text = |key: &str| map.get(key).and_then(|v| v.as_str()).map(str::to_string);
                let url = text("url").filter(|u| !u.trim().is_empty())?;
                let title = text("title").filter(|t| !t.is_empty()).unwrap_or_else(|| url.clone());
                Some(TaskLink { url, title })
            }
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub repetition: Option<Repetition>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run_after: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_links")]
    pub links: Vec<TaskLink>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Task {
    /// Fresh pending task, with the title/description fallbacks the worker applies
    pub fn new(
        id: impl Into<String>,
        title: Option<String>,
        description: Option<String>,
        repetition: Option<Repetition>,
        now: DateTime<Utc>,
    ) -> Self {
        let title = title.filter(|t| !t.is_empty());
        let description = description.filter(|d| !d.is_empty());
        Self {
            id: id.into(),
            title: title
                .clone()
                .or_else(|| description.clone())
                .unwrap_or_else(|| "Untitled task".to_string()),
            description: description
                .or(title)
                .unwrap_or_else(|| "No description provided".to_string()),
            status: TaskStatus::Pending,
            repetition,
            created_at: now,
            started_at: None,
            completed_at: None,
            next_run_after: None,
            links: Vec::new(),
            notes: None,
        }
    }

    /// Display title, falling back to the description
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.description
        } else {
            &self.title
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.repetition.is_some()
    }

    /// Timestamp bookkeeping shared by the server and the optimistic client copy:
    /// `started_at` only on first entry to in_progress, `completed_at` on every
    /// entry to completed, both cleared on pending.
    pub fn apply_local_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        match status {
            TaskStatus::Pending => {
                self.started_at = None;
                self.completed_at = None;
            }
            TaskStatus::InProgress => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
            }
            TaskStatus::Completed => {
                self.completed_at = Some(now);
            }
        }
    }

    /// Full transition as the worker performs it. On top of
    /// [`Task::apply_local_status`], completing a recurring task schedules
    /// `next_run_after`; a reset to pending leaves it untouched.
    pub fn apply_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.apply_local_status(status, now);
        if status == TaskStatus::Completed {
            if let Some(repetition) = self.repetition {
                self.next_run_after = Some(now + repetition.cooldown());
            }
        }
    }

    pub fn cooldown(&self, now: DateTime<Utc>) -> Option<Cooldown> {
        self.repetition?;
        let next_run_after = self.next_run_after?;
        Some(Cooldown {
            on_cooldown: now < next_run_after,
            next_run_after,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub on_cooldown: bool,
    pub next_run_after: DateTime<Utc>,
}

/// Body of `POST /api/tasks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub repetition: Option<Repetition>,
}

/// Body of `PUT /api/tasks/:id`. A description edit also replaces the title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(None)` clears the repetition; `None` leaves it as is
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub repetition: Option<Option<Repetition>>,
}

/// Optional `notes`/`links` sent with a status change. Only present fields go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusExtras {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<TaskLink>>,
}

/// Serialize `Option<Option<T>>` so that `Some(None)` becomes an explicit `null`
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn pending_task() -> Task {
        Task::new("task-1", None, Some("write report".into()), None, at(0))
    }

    #[test]
    fn test_new_task_defaults_title_to_description() {
        let task = pending_task();
        assert_eq!(task.title, "write report");
        assert_eq!(task.description, "write report");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.repetition.is_none());
        assert!(task.links.is_empty());
    }

    #[test]
    fn test_new_task_fallbacks() {
        let task = Task::new("t", None, None, None, at(0));
        assert_eq!(task.title, "Untitled task");
        assert_eq!(task.description, "No description provided");

        let task = Task::new("t", Some("Only title".into()), None, None, at(0));
        assert_eq!(task.description, "Only title");
    }

    #[test]
    fn test_status_cycle_returns_to_pending() {
        let mut task = pending_task();

        task.apply_status(task.status.next(), at(10));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.started_at, Some(at(10)));
        assert!(task.completed_at.is_none());

        task.apply_status(task.status.next(), at(20));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(at(20)));

        task.apply_status(task.status.next(), at(30));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_started_at_kept_on_repeat_entry() {
        let mut task = pending_task();
        task.apply_status(TaskStatus::InProgress, at(10));
        task.apply_status(TaskStatus::InProgress, at(50));
        assert_eq!(task.started_at, Some(at(10)));
    }

    #[test]
    fn test_daily_cooldown_survives_reset() {
        let mut task = Task::new("t", None, Some("standup".into()), Some(Repetition::Daily), at(0));
        task.apply_status(TaskStatus::InProgress, at(10));
        task.apply_status(TaskStatus::Completed, at(100));

        let expected = at(100) + Duration::hours(24);
        assert_eq!(task.next_run_after, Some(expected));

        task.apply_status(TaskStatus::Pending, at(200));
        assert_eq!(task.next_run_after, Some(expected));
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());

        let cooldown = task.cooldown(at(300)).unwrap();
        assert!(cooldown.on_cooldown);
        assert!(!task.cooldown(expected + Duration::seconds(1)).unwrap().on_cooldown);
    }

    #[test]
    fn test_one_off_completion_has_no_cooldown() {
        let mut task = pending_task();
        task.apply_status(TaskStatus::Completed, at(5));
        assert!(task.next_run_after.is_none());
        assert!(task.cooldown(at(6)).is_none());
    }

    #[test]
    fn test_local_status_does_not_schedule() {
        let mut task = Task::new("t", None, Some("x".into()), Some(Repetition::Weekly), at(0));
        task.apply_local_status(TaskStatus::Completed, at(5));
        assert!(task.next_run_after.is_none());
    }

    #[test]
    fn test_cooldown_table() {
        assert_eq!(Repetition::EveryHour.cooldown(), Duration::hours(1));
        assert_eq!(Repetition::FewTimesDaily.cooldown(), Duration::hours(6));
        assert_eq!(Repetition::TwiceDaily.cooldown(), Duration::hours(12));
        assert_eq!(Repetition::Weekly.cooldown(), Duration::days(7));
        assert_eq!(Repetition::Monthly.cooldown(), Duration::days(30));
    }

    #[test]
    fn test_parse_worker_json() {
        let json = r#"{
            "id": "task-1700000000000-abc123",
            "title": "Update dashboard",
            "description": "Update the dashboard",
            "status": "in_progress",
            "repetition": "few-times-daily",
            "createdAt": "2026-01-10T08:00:00.000Z",
            "startedAt": "2026-01-10T09:30:00.000Z",
            "completedAt": null,
            "nextRunAfter": null,
            "links": [{"url": "https://example.com", "title": "Example"}],
            "notes": null
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.repetition, Some(Repetition::FewTimesDaily));
        assert_eq!(task.started_at.unwrap().to_rfc3339(), "2026-01-10T09:30:00+00:00");
        assert_eq!(task.links.len(), 1);
    }

    #[test]
    fn test_parse_links_from_strings_and_partial_objects() {
        let json = r#"[{
            "id": "task-1",
            "title": "Open PR",
            "description": "Open PR",
            "status": "completed",
            "createdAt": "2026-01-10T08:00:00.000Z",
            "links": ["https://github.com/x/pr/1", {"url": "https://example.com"}, 42, {"title": "no url"}]
        }, {
            "id": "task-2",
            "title": "Nothing linked",
            "description": "Nothing linked",
            "status": "pending",
            "createdAt": "2026-01-10T07:00:00.000Z",
            "links": null
        }]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(
            tasks[0].links,
            vec![
                TaskLink {
                    url: "https://github.com/x/pr/1".into(),
                    title: "https://github.com/x/pr/1".into(),
                },
                TaskLink {
                    url: "https://example.com".into(),
                    title: "https://example.com".into(),
                },
            ]
        );
        assert!(tasks[1].links.is_empty());
    }

    #[test]
    fn test_task_update_serializes_explicit_null() {
        let update = TaskUpdate {
            description: Some("new".into()),
            repetition: Some(None),
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({"description": "new", "repetition": null}));

        let untouched = TaskUpdate {
            description: Some("new".into()),
            repetition: None,
        };
        let value = serde_json::to_value(&untouched).unwrap();
        assert_eq!(value, serde_json::json!({"description": "new"}));
    }

    #[test]
    fn test_status_extras_only_sends_present_fields() {
        let value = serde_json::to_value(StatusExtras::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_parse_status_and_repetition() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("done".parse::<TaskStatus>().is_err());
        assert_eq!("twice-daily".parse::<Repetition>(), Ok(Repetition::TwiceDaily));
    }
}
