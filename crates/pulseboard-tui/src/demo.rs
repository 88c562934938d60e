use chrono::{Duration, Utc};
use pulseboard_core::models::{ActiveWork, Heartbeat, Repetition, Task, TaskStatus};
use pulseboard_core::MemoryGateway;

/// In-memory worker with a few tasks and a live-looking heartbeat
pub fn demo_gateway() -> MemoryGateway {
    let now = Utc::now();
    let task = |id: &str,
                description: &str,
                status: TaskStatus,
                repetition: Option<Repetition>,
                age_minutes: i64| {
        let mut task = Task::new(
            id,
            None,
            Some(description.to_string()),
            repetition,
            now - Duration::minutes(age_minutes),
        );
        task.apply_status(status, now - Duration::minutes(age_minutes / 2));
        task
    };

    let tasks = vec![
        task("demo-1", "Summarize unread newsletters", TaskStatus::Pending, Some(Repetition::Daily), 5),
        task("demo-2", "Draft the weekly status report", TaskStatus::InProgress, None, 40),
        task("demo-3", "Book dentist appointment", TaskStatus::Pending, None, 90),
        task("demo-4", "Triage GitHub notifications", TaskStatus::Completed, Some(Repetition::EveryHour), 120),
        task("demo-5", "Rename vacation photos", TaskStatus::Completed, None, 600),
    ];

    let heartbeat = Heartbeat {
        assistant_status: "working".to_string(),
        active_threads: 2,
        total_threads: Some(5),
        active_tasks: vec![ActiveWork {
            title: "Draft the weekly status report".to_string(),
            started_at: Some(now - Duration::minutes(20)),
            eta: None,
            extra: Default::default(),
        }],
        last_heartbeat: Some(now - Duration::minutes(3)),
        ..Default::default()
    };

    MemoryGateway::with_tasks(tasks).with_heartbeat(heartbeat)
}
