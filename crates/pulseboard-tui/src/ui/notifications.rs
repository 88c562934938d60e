//! Status bar feedback for task, profile and connection actions.

use std::time::{Duration, Instant};

/// Ordered by severity; a more severe message pre-empts the one on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn icon(self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        }
    }

    fn default_lifetime(self) -> Duration {
        match self {
            NotificationLevel::Info | NotificationLevel::Success => Duration::from_secs(3),
            NotificationLevel::Warning => Duration::from_secs(4),
            NotificationLevel::Error => Duration::from_secs(6),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    lifetime: Duration,
}

impl Notification {
    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            lifetime: level.default_lifetime(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// Keep on screen for `lifetime` instead of the level's default
    pub fn lasting(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }
}

#[derive(Debug)]
struct OnScreen {
    notification: Notification,
    until: Instant,
}

/// One message on screen, the rest waiting by severity then arrival
#[derive(Debug, Default)]
pub struct NotificationQueue {
    on_screen: Option<OnScreen>,
    waiting: Vec<Notification>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repeats of a message already shown or waiting are dropped
    pub fn push(&mut self, notification: Notification) {
        self.push_at(notification, Instant::now());
    }

    fn push_at(&mut self, notification: Notification, now: Instant) {
        let seen = self
            .current()
            .into_iter()
            .chain(self.waiting.iter())
            .any(|n| n.message == notification.message);
        if seen {
            return;
        }

        let pre_empts = self
            .current()
            .map_or(true, |shown| notification.level > shown.level);
        if pre_empts {
            self.show(notification, now);
        } else {
            self.waiting.push(notification);
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.on_screen.as_ref().map(|s| &s.notification)
    }

    pub fn dismiss(&mut self) {
        self.on_screen = None;
        self.show_next(Instant::now());
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if self.on_screen.as_ref().is_some_and(|s| now >= s.until) {
            self.on_screen = None;
            self.show_next(now);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.on_screen.is_none() && self.waiting.is_empty()
    }

    fn show(&mut self, notification: Notification, now: Instant) {
        let until = now + notification.lifetime;
        self.on_screen = Some(OnScreen {
            notification,
            until,
        });
    }

    fn show_next(&mut self, now: Instant) {
        let mut next: Option<usize> = None;
        for (idx, candidate) in self.waiting.iter().enumerate() {
            if next.map_or(true, |best| candidate.level > self.waiting[best].level) {
                next = Some(idx);
            }
        }
        if let Some(idx) = next {
            let notification = self.waiting.remove(idx);
            self.show(notification, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_pick_lifetimes() {
        assert_eq!(Notification::info("x").lifetime, Duration::from_secs(3));
        assert_eq!(Notification::error("x").lifetime, Duration::from_secs(6));
        let n = Notification::warning("x").lasting(Duration::from_secs(10));
        assert_eq!(n.lifetime, Duration::from_secs(10));
    }

    #[test]
    fn test_error_pre_empts_info() {
        let mut q = NotificationQueue::new();
        q.push(Notification::info("Task created"));
        q.push(Notification::error("Failed to update task"));
        assert_eq!(q.current().unwrap().message, "Failed to update task");

        // The pre-empted message is gone, not queued
        q.dismiss();
        assert!(q.is_empty());
    }

    #[test]
    fn test_waiting_messages_by_severity_then_arrival() {
        let mut q = NotificationQueue::new();
        q.push(Notification::error("Reload failed"));
        q.push(Notification::info("Theme: dark"));
        q.push(Notification::warning("Please enter a task description"));
        q.push(Notification::info("Profile saved"));
        q.push(Notification::info("Theme: dark"));

        let mut order = Vec::new();
        while let Some(n) = q.current() {
            order.push(n.message.clone());
            q.dismiss();
        }
        assert_eq!(
            order,
            vec![
                "Reload failed",
                "Please enter a task description",
                "Theme: dark",
                "Profile saved",
            ]
        );
    }

    #[test]
    fn test_tick_expires_after_lifetime() {
        let start = Instant::now();
        let mut q = NotificationQueue::new();
        q.push_at(Notification::success("Task deleted"), start);
        q.push_at(Notification::info("Access request sent"), start);

        q.tick_at(start + Duration::from_secs(2));
        assert_eq!(q.current().unwrap().message, "Task deleted");

        q.tick_at(start + Duration::from_secs(3));
        assert_eq!(q.current().unwrap().message, "Access request sent");

        q.tick_at(start + Duration::from_secs(7));
        assert!(q.is_empty());
    }
}
