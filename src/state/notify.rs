// Transient user-facing notifications.
// Holds the one visible message and its dismiss timer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::event::{AppEvent, EventSender};

/// How long a notification stays fully visible.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(3000);
/// Length of the exit transition before removal.
pub const EXIT_DURATION: Duration = Duration::from_millis(300);

/// Notification category, drives styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// Stage of a notification's dismiss timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Display window elapsed; start the exit transition.
    Hide,
    /// Exit transition elapsed; remove.
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    Visible,
    Leaving,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub phase: NotificationPhase,
}

/// Shows at most one notification; a newer one replaces it and restarts the timer.
#[derive(Debug)]
pub struct NotificationQueue {
    events: EventSender,
    current: Option<Notification>,
    timer: Option<JoinHandle<()>>,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            current: None,
            timer: None,
            next_id: 1,
        }
    }

    /// Display `message` now, replacing whatever is showing.
    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        tracing::debug!(id, ?kind, %message, "notification shown");

        self.current = Some(Notification {
            id,
            message,
            kind,
            created_at: Utc::now(),
            phase: NotificationPhase::Visible,
        });

        let events = self.events.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(DISPLAY_DURATION).await;
            if events
                .send(AppEvent::NotificationTimer {
                    id,
                    phase: TimerPhase::Hide,
                })
                .is_err()
            {
                return;
            }
            tokio::time::sleep(EXIT_DURATION).await;
            let _ = events.send(AppEvent::NotificationTimer {
                id,
                phase: TimerPhase::Remove,
            });
        }));

        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Success)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Error)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.show(message, NotificationKind::Info)
    }

    /// Apply a dismiss timer event. Events for replaced notifications are ignored.
    pub fn on_timer(&mut self, id: u64, phase: TimerPhase) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if current.id != id {
            tracing::debug!(id, current = current.id, "stale notification timer");
            return;
        }
        match phase {
            TimerPhase::Hide => current.phase = NotificationPhase::Leaving,
            TimerPhase::Remove => {
                self.current = None;
                self.timer = None;
            }
        }
    }

    /// Remove the visible notification immediately.
    pub fn dismiss(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.current = None;
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{self, EventReceiver};
    use tokio::time::sleep;

    fn drain(queue: &mut NotificationQueue, rx: &mut EventReceiver) {
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::NotificationTimer { id, phase } = event {
                queue.on_timer(id, phase);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle() {
        let (tx, mut rx) = event::channel();
        let mut queue = NotificationQueue::new(tx);

        queue.success("Story saved successfully!");
        let shown = queue.current().unwrap();
        assert_eq!(shown.kind, NotificationKind::Success);
        assert_eq!(shown.phase, NotificationPhase::Visible);

        sleep(Duration::from_millis(2990)).await;
        drain(&mut queue, &mut rx);
        assert_eq!(queue.current().unwrap().phase, NotificationPhase::Visible);

        sleep(Duration::from_millis(20)).await;
        drain(&mut queue, &mut rx);
        assert_eq!(queue.current().unwrap().phase, NotificationPhase::Leaving);

        sleep(Duration::from_millis(300)).await;
        drain(&mut queue, &mut rx);
        assert!(queue.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_gets_fresh_window() {
        let (tx, mut rx) = event::channel();
        let mut queue = NotificationQueue::new(tx);

        queue.show("Saved!", NotificationKind::Success);
        sleep(Duration::from_millis(100)).await;
        queue.show("Oops", NotificationKind::Error);

        let current = queue.current().unwrap();
        assert_eq!(current.message, "Oops");
        assert_eq!(current.kind, NotificationKind::Error);

        // Past the first message's window, inside the second's
        sleep(Duration::from_millis(2950)).await;
        drain(&mut queue, &mut rx);
        let current = queue.current().unwrap();
        assert_eq!(current.message, "Oops");
        assert_eq!(current.phase, NotificationPhase::Visible);

        // 3000ms after the second show
        sleep(Duration::from_millis(100)).await;
        drain(&mut queue, &mut rx);
        assert_eq!(queue.current().unwrap().phase, NotificationPhase::Leaving);

        sleep(Duration::from_millis(300)).await;
        drain(&mut queue, &mut rx);
        assert!(queue.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_events_are_ignored() {
        let (tx, _rx) = event::channel();
        let mut queue = NotificationQueue::new(tx);

        let first = queue.info("Please log in to save stories");
        let second = queue.error("Failed to save story");
        queue.on_timer(first, TimerPhase::Remove);
        assert_eq!(queue.current().unwrap().id, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss() {
        let (tx, mut rx) = event::channel();
        let mut queue = NotificationQueue::new(tx);

        queue.info("Settings saved!");
        queue.dismiss();
        assert!(queue.current().is_none());

        sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
