//! User-visible notifications.
//!
//! The session manager reports every failure here before returning it, so the
//! user sees it even when the caller only logs the error.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: String);
}

/// The terminal app's notice channel.
impl Notifier for UnboundedSender<Notice> {
    fn notify(&self, level: NoticeLevel, message: String) {
        // A closed channel means the UI is gone; nothing left to show it on.
        let _ = self.send(Notice { level, message });
    }
}

/// Notifier that keeps every notice, for tests and headless callers.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notices at `level`, messages only.
    pub fn messages(&self, level: NoticeLevel) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, level: NoticeLevel, message: String) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notice { level, message });
    }
}
