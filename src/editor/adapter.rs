use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::EditorBuffer;

/// The text widget as seen by the session manager.
pub trait EditorAdapter: Send + Sync {
    fn content(&self) -> String;
    fn set_content(&self, text: &str);
    fn set_read_only(&self, read_only: bool);
}

/// An [`EditorBuffer`] shared between the UI loop and session tasks.
///
/// Locks are held only for the duration of a single call, never across an
/// await point.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<EditorBuffer>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EditorBuffer::from_text(text))),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, EditorBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_read_only(&self) -> bool {
        self.lock().is_read_only()
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }
}

impl EditorAdapter for SharedBuffer {
    fn content(&self) -> String {
        self.lock().text()
    }

    fn set_content(&self, text: &str) {
        self.lock().set_text(text);
    }

    fn set_read_only(&self, read_only: bool) {
        self.lock().set_read_only(read_only);
    }
}
