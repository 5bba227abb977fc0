use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::{FileSession, SessionId, SessionState, SessionStatus};
use crate::capability::CapabilityBroker;
use crate::editor::EditorAdapter;
use crate::error::{Result, SessionError};
use crate::notice::{NoticeLevel, Notifier};

/// Text shown in the editor while a file is being read.
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Result of [`SessionManager::open_new_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened { id: SessionId, name: String },
    /// The user dismissed the picker; nothing changed.
    Cancelled,
}

/// Result of a successful [`SessionManager::save_current_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub id: SessionId,
    pub name: String,
    pub bytes: usize,
}

type Slot = Arc<Mutex<Option<FileSession>>>;

/// Owns the single active file session.
///
/// `open_new_file` and `save_current_file` hold the session slot for their
/// whole duration, so overlapping triggers run one after another.
pub struct SessionManager {
    broker: Arc<dyn CapabilityBroker>,
    editor: Arc<dyn EditorAdapter>,
    notifier: Arc<dyn Notifier>,
    slot: Slot,
    status: watch::Sender<SessionStatus>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

/// Clears the busy flag however the operation ends, including task abort.
struct BusyGuard<'a> {
    status: &'a watch::Sender<SessionStatus>,
}

impl<'a> BusyGuard<'a> {
    fn enter(status: &'a watch::Sender<SessionStatus>) -> Self {
        status.send_modify(|s| s.busy = true);
        Self { status }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.status.send_modify(|s| s.busy = false);
    }
}

impl SessionManager {
    pub fn new(
        broker: Arc<dyn CapabilityBroker>,
        editor: Arc<dyn EditorAdapter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (status, _) = watch::channel(SessionStatus::default());
        Self {
            broker,
            editor,
            notifier,
            slot: Arc::new(Mutex::new(None)),
            status,
            next_id: AtomicU64::new(1),
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Let the user pick a file and make it the active session.
    ///
    /// The capability is acquired before anything else changes, so a
    /// cancelled or refused pick leaves the current session, its stream and
    /// the editor untouched. Once a new file is granted, the old stream is
    /// closed (best-effort) before the new one is opened.
    ///
    /// # Errors
    ///
    /// Returns broker, open and read failures after reporting them. A read
    /// failure leaves the new session active (state `ReadFailed`).
    pub async fn open_new_file(&self) -> Result<OpenOutcome> {
        let mut slot = self.slot.lock().await;
        let _busy = BusyGuard::enter(&self.status);

        let capability = match self.broker.acquire().await {
            Ok(capability) => capability,
            Err(SessionError::UserCancelled) => {
                tracing::info!("file selection cancelled");
                return Ok(OpenOutcome::Cancelled);
            }
            Err(err) => {
                self.report(NoticeLevel::Error, format!("Error choosing file: {err}"));
                return Err(err);
            }
        };

        if let Some(mut previous) = slot.take() {
            self.set_state(SessionState::Idle, None);
            match previous.close().await {
                Ok(_) => tracing::info!(id = previous.id(), file = previous.name(), "closed session"),
                Err(err) => self.report(
                    NoticeLevel::Warning,
                    format!("Error closing {}: {err}", previous.name()),
                ),
            }
        }

        let stream = match capability.open_writable().await {
            Ok(stream) => stream,
            Err(err) => {
                self.report(
                    NoticeLevel::Error,
                    format!("Error opening {}: {err}", capability.name()),
                );
                return Err(err);
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = capability.name().to_string();
        let session = slot.insert(FileSession::new(id, capability, stream));
        tracing::info!(id, file = %name, "opened session");

        self.editor.set_read_only(true);
        self.editor.set_content(LOADING_PLACEHOLDER);
        self.set_state(SessionState::Loading, Some(name.clone()));

        let read = session.capability().read().await;
        match read {
            Ok(text) => {
                self.editor.set_content(&text);
                self.editor.set_read_only(false);
                self.set_state(SessionState::Ready, Some(name.clone()));
                tracing::info!(id, file = %name, bytes = text.len(), "loaded file");
                Ok(OpenOutcome::Opened { id, name })
            }
            Err(err) => {
                // The session stays active: a display failure must not block saving.
                self.editor.set_content("");
                self.editor.set_read_only(false);
                self.set_state(SessionState::ReadFailed, Some(name));
                self.report(
                    NoticeLevel::Error,
                    format!("Error reading file: {err}. Saving will overwrite it."),
                );
                Err(err)
            }
        }
    }

    /// Write the editor's content through the active session's stream.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveFile`] when nothing is open; otherwise the
    /// stream's write failure. Both are reported first. The stream stays open
    /// after a failed write.
    pub async fn save_current_file(&self) -> Result<SaveReceipt> {
        let mut slot = self.slot.lock().await;
        let _busy = BusyGuard::enter(&self.status);

        let Some(session) = slot.as_mut() else {
            self.report(NoticeLevel::Warning, "Error: No file currently opened".to_string());
            return Err(SessionError::NoActiveFile);
        };

        let text = self.editor.content();
        match session.write(&text).await {
            Ok(()) => {
                tracing::info!(id = session.id(), file = session.name(), bytes = text.len(), "saved file");
                Ok(SaveReceipt {
                    id: session.id(),
                    name: session.name().to_string(),
                    bytes: text.len(),
                })
            }
            Err(err) => {
                self.report(NoticeLevel::Error, format!("Error writing to file: {err}"));
                Err(err)
            }
        }
    }

    /// Close the active session's stream on exit without waiting for it.
    ///
    /// Returns the spawned close task, or `None` when there was nothing to
    /// close. Callers may drop the handle or give it a bounded grace period.
    /// If an open or save is still running, the close runs once that
    /// operation releases the session.
    pub fn teardown(&self) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            // Without a runtime nothing can be awaited; dropping the session
            // still releases the stream's OS handle.
            if let Ok(mut slot) = self.slot.try_lock()
                && let Some(session) = slot.take()
            {
                tracing::warn!(file = session.name(), "teardown outside runtime, dropping stream");
                drop(session);
                self.set_state(SessionState::Idle, None);
            }
            return None;
        };

        if let Ok(mut slot) = self.slot.try_lock() {
            let session = slot.take()?;
            drop(slot);
            self.set_state(SessionState::Idle, None);
            return Some(runtime.spawn(close_quietly(session)));
        }

        let slot = Arc::clone(&self.slot);
        let status = self.status.clone();
        Some(runtime.spawn(async move {
            let session = slot.lock().await.take();
            if let Some(session) = session {
                status.send_modify(|s| {
                    s.state = SessionState::Idle;
                    s.file_name = None;
                });
                close_quietly(session).await;
            }
        }))
    }

    fn set_state(&self, state: SessionState, file_name: Option<String>) {
        self.status.send_modify(|s| {
            s.state = state;
            s.file_name = file_name;
        });
    }

    fn report(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Error => tracing::error!("{message}"),
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Info => tracing::info!("{message}"),
        }
        self.notifier.notify(level, message);
    }
}

async fn close_quietly(mut session: FileSession) {
    match session.close().await {
        Ok(_) => tracing::info!(id = session.id(), file = session.name(), "closed session on exit"),
        Err(err) => tracing::warn!(file = session.name(), "close on exit failed: {err}"),
    }
}
