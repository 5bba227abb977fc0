//! File sessions and the manager that owns the active one.
//!
//! A [`FileSession`] pairs a capability with its open write stream. The
//! [`SessionManager`] keeps at most one of them and closes the outgoing
//! stream before a session is replaced or dropped.

mod manager;

pub use manager::{OpenOutcome, SaveReceipt, SessionManager};

use crate::capability::{FileCapability, WriteStream};
use crate::error::{IoOp, Result, SessionError};

/// Identifier of a session, unique per manager.
pub type SessionId = u64;

/// Lifecycle state of the manager's session slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session is active.
    #[default]
    Idle,
    /// A session is active and its contents are being read; the editor is
    /// read-only.
    Loading,
    /// A session is active and its contents are in the editor.
    Ready,
    /// A session is active but reading its contents failed.
    ReadFailed,
}

impl SessionState {
    pub const fn has_session(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Snapshot of the manager published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub file_name: Option<String>,
    /// An open or save currently holds the session slot.
    pub busy: bool,
}

/// One open capability and its write stream.
#[derive(Debug)]
pub struct FileSession {
    id: SessionId,
    capability: Box<dyn FileCapability>,
    stream: Option<Box<dyn WriteStream>>,
}

impl FileSession {
    pub fn new(
        id: SessionId,
        capability: Box<dyn FileCapability>,
        stream: Box<dyn WriteStream>,
    ) -> Self {
        Self {
            id,
            capability,
            stream: Some(stream),
        }
    }

    pub const fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.capability.name()
    }

    pub fn capability(&self) -> &dyn FileCapability {
        self.capability.as_ref()
    }

    pub const fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Write `text` through the session's stream.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::PlatformIo`] if the stream was already
    /// closed or the host write fails. The stream stays open on failure.
    pub async fn write(&mut self, text: &str) -> Result<()> {
        match self.stream.as_mut() {
            Some(stream) => stream.write(text).await,
            None => Err(SessionError::stream_closed(IoOp::Write)),
        }
    }

    /// Close the stream.
    ///
    /// The stream is detached from the session before the close is issued,
    /// so it is released even if closing reports an error, and a second call
    /// returns `Ok(false)` without touching it.
    ///
    /// # Errors
    ///
    /// Returns the host's close failure.
    pub async fn close(&mut self) -> Result<bool> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(false);
        };
        stream.close().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::MemoryFile;

    async fn open_session(file: &MemoryFile) -> FileSession {
        let stream = file.open_writable().await.unwrap();
        FileSession::new(1, Box::new(file.clone()), stream)
    }

    #[tokio::test]
    async fn test_close_twice_closes_stream_once() {
        let file = MemoryFile::new("a.txt", "hello");
        let mut session = open_session(&file).await;

        assert!(session.close().await.unwrap());
        assert!(!session.close().await.unwrap());
        assert_eq!(file.close_calls(), 1);
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_failed_close_still_detaches_stream() {
        let file = MemoryFile::new("a.txt", "hello").failing_close();
        let mut session = open_session(&file).await;

        assert!(session.close().await.is_err());
        assert!(!session.is_open());
        assert!(!session.close().await.unwrap());
        assert_eq!(file.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_write_after_close_fails_without_panicking() {
        let file = MemoryFile::new("a.txt", "hello");
        let mut session = open_session(&file).await;
        session.close().await.unwrap();

        let err = session.write("late").await.unwrap_err();
        assert!(matches!(err, SessionError::PlatformIo { op: IoOp::Write, .. }));
        assert!(file.writes().is_empty());
    }

    #[tokio::test]
    async fn test_write_goes_through_stream() {
        let file = MemoryFile::new("a.txt", "hello");
        let mut session = open_session(&file).await;
        session.write("hello world").await.unwrap();
        assert_eq!(session.name(), "a.txt");
        assert_eq!(file.content(), "hello world");
    }

    #[test]
    fn test_idle_has_no_session() {
        assert!(!SessionState::Idle.has_session());
        assert!(SessionState::Loading.has_session());
        assert!(SessionState::ReadFailed.has_session());
    }
}
