//! In-memory host used by `--debug` and by the lifecycle tests.
//!
//! Every [`MemoryFile`] handed out by a [`MemoryBroker`] reports to the
//! broker's ledger, which records reads, stream opens, writes and closes in
//! order, together with the number of streams open right now and the most
//! that were ever open at once.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{CapabilityBroker, FileCapability, WriteStream};
use crate::error::{IoOp, Result, SessionError};

/// Name of the canned debug file.
pub const DEBUG_FILE_NAME: &str = "debug.txt";
/// Contents of the canned debug file.
pub const DEBUG_FILE_TEXT: &str = "file_text";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One host-level call recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Read(String),
    Opened(String),
    Wrote { file: String, text: String },
    Closed(String),
}

#[derive(Debug, Default)]
struct Ledger {
    events: Vec<LedgerEvent>,
    open: usize,
    peak: usize,
}

type SharedLedger = Arc<Mutex<Ledger>>;

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    read: bool,
    open: bool,
    write: bool,
    close: bool,
}

#[derive(Debug)]
struct FileState {
    content: String,
    faults: Faults,
    writes: Vec<String>,
    close_calls: usize,
    open_streams: usize,
}

/// A file that lives in memory.
///
/// Clones share the same contents and counters.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    state: Arc<Mutex<FileState>>,
    ledger: SharedLedger,
    read_gate: Option<Arc<Notify>>,
}

impl MemoryFile {
    /// A standalone file with its own ledger.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_ledger(name, content, SharedLedger::default())
    }

    fn with_ledger(name: impl Into<String>, content: impl Into<String>, ledger: SharedLedger) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(FileState {
                content: content.into(),
                faults: Faults::default(),
                writes: Vec::new(),
                close_calls: 0,
                open_streams: 0,
            })),
            ledger,
            read_gate: None,
        }
    }

    /// Make every read fail.
    #[must_use]
    pub fn failing_read(self) -> Self {
        lock(&self.state).faults.read = true;
        self
    }

    /// Make `open_writable` fail.
    #[must_use]
    pub fn failing_open(self) -> Self {
        lock(&self.state).faults.open = true;
        self
    }

    /// Make every write fail.
    #[must_use]
    pub fn failing_write(self) -> Self {
        lock(&self.state).faults.write = true;
        self
    }

    /// Make `close` report an error (the stream is still released).
    #[must_use]
    pub fn failing_close(self) -> Self {
        lock(&self.state).faults.close = true;
        self
    }

    /// Hold every read until `gate` is notified.
    #[must_use]
    pub fn with_read_gate(mut self, gate: Arc<Notify>) -> Self {
        self.read_gate = Some(gate);
        self
    }

    pub fn content(&self) -> String {
        lock(&self.state).content.clone()
    }

    /// Every text written through a stream, oldest first.
    pub fn writes(&self) -> Vec<String> {
        lock(&self.state).writes.clone()
    }

    /// Number of `close` calls, including no-op ones on closed streams.
    pub fn close_calls(&self) -> usize {
        lock(&self.state).close_calls
    }

    pub fn open_streams(&self) -> usize {
        lock(&self.state).open_streams
    }

    fn record(&self, event: LedgerEvent) {
        lock(&self.ledger).events.push(event);
    }
}

#[async_trait]
impl FileCapability for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<String> {
        tracing::debug!(file = %self.name, "reading");
        if let Some(gate) = &self.read_gate {
            gate.notified().await;
        }
        let (faults, content) = {
            let state = lock(&self.state);
            (state.faults, state.content.clone())
        };
        if faults.read {
            return Err(SessionError::io(
                IoOp::Read,
                io::Error::other("simulated read failure"),
            ));
        }
        self.record(LedgerEvent::Read(self.name.clone()));
        Ok(content)
    }

    async fn open_writable(&self) -> Result<Box<dyn WriteStream>> {
        {
            let mut state = lock(&self.state);
            if state.faults.open {
                return Err(SessionError::io(
                    IoOp::Open,
                    io::Error::other("simulated open failure"),
                ));
            }
            state.open_streams += 1;
        }
        {
            let mut ledger = lock(&self.ledger);
            ledger.open += 1;
            ledger.peak = ledger.peak.max(ledger.open);
            ledger.events.push(LedgerEvent::Opened(self.name.clone()));
        }
        Ok(Box::new(MemoryStream {
            file: self.clone(),
            open: true,
        }))
    }
}

/// Write stream on a [`MemoryFile`].
#[derive(Debug)]
pub struct MemoryStream {
    file: MemoryFile,
    open: bool,
}

#[async_trait]
impl WriteStream for MemoryStream {
    async fn write(&mut self, text: &str) -> Result<()> {
        if !self.open {
            return Err(SessionError::stream_closed(IoOp::Write));
        }
        tracing::debug!(file = %self.file.name, "writing data:\n{text}");
        {
            let mut state = lock(&self.file.state);
            if state.faults.write {
                return Err(SessionError::io(
                    IoOp::Write,
                    io::Error::other("simulated write failure"),
                ));
            }
            state.content = text.to_string();
            state.writes.push(text.to_string());
        }
        self.file.record(LedgerEvent::Wrote {
            file: self.file.name.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        tracing::debug!(file = %self.file.name, "closing...");
        let failing = {
            let mut state = lock(&self.file.state);
            state.close_calls += 1;
            if !self.open {
                return Ok(());
            }
            state.open_streams -= 1;
            state.faults.close
        };
        self.open = false;
        {
            let mut ledger = lock(&self.file.ledger);
            ledger.open -= 1;
            ledger.events.push(LedgerEvent::Closed(self.file.name.clone()));
        }
        if failing {
            return Err(SessionError::io(
                IoOp::Close,
                io::Error::other("simulated close failure"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Scripted {
    File(MemoryFile),
    Cancel,
    Deny(String),
}

/// Broker that never prompts.
///
/// Scripted answers are served first, in order; once they run out the
/// broker falls back to its canned file, or to `UserCancelled` if it has
/// none.
#[derive(Debug)]
pub struct MemoryBroker {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Option<MemoryFile>,
    ledger: SharedLedger,
    acquisitions: AtomicUsize,
}

impl MemoryBroker {
    /// Broker that always hands out the canned debug file.
    pub fn debug() -> Self {
        let ledger = SharedLedger::default();
        let fallback = MemoryFile::with_ledger(DEBUG_FILE_NAME, DEBUG_FILE_TEXT, Arc::clone(&ledger));
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(fallback),
            ledger,
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// Broker with no canned file; unscripted acquisitions are cancelled.
    pub fn scripted() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            ledger: SharedLedger::default(),
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// Create a file that reports to this broker's ledger.
    pub fn file(&self, name: impl Into<String>, content: impl Into<String>) -> MemoryFile {
        MemoryFile::with_ledger(name, content, Arc::clone(&self.ledger))
    }

    /// The canned debug file, if any.
    pub const fn debug_file(&self) -> Option<&MemoryFile> {
        self.fallback.as_ref()
    }

    pub fn queue_file(&self, file: &MemoryFile) {
        lock(&self.script).push_back(Scripted::File(file.clone()));
    }

    pub fn queue_cancel(&self) {
        lock(&self.script).push_back(Scripted::Cancel);
    }

    pub fn queue_denied(&self, reason: impl Into<String>) {
        lock(&self.script).push_back(Scripted::Deny(reason.into()));
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Streams open right now, across every file of this broker.
    pub fn open_streams(&self) -> usize {
        lock(&self.ledger).open
    }

    /// Most streams that were ever open at the same time.
    pub fn peak_open_streams(&self) -> usize {
        lock(&self.ledger).peak
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        lock(&self.ledger).events.clone()
    }
}

#[async_trait]
impl CapabilityBroker for MemoryBroker {
    async fn acquire(&self) -> Result<Box<dyn FileCapability>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.script).pop_front();
        match next {
            Some(Scripted::File(file)) => Ok(Box::new(file)),
            Some(Scripted::Cancel) => Err(SessionError::UserCancelled),
            Some(Scripted::Deny(reason)) => Err(SessionError::PlatformDenied(reason)),
            None => match &self.fallback {
                Some(file) => Ok(Box::new(file.clone())),
                None => Err(SessionError::UserCancelled),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debug_broker_hands_out_canned_file() {
        let broker = MemoryBroker::debug();
        let file = broker.acquire().await.unwrap();
        assert_eq!(file.name(), DEBUG_FILE_NAME);
        assert_eq!(file.read().await.unwrap(), DEBUG_FILE_TEXT);
        assert_eq!(broker.acquisitions(), 1);
    }

    #[tokio::test]
    async fn test_script_is_served_in_order_then_cancels() {
        let broker = MemoryBroker::scripted();
        let a = broker.file("a.txt", "alpha");
        broker.queue_denied("policy");
        broker.queue_file(&a);

        let err = broker.acquire().await.unwrap_err();
        assert!(matches!(err, SessionError::PlatformDenied(ref r) if r == "policy"));
        assert_eq!(broker.acquire().await.unwrap().name(), "a.txt");
        assert!(broker.acquire().await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_ledger_tracks_open_and_peak_streams() {
        let broker = MemoryBroker::scripted();
        let a = broker.file("a.txt", "alpha");
        let b = broker.file("b.txt", "beta");

        let mut sa = a.open_writable().await.unwrap();
        let mut sb = b.open_writable().await.unwrap();
        assert_eq!(broker.open_streams(), 2);
        sa.close().await.unwrap();
        sb.close().await.unwrap();

        assert_eq!(broker.open_streams(), 0);
        assert_eq!(broker.peak_open_streams(), 2);
        assert_eq!(
            broker.events(),
            vec![
                LedgerEvent::Opened("a.txt".into()),
                LedgerEvent::Opened("b.txt".into()),
                LedgerEvent::Closed("a.txt".into()),
                LedgerEvent::Closed("b.txt".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_write_replaces_content_and_is_recorded() {
        let file = MemoryFile::new("a.txt", "hello");
        let mut stream = file.open_writable().await.unwrap();
        stream.write("hello world").await.unwrap();

        assert_eq!(file.content(), "hello world");
        assert_eq!(file.writes(), vec!["hello world".to_string()]);
    }

    #[tokio::test]
    async fn test_second_close_does_not_release_twice() {
        let file = MemoryFile::new("a.txt", "hello");
        let mut stream = file.open_writable().await.unwrap();
        stream.close().await.unwrap();
        stream.close().await.unwrap();

        assert_eq!(file.close_calls(), 2);
        assert_eq!(file.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_failing_close_still_releases_stream() {
        let file = MemoryFile::new("a.txt", "hello").failing_close();
        let mut stream = file.open_writable().await.unwrap();
        assert!(stream.close().await.is_err());
        assert_eq!(file.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_faults_surface_as_platform_io() {
        let file = MemoryFile::new("a.txt", "hello").failing_read().failing_write();
        let err = file.read().await.unwrap_err();
        assert!(matches!(err, SessionError::PlatformIo { op: IoOp::Read, .. }));

        let mut stream = file.open_writable().await.unwrap();
        let err = stream.write("x").await.unwrap_err();
        assert!(matches!(err, SessionError::PlatformIo { op: IoOp::Write, .. }));
        assert_eq!(file.content(), "hello");

        let closed = MemoryFile::new("b.txt", "").failing_open();
        let err = closed.open_writable().await.unwrap_err();
        assert!(matches!(err, SessionError::PlatformIo { op: IoOp::Open, .. }));
    }
}
