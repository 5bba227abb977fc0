//! Error taxonomy for the file-session core.

use std::fmt;
use std::io;

use thiserror::Error;

/// Host operation that produced an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Resolving the file the user picked.
    Select,
    /// Reading the full file contents.
    Read,
    /// Opening the writable stream.
    Open,
    /// Writing through the stream.
    Write,
    /// Closing the stream.
    Close,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select",
            Self::Read => "read",
            Self::Open => "open",
            Self::Write => "write",
            Self::Close => "close",
        };
        f.write_str(name)
    }
}

/// Failures surfaced by brokers, capabilities, streams and the session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The user dismissed the file picker. Benign: prior state is kept.
    #[error("file selection cancelled")]
    UserCancelled,

    /// Save was requested before any file was opened.
    #[error("no file currently opened")]
    NoActiveFile,

    /// The host refused to hand out the capability.
    #[error("access denied: {0}")]
    PlatformDenied(String),

    /// A host-level read, open, write or close failed.
    #[error("{op} failed: {source}")]
    PlatformIo {
        op: IoOp,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    pub const fn io(op: IoOp, source: io::Error) -> Self {
        Self::PlatformIo { op, source }
    }

    /// Error returned when a stream is used after it was closed.
    pub fn stream_closed(op: IoOp) -> Self {
        Self::io(
            op,
            io::Error::new(io::ErrorKind::BrokenPipe, "write stream already closed"),
        )
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
