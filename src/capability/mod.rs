//! Host capability seams.
//!
//! A [`CapabilityBroker`] hands out a [`FileCapability`] for one user-chosen
//! file. The capability can be read as a whole and can open a [`WriteStream`]
//! that writes back to the same file without asking the user again.
//!
//! - [`local`]: real files on the local file system
//! - [`prompt`]: broker that asks the terminal UI for a path
//! - [`memory`]: in-memory debug/test host

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

pub mod local;
pub mod memory;
pub mod prompt;

pub use local::{LocalFile, LocalWriteStream};
pub use memory::{LedgerEvent, MemoryBroker, MemoryFile};
pub use prompt::{PickRequest, PromptBroker};

/// Obtains file capabilities from the host.
#[async_trait]
pub trait CapabilityBroker: Send + Sync {
    /// Ask the host for a file.
    ///
    /// # Errors
    ///
    /// [`SessionError::UserCancelled`](crate::error::SessionError::UserCancelled)
    /// when the selection is dismissed,
    /// [`SessionError::PlatformDenied`](crate::error::SessionError::PlatformDenied)
    /// when the host refuses it.
    async fn acquire(&self) -> Result<Box<dyn FileCapability>>;
}

/// Host-granted access to one file.
#[async_trait]
pub trait FileCapability: Send + Sync + fmt::Debug {
    /// Display name of the file.
    fn name(&self) -> &str;

    /// Read the whole file as text.
    async fn read(&self) -> Result<String>;

    /// Open an output stream bound to this file.
    async fn open_writable(&self) -> Result<Box<dyn WriteStream>>;
}

/// Open output channel bound to one capability.
///
/// Implementations treat a second `close` as a no-op.
#[async_trait]
pub trait WriteStream: Send + Sync + fmt::Debug {
    /// Replace the file contents with `text`.
    async fn write(&mut self, text: &str) -> Result<()>;

    /// Flush and release the stream.
    async fn close(&mut self) -> Result<()>;
}
