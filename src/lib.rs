// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. session::SessionState)
    clippy::module_name_repetitions
)]

//! # Quill
//!
//! A minimal terminal text editor built around one open file at a time.
//!
//! The core is the [`session::SessionManager`]: it asks the host for a file
//! through a [`capability::CapabilityBroker`], reads it into the editor,
//! keeps a write stream open for saving, and closes that stream before the
//! session is replaced or the program exits.
//!
//! ## Architecture
//!
//! The terminal front end uses The Elm Architecture (TEA):
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! Session operations run as tokio tasks and report back over channels.
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`capability`]: Host file access (local files, prompt, in-memory)
//! - [`session`]: File sessions and their lifecycle
//! - [`editor`]: Text buffer and the adapter the session core uses
//! - [`notice`]: User-visible notifications
//! - [`ui`]: Terminal UI components
//! - [`config`]: Saved default flags
//! - [`logging`]: Subscriber setup

pub mod app;
pub mod capability;
pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod notice;
pub mod session;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::capability::{CapabilityBroker, FileCapability, WriteStream};
    pub use crate::editor::{EditorAdapter, SharedBuffer};
    pub use crate::error::{Result, SessionError};
    pub use crate::notice::{Notice, NoticeLevel, Notifier};
    pub use crate::session::{SessionManager, SessionState, SessionStatus};
}
