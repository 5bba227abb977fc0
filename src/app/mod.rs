//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Session operations run on a tokio runtime; the loop itself stays
//! synchronous and learns about their progress through channels.

mod bindings;
mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{FilePrompt, Model, PickReply, Task, ToastLevel};
pub use update::{Message, TaskOutcome, update};

use std::path::PathBuf;

use tokio::runtime::Handle;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    runtime: Handle,
    debug: bool,
    start_dir: PathBuf,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create an application whose session tasks run on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            debug: false,
            start_dir: PathBuf::from("."),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Use the in-memory host instead of real files.
    pub const fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Directory the file prompt starts in.
    pub fn with_start_dir(mut self, dir: PathBuf) -> Self {
        self.start_dir = dir;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}

#[cfg(test)]
mod tests;
