use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::editor::SharedBuffer;
use crate::notice::NoticeLevel;
use crate::session::SessionStatus;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

impl From<NoticeLevel> for ToastLevel {
    fn from(level: NoticeLevel) -> Self {
        match level {
            NoticeLevel::Info => Self::Info,
            NoticeLevel::Warning => Self::Warning,
            NoticeLevel::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// A session operation running on the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Open,
    /// Save of the buffer as it was at `revision`.
    Save { revision: u64 },
}

/// Answer for a pending file pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickReply {
    Choose(PathBuf),
    Cancel,
}

/// Path entry shown while the picker waits for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePrompt {
    pub input: String,
}

/// The complete application state.
///
/// All state lives here; the session manager is reached only through
/// messages and the side-effect slots below.
#[derive(Debug)]
pub struct Model {
    /// Text shared with the session manager
    pub editor: SharedBuffer,
    /// Last status published by the session manager
    pub session: SessionStatus,
    /// Open path prompt, if the picker asked for a file
    pub prompt: Option<FilePrompt>,
    /// Operation dispatched and not finished yet
    pub in_flight: Option<Task>,
    /// Operation accepted by `update`, waiting to be spawned
    pub(super) pending_task: Option<Task>,
    /// Prompt answer waiting to be delivered to the picker
    pub(super) pick_reply: Option<PickReply>,
    /// First visible editor line
    pub scroll_offset: usize,
    /// Terminal size in cells
    pub width: u16,
    pub height: u16,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Running against the in-memory host
    pub debug: bool,
    toast: Option<Toast>,
    /// Set after first quit attempt with unsaved changes; allows second quit to proceed
    pub quit_confirmed: bool,
    /// Whether the app should quit
    pub should_quit: bool,
}

impl Model {
    pub fn new(editor: SharedBuffer, terminal_size: (u16, u16)) -> Self {
        Self {
            editor,
            width: terminal_size.0,
            height: terminal_size.1,
            ..Self::default()
        }
    }

    /// Editor rows, excluding the status bar and the toast row.
    pub fn editor_height(&self) -> usize {
        let footer = 1 + u16::from(self.toast.is_some());
        usize::from(self.height.saturating_sub(footer))
    }

    pub const fn is_busy(&self) -> bool {
        self.in_flight.is_some() || self.session.busy
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.editor.is_dirty()
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Keep the cursor line inside the visible rows.
    pub(super) fn follow_cursor(&mut self) {
        let cursor_line = self.editor.lock().cursor().line;
        let visible = self.editor_height();
        if visible == 0 {
            self.scroll_offset = cursor_line;
        } else if cursor_line < self.scroll_offset {
            self.scroll_offset = cursor_line;
        } else if cursor_line >= self.scroll_offset + visible {
            self.scroll_offset = cursor_line + 1 - visible;
        }
    }
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self {
            editor: SharedBuffer::new(),
            session: SessionStatus::default(),
            prompt: None,
            in_flight: None,
            pending_task: None,
            pick_reply: None,
            scroll_offset: 0,
            width: 80,
            height: 24,
            help_visible: false,
            config_global_path: None,
            config_local_path: None,
            debug: false,
            toast: None,
            quit_confirmed: false,
            should_quit: false,
        }
    }
}
