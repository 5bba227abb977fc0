use std::path::PathBuf;

use crate::app::Model;
use crate::app::model::{FilePrompt, PickReply, Task, ToastLevel};
use crate::editor::{Direction, EditorBuffer};
use crate::notice::Notice;
use crate::session::{SessionState, SessionStatus};

/// How a session task ended, as reported back to the UI loop.
///
/// Failures have already been shown through the notice channel; they only
/// release the in-flight slot here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Opened { name: String },
    Cancelled,
    Saved { name: String, bytes: usize, revision: u64 },
    Failed(String),
}

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Session
    /// Choose a file to edit (Ctrl+O)
    ChooseFile,
    /// Save the editor through the active session (Ctrl+S)
    Save,
    /// Picker is waiting for a path
    PromptShown(PathBuf),
    PromptInput(char),
    PromptBackspace,
    PromptSubmit,
    PromptCancel,
    /// Notification from the session manager
    Notice(Notice),
    /// Session manager published a new status
    SessionChanged(SessionStatus),
    /// A dispatched session task finished
    TaskFinished(TaskOutcome),

    // Editor
    InsertChar(char),
    /// Delete character before cursor (Backspace)
    DeleteBack,
    /// Delete character at cursor (Delete)
    DeleteForward,
    /// Split line at cursor (Enter)
    SplitLine,
    MoveCursor(Direction),
    MoveHome,
    MoveEnd,
    /// Ctrl+Home
    MoveToStart,
    /// Ctrl+End
    MoveToEnd,
    /// Scroll editor viewport up by n lines
    ScrollUp(usize),
    /// Scroll editor viewport down by n lines
    ScrollDown(usize),

    // Window
    /// Terminal resized
    Resize(u16, u16),
    ToggleHelp,
    HideHelp,

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// Session work is never started here: accepted triggers are parked in the
/// model and spawned by the side-effect pass that follows.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Save preserves the quit flag so Ctrl+S can complete a pending quit.
    if !matches!(
        msg,
        Message::Quit
            | Message::Save
            | Message::Notice(_)
            | Message::SessionChanged(_)
            | Message::TaskFinished(_)
    ) {
        model.quit_confirmed = false;
    }

    match msg {
        Message::ChooseFile => {
            if model.is_busy() {
                model.show_toast(ToastLevel::Info, "Busy: wait for the current operation");
            } else {
                model.in_flight = Some(Task::Open);
                model.pending_task = Some(Task::Open);
            }
        }
        Message::Save => {
            if model.is_busy() {
                model.show_toast(ToastLevel::Info, "Busy: wait for the current operation");
            } else if model.session.state == SessionState::ReadFailed
                && !model.has_unsaved_changes()
            {
                // The empty buffer would replace a file we never showed.
                model.show_toast(
                    ToastLevel::Warning,
                    "File could not be read; edit before saving to overwrite it",
                );
            } else {
                let task = Task::Save {
                    revision: model.editor.revision(),
                };
                model.in_flight = Some(task);
                model.pending_task = Some(task);
            }
        }
        Message::PromptShown(start_dir) => {
            let mut input = start_dir.display().to_string();
            if !input.is_empty() && !input.ends_with(std::path::MAIN_SEPARATOR) {
                input.push(std::path::MAIN_SEPARATOR);
            }
            model.prompt = Some(FilePrompt { input });
            model.help_visible = false;
        }
        Message::PromptInput(ch) => {
            if let Some(prompt) = &mut model.prompt {
                prompt.input.push(ch);
            }
        }
        Message::PromptBackspace => {
            if let Some(prompt) = &mut model.prompt {
                prompt.input.pop();
            }
        }
        Message::PromptSubmit => {
            if let Some(prompt) = model.prompt.take() {
                let path = prompt.input.trim();
                model.pick_reply = Some(if path.is_empty() {
                    PickReply::Cancel
                } else {
                    PickReply::Choose(PathBuf::from(path))
                });
            }
        }
        Message::PromptCancel => {
            if model.prompt.take().is_some() {
                model.pick_reply = Some(PickReply::Cancel);
            }
        }
        Message::Notice(notice) => {
            model.show_toast(notice.level.into(), notice.message);
        }
        Message::SessionChanged(status) => {
            if status.state == SessionState::Loading {
                model.scroll_offset = 0;
            }
            model.session = status;
        }
        Message::TaskFinished(outcome) => {
            model.in_flight = None;
            match outcome {
                TaskOutcome::Opened { name } => {
                    model.scroll_offset = 0;
                    model.show_toast(ToastLevel::Info, format!("Opened {name}"));
                }
                TaskOutcome::Saved {
                    name,
                    bytes,
                    revision,
                } => {
                    let clean = model.editor.lock().mark_clean_at(revision);
                    let note = if clean { "" } else { " (edited since)" };
                    model.show_toast(ToastLevel::Info, format!("Saved {name}, {bytes} bytes{note}"));
                }
                TaskOutcome::Cancelled | TaskOutcome::Failed(_) => {}
            }
        }

        // Editor
        Message::InsertChar(ch) => edit(&mut model, |buf| buf.insert_char(ch)),
        Message::DeleteBack => edit(&mut model, EditorBuffer::delete_back),
        Message::DeleteForward => edit(&mut model, EditorBuffer::delete_forward),
        Message::SplitLine => edit(&mut model, EditorBuffer::split_line),
        Message::MoveCursor(dir) => {
            model.editor.lock().move_cursor(dir);
            model.follow_cursor();
        }
        Message::MoveHome => {
            model.editor.lock().move_home();
        }
        Message::MoveEnd => {
            model.editor.lock().move_end();
        }
        Message::MoveToStart => {
            model.editor.lock().move_to_start();
            model.follow_cursor();
        }
        Message::MoveToEnd => {
            model.editor.lock().move_to_end();
            model.follow_cursor();
        }
        Message::ScrollUp(n) => {
            model.scroll_offset = model.scroll_offset.saturating_sub(n);
        }
        Message::ScrollDown(n) => {
            let max = model.editor.lock().line_count().saturating_sub(1);
            model.scroll_offset = (model.scroll_offset + n).min(max);
        }

        // Window
        Message::Resize(width, height) => {
            model.width = width;
            model.height = height;
            model.follow_cursor();
        }
        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,

        // Application
        Message::Quit => {
            if model.has_unsaved_changes() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }
    model
}

fn edit(model: &mut Model, op: impl FnOnce(&mut EditorBuffer) -> bool) {
    let applied = {
        let mut buf = model.editor.lock();
        op(&mut *buf) || !buf.is_read_only()
    };
    if applied {
        model.follow_cursor();
    } else {
        model.show_toast(ToastLevel::Info, "File is loading, editing is disabled");
    }
}
