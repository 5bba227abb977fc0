use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::capability::{CapabilityBroker, MemoryBroker, PromptBroker};
use crate::editor::{EditorAdapter, SharedBuffer};
use crate::notice::{Notice, NoticeLevel};
use crate::session::{SessionState, SessionStatus};

use super::bindings::SessionBindings;
use super::event_loop::ResizeDebouncer;
use super::model::{PickReply, Task};
use super::{App, Message, Model, TaskOutcome, ToastLevel, update};

fn create_test_model(text: &str) -> Model {
    Model::new(SharedBuffer::from_text(text), (80, 24))
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

/// Feed binding output through `update` until a task finishes.
fn run_until_finished(model: &mut Model, bindings: &mut SessionBindings) -> TaskOutcome {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        for msg in bindings.poll() {
            let finished = match &msg {
                Message::TaskFinished(outcome) => Some(outcome.clone()),
                _ => None,
            };
            *model = update(std::mem::take(model), msg);
            App::handle_message_side_effects(model, bindings);
            if let Some(outcome) = finished {
                // Pick up the status published just before the task ended.
                for msg in bindings.poll() {
                    *model = update(std::mem::take(model), msg);
                }
                return outcome;
            }
        }
        assert!(Instant::now() < deadline, "session task did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn dispatch(model: &mut Model, bindings: &mut SessionBindings, msg: Message) {
    *model = update(std::mem::take(model), msg);
    App::handle_message_side_effects(model, bindings);
}

#[test]
fn test_choose_file_parks_open_task() {
    let model = update(create_test_model(""), Message::ChooseFile);
    assert_eq!(model.in_flight, Some(Task::Open));
    assert_eq!(model.pending_task, Some(Task::Open));
}

#[test]
fn test_triggers_are_refused_while_busy() {
    let model = update(create_test_model(""), Message::ChooseFile);
    let mut model = model;
    model.pending_task = None;

    let model = update(model, Message::Save);
    assert_eq!(model.pending_task, None);
    assert_eq!(model.in_flight, Some(Task::Open));
    let (message, level) = model.active_toast().unwrap();
    assert!(message.starts_with("Busy"));
    assert_eq!(level, ToastLevel::Info);
}

#[test]
fn test_save_records_revision() {
    let model = create_test_model("hello");
    let model = update(model, Message::InsertChar('x'));
    let revision = model.editor.revision();
    let model = update(model, Message::Save);
    assert_eq!(model.pending_task, Some(Task::Save { revision }));
}

#[test]
fn test_saved_outcome_marks_clean_only_if_unchanged() {
    let model = create_test_model("hello");
    let model = update(model, Message::InsertChar('x'));
    let revision = model.editor.revision();
    let model = update(model, Message::Save);
    let model = update(model, Message::InsertChar('y'));

    let model = update(
        model,
        Message::TaskFinished(TaskOutcome::Saved {
            name: "a.txt".to_string(),
            bytes: 6,
            revision,
        }),
    );
    assert!(model.in_flight.is_none());
    assert!(model.has_unsaved_changes(), "edit after dispatch keeps buffer dirty");

    let revision = model.editor.revision();
    let model = update(
        model,
        Message::TaskFinished(TaskOutcome::Saved {
            name: "a.txt".to_string(),
            bytes: 7,
            revision,
        }),
    );
    assert!(!model.has_unsaved_changes());
}

#[test]
fn test_failed_task_releases_in_flight() {
    let model = update(create_test_model(""), Message::ChooseFile);
    let model = update(
        model,
        Message::TaskFinished(TaskOutcome::Failed("denied".to_string())),
    );
    assert!(model.in_flight.is_none());
}

#[test]
fn test_notice_becomes_toast() {
    let model = update(
        create_test_model(""),
        Message::Notice(Notice::new(NoticeLevel::Warning, "Error: No file currently opened")),
    );
    assert_eq!(
        model.active_toast(),
        Some(("Error: No file currently opened", ToastLevel::Warning))
    );
}

#[test]
fn test_toast_expires() {
    let mut model = update(
        create_test_model(""),
        Message::Notice(Notice::new(NoticeLevel::Info, "hi")),
    );
    assert!(!model.expire_toast(Instant::now()));
    assert!(model.expire_toast(Instant::now() + Duration::from_secs(5)));
    assert!(model.active_toast().is_none());
}

#[test]
fn test_edits_are_rejected_while_loading() {
    let model = create_test_model("Loading...");
    model.editor.set_read_only(true);
    let model = update(model, Message::InsertChar('x'));
    assert_eq!(model.editor.content(), "Loading...");
    assert!(model.active_toast().is_some());
}

#[test]
fn test_prompt_flow_produces_reply() {
    let model = update(
        create_test_model(""),
        Message::PromptShown(PathBuf::from("docs")),
    );
    let prompt = model.prompt.as_ref().unwrap();
    assert!(prompt.input.starts_with("docs"));

    let mut model = model;
    model.prompt.as_mut().unwrap().input.clear();
    let model = "a.txt"
        .chars()
        .fold(model, |m, c| update(m, Message::PromptInput(c)));
    let model = update(model, Message::PromptInput('x'));
    let model = update(model, Message::PromptBackspace);
    let model = update(model, Message::PromptSubmit);

    assert!(model.prompt.is_none());
    assert_eq!(model.pick_reply, Some(PickReply::Choose(PathBuf::from("a.txt"))));
}

#[test]
fn test_prompt_cancel_and_empty_submit_cancel_pick() {
    let model = update(create_test_model(""), Message::PromptShown(PathBuf::new()));
    let model = update(model, Message::PromptCancel);
    assert_eq!(model.pick_reply, Some(PickReply::Cancel));

    let model = update(create_test_model(""), Message::PromptShown(PathBuf::new()));
    let model = update(model, Message::PromptSubmit);
    assert_eq!(model.pick_reply, Some(PickReply::Cancel));
}

#[test]
fn test_quit_with_unsaved_changes_requires_confirmation() {
    let model = update(create_test_model("hello"), Message::InsertChar('x'));
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
    assert!(model.quit_confirmed);

    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_confirmation_resets_on_other_action() {
    let model = update(create_test_model("hello"), Message::InsertChar('x'));
    let model = update(model, Message::Quit);
    let model = update(model, Message::MoveHome);
    assert!(!model.quit_confirmed);
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
}

#[test]
fn test_clean_quit_is_immediate() {
    let model = update(create_test_model("hello"), Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_cursor_follow_scrolls_viewport() {
    let text = (1..=100).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
    let model = update(create_test_model(&text), Message::MoveToEnd);
    assert!(model.scroll_offset > 0);
    let visible = model.editor_height();
    assert_eq!(model.scroll_offset, 100 - visible);

    let model = update(model, Message::MoveToStart);
    assert_eq!(model.scroll_offset, 0);
}

#[test]
fn test_loading_status_resets_scroll() {
    let mut model = create_test_model("");
    model.scroll_offset = 12;
    let model = update(
        model,
        Message::SessionChanged(SessionStatus {
            state: SessionState::Loading,
            file_name: Some("a.txt".to_string()),
            busy: true,
        }),
    );
    assert_eq!(model.scroll_offset, 0);
    assert!(model.is_busy());
}

#[test]
fn test_save_after_read_failure_waits_for_an_edit() {
    let model = update(
        create_test_model(""),
        Message::SessionChanged(SessionStatus {
            state: SessionState::ReadFailed,
            file_name: Some("bad.txt".to_string()),
            busy: false,
        }),
    );

    let model = update(model, Message::Save);
    assert_eq!(model.pending_task, None);
    assert_eq!(model.in_flight, None);
    assert!(matches!(model.active_toast(), Some((_, ToastLevel::Warning))));

    let model = update(model, Message::InsertChar('x'));
    let model = update(model, Message::Save);
    assert!(matches!(model.pending_task, Some(Task::Save { .. })));
}

#[test]
fn test_key_bindings() {
    let model = create_test_model("");
    assert_eq!(App::handle_key(ctrl('o'), &model), Some(Message::ChooseFile));
    assert_eq!(App::handle_key(ctrl('s'), &model), Some(Message::Save));
    assert_eq!(App::handle_key(ctrl('q'), &model), Some(Message::Quit));
    assert_eq!(
        App::handle_key(key(KeyCode::Char('a')), &model),
        Some(Message::InsertChar('a'))
    );
    assert_eq!(App::handle_key(key(KeyCode::F(1)), &model), Some(Message::ToggleHelp));
}

#[test]
fn test_prompt_captures_keys() {
    let model = update(create_test_model(""), Message::PromptShown(PathBuf::new()));
    assert_eq!(
        App::handle_key(key(KeyCode::Char('s')), &model),
        Some(Message::PromptInput('s'))
    );
    assert_eq!(App::handle_key(key(KeyCode::Esc), &model), Some(Message::PromptCancel));
    assert_eq!(App::handle_key(key(KeyCode::Enter), &model), Some(Message::PromptSubmit));
    assert_eq!(App::handle_key(ctrl('s'), &model), None);
}

#[test]
fn test_help_closes_on_any_key() {
    let model = update(create_test_model(""), Message::ToggleHelp);
    assert_eq!(
        App::handle_key(key(KeyCode::Char('x')), &model),
        Some(Message::HideHelp)
    );
}

#[test]
fn test_resize_debouncer_waits_for_delay() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(100, 40, 1_000);
    assert!(debouncer.take_ready(1_050).is_none());
    debouncer.queue(120, 50, 1_060);
    assert_eq!(debouncer.take_ready(1_160), Some((120, 50)));
    assert!(!debouncer.is_pending());
}

#[test]
fn test_debug_open_edit_save_round() {
    let rt = runtime();
    let broker = Arc::new(MemoryBroker::debug());
    let editor = SharedBuffer::new();
    let mut bindings = SessionBindings::new(
        rt.handle().clone(),
        Arc::clone(&broker) as Arc<dyn CapabilityBroker>,
        None,
        editor.clone(),
    );
    let mut model = Model::new(editor, (80, 24));

    dispatch(&mut model, &mut bindings, Message::ChooseFile);
    let outcome = run_until_finished(&mut model, &mut bindings);
    assert_eq!(
        outcome,
        TaskOutcome::Opened {
            name: "debug.txt".to_string()
        }
    );
    assert_eq!(model.session.state, SessionState::Ready);
    assert_eq!(model.editor.content(), "file_text");

    dispatch(&mut model, &mut bindings, Message::MoveEnd);
    dispatch(&mut model, &mut bindings, Message::InsertChar('!'));
    dispatch(&mut model, &mut bindings, Message::Save);
    let outcome = run_until_finished(&mut model, &mut bindings);
    assert!(matches!(outcome, TaskOutcome::Saved { bytes: 10, .. }));
    assert!(!model.has_unsaved_changes());
    assert_eq!(broker.debug_file().unwrap().content(), "file_text!");

    bindings.teardown(Duration::from_secs(1));
    assert_eq!(broker.open_streams(), 0);
}

#[test]
fn test_save_without_file_reports_notice() {
    let rt = runtime();
    let broker = Arc::new(MemoryBroker::scripted());
    let mut bindings = SessionBindings::new(
        rt.handle().clone(),
        broker as Arc<dyn CapabilityBroker>,
        None,
        SharedBuffer::new(),
    );
    let mut model = Model::new(SharedBuffer::new(), (80, 24));

    dispatch(&mut model, &mut bindings, Message::Save);
    let outcome = run_until_finished(&mut model, &mut bindings);
    assert!(matches!(outcome, TaskOutcome::Failed(_)));
    assert_eq!(
        model.active_toast(),
        Some(("Error: No file currently opened", ToastLevel::Warning))
    );
}

#[test]
fn test_prompt_broker_round_trip_through_bindings() {
    let rt = runtime();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "from disk").unwrap();

    let (broker, picks) = PromptBroker::new(dir.path());
    let editor = SharedBuffer::new();
    let mut bindings = SessionBindings::new(
        rt.handle().clone(),
        Arc::new(broker) as Arc<dyn CapabilityBroker>,
        Some(picks),
        editor.clone(),
    );
    let mut model = Model::new(editor, (80, 24));

    dispatch(&mut model, &mut bindings, Message::ChooseFile);
    let deadline = Instant::now() + Duration::from_secs(5);
    while model.prompt.is_none() {
        for msg in bindings.poll() {
            dispatch(&mut model, &mut bindings, msg);
        }
        assert!(Instant::now() < deadline, "prompt never shown");
        std::thread::sleep(Duration::from_millis(5));
    }

    model.prompt.as_mut().unwrap().input = "notes.txt".to_string();
    dispatch(&mut model, &mut bindings, Message::PromptSubmit);
    let outcome = run_until_finished(&mut model, &mut bindings);
    assert_eq!(
        outcome,
        TaskOutcome::Opened {
            name: "notes.txt".to_string()
        }
    );
    assert_eq!(model.editor.content(), "from disk");

    bindings.teardown(Duration::from_secs(1));
}

#[test]
fn test_teardown_cancels_pending_pick() {
    let rt = runtime();
    let (broker, picks) = PromptBroker::new(".");
    let mut bindings = SessionBindings::new(
        rt.handle().clone(),
        Arc::new(broker) as Arc<dyn CapabilityBroker>,
        Some(picks),
        SharedBuffer::new(),
    );
    let mut model = Model::new(SharedBuffer::new(), (80, 24));

    dispatch(&mut model, &mut bindings, Message::ChooseFile);
    let deadline = Instant::now() + Duration::from_secs(5);
    while model.prompt.is_none() {
        for msg in bindings.poll() {
            dispatch(&mut model, &mut bindings, msg);
        }
        assert!(Instant::now() < deadline, "prompt never shown");
        std::thread::sleep(Duration::from_millis(5));
    }

    bindings.teardown(Duration::from_secs(1));
    let outcome = run_until_finished(&mut model, &mut bindings);
    assert_eq!(outcome, TaskOutcome::Cancelled);
}
