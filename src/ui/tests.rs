use super::*;
use crate::app::{FilePrompt, Message, Model, update};
use crate::editor::{EditorAdapter, SharedBuffer};
use crate::notice::{Notice, NoticeLevel};
use crate::session::{SessionState, SessionStatus};
use ratatui::Terminal;
use ratatui::backend::TestBackend;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(80, 20);
    Terminal::new(backend).unwrap()
}

fn screen(model: &Model) -> String {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    let buffer = terminal.backend().buffer();
    let width = usize::from(buffer.area.width);
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn ready_model(text: &str) -> Model {
    let mut model = Model::new(SharedBuffer::from_text(text), (80, 20));
    model.session = SessionStatus {
        state: SessionState::Ready,
        file_name: Some("notes.txt".to_string()),
        busy: false,
    };
    model
}

#[test]
fn test_idle_editor_shows_hint() {
    let model = Model::new(SharedBuffer::new(), (80, 20));
    let content = screen(&model);
    assert!(content.contains("No file open"), "Should show idle hint");
    assert!(content.contains("untitled"));
}

#[test]
fn test_ready_editor_shows_text_with_gutter() {
    let model = ready_model("hello\nworld");
    let content = screen(&model);
    let first = content.lines().next().unwrap();
    assert!(first.starts_with("1 hello"), "got {first:?}");
    assert!(content.contains("2 world"));
    assert!(content.contains("notes.txt"));
    assert!(content.contains("Ln 1, Col 1"));
}

#[test]
fn test_status_bar_shows_loading_and_read_error() {
    let mut model = ready_model("");
    model.session.state = SessionState::Loading;
    assert!(screen(&model).contains("[loading]"));

    model.session.state = SessionState::ReadFailed;
    assert!(screen(&model).contains("[read error]"));
}

#[test]
fn test_status_bar_marks_modified_buffer() {
    let model = ready_model("hello");
    let model = update(model, Message::MoveEnd);
    let model = update(model, Message::InsertChar('!'));
    let content = screen(&model);
    assert!(content.contains("[modified]"));
    assert!(content.contains("Col 7"));
}

#[test]
fn test_toast_bar_renders_notice() {
    let model = ready_model("hello");
    let model = update(
        model,
        Message::Notice(Notice::new(NoticeLevel::Error, "Error writing to file: boom")),
    );
    let content = screen(&model);
    assert!(content.contains("[error] Error writing to file: boom"));
}

#[test]
fn test_file_prompt_overlay_shows_input() {
    let mut model = ready_model("hello");
    model.prompt = Some(FilePrompt {
        input: "/tmp/notes.txt".to_string(),
    });
    let content = screen(&model);
    assert!(content.contains("Open File"));
    assert!(content.contains("/tmp/notes.txt"));
}

#[test]
fn test_help_overlay_lists_keys_and_config() {
    let mut model = ready_model("hello");
    model.help_visible = true;
    model.config_global_path = Some("/home/u/.config/quill/config".into());
    let content = screen(&model);
    assert!(content.contains("Ctrl-o"));
    assert!(content.contains("/home/u/.config/quill/config"));
}

#[test]
fn test_read_only_buffer_hides_cursor_block() {
    let model = ready_model("hello");
    model.editor.set_read_only(true);

    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&model, frame)).unwrap();
    let cell = &terminal.backend().buffer()[(2, 0)];
    assert_eq!(cell.symbol(), "h");
    assert_ne!(cell.bg, ratatui::style::Color::White);
}

#[test]
fn test_multibyte_cursor_does_not_split_chars() {
    assert_eq!(render::split_at_cursor("héllo", 1), ("h", "é", "llo"));
    assert_eq!(render::split_at_cursor("héllo", 2), ("h", "é", "llo"));
    assert_eq!(render::split_at_cursor("ab", 2), ("ab", " ", ""));
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(12_345), 5);
}
