use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::app::{Model, ToastLevel};
use crate::session::SessionState;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model.session.file_name.as_deref().unwrap_or("untitled");

    let state = match model.session.state {
        SessionState::Idle | SessionState::Ready => "",
        SessionState::Loading => " [loading]",
        SessionState::ReadFailed => " [read error]",
    };
    let dirty = if model.has_unsaved_changes() {
        " [modified]"
    } else {
        ""
    };
    let busy = if model.is_busy() { " [busy]" } else { "" };
    let debug = if model.debug { " [debug]" } else { "" };

    let cursor_info = {
        let buf = model.editor.lock();
        let cursor = buf.cursor();
        let line = buf.line_at(cursor.line).unwrap_or_default();
        let col = line.get(..cursor.col).map_or(cursor.col, UnicodeWidthStr::width);
        format!("Ln {}, Col {}", cursor.line + 1, col + 1)
    };

    let status = format!(
        " {filename}{state}{dirty}{busy}{debug}  {cursor_info}  ^O:open ^S:save ^Q:quit F1:help"
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
