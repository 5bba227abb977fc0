use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::app::Model;
use crate::editor::EditorBuffer;

use super::{overlays, status};

const IDLE_HINT: &str = "No file open. Press Ctrl+O to choose one, F1 for help.";

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();

    let toast_active = model.active_toast().is_some();
    let footer_rows = 1 + u16::from(toast_active);
    let editor_area = Rect {
        height: area.height.saturating_sub(footer_rows),
        ..area
    };
    let toast_area = Rect {
        y: area.y + area.height.saturating_sub(footer_rows),
        height: 1,
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1,
        ..area
    };

    render_editor(model, frame, editor_area);
    if toast_active {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, status_area);

    if model.prompt.is_some() {
        overlays::render_file_prompt(model, frame, area);
    } else if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let buf = model.editor.lock();
    frame.render_widget(Clear, area);

    if !model.session.state.has_session() && is_blank(&buf) {
        let hint = Paragraph::new(Line::styled(
            IDLE_HINT,
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(hint, area);
        return;
    }

    let total_lines = buf.line_count();
    let gutter_width = usize::from(line_number_width(total_lines));
    let start = model.scroll_offset.min(total_lines.saturating_sub(1));
    let end = (start + usize::from(area.height)).min(total_lines);
    let cursor = buf.cursor();
    let text_style = if buf.is_read_only() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let mut content: Vec<Line> = Vec::with_capacity(end - start);
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default().replace('\t', " ");
        let line_num = format!("{:>gutter_width$} ", line_idx + 1);
        let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];

        if line_idx == cursor.line && !buf.is_read_only() {
            let (before, at, after) = split_at_cursor(&line_text, cursor.col);
            if !before.is_empty() {
                spans.push(Span::styled(before.to_string(), text_style));
            }
            spans.push(Span::styled(
                at.to_string(),
                Style::default().bg(Color::White).fg(Color::Black),
            ));
            if !after.is_empty() {
                spans.push(Span::styled(after.to_string(), text_style));
            }
        } else {
            spans.push(Span::styled(line_text, text_style));
        }

        content.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(content), area);
}

fn is_blank(buf: &EditorBuffer) -> bool {
    buf.line_count() <= 1 && buf.line_len(0) == 0
}

/// Split `line` around the character at byte `col`; past the end the cursor
/// sits on a blank cell.
pub(super) fn split_at_cursor(line: &str, col: usize) -> (&str, &str, &str) {
    let mut col = col.min(line.len());
    while !line.is_char_boundary(col) {
        col -= 1;
    }
    let (before, rest) = line.split_at(col);
    match rest.chars().next() {
        Some(ch) => {
            let (at, after) = rest.split_at(ch.len_utf8());
            (before, at, after)
        }
        None => (before, " ", ""),
    }
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
