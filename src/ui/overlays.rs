use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::app::Model;

pub fn render_file_prompt(model: &Model, frame: &mut Frame, area: Rect) {
    let Some(prompt) = &model.prompt else {
        return;
    };
    let popup = centered_popup_rect(area.width.saturating_sub(8).max(40), 7, area);
    let dim_style = Style::default().fg(Color::Indexed(245));

    // Keep the tail of long paths visible.
    let room = usize::from(popup.width.saturating_sub(6));
    let shown = tail_within(&prompt.input, room);

    let lines = vec![
        Line::from(vec![
            Span::raw(shown),
            Span::styled(" ", Style::default().bg(Color::White)),
        ]),
        Line::raw(""),
        Line::styled("Enter: open \u{2502} Esc: cancel", dim_style),
    ];

    let block = Block::default()
        .title("Open File")
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(2).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(Color::Indexed(245));

    let lines = vec![
        Line::styled("File", section_style),
        Line::raw("  Ctrl-o              Choose a file to edit"),
        Line::raw("  Ctrl-s              Save to the open file"),
        Line::raw("  Ctrl-q / Ctrl-c     Quit (twice with unsaved changes)"),
        Line::raw(""),
        Line::styled("Editor", section_style),
        Line::raw("  Arrows, Home/End    Navigate"),
        Line::raw("  Ctrl+Home/End       Buffer start / end"),
        Line::raw("  PageUp/PageDown     Scroll"),
        Line::raw(""),
        Line::styled("Config", section_style),
        Line::raw(format!("  Global: {global_cfg}")),
        Line::raw(format!("  Local override: {local_cfg}")),
        Line::raw(""),
        Line::styled("Any key closes", dim_style),
    ];

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// The longest suffix of `text` that fits in `width` columns.
fn tail_within(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        used += ch.width().unwrap_or(0);
        if used > width {
            break;
        }
        start = idx;
    }
    &text[start..]
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
