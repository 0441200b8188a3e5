// src/ui/widgets/input.rs
use crate::app::{App, AppState};
use ratatui::{
    layout::Position,
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the input box widget.
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_block = Block::default().borders(Borders::ALL).title("Target Domain or URL");
    let input_paragraph = Paragraph::new(app.input.as_str())
        .block(input_block)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(input_paragraph, area);

    // Cursor only while typing.
    if let AppState::Idle = app.state {
        let offset = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
        frame.set_cursor_position(Position::new(area.x.saturating_add(offset).saturating_add(1), area.y + 1));
    }
}
