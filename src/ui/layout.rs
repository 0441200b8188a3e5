// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen areas of the interface, computed once per frame.
pub struct AppLayout {
    pub input: Rect,
    pub report: Rect,
    pub summary: Rect,
    pub footer: Rect,
}

/// Splits the frame into the input box, a content row and a one-line footer.
///
/// The content row holds the findings list (65%) next to the summary (35%).
pub fn create_layout(frame_size: Rect) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame_size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main_chunks[1]);

    AppLayout {
        input: main_chunks[0],
        report: content_chunks[0],
        summary: content_chunks[1],
        footer: main_chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_cover_the_frame_without_overlap() {
        let layout = create_layout(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.input.height, 3);
        assert_eq!(layout.footer.height, 1);
        assert_eq!(layout.footer.y, 39);
        assert_eq!(layout.report.height, 36);
        assert_eq!(layout.report.width + layout.summary.width, 100);
        assert_eq!(layout.summary.x, layout.report.x + layout.report.width);
    }
}
