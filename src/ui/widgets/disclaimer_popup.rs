// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    text::Line,
};

/// Renders the disclaimer modal on top of the existing UI.
///
/// `Clear` wipes the popup area first so the interface underneath does not
/// bleed through.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let disclaimer_text = Text::from(vec![
        Line::from("BEFORE YOU SCAN".bold().yellow()),
        Line::from(""),
        Line::from("Posture Grader sends HTTP, TLS and DNS probes to the target you enter. It is intended for assessing sites you own or are explicitly authorized to test."),
        Line::from(""),
        Line::from("The probes are lightweight, but automated scanning of systems you do not control may violate their terms of service or local law."),
        Line::from(""),
        Line::from("Grades are heuristics. A high score does not certify that a site is secure, and the TLS probe does not validate the certificate chain."),
        Line::from(""),
        Line::from("Press ".bold() + "Enter".bold().yellow() + " to Acknowledge and Continue".bold()),
    ]);

    let block = Block::default()
        .title("Disclaimer")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let popup_area = centered_rect(70, 60, area);

    let popup = Paragraph::new(disclaimer_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

/// A `Rect` of the given percentages, centered in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centered() {
        let popup = centered_rect(70, 60, Rect::new(0, 0, 100, 50));
        assert_eq!(popup.width, 70);
        assert_eq!(popup.height, 30);
        assert_eq!(popup.x, 15);
        assert_eq!(popup.y, 10);
    }
}
