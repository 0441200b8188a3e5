// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base::{self, FindingCategory};
use crate::core::models::Severity;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Info => Style::default().fg(Color::Cyan),
    }
}

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Analysis Report (Navigate with ↑ ↓)");

    if !matches!(app.state, AppState::Finished) {
        let content = match app.state {
            AppState::Scanning => {
                let spinner_char = SPINNER_CHARS[app.spinner_frame % SPINNER_CHARS.len()];
                Paragraph::new(Line::from(vec![
                    Span::styled(format!("{spinner_char} "), Style::default().fg(Color::Cyan)),
                    Span::raw("Probing headers, TLS and DNS... Please wait."),
                ]))
                .alignment(Alignment::Center)
            }
            _ => Paragraph::new("Scan results will appear here...").alignment(Alignment::Center),
        };
        frame.render_widget(content.block(main_block), area);
        return;
    }

    if let Some(message) = &app.scan_error {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from("SCAN REJECTED".red().bold()),
            Line::from(""),
            Line::from(message.as_str()),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(main_block);
        frame.render_widget(p, area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .all_findings
        .iter()
        .map(|f| {
            let (prefix, title) = match knowledge_base::get_finding_detail(&f.code) {
                Some(detail) => {
                    let prefix = match detail.category {
                        FindingCategory::Dns => "[DNS] ",
                        FindingCategory::Ssl => "[SSL/TLS] ",
                        FindingCategory::Http => "[HTTP] ",
                    };
                    (prefix, detail.title.to_string())
                }
                None => ("", f.code.clone()),
            };
            ListItem::new(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(title, severity_style(f.severity)),
            ]))
        })
        .collect();

    let findings_list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(findings_list, chunks[0], &mut app.analysis_list_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let selected = app
        .analysis_list_state
        .selected()
        .and_then(|i| app.all_findings.get(i))
        .and_then(|finding| knowledge_base::get_finding_detail(&finding.code));

    match selected {
        Some(detail) => {
            let text = vec![
                Line::from(""),
                Line::from(format!("{} · {}", detail.category, detail.title).bold()),
                Line::from(""),
                Line::from("WHAT IT IS:".yellow().bold()),
                Line::from(detail.description),
                Line::from(""),
                Line::from("HOW TO FIX:".yellow().bold()),
                Line::from(detail.remediation),
            ];
            let p = Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block);
            frame.render_widget(p, chunks[1]);
        }
        None => render_placeholder_details(frame, app, detail_block, chunks[1]),
    }
}

fn render_placeholder_details(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let placeholder_text = if app.all_findings.is_empty() {
        Text::from(vec![
            Line::from(""),
            Line::from("✓ EXCELLENT SECURITY POSTURE".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("Every catalog header is present, TLS is current and all records resolved."),
        ])
    } else {
        Text::from("Select an item above to see details.")
    };

    let p = Paragraph::new(placeholder_text).alignment(Alignment::Center).block(block);
    frame.render_widget(p, area);
}
