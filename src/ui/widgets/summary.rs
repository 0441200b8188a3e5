// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use crate::core::models::{DnsRecord, DnsReport, Grade};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

fn record_text(record: &DnsRecord) -> String {
    match record {
        DnsRecord::Address(ip) => ip.to_string(),
        DnsRecord::Mx { exchange, priority } => format!("{priority} {exchange}"),
        DnsRecord::Txt(chunks) => chunks.concat(),
        DnsRecord::Text(text) => text.clone(),
    }
}

fn grade_style(grade: Grade) -> Style {
    match grade {
        Grade::A | Grade::B => Style::default().fg(Color::Green),
        Grade::C => Style::default().fg(Color::Yellow),
        Grade::D | Grade::F => Style::default().fg(Color::Red),
    }
}

/// Renders the summary widget: overall score, per-check grades, issue counts,
/// resolved DNS records and the WHOIS lookup links.
///
/// Nothing but the frame is drawn until a scan has finished.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Score & Rating
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Length(4), // Checks
            Constraint::Length(1),
            Constraint::Length(3), // Issues
            Constraint::Length(1),
            Constraint::Min(0), // DNS records
            Constraint::Length(7), // WHOIS
        ])
        .split(area);

    let Some(report) = (match app.state {
        AppState::Finished => app.scan_report.as_ref(),
        _ => None,
    }) else {
        return;
    };

    // --- Score & Rating ---
    let (rating_text, rating_style) = match app.summary.score {
        90..=100 => ("Excellent", Style::default().fg(Color::Green)),
        75..=89 => ("Good", Style::default().fg(Color::Cyan)),
        50..=74 => ("Needs Improvement", Style::default().fg(Color::Yellow)),
        _ => ("Poor", Style::default().fg(Color::Red)),
    };
    let score_line = Line::from(format!("{}/100 ({})", app.summary.score, rating_text)).style(rating_style);
    let score_text = Text::from(vec![Line::from("Overall Score".bold()), score_line]);
    frame.render_widget(Paragraph::new(score_text).alignment(Alignment::Center), summary_chunks[0]);

    let score_gauge = Gauge::default()
        .percent(u16::from(app.displayed_score))
        .label("")
        .style(Style::default().fg(if app.displayed_score >= 80 {
            Color::Green
        } else if app.displayed_score >= 50 {
            Color::Yellow
        } else {
            Color::Red
        }));
    frame.render_widget(score_gauge, summary_chunks[1]);

    // --- Checks ---
    let mut checks_lines = Vec::new();
    let graded = [
        ("HTTP Headers", app.summary.headers_grade, report.headers.is_fallback()),
        ("SSL/TLS", app.summary.tls_grade, report.tls.is_fallback()),
    ];
    for (name, grade, fallback) in graded {
        let Some(grade) = grade else { continue };
        let mut spans = vec![
            Span::styled(format!("{grade} "), grade_style(grade).bold()),
            Span::raw(name),
        ];
        if fallback {
            spans.push(Span::styled(" (estimated)", Style::default().fg(Color::DarkGray)));
        }
        checks_lines.push(Line::from(spans));
    }
    let (icon, style) = if app.summary.dns_failed == 0 {
        ("✓", Style::default().fg(Color::Green))
    } else {
        ("✗", Style::default().fg(Color::Red))
    };
    checks_lines.push(Line::from(vec![
        Span::styled(format!("{icon} "), style),
        Span::raw(format!("DNS: {} resolved, {} failed", app.summary.dns_resolved, app.summary.dns_failed)),
    ]));
    frame.render_widget(
        Paragraph::new(checks_lines).block(Block::default().title("CHECKS".bold())),
        summary_chunks[3],
    );

    // --- Issues ---
    let details_text = Text::from(vec![
        Line::from(vec![
            Span::raw("Critical: "),
            Span::styled(app.summary.critical_issues.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Warnings: "),
            Span::styled(app.summary.warning_issues.to_string(), Style::default().fg(Color::Yellow)),
        ]),
    ]);
    frame.render_widget(
        Paragraph::new(details_text).block(Block::default().title("ISSUES FOUND".bold())),
        summary_chunks[5],
    );

    // --- DNS Records ---
    let dns_lines: Vec<Line> = report
        .dns
        .iter()
        .map(|entry| match entry {
            DnsReport::Resolved(payload) => {
                let records: Vec<String> = payload.records.iter().map(record_text).collect();
                Line::from(vec![
                    Span::styled(format!("{:<6}", payload.record_type), Style::default().fg(Color::Cyan)),
                    Span::raw(records.join(", ")),
                ])
            }
            DnsReport::Failed(failure) => Line::from(vec![
                Span::styled(format!("{:<6}", failure.record_type), Style::default().fg(Color::Cyan)),
                Span::styled(failure.message.clone(), Style::default().fg(Color::Red)),
            ]),
        })
        .collect();
    frame.render_widget(
        Paragraph::new(dns_lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("DNS RECORDS".bold())),
        summary_chunks[7],
    );

    // --- WHOIS ---
    let mut whois_lines: Vec<Line> = report
        .whois
        .services
        .iter()
        .map(|service| {
            Line::from(vec![
                Span::raw("- "),
                Span::styled(service.name.clone(), Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {}", service.url)),
            ])
        })
        .collect();
    whois_lines.push(Line::from(Span::styled(
        report.whois.privacy_note.clone(),
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(
        Paragraph::new(whois_lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("WHOIS".bold())),
        summary_chunks[8],
    );
}
