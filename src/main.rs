// src/main.rs

use clap::{CommandFactory, Parser, error::ErrorKind};
use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use serde::Serialize;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

mod app;
mod config;
mod core;
mod logging;
mod ui;

use app::{App, AppState};
use config::{Check, Cli, ScanConfig};
use crate::core::error::ProbeError;
use crate::core::models::PostureReport;
use crate::core::scanner::{dns_scanner, headers_scanner, run_full_scan, ssl_scanner};
use crate::core::target::host_of;
use crate::core::whois::run_whois_links;

type ScanMessage = Result<PostureReport, ProbeError>;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    logging::initialize_logging()?;
    let config = match ScanConfig::try_from(&cli) {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    match &cli.target {
        Some(target) => run_once(target, cli.check, &config, cli.compact).await,
        None => run_tui(config).await,
    }
}

/// Runs one check and prints its JSON to stdout.
async fn run_once(target: &str, check: Check, config: &ScanConfig, compact: bool) -> Result<()> {
    info!(input = target, ?check, "Running one-shot check.");
    let host = host_of(target);
    match check {
        Check::All => print_result(run_full_scan(target, config).await, compact),
        Check::Headers => print_result(headers_scanner::run_headers_scan(target, config).await, compact),
        Check::Tls => print_result(ssl_scanner::run_ssl_scan(&host, config).await, compact),
        Check::Dns => print_result(dns_scanner::run_dns_scans(&host, config).await, compact),
        Check::Whois => print_result(run_whois_links(&host), compact),
    }
}

fn print_result<T: Serialize>(result: Result<T, ProbeError>, compact: bool) -> Result<()> {
    match result {
        Ok(value) => print_json(&value, compact),
        Err(e) => {
            error!(error = %e, "Check rejected its input.");
            print_json(&serde_json::json!({ "error": e.to_string() }), compact)?;
            std::process::exit(2);
        }
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact { serde_json::to_string(value)? } else { serde_json::to_string_pretty(value)? };
    println!("{json}");
    Ok(())
}

async fn run_tui(config: ScanConfig) -> Result<()> {
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;

    let result = event_loop(config).await;

    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

async fn event_loop(config: ScanConfig) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel::<ScanMessage>(1);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, &tx, &config)?;
        }

        if let Ok(message) = rx.try_recv() {
            match message {
                Ok(report) => app.finish_scan(report),
                Err(e) => app.fail_scan(e.to_string()),
            }
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(app: &mut App, tx: &mpsc::Sender<ScanMessage>, config: &ScanConfig) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            match app.state {
                AppState::Disclaimer => match key.code {
                    KeyCode::Enter => app.state = AppState::Idle,
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    _ => {}
                },
                AppState::Idle => handle_idle_input(app, key.code, tx, config),
                AppState::Finished => handle_finished_input(app, key.code),
                AppState::Scanning => handle_scanning_input(app, key.code),
            }
        }
    }
    Ok(())
}

fn handle_idle_input(app: &mut App, key_code: KeyCode, tx: &mpsc::Sender<ScanMessage>, config: &ScanConfig) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                return;
            }
            app.state = AppState::Scanning;
            let tx = tx.clone();
            let target = app.input.clone();
            let config = config.clone();

            tokio::spawn(async move {
                let report = run_full_scan(&target, &config).await;
                let _ = tx.send(report).await;
            });
        }
        _ => {}
    }
}

fn handle_scanning_input(app: &mut App, key_code: KeyCode) {
    if let KeyCode::Char('q') | KeyCode::Char('Q') = key_code {
        app.quit();
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Char('Q') => app.quit(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.reset(),
        KeyCode::Char('e') | KeyCode::Char('E') => app.export_report(&logging::get_data_dir()),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_key_is_case_insensitive_while_scanning() {
        for key in ['q', 'Q'] {
            let mut app = App::new();
            app.state = AppState::Scanning;
            handle_scanning_input(&mut app, KeyCode::Char(key));
            assert!(app.should_quit);
        }

        let mut app = App::new();
        app.state = AppState::Scanning;
        handle_scanning_input(&mut app, KeyCode::Char('x'));
        assert!(!app.should_quit);
    }
}
