// src/app.rs

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use ratatui::widgets::ListState;
use tracing::{error, info};

use crate::core::models::{AnalysisFinding, DnsReport, Grade, PostureReport, Severity};

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

pub enum AppState {
    Disclaimer,
    Idle,
    Scanning,
    Finished,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub score: u8,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub headers_grade: Option<Grade>,
    pub tls_grade: Option<Grade>,
    pub dns_resolved: usize,
    pub dns_failed: usize,
}

impl ScanSummary {
    /// 100, minus 15 per critical and 5 per warning finding, floored at zero.
    pub fn from_report(report: &PostureReport) -> Self {
        let count = |severity: Severity| report.findings.iter().filter(|f| f.severity == severity).count();
        let critical_issues = count(Severity::Critical);
        let warning_issues = count(Severity::Warning);
        let penalty = critical_issues.saturating_mul(15).saturating_add(warning_issues.saturating_mul(5));
        let dns_failed = report.dns.iter().filter(|r| matches!(r, DnsReport::Failed(_))).count();

        Self {
            score: 100usize.saturating_sub(penalty) as u8,
            critical_issues,
            warning_issues,
            headers_grade: Some(report.headers.value().grade),
            tls_grade: Some(report.tls.value().grade),
            dns_resolved: report.dns.len() - dns_failed,
            dns_failed,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub scan_report: Option<PostureReport>,
    pub scan_error: Option<String>,
    pub summary: ScanSummary,
    pub all_findings: Vec<AnalysisFinding>,
    pub analysis_list_state: ListState,
    pub spinner_frame: usize,
    pub displayed_score: u8,
    pub export_status: ExportStatus,
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            state: AppState::Disclaimer,
            input: String::new(),
            scan_report: None,
            scan_error: None,
            summary: ScanSummary::default(),
            all_findings: Vec::new(),
            analysis_list_state: ListState::default(),
            spinner_frame: 0,
            displayed_score: 0,
            export_status: ExportStatus::Idle,
        }
    }

    pub fn finish_scan(&mut self, report: PostureReport) {
        self.all_findings = report.findings.clone();
        self.scan_report = Some(report);
        self.scan_error = None;
        self.state = AppState::Finished;
        self.update_summary();
        self.analysis_list_state.select(None);
    }

    pub fn fail_scan(&mut self, message: String) {
        self.scan_report = None;
        self.scan_error = Some(message);
        self.state = AppState::Finished;
        self.summary = ScanSummary::default();
    }

    pub fn update_summary(&mut self) {
        if let Some(report) = &self.scan_report {
            self.summary = ScanSummary::from_report(report);
        }
    }

    pub fn select_next(&mut self) {
        if self.all_findings.is_empty() {
            return;
        }
        let next = match self.analysis_list_state.selected() {
            Some(i) if i + 1 < self.all_findings.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.analysis_list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.all_findings.is_empty() {
            return;
        }
        let previous = self.analysis_list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.analysis_list_state.select(Some(previous));
    }

    /// Writes the current report as JSON under `<data_dir>/reports`.
    pub fn export_report(&mut self, data_dir: &Path) {
        let Some(report) = &self.scan_report else {
            self.export_status = ExportStatus::Error("No report to export".to_string());
            return;
        };
        self.export_status = match write_report(report, data_dir) {
            Ok(path) => {
                info!(path = %path.display(), "Report exported.");
                ExportStatus::Success(path.display().to_string())
            }
            Err(e) => {
                error!(error = ?e, "Report export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    pub fn on_tick(&mut self) {
        match self.state {
            AppState::Scanning => self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len(),
            AppState::Finished if self.displayed_score < self.summary.score => {
                self.displayed_score = (self.displayed_score + 4).min(self.summary.score);
            }
            AppState::Finished if self.displayed_score > self.summary.score => {
                self.displayed_score = self.summary.score;
            }
            _ => {}
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.scan_report = None;
        self.scan_error = None;
        self.summary = ScanSummary::default();
        self.all_findings.clear();
        self.analysis_list_state = ListState::default();
        self.spinner_frame = 0;
        self.displayed_score = 0;
        self.export_status = ExportStatus::Idle;
    }
}

fn write_report(report: &PostureReport, data_dir: &Path) -> Result<PathBuf> {
    let directory = data_dir.join("reports");
    std::fs::create_dir_all(&directory).wrap_err("could not create the reports directory")?;

    let file_name = format!("{}-{}.json", file_stem(&report.host), report.generated_at.format("%Y%m%dT%H%M%S"));
    let path = directory.join(file_name);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json).wrap_err_with(|| format!("could not write {}", path.display()))?;
    Ok(path)
}

/// Hosts come from user input, so anything outside `[A-Za-z0-9.-]` is
/// replaced before the host becomes part of a path.
fn file_stem(host: &str) -> String {
    let stem: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    match stem.trim_matches('.') {
        "" => "report".to_string(),
        _ => stem,
    }
}
