// src/core/scanner/mod.rs

pub mod dns_scanner;
pub mod headers_scanner;
pub mod ssl_scanner;

use chrono::Utc;
use tracing::info;

use crate::config::ScanConfig;
use crate::core::error::ProbeError;
use crate::core::models::{DnsReport, HeaderScanPayload, Outcome, PostureReport, TlsScanPayload, WhoisPayload};
use crate::core::scoring::headers::HeaderCatalog;
use crate::core::target::host_of;
use crate::core::whois::run_whois_links;

use self::dns_scanner::{analyze_dns_results, run_dns_scans};
use self::headers_scanner::{analyze_headers_results, run_headers_scan};
use self::ssl_scanner::{analyze_ssl_results, run_ssl_scan};

/// Runs every check against `target` concurrently and aggregates the results.
///
/// # Arguments
///
/// * `target` - A URL or domain as the user typed it. The header check gets
///   it unchanged while TLS, DNS and WHOIS get its host part.
/// * `config` - Timeouts, catalog and record types for the checks.
///
/// # Returns
///
/// The assembled report with findings from every section. Only a blank
/// target is an error since each check absorbs its own network failures.
pub async fn run_full_scan(target: &str, config: &ScanConfig) -> Result<PostureReport, ProbeError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ProbeError::Input("URL"));
    }
    let host = host_of(target);
    info!(input = target, host = %host, "Starting full posture scan.");

    let (headers, tls, dns) = tokio::join!(
        run_headers_scan(target, config),
        run_ssl_scan(&host, config),
        run_dns_scans(&host, config)
    );
    let whois = run_whois_links(&host)?;

    Ok(assemble_report(target, &host, headers?, tls?, dns?, whois, &config.catalog))
}

fn assemble_report(
    target: &str,
    host: &str,
    headers: Outcome<HeaderScanPayload>,
    tls: Outcome<TlsScanPayload>,
    dns: Vec<DnsReport>,
    whois: WhoisPayload,
    catalog: &HeaderCatalog,
) -> PostureReport {
    let mut findings = analyze_headers_results(&headers, catalog);
    findings.extend(analyze_ssl_results(&tls));
    findings.extend(analyze_dns_results(&dns));
    info!(finding_count = findings.len(), "Full posture scan finished.");

    PostureReport {
        target: target.to_string(),
        host: host.to_string(),
        headers,
        tls,
        dns,
        whois,
        findings,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AnalysisFinding, DnsFailurePayload, Grade, Severity};

    fn fallback_headers() -> Outcome<HeaderScanPayload> {
        Outcome::Fallback {
            value: HeaderScanPayload {
                url: "https://example.invalid".into(),
                status: None,
                score: 5,
                max_score: 10,
                grade: Grade::C,
                found: vec![],
                missing: vec![],
                recommendations: vec![],
                headers: None,
                timestamp: Utc::now(),
            },
            reason: "HTTP request failed: dns error".into(),
        }
    }

    fn fallback_tls() -> Outcome<TlsScanPayload> {
        Outcome::Fallback {
            value: TlsScanPayload {
                domain: "example.invalid".into(),
                grade: Grade::F,
                score: 0,
                max_score: 10,
                protocol: None,
                issuer: None,
                valid_to: None,
                valid_from: None,
                recommendations: vec![ssl_scanner::CHECK_HTTPS.into()],
                error: Some(ssl_scanner::CONNECTION_FAILED.into()),
                timestamp: Utc::now(),
            },
            reason: "TCP Connection Error: refused".into(),
        }
    }

    fn failed_lookup(record_type: &str) -> DnsReport {
        DnsReport::Failed(DnsFailurePayload {
            domain: "example.invalid".into(),
            record_type: record_type.into(),
            error: dns_scanner::LOOKUP_FAILED.into(),
            message: "no record found".into(),
            tip: dns_scanner::SPELLING_TIP.into(),
        })
    }

    #[test]
    fn report_collects_findings_from_every_section() {
        let report = assemble_report(
            "example.invalid",
            "example.invalid",
            fallback_headers(),
            fallback_tls(),
            vec![failed_lookup("A"), failed_lookup("MX")],
            run_whois_links("example.invalid").unwrap(),
            &HeaderCatalog::extended(),
        );
        assert_eq!(
            report.findings,
            vec![
                AnalysisFinding::new(Severity::Critical, "HEADERS_REQUEST_FAILED"),
                AnalysisFinding::new(Severity::Critical, "SSL_HANDSHAKE_FAILED"),
                AnalysisFinding::new(Severity::Warning, "DNS_LOOKUP_FAILED"),
            ]
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["headers"]["outcome"], "fallback");
        assert_eq!(json["headers"]["grade"], "C");
        assert_eq!(json["tls"]["maxScore"], 10);
        assert_eq!(json["dns"][1]["tip"], "Check domain spelling");
        assert_eq!(json["whois"]["services"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn blank_target_is_rejected() {
        let result = run_full_scan("  ", &ScanConfig::default()).await;
        assert_eq!(result, Err(ProbeError::Input("URL")));
    }
}
