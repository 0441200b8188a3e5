// src/core/scanner/dns_scanner.rs

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::{RData, RecordType};
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::core::error::ProbeError;
use crate::core::models::{
    AnalysisFinding, DnsFailurePayload, DnsQuery, DnsRecord, DnsReport, DnsResult, DnsScanPayload, RecordKind,
    ResolutionSource, Severity,
};

pub const LOOKUP_FAILED: &str = "DNS lookup failed";
pub const SPELLING_TIP: &str = "Check domain spelling";

/// The resolution capabilities the fallback strategy is built on.
///
/// `resolve` is the generic path; the typed calls are the fallback path.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    async fn resolve(&self, domain: &str, record_type: &RecordKind) -> Result<Vec<DnsRecord>, String>;
    async fn resolve_ipv4(&self, domain: &str) -> Result<Vec<DnsRecord>, String>;
    async fn resolve_ipv6(&self, domain: &str) -> Result<Vec<DnsRecord>, String>;
    async fn resolve_mx(&self, domain: &str) -> Result<Vec<DnsRecord>, String>;
    async fn resolve_txt(&self, domain: &str) -> Result<Vec<DnsRecord>, String>;
}

/// Resolves `query`, trying the generic path first and one type-specific
/// call second.
///
/// When both fail, the error carries the primary path's message. The
/// fallback's own error is only logged.
pub async fn resolve<B: DnsBackend + ?Sized>(backend: &B, query: &DnsQuery) -> Result<DnsResult, ProbeError> {
    let DnsQuery { domain, record_type } = query;
    debug!(domain = %domain, record_type = %record_type, "Resolving through primary path.");

    let primary_error = match backend.resolve(domain, record_type).await {
        Ok(records) => {
            return Ok(DnsResult { records, source: ResolutionSource::Primary });
        }
        Err(e) => e,
    };
    warn!(domain = %domain, record_type = %record_type, error = %primary_error, "Primary DNS lookup failed, trying fallback.");

    let fallback = match record_type {
        RecordKind::Aaaa => backend.resolve_ipv6(domain).await,
        RecordKind::Mx => backend.resolve_mx(domain).await,
        RecordKind::Txt => backend.resolve_txt(domain).await,
        _ => backend.resolve_ipv4(domain).await,
    };

    match fallback {
        Ok(records) => {
            info!(domain = %domain, count = records.len(), "Fallback DNS lookup succeeded.");
            Ok(DnsResult { records, source: ResolutionSource::Fallback })
        }
        Err(fallback_error) => {
            warn!(domain = %domain, error = %fallback_error, "Fallback DNS lookup failed.");
            Err(ProbeError::DnsLookupFailed { domain: domain.clone(), message: primary_error })
        }
    }
}

/// `hickory-resolver` backend: the configured upstream answers the generic
/// lookups, the system resolver answers the typed ones.
pub struct HickoryBackend {
    primary: TokioAsyncResolver,
    system: TokioAsyncResolver,
}

impl HickoryBackend {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        let primary = TokioAsyncResolver::tokio(ResolverConfig::default(), opts.clone());
        let system = match hickory_resolver::system_conf::read_system_conf() {
            Ok((config, mut system_opts)) => {
                system_opts.timeout = timeout;
                system_opts.attempts = 1;
                TokioAsyncResolver::tokio(config, system_opts)
            }
            Err(e) => {
                warn!(error = %e, "Could not read system resolver configuration, using Cloudflare.");
                TokioAsyncResolver::tokio(ResolverConfig::cloudflare(), opts)
            }
        };
        Self { primary, system }
    }
}

fn trim_name(name: impl ToString) -> String {
    name.to_string().trim_end_matches('.').to_string()
}

fn record_from_rdata(rdata: &RData) -> DnsRecord {
    match rdata {
        RData::A(a) => DnsRecord::Address(a.0.into()),
        RData::AAAA(aaaa) => DnsRecord::Address(aaaa.0.into()),
        RData::MX(mx) => DnsRecord::Mx { exchange: trim_name(mx.exchange()), priority: mx.preference() },
        RData::TXT(txt) => DnsRecord::Txt(
            txt.txt_data()
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect(),
        ),
        RData::NS(name) => DnsRecord::Text(trim_name(&name.0)),
        RData::CNAME(name) => DnsRecord::Text(trim_name(&name.0)),
        RData::PTR(name) => DnsRecord::Text(trim_name(&name.0)),
        other => DnsRecord::Text(other.to_string()),
    }
}

fn record_type_of(kind: &RecordKind) -> Result<RecordType, String> {
    match kind {
        RecordKind::A => Ok(RecordType::A),
        RecordKind::Aaaa => Ok(RecordType::AAAA),
        RecordKind::Mx => Ok(RecordType::MX),
        RecordKind::Txt => Ok(RecordType::TXT),
        RecordKind::Ns => Ok(RecordType::NS),
        RecordKind::Cname => Ok(RecordType::CNAME),
        RecordKind::Soa => Ok(RecordType::SOA),
        RecordKind::Srv => Ok(RecordType::SRV),
        RecordKind::Caa => Ok(RecordType::CAA),
        RecordKind::Ptr => Ok(RecordType::PTR),
        RecordKind::Other(name) => RecordType::from_str(&name.to_ascii_uppercase())
            .map_err(|_| format!("Unsupported record type: {name}")),
    }
}

#[async_trait]
impl DnsBackend for HickoryBackend {
    async fn resolve(&self, domain: &str, record_type: &RecordKind) -> Result<Vec<DnsRecord>, String> {
        let record_type = record_type_of(record_type)?;
        let lookup = self.primary.lookup(domain, record_type).await.map_err(|e| e.to_string())?;
        Ok(lookup.iter().map(record_from_rdata).collect())
    }

    async fn resolve_ipv4(&self, domain: &str) -> Result<Vec<DnsRecord>, String> {
        let lookup = self.system.ipv4_lookup(domain).await.map_err(|e| e.to_string())?;
        Ok(lookup.iter().map(|a| DnsRecord::Address(a.0.into())).collect())
    }

    async fn resolve_ipv6(&self, domain: &str) -> Result<Vec<DnsRecord>, String> {
        let lookup = self.system.ipv6_lookup(domain).await.map_err(|e| e.to_string())?;
        Ok(lookup.iter().map(|aaaa| DnsRecord::Address(aaaa.0.into())).collect())
    }

    async fn resolve_mx(&self, domain: &str) -> Result<Vec<DnsRecord>, String> {
        let lookup = self.system.mx_lookup(domain).await.map_err(|e| e.to_string())?;
        Ok(lookup
            .iter()
            .map(|mx| DnsRecord::Mx { exchange: trim_name(mx.exchange()), priority: mx.preference() })
            .collect())
    }

    async fn resolve_txt(&self, domain: &str) -> Result<Vec<DnsRecord>, String> {
        let lookup = self.system.txt_lookup(domain).await.map_err(|e| e.to_string())?;
        Ok(lookup
            .iter()
            .map(|txt| {
                DnsRecord::Txt(
                    txt.txt_data()
                        .iter()
                        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                        .collect(),
                )
            })
            .collect())
    }
}

/// Runs the DNS check for one record type and shapes the result as a payload.
///
/// # Arguments
///
/// * `backend` - The resolver to query.
/// * `domain` - A bare host name.
/// * `record_type` - The record type to look up.
///
/// # Returns
///
/// A resolved report, or a failed report when both resolution paths came up
/// empty. Only invalid input is returned as an error.
pub async fn run_dns_scan<B: DnsBackend + ?Sized>(
    backend: &B,
    domain: &str,
    record_type: &RecordKind,
) -> Result<DnsReport, ProbeError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ProbeError::Input("Domain"));
    }
    info!(domain, record_type = %record_type, "Starting DNS scan.");

    let query = DnsQuery { domain: domain.to_string(), record_type: record_type.clone() };
    let report = match resolve(backend, &query).await {
        Ok(result) => DnsReport::Resolved(DnsScanPayload {
            domain: query.domain,
            record_type: record_type.to_string(),
            records: result.records,
            source: result.source,
            timestamp: Utc::now(),
        }),
        Err(ProbeError::DnsLookupFailed { message, .. }) => DnsReport::Failed(DnsFailurePayload {
            domain: query.domain,
            record_type: record_type.to_string(),
            error: LOOKUP_FAILED.to_string(),
            message,
            tip: SPELLING_TIP.to_string(),
        }),
        Err(other) => return Err(other),
    };
    Ok(report)
}

/// Resolves every configured record type concurrently, in the order given
/// by `config.record_types`.
pub async fn run_dns_scans(domain: &str, config: &ScanConfig) -> Result<Vec<DnsReport>, ProbeError> {
    let backend = HickoryBackend::new(config.dns_timeout);
    let scans = config
        .record_types
        .iter()
        .map(|record_type| run_dns_scan(&backend, domain, record_type));
    futures::future::join_all(scans).await.into_iter().collect()
}

/// One finding when any record type failed to resolve.
///
/// # Returns
///
/// A single `DNS_LOOKUP_FAILED` warning, or nothing when every lookup
/// succeeded.
pub fn analyze_dns_results(reports: &[DnsReport]) -> Vec<AnalysisFinding> {
    let failed = reports.iter().filter(|r| matches!(r, DnsReport::Failed(_))).count();
    if failed == 0 {
        return Vec::new();
    }
    debug!(failed, "DNS analysis: some lookups failed.");
    vec![AnalysisFinding::new(Severity::Warning, "DNS_LOOKUP_FAILED")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend with scripted answers that records which calls were made.
    #[derive(Default)]
    struct ScriptedBackend {
        primary: Option<Vec<DnsRecord>>,
        fallback: Option<Vec<DnsRecord>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn answer(&self, call: &str, records: &Option<Vec<DnsRecord>>, error: &str) -> Result<Vec<DnsRecord>, String> {
            self.calls.lock().unwrap().push(call.to_string());
            records.clone().ok_or_else(|| error.to_string())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DnsBackend for ScriptedBackend {
        async fn resolve(&self, _domain: &str, record_type: &RecordKind) -> Result<Vec<DnsRecord>, String> {
            self.answer(&format!("resolve:{record_type}"), &self.primary, "queryA ESERVFAIL")
        }
        async fn resolve_ipv4(&self, _domain: &str) -> Result<Vec<DnsRecord>, String> {
            self.answer("ipv4", &self.fallback, "fallback ENOTFOUND")
        }
        async fn resolve_ipv6(&self, _domain: &str) -> Result<Vec<DnsRecord>, String> {
            self.answer("ipv6", &self.fallback, "fallback ENOTFOUND")
        }
        async fn resolve_mx(&self, _domain: &str) -> Result<Vec<DnsRecord>, String> {
            self.answer("mx", &self.fallback, "fallback ENOTFOUND")
        }
        async fn resolve_txt(&self, _domain: &str) -> Result<Vec<DnsRecord>, String> {
            self.answer("txt", &self.fallback, "fallback ENOTFOUND")
        }
    }

    fn records() -> Vec<DnsRecord> {
        vec![DnsRecord::Address("93.184.216.34".parse().unwrap())]
    }

    fn query(record_type: RecordKind) -> DnsQuery {
        DnsQuery { domain: "example.com".to_string(), record_type }
    }

    #[tokio::test]
    async fn primary_success_is_tagged_primary() {
        let backend = ScriptedBackend { primary: Some(records()), ..Default::default() };
        let result = resolve(&backend, &query(RecordKind::A)).await.unwrap();
        assert_eq!(result, DnsResult { records: records(), source: ResolutionSource::Primary });
        assert_eq!(backend.calls(), ["resolve:A"]);
    }

    #[tokio::test]
    async fn fallback_success_is_tagged_fallback() {
        let backend = ScriptedBackend { fallback: Some(records()), ..Default::default() };
        let result = resolve(&backend, &query(RecordKind::A)).await.unwrap();
        assert_eq!(result, DnsResult { records: records(), source: ResolutionSource::Fallback });
        assert_eq!(backend.calls(), ["resolve:A", "ipv4"]);
    }

    #[tokio::test]
    async fn double_failure_reports_the_primary_error() {
        let backend = ScriptedBackend::default();
        let err = resolve(&backend, &query(RecordKind::Mx)).await.unwrap_err();
        assert_eq!(
            err,
            ProbeError::DnsLookupFailed { domain: "example.com".into(), message: "queryA ESERVFAIL".into() }
        );
        // Exactly one fallback attempt.
        assert_eq!(backend.calls(), ["resolve:MX", "mx"]);
    }

    #[tokio::test]
    async fn fallback_call_follows_the_record_type() {
        let cases = [
            (RecordKind::A, "ipv4"),
            (RecordKind::Aaaa, "ipv6"),
            (RecordKind::Mx, "mx"),
            (RecordKind::Txt, "txt"),
            (RecordKind::Ns, "ipv4"),
            (RecordKind::Other("HINFO".into()), "ipv4"),
        ];
        for (record_type, expected) in cases {
            let backend = ScriptedBackend { fallback: Some(records()), ..Default::default() };
            resolve(&backend, &query(record_type)).await.unwrap();
            assert_eq!(backend.calls()[1], expected);
        }
    }

    #[tokio::test]
    async fn payloads_carry_type_source_and_failure_hint() {
        let backend = ScriptedBackend { fallback: Some(records()), ..Default::default() };
        let DnsReport::Resolved(payload) = run_dns_scan(&backend, " example.com ", &RecordKind::Aaaa).await.unwrap()
        else {
            panic!("expected records")
        };
        assert_eq!(payload.domain, "example.com");
        assert_eq!(payload.record_type, "AAAA");
        assert_eq!(payload.source, ResolutionSource::Fallback);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "AAAA");
        assert_eq!(json["source"], "fallback");

        let failing = ScriptedBackend::default();
        let report = run_dns_scan(&failing, "example.com", &RecordKind::A).await.unwrap();
        let DnsReport::Failed(failure) = &report else { panic!("expected a failure") };
        assert_eq!(failure.error, LOOKUP_FAILED);
        assert_eq!(failure.message, "queryA ESERVFAIL");
        assert_eq!(failure.tip, SPELLING_TIP);
        assert_eq!(
            analyze_dns_results(std::slice::from_ref(&report)),
            vec![AnalysisFinding::new(Severity::Warning, "DNS_LOOKUP_FAILED")]
        );
    }

    #[tokio::test]
    async fn blank_domain_is_rejected() {
        let backend = ScriptedBackend::default();
        let result = run_dns_scan(&backend, "", &RecordKind::A).await;
        assert_eq!(result, Err(ProbeError::Input("Domain")));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn record_kinds_map_to_hickory_types() {
        assert_eq!(record_type_of(&RecordKind::Aaaa), Ok(RecordType::AAAA));
        assert_eq!(record_type_of(&RecordKind::Other("hinfo".into())), Ok(RecordType::HINFO));
        assert!(record_type_of(&RecordKind::Other("BOGUS".into())).is_err());
    }
}
