// src/core/models.rs

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// --- Shared Result Types ---

/// Either a genuine measurement or a substituted default.
///
/// The payload fields are flattened next to the `outcome` tag, so a fallback
/// keeps the same JSON shape as a measurement plus a `reason`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome<T> {
    Measured(T),
    Fallback {
        #[serde(flatten)]
        value: T,
        reason: String,
    },
}

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Outcome::Measured(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Measured(_) => None,
            Outcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

// An enumeration representing the severity level of a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

// A finding produced by analysing a report, keyed into the knowledge base by `code`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFinding {
    pub severity: Severity,
    pub code: String,
}

impl AnalysisFinding {
    pub fn new(severity: Severity, code: &str) -> Self {
        Self { severity, code: code.to_string() }
    }
}

/// Letter summary of a numeric score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

// --- HTTP Header Models ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoundHeader {
    pub name: String,
    pub value: String,
}

/// Result of scoring one header set against a catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderScanResult {
    pub score: u32,
    pub grade: Grade,
    pub found: Vec<FoundHeader>,
    pub missing: Vec<String>,
    pub recommendations: Vec<String>,
}

/// JSON payload of the header check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeaderScanPayload {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub score: u32,
    #[serde(rename = "maxScore")]
    pub max_score: u32,
    pub grade: Grade,
    pub found: Vec<FoundHeader>,
    pub missing: Vec<String>,
    pub recommendations: Vec<String>,
    /// Every response header, lower-cased, first value kept. Absent on fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub timestamp: DateTime<Utc>,
}

// --- SSL/TLS Models ---

/// Fields read from a single informational TLS handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateFacts {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub issuer_common_name: Option<String>,
    pub negotiated_protocol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsScanResult {
    pub score: i32,
    pub grade: Grade,
    pub recommendations: Vec<String>,
}

/// JSON payload of the TLS check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TlsScanPayload {
    pub domain: String,
    pub grade: Grade,
    pub score: i32,
    #[serde(rename = "maxScore")]
    pub max_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// --- DNS Models ---

/// Record type requested by a DNS query. Unrecognized names are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum RecordKind {
    A,
    #[strum(serialize = "AAAA")]
    Aaaa,
    #[strum(serialize = "MX")]
    Mx,
    #[strum(serialize = "TXT")]
    Txt,
    #[strum(serialize = "NS")]
    Ns,
    #[strum(serialize = "CNAME")]
    Cname,
    #[strum(serialize = "SOA")]
    Soa,
    #[strum(serialize = "SRV")]
    Srv,
    #[strum(serialize = "CAA")]
    Caa,
    #[strum(serialize = "PTR")]
    Ptr,
    #[strum(default)]
    Other(String),
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Mx => "MX",
            RecordKind::Txt => "TXT",
            RecordKind::Ns => "NS",
            RecordKind::Cname => "CNAME",
            RecordKind::Soa => "SOA",
            RecordKind::Srv => "SRV",
            RecordKind::Caa => "CAA",
            RecordKind::Ptr => "PTR",
            RecordKind::Other(name) => name,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub domain: String,
    pub record_type: RecordKind,
}

/// One record value, shaped after its type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DnsRecord {
    Address(IpAddr),
    Mx { exchange: String, priority: u16 },
    Txt(Vec<String>),
    Text(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResult {
    pub records: Vec<DnsRecord>,
    pub source: ResolutionSource,
}

/// JSON payload of a successful DNS check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DnsScanPayload {
    pub domain: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub records: Vec<DnsRecord>,
    pub source: ResolutionSource,
    pub timestamp: DateTime<Utc>,
}

/// JSON payload of a failed DNS check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DnsFailurePayload {
    pub domain: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub error: String,
    pub message: String,
    pub tip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DnsReport {
    Resolved(DnsScanPayload),
    Failed(DnsFailurePayload),
}

// --- WHOIS Models ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhoisService {
    pub name: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WhoisPayload {
    pub domain: String,
    pub services: Vec<WhoisService>,
    pub privacy_note: String,
    pub timestamp: DateTime<Utc>,
}

// --- Main Report ---

/// Everything a full scan learned about one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostureReport {
    pub target: String,
    pub host: String,
    pub headers: Outcome<HeaderScanPayload>,
    pub tls: Outcome<TlsScanPayload>,
    pub dns: Vec<DnsReport>,
    pub whois: WhoisPayload,
    pub findings: Vec<AnalysisFinding>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn record_kind_parses_known_and_unknown_names() {
        assert_eq!(RecordKind::from_str("aaaa").unwrap(), RecordKind::Aaaa);
        assert_eq!(RecordKind::from_str("MX").unwrap(), RecordKind::Mx);
        assert_eq!(
            RecordKind::from_str("HINFO").unwrap(),
            RecordKind::Other("HINFO".to_string())
        );
        assert_eq!(RecordKind::Txt.to_string(), "TXT");
        assert_eq!(RecordKind::Other("HINFO".into()).to_string(), "HINFO");
    }

    #[test]
    fn fallback_outcome_serializes_flat_with_reason() {
        let outcome = Outcome::Fallback {
            value: WhoisService {
                name: "n".into(),
                url: "u".into(),
                description: "d".into(),
            },
            reason: "timed out".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "fallback");
        assert_eq!(json["reason"], "timed out");
        assert_eq!(json["name"], "n");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.reason(), Some("timed out"));
    }

    #[test]
    fn dns_records_serialize_by_shape() {
        let records = vec![
            DnsRecord::Address("93.184.216.34".parse().unwrap()),
            DnsRecord::Mx { exchange: "mx.example.com".into(), priority: 10 },
            DnsRecord::Txt(vec!["v=spf1".into(), " -all".into()]),
        ];
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(json[0], "93.184.216.34");
        assert_eq!(json[1]["priority"], 10);
        assert_eq!(json[2][1], " -all");
    }
}
