// src/config.rs

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::core::error::CatalogError;
use crate::core::models::RecordKind;
use crate::core::scoring::headers::{CatalogVariant, HeaderCatalog, SecurityHeaderRule};

pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Which check a one-shot run prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Check {
    /// The full posture report.
    #[default]
    All,
    Headers,
    Tls,
    Dns,
    Whois,
}

/// Grades the security posture of a domain: HTTP headers, TLS and DNS.
///
/// Without a target the interactive terminal UI starts.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Domain or URL to grade.
    pub target: Option<String>,

    /// Check to run when a target is given.
    #[arg(long, value_enum, default_value_t = Check::All)]
    pub check: Check,

    /// Header catalog to score against.
    #[arg(long, value_enum, default_value_t = CatalogVariant::Extended, env = "POSTURE_GRADER_CATALOG")]
    pub catalog: CatalogVariant,

    /// Custom header rule as `Name=weight`. Repeat the flag (or separate
    /// rules with commas) to build a catalog that replaces `--catalog`.
    #[arg(long = "header-rule", value_name = "NAME=WEIGHT", value_delimiter = ',', env = "POSTURE_GRADER_HEADER_RULES")]
    pub header_rules: Vec<SecurityHeaderRule>,

    /// Timeout for the HTTP header probe, in milliseconds.
    #[arg(long, default_value_t = 8000, env = "POSTURE_GRADER_HEADER_TIMEOUT_MS")]
    pub header_timeout_ms: u64,

    /// Timeout for the TLS handshake probe, in milliseconds.
    #[arg(long, default_value_t = 5000, env = "POSTURE_GRADER_TLS_TIMEOUT_MS")]
    pub tls_timeout_ms: u64,

    /// Timeout for each DNS query, in milliseconds.
    #[arg(long, default_value_t = 5000, env = "POSTURE_GRADER_DNS_TIMEOUT_MS")]
    pub dns_timeout_ms: u64,

    /// Record types to resolve, comma separated.
    #[arg(
        long = "record-type",
        value_delimiter = ',',
        default_value = "A,AAAA,MX,TXT,NS",
        env = "POSTURE_GRADER_RECORD_TYPES"
    )]
    pub record_types: Vec<RecordKind>,

    /// User-Agent sent with the header probe.
    #[arg(long, default_value = DEFAULT_USER_AGENT, env = "POSTURE_GRADER_USER_AGENT")]
    pub user_agent: String,

    /// Print single-line JSON instead of pretty JSON.
    #[arg(long)]
    pub compact: bool,
}

/// Settings shared by every orchestrator for one run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub catalog: HeaderCatalog,
    pub header_timeout: Duration,
    pub tls_timeout: Duration,
    pub dns_timeout: Duration,
    pub record_types: Vec<RecordKind>,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            catalog: HeaderCatalog::default(),
            header_timeout: Duration::from_millis(8000),
            tls_timeout: Duration::from_millis(5000),
            dns_timeout: Duration::from_millis(5000),
            record_types: vec![RecordKind::A, RecordKind::Aaaa, RecordKind::Mx, RecordKind::Txt, RecordKind::Ns],
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Fails only when `--header-rule` describes an invalid catalog.
impl TryFrom<&Cli> for ScanConfig {
    type Error = CatalogError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let catalog = if cli.header_rules.is_empty() {
            HeaderCatalog::from_variant(cli.catalog)
        } else {
            HeaderCatalog::custom(cli.header_rules.clone())?
        };
        Ok(Self {
            catalog,
            header_timeout: Duration::from_millis(cli.header_timeout_ms),
            tls_timeout: Duration::from_millis(cli.tls_timeout_ms),
            dns_timeout: Duration::from_millis(cli.dns_timeout_ms),
            record_types: cli.record_types.clone(),
            user_agent: cli.user_agent.clone(),
        })
    }
}
