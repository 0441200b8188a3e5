// src/core/error.rs

use thiserror::Error;

/// Failures a probe or orchestrator can report.
///
/// Scorers never produce these; only the network-facing side does. The
/// orchestrators decide which of them are surfaced and which are replaced
/// by a fallback outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// A required parameter (domain or URL) was missing or blank.
    #[error("{0} required")]
    Input(&'static str),

    /// Connection refused, timeout, DNS failure, TLS handshake failure or an
    /// unusable HTTP response.
    #[error("{0}")]
    Network(String),

    /// The handshake succeeded but the certificate could not be read.
    #[error("incomplete certificate data: {0}")]
    PartialData(String),

    /// Both the primary and the fallback DNS paths failed. `message` is the
    /// primary path's error.
    #[error("DNS lookup failed for {domain}: {message}")]
    DnsLookupFailed { domain: String, message: String },
}

impl ProbeError {
    pub fn network(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Network(format!("{context}: {err}"))
    }
}

/// Rejections raised while building a custom header catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("header catalog must contain at least one rule")]
    Empty,
    #[error("header rule at position {0} has an empty name")]
    EmptyName(usize),
    #[error("header rule '{0}' must have a weight of at least 1")]
    ZeroWeight(String),
    #[error("header rule '{0}' must look like Name=weight")]
    Malformed(String),
}
