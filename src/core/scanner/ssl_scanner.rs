// src/core/scanner/ssl_scanner.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rustls::ProtocolVersion;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

use crate::config::ScanConfig;
use crate::core::error::ProbeError;
use crate::core::models::{AnalysisFinding, CertificateFacts, Grade, Outcome, Severity, TlsScanPayload};
use crate::core::scoring::MAX_SCORE;
use crate::core::scoring::tls::{EXPIRING_SOON, UPGRADE_PROTOCOL, score_tls};

pub const TLS_PORT: u16 = 443;

pub const CONNECTION_FAILED: &str = "Could not establish SSL connection";
pub const CHECK_HTTPS: &str = "Check if domain supports HTTPS";

/// Certificate verification stays off inside this module. Nothing here is
/// exported, so the verifier cannot end up in a client that needs trust.
mod insecure {
    use std::sync::Arc;

    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};

    /// Accepts any chain and name, but still checks handshake signatures.
    #[derive(Debug)]
    struct AcceptAnyCertificate(Arc<CryptoProvider>);

    impl ServerCertVerifier for AcceptAnyCertificate {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn verify_tls13_signature(
            &self,
            message: &[u8],
            cert: &CertificateDer<'_>,
            dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            self.0.signature_verification_algorithms.supported_schemes()
        }
    }

    pub(super) fn client_config() -> Result<ClientConfig, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        Ok(ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
            .with_no_client_auth())
    }
}

/// Reads protocol and certificate metadata from a TLS handshake without
/// deciding whether the certificate is trustworthy.
///
/// Use this only to describe a server. Its connections accept any
/// certificate.
pub struct InformationalTlsProbe {
    timeout: Duration,
    port: u16,
}

impl InformationalTlsProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, port: TLS_PORT }
    }

    #[cfg(test)]
    fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Connects to `host`, completes the handshake within the timeout and
    /// returns what the server presented.
    pub async fn inspect(&self, host: &str) -> Result<CertificateFacts, ProbeError> {
        let config = insecure::client_config().map_err(|e| {
            error!(error = %e, "Failed to build TLS client configuration");
            ProbeError::network("TLS configuration error", e)
        })?;
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| {
            warn!(host, error = %e, "Invalid server name");
            ProbeError::network("Invalid domain name", e)
        })?;
        let connector = TlsConnector::from(Arc::new(config));

        debug!(host, port = self.port, "Performing TLS connection and handshake.");
        let handshake = async {
            let stream = TcpStream::connect((host, self.port))
                .await
                .map_err(|e| ProbeError::network("TCP Connection Error", e))?;
            connector
                .connect(server_name, stream)
                .await
                .map_err(|e| ProbeError::network("TLS Handshake Error", e))
        };
        let stream = tokio::time::timeout(self.timeout, handshake)
            .await
            .map_err(|_| ProbeError::Network(format!("TLS handshake timed out after {}ms", self.timeout.as_millis())))?
            .inspect_err(|e| error!(host, error = %e, "TLS probe failed"))?;

        let (_, connection) = stream.get_ref();
        let negotiated_protocol = connection.protocol_version().map(protocol_name);

        let der = connection
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| ProbeError::PartialData("server did not provide a certificate".to_string()))?;

        let (_, x509) = parse_x509_certificate(der.as_ref()).map_err(|e| {
            error!(error = %e, "Failed to parse X.509 certificate");
            ProbeError::PartialData(format!("X.509 Parse Error: {e}"))
        })?;

        info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");

        let validity = x509.validity();
        Ok(CertificateFacts {
            not_before: asn1_time_to_chrono_utc(&validity.not_before)?,
            not_after: asn1_time_to_chrono_utc(&validity.not_after)?,
            issuer_common_name: issuer_common_name(&x509),
            negotiated_protocol,
        })
    }
}

fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1".to_string(),
        other => format!("{other:?}"),
    }
}

fn issuer_common_name(x509: &X509Certificate<'_>) -> Option<String> {
    x509.issuer()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(String::from)
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> Result<DateTime<Utc>, ProbeError> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| ProbeError::PartialData(format!("certificate time out of range: {time}")))
}

/// Runs the TLS check against `domain`.
///
/// # Arguments
///
/// * `domain` - A bare host name, probed on port 443.
/// * `config` - Supplies the handshake deadline.
///
/// # Returns
///
/// A measured payload graded from the certificate and protocol. A failed
/// handshake or unreadable certificate is not an error: the caller gets the
/// fixed F result, tagged as a fallback.
pub async fn run_ssl_scan(domain: &str, config: &ScanConfig) -> Result<Outcome<TlsScanPayload>, ProbeError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ProbeError::Input("Domain"));
    }
    info!(domain, "Starting SSL/TLS scan.");

    let probe = InformationalTlsProbe::new(config.tls_timeout);
    Ok(grade_probe_result(domain, probe.inspect(domain).await, Utc::now()))
}

fn grade_probe_result(
    domain: &str,
    probed: Result<CertificateFacts, ProbeError>,
    now: DateTime<Utc>,
) -> Outcome<TlsScanPayload> {
    match probed {
        Ok(facts) => {
            let result = score_tls(facts.negotiated_protocol.as_deref(), facts.not_after, now);
            info!(score = result.score, grade = %result.grade, "SSL/TLS scan finished.");
            Outcome::Measured(TlsScanPayload {
                domain: domain.to_string(),
                grade: result.grade,
                score: result.score,
                max_score: MAX_SCORE,
                protocol: facts.negotiated_protocol,
                issuer: Some(facts.issuer_common_name.unwrap_or_else(|| "Unknown".to_string())),
                valid_to: Some(facts.not_after),
                valid_from: Some(facts.not_before),
                recommendations: result.recommendations,
                error: None,
                timestamp: now,
            })
        }
        Err(e) => {
            warn!(domain, error = %e, "SSL/TLS scan fell back to failure grade.");
            Outcome::Fallback {
                value: TlsScanPayload {
                    domain: domain.to_string(),
                    grade: Grade::F,
                    score: 0,
                    max_score: MAX_SCORE,
                    protocol: None,
                    issuer: None,
                    valid_to: None,
                    valid_from: None,
                    recommendations: vec![CHECK_HTTPS.to_string()],
                    error: Some(CONNECTION_FAILED.to_string()),
                    timestamp: now,
                },
                reason: e.to_string(),
            }
        }
    }
}

/// Findings for the TLS section of a report.
pub fn analyze_ssl_results(outcome: &Outcome<TlsScanPayload>) -> Vec<AnalysisFinding> {
    debug!("Analyzing SSL scan results.");
    if outcome.is_fallback() {
        return vec![AnalysisFinding::new(Severity::Critical, "SSL_HANDSHAKE_FAILED")];
    }

    outcome
        .value()
        .recommendations
        .iter()
        .filter_map(|recommendation| match recommendation.as_str() {
            EXPIRING_SOON => Some(AnalysisFinding::new(Severity::Warning, "SSL_EXPIRING_SOON")),
            UPGRADE_PROTOCOL => Some(AnalysisFinding::new(Severity::Critical, "SSL_OUTDATED_PROTOCOL")),
            _ => None,
        })
        .collect()
}
