// src/core/scanner/headers_scanner.rs

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};

use crate::config::ScanConfig;
use crate::core::error::ProbeError;
use crate::core::models::{AnalysisFinding, Grade, HeaderScanPayload, Outcome, Severity};
use crate::core::scoring::MAX_SCORE;
use crate::core::scoring::headers::{HeaderCatalog, HeaderSet, RECOMMENDATION_WEIGHT, score_headers};
use crate::core::target::normalize;
use crate::core::knowledge_base;

/// Status and headers of the response that answered the probe.
#[derive(Debug, Clone)]
pub struct FetchedHeaders {
    pub status: u16,
    pub headers: HeaderSet,
}

/// One bounded HTTP exchange per call: HEAD, then a single GET only when the
/// server refuses HEAD with 405 or 501. Both requests share one deadline.
pub struct HeaderFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HeaderFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build HTTP client for headers scan.");
                ProbeError::network("Failed to build HTTP client", e)
            })?;
        Ok(Self { client, timeout })
    }

    /// Fetches the response headers of `url`.
    ///
    /// # Arguments
    ///
    /// * `url` - An absolute `http` or `https` URL.
    ///
    /// # Returns
    ///
    /// The status and headers of the answering response, or
    /// `ProbeError::Network` when no 2xx response arrives before the deadline.
    pub async fn fetch(&self, url: &str) -> Result<FetchedHeaders, ProbeError> {
        match tokio::time::timeout(self.timeout, self.exchange(url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(url, timeout_ms = self.timeout.as_millis() as u64, "Headers scan hit its deadline.");
                Err(ProbeError::Network(format!(
                    "HTTP request failed: no response within {} ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    async fn exchange(&self, url: &str) -> Result<FetchedHeaders, ProbeError> {
        debug!(url, "Sending HEAD request.");
        let head = self.client.head(url).send().await.map_err(|e| request_failed(url, e))?;
        let response = if needs_get_fallback(head.status()) {
            debug!(status = %head.status(), "HEAD refused, retrying with GET.");
            self.client.get(url).send().await.map_err(|e| request_failed(url, e))?
        } else {
            head
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "Unexpected status for headers scan.");
            return Err(ProbeError::Network(format!("Request failed with status code {}", status.as_u16())));
        }

        let headers = HeaderSet::from(response.headers());
        info!(%status, header_count = headers.len(), "Received HTTP response for headers scan.");
        Ok(FetchedHeaders { status: status.as_u16(), headers })
    }
}

fn request_failed(url: &str, e: reqwest::Error) -> ProbeError {
    error!(url, error = %e, "HTTP request failed for headers scan.");
    ProbeError::network("HTTP request failed", e)
}

fn needs_get_fallback(status: StatusCode) -> bool {
    matches!(status, StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED)
}

/// Score substituted when the probe cannot produce a response.
const FALLBACK_SCORE: u32 = 5;
const FALLBACK_GRADE: Grade = Grade::C;

/// Runs the header check for a user-supplied URL or domain.
///
/// # Arguments
///
/// * `input` - A URL or bare domain. Bare domains are probed over `https`.
/// * `config` - Supplies the header catalog, the deadline and the user agent.
///
/// # Returns
///
/// A measured payload, or a fallback with a fixed C grade when the target
/// cannot be fetched. Only a blank input is an error.
pub async fn run_headers_scan(input: &str, config: &ScanConfig) -> Result<Outcome<HeaderScanPayload>, ProbeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ProbeError::Input("URL"));
    }
    let url = normalize(input);
    info!(url = %url, "Starting headers scan.");
    debug!(
        rules = config.catalog.rules().len(),
        total_weight = config.catalog.total_weight(),
        "Header catalog selected."
    );

    let fetched = match HeaderFetcher::new(config.header_timeout, &config.user_agent) {
        Ok(fetcher) => fetcher.fetch(&url).await,
        Err(e) => Err(e),
    };

    let outcome = match fetched {
        Ok(fetched) => {
            let result = score_headers(&config.catalog, &fetched.headers);
            info!(score = result.score, grade = %result.grade, "Headers scan finished.");
            Outcome::Measured(HeaderScanPayload {
                url,
                status: Some(fetched.status),
                score: result.score,
                max_score: MAX_SCORE,
                grade: result.grade,
                found: result.found,
                missing: result.missing,
                recommendations: result.recommendations,
                headers: Some(fetched.headers.into_map()),
                timestamp: Utc::now(),
            })
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Headers scan fell back to default score.");
            Outcome::Fallback {
                value: HeaderScanPayload {
                    url,
                    status: None,
                    score: FALLBACK_SCORE,
                    max_score: MAX_SCORE,
                    grade: FALLBACK_GRADE,
                    found: Vec::new(),
                    missing: Vec::new(),
                    recommendations: Vec::new(),
                    headers: None,
                    timestamp: Utc::now(),
                },
                reason: e.to_string(),
            }
        }
    };
    Ok(outcome)
}

/// Findings for the header section of a report.
pub fn analyze_headers_results(outcome: &Outcome<HeaderScanPayload>, catalog: &HeaderCatalog) -> Vec<AnalysisFinding> {
    debug!("Analyzing collected header data.");
    if outcome.is_fallback() {
        return vec![AnalysisFinding::new(Severity::Critical, "HEADERS_REQUEST_FAILED")];
    }

    outcome
        .value()
        .missing
        .iter()
        .map(|name| {
            let severity = match catalog.weight_of(name) {
                Some(weight) if weight >= RECOMMENDATION_WEIGHT => Severity::Warning,
                _ => Severity::Info,
            };
            AnalysisFinding::new(severity, knowledge_base::header_finding_code(name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves canned responses: `head` for HEAD requests, `get` for anything else.
    async fn serve(head: &'static str, get: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let reply = if buf.starts_with(b"HEAD") { head } else { get };
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}/")
    }

    const HARDENED: &str = "HTTP/1.1 200 OK\r\n\
        Content-Security-Policy: default-src 'self'\r\n\
        strict-transport-security: max-age=63072000\r\n\
        X-Frame-Options: DENY\r\n\
        Content-Length: 0\r\n\
        Connection: close\r\n\r\n";

    const NOT_ALLOWED: &str = "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    fn config() -> ScanConfig {
        ScanConfig { header_timeout: Duration::from_secs(2), ..ScanConfig::default() }
    }

    #[tokio::test]
    async fn scores_headers_from_a_live_response() {
        let url = serve(HARDENED, NOT_FOUND).await;
        let outcome = run_headers_scan(&url, &config()).await.unwrap();
        let Outcome::Measured(payload) = outcome else { panic!("expected a measurement") };
        assert_eq!(payload.url, url);
        assert_eq!(payload.status, Some(200));
        assert_eq!(payload.score, 7);
        assert_eq!(payload.grade, Grade::B);
        assert_eq!(payload.max_score, 10);
        assert_eq!(payload.found[1].value, "max-age=63072000");
        assert!(payload.recommendations.is_empty());

        let raw = payload.headers.as_ref().unwrap();
        assert_eq!(raw.get("x-frame-options").map(String::as_str), Some("DENY"));
        assert_eq!(raw.get("connection").map(String::as_str), Some("close"));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["headers"]["content-security-policy"], "default-src 'self'");
    }

    #[tokio::test]
    async fn refused_head_falls_back_to_get() {
        let url = serve(NOT_ALLOWED, HARDENED).await;
        let fetcher = HeaderFetcher::new(Duration::from_secs(2), "test-agent").unwrap();
        let fetched = fetcher.fetch(&url).await.unwrap();
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.headers.get("x-frame-options"), Some("DENY"));
    }

    #[tokio::test]
    async fn error_status_is_a_network_failure() {
        let url = serve(NOT_FOUND, NOT_FOUND).await;
        let fetcher = HeaderFetcher::new(Duration::from_secs(2), "test-agent").unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err, ProbeError::Network("Request failed with status code 404".into()));
    }

    #[tokio::test]
    async fn unreachable_target_yields_the_fixed_fallback() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let outcome = run_headers_scan(&format!("http://127.0.0.1:{port}"), &config()).await.unwrap();
        assert!(outcome.is_fallback());
        assert!(outcome.reason().unwrap().starts_with("HTTP request failed"));
        let payload = outcome.value();
        assert_eq!(payload.score, 5);
        assert_eq!(payload.grade, Grade::C);
        assert_eq!(payload.status, None);
        assert_eq!(payload.headers, None);

        let findings = analyze_headers_results(&outcome, &HeaderCatalog::extended());
        assert_eq!(findings, vec![AnalysisFinding::new(Severity::Critical, "HEADERS_REQUEST_FAILED")]);
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        assert_eq!(run_headers_scan("   ", &config()).await, Err(ProbeError::Input("URL")));
    }

    #[tokio::test]
    async fn missing_headers_become_weighted_findings() {
        let url = serve(HARDENED, NOT_FOUND).await;
        let catalog = HeaderCatalog::extended();
        let outcome = run_headers_scan(&url, &config()).await.unwrap();
        let findings = analyze_headers_results(&outcome, &catalog);
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.severity == Severity::Info));
        assert!(findings.iter().any(|f| f.code == "HEADERS_PERMISSIONS_POLICY_MISSING"));
    }

    /// Accepts connections and holds them open without ever answering.
    async fn silent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn silent_server_is_bounded_by_one_deadline() {
        let url = silent().await;
        let timeout = Duration::from_millis(300);
        let fetcher = HeaderFetcher::new(timeout, "test-agent").unwrap();

        let started = std::time::Instant::now();
        let err = fetcher.fetch(&url).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(elapsed < timeout + Duration::from_millis(250), "took {elapsed:?}");
        let ProbeError::Network(message) = err else { panic!("expected a network error") };
        assert!(message.starts_with("HTTP request failed"), "{message}");
    }

    #[tokio::test]
    async fn full_scan_of_a_silent_server_falls_back_within_the_deadline() {
        let url = silent().await;
        let config = ScanConfig { header_timeout: Duration::from_millis(300), ..ScanConfig::default() };

        let started = std::time::Instant::now();
        let outcome = run_headers_scan(&url, &config).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(550));
        assert!(outcome.is_fallback());
        assert_eq!(outcome.value().grade, Grade::C);
    }
}
