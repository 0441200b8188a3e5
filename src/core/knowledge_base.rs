//! Static, read-only database of every finding the analyzers can emit,
//! with human-readable explanations and remediation steps.

use std::fmt;

/// High-level categories used to group findings in the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    Dns,
    Ssl,
    Http,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Dns => write!(f, "DNS Configuration"),
            FindingCategory::Ssl => write!(f, "SSL/TLS Certificate"),
            FindingCategory::Http => write!(f, "HTTP Security Headers"),
        }
    }
}

/// Everything needed to present a finding to a user.
pub struct FindingDetail {
    /// Machine-readable identifier, e.g. "HEADERS_CSP_MISSING".
    pub code: &'static str,
    pub title: &'static str,
    pub category: FindingCategory,
    pub description: &'static str,
    pub remediation: &'static str,
}

/// Finding code for a header missing from the scored catalog.
///
/// Names outside the built-in catalogs share the generic custom code.
pub fn header_finding_code(name: &str) -> &'static str {
    match name.to_ascii_lowercase().as_str() {
        "content-security-policy" => "HEADERS_CSP_MISSING",
        "strict-transport-security" => "HEADERS_HSTS_MISSING",
        "x-frame-options" => "HEADERS_X_FRAME_OPTIONS_MISSING",
        "x-content-type-options" => "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING",
        "x-xss-protection" => "HEADERS_X_XSS_PROTECTION_MISSING",
        "referrer-policy" => "HEADERS_REFERRER_POLICY_MISSING",
        "permissions-policy" => "HEADERS_PERMISSIONS_POLICY_MISSING",
        _ => "HEADERS_CUSTOM_MISSING",
    }
}

static FINDINGS: &[FindingDetail] = &[
    // --- DNS ---
    FindingDetail {
        code: "DNS_LOOKUP_FAILED",
        title: "DNS Lookup Failed",
        category: FindingCategory::Dns,
        description: "At least one record type could not be resolved, neither through the configured upstream resolver nor through the system resolver. The domain may be misspelled, the record may not exist, or its authoritative servers may be unreachable.",
        remediation: "Check the domain spelling and confirm the records exist at your DNS provider. A record type that is intentionally absent (for example AAAA on an IPv4-only host) can be ignored."
    },

    // --- SSL/TLS ---
    FindingDetail {
        code: "SSL_HANDSHAKE_FAILED",
        title: "TLS Handshake Failed",
        category: FindingCategory::Ssl,
        description: "No TLS 1.2 or newer session could be established on port 443, or the server presented no readable certificate. Visitors either cannot reach the site over HTTPS or are negotiating a protocol too old to be considered safe.",
        remediation: "Make sure the host serves HTTPS on port 443 with a valid certificate chain, and that TLS 1.2 and TLS 1.3 are enabled."
    },
    FindingDetail {
        code: "SSL_EXPIRING_SOON",
        title: "SSL Certificate Expiring Soon",
        category: FindingCategory::Ssl,
        description: "The certificate expires in less than 30 days. Once it lapses, browsers will show a full-page security warning and most visitors will leave.",
        remediation: "Renew the certificate now. Automating renewal with an ACME client such as certbot removes this class of outage entirely."
    },
    FindingDetail {
        code: "SSL_OUTDATED_PROTOCOL",
        title: "Outdated TLS Protocol",
        category: FindingCategory::Ssl,
        description: "The server negotiated TLS 1.0 or 1.1. Both versions are deprecated and carry known weaknesses in their cipher constructions.",
        remediation: "Disable TLS 1.0 and 1.1 in the server configuration and offer only TLS 1.2 and TLS 1.3."
    },

    // --- HTTP Headers ---
    FindingDetail {
        code: "HEADERS_REQUEST_FAILED",
        title: "HTTP Request Failed",
        category: FindingCategory::Http,
        description: "The target did not answer the HTTP probe with a successful response, so its security headers could not be inspected. The reported header grade is a placeholder.",
        remediation: "Verify that the site is online and reachable over HTTPS, and that it does not block automated HEAD or GET requests."
    },
    FindingDetail {
        code: "HEADERS_CSP_MISSING",
        title: "CSP Header Missing",
        category: FindingCategory::Http,
        description: "Content-Security-Policy restricts which sources may load scripts, styles and other resources. Without it, an injected script runs with the full privileges of the page.",
        remediation: "Start with a report-only policy such as `Content-Security-Policy-Report-Only: default-src 'self'`, review the violations, then enforce it."
    },
    FindingDetail {
        code: "HEADERS_HSTS_MISSING",
        title: "HSTS Header Missing",
        category: FindingCategory::Http,
        description: "Strict-Transport-Security tells browsers to use HTTPS only. Without it, the first plain-HTTP request can be intercepted and downgraded.",
        remediation: "Send `Strict-Transport-Security: max-age=31536000; includeSubDomains` on every HTTPS response."
    },
    FindingDetail {
        code: "HEADERS_X_FRAME_OPTIONS_MISSING",
        title: "X-Frame-Options Missing",
        category: FindingCategory::Http,
        description: "Without X-Frame-Options (or a CSP frame-ancestors directive), other sites can embed your pages in a frame and trick users into clicking hidden controls.",
        remediation: "Send `X-Frame-Options: DENY`, or `SAMEORIGIN` if the site frames its own pages."
    },
    FindingDetail {
        code: "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING",
        title: "X-Content-Type-Options Missing",
        category: FindingCategory::Http,
        description: "Browsers may guess a response's content type. A user upload served as text could then be executed as script.",
        remediation: "Send `X-Content-Type-Options: nosniff` on every response."
    },
    FindingDetail {
        code: "HEADERS_X_XSS_PROTECTION_MISSING",
        title: "X-XSS-Protection Missing",
        category: FindingCategory::Http,
        description: "X-XSS-Protection controlled the reflected-XSS filter of older browsers. Modern browsers ignore it, but legacy clients still benefit.",
        remediation: "Send `X-XSS-Protection: 0` if you rely on a Content-Security-Policy, or `1; mode=block` for legacy clients."
    },
    FindingDetail {
        code: "HEADERS_REFERRER_POLICY_MISSING",
        title: "Referrer-Policy Missing",
        category: FindingCategory::Http,
        description: "Without a Referrer-Policy, full URLs including paths and query strings may leak to third-party sites through the Referer header.",
        remediation: "Send `Referrer-Policy: strict-origin-when-cross-origin` or a stricter value."
    },
    FindingDetail {
        code: "HEADERS_PERMISSIONS_POLICY_MISSING",
        title: "Permissions-Policy Missing",
        category: FindingCategory::Http,
        description: "Permissions-Policy limits which powerful browser features (camera, geolocation, payment) the page and its embedded frames may use.",
        remediation: "Send a policy that disables unused features, e.g. `Permissions-Policy: camera=(), geolocation=(), microphone=()`."
    },
    FindingDetail {
        code: "HEADERS_CUSTOM_MISSING",
        title: "Catalog Header Missing",
        category: FindingCategory::Http,
        description: "A header required by the configured catalog was not present in the response.",
        remediation: "Review why the catalog requires this header and add it to the server or proxy configuration."
    },
];

/// Looks up the full detail for a finding code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::headers::HeaderCatalog;

    #[test]
    fn every_catalog_header_has_a_dedicated_entry() {
        for rule in HeaderCatalog::extended().rules() {
            let code = header_finding_code(&rule.name);
            assert_ne!(code, "HEADERS_CUSTOM_MISSING", "{}", rule.name);
            let detail = get_finding_detail(code).unwrap();
            assert_eq!(detail.category, FindingCategory::Http);
        }
    }

    #[test]
    fn analyzer_codes_resolve() {
        for code in [
            "DNS_LOOKUP_FAILED",
            "SSL_HANDSHAKE_FAILED",
            "SSL_EXPIRING_SOON",
            "SSL_OUTDATED_PROTOCOL",
            "HEADERS_REQUEST_FAILED",
            "HEADERS_CUSTOM_MISSING",
        ] {
            assert!(get_finding_detail(code).is_some(), "{code}");
        }
        assert!(get_finding_detail("DNS_DMARC_MISSING").is_none());
    }

    #[test]
    fn header_codes_ignore_case() {
        assert_eq!(header_finding_code("Strict-Transport-Security"), "HEADERS_HSTS_MISSING");
        assert_eq!(header_finding_code("x-custom-check"), "HEADERS_CUSTOM_MISSING");
        assert_eq!(FindingCategory::Ssl.to_string(), "SSL/TLS Certificate");
    }
}
