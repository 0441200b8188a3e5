// src/core/whois.rs

use chrono::Utc;

use crate::core::error::ProbeError;
use crate::core::models::{WhoisPayload, WhoisService};

const PRIVACY_NOTE: &str = "Some domains have WHOIS privacy protection enabled";

/// External WHOIS services for `domain`, in display order.
pub fn whois_services(domain: &str) -> Vec<WhoisService> {
    let service = |name: &str, url: String, description: &str| WhoisService {
        name: name.to_string(),
        url,
        description: description.to_string(),
    };

    vec![
        service("Whois.com", format!("https://www.whois.com/whois/{domain}"), "Detailed WHOIS information"),
        service("Who.is", format!("https://who.is/whois/{domain}"), "Free WHOIS lookup"),
        service("ICANN Lookup", "https://lookup.icann.org/lookup".to_string(), "Official ICANN WHOIS"),
        service(
            "Namecheap WHOIS",
            format!("https://www.namecheap.com/domains/whoislookup/?domain={domain}"),
            "Domain registration details",
        ),
    ]
}

/// Builds the WHOIS section of a report. No network traffic is involved.
///
/// # Returns
///
/// The lookup links and a privacy note, or `ProbeError::Input` for a blank
/// domain.
pub fn run_whois_links(domain: &str) -> Result<WhoisPayload, ProbeError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ProbeError::Input("Domain"));
    }
    Ok(WhoisPayload {
        domain: domain.to_string(),
        services: whois_services(domain),
        privacy_note: PRIVACY_NOTE.to_string(),
        timestamp: Utc::now(),
    })
}
