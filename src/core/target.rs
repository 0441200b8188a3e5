// src/core/target.rs

use url::Url;

/// Prepends `https://` unless the input already starts with `http`.
///
/// Nothing else is checked: a malformed input goes through unchanged and
/// fails later in the network call that uses it.
pub fn normalize(input: &str) -> String {
    if input.starts_with("http") {
        input.to_string()
    } else {
        format!("https://{input}")
    }
}

/// Host part of a user-supplied target, for the TLS and DNS checks.
///
/// Falls back to the trimmed input when it does not parse as a URL.
pub fn host_of(input: &str) -> String {
    let trimmed = input.trim();
    Url::parse(&normalize(trimmed))
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or_else(|| trimmed.to_string())
}
