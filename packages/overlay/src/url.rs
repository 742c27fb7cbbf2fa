//! Link URL sanitization.
//!
//! Committed link targets always pass through here: known-safe schemes go
//! through untouched, scheme-less input is normalized onto https, and
//! anything else (including `javascript:`) degrades to `about:blank`.

use url::Url;

const SUPPORTED_SCHEMES: [&str; 5] = ["http", "https", "mailto", "sms", "tel"];

/// Neutral target used when input cannot be made safe
pub const BLANK_URL: &str = "about:blank";

pub fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return BLANK_URL.to_string();
    }

    match Url::parse(trimmed) {
        Ok(parsed) if SUPPORTED_SCHEMES.contains(&parsed.scheme()) => parsed.to_string(),
        Ok(_) => BLANK_URL.to_string(),
        // Scheme-less input like "example.org" is treated as an https URL
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match Url::parse(&format!("https://{}", trimmed)) {
                Ok(parsed) => parsed.to_string(),
                Err(_) => BLANK_URL.to_string(),
            }
        }
        Err(_) => BLANK_URL.to_string(),
    }
}
