// src/net.rs
//! Bounded external calls. Every outbound request in the crate goes through
//! the shared client built here, so timeout semantics are uniform: 4s connect,
//! 10s total deadline, failure surfaces as `None` for the caller's fallback.

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;

static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent("tilecast/0.1 (+github.com/tilecast/tilecast)")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(10))
        .build()
        .expect("reqwest client")
});

pub fn client() -> &'static reqwest::Client {
    &CLIENT
}

/// GET a URL and return the body as text. Non-2xx, timeout, and transport
/// errors all collapse to `None`.
pub async fn get_text(url: &str) -> Option<String> {
    let resp = CLIENT.get(url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.text().await.ok()
}

/// GET a URL and deserialize the JSON body.
pub async fn get_json<T: DeserializeOwned>(url: &str) -> Option<T> {
    let resp = CLIENT.get(url).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.json::<T>().await.ok()
}

/// Build a URL with query parameters, percent-encoding the values.
pub fn url_with_params(base: &str, params: &[(&str, &str)]) -> String {
    match reqwest::Url::parse_with_params(base, params) {
        Ok(u) => u.to_string(),
        Err(_) => base.to_string(),
    }
}

/// Hostname of a URL with any leading `www.` stripped; empty on parse failure.
pub fn short_host(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}
