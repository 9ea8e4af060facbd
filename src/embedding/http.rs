//! Blocking JSON-over-HTTP plumbing shared by the remote providers

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SearchError};

/// Build a client with the given timeout and optional bearer token.
pub(super) fn build_client(timeout_secs: u64, bearer: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = bearer {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            SearchError::InvalidConfiguration(format!("invalid API key format: {e}"))
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| SearchError::InvalidConfiguration(format!("failed to build HTTP client: {e}")))
}

/// POST `body` as JSON and decode the reply.
///
/// 429 maps to `RateLimited`, other failures to `ProviderUnavailable`, and an
/// undecodable body to `MalformedResponse`.
pub(super) fn post_json<B, R>(client: &Client, url: &str, body: &B) -> Result<R>
where
    B: Serialize,
    R: DeserializeOwned,
{
    let payload = serde_json::to_vec(body)?;
    debug!(url, bytes = payload.len(), "Sending embedding request");

    let response = client
        .post(url)
        .body(payload)
        .send()
        .map_err(|e| SearchError::ProviderUnavailable(format!("request to {url} failed: {e}")))?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        return Err(SearchError::RateLimited { retry_after_ms });
    }

    let text = response.text().map_err(|e| {
        SearchError::ProviderUnavailable(format!("failed to read response from {url}: {e}"))
    })?;

    if !status.is_success() {
        return Err(SearchError::ProviderUnavailable(format!(
            "{url} returned {status}: {}",
            snippet(&text)
        )));
    }

    serde_json::from_str(&text).map_err(|e| {
        SearchError::MalformedResponse(format!(
            "could not decode {}-byte body from {url}: {e}",
            text.len()
        ))
    })
}

fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.to_string()
    }
}
