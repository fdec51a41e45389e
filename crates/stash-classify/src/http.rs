//! Shared HTTP helpers for classifier backends.
//!
//! Centralizes status-code checks (429 rate limiting with `Retry-After`
//! parsing, non-success → [`ClassifyError::Api`]) and body decoding (empty →
//! [`ClassifyError::EmptyResponse`], unparseable → [`ClassifyError::Malformed`])
//! so each backend stays focused on request construction.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ClassifyError;

/// Build the HTTP client shared by a backend.
///
/// # Panics
///
/// Panics if the underlying `reqwest::Client` fails to build.
pub fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("stash/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("reqwest client should build")
}

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`ClassifyError::RateLimited`] with
///   `Retry-After` header parsing (falls back to 60 s if absent or
///   unparseable).
/// - **Non-success status** → [`ClassifyError::Api`] with status code and
///   response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ClassifyError> {
    if resp.status() == 429 {
        let retry_after = parse_retry_after(&resp);
        return Err(ClassifyError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    if !resp.status().is_success() {
        return Err(ClassifyError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

/// Decode a JSON body, telling "nothing came back" apart from "garbage came back".
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ClassifyError> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Err(ClassifyError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|e| ClassifyError::Malformed(e.to_string()))
}

/// Read a checked response to its end and decode it.
pub async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClassifyError> {
    let resp = check_response(resp).await?;
    let body = resp.text().await?;
    decode_body(&body)
}
