//! Response handling shared by the clients.

use cornerstone_core::{Error, Result};
use serde::de::DeserializeOwned;

/// Longest upstream error body quoted in an error message.
const MAX_ERROR_BODY: usize = 200;

pub(crate) const USER_AGENT: &str = concat!("cornerstone-console/", env!("CARGO_PKG_VERSION"));

/// Map a transport failure.
pub(crate) fn send_error(service: &'static str, err: reqwest::Error) -> Error {
    Error::upstream(service, None, format!("request failed: {err}"))
}

/// Turn a non-success response into an upstream error carrying its status.
pub(crate) async fn error_for_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        truncate(body.trim(), MAX_ERROR_BODY)
    };
    Err(Error::upstream(service, Some(status.as_u16()), message))
}

/// Parse a JSON response body.
pub(crate) async fn json_body<T: DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::upstream(service, None, format!("invalid response body: {e}")))
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééé", 2), "éé...");
    }
}
