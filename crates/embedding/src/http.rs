use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use theory_explorer_common::{Result, TheoryExplorerError};

/// Build an HTTP client with a per-request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TheoryExplorerError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Send a prepared JSON request and decode a JSON response.
///
/// Transport failures, timeouts, 429 and 5xx come back as `Network` (retryable);
/// other statuses and undecodable bodies come back as `Embedding`.
/// Request URLs are stripped from error text.
pub(crate) async fn send_json<Resp>(request: RequestBuilder) -> Result<Resp>
where
    Resp: DeserializeOwned,
{
    let response = request.send().await.map_err(|e| {
        let timed_out = e.is_timeout();
        let e = e.without_url();
        if timed_out {
            TheoryExplorerError::network(format!("Embedding request timed out: {}", e))
        } else {
            TheoryExplorerError::network(format!("Failed to send embedding request: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(classify_status(status, &detail));
    }

    response.json::<Resp>().await.map_err(|e| {
        TheoryExplorerError::embedding(format!(
            "Failed to parse embedding response: {}",
            e.without_url()
        ))
    })
}

pub(crate) fn classify_status(status: StatusCode, detail: &str) -> TheoryExplorerError {
    let msg = format!("Embedding API returned {}: {}", status, detail.trim());
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        TheoryExplorerError::network(msg)
    } else {
        TheoryExplorerError::embedding(msg)
    }
}
