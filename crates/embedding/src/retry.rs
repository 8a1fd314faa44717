use std::future::Future;
use std::time::Duration;
use theory_explorer_common::{Result, TheoryExplorerError};
use tracing::warn;

/// Run `op` up to `max_attempts` times with exponential backoff.
///
/// Only `Network` errors are retried. Anything else returns immediately,
/// and exhausting the attempts turns the last failure into an `Embedding` error.
pub(crate) async fn with_retry<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e @ TheoryExplorerError::Network(_)) => {
                if attempt < max_attempts {
                    let delay = base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        "{} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        label, attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    let reason = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no attempts made".to_string());
    Err(TheoryExplorerError::embedding(format!(
        "{} failed after {} attempts: {}",
        label, max_attempts, reason
    )))
}
