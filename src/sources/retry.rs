//! Shared bounded retry with backoff
//!
//! One helper used by every adapter that wants to retry network I/O, so
//! retry behavior stays uniform instead of ad hoc per adapter. Only
//! transient errors are retried; status and parse errors fail immediately.

use super::FetchError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Run `op` up to `max_attempts` times, sleeping `base_delay * attempt`
/// between attempts. Non-transient errors short-circuit.
pub async fn with_backoff<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    debug_assert!(max_attempts >= 1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = base_delay * attempt;
                debug!(attempt, ?delay, error = %e, "transient fetch error, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
