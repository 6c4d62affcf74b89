use std::future::Future;
use std::time::Duration;

use crate::core::errors::ApiError;

/// Runs `op` under `timeout`, retrying exactly once when the first attempt
/// fails with a transient error.
pub async fn with_single_retry<T, F, Fut>(
    label: &str,
    timeout: Duration,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    match attempt(label, timeout, op()).await {
        Err(err) if err.is_transient() => {
            tracing::warn!("{} failed ({}); retrying once", label, err);
            attempt(label, timeout, op()).await
        }
        other => other,
    }
}

async fn attempt<T, Fut>(label: &str, timeout: Duration, fut: Fut) -> Result<T, ApiError>
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        ApiError::Timeout(format!("{} exceeded {:?}", label, timeout))
    })?
}
