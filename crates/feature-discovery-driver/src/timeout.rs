//! Bounded driver operations.

use std::future::Future;
use std::time::Duration;

use feature_discovery_core::{DriverError, DriverResult};

/// Run a driver future, failing with [`DriverError::Timeout`] if it does not
/// complete within `timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, operation: &str, future: F) -> DriverResult<T>
where
    F: Future<Output = DriverResult<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!("{} exceeded {}ms", operation, timeout.as_millis());
            Err(DriverError::Timeout {
                operation: operation.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}
