//! Bounded calls to the payment gateway.

use std::future::Future;
use std::time::Duration;

use crate::ports::GatewayError;

/// Awaits `call`, failing with a timeout error once `limit` elapses.
///
/// Applied by the handlers on top of whatever timeout the adapter has, so a
/// transaction held across the call is always released in bounded time.
pub(super) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::timeout(limit.as_secs().max(1))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::GatewayErrorCode;

    #[tokio::test]
    async fn passes_through_fast_results() {
        let result = bounded(Duration::from_secs(1), async { Ok::<_, GatewayError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let result = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, GatewayError>(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::Timeout);
        assert!(err.retryable);
    }
}
