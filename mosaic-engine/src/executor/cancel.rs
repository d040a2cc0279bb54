//! Cancellation-aware futures.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Returned when a future lost the race against its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Race any future against a `CancellationToken`.
#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// `Ok(output)` when the future completes first, `Err(Cancelled)` when
    /// the token fires first.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Cancelled>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, Cancelled> {
        tokio::select! {
            _ = token.cancelled() => Err(Cancelled),
            result = self => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn completes_when_token_is_quiet() {
        let token = CancellationToken::new();
        assert_eq!(async { 7 }.or_cancel(&token).await, Ok(7));
    }

    #[tokio::test]
    async fn cancels_when_token_fires_first() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(5)).await;
            child.cancel();
        });
        let result = async {
            sleep(Duration::from_secs(5)).await;
            7
        }
        .or_cancel(&token)
        .await;
        assert_eq!(result, Err(Cancelled));
    }
}
