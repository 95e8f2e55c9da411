use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::errors::ApiError;

/// Races `fut` against `token`. A fired token wins and `fut` is dropped, which
/// aborts the in-flight call and rolls back any open sqlx transaction it held.
pub async fn run_cancellable<T, F>(
    token: &CancellationToken,
    what: &str,
    fut: F,
) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    if token.is_cancelled() {
        return Err(ApiError::cancelled(format!("{} cancelled", what)));
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::cancelled(format!("{} cancelled", what))),
        result = fut => result,
    }
}

/// Like [`run_cancellable`], but also fires `token` once `deadline` elapses.
pub async fn with_deadline<T, F>(
    token: &CancellationToken,
    deadline: Duration,
    what: &str,
    fut: F,
) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(deadline, run_cancellable(token, what, fut)).await {
        Ok(result) => result,
        Err(_) => {
            token.cancel();
            Err(ApiError::cancelled(format!(
                "{} exceeded the {}s deadline",
                what,
                deadline.as_secs()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorCode;

    #[tokio::test]
    async fn completed_future_passes_through() {
        let token = CancellationToken::new();
        let value = run_cancellable(&token, "embed", async { Ok::<_, ApiError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn fired_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();

        let err = run_cancellable(&token, "embed", std::future::pending::<Result<(), ApiError>>())
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Cancelled);
        assert_eq!(err.to_string(), "embed cancelled");
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_call() {
        let token = CancellationToken::new();
        let child = token.child_token();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = run_cancellable(&child, "refine", async {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok::<(), ApiError>(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Cancelled);
    }

    #[tokio::test]
    async fn deadline_fires_the_token() {
        let token = CancellationToken::new();
        let err = with_deadline(
            &token,
            Duration::from_millis(10),
            "inquiry",
            std::future::pending::<Result<(), ApiError>>(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Cancelled);
        assert!(token.is_cancelled());
    }
}
