use std::{future::Future, time::Duration};

use crate::RpcPoolError;

/// Run `fut` under a deadline.
///
/// Errors of the future are converted into an [`eyre::Report`]; an elapsed deadline becomes
/// [`RpcPoolError::Timeout`].
pub async fn with_deadline<F, T, E>(deadline: Duration, fut: F) -> eyre::Result<T>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(RpcPoolError::Timeout { after: deadline }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, std::io::Error>(1)
        };
        let err = with_deadline(Duration::from_secs(30), slow).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RpcPoolError>(),
            Some(&RpcPoolError::Timeout { after: Duration::from_secs(30) })
        );
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let failing = async { Err::<u8, _>(std::io::Error::other("boom")) };
        let err = with_deadline(Duration::from_secs(1), failing).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");

        let ok = async { Ok::<_, std::io::Error>(7) };
        assert_eq!(with_deadline(Duration::from_secs(1), ok).await.unwrap(), 7);
    }
}
