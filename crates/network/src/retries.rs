use std::time::Duration;

use alloy::transports::{
    RpcError, TransportError,
    layers::{RetryBackoffLayer, RetryPolicy},
};
use alloy_json_rpc::ErrorPayload;
use serde::Deserialize;
use tokio_retry::RetryIf;

/// Transport level retries per request.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Initial backoff of the transport retry layer in milliseconds.
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 200;

/// Compute units per second assumed for public endpoints.
const DEFAULT_COMPUTE_UNITS_PER_SECOND: u64 = 100;

/// The default [`RetryBackoffLayer`] for calls against public chain endpoints.
pub const DEFAULT_RETRY_LAYER: RetryBackoffLayer<PublicEndpointRetryPolicy> =
    RetryBackoffLayer::new_with_policy(
        DEFAULT_MAX_RETRIES,
        DEFAULT_INITIAL_BACKOFF_MS,
        DEFAULT_COMPUTE_UNITS_PER_SECOND,
        PublicEndpointRetryPolicy,
    );

/// Error bodies some public nodes return without a proper JSON-RPC envelope.
#[derive(Deserialize)]
struct BareErrorBody {
    error: ErrorPayload,
}

/// Messages of throttled public nodes that are not flagged as retryable by alloy.
const THROTTLE_MARKERS: [&str; 3] = ["limit exceeded", "too many requests", "connection refused"];

/// Retry policy for public endpoints.
///
/// Retries whatever alloy considers transient, plus refused connections and the throttling
/// messages public BSC and Polygon nodes send back.
#[derive(Debug, Clone, Copy)]
pub struct PublicEndpointRetryPolicy;

impl PublicEndpointRetryPolicy {
    fn is_transient(error: &TransportError) -> bool {
        match error {
            RpcError::Transport(kind) => kind.is_retry_err(),
            RpcError::ErrorResp(payload) => payload.is_retry_err(),
            RpcError::NullResp => true,
            RpcError::DeserError { text, .. } => serde_json::from_str::<ErrorPayload>(text)
                .map(|payload| payload.is_retry_err())
                .or_else(|_| {
                    serde_json::from_str::<BareErrorBody>(text).map(|b| b.error.is_retry_err())
                })
                .unwrap_or(false),
            _ => false,
        }
    }
}

impl RetryPolicy for PublicEndpointRetryPolicy {
    fn should_retry(&self, error: &TransportError) -> bool {
        Self::is_transient(error) || is_throttled(error)
    }

    fn backoff_hint(&self, error: &TransportError) -> Option<Duration> {
        let RpcError::ErrorResp(payload) = error else { return None };
        let data = payload.try_data_as::<serde_json::Value>()?.ok()?;
        // Requested backoff, as sent by Infura-style rate limiters.
        let seconds = &data["rate"]["backoff_seconds"];
        seconds
            .as_u64()
            .or_else(|| seconds.as_f64().map(|s| s as u64 + 1))
            .map(Duration::from_secs)
    }
}

/// Whether the error reads like a throttled or refused connection.
pub fn is_throttled<S: ToString>(e: S) -> bool {
    let msg = e.to_string().to_lowercase();
    THROTTLE_MARKERS.iter().any(|marker| msg.contains(marker))
}

/// Retry the provided async operation with a linearly growing delay.
///
/// The operation runs at most `attempts` times; the n-th retry waits `n * step`. Retries stop
/// early as soon as `condition` returns `false` for an error.
pub async fn retry_linear_if<F, Fut, T, E, C>(
    op: F,
    attempts: u32,
    step: Duration,
    condition: C,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    C: FnMut(&E) -> bool,
{
    let strategy = (1..attempts.max(1)).map(move |n| step * n);
    RetryIf::start(strategy, op, condition).await
}

/// Whether a contract call failed deterministically, so that retrying it is pointless.
pub fn is_revert<S: ToString>(e: S) -> bool {
    let msg = e.to_string().to_lowercase();
    msg.contains("execution reverted") || msg.contains("invalid address")
}
