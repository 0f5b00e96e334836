use std::time::Duration;

use derive_more::{Display, Error};

/// Errors surfaced by an [`RpcEndpointPool`](crate::RpcEndpointPool).
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum RpcPoolError {
    /// The chain was configured without any endpoint.
    #[display("no rpc endpoints configured")]
    NoEndpoints,
    /// A call did not complete within its deadline.
    #[display("rpc call timed out after {after:?}")]
    Timeout {
        /// Deadline that elapsed
        after: Duration,
    },
    /// Every attempt of a retried call failed.
    #[display("rpc call failed after {attempts} attempts: {message}")]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error observed
        message: String,
    },
}
