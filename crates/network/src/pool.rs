use std::{
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy::{primitives::Address, providers::Provider};
use tracing::warn;

use crate::{RpcPoolError, deadline::with_deadline};

/// Attempts made by [`RpcEndpointPool::latest_block_height`], each on the next endpoint.
pub const HEAD_ATTEMPTS: u32 = 3;

/// Cursor value before the first selection.
const UNSET: usize = usize::MAX;

/// How [`RpcEndpointPool::bind`] picks the endpoint for a contract handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shuffle {
    /// Advance the cursor and use the next endpoint
    Next,
    /// Stay on the endpoint the cursor currently points at
    Current,
}

/// Round-robin pool of clients, one per RPC endpoint of a chain.
///
/// The cursor starts unset. [`Self::next_client`] always advances first, so the first call
/// returns the first endpoint; [`Self::current_client`] pins an unset cursor to the first
/// endpoint without advancing. An empty pool is valid and fails lazily with
/// [`RpcPoolError::NoEndpoints`] on every request.
#[derive(Debug)]
pub struct RpcEndpointPool<C> {
    clients: Vec<C>,
    cursor: AtomicUsize,
    call_timeout: Duration,
}

impl<C: Clone> RpcEndpointPool<C> {
    /// Create a pool over `clients`. Every call made through [`Self::call`] is bounded by
    /// `call_timeout`.
    pub const fn new(clients: Vec<C>, call_timeout: Duration) -> Self {
        Self { clients, cursor: AtomicUsize::new(UNSET), call_timeout }
    }

    /// Number of endpoints in the pool.
    pub fn endpoint_count(&self) -> usize {
        self.clients.len()
    }

    /// Per-call deadline.
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Advance the cursor, wrapping at the end of the list, and return that client.
    pub fn next_client(&self) -> Result<C, RpcPoolError> {
        let len = self.clients.len();
        if len == 0 {
            return Err(RpcPoolError::NoEndpoints);
        }
        let advance = |i: usize| if i < len - 1 { i + 1 } else { 0 };
        let previous = match self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| {
            Some(advance(i))
        }) {
            Ok(i) | Err(i) => i,
        };
        Ok(self.clients[advance(previous)].clone())
    }

    /// Return the client under the cursor without advancing it.
    pub fn current_client(&self) -> Result<C, RpcPoolError> {
        let len = self.clients.len();
        if len == 0 {
            return Err(RpcPoolError::NoEndpoints);
        }
        let index = match self.cursor.fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| {
            (i == UNSET).then_some(0)
        }) {
            Ok(_) => 0,
            Err(i) => i,
        };
        Ok(self.clients[index % len].clone())
    }

    /// Bind a contract handle at `address` to an endpoint chosen by `shuffle`.
    pub fn bind<T>(
        &self,
        address: Address,
        shuffle: Shuffle,
        make: impl FnOnce(Address, C) -> T,
    ) -> Result<T, RpcPoolError> {
        let client = match shuffle {
            Shuffle::Next => self.next_client()?,
            Shuffle::Current => self.current_client()?,
        };
        Ok(make(address, client))
    }

    /// Await `fut` under the pool's per-call deadline.
    pub async fn call<F, T, E>(&self, fut: F) -> eyre::Result<T>
    where
        F: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        with_deadline(self.call_timeout, fut).await
    }
}

impl<C: Provider + Clone> RpcEndpointPool<C> {
    /// Query the chain head, rotating to the next endpoint on each of up to
    /// [`HEAD_ATTEMPTS`] attempts.
    pub async fn latest_block_height(&self) -> Result<u64, RpcPoolError> {
        let mut message = String::new();
        for attempt in 1..=HEAD_ATTEMPTS {
            let client = self.next_client()?;
            match self.call(client.get_block_number()).await {
                Ok(height) => return Ok(height),
                Err(e) => {
                    warn!(attempt, err = %e, "Failed to fetch chain head");
                    message = e.to_string();
                }
            }
        }
        Err(RpcPoolError::Exhausted { attempts: HEAD_ATTEMPTS, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::providers::RootProvider;

    fn pool(names: &[&'static str]) -> RpcEndpointPool<&'static str> {
        RpcEndpointPool::new(names.to_vec(), Duration::from_secs(1))
    }

    #[test]
    fn first_next_client_is_first_endpoint() {
        let pool = pool(&["a", "b", "c"]);
        assert_eq!(pool.next_client(), Ok("a"));
        assert_eq!(pool.next_client(), Ok("b"));
        assert_eq!(pool.next_client(), Ok("c"));
        assert_eq!(pool.next_client(), Ok("a"));
    }

    #[test]
    fn current_client_does_not_advance() {
        let pool = pool(&["a", "b", "c"]);
        assert_eq!(pool.current_client(), Ok("a"));
        assert_eq!(pool.current_client(), Ok("a"));
        // the pinned cursor sits on the first endpoint, so the next one is "b"
        assert_eq!(pool.next_client(), Ok("b"));
        assert_eq!(pool.current_client(), Ok("b"));
    }

    #[test]
    fn round_robin_visits_each_endpoint_once_per_cycle() {
        let names = ["a", "b", "c", "d", "e"];
        let pool = pool(&names);
        for _ in 0..3 {
            let cycle: Vec<_> = (0..names.len()).map(|_| pool.next_client().unwrap()).collect();
            assert_eq!(cycle, names);
        }
    }

    #[test]
    fn empty_pool_fails_lazily() {
        let pool = pool(&[]);
        assert_eq!(pool.endpoint_count(), 0);
        assert_eq!(pool.next_client(), Err(RpcPoolError::NoEndpoints));
        assert_eq!(pool.current_client(), Err(RpcPoolError::NoEndpoints));
        assert_eq!(
            pool.bind(Address::ZERO, Shuffle::Next, |a, c| (a, c)),
            Err(RpcPoolError::NoEndpoints)
        );
    }

    #[test]
    fn bind_respects_shuffle() {
        let pool = pool(&["a", "b"]);
        let first = pool.bind(Address::ZERO, Shuffle::Next, |_, c| c).unwrap();
        let same = pool.bind(Address::ZERO, Shuffle::Current, |_, c| c).unwrap();
        let other = pool.bind(Address::ZERO, Shuffle::Next, |_, c| c).unwrap();
        assert_eq!((first, same, other), ("a", "a", "b"));
    }

    fn provider(url: &str) -> RootProvider {
        RootProvider::new_http(url.parse().unwrap())
    }

    #[tokio::test]
    async fn head_query_rotates_past_dead_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x3e8"}"#)
            .create_async()
            .await;

        let dead = "http://127.0.0.1:1";
        let pool = RpcEndpointPool::new(
            vec![provider(dead), provider(dead), provider(&server.url())],
            Duration::from_secs(5),
        );
        assert_eq!(pool.latest_block_height().await, Ok(1000));
    }

    #[tokio::test]
    async fn head_query_gives_up_after_three_attempts() {
        let dead = "http://127.0.0.1:1";
        let pool = RpcEndpointPool::new(
            vec![provider(dead), provider(dead), provider(dead), provider(dead)],
            Duration::from_secs(5),
        );
        let err = pool.latest_block_height().await.unwrap_err();
        assert!(matches!(err, RpcPoolError::Exhausted { attempts: 3, .. }));
        // the fourth endpoint was never tried
        assert!(matches!(pool.current_client(), Ok(_)));
    }
}
