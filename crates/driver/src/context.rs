//! State shared by the pipelines of one chain.

use std::sync::Arc;

use alloy_primitives::Address;
use config::ChainConfig;
use dashmap::DashMap;
use derive_more::Debug;
use store::Store;
use tracing::warn;

use crate::reader::ChainReader;

/// Process-wide cache of token decimals keyed by chain and address.
///
/// Decimals never change once a token is deployed, so concurrent fills of the same key are
/// harmless. Failed lookups are not cached and get retried on the next request.
#[derive(Debug, Clone, Default)]
pub struct DecimalsCache {
    inner: Arc<DashMap<(u64, Address), u8>>,
}

impl DecimalsCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decimals of `token`, read through `reader` on a miss. `None` if the read fails.
    pub async fn get(&self, chain_id: u64, token: Address, reader: &dyn ChainReader) -> Option<u8> {
        if let Some(decimals) = self.inner.get(&(chain_id, token)) {
            return Some(*decimals);
        }

        match reader.token_decimals(token).await {
            Ok(decimals) => {
                self.inner.insert((chain_id, token), decimals);
                Some(decimals)
            }
            Err(e) => {
                warn!(chain_id, %token, err = %e, "Failed to read token decimals");
                None
            }
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Chain, chain access and persistence handed to every pipeline of a chain.
#[derive(Debug, Clone)]
pub struct ChainContext {
    /// Static configuration of the chain
    pub config: &'static ChainConfig,
    /// Chain reads
    #[debug(skip)]
    pub reader: Arc<dyn ChainReader>,
    /// Persistence
    #[debug(skip)]
    pub store: Arc<dyn Store>,
    /// Shared decimals cache
    pub decimals: DecimalsCache,
}

impl ChainContext {
    /// Bundle the parts of a chain context.
    pub fn new(
        config: &'static ChainConfig,
        reader: Arc<dyn ChainReader>,
        store: Arc<dyn Store>,
        decimals: DecimalsCache,
    ) -> Self {
        Self { config, reader, store, decimals }
    }

    /// EVM chain id.
    pub const fn chain_id(&self) -> u64 {
        self.config.chain_id
    }
}
