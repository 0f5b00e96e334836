//! Wiring of the per-chain pipelines.

use std::{sync::Arc, time::Duration};

use chainio::http_provider;
use config::{Chain, IndexerOpts};
use derive_more::Debug;
use network::RpcEndpointPool;
use primitives::LockVersion;
use store::Store;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::{
    context::{ChainContext, DecimalsCache},
    listener::EventListener,
    pool_tvl::PoolTvl,
    reader::{ChainReader, RpcChainReader},
    recorder::FullScanRecorder,
    reset::DailyReset,
    task::Pipeline,
    valuation::ValuationEngine,
};

/// Starts and owns every indexing pipeline.
#[derive(Debug)]
pub struct Driver {
    opts: IndexerOpts,
    #[debug(skip)]
    store: Arc<dyn Store>,
    decimals: DecimalsCache,
}

impl Driver {
    /// Create a driver writing to `store`.
    pub fn new(opts: IndexerOpts, store: Arc<dyn Store>) -> Self {
        Self { opts, store, decimals: DecimalsCache::new() }
    }

    /// Chain reader over the configured endpoints of `chain`.
    ///
    /// Unparsable endpoints are skipped. A chain left without endpoints still gets a reader
    /// whose calls fail, so one misconfigured chain never blocks the others.
    pub fn rpc_reader(&self, chain: Chain) -> Arc<dyn ChainReader> {
        let config = chain.config();
        let providers: Vec<_> = config
            .rpcs
            .iter()
            .filter_map(|rpc| {
                Url::parse(rpc)
                    .inspect_err(|e| {
                        warn!(chain_id = config.chain_id, rpc, err = %e, "Skipping invalid RPC URL")
                    })
                    .ok()
            })
            .map(http_provider)
            .collect();
        if providers.is_empty() {
            warn!(chain_id = config.chain_id, "No usable RPC endpoints; chain calls will fail");
        }

        let timeout = Duration::from_secs(self.opts.rpc_call_timeout_secs);
        Arc::new(RpcChainReader::new(config, RpcEndpointPool::new(providers, timeout)))
    }

    /// Spawn every pipeline of every enabled chain plus the daily reset.
    pub fn spawn(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for &chain in &self.opts.chains {
            let ctx = ChainContext::new(
                chain.config(),
                self.rpc_reader(chain),
                self.store.clone(),
                self.decimals.clone(),
            );
            handles.extend(self.spawn_chain(ctx, cancel));
        }

        let chain_ids = self.opts.chains.iter().map(|chain| chain.chain_id()).collect();
        let reset =
            DailyReset::new(self.store.clone(), chain_ids, self.opts.reset_listener_checkpoints);
        handles.push(reset.spawn(cancel.clone()));
        handles
    }

    /// Spawn the pipelines of one chain.
    pub fn spawn_chain(
        &self,
        ctx: ChainContext,
        cancel: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        let config = ctx.config;
        let mut handles = Vec::new();

        for version in LockVersion::ALL {
            if config.lock_contract(version).is_none() {
                continue;
            }
            handles.push(EventListener::new(ctx.clone(), version).spawn(cancel.clone()));
            handles.push(FullScanRecorder::new(ctx.clone(), version).spawn(cancel.clone()));
            if config.router.is_some() {
                handles.push(ValuationEngine::new(ctx.clone(), version).spawn(cancel.clone()));
            }
        }

        if self.opts.enable_pool_tvl && config.pool_manager.is_some() && config.router.is_some() {
            handles.push(PoolTvl::new(ctx).spawn(cancel.clone()));
        }

        info!(
            chain_id = config.chain_id,
            chain = config.name,
            pipelines = handles.len(),
            "Chain pipelines started"
        );
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChainReader, TestChain};
    use store::MemoryStore;

    fn opts(enable_pool_tvl: bool) -> IndexerOpts {
        IndexerOpts {
            chains: vec![Chain::Bsc],
            rpc_call_timeout_secs: 5,
            enable_pool_tvl,
            reset_listener_checkpoints: false,
        }
    }

    fn expected_pipelines(chain: Chain, enable_pool_tvl: bool) -> usize {
        let config = chain.config();
        let per_version = if config.router.is_some() { 3 } else { 2 };
        let versions =
            LockVersion::ALL.iter().filter(|v| config.lock_contract(**v).is_some()).count();
        let pool = enable_pool_tvl && config.pool_manager.is_some() && config.router.is_some();
        versions * per_version + usize::from(pool)
    }

    #[tokio::test(start_paused = true)]
    async fn spawns_one_set_per_contract_and_stops_on_cancel() {
        for enable_pool_tvl in [false, true] {
            let chain = TestChain::new(FakeChainReader::default());
            let driver = Driver::new(opts(enable_pool_tvl), Arc::new(MemoryStore::new()));
            let cancel = CancellationToken::new();

            let handles = driver.spawn_chain(chain.ctx.clone(), &cancel);
            assert_eq!(handles.len(), expected_pipelines(Chain::Bsc, enable_pool_tvl));

            cancel.cancel();
            for handle in handles {
                handle.await.unwrap();
            }
        }
    }
}
