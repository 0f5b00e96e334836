//! Read access to one chain's locking, AMM and presale contracts.

use alloy::providers::Provider;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use chainio::{
    DefaultProvider, Erc20, PinkLock, PoolManager, PresalePool, UniswapFactory, UniswapPair,
    UniswapRouter,
    pinklock::{decode_lock_removed, decode_lock_vested},
};
use config::ChainConfig;
use derive_more::Debug;
use eyre::{OptionExt, Result};
use network::{RpcEndpointPool, Shuffle};
use primitives::{
    BlockWindow, CumulativeLock, LockInfo, LockKind, LockRemovedEvent, LockVersion,
    LockVestedEvent, PageRange,
    valuation::{NativeReserves, PairSnapshot},
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Chain calls the pipelines depend on.
///
/// Every method is a single logical read; implementations decide how it maps onto endpoints.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Current chain head.
    async fn latest_block(&self) -> Result<u64>;

    /// v1 `LockRemoved` events inside `window`. Undecodable logs are skipped.
    async fn lock_removed_events(&self, window: BlockWindow) -> Result<Vec<LockRemovedEvent>>;

    /// v2 `LockVested` events inside `window`. Undecodable logs are skipped.
    async fn lock_vested_events(&self, window: BlockWindow) -> Result<Vec<LockVestedEvent>>;

    /// Number of distinct tokens in a lock list.
    async fn lock_count(&self, version: LockVersion, kind: LockKind) -> Result<u64>;

    /// Per-token summaries of one page of a lock list.
    async fn cumulative_locks(
        &self,
        version: LockVersion,
        kind: LockKind,
        page: PageRange,
    ) -> Result<Vec<CumulativeLock>>;

    /// Number of individual locks of `token`.
    async fn lock_count_for_token(&self, version: LockVersion, token: Address) -> Result<u64>;

    /// One page of the individual locks of `token`.
    async fn locks_for_token(
        &self,
        version: LockVersion,
        token: Address,
        page: PageRange,
    ) -> Result<Vec<LockInfo>>;

    /// ERC-20 decimals of `token`.
    async fn token_decimals(&self, token: Address) -> Result<u8>;

    /// Reserves of the pair of `token` against the wrapped native asset, `None` when no pair
    /// exists or the pair is empty.
    async fn native_reserves(&self, token: Address) -> Result<Option<NativeReserves>>;

    /// Reserves, tokens and supply of an LP pair.
    async fn pair_snapshot(&self, pair: Address) -> Result<PairSnapshot>;

    /// Whether `token` behaves like an AMM pair.
    async fn is_lp_token(&self, token: Address) -> Result<bool>;

    /// Every presale pool of the pool manager.
    async fn pools(&self) -> Result<Vec<Address>>;

    /// LP pair and balance a live presale pool holds, `None` when there is nothing to value.
    async fn pool_lp_position(&self, pool: Address) -> Result<Option<(Address, U256)>>;
}

/// [`ChainReader`] over a pool of HTTP endpoints.
///
/// Calls spread over the endpoints round-robin. Reads that must observe one consistent state
/// (a pair's tokens and reserves) stay on the current endpoint.
#[derive(Debug)]
pub struct RpcChainReader {
    config: &'static ChainConfig,
    #[debug(skip)]
    pool: RpcEndpointPool<DefaultProvider>,
    /// Router's wrapped native asset and factory, resolved once
    amm: OnceCell<(Address, Address)>,
}

impl RpcChainReader {
    /// Create a reader for the chain described by `config`.
    pub const fn new(config: &'static ChainConfig, pool: RpcEndpointPool<DefaultProvider>) -> Self {
        Self { config, pool, amm: OnceCell::const_new() }
    }

    fn lock_contract(&self, version: LockVersion) -> Result<PinkLock> {
        let address = self
            .config
            .lock_contract(version)
            .ok_or_else(|| eyre::eyre!("no {version} lock contract on {}", self.config.name))?;
        Ok(self.pool.bind(address, Shuffle::Next, |a, p| PinkLock::new_readonly(version, a, p))?)
    }

    /// Wrapped native asset and factory of the chain's router.
    async fn amm(&self) -> Result<(Address, Address)> {
        self.amm
            .get_or_try_init(|| async {
                let router_address = self.config.router.ok_or_eyre("no router configured")?;
                let router =
                    self.pool.bind(router_address, Shuffle::Next, UniswapRouter::new_readonly)?;
                let weth = self.pool.call(router.wrapped_native()).await?;
                let factory = self.pool.call(router.factory_address()).await?;
                debug!(chain_id = self.config.chain_id, %weth, %factory, "Resolved router");
                Ok::<_, eyre::Report>((weth, factory))
            })
            .await
            .copied()
    }

    async fn release_logs(
        &self,
        version: LockVersion,
        window: BlockWindow,
    ) -> Result<Vec<alloy::rpc::types::Log>> {
        let contract = self.lock_contract(version)?;
        let filter = contract.release_filter(window);
        let provider = self.pool.current_client()?;
        self.pool.call(provider.get_logs(&filter)).await
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn latest_block(&self) -> Result<u64> {
        Ok(self.pool.latest_block_height().await?)
    }

    async fn lock_removed_events(&self, window: BlockWindow) -> Result<Vec<LockRemovedEvent>> {
        let logs = self.release_logs(LockVersion::V1, window).await?;
        Ok(logs
            .iter()
            .filter_map(|log| {
                decode_lock_removed(log)
                    .inspect_err(|e| {
                        let tx = log.transaction_hash;
                        warn!(?tx, err = %e, "Skipping undecodable LockRemoved log");
                    })
                    .ok()
            })
            .collect())
    }

    async fn lock_vested_events(&self, window: BlockWindow) -> Result<Vec<LockVestedEvent>> {
        let logs = self.release_logs(LockVersion::V2, window).await?;
        Ok(logs
            .iter()
            .filter_map(|log| {
                decode_lock_vested(log)
                    .inspect_err(|e| {
                        let tx = log.transaction_hash;
                        warn!(?tx, err = %e, "Skipping undecodable LockVested log");
                    })
                    .ok()
            })
            .collect())
    }

    async fn lock_count(&self, version: LockVersion, kind: LockKind) -> Result<u64> {
        let contract = self.lock_contract(version)?;
        let count = self.pool.call(contract.lock_count(kind)).await?;
        Ok(count.saturating_to())
    }

    async fn cumulative_locks(
        &self,
        version: LockVersion,
        kind: LockKind,
        page: PageRange,
    ) -> Result<Vec<CumulativeLock>> {
        let contract = self.lock_contract(version)?;
        self.pool.call(contract.cumulative_locks(kind, page.start, page.end)).await
    }

    async fn lock_count_for_token(&self, version: LockVersion, token: Address) -> Result<u64> {
        let contract = self.lock_contract(version)?;
        let count = self.pool.call(contract.lock_count_for_token(token)).await?;
        Ok(count.saturating_to())
    }

    async fn locks_for_token(
        &self,
        version: LockVersion,
        token: Address,
        page: PageRange,
    ) -> Result<Vec<LockInfo>> {
        let contract = self.lock_contract(version)?;
        self.pool.call(contract.locks_for_token(token, page.start, page.end)).await
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        let erc20 = self.pool.bind(token, Shuffle::Next, Erc20::new_readonly)?;
        self.pool.call(erc20.token_decimals()).await
    }

    async fn native_reserves(&self, token: Address) -> Result<Option<NativeReserves>> {
        let (weth, factory_address) = self.amm().await?;
        let factory = self.pool.bind(factory_address, Shuffle::Next, UniswapFactory::new_readonly)?;
        let Some(pair_address) = self.pool.call(factory.pair_for(token, weth)).await? else {
            return Ok(None);
        };

        let pair = self.pool.bind(pair_address, Shuffle::Current, UniswapPair::new_readonly)?;
        let token0 = self.pool.call(pair.first_token()).await?;
        let (reserve0, reserve1) = self.pool.call(pair.reserves()).await?;
        if reserve0.is_zero() && reserve1.is_zero() {
            return Ok(None);
        }

        let (native_reserve, token_reserve) =
            if token0 == weth { (reserve0, reserve1) } else { (reserve1, reserve0) };
        Ok(Some(NativeReserves { pair: pair_address, native_reserve, token_reserve }))
    }

    async fn pair_snapshot(&self, pair_address: Address) -> Result<PairSnapshot> {
        let pair = self.pool.bind(pair_address, Shuffle::Current, UniswapPair::new_readonly)?;
        let (token0, token1, (reserve0, reserve1), total_supply) = tokio::try_join!(
            self.pool.call(pair.first_token()),
            self.pool.call(pair.second_token()),
            self.pool.call(pair.reserves()),
            self.pool.call(pair.lp_supply()),
        )?;
        Ok(PairSnapshot { pair: pair_address, token0, token1, reserve0, reserve1, total_supply })
    }

    async fn is_lp_token(&self, token: Address) -> Result<bool> {
        let pair = self.pool.bind(token, Shuffle::Current, UniswapPair::new_readonly)?;
        let is_pair = self.pool.call(pair.first_token()).await.is_ok() &&
            self.pool.call(pair.factory_address()).await.is_ok();
        Ok(is_pair)
    }

    async fn pools(&self) -> Result<Vec<Address>> {
        let manager_address = self.config.pool_manager.ok_or_eyre("no pool manager configured")?;
        let manager = self.pool.bind(manager_address, Shuffle::Next, PoolManager::new_readonly)?;
        self.pool.call(manager.all_pools()).await
    }

    async fn pool_lp_position(&self, pool_address: Address) -> Result<Option<(Address, U256)>> {
        let manager_address = self.config.pool_manager.ok_or_eyre("no pool manager configured")?;
        let manager = self.pool.bind(manager_address, Shuffle::Next, PoolManager::new_readonly)?;
        if !self.pool.call(manager.is_generated(pool_address)).await? {
            return Ok(None);
        }

        let pool = self.pool.bind(pool_address, Shuffle::Current, PresalePool::new_readonly)?;
        if self.pool.call(pool.is_cancelled()).await? {
            return Ok(None);
        }
        let Some(token) = self.pool.call(pool.sale_token()).await? else {
            return Ok(None);
        };

        let (weth, factory_address) = self.amm().await?;
        let factory = self.pool.bind(factory_address, Shuffle::Next, UniswapFactory::new_readonly)?;
        let Some(pair) = self.pool.call(factory.pair_for(token, weth)).await? else {
            return Ok(None);
        };

        let lp = self.pool.bind(pair, Shuffle::Current, Erc20::new_readonly)?;
        let balance = self.pool.call(lp.balance(pool_address)).await?;
        Ok((!balance.is_zero()).then_some((pair, balance)))
    }
}
