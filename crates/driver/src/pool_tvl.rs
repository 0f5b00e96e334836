//! Valuation of the LP positions held by presale pools.

use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::{Context, Result};
use network::retries::{is_revert, retry_linear_if};
use primitives::{
    CheckpointKey, LockVersion, TvlEntry,
    paging::{clamp_page_index, page_range},
    valuation::to_display,
};
use tracing::{debug, warn};

use crate::{context::ChainContext, pricing, task::Pipeline};

/// Pools valued per cycle.
pub const POOL_PAGE_SIZE: u64 = 50;

const POOL_CALL_ATTEMPTS: u32 = 5;
const POOL_CALL_STEP: Duration = Duration::from_millis(500);

fn retryable(e: &eyre::Report) -> bool {
    !is_revert(format!("{e:#}"))
}

/// Walks the pool manager's presale pools and stores the value of the LP tokens each live
/// pool holds as a v1 liquidity entry referencing the pool.
#[derive(Debug)]
pub struct PoolTvl {
    ctx: ChainContext,
    page_size: u64,
}

impl PoolTvl {
    /// Create the pipeline for the context's chain.
    pub const fn new(ctx: ChainContext) -> Self {
        Self { ctx, page_size: POOL_PAGE_SIZE }
    }

    /// Override the page size.
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    const fn key(&self) -> CheckpointKey {
        CheckpointKey::PoolTvl { chain_id: self.ctx.chain_id() }
    }

    async fn value_pool(&self, pool: Address) -> Result<Option<TvlEntry>> {
        let reader = &self.ctx.reader;
        let position = retry_linear_if(
            || reader.pool_lp_position(pool),
            POOL_CALL_ATTEMPTS,
            POOL_CALL_STEP,
            retryable,
        )
        .await?;
        let Some((pair, balance)) = position else {
            return Ok(None);
        };

        let Some(quote) = pricing::value_lp(&self.ctx, pair, balance).await? else {
            return Ok(None);
        };
        Ok(Some(TvlEntry {
            chain_id: self.ctx.chain_id(),
            address: pair,
            tvl: to_display(quote.value),
            is_liquidity: true,
            is_stable_coin: quote.denomination.is_stable(),
            pool: Some(pool),
        }))
    }
}

#[async_trait]
impl Pipeline for PoolTvl {
    fn name(&self) -> String {
        format!("pool-tvl-{}", self.ctx.chain_id())
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn run_once(&mut self) -> Result<()> {
        let chain_id = self.ctx.chain_id();
        let reader = &self.ctx.reader;
        let pools =
            retry_linear_if(|| reader.pools(), POOL_CALL_ATTEMPTS, POOL_CALL_STEP, retryable)
                .await
                .wrap_err("failed to list presale pools")?;

        let total = pools.len() as u64;
        let stored = self.ctx.store.checkpoint(self.key()).await?.unwrap_or_default();
        let Some(page) = clamp_page_index(stored, total, self.page_size)
            .and_then(|index| page_range(total, self.page_size, index))
        else {
            return Ok(());
        };

        let mut written = 0usize;
        for &pool in &pools[page.start as usize..=page.end as usize] {
            match self.value_pool(pool).await {
                Ok(Some(entry)) => match self.ctx.store.upsert_tvl(LockVersion::V1, &entry).await {
                    Ok(()) => written += 1,
                    Err(e) => warn!(chain_id, %pool, err = %e, "Failed to store pool TVL"),
                },
                Ok(None) => {}
                Err(e) => warn!(chain_id, %pool, err = %e, "Failed to value pool"),
            }
        }

        self.ctx.store.set_checkpoint(self.key(), page.index + 1).await?;
        debug!(chain_id, page = page.index, pools = page.item_count(), written, "Valued pools");
        Ok(())
    }
}
