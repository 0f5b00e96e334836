//! Periodic TVL recomputation from live AMM reserves.

use std::time::Duration;

use async_trait::async_trait;
use eyre::{Context, Result};
use futures::{StreamExt, stream};
use primitives::{
    CheckpointKey, CumulativeLock, LockKind, LockVersion, TvlEntry,
    paging::{clamp_page_index, page_range},
    valuation::to_display,
};
use tracing::{debug, warn};

use crate::{context::ChainContext, pricing, task::Pipeline};

/// Summaries valued per cycle and list.
pub const VALUATION_PAGE_SIZE: u64 = 50;

/// Summaries priced concurrently within one page.
const PRICING_CONCURRENCY: usize = 4;

/// Values one page of each lock list per cycle and overwrites the matching [`TvlEntry`].
///
/// Unpriced summaries leave their stored entry untouched.
#[derive(Debug)]
pub struct ValuationEngine {
    ctx: ChainContext,
    version: LockVersion,
    page_size: u64,
}

impl ValuationEngine {
    /// Create an engine for the `version` contract of the context's chain.
    pub const fn new(ctx: ChainContext, version: LockVersion) -> Self {
        Self { ctx, version, page_size: VALUATION_PAGE_SIZE }
    }

    /// Override the page size.
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    const fn key(&self, kind: LockKind) -> CheckpointKey {
        CheckpointKey::Valuation { version: self.version, kind, chain_id: self.ctx.chain_id() }
    }

    async fn value_page(&self, kind: LockKind, total: u64) -> Result<()> {
        let chain_id = self.ctx.chain_id();
        let key = self.key(kind);
        let stored = self.ctx.store.checkpoint(key).await?.unwrap_or_default();
        let Some(page) = clamp_page_index(stored, total, self.page_size)
            .and_then(|index| page_range(total, self.page_size, index))
        else {
            return Ok(());
        };

        let summaries = self
            .ctx
            .reader
            .cumulative_locks(self.version, kind, page)
            .await
            .wrap_err_with(|| format!("failed to read {kind} page {}", page.index))?;

        let valued: Vec<_> = stream::iter(summaries.iter().copied())
            .map(|summary| async move { self.value_summary(kind, &summary).await })
            .buffer_unordered(PRICING_CONCURRENCY)
            .collect()
            .await;

        let mut written = 0usize;
        for result in valued {
            match result {
                Ok(Some(entry)) => match self.ctx.store.upsert_tvl(self.version, &entry).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        warn!(chain_id, address = %entry.address, err = %e, "Failed to store TVL")
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    let version = self.version;
                    warn!(chain_id, %version, %kind, err = %e, "Failed to value lock")
                }
            }
        }

        self.ctx.store.set_checkpoint(key, page.index + 1).await?;
        debug!(
            chain_id,
            version = %self.version,
            %kind,
            page = page.index,
            summaries = summaries.len(),
            written,
            "Valued page"
        );
        Ok(())
    }

    /// Price one summary, `None` when it has no price.
    async fn value_summary(
        &self,
        kind: LockKind,
        summary: &CumulativeLock,
    ) -> Result<Option<TvlEntry>> {
        let chain_id = self.ctx.chain_id();
        let entry = match kind {
            LockKind::Token => pricing::value_token(&self.ctx, summary.token, summary.amount)
                .await?
                .map(|value| TvlEntry {
                    chain_id,
                    address: summary.token,
                    tvl: to_display(value),
                    is_liquidity: false,
                    is_stable_coin: false,
                    pool: None,
                }),
            LockKind::Liquidity => pricing::value_lp(&self.ctx, summary.token, summary.amount)
                .await?
                .map(|quote| TvlEntry {
                    chain_id,
                    address: summary.token,
                    tvl: to_display(quote.value),
                    is_liquidity: true,
                    is_stable_coin: quote.denomination.is_stable(),
                    pool: None,
                }),
        };
        Ok(entry)
    }
}

#[async_trait]
impl Pipeline for ValuationEngine {
    fn name(&self) -> String {
        format!("valuation-{}-{}", self.version, self.ctx.chain_id())
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn initial_delay(&self) -> Duration {
        match self.version {
            LockVersion::V1 => Duration::ZERO,
            LockVersion::V2 => Duration::from_secs(10),
        }
    }

    async fn run_once(&mut self) -> Result<()> {
        let reader = &self.ctx.reader;
        let (token_total, lp_total) = tokio::try_join!(
            reader.lock_count(self.version, LockKind::Token),
            reader.lock_count(self.version, LockKind::Liquidity),
        )
        .wrap_err("failed to read lock counts")?;

        let (tokens, liquidity) = tokio::join!(
            self.value_page(LockKind::Token, token_total),
            self.value_page(LockKind::Liquidity, lp_total),
        );
        tokens.wrap_err("token valuation failed")?;
        liquidity.wrap_err("liquidity valuation failed")?;
        Ok(())
    }
}
