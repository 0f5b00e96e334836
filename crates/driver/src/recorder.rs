//! Full scan of the lock lists into individual lock records.

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use eyre::{Context, Result};
use futures::future::try_join_all;
use primitives::{
    CheckpointKey, CumulativeLock, LockKind, LockRecord, LockVersion, PageRange,
    paging::{clamp_page_index, page_range, pages},
};
use tracing::{debug, info, warn};

use crate::{context::ChainContext, task::Pipeline};

/// Items per page of a lock list and of a token's locks.
pub const RECORDER_PAGE_SIZE: u64 = 100;

/// Pauses between pages and between tokens of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Sleep after each page
    pub page: Duration,
    /// Sleep after each token of a page
    pub token: Duration,
}

impl Throttle {
    /// Production pauses for one lock list.
    pub const fn for_list(version: LockVersion, kind: LockKind) -> Self {
        let (page, token) = match (version, kind) {
            (LockVersion::V1, LockKind::Token) => (10, 2),
            (LockVersion::V1, LockKind::Liquidity) => (10, 3),
            (LockVersion::V2, LockKind::Token) => (10, 0),
            (LockVersion::V2, LockKind::Liquidity) => (1, 0),
        };
        Self { page: Duration::from_secs(page), token: Duration::from_secs(token) }
    }

    /// No pauses at all.
    pub const fn none() -> Self {
        Self { page: Duration::ZERO, token: Duration::ZERO }
    }
}

/// Walks both lock lists of one contract and upserts a [`LockRecord`] per individual lock.
///
/// The page being processed is checkpointed, so a restarted cycle picks up on the page it
/// last reached instead of starting over.
#[derive(Debug)]
pub struct FullScanRecorder {
    ctx: ChainContext,
    version: LockVersion,
    page_size: u64,
    token_throttle: Throttle,
    lp_throttle: Throttle,
}

impl FullScanRecorder {
    /// Create a recorder for the `version` contract of the context's chain.
    pub const fn new(ctx: ChainContext, version: LockVersion) -> Self {
        Self {
            ctx,
            version,
            page_size: RECORDER_PAGE_SIZE,
            token_throttle: Throttle::for_list(version, LockKind::Token),
            lp_throttle: Throttle::for_list(version, LockKind::Liquidity),
        }
    }

    /// Override the pauses of both lists.
    pub const fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.token_throttle = throttle;
        self.lp_throttle = throttle;
        self
    }

    /// Override the page size.
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    const fn key(&self, kind: LockKind) -> CheckpointKey {
        CheckpointKey::Recorder { version: self.version, kind, chain_id: self.ctx.chain_id() }
    }

    const fn throttle(&self, kind: LockKind) -> Throttle {
        match kind {
            LockKind::Token => self.token_throttle,
            LockKind::Liquidity => self.lp_throttle,
        }
    }

    /// Walk one lock list from its checkpoint to the end.
    async fn walk(&self, kind: LockKind) -> Result<()> {
        let chain_id = self.ctx.chain_id();
        let key = self.key(kind);
        let total = self
            .ctx
            .reader
            .lock_count(self.version, kind)
            .await
            .wrap_err_with(|| format!("failed to read {kind} lock count"))?;

        let stored = self.ctx.store.checkpoint(key).await?.unwrap_or_default();
        let Some(start) = clamp_page_index(stored, total, self.page_size) else {
            debug!(chain_id, version = %self.version, %kind, "Lock list is empty");
            return Ok(());
        };

        info!(chain_id, version = %self.version, %kind, total, start, "Recording lock list");
        let throttle = self.throttle(kind);
        let mut index = start;
        while let Some(page) = page_range(total, self.page_size, index) {
            self.record_page(kind, page, throttle.token).await?;
            self.ctx.store.set_checkpoint(key, page.index).await?;
            tokio::time::sleep(throttle.page).await;
            index += 1;
        }
        Ok(())
    }

    /// Record every lock of the tokens listed on `page`.
    async fn record_page(
        &self,
        kind: LockKind,
        page: PageRange,
        token_pause: Duration,
    ) -> Result<()> {
        let chain_id = self.ctx.chain_id();
        let summaries = self
            .ctx
            .reader
            .cumulative_locks(self.version, kind, page)
            .await
            .wrap_err_with(|| format!("failed to read {kind} page {}", page.index))?;

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for summary in summaries.iter().filter(|s| seen.insert(s.token)) {
            match self.token_records(kind, summary).await {
                Ok(token_records) => records.extend(token_records),
                Err(e) => {
                    warn!(chain_id, token = %summary.token, err = %e, "Failed to read token locks")
                }
            }
            tokio::time::sleep(token_pause).await;
        }

        if let Err(e) = self.ctx.store.upsert_records(&records).await {
            warn!(chain_id, page = page.index, err = %e, "Failed to store lock records");
        }
        debug!(
            chain_id,
            version = %self.version,
            %kind,
            page = page.index,
            records = records.len(),
            "Recorded page"
        );
        Ok(())
    }

    /// Every individual lock of one token as records.
    async fn token_records(
        &self,
        kind: LockKind,
        summary: &CumulativeLock,
    ) -> Result<Vec<LockRecord>> {
        let chain_id = self.ctx.chain_id();
        let count = self.ctx.reader.lock_count_for_token(self.version, summary.token).await?;
        let decimals =
            self.ctx.decimals.get(chain_id, summary.token, self.ctx.reader.as_ref()).await;

        let reads = pages(count, self.page_size)
            .map(|page| self.ctx.reader.locks_for_token(self.version, summary.token, page));
        let locks = try_join_all(reads).await?;

        Ok(locks
            .iter()
            .flatten()
            .map(|lock| {
                LockRecord::from_lock(
                    chain_id,
                    self.version,
                    lock,
                    summary.factory,
                    kind.is_liquidity(),
                    decimals,
                )
            })
            .collect())
    }
}

#[async_trait]
impl Pipeline for FullScanRecorder {
    fn name(&self) -> String {
        format!("recorder-{}-{}", self.version, self.ctx.chain_id())
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    async fn run_once(&mut self) -> Result<()> {
        let (tokens, liquidity) =
            tokio::join!(self.walk(LockKind::Token), self.walk(LockKind::Liquidity));
        tokens.wrap_err("token lock walk failed")?;
        liquidity.wrap_err("liquidity lock walk failed")?;
        Ok(())
    }
}
