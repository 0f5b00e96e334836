//! Incremental follower of lock release events.

use std::time::Duration;

use async_trait::async_trait;
use eyre::{Context, Result};
use primitives::{
    BlockWindow, CheckpointKey, LockRemovedEvent, LockVersion, LockVestedEvent,
    valuation::to_display,
};
use tracing::{debug, info, warn};

use crate::{context::ChainContext, pricing, task::Pipeline};

/// Follows one locking contract from its checkpoint towards the chain head.
///
/// Each run scans one [`BlockWindow`], applies the releases it finds and stores the end of
/// the window as the new checkpoint.
#[derive(Debug)]
pub struct EventListener {
    ctx: ChainContext,
    version: LockVersion,
}

impl EventListener {
    /// Create a listener for the `version` contract of the context's chain.
    pub const fn new(ctx: ChainContext, version: LockVersion) -> Self {
        Self { ctx, version }
    }

    const fn key(&self) -> CheckpointKey {
        CheckpointKey::Listener { version: self.version, chain_id: self.ctx.chain_id() }
    }

    /// Window to scan next.
    pub async fn next_window(&self) -> Result<BlockWindow> {
        let checkpoint = self
            .ctx
            .store
            .checkpoint(self.key())
            .await?
            .unwrap_or_else(|| self.ctx.config.genesis_block(self.version));
        let head = self.ctx.reader.latest_block().await.wrap_err("failed to read chain head")?;
        Ok(BlockWindow::compute(checkpoint, head, self.ctx.config.backtrack_blocks))
    }

    /// Subtract a v1 release from the stored TVL of its token.
    ///
    /// Only the scan that deletes the lock record subtracts, so windows that overlap near the
    /// head apply each release once. Missing entries and releases that value to zero leave the
    /// store untouched.
    async fn apply_removed(&self, event: &LockRemovedEvent) -> Result<()> {
        let chain_id = self.ctx.chain_id();
        if !self.ctx.store.delete_record(chain_id, LockVersion::V1, event.lock_id).await? {
            debug!(chain_id, lock_id = %event.lock_id, "Release already applied or never recorded");
            return Ok(());
        }

        let Some(mut entry) =
            self.ctx.store.tvl_entry(LockVersion::V1, chain_id, event.token).await?
        else {
            debug!(chain_id, token = %event.token, "No TVL entry for released token");
            return Ok(());
        };

        let is_lp = match self.ctx.reader.is_lp_token(event.token).await {
            Ok(is_lp) => is_lp,
            Err(e) => {
                let token = event.token;
                debug!(chain_id, %token, err = %e, "LP check failed, pricing as a plain token");
                false
            }
        };
        let Some(quote) = pricing::value_any(&self.ctx, event.token, event.amount, is_lp).await?
        else {
            debug!(chain_id, token = %event.token, "Released token is unpriced");
            return Ok(());
        };

        let delta = to_display(quote.value);
        if delta == 0.0 {
            return Ok(());
        }

        entry.tvl = (entry.tvl - delta).max(0.0);
        self.ctx.store.upsert_tvl(LockVersion::V1, &entry).await?;
        info!(
            chain_id,
            token = %event.token,
            lock_id = %event.lock_id,
            delta,
            tvl = entry.tvl,
            "Applied lock removal"
        );
        Ok(())
    }

    /// Record a v2 vesting step on the stored lock.
    async fn apply_vested(&self, event: &LockVestedEvent) -> Result<()> {
        let chain_id = self.ctx.chain_id();
        let Some(mut record) =
            self.ctx.store.find_record(chain_id, LockVersion::V2, event.lock_id).await?
        else {
            debug!(chain_id, lock_id = %event.lock_id, "Vested lock not recorded yet");
            return Ok(());
        };

        record.amount = event.remaining;
        record.unlocked_amount = record.unlocked_amount.saturating_add(event.amount);
        self.ctx.store.upsert_records(std::slice::from_ref(&record)).await?;
        debug!(chain_id, lock_id = %event.lock_id, remaining = %event.remaining, "Applied vesting");
        Ok(())
    }

    async fn apply_window(&self, window: BlockWindow) -> Result<usize> {
        let chain_id = self.ctx.chain_id();
        let applied = match self.version {
            LockVersion::V1 => {
                let events = self.ctx.reader.lock_removed_events(window).await?;
                for event in &events {
                    if let Err(e) = self.apply_removed(event).await {
                        warn!(
                            chain_id,
                            lock_id = %event.lock_id,
                            err = %e,
                            "Failed to apply lock removal"
                        );
                    }
                }
                events.len()
            }
            LockVersion::V2 => {
                let events = self.ctx.reader.lock_vested_events(window).await?;
                for event in &events {
                    if let Err(e) = self.apply_vested(event).await {
                        let lock_id = event.lock_id;
                        warn!(chain_id, %lock_id, err = %e, "Failed to apply vesting");
                    }
                }
                events.len()
            }
        };
        Ok(applied)
    }
}

#[async_trait]
impl Pipeline for EventListener {
    fn name(&self) -> String {
        format!("listener-{}-{}", self.version, self.ctx.chain_id())
    }

    fn interval(&self) -> Duration {
        match self.version {
            LockVersion::V1 => Duration::from_secs(30),
            LockVersion::V2 => Duration::from_secs(1),
        }
    }

    async fn run_once(&mut self) -> Result<()> {
        let window = self.next_window().await?;
        let events = self.apply_window(window).await?;
        self.ctx.store.set_checkpoint(self.key(), window.to).await?;
        debug!(
            chain_id = self.ctx.chain_id(),
            version = %self.version,
            from = window.from,
            to = window.to,
            events,
            "Scanned block window"
        );
        Ok(())
    }
}
