//! In-process chain used by the pipeline tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, AtomicU64, Ordering},
    },
};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use config::Chain;
use eyre::{Result, eyre};
use primitives::{
    BlockWindow, CumulativeLock, LockInfo, LockKind, LockRemovedEvent, LockVersion,
    LockVestedEvent, PageRange,
    valuation::{NativeReserves, PairSnapshot},
};
use store::MemoryStore;

use crate::{
    context::{ChainContext, DecimalsCache},
    reader::ChainReader,
};

/// `n` whole tokens with 18 decimals.
pub(crate) fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18))
}

/// Chain reader serving preset data.
#[derive(Debug, Default)]
pub(crate) struct FakeChainReader {
    head: AtomicU64,
    removed: Vec<(u64, LockRemovedEvent)>,
    vested: Vec<(u64, LockVestedEvent)>,
    summaries: HashMap<(LockVersion, LockKind), Vec<CumulativeLock>>,
    locks: HashMap<(LockVersion, Address), Vec<LockInfo>>,
    decimals: HashMap<Address, u8>,
    reserves: HashMap<Address, NativeReserves>,
    pairs: HashMap<Address, PairSnapshot>,
    pools: Vec<Address>,
    positions: HashMap<Address, (Address, U256)>,
    failing_tokens: HashSet<Address>,
    fail_counts: bool,
    decimals_calls: AtomicU32,
    summary_pages: Mutex<Vec<(LockVersion, LockKind, u64)>>,
}

impl FakeChainReader {
    pub(crate) fn with_head(self, head: u64) -> Self {
        self.head.store(head, Ordering::SeqCst);
        self
    }

    pub(crate) fn set_head(&self, head: u64) {
        self.head.store(head, Ordering::SeqCst);
    }

    pub(crate) fn with_removed(mut self, block: u64, event: LockRemovedEvent) -> Self {
        self.removed.push((block, event));
        self
    }

    pub(crate) fn with_vested(mut self, block: u64, event: LockVestedEvent) -> Self {
        self.vested.push((block, event));
        self
    }

    pub(crate) fn with_summaries(
        mut self,
        version: LockVersion,
        kind: LockKind,
        summaries: Vec<CumulativeLock>,
    ) -> Self {
        self.summaries.insert((version, kind), summaries);
        self
    }

    pub(crate) fn with_locks(
        mut self,
        version: LockVersion,
        token: Address,
        locks: Vec<LockInfo>,
    ) -> Self {
        self.locks.insert((version, token), locks);
        self
    }

    pub(crate) fn with_decimals(mut self, token: Address, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    pub(crate) fn with_reserves(mut self, token: Address, reserves: NativeReserves) -> Self {
        self.reserves.insert(token, reserves);
        self
    }

    pub(crate) fn with_pair(mut self, pair: PairSnapshot) -> Self {
        self.pairs.insert(pair.pair, pair);
        self
    }

    pub(crate) fn with_pool(mut self, pool: Address, position: Option<(Address, U256)>) -> Self {
        self.pools.push(pool);
        if let Some(position) = position {
            self.positions.insert(pool, position);
        }
        self
    }

    pub(crate) fn failing_token(mut self, token: Address) -> Self {
        self.failing_tokens.insert(token);
        self
    }

    pub(crate) fn failing_counts(mut self) -> Self {
        self.fail_counts = true;
        self
    }

    pub(crate) fn decimals_calls(&self) -> u32 {
        self.decimals_calls.load(Ordering::SeqCst)
    }

    /// Page indexes requested through [`ChainReader::cumulative_locks`], in call order.
    pub(crate) fn summary_pages(&self, version: LockVersion, kind: LockKind) -> Vec<u64> {
        self.summary_pages
            .lock()
            .map(|pages| {
                pages
                    .iter()
                    .filter(|(v, k, _)| *v == version && *k == kind)
                    .map(|(_, _, index)| *index)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn slice<T: Clone>(items: &[T], page: PageRange) -> Vec<T> {
    let start = (page.start as usize).min(items.len());
    let end = (page.end as usize + 1).min(items.len());
    items[start..end].to_vec()
}

#[async_trait]
impl ChainReader for FakeChainReader {
    async fn latest_block(&self) -> Result<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn lock_removed_events(&self, window: BlockWindow) -> Result<Vec<LockRemovedEvent>> {
        Ok(self
            .removed
            .iter()
            .filter(|(block, _)| (window.from..=window.to).contains(block))
            .map(|(_, event)| event.clone())
            .collect())
    }

    async fn lock_vested_events(&self, window: BlockWindow) -> Result<Vec<LockVestedEvent>> {
        Ok(self
            .vested
            .iter()
            .filter(|(block, _)| (window.from..=window.to).contains(block))
            .map(|(_, event)| event.clone())
            .collect())
    }

    async fn lock_count(&self, version: LockVersion, kind: LockKind) -> Result<u64> {
        if self.fail_counts {
            return Err(eyre!("count unavailable"));
        }
        Ok(self.summaries.get(&(version, kind)).map_or(0, |s| s.len() as u64))
    }

    async fn cumulative_locks(
        &self,
        version: LockVersion,
        kind: LockKind,
        page: PageRange,
    ) -> Result<Vec<CumulativeLock>> {
        if let Ok(mut pages) = self.summary_pages.lock() {
            pages.push((version, kind, page.index));
        }
        Ok(self.summaries.get(&(version, kind)).map(|s| slice(s, page)).unwrap_or_default())
    }

    async fn lock_count_for_token(&self, version: LockVersion, token: Address) -> Result<u64> {
        if self.failing_tokens.contains(&token) {
            return Err(eyre!("execution reverted"));
        }
        Ok(self.locks.get(&(version, token)).map_or(0, |l| l.len() as u64))
    }

    async fn locks_for_token(
        &self,
        version: LockVersion,
        token: Address,
        page: PageRange,
    ) -> Result<Vec<LockInfo>> {
        Ok(self.locks.get(&(version, token)).map(|l| slice(l, page)).unwrap_or_default())
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);
        self.decimals.get(&token).copied().ok_or_else(|| eyre!("not an erc20"))
    }

    async fn native_reserves(&self, token: Address) -> Result<Option<NativeReserves>> {
        Ok(self.reserves.get(&token).copied())
    }

    async fn pair_snapshot(&self, pair: Address) -> Result<PairSnapshot> {
        self.pairs.get(&pair).copied().ok_or_else(|| eyre!("execution reverted"))
    }

    async fn is_lp_token(&self, token: Address) -> Result<bool> {
        Ok(self.pairs.contains_key(&token))
    }

    async fn pools(&self) -> Result<Vec<Address>> {
        Ok(self.pools.clone())
    }

    async fn pool_lp_position(&self, pool: Address) -> Result<Option<(Address, U256)>> {
        Ok(self.positions.get(&pool).copied())
    }
}

/// A BSC context over a [`FakeChainReader`] and a [`MemoryStore`].
pub(crate) struct TestChain {
    pub(crate) ctx: ChainContext,
    pub(crate) reader: Arc<FakeChainReader>,
    pub(crate) store: Arc<MemoryStore>,
}

impl TestChain {
    pub(crate) fn new(reader: FakeChainReader) -> Self {
        let reader = Arc::new(reader);
        let store = Arc::new(MemoryStore::new());
        let ctx = ChainContext::new(
            Chain::Bsc.config(),
            reader.clone(),
            store.clone(),
            DecimalsCache::new(),
        );
        Self { ctx, reader, store }
    }
}
