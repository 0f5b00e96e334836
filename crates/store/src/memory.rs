//! In-memory backend for dry runs and tests.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use dashmap::DashMap;
use eyre::Result;
use primitives::{CheckpointKey, LockRecord, LockVersion, TvlEntry};

use crate::{CheckpointStore, LockRecordStore, RecordPage, TvlStore};

/// Store keeping everything in concurrent maps. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    checkpoints: DashMap<CheckpointKey, u64>,
    records: DashMap<(u64, String), LockRecord>,
    tvls: DashMap<(LockVersion, u64, Address), TvlEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored lock records across all chains.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn checkpoint(&self, key: CheckpointKey) -> Result<Option<u64>> {
        Ok(self.checkpoints.get(&key).map(|v| *v))
    }

    async fn set_checkpoint(&self, key: CheckpointKey, value: u64) -> Result<()> {
        self.checkpoints.insert(key, value);
        Ok(())
    }

    async fn delete_checkpoints(&self, keys: &[CheckpointKey]) -> Result<()> {
        for key in keys {
            self.checkpoints.remove(key);
        }
        Ok(())
    }
}

#[async_trait]
impl LockRecordStore for MemoryStore {
    async fn upsert_records(&self, records: &[LockRecord]) -> Result<()> {
        for record in records {
            self.records.insert((record.chain_id, record.record_key()), record.clone());
        }
        Ok(())
    }

    async fn find_record(
        &self,
        chain_id: u64,
        version: LockVersion,
        lock_id: U256,
    ) -> Result<Option<LockRecord>> {
        Ok(self.records.iter().find_map(|entry| {
            let record = entry.value();
            (record.chain_id == chain_id && record.version == version && record.lock_id == lock_id)
                .then(|| record.clone())
        }))
    }

    async fn delete_record(
        &self,
        chain_id: u64,
        version: LockVersion,
        lock_id: U256,
    ) -> Result<bool> {
        let keys: Vec<_> = self
            .records
            .iter()
            .filter(|entry| {
                let record = entry.value();
                record.chain_id == chain_id &&
                    record.version == version &&
                    record.lock_id == lock_id
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = false;
        for key in keys {
            removed |= self.records.remove(&key).is_some();
        }
        Ok(removed)
    }

    async fn records_page(&self, chain_id: u64, offset: u64, limit: u64) -> Result<RecordPage> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == chain_id)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        records.sort_by(|(ka, a), (kb, b)| a.lock_date.cmp(&b.lock_date).then_with(|| ka.cmp(kb)));

        let total = records.len() as u64;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let records = records.into_iter().skip(offset).take(limit).map(|(_, r)| r).collect();
        Ok(RecordPage { records, total })
    }
}

#[async_trait]
impl TvlStore for MemoryStore {
    async fn tvl_entry(
        &self,
        version: LockVersion,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<TvlEntry>> {
        Ok(self.tvls.get(&(version, chain_id, address)).map(|e| e.clone()))
    }

    async fn upsert_tvl(&self, version: LockVersion, entry: &TvlEntry) -> Result<()> {
        self.tvls.insert((version, entry.chain_id, entry.address), entry.clone());
        Ok(())
    }

    async fn sum_tvl(
        &self,
        version: LockVersion,
        chain_id: u64,
        is_stable_coin: bool,
    ) -> Result<f64> {
        Ok(self
            .tvls
            .iter()
            .filter(|e| {
                let (v, c, _) = *e.key();
                v == version && c == chain_id && e.is_stable_coin == is_stable_coin
            })
            .map(|e| e.tvl)
            .sum())
    }
}
