//! Persistence for checkpoints, lock records and TVL entries.
//!
//! The pipelines only talk to the [`Store`] traits. [`ClickhouseStore`] is the production
//! backend; [`MemoryStore`] backs dry runs and tests.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use eyre::Result;
use primitives::{CheckpointKey, LockRecord, LockVersion, TvlEntry};

mod clickhouse_store;
mod memory;
/// Row types and their conversions
pub mod models;
/// Table schema definitions
pub mod schema;

pub use crate::{clickhouse_store::ClickhouseStore, memory::MemoryStore};

/// One page of lock records of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordPage {
    /// Records on the page
    pub records: Vec<LockRecord>,
    /// Total number of records of the chain
    pub total: u64,
}

/// Persisted pipeline cursors.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Stored value of `key`. Missing or unparsable values read as `None`.
    async fn checkpoint(&self, key: CheckpointKey) -> Result<Option<u64>>;

    /// Upsert `key`.
    async fn set_checkpoint(&self, key: CheckpointKey, value: u64) -> Result<()>;

    /// Delete every key in `keys`.
    async fn delete_checkpoints(&self, keys: &[CheckpointKey]) -> Result<()>;
}

/// Individual lock records.
#[async_trait]
pub trait LockRecordStore: Send + Sync {
    /// Upsert records by their [`LockRecord::record_key`] within their chain.
    async fn upsert_records(&self, records: &[LockRecord]) -> Result<()>;

    /// Find the record of `lock_id`.
    async fn find_record(
        &self,
        chain_id: u64,
        version: LockVersion,
        lock_id: U256,
    ) -> Result<Option<LockRecord>>;

    /// Delete the record of `lock_id`. Returns whether a record was present.
    async fn delete_record(&self, chain_id: u64, version: LockVersion, lock_id: U256)
    -> Result<bool>;

    /// Records of `chain_id`, skipping `offset` and returning at most `limit`.
    async fn records_page(&self, chain_id: u64, offset: u64, limit: u64) -> Result<RecordPage>;
}

/// Aggregated TVL entries, one family per contract version.
#[async_trait]
pub trait TvlStore: Send + Sync {
    /// Entry of `address` on `chain_id`.
    async fn tvl_entry(
        &self,
        version: LockVersion,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<TvlEntry>>;

    /// Overwrite the entry of `(entry.chain_id, entry.address)`.
    async fn upsert_tvl(&self, version: LockVersion, entry: &TvlEntry) -> Result<()>;

    /// Sum of the entries of `chain_id` with the given stablecoin flag.
    async fn sum_tvl(&self, version: LockVersion, chain_id: u64, is_stable_coin: bool)
    -> Result<f64>;
}

/// Everything the pipelines and the API need from persistence.
pub trait Store: CheckpointStore + LockRecordStore + TvlStore {}

impl<T: CheckpointStore + LockRecordStore + TvlStore> Store for T {}
