//! `ClickHouse` backend.
//!
//! Every table is a `ReplacingMergeTree` keyed by the identity of its rows, so an upsert is a
//! plain insert and reads use `FINAL` to see the latest version of each row.

use alloy_primitives::{Address, U256, hex};
use async_trait::async_trait;
use clickhouse::{Client, sql::Identifier};
use derive_more::Debug;
use eyre::{Context, Result};
use primitives::{CheckpointKey, LockRecord, LockVersion, TvlEntry};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    CheckpointStore, LockRecordStore, RecordPage, TvlStore,
    models::{CountRow, LockRecordRow, SettingRow, SumRow, TvlRow},
    schema::{RECORDS_TABLE, SETTINGS_TABLE, TABLE_SCHEMAS, TABLES, TableSchema, tvl_table},
};

const RECORD_COLUMNS: &str = "chain_id, record_key, lock_id, version, token, factory, owner, \
                              amount, unlocked_amount, lock_date, unlock_date, is_liquidity, \
                              token_decimals";

const TVL_COLUMNS: &str = "chain_id, address, tvl, is_liquidity, is_stable_coin, pool";

/// `ClickHouse` store for checkpoints, lock records and TVL entries
#[derive(Clone, Debug)]
pub struct ClickhouseStore {
    /// Base client
    #[debug(skip)]
    base: Client,
    /// Database name
    db_name: String,
}

impl ClickhouseStore {
    /// Create a new `ClickHouse` store client
    pub fn new(url: Url, db_name: String, username: String, password: String) -> Result<Self> {
        let client = Client::default()
            .with_url(url)
            .with_database(db_name.clone())
            .with_user(username)
            .with_password(password);

        Ok(Self { base: client, db_name })
    }

    /// Create a table with the given schema
    async fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let query = format!(
            "CREATE TABLE IF NOT EXISTS {}.{} (
                {}
            ) ENGINE = ReplacingMergeTree(updated_at)
            ORDER BY ({})",
            self.db_name, schema.name, schema.columns, schema.order_by
        );

        self.base
            .query(&query)
            .execute()
            .await
            .wrap_err_with(|| format!("Failed to create {} table", schema.name))
    }

    /// Drop a table if it exists
    async fn drop_table(&self, table_name: &str) -> Result<()> {
        self.base
            .query(&format!("DROP TABLE IF EXISTS {}.{}", self.db_name, table_name))
            .execute()
            .await
            .wrap_err_with(|| format!("Failed to drop {table_name} table"))
    }

    /// Create the database and its tables, dropping existing tables first if `reset` is set
    pub async fn init_db(&self, reset: bool) -> Result<()> {
        self.base
            .query(&format!("CREATE DATABASE IF NOT EXISTS {}", self.db_name))
            .execute()
            .await
            .wrap_err("Failed to create database")?;

        if reset {
            for table in TABLES {
                self.drop_table(table).await?;
            }
            info!(db_name = %self.db_name, "Database reset complete");
        }

        for schema in TABLE_SCHEMAS {
            self.create_table(schema).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for ClickhouseStore {
    async fn checkpoint(&self, key: CheckpointKey) -> Result<Option<u64>> {
        let sql = "SELECT key, value FROM ?.? FINAL WHERE key = ? LIMIT 1";
        let key = key.to_string();
        let row = self
            .base
            .query(sql)
            .bind(Identifier(&self.db_name))
            .bind(Identifier(SETTINGS_TABLE))
            .bind(&key)
            .fetch_optional::<SettingRow>()
            .await
            .wrap_err_with(|| format!("Failed to read checkpoint {key}"))?;

        Ok(row.and_then(|row| match row.value.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                let (key, value) = (&row.key, &row.value);
                warn!(%key, %value, err = %e, "Ignoring unparsable checkpoint");
                None
            }
        }))
    }

    async fn set_checkpoint(&self, key: CheckpointKey, value: u64) -> Result<()> {
        let row = SettingRow { key: key.to_string(), value: value.to_string() };
        let mut insert = self.base.insert(SETTINGS_TABLE)?;
        insert.write(&row).await?;
        insert.end().await.wrap_err_with(|| format!("Failed to store checkpoint {}", row.key))
    }

    async fn delete_checkpoints(&self, keys: &[CheckpointKey]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
        self.base
            .query("DELETE FROM ?.? WHERE has(?, key)")
            .bind(Identifier(&self.db_name))
            .bind(Identifier(SETTINGS_TABLE))
            .bind(keys)
            .execute()
            .await
            .wrap_err("Failed to delete checkpoints")
    }
}

#[async_trait]
impl LockRecordStore for ClickhouseStore {
    async fn upsert_records(&self, records: &[LockRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut insert = self.base.insert(RECORDS_TABLE)?;
        for record in records {
            insert.write(&LockRecordRow::from(record)).await?;
        }
        insert.end().await.wrap_err("Failed to upsert lock records")?;
        debug!(count = records.len(), "Upserted lock records");
        Ok(())
    }

    async fn find_record(
        &self,
        chain_id: u64,
        version: LockVersion,
        lock_id: U256,
    ) -> Result<Option<LockRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM ?.? FINAL \
             WHERE chain_id = ? AND version = ? AND lock_id = ? LIMIT 1"
        );
        let row = self
            .base
            .query(&sql)
            .bind(Identifier(&self.db_name))
            .bind(Identifier(RECORDS_TABLE))
            .bind(chain_id)
            .bind(version.as_u8())
            .bind(lock_id.to_string())
            .fetch_optional::<LockRecordRow>()
            .await
            .wrap_err("Failed to find lock record")?;
        row.map(LockRecord::try_from).transpose()
    }

    async fn delete_record(
        &self,
        chain_id: u64,
        version: LockVersion,
        lock_id: U256,
    ) -> Result<bool> {
        // Lightweight deletes report no row count.
        if self.find_record(chain_id, version, lock_id).await?.is_none() {
            return Ok(false);
        }
        self.base
            .query("DELETE FROM ?.? WHERE chain_id = ? AND version = ? AND lock_id = ?")
            .bind(Identifier(&self.db_name))
            .bind(Identifier(RECORDS_TABLE))
            .bind(chain_id)
            .bind(version.as_u8())
            .bind(lock_id.to_string())
            .execute()
            .await
            .wrap_err("Failed to delete lock record")?;
        Ok(true)
    }

    async fn records_page(&self, chain_id: u64, offset: u64, limit: u64) -> Result<RecordPage> {
        let count = self
            .base
            .query("SELECT count() AS total FROM ?.? FINAL WHERE chain_id = ?")
            .bind(Identifier(&self.db_name))
            .bind(Identifier(RECORDS_TABLE))
            .bind(chain_id)
            .fetch_one::<CountRow>()
            .await
            .wrap_err("Failed to count lock records")?;

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM ?.? FINAL WHERE chain_id = ? \
             ORDER BY lock_date, record_key LIMIT ? OFFSET ?"
        );
        let rows = self
            .base
            .query(&sql)
            .bind(Identifier(&self.db_name))
            .bind(Identifier(RECORDS_TABLE))
            .bind(chain_id)
            .bind(limit)
            .bind(offset)
            .fetch_all::<LockRecordRow>()
            .await
            .wrap_err("Failed to list lock records")?;

        let records = rows
            .into_iter()
            .filter_map(|row| {
                let key = row.record_key.clone();
                LockRecord::try_from(row)
                    .inspect_err(|e| warn!(chain_id, %key, err = %e, "Skipping corrupt record"))
                    .ok()
            })
            .collect();
        Ok(RecordPage { records, total: count.total })
    }
}

#[async_trait]
impl TvlStore for ClickhouseStore {
    async fn tvl_entry(
        &self,
        version: LockVersion,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<TvlEntry>> {
        let sql = format!(
            "SELECT {TVL_COLUMNS} FROM ?.? FINAL \
             WHERE chain_id = ? AND address = unhex(?) LIMIT 1"
        );
        let row = self
            .base
            .query(&sql)
            .bind(Identifier(&self.db_name))
            .bind(Identifier(tvl_table(version)))
            .bind(chain_id)
            .bind(hex::encode(address))
            .fetch_optional::<TvlRow>()
            .await
            .wrap_err("Failed to read tvl entry")?;
        Ok(row.map(TvlEntry::from))
    }

    async fn upsert_tvl(&self, version: LockVersion, entry: &TvlEntry) -> Result<()> {
        let mut insert = self.base.insert(tvl_table(version))?;
        insert.write(&TvlRow::from(entry)).await?;
        insert.end().await.wrap_err("Failed to upsert tvl entry")
    }

    async fn sum_tvl(
        &self,
        version: LockVersion,
        chain_id: u64,
        is_stable_coin: bool,
    ) -> Result<f64> {
        let row = self
            .base
            .query(
                "SELECT sum(tvl) AS total FROM ?.? FINAL \
                 WHERE chain_id = ? AND is_stable_coin = ?",
            )
            .bind(Identifier(&self.db_name))
            .bind(Identifier(tvl_table(version)))
            .bind(chain_id)
            .bind(is_stable_coin)
            .fetch_one::<SumRow>()
            .await
            .wrap_err("Failed to sum tvl")?;
        Ok(row.total)
    }
}
