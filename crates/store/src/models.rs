use alloy_primitives::{Address, U256};
use clickhouse::Row;
use eyre::{Result, eyre};
use primitives::{LockRecord, LockVersion, TvlEntry};
use serde::{Deserialize, Serialize};

/// Row of the `settings` table
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingRow {
    /// Checkpoint key
    pub key: String,
    /// Integer rendered as a string
    pub value: String,
}

/// Row of the `tvl_records` table
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockRecordRow {
    /// Chain id
    pub chain_id: u64,
    /// Record identity within the chain
    pub record_key: String,
    /// Lock id as a decimal string
    pub lock_id: String,
    /// Contract version
    pub version: u8,
    /// Token or LP pair
    pub token: [u8; 20],
    /// Factory of the token or pair
    pub factory: [u8; 20],
    /// Lock owner
    pub owner: [u8; 20],
    /// Locked amount as a decimal string
    pub amount: String,
    /// Released amount as a decimal string
    pub unlocked_amount: String,
    /// Lock timestamp
    pub lock_date: u64,
    /// Unlock timestamp
    pub unlock_date: u64,
    /// LP token flag
    pub is_liquidity: bool,
    /// Token decimals
    pub token_decimals: Option<u8>,
}

impl From<&LockRecord> for LockRecordRow {
    fn from(record: &LockRecord) -> Self {
        Self {
            chain_id: record.chain_id,
            record_key: record.record_key(),
            lock_id: record.lock_id.to_string(),
            version: record.version.as_u8(),
            token: record.token.into_array(),
            factory: record.factory.into_array(),
            owner: record.owner.into_array(),
            amount: record.amount.to_string(),
            unlocked_amount: record.unlocked_amount.to_string(),
            lock_date: record.lock_date,
            unlock_date: record.unlock_date,
            is_liquidity: record.is_liquidity,
            token_decimals: record.token_decimals,
        }
    }
}

fn parse_amount(field: &str, value: &str) -> Result<U256> {
    value.parse().map_err(|e| eyre!("invalid {field} {value:?}: {e}"))
}

impl TryFrom<LockRecordRow> for LockRecord {
    type Error = eyre::Error;

    fn try_from(row: LockRecordRow) -> Result<Self> {
        let version = LockVersion::from_u8(row.version)
            .ok_or_else(|| eyre!("unknown lock version {}", row.version))?;
        Ok(Self {
            chain_id: row.chain_id,
            lock_id: parse_amount("lock_id", &row.lock_id)?,
            token: Address::from(row.token),
            factory: Address::from(row.factory),
            owner: Address::from(row.owner),
            amount: parse_amount("amount", &row.amount)?,
            unlocked_amount: parse_amount("unlocked_amount", &row.unlocked_amount)?,
            lock_date: row.lock_date,
            unlock_date: row.unlock_date,
            version,
            is_liquidity: row.is_liquidity,
            token_decimals: row.token_decimals,
        })
    }
}

/// Row of the `tvls` and `v2_tvls` tables
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq)]
pub struct TvlRow {
    /// Chain id
    pub chain_id: u64,
    /// Token or LP pair
    pub address: [u8; 20],
    /// Valuation
    pub tvl: f64,
    /// LP valuation flag
    pub is_liquidity: bool,
    /// Stablecoin denomination flag
    pub is_stable_coin: bool,
    /// Presale pool holding the LP tokens
    pub pool: Option<[u8; 20]>,
}

impl From<&TvlEntry> for TvlRow {
    fn from(entry: &TvlEntry) -> Self {
        Self {
            chain_id: entry.chain_id,
            address: entry.address.into_array(),
            tvl: entry.tvl,
            is_liquidity: entry.is_liquidity,
            is_stable_coin: entry.is_stable_coin,
            pool: entry.pool.map(Address::into_array),
        }
    }
}

impl From<TvlRow> for TvlEntry {
    fn from(row: TvlRow) -> Self {
        Self {
            chain_id: row.chain_id,
            address: Address::from(row.address),
            tvl: row.tvl,
            is_liquidity: row.is_liquidity,
            is_stable_coin: row.is_stable_coin,
            pool: row.pool.map(Address::from),
        }
    }
}

/// Single `total` aggregate
#[derive(Debug, Row, Serialize, Deserialize)]
pub struct SumRow {
    /// Sum of the selected valuations
    pub total: f64,
}

/// Single `total` count
#[derive(Debug, Row, Serialize, Deserialize)]
pub struct CountRow {
    /// Number of rows
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn record_row_conversion_keeps_big_amounts() {
        let record = LockRecord {
            chain_id: 56,
            lock_id: U256::from(9),
            token: address!("0x55d398326f99059ff775485246999027b3197955"),
            factory: Address::ZERO,
            owner: address!("0x00000000000000000000000000000000000000aa"),
            amount: U256::MAX,
            unlocked_amount: U256::from(5),
            lock_date: 1,
            unlock_date: 2,
            version: LockVersion::V2,
            is_liquidity: true,
            token_decimals: None,
        };
        let row = LockRecordRow::from(&record);
        assert_eq!(row.record_key, "v2:9");
        assert_eq!(row.amount, U256::MAX.to_string());
        assert_eq!(LockRecord::try_from(row).unwrap(), record);
    }

    #[test]
    fn corrupt_record_row_is_rejected() {
        let mut row = LockRecordRow::from(&LockRecord {
            chain_id: 1,
            lock_id: U256::from(1),
            token: Address::ZERO,
            factory: Address::ZERO,
            owner: Address::ZERO,
            amount: U256::from(1),
            unlocked_amount: U256::ZERO,
            lock_date: 0,
            unlock_date: 0,
            version: LockVersion::V1,
            is_liquidity: false,
            token_decimals: Some(18),
        });
        row.version = 9;
        assert!(LockRecord::try_from(row.clone()).is_err());
        row.version = 1;
        row.amount = "lots".to_owned();
        assert!(LockRecord::try_from(row).is_err());
    }
}
