/// Table schema definition
#[derive(Debug)]
pub struct TableSchema {
    /// Table name
    pub name: &'static str,
    /// Column definitions
    pub columns: &'static str,
    /// Sorting key, which is also the deduplication key of the `ReplacingMergeTree`
    pub order_by: &'static str,
}

/// Pipeline checkpoints
pub const SETTINGS_TABLE: &str = "settings";
/// Individual lock records
pub const RECORDS_TABLE: &str = "tvl_records";
/// v1 TVL entries
pub const TVL_TABLE: &str = "tvls";
/// v2 TVL entries
pub const TVL_V2_TABLE: &str = "v2_tvls";

/// Names of all tables
pub const TABLES: &[&str] = &[SETTINGS_TABLE, RECORDS_TABLE, TVL_TABLE, TVL_V2_TABLE];

const TVL_COLUMNS: &str = "chain_id UInt64,
                 address FixedString(20),
                 tvl Float64,
                 is_liquidity Bool,
                 is_stable_coin Bool,
                 pool Nullable(FixedString(20)),
                 updated_at DateTime64(3) DEFAULT now64()";

/// Schema definitions for tables
pub const TABLE_SCHEMAS: &[TableSchema] = &[
    TableSchema {
        name: SETTINGS_TABLE,
        columns: "key String,
                 value String,
                 updated_at DateTime64(3) DEFAULT now64()",
        order_by: "key",
    },
    TableSchema {
        name: RECORDS_TABLE,
        columns: "chain_id UInt64,
                 record_key String,
                 lock_id String,
                 version UInt8,
                 token FixedString(20),
                 factory FixedString(20),
                 owner FixedString(20),
                 amount String,
                 unlocked_amount String,
                 lock_date UInt64,
                 unlock_date UInt64,
                 is_liquidity Bool,
                 token_decimals Nullable(UInt8),
                 updated_at DateTime64(3) DEFAULT now64()",
        order_by: "chain_id, record_key",
    },
    TableSchema { name: TVL_TABLE, columns: TVL_COLUMNS, order_by: "chain_id, address" },
    TableSchema { name: TVL_V2_TABLE, columns: TVL_COLUMNS, order_by: "chain_id, address" },
];

/// TVL table of a contract version.
pub const fn tvl_table(version: primitives::LockVersion) -> &'static str {
    match version {
        primitives::LockVersion::V1 => TVL_TABLE,
        primitives::LockVersion::V2 => TVL_V2_TABLE,
    }
}
