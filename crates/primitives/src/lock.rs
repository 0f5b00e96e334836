use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Version of the PinkLock contract a lock or valuation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockVersion {
    /// `PinkLock` v1
    V1,
    /// `PinkLock` v2
    V2,
}

impl LockVersion {
    /// Both contract versions, v1 first.
    pub const ALL: [Self; 2] = [Self::V1, Self::V2];

    /// Numeric version as stored alongside lock records.
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Parse a stored numeric version.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}

impl fmt::Display for LockVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}

/// The two lock lists a `PinkLock` contract maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockKind {
    /// Plain ERC-20 token locks
    Token,
    /// AMM liquidity-provider token locks
    Liquidity,
}

impl LockKind {
    /// Both lock lists, plain tokens first.
    pub const ALL: [Self; 2] = [Self::Token, Self::Liquidity];

    /// Whether this list holds LP tokens.
    pub const fn is_liquidity(self) -> bool {
        matches!(self, Self::Liquidity)
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => f.write_str("token"),
            Self::Liquidity => f.write_str("liquidity"),
        }
    }
}

/// Per-token summary returned by the cumulative lock info getters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeLock {
    /// Locked token (or LP pair) address
    pub token: Address,
    /// Factory that created the token or pair
    pub factory: Address,
    /// Sum of all currently locked amounts for the token
    pub amount: U256,
}

/// A single lock as read from the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    /// Lock id
    pub lock_id: U256,
    /// Locked token
    pub token: Address,
    /// Lock owner
    pub owner: Address,
    /// Locked amount in raw token units
    pub amount: U256,
    /// Already released amount (always zero for v1)
    pub unlocked_amount: U256,
    /// Lock creation timestamp
    pub lock_date: u64,
    /// Unlock timestamp (TGE date for v2 vesting locks)
    pub unlock_date: u64,
}

/// Persisted lock record.
///
/// v2 records are identified by `(chain, lock id)`. v1 records are identified by
/// `(chain, token)`, so several simultaneous v1 locks on one token collapse into a single
/// stored record holding whichever lock was written last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Chain id
    pub chain_id: u64,
    /// Lock id
    pub lock_id: U256,
    /// Locked token or LP pair
    pub token: Address,
    /// Factory that created the token or pair
    pub factory: Address,
    /// Lock owner
    pub owner: Address,
    /// Locked (remaining) amount in raw token units
    pub amount: U256,
    /// Released amount in raw token units
    pub unlocked_amount: U256,
    /// Lock creation timestamp
    pub lock_date: u64,
    /// Unlock timestamp
    pub unlock_date: u64,
    /// Contract version
    pub version: LockVersion,
    /// Whether the locked asset is an LP token
    pub is_liquidity: bool,
    /// Token decimals, if they could be read
    pub token_decimals: Option<u8>,
}

impl LockRecord {
    /// Build a record from a lock read off the contract.
    pub const fn from_lock(
        chain_id: u64,
        version: LockVersion,
        lock: &LockInfo,
        factory: Address,
        is_liquidity: bool,
        token_decimals: Option<u8>,
    ) -> Self {
        Self {
            chain_id,
            lock_id: lock.lock_id,
            token: lock.token,
            factory,
            owner: lock.owner,
            amount: lock.amount,
            unlocked_amount: lock.unlocked_amount,
            lock_date: lock.lock_date,
            unlock_date: lock.unlock_date,
            version,
            is_liquidity,
            token_decimals,
        }
    }

    /// Identity of the record within its chain.
    pub fn record_key(&self) -> String {
        match self.version {
            LockVersion::V1 => format!("v1:{:#x}", self.token),
            LockVersion::V2 => format!("v2:{}", self.lock_id),
        }
    }
}

/// Aggregated valuation of one locked address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlEntry {
    /// Chain id
    pub chain_id: u64,
    /// Token or LP pair address
    pub address: Address,
    /// Valuation in native or stablecoin units
    pub tvl: f64,
    /// Whether the valuation comes from an LP position
    pub is_liquidity: bool,
    /// Whether the valuation is denominated in a stablecoin
    pub is_stable_coin: bool,
    /// Presale pool holding the LP tokens, if any
    pub pool: Option<Address>,
}

/// Decoded `LockRemoved` event emitted by the v1 contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRemovedEvent {
    /// Lock id
    pub lock_id: U256,
    /// Locked token
    pub token: Address,
    /// Lock owner
    pub owner: Address,
    /// Released amount
    pub amount: U256,
    /// Release timestamp
    pub unlocked_at: u64,
}

/// Decoded `LockVested` event emitted by the v2 contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockVestedEvent {
    /// Lock id
    pub lock_id: U256,
    /// Locked token
    pub token: Address,
    /// Lock owner
    pub owner: Address,
    /// Amount released by this vesting step
    pub amount: U256,
    /// Amount still locked after this step
    pub remaining: U256,
    /// Vesting timestamp
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn record(version: LockVersion, lock_id: u64) -> LockRecord {
        LockRecord {
            chain_id: 56,
            lock_id: U256::from(lock_id),
            token: address!("0x55d398326f99059ff775485246999027b3197955"),
            factory: Address::ZERO,
            owner: Address::ZERO,
            amount: U256::from(1),
            unlocked_amount: U256::ZERO,
            lock_date: 0,
            unlock_date: 0,
            version,
            is_liquidity: false,
            token_decimals: Some(18),
        }
    }

    #[test]
    fn v1_records_collapse_on_token() {
        let (first, second) = (record(LockVersion::V1, 1), record(LockVersion::V1, 2));
        assert_eq!(first.record_key(), second.record_key());
        assert_eq!(
            record(LockVersion::V1, 1).record_key(),
            "v1:0x55d398326f99059ff775485246999027b3197955"
        );
    }

    #[test]
    fn v2_records_keyed_by_lock_id() {
        assert_eq!(record(LockVersion::V2, 7).record_key(), "v2:7");
        let (first, second) = (record(LockVersion::V2, 7), record(LockVersion::V2, 8));
        assert_ne!(first.record_key(), second.record_key());
    }

    #[test]
    fn version_round_trips_through_u8() {
        for version in LockVersion::ALL {
            assert_eq!(LockVersion::from_u8(version.as_u8()), Some(version));
        }
        assert_eq!(LockVersion::from_u8(3), None);
    }
}
