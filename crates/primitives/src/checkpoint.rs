use std::fmt;

use crate::lock::{LockKind, LockVersion};

/// Persisted cursor of one pipeline on one chain.
///
/// The rendered key strings are the on-disk format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointKey {
    /// Last block scanned by the event listener
    Listener {
        /// Contract version
        version: LockVersion,
        /// Chain id
        chain_id: u64,
    },
    /// Page index reached by the full-scan recorder
    Recorder {
        /// Contract version
        version: LockVersion,
        /// Lock list
        kind: LockKind,
        /// Chain id
        chain_id: u64,
    },
    /// Next page index of the valuation engine
    Valuation {
        /// Contract version
        version: LockVersion,
        /// Lock list
        kind: LockKind,
        /// Chain id
        chain_id: u64,
    },
    /// Next page index of the presale pool valuation
    PoolTvl {
        /// Chain id
        chain_id: u64,
    },
}

impl CheckpointKey {
    /// Keys cleared by the daily reset for `chain_id`.
    ///
    /// Listener keys are only included when `include_listener` is set; without them the
    /// listener keeps following the head instead of rescanning from genesis.
    pub fn daily_reset(chain_id: u64, include_listener: bool) -> Vec<Self> {
        let mut keys = Vec::with_capacity(11);
        for version in LockVersion::ALL {
            for kind in LockKind::ALL {
                keys.push(Self::Recorder { version, kind, chain_id });
                keys.push(Self::Valuation { version, kind, chain_id });
            }
            if include_listener {
                keys.push(Self::Listener { version, chain_id });
            }
        }
        keys.push(Self::PoolTvl { chain_id });
        keys
    }
}

const fn records_suffix(kind: LockKind) -> &'static str {
    match kind {
        LockKind::Token => "token",
        LockKind::Liquidity => "lptoken",
    }
}

const fn list_prefix(kind: LockKind) -> &'static str {
    match kind {
        LockKind::Token => "token_lock_list",
        LockKind::Liquidity => "liquidity_lock_list",
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Listener { version, chain_id } => {
                write!(f, "tvl_listener_v{}_{chain_id}", version.as_u8())
            }
            Self::Recorder { version: LockVersion::V1, kind, chain_id } => {
                write!(f, "tvl_records_{chain_id}_{}", records_suffix(kind))
            }
            Self::Recorder { version: LockVersion::V2, kind, chain_id } => {
                write!(f, "tvl_records_v2_{chain_id}_{}", records_suffix(kind))
            }
            Self::Valuation { version: LockVersion::V1, kind, chain_id } => {
                write!(f, "{}_{chain_id}_chunk", list_prefix(kind))
            }
            Self::Valuation { version: LockVersion::V2, kind, chain_id } => {
                write!(f, "{}_{chain_id}_chunk_v2", list_prefix(kind))
            }
            Self::PoolTvl { chain_id } => write!(f, "pool_tvl_{chain_id}_chunk"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strings() {
        let cases = [
            (
                CheckpointKey::Listener { version: LockVersion::V1, chain_id: 56 },
                "tvl_listener_v1_56",
            ),
            (
                CheckpointKey::Listener { version: LockVersion::V2, chain_id: 97 },
                "tvl_listener_v2_97",
            ),
            (
                CheckpointKey::Recorder {
                    version: LockVersion::V1,
                    kind: LockKind::Token,
                    chain_id: 1,
                },
                "tvl_records_1_token",
            ),
            (
                CheckpointKey::Recorder {
                    version: LockVersion::V1,
                    kind: LockKind::Liquidity,
                    chain_id: 1,
                },
                "tvl_records_1_lptoken",
            ),
            (
                CheckpointKey::Recorder {
                    version: LockVersion::V2,
                    kind: LockKind::Liquidity,
                    chain_id: 97,
                },
                "tvl_records_v2_97_lptoken",
            ),
            (
                CheckpointKey::Valuation {
                    version: LockVersion::V1,
                    kind: LockKind::Token,
                    chain_id: 137,
                },
                "token_lock_list_137_chunk",
            ),
            (
                CheckpointKey::Valuation {
                    version: LockVersion::V2,
                    kind: LockKind::Liquidity,
                    chain_id: 137,
                },
                "liquidity_lock_list_137_chunk_v2",
            ),
            (CheckpointKey::PoolTvl { chain_id: 25 }, "pool_tvl_25_chunk"),
        ];
        for (key, expected) in cases {
            assert_eq!(key.to_string(), expected);
        }
    }

    #[test]
    fn daily_reset_keeps_listener_by_default() {
        let keys = CheckpointKey::daily_reset(56, false);
        assert_eq!(keys.len(), 9);
        assert!(!keys.iter().any(|k| matches!(k, CheckpointKey::Listener { .. })));

        let keys = CheckpointKey::daily_reset(56, true);
        assert_eq!(keys.len(), 11);
        assert!(keys.contains(&CheckpointKey::Listener { version: LockVersion::V2, chain_id: 56 }));
    }
}
