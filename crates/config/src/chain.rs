//! Static per-chain configuration.
use std::fmt;

use alloy_primitives::{Address, address};
use clap::ValueEnum;
use primitives::LockVersion;

/// Blocks scanned per listener iteration: 30 minutes of 3 second blocks.
pub const DEFAULT_BACKTRACK_BLOCKS: u64 = 600;

/// Chains the indexer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Chain {
    /// BNB Smart Chain
    Bsc,
    /// BNB Smart Chain testnet
    BscTest,
    /// Polygon
    Matic,
    /// Ethereum mainnet
    Eth,
    /// Avalanche C-Chain
    Avax,
    /// KuCoin Community Chain
    Kcc,
    /// Cronos
    Cronos,
}

/// Immutable configuration of one chain.
#[derive(Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// EVM chain id
    pub chain_id: u64,
    /// Human readable name used in logs
    pub name: &'static str,
    /// RPC endpoints, rotated round-robin
    pub rpcs: &'static [&'static str],
    /// `PinkLock` v1 contract
    pub pink_lock: Option<Address>,
    /// `PinkLock` v2 contract
    pub pink_lock_v2: Option<Address>,
    /// Block the v1 contract was deployed at
    pub pink_lock_genesis: u64,
    /// Block the v2 contract was deployed at
    pub pink_lock_v2_genesis: u64,
    /// Uniswap v2 style router used for reserve lookups
    pub router: Option<Address>,
    /// Presale pool manager
    pub pool_manager: Option<Address>,
    /// Listener window size in blocks
    pub backtrack_blocks: u64,
    /// Wrapped native asset
    pub native_token: Address,
    /// Recognised stablecoins
    pub stable_coins: &'static [Address],
}

impl ChainConfig {
    /// Locking contract of the given version, if deployed on this chain.
    pub const fn lock_contract(&self, version: LockVersion) -> Option<Address> {
        match version {
            LockVersion::V1 => self.pink_lock,
            LockVersion::V2 => self.pink_lock_v2,
        }
    }

    /// Deployment block of the locking contract of the given version.
    pub const fn genesis_block(&self, version: LockVersion) -> u64 {
        match version {
            LockVersion::V1 => self.pink_lock_genesis,
            LockVersion::V2 => self.pink_lock_v2_genesis,
        }
    }
}

impl Chain {
    /// Every known chain.
    pub const ALL: [Self; 7] =
        [Self::Bsc, Self::BscTest, Self::Matic, Self::Eth, Self::Avax, Self::Kcc, Self::Cronos];

    /// Chains indexed when none are configured explicitly. Testnets are excluded.
    pub fn production() -> Vec<Self> {
        Self::ALL.into_iter().filter(|c| *c != Self::BscTest).collect()
    }

    /// Look up a chain by its EVM chain id.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.config().chain_id == chain_id)
    }

    /// Static configuration of this chain.
    pub fn config(self) -> &'static ChainConfig {
        match self {
            Self::Bsc => &BSC,
            Self::BscTest => &BSC_TEST,
            Self::Matic => &MATIC,
            Self::Eth => &ETH,
            Self::Avax => &AVAX,
            Self::Kcc => &KCC,
            Self::Cronos => &CRONOS,
        }
    }

    /// EVM chain id.
    pub fn chain_id(self) -> u64 {
        self.config().chain_id
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().name)
    }
}

const BSC_STABLES: &[Address] = &[
    address!("0x55d398326f99059ff775485246999027b3197955"), // USDT
    address!("0xe9e7cea3dedca5984780bafc599bd69add087d56"), // BUSD
    address!("0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d"), // USDC
];

static BSC: ChainConfig = ChainConfig {
    chain_id: 56,
    name: "bsc",
    rpcs: &[
        "https://bsc-dataseed.binance.org",
        "https://bsc-dataseed1.defibit.io",
        "https://bsc-dataseed1.ninicoin.io",
    ],
    pink_lock: Some(address!("0x7ee058420e5937496F5a2096f04caA7721cF70cc")),
    pink_lock_v2: None,
    pink_lock_genesis: 11_385_323,
    pink_lock_v2_genesis: 0,
    // PancakeSwap
    router: Some(address!("0x10ED43C718714eb63d5aA57B78B54704E256024E")),
    pool_manager: Some(address!("0x3338CCa60f829Fa7139656bB910c63D44aFD270A")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
    stable_coins: BSC_STABLES,
};

static BSC_TEST: ChainConfig = ChainConfig {
    chain_id: 97,
    name: "bsc-test",
    rpcs: &[
        "https://data-seed-prebsc-1-s1.binance.org:8545/",
        "https://data-seed-prebsc-2-s1.binance.org:8545/",
        "https://data-seed-prebsc-1-s2.binance.org:8545/",
        "https://data-seed-prebsc-2-s2.binance.org:8545/",
        "https://data-seed-prebsc-1-s3.binance.org:8545/",
        "https://data-seed-prebsc-2-s3.binance.org:8545/",
    ],
    pink_lock: Some(address!("0xA188958345E5927E0642E5F31362b4E4F5e064A2")),
    pink_lock_v2: Some(address!("0x47ea46E5690Fb60961A51b77646207D120e554De")),
    pink_lock_genesis: 12_836_610,
    pink_lock_v2_genesis: 19_009_232,
    router: None,
    pool_manager: Some(address!("0x301e08b681FEA29c6F04A8e1Af4a3DcA2ed91ccb")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0xae13d989daC2f0dEbFf460aC112a837C89BAa7cd"),
    stable_coins: BSC_STABLES,
};

static MATIC: ChainConfig = ChainConfig {
    chain_id: 137,
    name: "matic",
    rpcs: &["https://polygon-rpc.com", "https://rpc.ankr.com/polygon"],
    pink_lock: Some(address!("0x5fb71Dbf7248a01bf96cE2AB2DA34EEAbE58c261")),
    pink_lock_v2: None,
    pink_lock_genesis: 17_498_421,
    pink_lock_v2_genesis: 0,
    // QuickSwap
    router: Some(address!("0xa5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff")),
    pool_manager: Some(address!("0x85e833cfbcb9747d81c7Ea43F0732ceAc05A9AE3")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),
    stable_coins: &[
        address!("0xc2132D05D31c914a87C6611C10748AEb04B58e8F"), // USDT
        address!("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), // USDC
    ],
};

static ETH: ChainConfig = ChainConfig {
    chain_id: 1,
    name: "eth",
    rpcs: &["https://rpc.ankr.com/eth"],
    pink_lock: Some(address!("0x33d4cC8716Beb13F814F538Ad3b2de3b036f5e2A")),
    pink_lock_v2: None,
    pink_lock_genesis: 13_515_162,
    pink_lock_v2_genesis: 0,
    // Uniswap v2
    router: Some(address!("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D")),
    pool_manager: Some(address!("0xAd574c1B36cb5F03Eb471A9501c4Ccff8040dD2d")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    stable_coins: &[
        address!("0xdac17f958d2ee523a2206206994597c13d831ec7"), // USDT
        address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), // USDC
    ],
};

static AVAX: ChainConfig = ChainConfig {
    chain_id: 43114,
    name: "avax",
    rpcs: &[
        "https://api.avax.network/ext/bc/C/rpc",
        "https://rpc.ankr.com/avalanche",
        "https://rpc.ankr.com/avalanche-c",
    ],
    pink_lock: Some(address!("0x4DffB05d1Bc222A2852799e2076e956acb589322")),
    pink_lock_v2: None,
    pink_lock_genesis: 7_104_996,
    pink_lock_v2_genesis: 0,
    // Trader Joe
    router: Some(address!("0xEC3452f87CBa05c5a8c3529b6c961779EB77f257")),
    pool_manager: Some(address!("0x72d44aeCf0DbF2485D2eD0dA4189bd9f77bf41B8")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7"),
    stable_coins: &[
        address!("0x9702230A8Ea53601f5cD2dc00fDBc13d4dF4A8c7"), // USDT
        address!("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"), // USDC
    ],
};

static KCC: ChainConfig = ChainConfig {
    chain_id: 321,
    name: "kcc",
    rpcs: &["https://rpc-mainnet.kcc.network"],
    pink_lock: None,
    pink_lock_v2: None,
    pink_lock_genesis: 0,
    pink_lock_v2_genesis: 0,
    // KuSwap
    router: Some(address!("0xa58350d6dee8441aa42754346860e3545cc83cda")),
    pool_manager: Some(address!("0xAd574c1B36cb5F03Eb471A9501c4Ccff8040dD2d")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0x4446Fc4eb47f2f6586f9fAAb68B3498F86C07521"),
    stable_coins: &[
        address!("0x0039f574ee5cc39bdd162e9a88e3eb1f111baf48"), // USDT
    ],
};

static CRONOS: ChainConfig = ChainConfig {
    chain_id: 25,
    name: "cronos",
    rpcs: &["https://evm.cronos.org", "https://evm-cronos.crypto.org", "https://rpc.vvs.finance"],
    pink_lock: Some(address!("0xdD6E31A046b828CbBAfb939C2a394629aff8BBdC")),
    pink_lock_v2: None,
    pink_lock_genesis: 2_143_579,
    pink_lock_v2_genesis: 0,
    // Mad Meerkat Finance
    router: Some(address!("0x145677FC4d9b8F19B5D56d1820c48e0443049a30")),
    pool_manager: Some(address!("0xBE0b139ABc90723Af76a89D3051f60Ba1B64c8d9")),
    backtrack_blocks: DEFAULT_BACKTRACK_BLOCKS,
    native_token: address!("0x5c7f8a570d578ed84e63fdfa7b1ee72deae1ae23"),
    stable_coins: &[
        address!("0x66e428c3f67a68878562e79A0234c1F83c208770"), // USDT
        address!("0xc21223249CA28397B4B6541dfFaEcC539BfF0c59"), // USDC
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_are_unique() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_chain_id(chain.chain_id()), Some(chain));
        }
        assert_eq!(Chain::from_chain_id(250), None);
    }

    #[test]
    fn production_excludes_testnet() {
        let chains = Chain::production();
        assert_eq!(chains.len(), 6);
        assert!(!chains.contains(&Chain::BscTest));
    }

    #[test]
    fn every_chain_has_endpoints() {
        for chain in Chain::ALL {
            assert!(!chain.config().rpcs.is_empty(), "{chain} has no endpoints");
        }
    }

    #[test]
    fn missing_contracts_are_absent() {
        assert_eq!(Chain::Kcc.config().lock_contract(LockVersion::V1), None);
        assert_eq!(Chain::BscTest.config().router, None);
        assert_eq!(Chain::BscTest.config().genesis_block(LockVersion::V2), 19_009_232);
    }
}
