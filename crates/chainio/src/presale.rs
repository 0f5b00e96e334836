//! Presale pool manager and pools.
use alloy::primitives::{Address, U256};
use alloy_sol_macro::sol;
use derive_more::derive::Deref;

use crate::DefaultProvider;

use IPool::IPoolInstance;
use IPoolManager::IPoolManagerInstance;

/// `poolState` of a cancelled presale.
pub const POOL_STATE_CANCELLED: u64 = 2;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IPoolManager {
        function getAllPools() external view returns (address[] memory);
        function isPoolGenerated(address pool) external view returns (bool);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IPool {
        function poolState() external view returns (uint256);
        function token() external view returns (address);
    }
}

/// A wrapper over the presale pool manager.
#[derive(Debug, Clone, Deref)]
pub struct PoolManager(IPoolManagerInstance<DefaultProvider>);

impl PoolManager {
    /// Create a new read-only handle at the given contract address.
    pub const fn new_readonly(address: Address, provider: DefaultProvider) -> Self {
        Self(IPoolManagerInstance::new(address, provider))
    }

    /// Every pool ever created by the manager.
    pub async fn all_pools(&self) -> Result<Vec<Address>, alloy_contract::Error> {
        self.0.getAllPools().call().await
    }

    /// Whether `pool` was created by this manager.
    pub async fn is_generated(&self, pool: Address) -> Result<bool, alloy_contract::Error> {
        self.0.isPoolGenerated(pool).call().await
    }
}

/// A wrapper over a single presale pool.
#[derive(Debug, Clone, Deref)]
pub struct PresalePool(IPoolInstance<DefaultProvider>);

impl PresalePool {
    /// Create a new read-only handle at the given contract address.
    pub const fn new_readonly(address: Address, provider: DefaultProvider) -> Self {
        Self(IPoolInstance::new(address, provider))
    }

    /// Whether the presale was cancelled.
    pub async fn is_cancelled(&self) -> Result<bool, alloy_contract::Error> {
        let state = self.0.poolState().call().await?;
        Ok(state == U256::from(POOL_STATE_CANCELLED))
    }

    /// Token sold by the presale, `None` before it is set.
    pub async fn sale_token(&self) -> Result<Option<Address>, alloy_contract::Error> {
        let token = self.0.token().call().await?;
        Ok((!token.is_zero()).then_some(token))
    }
}
