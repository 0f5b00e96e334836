//! Uniswap v2 style router, factory and pair contracts, plus the ERC-20 getters the indexer
//! needs.
use alloy::primitives::{Address, U256};
use alloy_sol_macro::sol;
use derive_more::derive::Deref;

use crate::DefaultProvider;

use IERC20::IERC20Instance;
use IUniswapV2Factory::IUniswapV2FactoryInstance;
use IUniswapV2Pair::IUniswapV2PairInstance;
use IUniswapV2Router::IUniswapV2RouterInstance;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IUniswapV2Router {
        function factory() external view returns (address);
        function WETH() external view returns (address);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IUniswapV2Factory {
        function getPair(address tokenA, address tokenB) external view returns (address pair);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IUniswapV2Pair {
        function getReserves()
            external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function factory() external view returns (address);
        function totalSupply() external view returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// A wrapper over an AMM router.
#[derive(Debug, Clone, Deref)]
pub struct UniswapRouter(IUniswapV2RouterInstance<DefaultProvider>);

impl UniswapRouter {
    /// Create a new read-only handle at the given contract address.
    pub const fn new_readonly(address: Address, provider: DefaultProvider) -> Self {
        Self(IUniswapV2RouterInstance::new(address, provider))
    }

    /// Wrapped native asset the router trades against.
    pub async fn wrapped_native(&self) -> Result<Address, alloy_contract::Error> {
        self.0.WETH().call().await
    }

    /// Factory creating the router's pairs.
    pub async fn factory_address(&self) -> Result<Address, alloy_contract::Error> {
        self.0.factory().call().await
    }
}

/// A wrapper over an AMM pair factory.
#[derive(Debug, Clone, Deref)]
pub struct UniswapFactory(IUniswapV2FactoryInstance<DefaultProvider>);

impl UniswapFactory {
    /// Create a new read-only handle at the given contract address.
    pub const fn new_readonly(address: Address, provider: DefaultProvider) -> Self {
        Self(IUniswapV2FactoryInstance::new(address, provider))
    }

    /// Pair of `token_a` and `token_b`, or `None` when the factory never created one.
    pub async fn pair_for(
        &self,
        token_a: Address,
        token_b: Address,
    ) -> Result<Option<Address>, alloy_contract::Error> {
        let pair = self.0.getPair(token_a, token_b).call().await?;
        Ok((!pair.is_zero()).then_some(pair))
    }
}

/// A wrapper over an AMM pair, which is also the pair's LP token.
#[derive(Debug, Clone, Deref)]
pub struct UniswapPair(IUniswapV2PairInstance<DefaultProvider>);

impl UniswapPair {
    /// Create a new read-only handle at the given contract address.
    pub const fn new_readonly(address: Address, provider: DefaultProvider) -> Self {
        Self(IUniswapV2PairInstance::new(address, provider))
    }

    /// Current `(reserve0, reserve1)`.
    pub async fn reserves(&self) -> Result<(U256, U256), alloy_contract::Error> {
        let reserves = self.0.getReserves().call().await?;
        Ok((U256::from(reserves.reserve0), U256::from(reserves.reserve1)))
    }

    /// First token of the pair.
    pub async fn first_token(&self) -> Result<Address, alloy_contract::Error> {
        self.0.token0().call().await
    }

    /// Second token of the pair.
    pub async fn second_token(&self) -> Result<Address, alloy_contract::Error> {
        self.0.token1().call().await
    }

    /// Factory that created the pair.
    pub async fn factory_address(&self) -> Result<Address, alloy_contract::Error> {
        self.0.factory().call().await
    }

    /// Total LP token supply.
    pub async fn lp_supply(&self) -> Result<U256, alloy_contract::Error> {
        self.0.totalSupply().call().await
    }
}

/// A wrapper over an ERC-20 token.
#[derive(Debug, Clone, Deref)]
pub struct Erc20(IERC20Instance<DefaultProvider>);

impl Erc20 {
    /// Create a new read-only handle at the given contract address.
    pub const fn new_readonly(address: Address, provider: DefaultProvider) -> Self {
        Self(IERC20Instance::new(address, provider))
    }

    /// Token decimals.
    pub async fn token_decimals(&self) -> Result<u8, alloy_contract::Error> {
        self.0.decimals().call().await
    }

    /// Balance held by `account`.
    pub async fn balance(&self, account: Address) -> Result<U256, alloy_contract::Error> {
        self.0.balanceOf(account).call().await
    }
}
