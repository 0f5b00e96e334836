//! `ChainIO` is a library for interacting with the locking, AMM and presale contracts.
pub mod amm;
pub mod pinklock;
pub mod presale;

use alloy::{
    providers::{
        ProviderBuilder, RootProvider, fillers::FillProvider, utils::JoinedRecommendedFillers,
    },
    rpc::client::ClientBuilder,
};
use network::retries::DEFAULT_RETRY_LAYER;
use url::Url;

pub use amm::{Erc20, UniswapFactory, UniswapPair, UniswapRouter};
pub use pinklock::PinkLock;
pub use presale::{PoolManager, PresalePool};

/// Alias to the default provider with all recommended fillers (read-only).
pub type DefaultProvider = FillProvider<JoinedRecommendedFillers, RootProvider>;

/// Build an HTTP provider for `url` with the default transport retry policy.
pub fn http_provider(url: Url) -> DefaultProvider {
    let client = ClientBuilder::default().layer(DEFAULT_RETRY_LAYER).http(url);
    ProviderBuilder::new().connect_client(client)
}
