//! Turn locked amounts into display valuations using live AMM reserves.

use alloy_primitives::{Address, U256};
use eyre::Result;
use primitives::valuation::{self, Denomination, LpQuote};

use crate::context::ChainContext;

/// Native-denominated value of `amount` raw `token`, `None` if the token cannot be priced.
pub async fn value_token(ctx: &ChainContext, token: Address, amount: U256) -> Result<Option<U256>> {
    let Some(reserves) = ctx.reader.native_reserves(token).await? else {
        return Ok(None);
    };
    Ok(valuation::token_value(amount, reserves.native_reserve, reserves.token_reserve))
}

/// Value of `amount` LP tokens of `pair`, `None` if neither side of the pair is priceable.
pub async fn value_lp(ctx: &ChainContext, pair: Address, amount: U256) -> Result<Option<LpQuote>> {
    let snapshot = ctx.reader.pair_snapshot(pair).await?;
    Ok(valuation::lp_value(amount, &snapshot, ctx.config.native_token, ctx.config.stable_coins))
}

/// Value `amount` of `token`, treating it as an LP pair when `is_lp` is set.
///
/// Plain tokens are always native-denominated.
pub async fn value_any(
    ctx: &ChainContext,
    token: Address,
    amount: U256,
    is_lp: bool,
) -> Result<Option<LpQuote>> {
    if is_lp {
        return value_lp(ctx, token, amount).await;
    }
    Ok(value_token(ctx, token, amount)
        .await?
        .map(|value| LpQuote { value, denomination: Denomination::Native }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChainReader, TestChain, ether};
    use alloy_primitives::address;
    use primitives::valuation::{NativeReserves, PairSnapshot};

    const TOKEN: Address = address!("0x1111111111111111111111111111111111111111");
    const PAIR: Address = address!("0x2222222222222222222222222222222222222222");

    #[tokio::test]
    async fn unpaired_token_is_unpriced() {
        let chain = TestChain::new(FakeChainReader::default());
        assert_eq!(value_token(&chain.ctx, TOKEN, ether(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_uses_native_reserves() {
        let reader = FakeChainReader::default().with_reserves(
            TOKEN,
            NativeReserves { pair: PAIR, native_reserve: ether(1000), token_reserve: ether(500) },
        );
        let chain = TestChain::new(reader);

        let value = value_token(&chain.ctx, TOKEN, ether(1)).await.unwrap();
        assert_eq!(value, Some(ether(2)));
    }

    #[tokio::test]
    async fn stable_paired_lp_is_stable_denominated() {
        let chain_config = config::Chain::Bsc.config();
        let usdt = chain_config.stable_coins[0];
        let reader = FakeChainReader::default().with_pair(PairSnapshot {
            pair: PAIR,
            token0: TOKEN,
            token1: usdt,
            reserve0: ether(10),
            reserve1: ether(100),
            total_supply: ether(1000),
        });
        let chain = TestChain::new(reader);

        let quote = value_any(&chain.ctx, PAIR, ether(10), true).await.unwrap().unwrap();
        assert_eq!(quote.value, ether(2));
        assert!(quote.denomination.is_stable());
    }
}
