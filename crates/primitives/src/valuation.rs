use alloy_primitives::{Address, U256, U512, utils::format_ether};

/// 18-decimal fixed-point scale.
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Valuations at or below this amount (in native wei) are floored to zero.
pub const DUST_THRESHOLD: U256 = U256::from_limbs([100_000_000_000_000, 0, 0, 0]);

/// Reserves of a token paired against the wrapped native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeReserves {
    /// Pair contract
    pub pair: Address,
    /// Wrapped native asset reserve
    pub native_reserve: U256,
    /// Token reserve
    pub token_reserve: U256,
}

/// Reserve and supply snapshot of an LP pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSnapshot {
    /// Pair contract
    pub pair: Address,
    /// First token of the pair
    pub token0: Address,
    /// Second token of the pair
    pub token1: Address,
    /// Reserve of `token0`
    pub reserve0: U256,
    /// Reserve of `token1`
    pub reserve1: U256,
    /// Total LP token supply
    pub total_supply: U256,
}

/// Asset an LP valuation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denomination {
    /// Wrapped native asset
    Native,
    /// One of the chain's recognised stablecoins
    Stable,
}

impl Denomination {
    /// Whether the valuation counts towards the stablecoin TVL.
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Stable)
    }
}

/// LP valuation with its denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LpQuote {
    /// Value in raw units of the matching side
    pub value: U256,
    /// Side the value is expressed in
    pub denomination: Denomination,
}

/// Value `amount` raw tokens in native units from the pair reserves.
///
/// ```text
/// price = native_reserve * 1e18 / token_reserve
/// gross = price * amount / 1e18
/// value = 0                            if gross <= 1e14
///       = min(gross, native_reserve)   otherwise
/// ```
///
/// Returns `None` when the token side of the pool is empty and no price exists.
pub fn token_value(amount: U256, native_reserve: U256, token_reserve: U256) -> Option<U256> {
    if amount.is_zero() {
        return Some(U256::ZERO);
    }
    if token_reserve.is_zero() {
        return None;
    }

    let wad = U512::from(WAD);
    let price = U512::from(native_reserve) * wad / U512::from(token_reserve);
    let gross = price.saturating_mul(U512::from(amount)) / wad;

    if gross <= U512::from(DUST_THRESHOLD) {
        return Some(U256::ZERO);
    }
    if gross > U512::from(native_reserve) {
        return Some(native_reserve);
    }
    Some(U256::saturating_from(gross))
}

/// Value `amount` LP tokens of `pair`.
///
/// The side matching the wrapped native asset wins, then any recognised stablecoin. The pool is
/// assumed to hold equal value on both sides, so the LP share is worth twice its portion of the
/// matching reserve. Returns `None` when neither side is priceable, the matching reserve is
/// empty, or the pair has no supply.
pub fn lp_value(
    amount: U256,
    pair: &PairSnapshot,
    native_token: Address,
    stable_coins: &[Address],
) -> Option<LpQuote> {
    let (side_reserve, denomination) = if pair.token0 == native_token {
        (pair.reserve0, Denomination::Native)
    } else if pair.token1 == native_token {
        (pair.reserve1, Denomination::Native)
    } else if stable_coins.contains(&pair.token0) {
        (pair.reserve0, Denomination::Stable)
    } else if stable_coins.contains(&pair.token1) {
        (pair.reserve1, Denomination::Stable)
    } else {
        return None;
    };

    if side_reserve.is_zero() || pair.total_supply.is_zero() {
        return None;
    }

    let wad = U512::from(WAD);
    let pool_value = U512::from(side_reserve) * U512::from(2u8) * wad;
    let value =
        (pool_value / U512::from(pair.total_supply)).saturating_mul(U512::from(amount)) / wad;

    Some(LpQuote { value: U256::saturating_from(value), denomination })
}

/// Convert an 18-decimal fixed-point amount into a floating display value.
pub fn to_display(value: U256) -> f64 {
    format_ether(value).parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const NATIVE: Address = address!("0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c");
    const USDT: Address = address!("0x55d398326f99059ff775485246999027b3197955");
    const TOKEN: Address = address!("0x0000000000000000000000000000000000000abc");

    fn ether(n: u64) -> U256 {
        U256::from(n) * WAD
    }

    fn pair(token0: Address, token1: Address, r0: U256, r1: U256, supply: U256) -> PairSnapshot {
        PairSnapshot {
            pair: address!("0x00000000000000000000000000000000000000ff"),
            token0,
            token1,
            reserve0: r0,
            reserve1: r1,
            total_supply: supply,
        }
    }

    #[test]
    fn zero_amount_is_worth_nothing() {
        assert_eq!(token_value(U256::ZERO, U256::from(1000), U256::from(500)), Some(U256::ZERO));
    }

    #[test]
    fn one_token_at_two_native() {
        let value = token_value(ether(1), ether(1000), ether(500)).unwrap();
        assert_eq!(value, ether(2));
        assert_eq!(to_display(value), 2.0);
    }

    #[test]
    fn dust_is_floored() {
        // gross = 1e14 exactly
        let value = token_value(U256::from(100_000_000_000_000u64), ether(1), ether(1));
        assert_eq!(value, Some(U256::ZERO));

        let value = token_value(U256::from(100_000_000_000_001u64), ether(1), ether(1));
        assert_eq!(value, Some(U256::from(100_000_000_000_001u64)));
    }

    #[test]
    fn value_is_capped_at_native_reserve() {
        let value = token_value(ether(1_000_000), ether(10), ether(100)).unwrap();
        assert_eq!(value, ether(10));
    }

    #[test]
    fn empty_token_reserve_is_unpriced() {
        assert_eq!(token_value(ether(1), ether(10), U256::ZERO), None);
    }

    #[test]
    fn value_is_monotonic_and_bounded() {
        let (native, token) = (ether(250), ether(7_000));
        let mut previous = U256::ZERO;
        for step in 0..64u64 {
            let amount = U256::from(step) * ether(37);
            let value = token_value(amount, native, token).unwrap();
            assert!(value >= previous);
            assert!(value <= native);
            previous = value;
        }
    }

    #[test]
    fn oversized_inputs_saturate_at_native_reserve() {
        let value = token_value(U256::MAX, U256::MAX, U256::from(1)).unwrap();
        assert_eq!(value, U256::MAX);
    }

    #[test]
    fn native_paired_lp() {
        let snapshot = pair(NATIVE, TOKEN, ether(100), ether(5_000), ether(1000));
        let quote = lp_value(ether(10), &snapshot, NATIVE, &[USDT]).unwrap();
        assert_eq!(quote.value, ether(2));
        assert_eq!(quote.denomination, Denomination::Native);
        assert_eq!(to_display(quote.value), 2.0);
    }

    #[test]
    fn native_side_wins_over_stable_side() {
        let snapshot = pair(USDT, NATIVE, ether(300), ether(1), ether(10));
        let quote = lp_value(ether(1), &snapshot, NATIVE, &[USDT]).unwrap();
        assert_eq!(quote.denomination, Denomination::Native);
        assert_eq!(quote.value, U256::from(200_000_000_000_000_000u64));
    }

    #[test]
    fn stable_paired_lp() {
        let snapshot = pair(TOKEN, USDT, ether(5), ether(400), ether(20));
        let quote = lp_value(ether(5), &snapshot, NATIVE, &[USDT]).unwrap();
        assert_eq!(quote.denomination, Denomination::Stable);
        assert_eq!(quote.value, ether(200));
    }

    #[test]
    fn unknown_pair_is_unpriced() {
        let other = address!("0x0000000000000000000000000000000000000def");
        let snapshot = pair(TOKEN, other, ether(5), ether(5), ether(5));
        assert_eq!(lp_value(ether(1), &snapshot, NATIVE, &[USDT]), None);
    }

    #[test]
    fn empty_matching_reserve_is_unpriced() {
        let snapshot = pair(NATIVE, TOKEN, U256::ZERO, ether(5), ether(5));
        assert_eq!(lp_value(ether(1), &snapshot, NATIVE, &[USDT]), None);
        let snapshot = pair(NATIVE, TOKEN, ether(5), ether(5), U256::ZERO);
        assert_eq!(lp_value(ether(1), &snapshot, NATIVE, &[USDT]), None);
    }

    #[test]
    fn lp_value_is_linear() {
        let snapshot = pair(NATIVE, TOKEN, ether(123), ether(9), U256::from(777_777_777_777u64));
        for amount in [1u64, 17, 1_000, 987_654_321] {
            let single = lp_value(U256::from(amount), &snapshot, NATIVE, &[]).unwrap().value;
            let double = lp_value(U256::from(amount * 2), &snapshot, NATIVE, &[]).unwrap().value;
            assert!(double >= single * U256::from(2));
            assert!(double - single * U256::from(2) <= U256::from(1));
        }
    }
}
