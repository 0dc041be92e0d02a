// 4.0: leveraged positions against pooled liquidity. size and collateral in USD.
// 4.1 is the key derivation, 4.2 the entry price math, 4.3 the fee and leverage rules.

use crate::math::{self, MathError};
use crate::types::{AccountId, AssetId, Side, Timestamp, VaultId, BPS_DIVISOR};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("Position has no size but holds {collateral} collateral")]
    ZeroSizeWithCollateral { collateral: u128 },

    #[error("Collateral {collateral} exceeds size {size}")]
    CollateralExceedsSize { size: u128, collateral: u128 },

    #[error("Collateral {collateral} cannot cover fee {fee}")]
    InsufficientCollateralForFees { collateral: u128, fee: u128 },

    #[error("Leverage {leverage:?} bps exceeds max {max} bps")]
    MaxLeverageExceeded { leverage: Option<u128>, max: u128 },

    #[error("Average price cannot be derived")]
    InvalidAveragePrice,

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/** 4.1: opaque 32 byte key. sha256 over the hex encoded identities and the side flag */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionKey(pub [u8; 32]);

impl PositionKey {
    pub fn derive(owner: AccountId, vault: VaultId, collateral_asset: AssetId, index_asset: AssetId, side: Side) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(hex::encode(owner.0.to_be_bytes()));
        hasher.update(hex::encode(vault.0.to_be_bytes()));
        hasher.update(hex::encode(collateral_asset.0.to_be_bytes()));
        hasher.update(hex::encode(index_asset.0.to_be_bytes()));
        hasher.update([side.as_flag()]);
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub owner: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub side: Side,
    pub size: u128,
    pub collateral: u128,
    pub average_price: u128,
    pub entry_funding_rate: u128,
    // collateral tokens reserved in the pool for this position
    pub reserve_amount: u128,
    pub realised_pnl: i128,
    pub last_increased_time: Timestamp,
}

impl Position {
    pub fn new(owner: AccountId, collateral_asset: AssetId, index_asset: AssetId, side: Side, average_price: u128) -> Self {
        Self {
            owner,
            collateral_asset,
            index_asset,
            side,
            size: 0,
            collateral: 0,
            average_price,
            entry_funding_rate: 0,
            reserve_amount: 0,
            realised_pnl: 0,
            last_increased_time: Timestamp::from_secs(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn leverage(&self) -> Option<u128> {
        leverage_bps(self.size, self.collateral)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: HashMap<PositionKey, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn contains(&self, key: &PositionKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn insert(&mut self, key: PositionKey, position: Position) {
        self.positions.insert(key, position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.positions.iter()
    }

    pub fn by_owner(&self, owner: AccountId) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.positions.iter().filter(move |(_, p)| p.owner == owner)
    }
}

pub fn validate_position(size: u128, collateral: u128) -> Result<(), PositionError> {
    if size == 0 {
        if collateral != 0 {
            return Err(PositionError::ZeroSizeWithCollateral { collateral });
        }
        return Ok(());
    }
    if size < collateral {
        return Err(PositionError::CollateralExceedsSize { size, collateral });
    }
    Ok(())
}

// size / collateral in bps. None when there is size but no collateral.
pub fn leverage_bps(size: u128, collateral: u128) -> Option<u128> {
    if collateral == 0 {
        return if size == 0 { Some(0) } else { None };
    }
    math::mul_div(size, BPS_DIVISOR, collateral).ok()
}

/// Grace window after an increase in which small profits are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfitWindow {
    pub min_profit_time_secs: u64,
    pub min_profit_bps: u128,
}

impl ProfitWindow {
    pub fn none() -> Self {
        Self {
            min_profit_time_secs: 0,
            min_profit_bps: 0,
        }
    }
}

/** 4.2: unrealised (has_profit, usd delta) of `size` opened at `average_price` */
pub fn get_delta(
    size: u128,
    average_price: u128,
    price: u128,
    side: Side,
    last_increased_time: Timestamp,
    window: ProfitWindow,
    now: Timestamp,
) -> Result<(bool, u128), PositionError> {
    if average_price == 0 {
        return Err(PositionError::InvalidAveragePrice);
    }
    let price_delta = math::abs_diff(average_price, price);
    let mut delta = math::mul_div(size, price_delta, average_price)?;

    let has_profit = match side {
        Side::Long => price > average_price,
        Side::Short => average_price > price,
    };

    let window_end = last_increased_time.plus_secs(window.min_profit_time_secs);
    let min_bps = if now > window_end { 0 } else { window.min_profit_bps };
    if has_profit && math::checked_mul(delta, BPS_DIVISOR)? <= math::checked_mul(size, min_bps)? {
        delta = 0;
    }

    Ok((has_profit, delta))
}

// mark * (size + delta_size) / divisor, the divisor carrying the unrealised pnl
#[allow(clippy::too_many_arguments)]
pub fn next_average_price(
    size: u128,
    average_price: u128,
    side: Side,
    next_price: u128,
    size_delta: u128,
    last_increased_time: Timestamp,
    window: ProfitWindow,
    now: Timestamp,
) -> Result<u128, PositionError> {
    let (has_profit, delta) = get_delta(size, average_price, next_price, side, last_increased_time, window, now)?;
    let next_size = math::checked_add(size, size_delta)?;

    let widen = matches!((side, has_profit), (Side::Long, true) | (Side::Short, false));
    let divisor = if widen {
        math::checked_add(next_size, delta)?
    } else {
        next_size.checked_sub(delta).ok_or(PositionError::InvalidAveragePrice)?
    };
    if divisor == 0 {
        return Err(PositionError::InvalidAveragePrice);
    }
    Ok(math::mul_div(next_price, next_size, divisor)?)
}

// aggregate entry price of the short book after adding size_delta at next_price.
// a rise in price is a loss for the book and shrinks the divisor.
pub fn next_global_short_average_price(
    global_short_size: u128,
    average_price: u128,
    next_price: u128,
    size_delta: u128,
) -> Result<u128, PositionError> {
    if global_short_size == 0 || average_price == 0 {
        return Ok(next_price);
    }
    let price_delta = math::abs_diff(average_price, next_price);
    let delta = math::mul_div(global_short_size, price_delta, average_price)?;
    let next_size = math::checked_add(global_short_size, size_delta)?;

    let divisor = if next_price > average_price {
        next_size.checked_sub(delta).ok_or(PositionError::InvalidAveragePrice)?
    } else {
        math::checked_add(next_size, delta)?
    };
    if divisor == 0 {
        return Err(PositionError::InvalidAveragePrice);
    }
    Ok(math::mul_div(next_price, next_size, divisor)?)
}

/** 4.3: whether a deposit into an existing long pays the deposit fee.
 * pure collateral top ups always pay. size increases pay only when the deposit
 * lowers leverage by more than the buffer allows. */
pub fn should_deduct_fee(
    position: &Position,
    side: Side,
    collateral_delta_usd: u128,
    size_delta: u128,
    buffer_bps: u128,
) -> Result<bool, MathError> {
    if !side.is_long() {
        return Ok(false);
    }
    if size_delta == 0 {
        return Ok(true);
    }
    if position.size == 0 {
        return Ok(false);
    }
    if position.collateral == 0 {
        return Ok(true);
    }

    let next_size = math::checked_add(position.size, size_delta)?;
    let next_collateral = math::checked_add(position.collateral, collateral_delta_usd)?;
    let prev_leverage = math::mul_div(position.size, BPS_DIVISOR, position.collateral)?;
    let next_leverage = math::mul_div(next_size, BPS_DIVISOR + buffer_bps, next_collateral)?;
    Ok(next_leverage < prev_leverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PRICE_PRECISION, USD_PRECISION};

    const BTC: AssetId = AssetId(1);
    const USDC: AssetId = AssetId(2);

    fn usd(v: u128) -> u128 {
        v * USD_PRECISION
    }

    fn px(v: u128) -> u128 {
        v * PRICE_PRECISION
    }

    fn open_long(size: u128, collateral: u128, average_price: u128) -> Position {
        let mut position = Position::new(AccountId(1), BTC, BTC, Side::Long, average_price);
        position.size = size;
        position.collateral = collateral;
        position
    }

    #[test]
    fn key_is_deterministic_and_distinct() {
        let key = PositionKey::derive(AccountId(1), VaultId(1), BTC, BTC, Side::Long);
        assert_eq!(key, PositionKey::derive(AccountId(1), VaultId(1), BTC, BTC, Side::Long));
        assert_ne!(key, PositionKey::derive(AccountId(1), VaultId(1), BTC, BTC, Side::Short));
        assert_ne!(key, PositionKey::derive(AccountId(2), VaultId(1), BTC, BTC, Side::Long));
        assert_ne!(key, PositionKey::derive(AccountId(1), VaultId(2), BTC, BTC, Side::Long));
        assert_ne!(
            PositionKey::derive(AccountId(1), VaultId(1), USDC, BTC, Side::Short),
            PositionKey::derive(AccountId(1), VaultId(1), USDC, AssetId(3), Side::Short)
        );
        assert_eq!(key.to_hex().len(), 64);
    }

    #[test]
    fn validate_rules() {
        assert!(validate_position(0, 0).is_ok());
        assert!(validate_position(usd(100), usd(100)).is_ok());
        assert_eq!(
            validate_position(0, 1),
            Err(PositionError::ZeroSizeWithCollateral { collateral: 1 })
        );
        assert!(matches!(
            validate_position(usd(10), usd(11)),
            Err(PositionError::CollateralExceedsSize { .. })
        ));
    }

    #[test]
    fn leverage_values() {
        assert_eq!(leverage_bps(usd(1_000), usd(100)), Some(100_000));
        assert_eq!(leverage_bps(0, 0), Some(0));
        assert_eq!(leverage_bps(usd(1), 0), None);
    }

    #[test]
    fn delta_long_and_short() {
        let now = Timestamp::from_secs(10_000);
        let (profit, delta) =
            get_delta(usd(1_000), px(100), px(110), Side::Long, now, ProfitWindow::none(), now).unwrap();
        assert!(profit);
        assert_eq!(delta, usd(100));

        let (profit, delta) =
            get_delta(usd(1_000), px(100), px(110), Side::Short, now, ProfitWindow::none(), now).unwrap();
        assert!(!profit);
        assert_eq!(delta, usd(100));

        assert_eq!(
            get_delta(usd(1), 0, px(1), Side::Long, now, ProfitWindow::none(), now),
            Err(PositionError::InvalidAveragePrice)
        );
    }

    #[test]
    fn delta_min_profit_window() {
        let window = ProfitWindow {
            min_profit_time_secs: 600,
            min_profit_bps: 150,
        };
        let opened = Timestamp::from_secs(1_000);

        // +1% is under the 1.5% floor inside the window
        let (profit, delta) =
            get_delta(usd(1_000), px(100), px(101), Side::Long, opened, window, opened.plus_secs(600)).unwrap();
        assert!(profit);
        assert_eq!(delta, 0);

        // after the window it counts
        let (_, delta) =
            get_delta(usd(1_000), px(100), px(101), Side::Long, opened, window, opened.plus_secs(601)).unwrap();
        assert_eq!(delta, usd(10));

        // losses are never zeroed
        let (profit, delta) =
            get_delta(usd(1_000), px(100), px(99), Side::Long, opened, window, opened).unwrap();
        assert!(!profit);
        assert_eq!(delta, usd(10));
    }

    #[test]
    fn average_price_new_position_is_mark() {
        let now = Timestamp::from_secs(0);
        let avg = next_average_price(0, px(100), Side::Long, px(100), usd(500), now, ProfitWindow::none(), now).unwrap();
        assert_eq!(avg, px(100));
    }

    #[test]
    fn average_price_long_in_profit() {
        let now = Timestamp::from_secs(0);
        // $1,000 at 100, add $1,000 at 110: delta $100, divisor 2,100
        let avg =
            next_average_price(usd(1_000), px(100), Side::Long, px(110), usd(1_000), now, ProfitWindow::none(), now)
                .unwrap();
        assert_eq!(avg, px(110) * 2_000 / 2_100);
        assert!(avg > px(100) && avg < px(110));
    }

    #[test]
    fn average_price_short_in_loss() {
        let now = Timestamp::from_secs(0);
        let avg =
            next_average_price(usd(1_000), px(100), Side::Short, px(110), usd(1_000), now, ProfitWindow::none(), now)
                .unwrap();
        assert_eq!(avg, px(110) * 2_000 / 2_100);
    }

    #[test]
    fn average_price_unchanged_without_size() {
        let now = Timestamp::from_secs(0);
        // long deep under water, no size added: divisor 1,000 - 990 keeps the entry at 100
        let avg = next_average_price(usd(1_000), px(100), Side::Long, px(1), 0, now, ProfitWindow::none(), now).unwrap();
        assert_eq!(avg, px(100));
    }

    #[test]
    fn global_short_first_entry_uses_mark() {
        assert_eq!(next_global_short_average_price(0, 0, px(100), usd(10)).unwrap(), px(100));
    }

    #[test]
    fn global_short_rise_beats_fall() {
        // same size and same distance from the average, mirrored
        let risen = next_global_short_average_price(usd(1_000), px(100), px(110), usd(1_000)).unwrap();
        let fallen = next_global_short_average_price(usd(1_000), px(100), px(90), usd(1_000)).unwrap();

        // rise: 110 * 2000 / 1900, fall: 90 * 2000 / 2100
        assert_eq!(risen, px(110) * 2_000 / 1_900);
        assert_eq!(fallen, px(90) * 2_000 / 2_100);
        assert!(risen > fallen);
    }

    #[test]
    fn deduct_fee_rules() {
        let fresh = Position::new(AccountId(1), BTC, BTC, Side::Long, px(100));
        let short = Position::new(AccountId(1), USDC, BTC, Side::Short, px(100));

        assert!(!should_deduct_fee(&short, Side::Short, usd(10), 0, 100).unwrap());
        assert!(should_deduct_fee(&fresh, Side::Long, usd(10), 0, 100).unwrap());
        assert!(!should_deduct_fee(&fresh, Side::Long, usd(10), usd(100), 100).unwrap());

        // 10x long. adding size with little collateral keeps leverage up, no fee
        let existing = open_long(usd(1_000), usd(100), px(100));
        assert!(!should_deduct_fee(&existing, Side::Long, usd(10), usd(100), 100).unwrap());

        // a large deposit drags leverage well below 10x, fee applies
        assert!(should_deduct_fee(&existing, Side::Long, usd(900), usd(100), 100).unwrap());
    }

    #[test]
    fn book_lookup() {
        let mut book = PositionBook::new();
        let key = PositionKey::derive(AccountId(1), VaultId(1), BTC, BTC, Side::Long);
        book.insert(key, open_long(usd(10), usd(1), px(1)));

        assert!(book.contains(&key));
        assert_eq!(book.len(), 1);
        assert_eq!(book.by_owner(AccountId(1)).count(), 1);
        assert_eq!(book.by_owner(AccountId(2)).count(), 0);
    }

    #[test]
    fn key_serializes() {
        let key = PositionKey::derive(AccountId(9), VaultId(1), BTC, BTC, Side::Long);
        let json = serde_json::to_string(&key).unwrap();
        let back: PositionKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
