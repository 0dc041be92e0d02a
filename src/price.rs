// 9.0 price.rs: oracle and clock abstractions plus token/USD unit conversion.
//
// The core is agnostic to where prices come from. Operations read each price once and
// keep the value for the rest of the call so all arithmetic sees one observation.

use crate::math::{self, MathError};
use crate::types::{AssetId, Timestamp, DEBT_DECIMALS, PRICE_PRECISION, USD_DECIMALS};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("No price available for {0}")]
    Unavailable(AssetId),

    #[error("Oracle returned a zero price for {0}")]
    ZeroPrice(AssetId),
}

/// Read-only price source. Prices are USD per whole token with `PRICE_PRECISION`.
///
/// `min_price`/`max_price` exist so a spread can be modelled; by default both are the
/// plain oracle price.
pub trait PriceFeed {
    fn price(&self, asset: AssetId) -> Result<u128, PriceError>;

    fn min_price(&self, asset: AssetId) -> Result<u128, PriceError> {
        self.price(asset)
    }

    fn max_price(&self, asset: AssetId) -> Result<u128, PriceError> {
        self.price(asset)
    }
}

/// Fixed set of prices captured at one instant.
#[derive(Debug, Clone, Default)]
pub struct OracleSnapshot {
    prices: HashMap<AssetId, u128>,
}

impl OracleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset: AssetId, price: u128) -> Self {
        self.prices.insert(asset, price);
        self
    }

    pub fn set_price(&mut self, asset: AssetId, price: u128) {
        self.prices.insert(asset, price);
    }
}

impl PriceFeed for OracleSnapshot {
    fn price(&self, asset: AssetId) -> Result<u128, PriceError> {
        match self.prices.get(&asset) {
            None => Err(PriceError::Unavailable(asset)),
            Some(0) => Err(PriceError::ZeroPrice(asset)),
            Some(price) => Ok(*price),
        }
    }
}

pub trait Clock {
    fn unix_seconds(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> Timestamp {
        Timestamp::now()
    }
}

// deterministic clock for simulations and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl FixedClock {
    pub fn advance(&mut self, secs: u64) {
        self.0 = self.0.plus_secs(secs);
    }
}

impl Clock for FixedClock {
    fn unix_seconds(&self) -> Timestamp {
        self.0
    }
}

// amount * 10^to / 10^from
pub fn adjust_for_decimals(amount: u128, from_decimals: u32, to_decimals: u32) -> Result<u128, MathError> {
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    math::mul_div(amount, math::pow10(to_decimals)?, math::pow10(from_decimals)?)
}

pub fn token_to_usd(amount: u128, price: u128, decimals: u32) -> Result<u128, MathError> {
    math::mul_div(amount, price, math::pow10(decimals)?)
}

pub fn usd_to_token(usd: u128, price: u128, decimals: u32) -> Result<u128, MathError> {
    math::mul_div(usd, math::pow10(decimals)?, price)
}

// token amount straight to debt units: amount * price / PRICE_PRECISION, rescaled to 18 decimals
pub fn token_to_debt(amount: u128, price: u128, decimals: u32) -> Result<u128, MathError> {
    let value = math::mul_div(amount, price, PRICE_PRECISION)?;
    adjust_for_decimals(value, decimals, DEBT_DECIMALS)
}

pub fn usd_to_debt(usd: u128) -> Result<u128, MathError> {
    math::mul_div(usd, math::pow10(DEBT_DECIMALS)?, PRICE_PRECISION)
}

// human readable value for logs and reports. None if it does not fit a Decimal.
pub fn to_display(amount: u128, decimals: u32) -> Option<Decimal> {
    let raw = i128::try_from(amount).ok()?;
    Decimal::try_from_i128_with_scale(raw, decimals).ok().map(|d| d.normalize())
}

pub fn usd_display(usd: u128) -> Option<Decimal> {
    to_display(usd, USD_DECIMALS)
}
