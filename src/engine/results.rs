// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::math::MathError;
use crate::pool::PoolError;
use crate::position::{PositionError, PositionKey};
use crate::price::PriceError;
use crate::types::Side;
use crate::vault::VaultError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityResult {
    pub debt_amount: u128,
    pub mint_amount: u128,
    // aum before the deposit
    pub aum_in_debt: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreasePositionResult {
    pub key: PositionKey,
    pub mark_price: u128,
    pub average_price: u128,
    pub collateral_delta_usd: u128,
    pub deposit_fee_tokens: u128,
    // margin plus funding, USD
    pub fee_usd: u128,
    pub reserve_delta: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Amount in must be positive")]
    InvalidAmountIn,

    #[error("Minted {minted} debt units, minimum is above {minimum}")]
    InsufficientDebtOutput { minted: u128, minimum: u128 },

    #[error("Minted {minted} shares, minimum is above {minimum}")]
    InsufficientShareOutput { minted: u128, minimum: u128 },

    #[error("Amount after fees {amount} is below minimum {minimum}")]
    InsufficientAmountOut { amount: u128, minimum: u128 },

    #[error("Mark price {mark} is past the {side} limit {limit}")]
    PriceOutsideLimit { mark: u128, limit: u128, side: Side },

    #[error("Invalid position tokens: {0}")]
    InvalidPositionTokens(&'static str),

    #[error("Position {0} not found")]
    PositionNotFound(PositionKey),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}
