//! Per asset pool ledger.
//!
//! A pool holds the physical token balance for one asset plus every accounting counter
//! the vault keeps against it. The mutators here are the only way those counters move;
//! each one checks its invariant and records an event so a failed check aborts the
//! whole operation before anything is committed.

use crate::config::PoolConfig;
use crate::events::{AssetAmountEvent, EventPayload};
use crate::math::{self, MathError};
use crate::types::{AssetId, Timestamp, BPS_DIVISOR};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Debt amount {next} for {asset} would exceed cap {max}")]
    MaxDebtExceeded { asset: AssetId, next: u128, max: u128 },

    #[error("Pool amount {pool_amount} for {asset} would exceed token balance {balance}")]
    PoolExceedsBalance { asset: AssetId, pool_amount: u128, balance: u128 },

    #[error("Pool amount for {asset} is {available}, cannot remove {requested}")]
    InsufficientPoolAmount { asset: AssetId, available: u128, requested: u128 },

    #[error("Reserved {reserved} for {asset} would exceed pool amount {pool_amount}")]
    ReserveExceedsPool { asset: AssetId, reserved: u128, pool_amount: u128 },

    #[error("Reserved amount for {asset} is {reserved}, cannot release {requested}")]
    InsufficientReserve { asset: AssetId, reserved: u128, requested: u128 },

    #[error("Global long size {next} for {asset} would exceed cap {max}")]
    MaxGlobalLongsExceeded { asset: AssetId, next: u128, max: u128 },

    #[error("Global short size {next} for {asset} would exceed cap {max}")]
    MaxGlobalShortsExceeded { asset: AssetId, next: u128, max: u128 },

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub asset: AssetId,
    pub config: PoolConfig,
    /// Tokens physically held, including fee reserve.
    pub token_balance: u128,
    /// Debt units minted against this asset.
    pub debt_amount: u128,
    /// Tokens deposited into the pool's accounting.
    pub pool_amount: u128,
    /// Tokens set aside for open positions.
    pub reserved_amount: u128,
    /// Long notional minus long collateral, USD.
    pub guaranteed_usd: u128,
    pub cumulative_funding_rate: u128,
    /// `None` until the first funding accrual.
    pub last_funding_time: Option<Timestamp>,
    pub fee_reserve: u128,
    pub global_long_size: u128,
    pub global_short_size: u128,
    pub global_short_average_price: u128,
    pub last_liquidity_time: Option<Timestamp>,
}

impl Pool {
    pub fn new(asset: AssetId, config: PoolConfig) -> Self {
        Self {
            asset,
            config,
            token_balance: 0,
            debt_amount: 0,
            pool_amount: 0,
            reserved_amount: 0,
            guaranteed_usd: 0,
            cumulative_funding_rate: 0,
            last_funding_time: None,
            fee_reserve: 0,
            global_long_size: 0,
            global_short_size: 0,
            global_short_average_price: 0,
            last_liquidity_time: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_stable(&self) -> bool {
        self.config.is_stable
    }

    pub fn decimals(&self) -> u32 {
        self.config.decimals
    }

    pub fn receive_tokens(&mut self, amount: u128) -> Result<(), PoolError> {
        self.token_balance = math::checked_add(self.token_balance, amount)?;
        Ok(())
    }

    pub fn collect_fees(&mut self, fee_tokens: u128) -> Result<(), PoolError> {
        self.fee_reserve = math::checked_add(self.fee_reserve, fee_tokens)?;
        Ok(())
    }

    // drains the fee reserve out of the physical balance
    pub fn withdraw_fees(&mut self) -> Result<u128, PoolError> {
        let amount = self.fee_reserve;
        self.token_balance = math::checked_sub(self.token_balance, amount)?;
        self.fee_reserve = 0;
        Ok(amount)
    }

    pub fn increase_debt_amount(&mut self, amount: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        let next = math::checked_add(self.debt_amount, amount)?;
        let max = self.config.max_debt_amount;
        if max > 0 && next > max {
            return Err(PoolError::MaxDebtExceeded { asset: self.asset, next, max });
        }
        self.debt_amount = next;
        events.push(EventPayload::IncreaseDebtAmount(self.amount_event(amount)));
        Ok(())
    }

    // floors at zero, rounding on burns can leave the counter a few units short
    pub fn decrease_debt_amount(&mut self, amount: u128, events: &mut Vec<EventPayload>) {
        let removed = amount.min(self.debt_amount);
        self.debt_amount -= removed;
        events.push(EventPayload::DecreaseDebtAmount(self.amount_event(removed)));
    }

    pub fn increase_pool_amount(&mut self, amount: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        let next = math::checked_add(self.pool_amount, amount)?;
        if next > self.token_balance {
            return Err(PoolError::PoolExceedsBalance {
                asset: self.asset,
                pool_amount: next,
                balance: self.token_balance,
            });
        }
        self.pool_amount = next;
        events.push(EventPayload::IncreasePoolAmount(self.amount_event(amount)));
        Ok(())
    }

    pub fn decrease_pool_amount(&mut self, amount: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        let next = self.pool_amount.checked_sub(amount).ok_or(PoolError::InsufficientPoolAmount {
            asset: self.asset,
            available: self.pool_amount,
            requested: amount,
        })?;
        if self.reserved_amount > next {
            return Err(PoolError::ReserveExceedsPool {
                asset: self.asset,
                reserved: self.reserved_amount,
                pool_amount: next,
            });
        }
        self.pool_amount = next;
        events.push(EventPayload::DecreasePoolAmount(self.amount_event(amount)));
        Ok(())
    }

    pub fn increase_reserved_amount(&mut self, amount: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        let next = math::checked_add(self.reserved_amount, amount)?;
        if next > self.pool_amount {
            return Err(PoolError::ReserveExceedsPool {
                asset: self.asset,
                reserved: next,
                pool_amount: self.pool_amount,
            });
        }
        self.reserved_amount = next;
        events.push(EventPayload::IncreaseReservedAmount(self.amount_event(amount)));
        Ok(())
    }

    pub fn decrease_reserved_amount(&mut self, amount: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        self.reserved_amount = self.reserved_amount.checked_sub(amount).ok_or(PoolError::InsufficientReserve {
            asset: self.asset,
            reserved: self.reserved_amount,
            requested: amount,
        })?;
        events.push(EventPayload::DecreaseReservedAmount(self.amount_event(amount)));
        Ok(())
    }

    pub fn increase_guaranteed_usd(&mut self, usd: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        self.guaranteed_usd = math::checked_add(self.guaranteed_usd, usd)?;
        events.push(EventPayload::IncreaseGuaranteedUsd(self.amount_event(usd)));
        Ok(())
    }

    pub fn decrease_guaranteed_usd(&mut self, usd: u128, events: &mut Vec<EventPayload>) -> Result<(), PoolError> {
        self.guaranteed_usd = math::checked_sub(self.guaranteed_usd, usd)?;
        events.push(EventPayload::DecreaseGuaranteedUsd(self.amount_event(usd)));
        Ok(())
    }

    pub fn check_global_long_cap(&self, size_delta: u128) -> Result<(), PoolError> {
        let next = math::checked_add(self.global_long_size, size_delta)?;
        let max = self.config.max_global_long_size;
        if max > 0 && next > max {
            return Err(PoolError::MaxGlobalLongsExceeded { asset: self.asset, next, max });
        }
        Ok(())
    }

    pub fn check_global_short_cap(&self, size_delta: u128) -> Result<(), PoolError> {
        let next = math::checked_add(self.global_short_size, size_delta)?;
        let max = self.config.max_global_short_size;
        if max > 0 && next > max {
            return Err(PoolError::MaxGlobalShortsExceeded { asset: self.asset, next, max });
        }
        Ok(())
    }

    pub fn increase_global_long_size(&mut self, size_delta: u128) -> Result<(), PoolError> {
        self.check_global_long_cap(size_delta)?;
        self.global_long_size += size_delta;
        Ok(())
    }

    pub fn decrease_global_long_size(&mut self, size_delta: u128) {
        self.global_long_size = self.global_long_size.saturating_sub(size_delta);
    }

    pub fn increase_global_short_size(&mut self, size_delta: u128) -> Result<(), PoolError> {
        self.check_global_short_cap(size_delta)?;
        self.global_short_size += size_delta;
        Ok(())
    }

    pub fn decrease_global_short_size(&mut self, size_delta: u128) {
        self.global_short_size = self.global_short_size.saturating_sub(size_delta);
    }

    /// Debt units this pool should carry given its weight.
    pub fn target_debt_amount(&self, debt_supply: u128, total_weights: u128) -> Result<u128, MathError> {
        if debt_supply == 0 || total_weights == 0 {
            return Ok(0);
        }
        math::mul_div(self.config.weight, debt_supply, total_weights)
    }

    /// Tokens not reserved and not held back as buffer.
    pub fn available_amount(&self) -> u128 {
        self.pool_amount
            .saturating_sub(self.reserved_amount)
            .saturating_sub(self.config.buffer_amount)
    }

    pub fn utilization_bps(&self) -> u128 {
        if self.pool_amount == 0 {
            return 0;
        }
        self.reserved_amount.saturating_mul(BPS_DIVISOR) / self.pool_amount
    }

    fn amount_event(&self, amount: u128) -> AssetAmountEvent {
        AssetAmountEvent {
            asset: self.asset,
            amount,
        }
    }
}
