// 6.0 vault.rs: global configuration, supply counters and the pool registry.
// 6.1 admin changes require an AdminCap minted for this vault.
// 6.2 aum is the USD value backing outstanding liquidity shares.

use crate::config::{ConfigError, FeeSchedule, FundingSchedule, PoolConfig, RiskParams, VaultConfig};
use crate::fees::FeeContext;
use crate::math::{self, MathError};
use crate::pool::{Pool, PoolError};
use crate::price::{self, PriceError, PriceFeed};
use crate::types::{AssetId, VaultId, PRICE_PRECISION, SHARE_DECIMALS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("Admin capability for vault {got:?} cannot administer vault {expected:?}")]
    Unauthorized { expected: VaultId, got: VaultId },

    #[error("Pool for {0} not found")]
    PoolNotFound(AssetId),

    #[error("Pool for {0} already exists")]
    PoolAlreadyExists(AssetId),

    #[error("Pool for {0} is not enabled")]
    PoolNotEnabled(AssetId),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Proof of admin authority over one vault. Only the engine mints these and they
/// cannot be cloned.
#[derive(Debug)]
pub struct AdminCap {
    vault: VaultId,
}

impl AdminCap {
    pub(crate) fn mint(vault: VaultId) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> VaultId {
        self.vault
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: VaultId,
    pub config: VaultConfig,
    pub share_supply: u128,
    pub debt_supply: u128,
    pub total_token_weights: u128,
    pools: HashMap<AssetId, Pool>,
}

impl Vault {
    pub fn new(id: VaultId, config: VaultConfig) -> Result<Self, VaultError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            share_supply: 0,
            debt_supply: 0,
            total_token_weights: 0,
            pools: HashMap::new(),
        })
    }

    pub fn pool(&self, asset: AssetId) -> Result<&Pool, VaultError> {
        self.pools.get(&asset).ok_or(VaultError::PoolNotFound(asset))
    }

    pub fn pool_mut(&mut self, asset: AssetId) -> Result<&mut Pool, VaultError> {
        self.pools.get_mut(&asset).ok_or(VaultError::PoolNotFound(asset))
    }

    pub fn enabled_pool(&self, asset: AssetId) -> Result<&Pool, VaultError> {
        let pool = self.pool(asset)?;
        if !pool.is_enabled() {
            return Err(VaultError::PoolNotEnabled(asset));
        }
        Ok(pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn fee_context(&self) -> FeeContext<'_> {
        FeeContext::new(&self.config.fees, self.debt_supply, self.total_token_weights)
    }

    pub fn increase_debt_supply(&mut self, amount: u128) -> Result<(), VaultError> {
        self.debt_supply = math::checked_add(self.debt_supply, amount)?;
        Ok(())
    }

    pub fn mint_shares(&mut self, amount: u128) -> Result<(), VaultError> {
        self.share_supply = math::checked_add(self.share_supply, amount)?;
        Ok(())
    }

    // 6.1: admin

    pub fn check_admin(&self, cap: &AdminCap) -> Result<(), VaultError> {
        if cap.vault != self.id {
            return Err(VaultError::Unauthorized {
                expected: self.id,
                got: cap.vault,
            });
        }
        Ok(())
    }

    pub fn create_pool(&mut self, cap: &AdminCap, asset: AssetId, config: PoolConfig) -> Result<(), VaultError> {
        self.check_admin(cap)?;
        if self.pools.contains_key(&asset) {
            return Err(VaultError::PoolAlreadyExists(asset));
        }
        config.validate()?;

        self.total_token_weights = math::checked_add(self.total_token_weights, config.weight)?;
        self.pools.insert(asset, Pool::new(asset, config));
        Ok(())
    }

    pub fn set_pool_config(&mut self, cap: &AdminCap, asset: AssetId, config: PoolConfig) -> Result<(), VaultError> {
        self.check_admin(cap)?;
        config.validate()?;
        let pool = self.pools.get(&asset).ok_or(VaultError::PoolNotFound(asset))?;
        if pool.config.decimals != config.decimals {
            return Err(ConfigError::InvalidPool {
                reason: format!(
                    "decimals are fixed at {} for {}, got {}",
                    pool.config.decimals, asset, config.decimals
                ),
            }
            .into());
        }

        let without_old = math::checked_sub(self.total_token_weights, pool.config.weight)?;
        self.total_token_weights = math::checked_add(without_old, config.weight)?;
        self.pool_mut(asset)?.config = config;
        Ok(())
    }

    pub fn set_fees(&mut self, cap: &AdminCap, fees: FeeSchedule) -> Result<(), VaultError> {
        self.check_admin(cap)?;
        fees.validate()?;
        self.config.fees = fees;
        Ok(())
    }

    pub fn set_funding_rate(&mut self, cap: &AdminCap, funding: FundingSchedule) -> Result<(), VaultError> {
        self.check_admin(cap)?;
        funding.validate()?;
        self.config.funding = funding;
        Ok(())
    }

    pub fn set_risk_params(&mut self, cap: &AdminCap, risk: RiskParams) -> Result<(), VaultError> {
        self.check_admin(cap)?;
        risk.validate()?;
        self.config.risk = risk;
        Ok(())
    }

    pub fn withdraw_fees(&mut self, cap: &AdminCap, asset: AssetId) -> Result<u128, VaultError> {
        self.check_admin(cap)?;
        Ok(self.pool_mut(asset)?.withdraw_fees()?)
    }

    // 6.2: aum

    /// USD value of the pools net of what open positions are owed.
    ///
    /// Stable pools count at oracle value. Other pools count guaranteed USD plus their
    /// unreserved tokens, and the short book's unrealised pnl: losses owed to the pool
    /// are added, profits owed to traders are subtracted, floored at zero.
    pub fn aum(&self, oracle: &dyn PriceFeed, maximise: bool) -> Result<u128, VaultError> {
        let mut aum: u128 = 0;
        let mut short_profits: u128 = 0;

        for pool in self.pools.values() {
            if pool.pool_amount == 0 && pool.global_short_size == 0 && pool.guaranteed_usd == 0 {
                continue;
            }
            let price = if maximise {
                oracle.max_price(pool.asset)?
            } else {
                oracle.min_price(pool.asset)?
            };
            let decimals = pool.decimals();

            if pool.is_stable() {
                aum = math::checked_add(aum, price::token_to_usd(pool.pool_amount, price, decimals)?)?;
                continue;
            }

            if pool.global_short_size > 0 && pool.global_short_average_price > 0 {
                let average = pool.global_short_average_price;
                let price_delta = math::abs_diff(average, price);
                let delta = math::mul_div(pool.global_short_size, price_delta, average)?;
                if average > price {
                    short_profits = math::checked_add(short_profits, delta)?;
                } else {
                    aum = math::checked_add(aum, delta)?;
                }
            }

            aum = math::checked_add(aum, pool.guaranteed_usd)?;
            let unreserved = math::checked_sub(pool.pool_amount, pool.reserved_amount)?;
            aum = math::checked_add(aum, price::token_to_usd(unreserved, price, decimals)?)?;
        }

        Ok(aum.saturating_sub(short_profits))
    }

    pub fn aum_in_debt(&self, oracle: &dyn PriceFeed, maximise: bool) -> Result<u128, VaultError> {
        Ok(price::usd_to_debt(self.aum(oracle, maximise)?)?)
    }

    /// USD per whole share, 1.0 before the first mint.
    pub fn share_price(&self, oracle: &dyn PriceFeed) -> Result<u128, VaultError> {
        if self.share_supply == 0 {
            return Ok(PRICE_PRECISION);
        }
        let aum = self.aum(oracle, true)?;
        Ok(math::mul_div(aum, math::pow10(SHARE_DECIMALS)?, self.share_supply)?)
    }
}
