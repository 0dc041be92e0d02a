// 7.0 config.rs: all settings in one place. fee schedule, funding schedule, risk params
// and per pool config. everything is serde so hosts can load it from JSON.
// 7.1 bounds are enforced by validate() before any admin change is applied.

use serde::{Deserialize, Serialize};

use crate::types::{BPS_DIVISOR, USD_PRECISION};

pub const MAX_FEE_BPS: u128 = 500;
pub const MIN_FUNDING_INTERVAL_SECS: u64 = 3_600;
pub const MAX_FUNDING_RATE_FACTOR: u128 = 10_000;
pub const MAX_LIQUIDATION_FEE_USD: u128 = 100 * USD_PRECISION;
pub const MIN_LEVERAGE_BPS: u128 = BPS_DIVISOR;
pub const MAX_TOKEN_DECIMALS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Fee {name} of {bps} bps exceeds the {max} bps cap")]
    FeeTooHigh { name: &'static str, bps: u128, max: u128 },

    #[error("Funding interval {interval}s is below the {min}s minimum")]
    FundingIntervalTooShort { interval: u64, min: u64 },

    #[error("Funding rate factor {factor} exceeds {max}")]
    FundingFactorTooHigh { factor: u128, max: u128 },

    #[error("Liquidation fee {fee} USD exceeds {max}")]
    LiquidationFeeTooHigh { fee: u128, max: u128 },

    #[error("Max leverage {leverage} bps is below 1x")]
    InvalidMaxLeverage { leverage: u128 },

    #[error("Invalid pool config: {reason}")]
    InvalidPool { reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/** 7.2: fee settings. all in bps, 100 bps = 1% */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    // Max dynamic adjustment for volatile pools
    pub tax_bps: u128,
    // Max dynamic adjustment for stable pools
    pub stable_tax_bps: u128,
    // Base fee for minting or burning debt units
    pub mint_burn_fee_bps: u128,
    pub swap_fee_bps: u128,
    pub stable_swap_fee_bps: u128,
    // Charged on position size changes
    pub margin_fee_bps: u128,
    // Charged on collateral deposits that lower a long's leverage
    pub deposit_fee_bps: u128,
    pub dynamic_fees: bool,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tax_bps: 50,
            stable_tax_bps: 20,
            mint_burn_fee_bps: 30,
            swap_fee_bps: 30,
            stable_swap_fee_bps: 4,
            margin_fee_bps: 10,
            deposit_fee_bps: 30,
            dynamic_fees: false,
        }
    }
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fees = [
            ("tax", self.tax_bps),
            ("stable_tax", self.stable_tax_bps),
            ("mint_burn_fee", self.mint_burn_fee_bps),
            ("swap_fee", self.swap_fee_bps),
            ("stable_swap_fee", self.stable_swap_fee_bps),
            ("margin_fee", self.margin_fee_bps),
            ("deposit_fee", self.deposit_fee_bps),
        ];
        for (name, bps) in fees {
            if bps > MAX_FEE_BPS {
                return Err(ConfigError::FeeTooHigh { name, bps, max: MAX_FEE_BPS });
            }
        }
        Ok(())
    }
}

/** 7.3: funding accrues once per interval, scaled by pool utilisation */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSchedule {
    pub interval_secs: u64,
    pub rate_factor: u128,
    pub stable_rate_factor: u128,
}

impl Default for FundingSchedule {
    fn default() -> Self {
        Self {
            interval_secs: 3_600,
            rate_factor: 100,
            stable_rate_factor: 100,
        }
    }
}

impl FundingSchedule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs < MIN_FUNDING_INTERVAL_SECS {
            return Err(ConfigError::FundingIntervalTooShort {
                interval: self.interval_secs,
                min: MIN_FUNDING_INTERVAL_SECS,
            });
        }
        for factor in [self.rate_factor, self.stable_rate_factor] {
            if factor > MAX_FUNDING_RATE_FACTOR {
                return Err(ConfigError::FundingFactorTooHigh { factor, max: MAX_FUNDING_RATE_FACTOR });
            }
        }
        Ok(())
    }

    pub fn factor_for(&self, is_stable: bool) -> u128 {
        if is_stable {
            self.stable_rate_factor
        } else {
            self.rate_factor
        }
    }
}

/** 7.4: leverage and position limits */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParams {
    // 500_000 bps = 50x
    pub max_leverage_bps: u128,
    // Ceiling paid to liquidators, USD with USD_PRECISION
    pub liquidation_fee_usd: u128,
    // Window after an increase where small profits do not move the average price
    pub min_profit_time_secs: u64,
    // Extra leverage tolerance before a collateral deposit is charged
    pub increase_position_buffer_bps: u128,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            max_leverage_bps: 500_000,
            liquidation_fee_usd: 5 * USD_PRECISION,
            min_profit_time_secs: 0,
            increase_position_buffer_bps: 100,
        }
    }
}

impl RiskParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_leverage_bps < MIN_LEVERAGE_BPS {
            return Err(ConfigError::InvalidMaxLeverage { leverage: self.max_leverage_bps });
        }
        if self.liquidation_fee_usd > MAX_LIQUIDATION_FEE_USD {
            return Err(ConfigError::LiquidationFeeTooHigh {
                fee: self.liquidation_fee_usd,
                max: MAX_LIQUIDATION_FEE_USD,
            });
        }
        Ok(())
    }
}

/// Per asset pool configuration. Decimals are fixed at pool creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub symbol: String,
    pub decimals: u32,
    /// Target weight relative to `total_token_weights`.
    pub weight: u128,
    pub min_profit_bps: u128,
    /// Debt unit cap, 0 = uncapped.
    pub max_debt_amount: u128,
    pub is_stable: bool,
    pub is_shortable: bool,
    pub enabled: bool,
    /// Tokens kept out of reach of withdrawals.
    pub buffer_amount: u128,
    /// USD caps on open interest, 0 = uncapped.
    pub max_global_long_size: u128,
    pub max_global_short_size: u128,
}

impl PoolConfig {
    pub fn stable(symbol: &str, decimals: u32, weight: u128) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            weight,
            min_profit_bps: 0,
            max_debt_amount: 0,
            is_stable: true,
            is_shortable: false,
            enabled: true,
            buffer_amount: 0,
            max_global_long_size: 0,
            max_global_short_size: 0,
        }
    }

    pub fn volatile(symbol: &str, decimals: u32, weight: u128) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            weight,
            min_profit_bps: 150,
            max_debt_amount: 0,
            is_stable: false,
            is_shortable: true,
            enabled: true,
            buffer_amount: 0,
            max_global_long_size: 0,
            max_global_short_size: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decimals > MAX_TOKEN_DECIMALS {
            return Err(ConfigError::InvalidPool {
                reason: format!("{} decimals exceed {}", self.decimals, MAX_TOKEN_DECIMALS),
            });
        }
        if self.min_profit_bps > BPS_DIVISOR {
            return Err(ConfigError::InvalidPool {
                reason: format!("min profit {} bps exceeds 100%", self.min_profit_bps),
            });
        }
        if self.is_stable && self.is_shortable {
            return Err(ConfigError::InvalidPool {
                reason: "stable assets cannot be shorted".to_string(),
            });
        }
        Ok(())
    }
}

// The complete vault configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    pub fees: FeeSchedule,
    pub funding: FundingSchedule,
    pub risk: RiskParams,
}

impl VaultConfig {
    // low fees, no dynamic adjustment
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.fees.mint_burn_fee_bps = 10;
        config.fees.margin_fee_bps = 5;
        config.risk.max_leverage_bps = 1_000_000; // 100x
        config
    }

    pub fn mainnet_conservative() -> Self {
        let mut config = Self::default();
        config.fees.dynamic_fees = true;
        config.funding.interval_secs = 8 * 3_600;
        config.risk.max_leverage_bps = 300_000; // 30x
        config.risk.min_profit_time_secs = 3 * 3_600;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fees.validate()?;
        self.funding.validate()?;
        self.risk.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> VaultConfig {
        match self {
            Environment::Development => VaultConfig::default(),
            Environment::Testnet => VaultConfig::testnet(),
            Environment::Mainnet => VaultConfig::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_presets_valid() {
        assert!(Environment::Development.config().validate().is_ok());
        assert!(Environment::Testnet.config().validate().is_ok());
        assert!(Environment::Mainnet.config().validate().is_ok());
    }

    #[test]
    fn test_fee_cap() {
        let mut fees = FeeSchedule::default();
        fees.margin_fee_bps = MAX_FEE_BPS;
        assert!(fees.validate().is_ok());

        fees.margin_fee_bps = MAX_FEE_BPS + 1;
        assert!(matches!(
            fees.validate(),
            Err(ConfigError::FeeTooHigh { name: "margin_fee", .. })
        ));
    }

    #[test]
    fn test_funding_bounds() {
        let mut funding = FundingSchedule::default();
        funding.interval_secs = MIN_FUNDING_INTERVAL_SECS - 1;
        assert!(matches!(funding.validate(), Err(ConfigError::FundingIntervalTooShort { .. })));

        let mut funding = FundingSchedule::default();
        funding.stable_rate_factor = MAX_FUNDING_RATE_FACTOR + 1;
        assert!(matches!(funding.validate(), Err(ConfigError::FundingFactorTooHigh { .. })));
    }

    #[test]
    fn test_risk_bounds() {
        let mut risk = RiskParams::default();
        risk.liquidation_fee_usd = MAX_LIQUIDATION_FEE_USD + 1;
        assert!(matches!(risk.validate(), Err(ConfigError::LiquidationFeeTooHigh { .. })));

        let mut risk = RiskParams::default();
        risk.max_leverage_bps = MIN_LEVERAGE_BPS - 1;
        assert!(matches!(risk.validate(), Err(ConfigError::InvalidMaxLeverage { .. })));
    }

    #[test]
    fn test_pool_config_rules() {
        assert!(PoolConfig::stable("USDC", 6, 1).validate().is_ok());
        assert!(PoolConfig::volatile("BTC", 8, 1).validate().is_ok());

        let mut bad = PoolConfig::stable("USDC", 6, 1);
        bad.is_shortable = true;
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidPool { .. })));

        let bad = PoolConfig::volatile("XYZ", 31, 1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = VaultConfig::mainnet_conservative();
        let json = serde_json::to_string(&config).unwrap();
        let back = VaultConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_json_rejects_out_of_bounds() {
        let mut config = VaultConfig::default();
        config.fees.swap_fee_bps = 900;
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(VaultConfig::from_json(&json), Err(ConfigError::FeeTooHigh { .. })));
        assert!(matches!(VaultConfig::from_json("{not json"), Err(ConfigError::Parse(_))));
    }
}
