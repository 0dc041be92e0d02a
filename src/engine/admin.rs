//! Capability-gated configuration.

use super::core::Engine;
use super::results::EngineError;
use crate::config::{FeeSchedule, FundingSchedule, PoolConfig, RiskParams};
use crate::types::AssetId;
use crate::vault::AdminCap;
use tracing::info;

impl Engine {
    pub fn create_pool(&mut self, cap: &AdminCap, asset: AssetId, config: PoolConfig) -> Result<(), EngineError> {
        let symbol = config.symbol.clone();
        self.vault.create_pool(cap, asset, config)?;
        info!(%asset, symbol = %symbol, total_weights = %self.vault.total_token_weights, "Pool created");
        Ok(())
    }

    pub fn set_pool_config(&mut self, cap: &AdminCap, asset: AssetId, config: PoolConfig) -> Result<(), EngineError> {
        self.vault.set_pool_config(cap, asset, config)?;
        info!(%asset, total_weights = %self.vault.total_token_weights, "Pool config updated");
        Ok(())
    }

    pub fn set_fees(&mut self, cap: &AdminCap, fees: FeeSchedule) -> Result<(), EngineError> {
        self.vault.set_fees(cap, fees)?;
        info!(fees = ?self.vault.config.fees, "Fee schedule updated");
        Ok(())
    }

    pub fn set_funding_rate(&mut self, cap: &AdminCap, funding: FundingSchedule) -> Result<(), EngineError> {
        self.vault.set_funding_rate(cap, funding)?;
        info!(
            interval_secs = self.vault.config.funding.interval_secs,
            rate_factor = %self.vault.config.funding.rate_factor,
            stable_rate_factor = %self.vault.config.funding.stable_rate_factor,
            "Funding schedule updated"
        );
        Ok(())
    }

    pub fn set_risk_params(&mut self, cap: &AdminCap, risk: RiskParams) -> Result<(), EngineError> {
        self.vault.set_risk_params(cap, risk)?;
        info!(risk = ?self.vault.config.risk, "Risk params updated");
        Ok(())
    }

    /// Sweeps the fee reserve of one pool. Returns the tokens withdrawn.
    pub fn withdraw_fees(&mut self, cap: &AdminCap, asset: AssetId) -> Result<u128, EngineError> {
        let amount = self.vault.withdraw_fees(cap, asset)?;
        info!(%asset, amount = %amount, "Fees withdrawn");
        Ok(amount)
    }
}
