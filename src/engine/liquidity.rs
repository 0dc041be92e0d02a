//! Deposits: token in, debt units minted against it, liquidity shares minted against those.

use super::core::Engine;
use super::results::{AddLiquidityResult, EngineError};
use crate::events::{AddLiquidityEvent, BuyDebtUnitEvent, CollectFeesEvent, EventPayload};
use crate::fees;
use crate::funding::accrue_funding;
use crate::math;
use crate::price::{self, PriceFeed};
use crate::types::{AccountId, AssetId, Timestamp};
use crate::vault::Vault;

impl Engine {
    /// Deposits `token_amount` and mints debt units against it. Returns the minted amount.
    ///
    /// Called on its own before the first `add_liquidity`, this leaves value in the vault
    /// with no shares outstanding. Every later deposit then mints zero shares and is
    /// rejected, so hosts should only expose it once shares exist.
    pub fn buy_debt_unit(
        &mut self,
        receiver: AccountId,
        asset: AssetId,
        token_amount: u128,
        oracle: &dyn PriceFeed,
        now: Timestamp,
    ) -> Result<u128, EngineError> {
        self.transact("buy_debt_unit", now, |txn| {
            txn.vault.enabled_pool(asset)?;
            txn.vault.pool_mut(asset)?.receive_tokens(token_amount)?;
            buy_debt_unit(&mut txn.vault, receiver, asset, token_amount, oracle, now, &mut txn.events)
        })
    }

    /// Deposits `amount` and mints liquidity shares. Both minimums are exclusive: an
    /// output equal to its minimum is rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &mut self,
        account: AccountId,
        asset: AssetId,
        amount: u128,
        min_debt_out: u128,
        min_share_out: u128,
        oracle: &dyn PriceFeed,
        now: Timestamp,
    ) -> Result<AddLiquidityResult, EngineError> {
        self.transact("add_liquidity", now, |txn| {
            let vault = &mut txn.vault;
            vault.enabled_pool(asset)?;
            if amount == 0 {
                return Err(EngineError::InvalidAmountIn);
            }

            let aum_in_debt = vault.aum_in_debt(oracle, true)?;
            let share_supply = vault.share_supply;

            vault.pool_mut(asset)?.receive_tokens(amount)?;
            let debt_amount = buy_debt_unit(vault, account, asset, amount, oracle, now, &mut txn.events)?;
            if debt_amount <= min_debt_out {
                return Err(EngineError::InsufficientDebtOutput {
                    minted: debt_amount,
                    minimum: min_debt_out,
                });
            }

            let mint_amount = if aum_in_debt == 0 {
                debt_amount
            } else {
                math::mul_div(debt_amount, share_supply, aum_in_debt)?
            };
            if mint_amount <= min_share_out {
                return Err(EngineError::InsufficientShareOutput {
                    minted: mint_amount,
                    minimum: min_share_out,
                });
            }

            vault.mint_shares(mint_amount)?;
            vault.pool_mut(asset)?.last_liquidity_time = Some(now);

            txn.events.push(EventPayload::AddLiquidity(AddLiquidityEvent {
                account,
                asset,
                amount,
                aum_in_debt,
                share_supply,
                debt_amount,
                mint_amount,
            }));

            Ok(AddLiquidityResult {
                debt_amount,
                mint_amount,
                aum_in_debt,
            })
        })
    }
}

// the caller has already credited token_amount to the pool's balance
pub(super) fn buy_debt_unit(
    vault: &mut Vault,
    receiver: AccountId,
    asset: AssetId,
    token_amount: u128,
    oracle: &dyn PriceFeed,
    now: Timestamp,
    events: &mut Vec<EventPayload>,
) -> Result<u128, EngineError> {
    if token_amount == 0 {
        return Err(EngineError::InvalidAmountIn);
    }

    let schedule = vault.config.funding.clone();
    accrue_funding(&schedule, vault.pool_mut(asset)?, now, events)?;

    let price = oracle.min_price(asset)?;
    let decimals = vault.pool(asset)?.decimals();
    let gross_debt = price::token_to_debt(token_amount, price, decimals)?;
    if gross_debt == 0 {
        return Err(EngineError::InvalidAmountIn);
    }

    let fee_bps = fees::buy_fee_basis_points(&vault.fee_context(), vault.pool(asset)?, gross_debt)?;
    let (after_fee, fee_tokens) = fees::apply_fee(token_amount, fee_bps)?;

    let pool = vault.pool_mut(asset)?;
    pool.collect_fees(fee_tokens)?;
    events.push(EventPayload::CollectSwapFees(CollectFeesEvent {
        asset,
        fee_usd: price::token_to_usd(fee_tokens, price, decimals)?,
        fee_tokens,
    }));

    let debt_amount = price::token_to_debt(after_fee, price, decimals)?;
    pool.increase_debt_amount(debt_amount, events)?;
    pool.increase_pool_amount(after_fee, events)?;
    vault.increase_debt_supply(debt_amount)?;

    events.push(EventPayload::BuyDebtUnit(BuyDebtUnitEvent {
        receiver,
        asset,
        token_amount,
        debt_amount,
        fee_bps,
    }));

    Ok(debt_amount)
}
