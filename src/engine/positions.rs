//! Opening and increasing leveraged positions.

use super::core::{Engine, Txn};
use super::results::{EngineError, IncreasePositionResult};
use crate::events::{CollectFeesEvent, EventPayload, IncreasePositionEvent};
use crate::fees;
use crate::funding::{accrue_funding, position_funding_fee};
use crate::math;
use crate::position::{
    leverage_bps, next_average_price, next_global_short_average_price, should_deduct_fee, validate_position,
    Position, PositionError, PositionKey, ProfitWindow,
};
use crate::price::{self, PriceFeed};
use crate::types::{AccountId, AssetId, Side, Timestamp};
use crate::vault::Vault;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreasePositionRequest {
    pub account: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    /// Collateral tokens deposited with the request.
    pub amount_in: u128,
    /// Minimum collateral tokens left after the deposit fee.
    pub min_out: u128,
    pub size_delta: u128,
    pub side: Side,
    /// Worst acceptable mark price.
    pub limit_price: u128,
}

impl Engine {
    pub fn increase_position(
        &mut self,
        request: IncreasePositionRequest,
        oracle: &dyn PriceFeed,
        now: Timestamp,
    ) -> Result<IncreasePositionResult, EngineError> {
        self.transact("increase_position", now, |txn| increase_position(txn, &request, oracle, now))
    }
}

fn validate_tokens(vault: &Vault, request: &IncreasePositionRequest) -> Result<(), EngineError> {
    let collateral = vault.enabled_pool(request.collateral_asset)?;
    let index = vault.enabled_pool(request.index_asset)?;

    match request.side {
        Side::Long => {
            if request.collateral_asset != request.index_asset {
                return Err(EngineError::InvalidPositionTokens("long collateral must be the index asset"));
            }
            if collateral.is_stable() {
                return Err(EngineError::InvalidPositionTokens("long collateral must not be stable"));
            }
        }
        Side::Short => {
            if !collateral.is_stable() {
                return Err(EngineError::InvalidPositionTokens("short collateral must be stable"));
            }
            if index.is_stable() {
                return Err(EngineError::InvalidPositionTokens("short index must not be stable"));
            }
            if !index.config.is_shortable {
                return Err(EngineError::InvalidPositionTokens("index asset is not shortable"));
            }
        }
    }
    Ok(())
}

fn increase_position(
    txn: &mut Txn<'_>,
    request: &IncreasePositionRequest,
    oracle: &dyn PriceFeed,
    now: Timestamp,
) -> Result<IncreasePositionResult, EngineError> {
    if request.amount_in == 0 {
        return Err(EngineError::InvalidAmountIn);
    }
    validate_tokens(&txn.vault, request)?;

    let side = request.side;
    let collateral_asset = request.collateral_asset;
    let size_delta = request.size_delta;

    // mark price against the trader
    let mark_price = match side {
        Side::Long => oracle.max_price(request.index_asset)?,
        Side::Short => oracle.min_price(request.index_asset)?,
    };
    let within_limit = match side {
        Side::Long => mark_price <= request.limit_price,
        Side::Short => mark_price >= request.limit_price,
    };
    if !within_limit {
        return Err(EngineError::PriceOutsideLimit {
            mark: mark_price,
            limit: request.limit_price,
            side,
        });
    }

    let key = PositionKey::derive(request.account, txn.vault.id, collateral_asset, request.index_asset, side);
    let mut position = txn
        .positions
        .get(&key)
        .cloned()
        .unwrap_or_else(|| Position::new(request.account, collateral_asset, request.index_asset, side, mark_price));

    let vault = &mut txn.vault;
    let events = &mut txn.events;
    let fee_schedule = vault.config.fees.clone();
    let funding_schedule = vault.config.funding.clone();
    let risk = vault.config.risk.clone();
    let min_profit_bps = vault.pool(request.index_asset)?.config.min_profit_bps;

    let collateral_min_price = oracle.min_price(collateral_asset)?;
    let collateral_max_price = oracle.max_price(collateral_asset)?;
    let decimals = vault.pool(collateral_asset)?.decimals();

    // deposit fee
    let deposit_usd = price::token_to_usd(request.amount_in, collateral_min_price, decimals)?;
    let deduct = should_deduct_fee(&position, side, deposit_usd, size_delta, risk.increase_position_buffer_bps)?;

    let pool = vault.pool_mut(collateral_asset)?;
    pool.receive_tokens(request.amount_in)?;
    let (after_fee, deposit_fee_tokens) = if deduct {
        fees::apply_fee(request.amount_in, fee_schedule.deposit_fee_bps)?
    } else {
        (request.amount_in, 0)
    };
    if deposit_fee_tokens > 0 {
        pool.collect_fees(deposit_fee_tokens)?;
        events.push(EventPayload::CollectSwapFees(CollectFeesEvent {
            asset: collateral_asset,
            fee_usd: price::token_to_usd(deposit_fee_tokens, collateral_min_price, decimals)?,
            fee_tokens: deposit_fee_tokens,
        }));
    }
    if after_fee < request.min_out {
        return Err(EngineError::InsufficientAmountOut {
            amount: after_fee,
            minimum: request.min_out,
        });
    }

    if size_delta > 0 {
        match side {
            Side::Long => vault.pool(collateral_asset)?.check_global_long_cap(size_delta)?,
            Side::Short => vault.pool(request.index_asset)?.check_global_short_cap(size_delta)?,
        }
    }

    let pool = vault.pool_mut(collateral_asset)?;
    accrue_funding(&funding_schedule, pool, now, events)?;

    if size_delta > 0 {
        let window = ProfitWindow {
            min_profit_time_secs: risk.min_profit_time_secs,
            min_profit_bps,
        };
        position.average_price = next_average_price(
            position.size,
            position.average_price,
            side,
            mark_price,
            size_delta,
            position.last_increased_time,
            window,
            now,
        )?;
    }

    // margin and funding fees come out of collateral
    let margin_fee = fees::position_fee(size_delta, fee_schedule.margin_fee_bps)?;
    let funding_fee = position_funding_fee(pool, &position)?;
    let fee_usd = math::checked_add(margin_fee, funding_fee)?;
    let fee_tokens = price::usd_to_token(fee_usd, collateral_max_price, decimals)?;
    pool.collect_fees(fee_tokens)?;
    events.push(EventPayload::CollectMarginFees(CollectFeesEvent {
        asset: collateral_asset,
        fee_usd,
        fee_tokens,
    }));

    let collateral_delta_usd = price::token_to_usd(after_fee, collateral_min_price, decimals)?;
    let collateral = math::checked_add(position.collateral, collateral_delta_usd)?;
    if collateral == 0 || collateral < fee_usd {
        return Err(PositionError::InsufficientCollateralForFees { collateral, fee: fee_usd }.into());
    }
    position.collateral = collateral - fee_usd;
    position.entry_funding_rate = pool.cumulative_funding_rate;
    position.size = math::checked_add(position.size, size_delta)?;
    position.last_increased_time = now;

    validate_position(position.size, position.collateral)?;
    if position.size > 0 {
        let leverage = leverage_bps(position.size, position.collateral);
        if leverage.map_or(true, |l| l > risk.max_leverage_bps) {
            return Err(PositionError::MaxLeverageExceeded {
                leverage,
                max: risk.max_leverage_bps,
            }
            .into());
        }
    }

    let reserve_delta = price::usd_to_token(size_delta, collateral_max_price, decimals)?;
    position.reserve_amount = math::checked_add(position.reserve_amount, reserve_delta)?;
    pool.increase_reserved_amount(reserve_delta, events)?;

    match side {
        Side::Long => {
            pool.increase_guaranteed_usd(math::checked_add(size_delta, fee_usd)?, events)?;
            pool.decrease_guaranteed_usd(collateral_delta_usd, events)?;
            pool.increase_pool_amount(after_fee, events)?;
            pool.decrease_pool_amount(fee_tokens, events)?;
            pool.increase_global_long_size(size_delta)?;
        }
        Side::Short => {
            if size_delta > 0 {
                let index = vault.pool_mut(request.index_asset)?;
                index.global_short_average_price = if index.global_short_size == 0 {
                    mark_price
                } else {
                    next_global_short_average_price(
                        index.global_short_size,
                        index.global_short_average_price,
                        mark_price,
                        size_delta,
                    )?
                };
                index.increase_global_short_size(size_delta)?;
            }
        }
    }

    events.push(EventPayload::IncreasePosition(IncreasePositionEvent {
        key,
        account: request.account,
        collateral_asset,
        index_asset: request.index_asset,
        collateral_delta_usd,
        size_delta,
        side,
        price: mark_price,
        fee_usd,
    }));

    let result = IncreasePositionResult {
        key,
        mark_price,
        average_price: position.average_price,
        collateral_delta_usd,
        deposit_fee_tokens,
        fee_usd,
        reserve_delta,
    };
    txn.touched = Some((key, position));
    Ok(result)
}
