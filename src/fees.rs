// 2.0 fees.rs: fee basis points for mint, burn, swap and position changes.
// 2.1 one formula drives every path. when dynamic fees are on, an action that moves a
// pool's debt amount toward its target weight earns a rebate, one that moves it away pays a tax.

use crate::config::FeeSchedule;
use crate::math::{self, MathError};
use crate::pool::Pool;
use crate::types::BPS_DIVISOR;

/// Vault-wide inputs the dynamic fee needs alongside the pool itself.
#[derive(Debug, Clone, Copy)]
pub struct FeeContext<'a> {
    pub schedule: &'a FeeSchedule,
    pub debt_supply: u128,
    pub total_weights: u128,
}

impl<'a> FeeContext<'a> {
    pub fn new(schedule: &'a FeeSchedule, debt_supply: u128, total_weights: u128) -> Self {
        Self {
            schedule,
            debt_supply,
            total_weights,
        }
    }
}

/** 2.2: base fee adjusted by how `delta` debt units move the pool against its target */
pub fn dynamic_fee_basis_points(
    ctx: &FeeContext<'_>,
    pool: &Pool,
    base_bps: u128,
    tax_bps: u128,
    delta: u128,
    increment: bool,
) -> Result<u128, MathError> {
    if !ctx.schedule.dynamic_fees {
        return Ok(base_bps);
    }

    let initial = pool.debt_amount;
    let next = if increment {
        math::checked_add(initial, delta)?
    } else {
        initial.saturating_sub(delta)
    };

    let target = pool.target_debt_amount(ctx.debt_supply, ctx.total_weights)?;
    if target == 0 {
        return Ok(base_bps);
    }

    let initial_diff = math::abs_diff(initial, target);
    let next_diff = math::abs_diff(next, target);

    // moving toward target
    if next_diff < initial_diff {
        let rebate = math::mul_div(tax_bps, initial_diff, target)?;
        return Ok(base_bps.saturating_sub(rebate));
    }

    let average_diff = (initial_diff / 2 + next_diff / 2).min(target);
    let tax = math::mul_div(tax_bps, average_diff, target)?;
    math::checked_add(base_bps, tax)
}

pub fn buy_fee_basis_points(ctx: &FeeContext<'_>, pool: &Pool, debt_delta: u128) -> Result<u128, MathError> {
    dynamic_fee_basis_points(
        ctx,
        pool,
        ctx.schedule.mint_burn_fee_bps,
        ctx.schedule.tax_bps,
        debt_delta,
        true,
    )
}

/// Fee for burning `debt_delta` units out of `pool`. No engine path redeems yet; hosts
/// use this to quote burns against the same curve deposits pay.
pub fn sell_fee_basis_points(ctx: &FeeContext<'_>, pool: &Pool, debt_delta: u128) -> Result<u128, MathError> {
    dynamic_fee_basis_points(
        ctx,
        pool,
        ctx.schedule.mint_burn_fee_bps,
        ctx.schedule.tax_bps,
        debt_delta,
        false,
    )
}

/// Fee for swapping `debt_delta` worth of value from `pool_in` to `pool_out`, for hosts
/// quoting swaps. The engine has no swap path of its own.
// the pool receiving tokens moves up, the one paying out moves down. the worse side wins.
pub fn swap_fee_basis_points(
    ctx: &FeeContext<'_>,
    pool_in: &Pool,
    pool_out: &Pool,
    debt_delta: u128,
) -> Result<u128, MathError> {
    let stable_swap = pool_in.is_stable() && pool_out.is_stable();
    let (base_bps, tax_bps) = if stable_swap {
        (ctx.schedule.stable_swap_fee_bps, ctx.schedule.stable_tax_bps)
    } else {
        (ctx.schedule.swap_fee_bps, ctx.schedule.tax_bps)
    };

    let fee_in = dynamic_fee_basis_points(ctx, pool_in, base_bps, tax_bps, debt_delta, true)?;
    let fee_out = dynamic_fee_basis_points(ctx, pool_out, base_bps, tax_bps, debt_delta, false)?;
    Ok(fee_in.max(fee_out))
}

/// Splits `amount` into `(after_fee, fee)`.
pub fn apply_fee(amount: u128, fee_bps: u128) -> Result<(u128, u128), MathError> {
    let kept_bps = math::checked_sub(BPS_DIVISOR, fee_bps)?;
    let after_fee = math::mul_div(amount, kept_bps, BPS_DIVISOR)?;
    Ok((after_fee, amount - after_fee))
}

pub fn position_fee(size_delta: u128, margin_fee_bps: u128) -> Result<u128, MathError> {
    if size_delta == 0 {
        return Ok(0);
    }
    math::mul_div(size_delta, margin_fee_bps, BPS_DIVISOR)
}
