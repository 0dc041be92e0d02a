// 5.0: funding. borrowers of pool liquidity pay a rate proportional to utilisation,
// accrued once per whole interval.
// 5.1 has the pure rate calculation. 5.2 applies it to a pool. 5.3 prices a position.

use crate::config::FundingSchedule;
use crate::events::{EventPayload, UpdateFundingRateEvent};
use crate::math::{self, MathError};
use crate::pool::Pool;
use crate::position::Position;
use crate::types::{Timestamp, FUNDING_RATE_PRECISION};

/// Result of looking at a pool's funding clock without touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingUpdate {
    /// First observation. The clock starts at this interval boundary.
    Bootstrap { last_funding_time: Timestamp },
    /// Less than one full interval since the last accrual.
    Pending,
    Accrue {
        rate_delta: u128,
        intervals: u64,
        last_funding_time: Timestamp,
    },
}

// 5.1: factor * reserved * intervals / pool_amount. partial intervals never count.
pub fn next_funding_rate(schedule: &FundingSchedule, pool: &Pool, now: Timestamp) -> Result<FundingUpdate, MathError> {
    let interval = schedule.interval_secs;
    let last = match pool.last_funding_time {
        None => {
            return Ok(FundingUpdate::Bootstrap {
                last_funding_time: now.floor_to(interval),
            })
        }
        Some(last) => last,
    };

    if interval == 0 || now.as_secs() < last.as_secs().saturating_add(interval) {
        return Ok(FundingUpdate::Pending);
    }

    let intervals = (now.as_secs() - last.as_secs()) / interval;
    let rate_delta = if pool.pool_amount == 0 {
        0
    } else {
        let factor = schedule.factor_for(pool.is_stable());
        let weighted = math::checked_mul(factor, intervals as u128)?;
        math::mul_div(weighted, pool.reserved_amount, pool.pool_amount)?
    };

    Ok(FundingUpdate::Accrue {
        rate_delta,
        intervals,
        last_funding_time: now.floor_to(interval),
    })
}

// 5.2: returns the rate added this call, zero on bootstrap or inside an interval
pub fn accrue_funding(
    schedule: &FundingSchedule,
    pool: &mut Pool,
    now: Timestamp,
    events: &mut Vec<EventPayload>,
) -> Result<u128, MathError> {
    match next_funding_rate(schedule, pool, now)? {
        FundingUpdate::Bootstrap { last_funding_time } => {
            pool.last_funding_time = Some(last_funding_time);
            Ok(0)
        }
        FundingUpdate::Pending => Ok(0),
        FundingUpdate::Accrue {
            rate_delta,
            last_funding_time,
            ..
        } => {
            pool.cumulative_funding_rate = math::checked_add(pool.cumulative_funding_rate, rate_delta)?;
            pool.last_funding_time = Some(last_funding_time);
            events.push(EventPayload::UpdateFundingRate(UpdateFundingRateEvent {
                asset: pool.asset,
                cumulative_funding_rate: pool.cumulative_funding_rate,
            }));
            Ok(rate_delta)
        }
    }
}

// 5.3: USD owed since the position's last snapshot
pub fn position_funding_fee(pool: &Pool, position: &Position) -> Result<u128, MathError> {
    if position.size == 0 {
        return Ok(0);
    }
    let rate_delta = pool.cumulative_funding_rate.saturating_sub(position.entry_funding_rate);
    if rate_delta == 0 {
        return Ok(0);
    }
    math::mul_div(position.size, rate_delta, FUNDING_RATE_PRECISION)
}
