// 1.0: all the primitives live here. ids, sides, timestamps and the
// fixed point constants every other module agrees on.
//
// units: token amounts are in the asset's native decimals, prices and USD values use
// PRICE_PRECISION (8 decimals), debt units and liquidity shares use 18 decimals.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const BPS_DIVISOR: u128 = 10_000;
pub const PRICE_PRECISION: u128 = 100_000_000;
pub const USD_PRECISION: u128 = PRICE_PRECISION;
pub const USD_DECIMALS: u32 = 8;
pub const DEBT_DECIMALS: u32 = 18;
pub const SHARE_DECIMALS: u32 = 18;
pub const FUNDING_RATE_PRECISION: u128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account#{}", self.0)
    }
}

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn is_long(&self) -> bool {
        matches!(self, Side::Long)
    }

    // one byte flag used in position key derivation
    pub fn as_flag(&self) -> u8 {
        match self {
            Side::Long => 1,
            Side::Short => 0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

// 1.1: unix timestamp in seconds. the clock oracle hands these out once per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    // floor to the start of the interval this timestamp falls in
    pub fn floor_to(&self, interval_secs: u64) -> Self {
        if interval_secs == 0 {
            return *self;
        }
        Self(self.0 / interval_secs * interval_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
