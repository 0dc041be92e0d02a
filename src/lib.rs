// vault-core: accounting core of a pooled-liquidity leverage vault.
// invariant-first: every mutation is checked and an operation commits all or nothing.
// all computation is deterministic integer fixed point with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, Side, Timestamp, precision constants
//   1.3  math.rs: checked u128 arithmetic and wide mul_div
//   2.x  fees.rs: dynamic mint/burn/swap fees, position fees
//   4.x  position.rs: position struct, key derivation, entry price math
//   5.x  funding.rs: utilisation-based funding accrual
//   6.x  vault.rs: vault state, pool registry, admin capability, aum
//   7.x  config.rs: fee/funding/risk/pool config, env presets
//   8.x  engine/: liquidity, positions, admin, atomic commit
//   9.x  price.rs: oracle and clock traits, unit conversion
//   10.x pool.rs: per asset ledger and its mutators
//   11.x events.rs: state transition events for indexers

// core ledger modules
pub mod engine;
pub mod events;
pub mod fees;
pub mod funding;
pub mod pool;
pub mod position;
pub mod types;
pub mod vault;

// support modules
pub mod config;
pub mod math;
pub mod price;

// re exports for convenience
pub use engine::*;
pub use events::*;
pub use fees::*;
pub use funding::*;
pub use pool::*;
pub use position::*;
pub use types::*;
pub use vault::*;
pub use config::{ConfigError, Environment, FeeSchedule, FundingSchedule, PoolConfig, RiskParams, VaultConfig};
pub use math::MathError;
pub use price::{Clock, FixedClock, OracleSnapshot, PriceError, PriceFeed, SystemClock};
