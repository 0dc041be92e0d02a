// 8.0: engine. coordinates deposits, position increases and admin changes against one
// vault. every operation is atomic and event-driven with no external I/O.

mod admin;
mod config;
mod core;
mod liquidity;
mod positions;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use positions::IncreasePositionRequest;
pub use results::{AddLiquidityResult, EngineError, IncreasePositionResult};
