// 8.0 engine/core.rs: main engine. owns the vault, the position book and the event log.
// 8.1 every public operation runs through transact(): work happens on a staged copy of
// the vault and of the one position it touches, and only an Ok result is committed.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::config::VaultConfig;
use crate::events::{Event, EventId, EventPayload};
use crate::pool::Pool;
use crate::position::{get_delta, Position, PositionBook, PositionKey, ProfitWindow};
use crate::price::PriceFeed;
use crate::types::{AccountId, AssetId, Side, Timestamp, VaultId};
use crate::vault::{AdminCap, Vault};
use tracing::{debug, warn};

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) vault: Vault,
    pub(super) positions: PositionBook,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
}

/// Staged state for one operation.
pub(super) struct Txn<'a> {
    pub vault: Vault,
    pub positions: &'a PositionBook,
    pub touched: Option<(PositionKey, Position)>,
    pub events: Vec<EventPayload>,
}

impl Engine {
    /// Creates the engine and the only admin capability for its vault.
    pub fn new(id: VaultId, vault_config: VaultConfig) -> Result<(Self, AdminCap), EngineError> {
        Self::with_config(id, vault_config, EngineConfig::default())
    }

    pub fn with_config(
        id: VaultId,
        vault_config: VaultConfig,
        config: EngineConfig,
    ) -> Result<(Self, AdminCap), EngineError> {
        let vault = Vault::new(id, vault_config)?;
        let engine = Self {
            config,
            vault,
            positions: PositionBook::new(),
            events: Vec::new(),
            next_event_id: 1,
        };
        Ok((engine, AdminCap::mint(id)))
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn pool(&self, asset: AssetId) -> Result<&Pool, EngineError> {
        Ok(self.vault.pool(asset)?)
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn position_key(&self, account: AccountId, collateral_asset: AssetId, index_asset: AssetId, side: Side) -> PositionKey {
        PositionKey::derive(account, self.vault.id, collateral_asset, index_asset, side)
    }

    pub fn aum(&self, oracle: &dyn PriceFeed, maximise: bool) -> Result<u128, EngineError> {
        Ok(self.vault.aum(oracle, maximise)?)
    }

    pub fn aum_in_debt(&self, oracle: &dyn PriceFeed, maximise: bool) -> Result<u128, EngineError> {
        Ok(self.vault.aum_in_debt(oracle, maximise)?)
    }

    pub fn share_price(&self, oracle: &dyn PriceFeed) -> Result<u128, EngineError> {
        Ok(self.vault.share_price(oracle)?)
    }

    /// Unrealised (has_profit, USD delta) of a position at the current oracle price.
    pub fn position_delta(
        &self,
        key: &PositionKey,
        oracle: &dyn PriceFeed,
        now: Timestamp,
    ) -> Result<(bool, u128), EngineError> {
        let position = self.positions.get(key).ok_or(EngineError::PositionNotFound(*key))?;
        // exit side of the spread
        let price = match position.side {
            Side::Long => oracle.min_price(position.index_asset)?,
            Side::Short => oracle.max_price(position.index_asset)?,
        };
        let window = ProfitWindow {
            min_profit_time_secs: self.vault.config.risk.min_profit_time_secs,
            min_profit_bps: self.vault.pool(position.index_asset)?.config.min_profit_bps,
        };
        Ok(get_delta(
            position.size,
            position.average_price,
            price,
            position.side,
            position.last_increased_time,
            window,
            now,
        )?)
    }

    pub fn position_leverage(&self, key: &PositionKey) -> Result<Option<u128>, EngineError> {
        let position = self.positions.get(key).ok_or(EngineError::PositionNotFound(*key))?;
        Ok(position.leverage())
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn transact<T, F>(&mut self, op: &'static str, now: Timestamp, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<T, EngineError>,
    {
        let mut txn = Txn {
            vault: self.vault.clone(),
            positions: &self.positions,
            touched: None,
            events: Vec::new(),
        };

        match f(&mut txn) {
            Ok(value) => {
                let Txn {
                    vault, touched, events, ..
                } = txn;
                self.vault = vault;
                if let Some((key, position)) = touched {
                    self.positions.insert(key, position);
                }
                for payload in events {
                    self.emit_event(now, payload);
                }
                Ok(value)
            }
            Err(e) => {
                warn!(op, error = %e, "Operation rejected");
                Err(e)
            }
        }
    }

    pub(super) fn emit_event(&mut self, timestamp: Timestamp, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), timestamp, payload);
        self.next_event_id += 1;

        debug!(id = event.id.0, payload = ?event.payload, "Event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
