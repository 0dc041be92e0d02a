// 11.0: every ledger mutation produces an event. indexers rebuild pool state from them,
// so emission order inside one operation follows the order of the mutations.

use crate::position::PositionKey;
use crate::types::{AccountId, AssetId, Side, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Liquidity events
    BuyDebtUnit(BuyDebtUnitEvent),
    AddLiquidity(AddLiquidityEvent),

    // Fee events
    CollectSwapFees(CollectFeesEvent),
    CollectMarginFees(CollectFeesEvent),
    UpdateFundingRate(UpdateFundingRateEvent),

    // Pool accounting events
    IncreaseDebtAmount(AssetAmountEvent),
    DecreaseDebtAmount(AssetAmountEvent),
    IncreasePoolAmount(AssetAmountEvent),
    DecreasePoolAmount(AssetAmountEvent),
    IncreaseReservedAmount(AssetAmountEvent),
    DecreaseReservedAmount(AssetAmountEvent),
    IncreaseGuaranteedUsd(AssetAmountEvent),
    DecreaseGuaranteedUsd(AssetAmountEvent),

    // Position events
    IncreasePosition(IncreasePositionEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyDebtUnitEvent {
    pub receiver: AccountId,
    pub asset: AssetId,
    pub token_amount: u128,
    pub debt_amount: u128,
    pub fee_bps: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidityEvent {
    pub account: AccountId,
    pub asset: AssetId,
    pub amount: u128,
    pub aum_in_debt: u128,
    pub share_supply: u128,
    pub debt_amount: u128,
    pub mint_amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectFeesEvent {
    pub asset: AssetId,
    pub fee_usd: u128,
    pub fee_tokens: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFundingRateEvent {
    pub asset: AssetId,
    pub cumulative_funding_rate: u128,
}

// token amount, debt units or USD depending on the variant carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmountEvent {
    pub asset: AssetId,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreasePositionEvent {
    pub key: PositionKey,
    pub account: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub collateral_delta_usd: u128,
    pub size_delta: u128,
    pub side: Side,
    pub price: u128,
    pub fee_usd: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_payload_tag() {
        let event = Event::new(
            EventId(7),
            Timestamp::from_secs(1_000),
            EventPayload::IncreasePoolAmount(AssetAmountEvent {
                asset: AssetId(2),
                amount: 500,
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("IncreasePoolAmount"));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
