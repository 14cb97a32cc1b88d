//! Decoded, typed domain events.
//!
//! Each event kind mirrors one on-chain event layout of the settlement
//! program. The union is closed: payloads whose discriminator is not in the
//! decode table surface as [`EventKind::Unhandled`] rather than being dropped
//! into an untyped bag.

use crate::domain::{BlockTime, CustodyKey, OwnerKey, PositionKey, Side, Signature, Usd, UsdDelta};
use serde::{Deserialize, Serialize};

/// Back-reference to the ledger record an event was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordContext {
    pub signature: Signature,
    pub block_time: Option<BlockTime>,
}

/// One decoded sub-event, tagged with its originating record's context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub ctx: RecordContext,
    pub kind: EventKind,
}

impl DomainEvent {
    pub fn new(ctx: RecordContext, kind: EventKind) -> Self {
        DomainEvent { ctx, kind }
    }

    /// Block time of the originating record.
    pub fn block_time(&self) -> Option<BlockTime> {
        self.ctx.block_time
    }

    /// Stable kind label, used for dedup keys and logging.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EventKind::IncreasePosition(_) => "increase_position",
            EventKind::DecreasePosition(_) => "decrease_position",
            EventKind::LiquidatePosition(_) => "liquidate_position",
            EventKind::PreSwap(_) => "pre_swap",
            EventKind::PostSwap(_) => "post_swap",
            EventKind::TriggerOrderCreated(_) => "trigger_order_created",
            EventKind::TriggerOrderUpdated(_) => "trigger_order_updated",
            EventKind::LimitOrderFilled(_) => "limit_order_filled",
            EventKind::OrderRequestCreated(_) => "order_request_created",
            EventKind::Unhandled { .. } => "unhandled",
        }
    }

    /// The position slot this event addresses, if the kind carries one.
    /// Swap events are record-scoped and return None.
    pub fn position(&self) -> Option<&PositionKey> {
        match &self.kind {
            EventKind::IncreasePosition(e) => Some(&e.position),
            EventKind::DecreasePosition(e) => Some(&e.position),
            EventKind::LiquidatePosition(e) => Some(&e.position),
            EventKind::TriggerOrderCreated(e) | EventKind::TriggerOrderUpdated(e) => {
                Some(&e.position)
            }
            EventKind::LimitOrderFilled(e) => Some(&e.position),
            EventKind::OrderRequestCreated(e) => Some(&e.position),
            EventKind::PreSwap(_) | EventKind::PostSwap(_) | EventKind::Unhandled { .. } => None,
        }
    }

    /// The owner recorded in the event payload, if the kind carries one.
    pub fn owner(&self) -> Option<&OwnerKey> {
        match &self.kind {
            EventKind::IncreasePosition(e) => Some(&e.owner),
            EventKind::DecreasePosition(e) => Some(&e.owner),
            EventKind::LiquidatePosition(e) => Some(&e.owner),
            EventKind::TriggerOrderCreated(e) | EventKind::TriggerOrderUpdated(e) => {
                Some(&e.owner)
            }
            EventKind::LimitOrderFilled(e) => Some(&e.owner),
            EventKind::OrderRequestCreated(e) => Some(&e.owner),
            EventKind::PreSwap(e) | EventKind::PostSwap(e) => Some(&e.owner),
            EventKind::Unhandled { .. } => None,
        }
    }

    /// True for the three kinds that drive the lifecycle state machine.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self.kind,
            EventKind::IncreasePosition(_)
                | EventKind::DecreasePosition(_)
                | EventKind::LiquidatePosition(_)
        )
    }
}

/// Closed union over the known event kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    IncreasePosition(IncreasePosition),
    DecreasePosition(DecreasePosition),
    LiquidatePosition(LiquidatePosition),
    PreSwap(SwapLeg),
    PostSwap(SwapLeg),
    TriggerOrderCreated(TriggerOrder),
    TriggerOrderUpdated(TriggerOrder),
    LimitOrderFilled(LimitOrderFill),
    OrderRequestCreated(OrderRequest),
    /// A payload whose discriminator is not in the decode table.
    Unhandled { discriminator: [u8; 8] },
}

/// Position opened or increased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreasePosition {
    pub position: PositionKey,
    pub owner: OwnerKey,
    pub custody: CustodyKey,
    pub side: Side,
    pub price: Usd,
    pub size_usd_delta: Usd,
    pub collateral_usd_delta: Usd,
    pub fee_usd: Usd,
}

/// Position decreased (partially or to zero).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreasePosition {
    pub position: PositionKey,
    pub owner: OwnerKey,
    pub custody: CustodyKey,
    pub side: Side,
    pub price: Usd,
    pub size_usd_delta: Usd,
    pub collateral_usd_delta: Usd,
    pub pnl_delta: UsdDelta,
    pub fee_usd: Usd,
}

/// Position force-closed by the liquidation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidatePosition {
    pub position: PositionKey,
    pub owner: OwnerKey,
    pub custody: CustodyKey,
    pub side: Side,
    pub price: Usd,
    pub size_usd: Usd,
    pub collateral_usd: Usd,
    pub pnl_delta: UsdDelta,
    pub fee_usd: Usd,
    pub liquidation_fee_usd: Usd,
}

/// One leg of a collateral swap executed alongside a position change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapLeg {
    pub owner: OwnerKey,
    pub custody_in: CustodyKey,
    pub custody_out: CustodyKey,
    pub amount_in: u64,
    pub amount_out: u64,
}

/// A take-profit / stop-loss order created or updated for a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOrder {
    pub position: PositionKey,
    pub owner: OwnerKey,
    pub order_type: TriggerOrderType,
    pub trigger_price: Usd,
    pub size_usd: Usd,
}

/// A resting limit order filled against the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderFill {
    pub position: PositionKey,
    pub owner: OwnerKey,
    pub price: Usd,
    pub size_usd: Usd,
    pub fee_usd: Usd,
}

/// An execution request queued by the keeper pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub position: PositionKey,
    pub owner: OwnerKey,
    pub request_type: OrderRequestType,
    pub size_usd: Usd,
}

/// Trigger order flavor. The numeric mapping is inferred from observed data,
/// so unknown values are preserved rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOrderType {
    TakeProfit,
    StopLoss,
    Other(u8),
}

impl TriggerOrderType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => TriggerOrderType::TakeProfit,
            1 => TriggerOrderType::StopLoss,
            other => TriggerOrderType::Other(other),
        }
    }
}

impl std::fmt::Display for TriggerOrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerOrderType::TakeProfit => write!(f, "take_profit"),
            TriggerOrderType::StopLoss => write!(f, "stop_loss"),
            TriggerOrderType::Other(v) => write!(f, "other({})", v),
        }
    }
}

/// Request flavor for keeper-queued executions. Same inferred-mapping caveat
/// as [`TriggerOrderType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRequestType {
    Market,
    Trigger,
    Limit,
    Other(u8),
}

impl OrderRequestType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => OrderRequestType::Market,
            1 => OrderRequestType::Trigger,
            2 => OrderRequestType::Limit,
            other => OrderRequestType::Other(other),
        }
    }
}

impl std::fmt::Display for OrderRequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderRequestType::Market => write!(f, "market"),
            OrderRequestType::Trigger => write!(f, "trigger"),
            OrderRequestType::Limit => write!(f, "limit"),
            OrderRequestType::Other(v) => write!(f, "other({})", v),
        }
    }
}
