//! Domain types for perpetual-futures position-history reconstruction.
//!
//! This module provides:
//! - Fixed-point atomic USD amounts with canonical display strings
//! - Domain primitives: BlockTime, Signature, PositionKey, OwnerKey, Side
//! - Raw ledger records and the decoded event union
//! - Reconstructed Trade lifecycles with a flat serializable projection
//! - Stable event ordering for deterministic grouping

pub mod event;
pub mod money;
pub mod ordering;
pub mod primitives;
pub mod record;
pub mod trade;

pub use event::{
    DecreasePosition, DomainEvent, EventKind, IncreasePosition, LimitOrderFill, LiquidatePosition,
    OrderRequest, OrderRequestType, RecordContext, SwapLeg, TriggerOrder, TriggerOrderType,
};
pub use money::{Usd, UsdDelta, USD_DECIMALS, USD_SCALE};
pub use ordering::{sort_events_deterministic, EventOrderingKey};
pub use primitives::{BlockTime, CustodyKey, OwnerKey, PositionKey, Side, Signature};
pub use record::RawRecord;
pub use trade::{Trade, TradeId, TradeRecord, TradeStatus};
