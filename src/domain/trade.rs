//! Reconstructed trade lifecycles.

use crate::domain::{
    BlockTime, CustodyKey, DomainEvent, OwnerKey, PositionKey, Side, Usd, UsdDelta,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity of one reconstructed lifecycle: the reusable position slot plus
/// the ordinal distinguishing successive trades on that slot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId {
    pub position: PositionKey,
    pub ordinal: u64,
}

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.position, self.ordinal)
    }
}

/// Lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Active,
    Closed,
    Liquidated,
}

impl TradeStatus {
    /// True for the two terminal states.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Active)
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeStatus::Active => write!(f, "active"),
            TradeStatus::Closed => write!(f, "closed"),
            TradeStatus::Liquidated => write!(f, "liquidated"),
        }
    }
}

/// One reconstructed open-to-close lifecycle with accumulated derived state.
///
/// Mutated in place by the grouper while active; immutable once terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub owner: OwnerKey,
    pub asset: CustodyKey,
    pub side: Side,
    pub status: TradeStatus,
    pub entry_price: Usd,
    pub exit_price: Option<Usd>,
    /// Current USD size; exactly zero iff the trade is terminated.
    pub current_size: Usd,
    /// Largest size the trade held during its active life.
    pub max_size: Usd,
    pub collateral: Usd,
    pub leverage: Decimal,
    pub cumulative_pnl: UsdDelta,
    /// Realized return on collateral, percent.
    pub roi_pct: Decimal,
    pub cumulative_fees: Usd,
    pub open_time: BlockTime,
    pub close_time: Option<BlockTime>,
    /// Every event attached to this lifecycle, in processing order.
    pub events: Vec<DomainEvent>,
}

impl Trade {
    /// Size divided by collateral. Zero collateral yields zero leverage
    /// rather than a division failure.
    pub fn compute_leverage(size: Usd, collateral: Usd) -> Decimal {
        if collateral.is_zero() {
            return Decimal::ZERO;
        }
        Decimal::from(size.raw()) / Decimal::from(collateral.raw())
    }

    /// Cumulative PnL over collateral, as a percentage.
    pub fn compute_roi_pct(pnl: UsdDelta, collateral: Usd) -> Decimal {
        if collateral.is_zero() {
            return Decimal::ZERO;
        }
        Decimal::from(pnl.raw()) / Decimal::from(collateral.raw()) * Decimal::ONE_HUNDRED
    }

    /// Project into the flat serializable record exposed to reporting layers:
    /// every monetary field appears both as its raw atomic integer and as a
    /// formatted decimal string.
    pub fn to_record(&self) -> TradeRecord {
        TradeRecord {
            position: self.id.position.as_str().to_string(),
            lifecycle_ordinal: self.id.ordinal,
            owner: self.owner.as_str().to_string(),
            asset: self.asset.as_str().to_string(),
            side: self.side.to_string(),
            status: self.status.to_string(),
            entry_price_raw: self.entry_price.raw(),
            entry_price: self.entry_price.to_display(),
            exit_price_raw: self.exit_price.map(|p| p.raw()),
            exit_price: self.exit_price.map(|p| p.to_display()),
            current_size_raw: self.current_size.raw(),
            current_size: self.current_size.to_display(),
            max_size_raw: self.max_size.raw(),
            max_size: self.max_size.to_display(),
            collateral_raw: self.collateral.raw(),
            collateral: self.collateral.to_display(),
            leverage: self.leverage,
            cumulative_pnl_raw: self.cumulative_pnl.raw(),
            cumulative_pnl: self.cumulative_pnl.to_display(),
            roi_pct: self.roi_pct,
            cumulative_fees_raw: self.cumulative_fees.raw(),
            cumulative_fees: self.cumulative_fees.to_display(),
            open_time: self.open_time.as_secs(),
            open_time_utc: self.open_time.to_utc().map(|t| t.to_rfc3339()),
            close_time: self.close_time.map(|t| t.as_secs()),
            close_time_utc: self
                .close_time
                .and_then(|t| t.to_utc())
                .map(|t| t.to_rfc3339()),
            event_count: self.events.len(),
        }
    }
}

/// Flat projection of a [`Trade`] with raw and display monetary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub position: String,
    pub lifecycle_ordinal: u64,
    pub owner: String,
    pub asset: String,
    pub side: String,
    pub status: String,
    pub entry_price_raw: u64,
    pub entry_price: String,
    pub exit_price_raw: Option<u64>,
    pub exit_price: Option<String>,
    pub current_size_raw: u64,
    pub current_size: String,
    pub max_size_raw: u64,
    pub max_size: String,
    pub collateral_raw: u64,
    pub collateral: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub leverage: Decimal,
    pub cumulative_pnl_raw: i64,
    pub cumulative_pnl: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub roi_pct: Decimal,
    pub cumulative_fees_raw: u64,
    pub cumulative_fees: String,
    pub open_time: i64,
    pub open_time_utc: Option<String>,
    pub close_time: Option<i64>,
    pub close_time_utc: Option<String>,
    pub event_count: usize,
}
