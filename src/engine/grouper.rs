//! Lifecycle grouping state machine.
//!
//! Consumes a time-ordered event sequence for one owner and partitions it
//! into trade lifecycles despite position-slot reuse. State is held in
//! explicit maps owned by the grouper, so re-running the same sorted input
//! always produces identical output.

use crate::domain::{
    DomainEvent, EventKind, PositionKey, Trade, TradeId, TradeStatus, Usd,
};
use crate::error::ConsistencyWarning;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Output of one grouping pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTrades {
    /// Trades still open at the end of the window, ordered by position key.
    pub active: Vec<Trade>,
    /// Terminated trades, most recently closed first.
    pub completed: Vec<Trade>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Partitions a sorted event stream into trade lifecycles.
///
/// At most one trade is active per position slot; the per-slot ordinal
/// increments only when a trade terminates, never on a partial decrease.
pub struct LifecycleGrouper {
    active: BTreeMap<PositionKey, Trade>,
    ordinals: BTreeMap<PositionKey, u64>,
    completed: Vec<Trade>,
    warnings: Vec<ConsistencyWarning>,
    /// Block time -> trade touched by a lifecycle event at that time. Used to
    /// attach same-transaction auxiliary events (swaps in particular).
    touched_at: HashMap<i64, TradeId>,
    /// Dedup for auxiliary attachments, keyed by (trade, signature, kind).
    attached: HashSet<(TradeId, String, &'static str)>,
}

impl LifecycleGrouper {
    pub fn new() -> Self {
        Self {
            active: BTreeMap::new(),
            ordinals: BTreeMap::new(),
            completed: Vec::new(),
            warnings: Vec::new(),
            touched_at: HashMap::new(),
            attached: HashSet::new(),
        }
    }

    /// Group a pre-sorted event sequence. Callers must sort with
    /// [`crate::domain::sort_events_deterministic`] first.
    pub fn run(events: &[DomainEvent]) -> GroupedTrades {
        let mut grouper = Self::new();
        for event in events {
            grouper.apply(event);
        }
        grouper.finish()
    }

    /// Apply one event to the state machine.
    pub fn apply(&mut self, event: &DomainEvent) {
        let Some(time) = event.block_time() else {
            self.warnings.push(ConsistencyWarning::MissingBlockTime {
                signature: event.ctx.signature.clone(),
            });
            return;
        };
        let time_secs = time.as_secs();

        match &event.kind {
            EventKind::IncreasePosition(e) => {
                if let Some(trade) = self.active.get_mut(&e.position) {
                    trade.current_size += e.size_usd_delta;
                    trade.collateral += e.collateral_usd_delta;
                    trade.leverage = Trade::compute_leverage(trade.current_size, trade.collateral);
                    if trade.current_size > trade.max_size {
                        trade.max_size = trade.current_size;
                    }
                    trade.cumulative_fees += e.fee_usd;
                    trade.events.push(event.clone());
                    self.touched_at.insert(time_secs, trade.id.clone());
                } else {
                    let ordinal = self.ordinals.get(&e.position).copied().unwrap_or(0);
                    let id = TradeId {
                        position: e.position.clone(),
                        ordinal,
                    };
                    let trade = Trade {
                        id: id.clone(),
                        owner: e.owner.clone(),
                        asset: e.custody.clone(),
                        side: e.side,
                        status: TradeStatus::Active,
                        entry_price: e.price,
                        exit_price: None,
                        current_size: e.size_usd_delta,
                        max_size: e.size_usd_delta,
                        collateral: e.collateral_usd_delta,
                        leverage: Trade::compute_leverage(
                            e.size_usd_delta,
                            e.collateral_usd_delta,
                        ),
                        cumulative_pnl: Default::default(),
                        roi_pct: Default::default(),
                        cumulative_fees: e.fee_usd,
                        open_time: time,
                        close_time: None,
                        events: vec![event.clone()],
                    };
                    self.touched_at.insert(time_secs, id);
                    self.active.insert(e.position.clone(), trade);
                }
            }

            EventKind::DecreasePosition(e) => {
                let Some(trade) = self.active.get_mut(&e.position) else {
                    self.report_missing_opening(event, &e.position);
                    return;
                };
                trade.cumulative_pnl += e.pnl_delta;
                trade.roi_pct = Trade::compute_roi_pct(trade.cumulative_pnl, trade.collateral);
                trade.cumulative_fees += e.fee_usd;
                trade.events.push(event.clone());
                self.touched_at.insert(time_secs, trade.id.clone());

                let remaining = trade.current_size.saturating_sub(e.size_usd_delta);
                if remaining.is_zero() {
                    trade.status = TradeStatus::Closed;
                    trade.current_size = Usd::zero();
                    trade.exit_price = Some(e.price);
                    trade.close_time = Some(time);
                    self.terminate(&e.position);
                } else {
                    trade.current_size = remaining;
                }
            }

            EventKind::LiquidatePosition(e) => {
                let Some(trade) = self.active.get_mut(&e.position) else {
                    self.report_missing_opening(event, &e.position);
                    return;
                };
                trade.status = TradeStatus::Liquidated;
                trade.exit_price = Some(e.price);
                trade.close_time = Some(time);
                trade.cumulative_pnl += e.pnl_delta;
                trade.roi_pct = Trade::compute_roi_pct(trade.cumulative_pnl, trade.collateral);
                trade.cumulative_fees += e.fee_usd + e.liquidation_fee_usd;
                trade.current_size = Usd::zero();
                trade.events.push(event.clone());
                self.touched_at.insert(time_secs, trade.id.clone());
                self.terminate(&e.position);
            }

            EventKind::Unhandled { discriminator } => {
                debug!(
                    "skipping unhandled event {} from record {}",
                    hex::encode(discriminator),
                    event.ctx.signature
                );
            }

            // Trigger orders, limit fills, order requests, and swaps carry no
            // lifecycle weight; they attach as auxiliary detail.
            _ => self.attach_auxiliary(event, time_secs),
        }
    }

    /// Consume the grouper, yielding active and completed trades.
    pub fn finish(self) -> GroupedTrades {
        let mut completed = self.completed;
        completed.sort_by(|a, b| b.close_time.cmp(&a.close_time));
        GroupedTrades {
            active: self.active.into_values().collect(),
            completed,
            warnings: self.warnings,
        }
    }

    fn terminate(&mut self, position: &PositionKey) {
        if let Some(trade) = self.active.remove(position) {
            let next = trade.id.ordinal + 1;
            self.ordinals.insert(position.clone(), next);
            self.completed.push(trade);
        }
    }

    fn report_missing_opening(&mut self, event: &DomainEvent, position: &PositionKey) {
        self.warnings.push(ConsistencyWarning::MissingOpeningEvent {
            position: position.clone(),
            kind: event.kind_name().to_string(),
            signature: event.ctx.signature.clone(),
        });
    }

    /// Attach an auxiliary event to its trade: by position slot when the
    /// event carries one and a trade is active, otherwise to whichever trade
    /// a lifecycle event touched at the same block time. Swaps emitted by a
    /// closing transaction land on the just-terminated trade this way.
    fn attach_auxiliary(&mut self, event: &DomainEvent, time_secs: i64) {
        if let Some(position) = event.position() {
            if let Some(trade) = self.active.get_mut(position) {
                let key = (
                    trade.id.clone(),
                    event.ctx.signature.as_str().to_string(),
                    event.kind_name(),
                );
                if self.attached.insert(key) {
                    trade.events.push(event.clone());
                }
                return;
            }
        }

        let Some(id) = self.touched_at.get(&time_secs).cloned() else {
            debug!(
                "auxiliary {} event from record {} has no attachable trade",
                event.kind_name(),
                event.ctx.signature
            );
            return;
        };
        let key = (
            id.clone(),
            event.ctx.signature.as_str().to_string(),
            event.kind_name(),
        );
        if !self.attached.insert(key) {
            return;
        }
        if let Some(trade) = self
            .active
            .get_mut(&id.position)
            .filter(|t| t.id == id)
        {
            trade.events.push(event.clone());
        } else if let Some(trade) = self.completed.iter_mut().rev().find(|t| t.id == id) {
            trade.events.push(event.clone());
        }
    }
}

impl Default for LifecycleGrouper {
    fn default() -> Self {
        Self::new()
    }
}
