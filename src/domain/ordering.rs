//! Stable event ordering for deterministic grouping.
//!
//! The lifecycle grouper requires a globally ascending time order across all
//! identifiers of one owner. Within a single block time, lifecycle events must
//! come before auxiliary ones: a swap emitted by the same transaction as a
//! terminal decrease is logically a consequence of that decrease, and a
//! trigger order created in the same transaction as an opening increase must
//! see the trade it belongs to.

use crate::domain::DomainEvent;

/// Stable ordering key for decoded events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey {
    /// Block time in seconds (primary sort). Events with no block time sort
    /// first and are rejected by the grouper.
    pub block_time: i64,
    /// Lifecycle events rank 0, auxiliary events rank 1.
    pub kind_rank: u8,
}

impl EventOrderingKey {
    /// Create an ordering key from an event.
    pub fn from_event(event: &DomainEvent) -> Self {
        EventOrderingKey {
            block_time: event.block_time().map(|t| t.as_secs()).unwrap_or(i64::MIN),
            kind_rank: if event.is_lifecycle() { 0 } else { 1 },
        }
    }
}

/// Sort events into the order the grouper requires. The sort is stable, so
/// events with equal keys keep their fetched order.
pub fn sort_events_deterministic(events: &mut [DomainEvent]) {
    events.sort_by(|a, b| {
        EventOrderingKey::from_event(a).cmp(&EventOrderingKey::from_event(b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BlockTime, CustodyKey, DecreasePosition, EventKind, OwnerKey, PositionKey, RecordContext,
        Side, Signature, SwapLeg, Usd, UsdDelta,
    };

    fn ctx(sig: &str, time: i64) -> RecordContext {
        RecordContext {
            signature: Signature::new(sig.to_string()),
            block_time: Some(BlockTime::new(time)),
        }
    }

    fn decrease(sig: &str, time: i64) -> DomainEvent {
        DomainEvent::new(
            ctx(sig, time),
            EventKind::DecreasePosition(DecreasePosition {
                position: PositionKey::new("pos".to_string()),
                owner: OwnerKey::new("owner".to_string()),
                custody: CustodyKey::new("custody".to_string()),
                side: Side::Long,
                price: Usd::from_dollars(100),
                size_usd_delta: Usd::from_dollars(500),
                collateral_usd_delta: Usd::from_dollars(50),
                pnl_delta: UsdDelta::zero(),
                fee_usd: Usd::zero(),
            }),
        )
    }

    fn swap(sig: &str, time: i64) -> DomainEvent {
        DomainEvent::new(
            ctx(sig, time),
            EventKind::PostSwap(SwapLeg {
                owner: OwnerKey::new("owner".to_string()),
                custody_in: CustodyKey::new("a".to_string()),
                custody_out: CustodyKey::new("b".to_string()),
                amount_in: 10,
                amount_out: 9,
            }),
        )
    }

    #[test]
    fn test_sorted_ascending_by_time() {
        let mut events = vec![decrease("s2", 200), decrease("s1", 100)];
        sort_events_deterministic(&mut events);
        assert_eq!(events[0].ctx.signature.as_str(), "s1");
        assert_eq!(events[1].ctx.signature.as_str(), "s2");
    }

    #[test]
    fn test_same_time_lifecycle_before_swap() {
        // Fetched order has the swap first; the tie-break must move the
        // decrease ahead of it.
        let mut events = vec![swap("s1", 100), decrease("s1", 100)];
        sort_events_deterministic(&mut events);
        assert_eq!(events[0].kind_name(), "decrease_position");
        assert_eq!(events[1].kind_name(), "post_swap");
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let mut events = vec![decrease("first", 100), decrease("second", 100)];
        sort_events_deterministic(&mut events);
        assert_eq!(events[0].ctx.signature.as_str(), "first");
        assert_eq!(events[1].ctx.signature.as_str(), "second");
    }

    #[test]
    fn test_missing_block_time_sorts_first() {
        let mut no_time = decrease("s0", 0);
        no_time.ctx.block_time = None;
        let mut events = vec![decrease("s1", 100), no_time];
        sort_events_deterministic(&mut events);
        assert!(events[0].block_time().is_none());
    }
}
