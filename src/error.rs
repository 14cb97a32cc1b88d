//! Crate error taxonomy.
//!
//! Fatal validation failures abort a run before any fetch; everything else is
//! localized. Transport and rate-limit failures are captured per identifier in
//! the fetch report, and data-consistency problems surface as warnings on the
//! result, never as fabricated trades.

use crate::domain::{PositionKey, Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors for a reconstruction run.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The chronological window is inverted or empty: the older bound must be
    /// strictly older than the newer bound.
    #[error("window end {end} must be strictly older than window start {start}")]
    InvalidWindow { start: i64, end: i64 },
}

/// Non-fatal data-consistency findings, surfaced in the result summary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConsistencyWarning {
    /// A decrease or liquidation arrived for an identifier with no active
    /// trade. The event is discarded; an opening is never synthesized.
    #[error("{kind} for position {position} with no active trade (record {signature})")]
    MissingOpeningEvent {
        position: PositionKey,
        kind: String,
        signature: Signature,
    },
    /// An event reached the grouper without a block time and cannot be
    /// placed in the lifecycle order.
    #[error("event from record {signature} has no block time")]
    MissingBlockTime { signature: Signature },
}
