//! Raw ledger records as retrieved from the chain record source.

use crate::domain::{BlockTime, Signature};
use serde::{Deserialize, Serialize};

/// One retrieved ledger record: record-level metadata plus the ordered opaque
/// sub-event payloads found in its primary and inner instructions. Immutable
/// once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Unique record signature.
    pub signature: Signature,
    /// Block time, if the upstream source reported one.
    pub block_time: Option<BlockTime>,
    /// Slot the record landed in.
    pub slot: u64,
    /// Network fee paid by the record, in native units.
    pub fee_paid: u64,
    /// True if the record errored on chain. Failed records carry no entries
    /// worth decoding.
    pub failed: bool,
    /// Opaque sub-event payloads: 8-byte discriminator followed by the
    /// encoded body. Primary and inner instructions are flattened in order.
    pub entries: Vec<Vec<u8>>,
}

impl RawRecord {
    /// Construct a successful record.
    pub fn new(
        signature: Signature,
        block_time: Option<BlockTime>,
        slot: u64,
        fee_paid: u64,
        entries: Vec<Vec<u8>>,
    ) -> Self {
        RawRecord {
            signature,
            block_time,
            slot,
            fee_paid,
            failed: false,
            entries,
        }
    }

    /// Construct a failed record. No entries are kept.
    pub fn failed(signature: Signature, block_time: Option<BlockTime>, slot: u64) -> Self {
        RawRecord {
            signature,
            block_time,
            slot,
            fee_paid: 0,
            failed: true,
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_record_has_no_entries() {
        let rec = RawRecord::failed(
            Signature::new("sig1".to_string()),
            Some(BlockTime::new(1_700_000_000)),
            42,
        );
        assert!(rec.failed);
        assert!(rec.entries.is_empty());
    }

    #[test]
    fn test_record_serialization_roundtrip() {
        let rec = RawRecord::new(
            Signature::new("sig2".to_string()),
            None,
            7,
            5000,
            vec![vec![1, 2, 3]],
        );
        let json = serde_json::to_string(&rec).unwrap();
        let back: RawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
