//! Domain primitives: BlockTime, Signature, PositionKey, OwnerKey, CustodyKey, Side.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Block time in seconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockTime(pub i64);

impl BlockTime {
    /// Create a BlockTime from seconds.
    pub fn new(secs: i64) -> Self {
        BlockTime(secs)
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Convert to an absolute UTC timestamp.
    ///
    /// Returns None for values outside the representable chrono range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.0, 0).single()
    }
}

impl std::fmt::Display for BlockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique signature of one ledger record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signature(pub String);

impl Signature {
    /// Create a Signature from a string.
    pub fn new(sig: String) -> Self {
        Signature(sig)
    }

    /// Get the signature as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic, reusable position slot key (one per asset x collateral x side
/// combination for an owner). Not unique to a single trade.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey(pub String);

impl PositionKey {
    /// Create a PositionKey from a string form.
    pub fn new(key: String) -> Self {
        PositionKey(key)
    }

    /// Create a PositionKey from a raw 32-byte account key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        PositionKey(hex::encode(bytes))
    }

    /// Get the key as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wallet key of the position owner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerKey(pub String);

impl OwnerKey {
    /// Create an OwnerKey from a string form.
    pub fn new(key: String) -> Self {
        OwnerKey(key)
    }

    /// Create an OwnerKey from a raw 32-byte account key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        OwnerKey(hex::encode(bytes))
    }

    /// Get the key as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Custody account key identifying the asset a position trades.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustodyKey(pub String);

impl CustodyKey {
    /// Create a CustodyKey from a string form.
    pub fn new(key: String) -> Self {
        CustodyKey(key)
    }

    /// Create a CustodyKey from a raw 32-byte account key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        CustodyKey(hex::encode(bytes))
    }

    /// Get the key as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustodyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position side: Long or Short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Map the on-chain side flag to a named value. 0 is the uninitialized
    /// marker and is rejected along with anything unknown.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            1 => Some(Side::Long),
            2 => Some(Side::Short),
            _ => None,
        }
    }

    /// Get the signed multiplier for this side (+1 for Long, -1 for Short).
    pub fn sign(&self) -> i32 {
        match self {
            Side::Long => 1,
            Side::Short => -1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_from_flag() {
        assert_eq!(Side::from_flag(1), Some(Side::Long));
        assert_eq!(Side::from_flag(2), Some(Side::Short));
        assert_eq!(Side::from_flag(0), None);
        assert_eq!(Side::from_flag(7), None);
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(Side::Long.sign(), 1);
        assert_eq!(Side::Short.sign(), -1);
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Long).unwrap(), "\"long\"");
        assert_eq!(serde_json::to_string(&Side::Short).unwrap(), "\"short\"");
    }

    #[test]
    fn test_position_key_from_bytes() {
        let key = PositionKey::from_bytes(&[0xab; 32]);
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().starts_with("abab"));
    }

    #[test]
    fn test_block_time_ordering() {
        assert!(BlockTime::new(1_700_000_000) < BlockTime::new(1_700_000_001));
    }

    #[test]
    fn test_block_time_to_utc() {
        let t = BlockTime::new(0).to_utc().unwrap();
        assert_eq!(t.timestamp(), 0);
    }
}
