//! Identifiers used throughout lobview.
//!
//! Public keys are raw 32-byte identifiers rendered as base58. Order IDs are
//! the `(price_in_ticks, order_sequence_number)` keys of the book arenas.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::LobviewError;

// ---------------------------------------------------------------------------
// Pubkey
// ---------------------------------------------------------------------------

/// A 32-byte public identifier (mints, vaults, traders, authorities).
///
/// Serialized as a base58 string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pubkey(pub [u8; 32]);

impl Pubkey {
    #[must_use]
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First four bytes as hex, for compact log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl FromStr for Pubkey {
    type Err = LobviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| LobviewError::InvalidPubkey(format!("{s}: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            LobviewError::InvalidPubkey(format!("{s}: expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl From<Pubkey> for String {
    fn from(key: Pubkey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for Pubkey {
    type Error = LobviewError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
        }
    }
}

impl FromStr for Side {
    type Err = LobviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bid" | "buy" => Ok(Self::Bid),
            "ask" | "sell" => Ok(Self::Ask),
            other => Err(LobviewError::Configuration(format!("unknown side: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Recover the placement sequence from a stored order sequence number.
///
/// Bid sequence numbers are stored bit-inverted so that, read as signed
/// 64-bit values, they are negative. For a negative value `v` the placement
/// sequence is `-v - 1`, which is the bitwise complement of the raw bits.
/// Ask sequence numbers are stored as-is.
#[must_use]
pub fn normalize_sequence_number(raw: u64) -> u64 {
    if (raw as i64) < 0 { !raw } else { raw }
}

/// Key of a resting order: price plus raw (side-encoded) sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId {
    pub price_in_ticks: u64,
    /// Raw stored value; bit-inverted for bids.
    pub order_sequence_number: u64,
}

impl OrderId {
    #[must_use]
    pub fn new(price_in_ticks: u64, order_sequence_number: u64) -> Self {
        Self {
            price_in_ticks,
            order_sequence_number,
        }
    }

    /// Build the key of the `sequence`-th order placed on `side`.
    #[must_use]
    pub fn for_side(side: Side, price_in_ticks: u64, sequence: u64) -> Self {
        let raw = match side {
            Side::Bid => !sequence,
            Side::Ask => sequence,
        };
        Self::new(price_in_ticks, raw)
    }

    #[must_use]
    pub fn from_le_bytes(bytes: &[u8; 16]) -> Self {
        let mut price = [0u8; 8];
        let mut seq = [0u8; 8];
        price.copy_from_slice(&bytes[..8]);
        seq.copy_from_slice(&bytes[8..]);
        Self {
            price_in_ticks: u64::from_le_bytes(price),
            order_sequence_number: u64::from_le_bytes(seq),
        }
    }

    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.price_in_ticks.to_le_bytes());
        out[8..].copy_from_slice(&self.order_sequence_number.to_le_bytes());
        out
    }

    /// Placement sequence, comparable across both sides.
    #[must_use]
    pub fn normalized_sequence_number(&self) -> u64 {
        normalize_sequence_number(self.order_sequence_number)
    }

    /// Side implied by the sequence encoding.
    #[must_use]
    pub fn side(&self) -> Side {
        if (self.order_sequence_number as i64) < 0 {
            Side::Bid
        } else {
            Side::Ask
        }
    }

    /// Price-time priority within one side of the book.
    ///
    /// Bids rank higher prices first, asks lower prices first; equal prices
    /// rank the earlier placement first.
    #[must_use]
    pub fn priority_cmp(&self, other: &Self, side: Side) -> Ordering {
        let by_price = match side {
            Side::Bid => other.price_in_ticks.cmp(&self.price_in_ticks),
            Side::Ask => self.price_in_ticks.cmp(&other.price_in_ticks),
        };
        by_price.then_with(|| {
            self.normalized_sequence_number()
                .cmp(&other.normalized_sequence_number())
        })
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.normalized_sequence_number(),
            self.price_in_ticks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bid_sequence_normalizes_to_placement_order() {
        let raws: Vec<u64> = (0..100).map(|seq| !seq).collect();
        let normalized: Vec<u64> = raws.iter().map(|r| normalize_sequence_number(*r)).collect();
        assert_eq!(normalized, (0..100).collect::<Vec<_>>());
        assert!(normalized.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn negative_raw_matches_twos_complement_rule() {
        for seq in [0u64, 1, 17, 1 << 40, (1 << 62) + 3] {
            let raw = !seq;
            let signed = raw as i64;
            assert!(signed < 0);
            assert_eq!(normalize_sequence_number(raw), (-(i128::from(signed)) - 1) as u64);
        }
    }

    #[test]
    fn ask_sequence_is_unchanged() {
        assert_eq!(normalize_sequence_number(0), 0);
        assert_eq!(normalize_sequence_number(12_345), 12_345);
    }

    #[test]
    fn order_id_side_from_encoding() {
        assert_eq!(OrderId::for_side(Side::Bid, 100, 5).side(), Side::Bid);
        assert_eq!(OrderId::for_side(Side::Ask, 100, 5).side(), Side::Ask);
        assert_eq!(OrderId::for_side(Side::Bid, 100, 5).normalized_sequence_number(), 5);
    }

    #[test]
    fn order_id_bytes_layout() {
        let id = OrderId::new(0x0102, 0xFFFF_FFFF_FFFF_FFFE);
        let bytes = id.to_le_bytes();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes[1], 0x01);
        assert_eq!(bytes[8], 0xFE);
        assert_eq!(OrderId::from_le_bytes(&bytes), id);
    }

    #[test]
    fn bid_priority_highest_price_then_earliest() {
        let a = OrderId::for_side(Side::Bid, 100, 3);
        let b = OrderId::for_side(Side::Bid, 100, 1);
        let c = OrderId::for_side(Side::Bid, 101, 9);
        let mut ids = vec![a, b, c];
        ids.sort_by(|x, y| x.priority_cmp(y, Side::Bid));
        assert_eq!(ids, vec![c, b, a]);
    }

    #[test]
    fn ask_priority_lowest_price_then_earliest() {
        let a = OrderId::for_side(Side::Ask, 100, 3);
        let b = OrderId::for_side(Side::Ask, 100, 1);
        let c = OrderId::for_side(Side::Ask, 99, 9);
        let mut ids = vec![a, b, c];
        ids.sort_by(|x, y| x.priority_cmp(y, Side::Ask));
        assert_eq!(ids, vec![c, b, a]);
    }

    #[test]
    fn pubkey_base58_roundtrip() {
        let key = Pubkey([7u8; 32]);
        let text = key.to_string();
        let back: Pubkey = text.parse().unwrap();
        assert_eq!(back, key);
        assert_eq!(key.short(), "07070707");
    }

    #[test]
    fn pubkey_rejects_wrong_length() {
        let short = bs58::encode([1u8; 8]).into_string();
        assert!(matches!(
            short.parse::<Pubkey>(),
            Err(LobviewError::InvalidPubkey(_))
        ));
        assert!("0OIl".parse::<Pubkey>().is_err());
    }

    #[test]
    fn pubkey_serde_as_string() {
        let key = Pubkey([9u8; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{key}\""));
        let back: Pubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn side_parsing_and_display() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Bid);
        assert_eq!("ASK".parse::<Side>().unwrap(), Side::Ask);
        assert!("hold".parse::<Side>().is_err());
        assert_eq!(format!("{}", Side::Bid), "BID");
        assert_eq!(Side::Bid.opposite(), Side::Ask);
    }
}
