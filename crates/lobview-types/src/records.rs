//! Value records stored in the book and trader arenas.
//!
//! Resting orders exist in two 32-byte on-disk shapes. The current one
//! carries time-in-force fields; markets written before time-in-force kept
//! those two words as padding. The sizes match, so the shape is named by the
//! decode config rather than guessed from the bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{RESTING_ORDER_LEN, TRADER_STATE_LEN};
use crate::{ByteReader, LobviewError, Result};

// ---------------------------------------------------------------------------
// AsOf
// ---------------------------------------------------------------------------

/// Slot / wall-clock cursor that expiring orders are checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsOf {
    pub slot: u64,
    pub unix_timestamp: u64,
}

impl AsOf {
    #[must_use]
    pub fn new(slot: u64, unix_timestamp: u64) -> Self {
        Self {
            slot,
            unix_timestamp,
        }
    }

    /// Cursor at `slot` that never expires anything by timestamp.
    #[must_use]
    pub fn at_slot(slot: u64) -> Self {
        Self::new(slot, 0)
    }

    /// Fails for times before the unix epoch.
    pub fn at(slot: u64, time: DateTime<Utc>) -> Result<Self> {
        let unix_timestamp = u64::try_from(time.timestamp()).map_err(|_| {
            LobviewError::Configuration(format!("as-of time {time} is before the unix epoch"))
        })?;
        Ok(Self::new(slot, unix_timestamp))
    }

    pub fn now(slot: u64) -> Result<Self> {
        Self::at(slot, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// RestingOrder
// ---------------------------------------------------------------------------

/// A single order resting in the book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestingOrder {
    /// 1-based index into the trader arena; 0 means "no trader".
    pub trader_index: u64,
    pub num_base_lots: u64,
    /// 0 = never expires by slot.
    pub last_valid_slot: u64,
    /// 0 = never expires by timestamp.
    pub last_valid_unix_timestamp_in_seconds: u64,
}

impl RestingOrder {
    #[must_use]
    pub fn new(trader_index: u64, num_base_lots: u64) -> Self {
        Self {
            trader_index,
            num_base_lots,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, last_valid_slot: u64, last_valid_unix_timestamp: u64) -> Self {
        self.last_valid_slot = last_valid_slot;
        self.last_valid_unix_timestamp_in_seconds = last_valid_unix_timestamp;
        self
    }

    #[must_use]
    pub fn slot_expiry(&self) -> Option<u64> {
        (self.last_valid_slot != 0).then_some(self.last_valid_slot)
    }

    #[must_use]
    pub fn timestamp_expiry(&self) -> Option<u64> {
        (self.last_valid_unix_timestamp_in_seconds != 0)
            .then_some(self.last_valid_unix_timestamp_in_seconds)
    }

    /// Whether the order is no longer valid at `as_of`.
    ///
    /// Each axis expires independently; a zero field never expires.
    #[must_use]
    pub fn is_expired(&self, as_of: &AsOf) -> bool {
        self.slot_expiry().is_some_and(|slot| slot < as_of.slot)
            || self
                .timestamp_expiry()
                .is_some_and(|ts| ts < as_of.unix_timestamp)
    }
}

/// On-disk shape of a [`RestingOrder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestingOrderLayout {
    /// `trader_index`, `num_base_lots`, then two `u64` of padding. The
    /// padding is skipped, so orders never expire.
    Padded,
    /// `trader_index`, `num_base_lots`, `last_valid_slot`,
    /// `last_valid_unix_timestamp_in_seconds`.
    #[default]
    TimeInForce,
}

impl RestingOrderLayout {
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Padded | Self::TimeInForce => RESTING_ORDER_LEN,
        }
    }

    /// Confirms a declared value-record size matches this shape.
    pub fn for_value_size(self, size: usize) -> Result<Self> {
        if size == self.size() {
            Ok(self)
        } else {
            Err(LobviewError::UnsupportedRecordShape {
                record: "resting order",
                size,
            })
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<RestingOrder> {
        if bytes.len() != self.size() {
            return Err(LobviewError::UnsupportedRecordShape {
                record: "resting order",
                size: bytes.len(),
            });
        }
        let mut reader = ByteReader::new(bytes, "resting order");
        let order = RestingOrder::new(reader.read_u64()?, reader.read_u64()?);
        match self {
            Self::Padded => Ok(order),
            Self::TimeInForce => Ok(order.with_expiry(reader.read_u64()?, reader.read_u64()?)),
        }
    }

    #[must_use]
    pub fn encode(self, order: &RestingOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        out.extend_from_slice(&order.trader_index.to_le_bytes());
        out.extend_from_slice(&order.num_base_lots.to_le_bytes());
        if self == Self::TimeInForce {
            out.extend_from_slice(&order.last_valid_slot.to_le_bytes());
            out.extend_from_slice(&order.last_valid_unix_timestamp_in_seconds.to_le_bytes());
        }
        out.resize(self.size(), 0);
        out
    }
}

// ---------------------------------------------------------------------------
// TraderState
// ---------------------------------------------------------------------------

/// Funds a registered trader holds on the market, in lots.
///
/// "Locked" lots back resting orders; "free" lots are withdrawable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraderState {
    pub quote_lots_locked: u64,
    pub quote_lots_free: u64,
    pub base_lots_locked: u64,
    pub base_lots_free: u64,
}

impl TraderState {
    pub const LEN: usize = TRADER_STATE_LEN;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(LobviewError::UnsupportedRecordShape {
                record: "trader state",
                size: bytes.len(),
            });
        }
        let mut reader = ByteReader::new(bytes, "trader state");
        Ok(Self {
            quote_lots_locked: reader.read_u64()?,
            quote_lots_free: reader.read_u64()?,
            base_lots_locked: reader.read_u64()?,
            base_lots_free: reader.read_u64()?,
        })
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.quote_lots_locked.to_le_bytes());
        out.extend_from_slice(&self.quote_lots_free.to_le_bytes());
        out.extend_from_slice(&self.base_lots_locked.to_le_bytes());
        out.extend_from_slice(&self.base_lots_free.to_le_bytes());
        out.resize(Self::LEN, 0);
        out
    }

    #[must_use]
    pub fn total_quote_lots(&self) -> u64 {
        self.quote_lots_locked.saturating_add(self.quote_lots_free)
    }

    #[must_use]
    pub fn total_base_lots(&self) -> u64 {
        self.base_lots_locked.saturating_add(self.base_lots_free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_expiry_boundary() {
        let order = RestingOrder::new(1, 10).with_expiry(5, 0);
        assert!(!order.is_expired(&AsOf::at_slot(4)));
        assert!(!order.is_expired(&AsOf::at_slot(5)));
        assert!(order.is_expired(&AsOf::at_slot(6)));
    }

    #[test]
    fn zero_expiry_never_expires() {
        let order = RestingOrder::new(1, 10);
        assert!(!order.is_expired(&AsOf::new(u64::MAX, u64::MAX)));
        assert_eq!(order.slot_expiry(), None);
        assert_eq!(order.timestamp_expiry(), None);
    }

    #[test]
    fn timestamp_axis_expires_independently() {
        let order = RestingOrder::new(1, 10).with_expiry(0, 1_700_000_000);
        assert!(!order.is_expired(&AsOf::new(1_000_000, 1_700_000_000)));
        assert!(order.is_expired(&AsOf::new(0, 1_700_000_001)));
    }

    #[test]
    fn as_of_from_datetime() {
        let time = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(AsOf::at(7, time).unwrap(), AsOf::new(7, 1_700_000_000));
    }

    #[test]
    fn as_of_rejects_pre_epoch_time() {
        let time = DateTime::from_timestamp(-1, 0).unwrap();
        let err = AsOf::at(7, time).unwrap_err();
        assert!(matches!(err, LobviewError::Configuration(_)));
        assert!(err.to_string().starts_with("LV_ERR_902"));
    }

    #[test]
    fn both_layouts_are_thirty_two_bytes() {
        for layout in [RestingOrderLayout::Padded, RestingOrderLayout::TimeInForce] {
            assert_eq!(layout.size(), 32);
            assert_eq!(layout.for_value_size(32).unwrap(), layout);
        }
        assert_eq!(
            RestingOrderLayout::TimeInForce.for_value_size(24).unwrap_err(),
            LobviewError::UnsupportedRecordShape {
                record: "resting order",
                size: 24,
            }
        );
        assert!(RestingOrderLayout::Padded.for_value_size(16).is_err());
    }

    #[test]
    fn padded_layout_ignores_nonzero_padding() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u64.to_le_bytes());
        bytes.extend_from_slice(&50u64.to_le_bytes());
        bytes.extend_from_slice(&[0xA5; 16]);

        let order = RestingOrderLayout::Padded.decode(&bytes).unwrap();
        assert_eq!(order, RestingOrder::new(3, 50));
        assert!(!order.is_expired(&AsOf::new(u64::MAX, u64::MAX)));

        // The same bytes read as time-in-force carry expiries.
        let tif = RestingOrderLayout::TimeInForce.decode(&bytes).unwrap();
        assert_eq!(tif.last_valid_slot, 0xA5A5_A5A5_A5A5_A5A5);
    }

    #[test]
    fn padded_layout_encodes_zeroed_padding() {
        let order = RestingOrder::new(2, 8).with_expiry(9, 9);
        let bytes = RestingOrderLayout::Padded.encode(&order);
        assert_eq!(bytes.len(), 32);
        assert!(bytes[16..].iter().all(|&b| b == 0));
        assert_eq!(RestingOrderLayout::Padded.decode(&bytes).unwrap(), RestingOrder::new(2, 8));
    }

    #[test]
    fn wrong_length_is_unsupported() {
        let err = RestingOrderLayout::TimeInForce.decode(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, LobviewError::UnsupportedRecordShape { size: 16, .. }));
    }

    #[test]
    fn trader_state_layout() {
        let state = TraderState {
            quote_lots_locked: 1,
            quote_lots_free: 2,
            base_lots_locked: 3,
            base_lots_free: 4,
        };
        let bytes = state.to_bytes();
        assert_eq!(bytes.len(), 96);
        assert_eq!(TraderState::from_bytes(&bytes).unwrap(), state);
        assert_eq!(state.total_quote_lots(), 3);
        assert_eq!(state.total_base_lots(), 7);
        assert!(TraderState::from_bytes(&bytes[..32]).is_err());
    }
}
