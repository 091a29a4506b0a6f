//! Arena decoder for bump-allocated node regions.
//!
//! Every book side and the trader table is stored as a node arena:
//!
//! ```text
//! +-------------+------------------+----------------------------------------+
//! | tree header | allocator header | node 0 | node 1 | ... | node capacity-1 |
//! |   16 bytes  | size u64         | registers [u32; 4] | key | value       |
//! |             | bump_index u32   |                                        |
//! |             | free_head u32    |                                        |
//! +-------------+------------------+----------------------------------------+
//! ```
//!
//! Slots `0..bump_index` have been handed out at some point. Released slots
//! form a singly linked free list: `free_head` and register 0 of each freed
//! node hold 1-based slot addresses, with 0 terminating the chain. The
//! tree-link registers of live nodes are irrelevant here; the arena is
//! flattened to its live slots rather than rebuilt as a tree.

use std::collections::BTreeSet;

use lobview_types::constants::{
    ALLOCATOR_HEADER_LEN, NODE_REGISTER_COUNT, NODE_REGISTERS_LEN, ORDER_ID_LEN,
    REGION_HEADER_LEN, TRADER_KEY_LEN, TREE_HEADER_LEN,
};
use lobview_types::{
    ByteReader, LobviewError, OrderId, Pubkey, RestingOrder, RestingOrderLayout, Result,
    TraderState,
};

// =================================================================
// Record layouts
// =================================================================

/// A fixed-size record stored in every arena node.
pub trait RecordLayout {
    type Record;

    /// Encoded size in bytes.
    fn size(&self) -> usize;

    /// Decode a record from exactly [`RecordLayout::size`] bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Record>;
}

/// Book key: `(price_in_ticks, order_sequence_number)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderIdRecord;

impl RecordLayout for OrderIdRecord {
    type Record = OrderId;

    fn size(&self) -> usize {
        ORDER_ID_LEN
    }

    fn decode(&self, bytes: &[u8]) -> Result<OrderId> {
        let bytes: &[u8; ORDER_ID_LEN] =
            bytes
                .try_into()
                .map_err(|_| LobviewError::UnsupportedRecordShape {
                    record: "order id",
                    size: bytes.len(),
                })?;
        Ok(OrderId::from_le_bytes(bytes))
    }
}

impl RecordLayout for RestingOrderLayout {
    type Record = RestingOrder;

    fn size(&self) -> usize {
        RestingOrderLayout::size(*self)
    }

    fn decode(&self, bytes: &[u8]) -> Result<RestingOrder> {
        RestingOrderLayout::decode(*self, bytes)
    }
}

/// Trader table key: the trader's public key.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraderKeyRecord;

impl RecordLayout for TraderKeyRecord {
    type Record = Pubkey;

    fn size(&self) -> usize {
        TRADER_KEY_LEN
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pubkey> {
        let bytes: [u8; TRADER_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| LobviewError::UnsupportedRecordShape {
                    record: "trader key",
                    size: bytes.len(),
                })?;
        Ok(Pubkey(bytes))
    }
}

/// Trader table value: locked / free lot balances.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraderStateRecord;

impl RecordLayout for TraderStateRecord {
    type Record = TraderState;

    fn size(&self) -> usize {
        TraderState::LEN
    }

    fn decode(&self, bytes: &[u8]) -> Result<TraderState> {
        TraderState::from_bytes(bytes)
    }
}

// =================================================================
// Decoded arena
// =================================================================

/// A live slot of a decoded arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaSlot<K, V> {
    /// 0-based slot index.
    pub index: u32,
    pub key: K,
    pub value: V,
}

/// The flattened contents of one arena region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena<K, V> {
    /// Number of slots ever allocated.
    pub bump_index: u32,
    /// 0-based indices reachable from the free list.
    pub free_slots: BTreeSet<u32>,
    /// Every allocated slot that is not free, in slot order.
    pub live: Vec<ArenaSlot<K, V>>,
}

impl<K, V> Arena<K, V> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArenaSlot<K, V>> {
        self.live.iter()
    }
}

impl<K, V> IntoIterator for Arena<K, V> {
    type Item = ArenaSlot<K, V>;
    type IntoIter = std::vec::IntoIter<ArenaSlot<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.live.into_iter()
    }
}

// =================================================================
// Decoding
// =================================================================

/// Byte length of a region holding `capacity` nodes of `key` + `value`.
pub fn region_len<K: RecordLayout, V: RecordLayout>(
    region: &'static str,
    capacity: u64,
    key: &K,
    value: &V,
) -> Result<usize> {
    let node_len = NODE_REGISTERS_LEN + key.size() + value.size();
    usize::try_from(capacity)
        .ok()
        .and_then(|cap| cap.checked_mul(node_len))
        .and_then(|nodes| nodes.checked_add(REGION_HEADER_LEN))
        .ok_or_else(|| LobviewError::InvalidHeader {
            reason: format!("{region} capacity {capacity} overflows the address space"),
        })
}

/// Decode one arena region into its live slots.
///
/// `data` must span exactly the region derived from `capacity`; a shorter
/// or longer slice is rejected rather than partially read.
pub fn decode_arena<K: RecordLayout, V: RecordLayout>(
    data: &[u8],
    region: &'static str,
    capacity: u64,
    key: &K,
    value: &V,
) -> Result<Arena<K::Record, V::Record>> {
    let expected = region_len(region, capacity, key, value)?;
    if data.len() != expected {
        return Err(LobviewError::RegionLengthMismatch {
            region,
            expected,
            actual: data.len(),
        });
    }

    let mut reader = ByteReader::new(data, region);
    reader.skip(TREE_HEADER_LEN)?;
    // Allocator `size` field; the header capacity is authoritative.
    reader.skip(ALLOCATOR_HEADER_LEN - 8)?;
    let bump_index = reader.read_u32()?;
    let free_list_head = reader.read_u32()?;

    if u64::from(bump_index) > capacity {
        return Err(LobviewError::BumpIndexOutOfRange {
            region,
            bump_index,
            capacity,
        });
    }

    // Pass 1: the next-pointer register and record bytes of every slot.
    let mut next_pointers = Vec::with_capacity(bump_index as usize);
    let mut records = Vec::with_capacity(bump_index as usize);
    for _ in 0..bump_index {
        let mut registers = [0u32; NODE_REGISTER_COUNT];
        for register in &mut registers {
            *register = reader.read_u32()?;
        }
        next_pointers.push(registers[0]);
        let key_bytes = reader.take(key.size())?;
        let value_bytes = reader.take(value.size())?;
        records.push((key_bytes, value_bytes));
    }

    let free_slots = collect_free_slots(region, bump_index, free_list_head, &next_pointers)?;

    // Pass 2: decode only what is live.
    let live = records
        .into_iter()
        .zip(0u32..)
        .filter(|(_, index)| !free_slots.contains(index))
        .map(|((key_bytes, value_bytes), index)| {
            Ok(ArenaSlot {
                index,
                key: key.decode(key_bytes)?,
                value: value.decode(value_bytes)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        region,
        bump_index,
        live = live.len(),
        free = free_slots.len(),
        "decoded arena region"
    );

    Ok(Arena {
        bump_index,
        free_slots,
        live,
    })
}

/// Walk the 1-based free list. At most `bump_index` slots can be free, so
/// a longer walk means the chain loops.
fn collect_free_slots(
    region: &'static str,
    bump_index: u32,
    free_list_head: u32,
    next_pointers: &[u32],
) -> Result<BTreeSet<u32>> {
    let mut free = BTreeSet::new();
    let mut address = free_list_head;
    let mut steps = 0u32;

    while address != 0 {
        let index = address - 1;
        if index >= bump_index {
            break;
        }
        if steps == bump_index || !free.insert(index) {
            return Err(LobviewError::FreeListCycle { region, bump_index });
        }
        steps += 1;
        address = next_pointers[index as usize];
    }

    Ok(free)
}
