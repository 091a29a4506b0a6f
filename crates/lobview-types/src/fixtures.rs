//! Byte-exact builders for synthetic market snapshots.
//!
//! [`ArenaBuilder`] emulates the on-chain node allocator (bump allocation,
//! 1-indexed free list threaded through register 0) so tests can produce
//! arenas with any mix of live and freed slots. [`SnapshotBuilder`] lays a
//! header, the market scalars and three arenas out exactly as a market
//! account stores them.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::constants::{
    ALLOCATOR_HEADER_LEN, MARKET_PADDING_LEN, NODE_REGISTER_COUNT, ORDER_ID_LEN, TRADER_KEY_LEN,
    TREE_HEADER_LEN,
};
use crate::{
    MarketHeader, MarketSizeParams, MarketStatus, OrderId, Pubkey, RestingOrder,
    RestingOrderLayout, Side, TokenParams, TraderState,
};

static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(1);

impl Pubkey {
    /// A key that differs from every other key created this way.
    pub fn new_unique() -> Self {
        let n = NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_be_bytes());
        bytes[31] = 0xA5;
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// ArenaBuilder
// ---------------------------------------------------------------------------

/// Emulates the node allocator of one arena region.
#[derive(Debug, Clone)]
pub struct ArenaBuilder {
    capacity: u64,
    key_size: usize,
    value_size: usize,
    bump_index: u32,
    free_list_head: u32,
    registers: Vec<[u32; NODE_REGISTER_COUNT]>,
    keys: Vec<Vec<u8>>,
    values: Vec<Vec<u8>>,
}

impl ArenaBuilder {
    pub fn new(capacity: u64, key_size: usize, value_size: usize) -> Self {
        let slots = usize::try_from(capacity).expect("capacity fits in memory");
        Self {
            capacity,
            key_size,
            value_size,
            bump_index: 0,
            free_list_head: 0,
            registers: vec![[0; NODE_REGISTER_COUNT]; slots],
            keys: vec![vec![0; key_size]; slots],
            values: vec![vec![0; value_size]; slots],
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn bump_index(&self) -> u32 {
        self.bump_index
    }

    /// Allocate a slot (reusing the free list first) and store the record.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> u32 {
        assert_eq!(key.len(), self.key_size, "key size");
        assert_eq!(value.len(), self.value_size, "value size");
        let index = if self.free_list_head == 0 {
            assert!(u64::from(self.bump_index) < self.capacity, "arena full");
            self.bump_index += 1;
            self.bump_index - 1
        } else {
            let index = self.free_list_head - 1;
            self.free_list_head = self.registers[index as usize][0];
            index
        };
        let slot = index as usize;
        self.registers[slot] = [0; NODE_REGISTER_COUNT];
        self.keys[slot] = key.to_vec();
        self.values[slot] = value.to_vec();
        index
    }

    /// Release a slot: zero it and push it onto the free list.
    pub fn remove(&mut self, index: u32) {
        assert!(index < self.bump_index, "slot was never allocated");
        let slot = index as usize;
        self.keys[slot] = vec![0; self.key_size];
        self.values[slot] = vec![0; self.value_size];
        self.registers[slot] = [self.free_list_head, 0, 0, 0];
        self.free_list_head = index + 1;
    }

    /// Overwrite a register, e.g. to corrupt the free list.
    pub fn set_register(&mut self, index: u32, register: usize, value: u32) {
        self.registers[index as usize][register] = value;
    }

    pub fn set_free_list_head(&mut self, head: u32) {
        self.free_list_head = head;
    }

    pub fn set_bump_index(&mut self, bump_index: u32) {
        self.bump_index = bump_index;
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; TREE_HEADER_LEN];
        let mut allocator = [0u8; ALLOCATOR_HEADER_LEN];
        allocator[..8].copy_from_slice(&self.capacity.to_le_bytes());
        allocator[8..12].copy_from_slice(&self.bump_index.to_le_bytes());
        allocator[12..].copy_from_slice(&self.free_list_head.to_le_bytes());
        out.extend_from_slice(&allocator);
        for slot in 0..self.registers.len() {
            for register in self.registers[slot] {
                out.extend_from_slice(&register.to_le_bytes());
            }
            out.extend_from_slice(&self.keys[slot]);
            out.extend_from_slice(&self.values[slot]);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// SnapshotBuilder
// ---------------------------------------------------------------------------

/// Builds a full market account.
///
/// Defaults describe a SOL/USDC-like market: 9 base decimals, 6 quote
/// decimals, 1000 base lots per SOL and a tick of 0.001 USDC.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    pub header: MarketHeader,
    pub base_lots_per_base_unit: u64,
    pub tick_size_in_quote_lots_per_base_unit: u64,
    pub order_sequence_number: u64,
    pub taker_fee_bps: u64,
    pub collected_quote_lot_fees: u64,
    pub unclaimed_quote_lot_fees: u64,
    layout: RestingOrderLayout,
    bids: ArenaBuilder,
    asks: ArenaBuilder,
    traders: ArenaBuilder,
}

impl SnapshotBuilder {
    pub fn new(bids_size: u64, asks_size: u64, num_seats: u64) -> Self {
        Self::with_layout(bids_size, asks_size, num_seats, RestingOrderLayout::TimeInForce)
    }

    pub fn with_layout(
        bids_size: u64,
        asks_size: u64,
        num_seats: u64,
        layout: RestingOrderLayout,
    ) -> Self {
        let header = MarketHeader {
            discriminant: 8_167_313_896_524_341_111,
            status: MarketStatus::Active,
            market_size_params: MarketSizeParams {
                bids_size,
                asks_size,
                num_seats,
            },
            base_params: TokenParams {
                decimals: 9,
                vault_bump: 255,
                mint_key: Pubkey([0x11; 32]),
                vault_key: Pubkey([0x12; 32]),
            },
            base_lot_size: 1_000_000,
            quote_params: TokenParams {
                decimals: 6,
                vault_bump: 254,
                mint_key: Pubkey([0x21; 32]),
                vault_key: Pubkey([0x22; 32]),
            },
            quote_lot_size: 1,
            tick_size_in_quote_atoms_per_base_unit: 1_000,
            authority: Pubkey([0x31; 32]),
            fee_recipient: Pubkey([0x32; 32]),
            market_sequence_number: 0,
            successor: Pubkey([0x33; 32]),
            raw_base_units_per_base_unit: 1,
        };
        Self {
            header,
            base_lots_per_base_unit: 1_000,
            tick_size_in_quote_lots_per_base_unit: 1_000,
            order_sequence_number: 0,
            taker_fee_bps: 0,
            collected_quote_lot_fees: 0,
            unclaimed_quote_lot_fees: 0,
            layout,
            bids: ArenaBuilder::new(bids_size, ORDER_ID_LEN, layout.size()),
            asks: ArenaBuilder::new(asks_size, ORDER_ID_LEN, layout.size()),
            traders: ArenaBuilder::new(num_seats, TRADER_KEY_LEN, TraderState::LEN),
        }
    }

    /// Register a trader; returns its 1-based trader index.
    pub fn add_trader(&mut self, key: Pubkey, state: TraderState) -> u64 {
        u64::from(self.traders.insert(key.as_bytes(), &state.to_bytes())) + 1
    }

    /// Rest an order as the next placement on `side`; returns its slot.
    pub fn add_order(&mut self, side: Side, price_in_ticks: u64, order: RestingOrder) -> u32 {
        let id = OrderId::for_side(side, price_in_ticks, self.order_sequence_number);
        self.order_sequence_number += 1;
        self.insert_order(side, id, order)
    }

    /// Rest an order under an explicit key.
    pub fn insert_order(&mut self, side: Side, id: OrderId, order: RestingOrder) -> u32 {
        let value = self.layout.encode(&order);
        self.arena_mut(side).insert(&id.to_le_bytes(), &value)
    }

    pub fn remove_order(&mut self, side: Side, slot: u32) {
        self.arena_mut(side).remove(slot);
    }

    pub fn remove_trader(&mut self, slot: u32) {
        self.traders.remove(slot);
    }

    pub fn arena_mut(&mut self, side: Side) -> &mut ArenaBuilder {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    pub fn traders_mut(&mut self) -> &mut ArenaBuilder {
        &mut self.traders
    }

    pub fn build(&self) -> Vec<u8> {
        let mut header = self.header;
        header.market_size_params = MarketSizeParams {
            bids_size: self.bids.capacity(),
            asks_size: self.asks.capacity(),
            num_seats: self.traders.capacity(),
        };
        let mut out = header.to_bytes();
        out.extend_from_slice(&[0u8; MARKET_PADDING_LEN]);
        for scalar in [
            self.base_lots_per_base_unit,
            self.tick_size_in_quote_lots_per_base_unit,
            self.order_sequence_number,
            self.taker_fee_bps,
            self.collected_quote_lot_fees,
            self.unclaimed_quote_lot_fees,
        ] {
            out.extend_from_slice(&scalar.to_le_bytes());
        }
        out.extend_from_slice(&self.bids.build());
        out.extend_from_slice(&self.asks.build());
        out.extend_from_slice(&self.traders.build());
        out
    }
}
