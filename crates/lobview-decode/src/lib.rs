//! # lobview-decode
//!
//! **Snapshot decoding for lobview.**
//!
//! Turns the raw bytes of a market account into an immutable [`MarketData`]:
//!
//! - **Arena decoding**: bump-allocated node arenas with an index-linked free
//!   list are flattened into the live `(key, value)` slots ([`decode_arena`])
//! - **Book assembly**: bids and asks are sorted by price-time priority and
//!   traders are indexed by their 1-based slot ([`MarketData::from_bytes`])
//!
//! Decoding is a pure function of its input. A refresh decodes a new
//! snapshot into a new `MarketData`; nothing is mutated in place.

pub mod arena;
pub mod market;

pub use arena::{
    Arena, ArenaSlot, OrderIdRecord, RecordLayout, TraderKeyRecord, TraderStateRecord,
    decode_arena, region_len,
};
pub use market::{BookEntry, MarketData};
