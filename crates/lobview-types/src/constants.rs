//! Layout constants and defaults for lobview.
//!
//! All sizes are in bytes. Every integer in a market snapshot is little-endian.

/// Size of the fixed market header at the start of the account.
pub const MARKET_HEADER_LEN: usize = 576;

/// Reserved padding between the header and the market scalars.
pub const MARKET_PADDING_LEN: usize = 256;

/// Six consecutive `u64` market scalars (lot ratios, sequence, fees).
pub const MARKET_SCALARS_LEN: usize = 6 * 8;

/// Offset of the first arena region (bids) from the start of the account.
pub const MARKET_REGIONS_OFFSET: usize = MARKET_HEADER_LEN + MARKET_PADDING_LEN + MARKET_SCALARS_LEN;

/// Tree header preceding every arena: root `u32` plus three `u32` of padding.
pub const TREE_HEADER_LEN: usize = 16;

/// Allocator header: size `u64`, bump index `u32`, free-list head `u32`.
pub const ALLOCATOR_HEADER_LEN: usize = 16;

/// Bytes consumed before the first node of an arena region.
pub const REGION_HEADER_LEN: usize = TREE_HEADER_LEN + ALLOCATOR_HEADER_LEN;

/// Number of `u32` bookkeeping registers in front of every node.
pub const NODE_REGISTER_COUNT: usize = 4;

/// Size of the register block in front of every node.
pub const NODE_REGISTERS_LEN: usize = NODE_REGISTER_COUNT * 4;

/// `(price_in_ticks, order_sequence_number)`.
pub const ORDER_ID_LEN: usize = 16;

/// Resting order, with time-in-force fields or the older padding.
pub const RESTING_ORDER_LEN: usize = 32;

/// Trader public key.
pub const TRADER_KEY_LEN: usize = 32;

/// Four `u64` balances followed by eight `u64` of padding.
pub const TRADER_STATE_LEN: usize = 96;

/// Basis points in one whole unit.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Depth sentinel meaning "every level" / "every order".
pub const ALL_LEVELS: usize = usize::MAX;

/// Default number of ladder levels shown by the CLI.
pub const DEFAULT_LADDER_DEPTH: usize = 10;

/// Default number of fractional digits when rendering a ladder.
pub const DEFAULT_DISPLAY_PRECISION: usize = 4;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
