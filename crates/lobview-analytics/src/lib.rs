//! # lobview-analytics
//!
//! **Read-only analytics over a decoded market.**
//!
//! - **Ladders**: depth-limited L2 aggregation and per-order L3 views, with
//!   optional time-in-force filtering ([`Ladder`], [`L3Book`])
//! - **Units**: lots, ticks and atoms to whole-token amounts ([`MarketMetadata`])
//! - **Routing**: fee-aware expected output / required input ([`SwapRouter`])
//! - **Simulation**: whole-lot market order fills ([`MarketSimulator`])
//! - **Statistics**: spread, mid and VWAP ([`BookStats`])
//!
//! Nothing here mutates a [`lobview_decode::MarketData`]; every view is
//! recomputed from the snapshot it is given.

pub mod ladder;
pub mod router;
pub mod simulator;
pub mod stats;
pub mod units;

pub use ladder::{L3Book, L3Order, Ladder, LadderLevel, UiL3Book, UiL3Order, UiLadder, UiLadderLevel};
pub use router::{SwapQuote, SwapRouter};
pub use simulator::{MarketSimulator, SimulationSummaryInLots};
pub use stats::{BookStats, vwap_in_ticks};
pub use units::{MarketMetadata, atoms_to_decimal};
