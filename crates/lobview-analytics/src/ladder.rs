//! L2 ladders and L3 per-order books built from a decoded [`MarketData`].
//!
//! Both views walk the already priority-sorted book sides, optionally
//! dropping orders whose time-in-force has lapsed at an [`AsOf`] cursor.
//! Raw views stay in ticks and lots; the `Ui*` views project them into
//! whole-token floats through [`MarketMetadata`].

use std::fmt;

use lobview_decode::{BookEntry, MarketData};
use lobview_types::constants::DEFAULT_DISPLAY_PRECISION;
use lobview_types::{AsOf, Pubkey, Result, Side};
use serde::{Deserialize, Serialize};

use crate::units::MarketMetadata;

// =================================================================
// Expiry filtering
// =================================================================

/// Orders of one side still valid at `as_of`, in book order.
fn live_orders<'a>(market: &'a MarketData, side: Side, as_of: Option<&AsOf>) -> Vec<&'a BookEntry> {
    let book = market.book(side);
    let Some(as_of) = as_of else {
        return book.iter().collect();
    };
    let live: Vec<&BookEntry> = book
        .iter()
        .filter(|(_, order)| !order.is_expired(as_of))
        .collect();
    let expired = book.len() - live.len();
    if expired > 0 {
        if live.is_empty() {
            tracing::warn!(
                %side,
                expired,
                slot = as_of.slot,
                unix_timestamp = as_of.unix_timestamp,
                "every resting order on this side has expired"
            );
        } else {
            tracing::debug!(%side, expired, live = live.len(), "filtered expired orders");
        }
    }
    live
}

// =================================================================
// L2 ladder
// =================================================================

/// One aggregated price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderLevel {
    pub price_in_ticks: u64,
    /// Sum of the level's order sizes, capped at `u64::MAX`. Base lots are
    /// u64 on the market itself, so only a corrupt snapshot reaches the cap.
    pub size_in_base_lots: u64,
}

/// Price-aggregated book, best level first on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    pub bids: Vec<LadderLevel>,
    pub asks: Vec<LadderLevel>,
}

impl Ladder {
    /// Aggregate up to `depth` levels per side.
    ///
    /// Pass [`lobview_types::constants::ALL_LEVELS`] for the whole book.
    /// With `as_of`, expired time-in-force orders are left out.
    #[must_use]
    pub fn from_market(market: &MarketData, depth: usize, as_of: Option<&AsOf>) -> Self {
        Self {
            bids: aggregate(&live_orders(market, Side::Bid, as_of), depth),
            asks: aggregate(&live_orders(market, Side::Ask, as_of), depth),
        }
    }

    #[must_use]
    pub fn levels(&self, side: Side) -> &[LadderLevel] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Total base lots resting on `side` within the ladder's depth.
    #[must_use]
    pub fn total_base_lots(&self, side: Side) -> u64 {
        self.levels(side)
            .iter()
            .fold(0u64, |acc, l| acc.saturating_add(l.size_in_base_lots))
    }
}

fn aggregate(orders: &[&BookEntry], depth: usize) -> Vec<LadderLevel> {
    let mut levels: Vec<LadderLevel> = Vec::new();
    for &&(id, order) in orders {
        if let Some(level) = levels
            .last_mut()
            .filter(|l| l.price_in_ticks == id.price_in_ticks)
        {
            level.size_in_base_lots = level.size_in_base_lots.saturating_add(order.num_base_lots);
            continue;
        }
        if levels.len() == depth {
            break;
        }
        levels.push(LadderLevel {
            price_in_ticks: id.price_in_ticks,
            size_in_base_lots: order.num_base_lots,
        });
    }
    levels
}

// =================================================================
// L3 book
// =================================================================

/// One resting order with its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct L3Order {
    pub side: Side,
    pub price_in_ticks: u64,
    pub size_in_base_lots: u64,
    pub maker: Pubkey,
    /// Normalized: earlier placements are smaller on both sides.
    pub order_sequence_number: u64,
    pub last_valid_slot: Option<u64>,
    pub last_valid_unix_timestamp_in_seconds: Option<u64>,
}

/// Per-order book, priority order on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L3Book {
    pub bids: Vec<L3Order>,
    pub asks: Vec<L3Order>,
}

impl L3Book {
    /// Up to `orders_per_side` orders per side.
    ///
    /// Fails with a not-found error if an order names a trader index that
    /// has no registered trader.
    pub fn from_market(
        market: &MarketData,
        orders_per_side: usize,
        as_of: Option<&AsOf>,
    ) -> Result<Self> {
        let side_orders = |side: Side| -> Result<Vec<L3Order>> {
            live_orders(market, side, as_of)
                .into_iter()
                .take(orders_per_side)
                .map(|&(id, order)| {
                    Ok(L3Order {
                        side,
                        price_in_ticks: id.price_in_ticks,
                        size_in_base_lots: order.num_base_lots,
                        maker: market.trader_key(order.trader_index)?,
                        order_sequence_number: id.normalized_sequence_number(),
                        last_valid_slot: order.slot_expiry(),
                        last_valid_unix_timestamp_in_seconds: order.timestamp_expiry(),
                    })
                })
                .collect()
        };
        Ok(Self {
            bids: side_orders(Side::Bid)?,
            asks: side_orders(Side::Ask)?,
        })
    }

    #[must_use]
    pub fn orders(&self, side: Side) -> &[L3Order] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }
}

// =================================================================
// UI projections
// =================================================================

/// A ladder level in whole tokens: quote per base, and base quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiLadderLevel {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiLadder {
    pub bids: Vec<UiLadderLevel>,
    pub asks: Vec<UiLadderLevel>,
}

impl UiLadder {
    #[must_use]
    pub fn from_ladder(ladder: &Ladder, meta: &MarketMetadata) -> Self {
        let project = |levels: &[LadderLevel]| {
            levels
                .iter()
                .map(|l| UiLadderLevel {
                    price: meta.ticks_to_float_price(l.price_in_ticks),
                    quantity: meta.base_lots_to_raw_base_units_as_float(l.size_in_base_lots),
                })
                .collect()
        };
        Self {
            bids: project(&ladder.bids),
            asks: project(&ladder.asks),
        }
    }

    #[must_use]
    pub fn levels(&self, side: Side) -> &[UiLadderLevel] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// Asks above bids, worst ask on top. Honours `{:.N}` precision.
impl fmt::Display for UiLadder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 10;
        let precision = f.precision().unwrap_or(DEFAULT_DISPLAY_PRECISION);
        for level in self.asks.iter().rev() {
            let price = format!("{:.precision$}", level.price);
            let size = format!("{:.precision$}", level.quantity);
            writeln!(f, "{:WIDTH$} {price:^WIDTH$} {size:<WIDTH$}", "")?;
        }
        for level in &self.bids {
            let price = format!("{:.precision$}", level.price);
            let size = format!("{:.precision$}", level.quantity);
            writeln!(f, "{size:>WIDTH$} {price:^WIDTH$} {:WIDTH$}", "")?;
        }
        Ok(())
    }
}

/// An L3 order in whole tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UiL3Order {
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub maker: Pubkey,
    pub order_sequence_number: u64,
    pub last_valid_slot: Option<u64>,
    pub last_valid_unix_timestamp_in_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiL3Book {
    pub bids: Vec<UiL3Order>,
    pub asks: Vec<UiL3Order>,
}

impl UiL3Book {
    #[must_use]
    pub fn from_l3(book: &L3Book, meta: &MarketMetadata) -> Self {
        let project = |orders: &[L3Order]| {
            orders
                .iter()
                .map(|o| UiL3Order {
                    side: o.side,
                    price: meta.ticks_to_float_price(o.price_in_ticks),
                    size: meta.base_lots_to_raw_base_units_as_float(o.size_in_base_lots),
                    maker: o.maker,
                    order_sequence_number: o.order_sequence_number,
                    last_valid_slot: o.last_valid_slot,
                    last_valid_unix_timestamp_in_seconds: o.last_valid_unix_timestamp_in_seconds,
                })
                .collect()
        };
        Self {
            bids: project(&book.bids),
            asks: project(&book.asks),
        }
    }
}
