//! Top-of-book statistics.

use serde::{Deserialize, Serialize};

use crate::ladder::Ladder;
use crate::units::MarketMetadata;

/// Summary of a ladder's best levels. Fields are `None` when a side needed
/// for them is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BookStats {
    pub best_bid_in_ticks: Option<u64>,
    pub best_ask_in_ticks: Option<u64>,
    /// May be negative on a crossed snapshot.
    pub spread_in_ticks: Option<i128>,
    pub mid_price_in_ticks: Option<f64>,
    /// Size-weighted price over the top `vwap_levels` levels, in ticks.
    pub vwap_in_ticks: Option<f64>,
    pub best_bid: Option<f64>,
    pub best_ask: Option<f64>,
    pub mid_price: Option<f64>,
    pub vwap: Option<f64>,
}

impl BookStats {
    #[must_use]
    pub fn from_ladder(ladder: &Ladder, meta: &MarketMetadata, vwap_levels: usize) -> Self {
        let best_bid_in_ticks = ladder.bids.first().map(|l| l.price_in_ticks);
        let best_ask_in_ticks = ladder.asks.first().map(|l| l.price_in_ticks);
        let both = best_bid_in_ticks.zip(best_ask_in_ticks);
        let spread_in_ticks = both.map(|(bid, ask)| i128::from(ask) - i128::from(bid));
        let mid_price_in_ticks = both.map(|(bid, ask)| (bid as f64 + ask as f64) / 2.0);
        let vwap_in_ticks = vwap_in_ticks(ladder, vwap_levels);

        // Prices scale linearly with ticks.
        let to_price = |ticks: f64| ticks * meta.ticks_to_float_price(1);
        Self {
            best_bid_in_ticks,
            best_ask_in_ticks,
            spread_in_ticks,
            mid_price_in_ticks,
            vwap_in_ticks,
            best_bid: best_bid_in_ticks.map(|t| meta.ticks_to_float_price(t)),
            best_ask: best_ask_in_ticks.map(|t| meta.ticks_to_float_price(t)),
            mid_price: mid_price_in_ticks.map(to_price),
            vwap: vwap_in_ticks.map(to_price),
        }
    }
}

/// Pairs the top `levels` bids and asks and weights each side's price by
/// the opposite side's size, so the result leans toward the thinner side.
#[must_use]
pub fn vwap_in_ticks(ladder: &Ladder, levels: usize) -> Option<f64> {
    let (num, denom) = ladder
        .bids
        .iter()
        .zip(&ladder.asks)
        .take(levels)
        .fold((0.0, 0.0), |(num, denom), (bid, ask)| {
            let bid_size = bid.size_in_base_lots as f64;
            let ask_size = ask.size_in_base_lots as f64;
            (
                num + ask_size * bid.price_in_ticks as f64 + bid_size * ask.price_in_ticks as f64,
                denom + bid_size + ask_size,
            )
        });
    (denom > 0.0).then(|| num / denom)
}

#[cfg(test)]
mod tests {
    use lobview_types::fixtures::SnapshotBuilder;

    use super::*;
    use crate::ladder::LadderLevel;

    fn level(price_in_ticks: u64, size_in_base_lots: u64) -> LadderLevel {
        LadderLevel {
            price_in_ticks,
            size_in_base_lots,
        }
    }

    fn meta() -> MarketMetadata {
        MarketMetadata::from_header(&SnapshotBuilder::new(1, 1, 1).header).unwrap()
    }

    #[test]
    fn two_sided_stats() {
        let ladder = Ladder {
            bids: vec![level(100, 10), level(99, 10)],
            asks: vec![level(102, 30), level(103, 10)],
        };
        let stats = BookStats::from_ladder(&ladder, &meta(), 1);
        assert_eq!(stats.best_bid_in_ticks, Some(100));
        assert_eq!(stats.best_ask_in_ticks, Some(102));
        assert_eq!(stats.spread_in_ticks, Some(2));
        assert_eq!(stats.mid_price_in_ticks, Some(101.0));
        // (30 * 100 + 10 * 102) / 40 = 100.5
        assert_eq!(stats.vwap_in_ticks, Some(100.5));
        // Fixture ticks are 0.001 quote.
        assert!((stats.best_ask.unwrap() - 0.102).abs() < 1e-12);
        assert!((stats.mid_price.unwrap() - 0.101).abs() < 1e-12);
        assert!((stats.vwap.unwrap() - 0.1005).abs() < 1e-12);
    }

    #[test]
    fn vwap_over_several_levels() {
        let ladder = Ladder {
            bids: vec![level(10, 1), level(9, 1)],
            asks: vec![level(11, 1), level(12, 1)],
        };
        // (11 + 10 + 12 + 9) / 4
        assert_eq!(vwap_in_ticks(&ladder, 2), Some(10.5));
        assert_eq!(vwap_in_ticks(&ladder, 0), None);
    }

    #[test]
    fn one_sided_book() {
        let ladder = Ladder {
            bids: vec![level(100, 1)],
            asks: vec![],
        };
        let stats = BookStats::from_ladder(&ladder, &meta(), 5);
        assert_eq!(stats.best_bid_in_ticks, Some(100));
        assert_eq!(stats.spread_in_ticks, None);
        assert_eq!(stats.mid_price, None);
        assert_eq!(stats.vwap, None);
        assert_eq!(BookStats::from_ladder(&Ladder::default(), &meta(), 5), BookStats::default());
    }

    #[test]
    fn crossed_book_has_negative_spread() {
        let ladder = Ladder {
            bids: vec![level(105, 1)],
            asks: vec![level(100, 1)],
        };
        assert_eq!(BookStats::from_ladder(&ladder, &meta(), 1).spread_in_ticks, Some(-5));
    }
}
