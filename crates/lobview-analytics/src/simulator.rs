//! Integer market-order simulation over a raw [`Ladder`].
//!
//! Unlike the router, everything here stays in lots: the result is exactly
//! what an immediate-or-cancel order would fill against the snapshot,
//! rounded down to whole lots.

use lobview_decode::MarketData;
use lobview_types::{LobviewError, Result, Side};
use serde::{Deserialize, Serialize};

use crate::ladder::Ladder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummaryInLots {
    pub base_lots_filled: u64,
    pub quote_lots_filled: u64,
}

/// A raw ladder together with the market's lot/tick scaling.
#[derive(Debug, Clone, Copy)]
pub struct MarketSimulator<'a> {
    ladder: &'a Ladder,
    base_lots_per_base_unit: u64,
    tick_size_in_quote_lots_per_base_unit: u64,
}

impl<'a> MarketSimulator<'a> {
    /// Simulate against `ladder` using the scaling stored in `market`.
    pub fn new(ladder: &'a Ladder, market: &MarketData) -> Result<Self> {
        Self::with_scaling(
            ladder,
            market.base_lots_per_base_unit,
            market.tick_size_in_quote_lots_per_base_unit,
        )
    }

    pub fn with_scaling(
        ladder: &'a Ladder,
        base_lots_per_base_unit: u64,
        tick_size_in_quote_lots_per_base_unit: u64,
    ) -> Result<Self> {
        if base_lots_per_base_unit == 0 {
            return Err(LobviewError::InvalidHeader {
                reason: "base lots per base unit is zero".into(),
            });
        }
        Ok(Self {
            ladder,
            base_lots_per_base_unit,
            tick_size_in_quote_lots_per_base_unit,
        })
    }

    /// Quote lots exchanged for `base_lots` at `price_in_ticks`.
    fn quote_lots(&self, base_lots: u64, price_in_ticks: u64) -> u128 {
        u128::from(base_lots) * self.quote_lots_per_base_unit(price_in_ticks)
            / u128::from(self.base_lots_per_base_unit)
    }

    fn quote_lots_per_base_unit(&self, price_in_ticks: u64) -> u128 {
        u128::from(price_in_ticks) * u128::from(self.tick_size_in_quote_lots_per_base_unit)
    }

    /// Spend up to `quote_lots` buying from the asks.
    #[must_use]
    pub fn sell_quote(&self, quote_lots: u64) -> SimulationSummaryInLots {
        let mut remaining = u128::from(quote_lots);
        let mut base_lots = 0u64;

        for ask in &self.ladder.asks {
            if remaining == 0 {
                break;
            }
            let unit_price = self.quote_lots_per_base_unit(ask.price_in_ticks);
            let affordable = if unit_price == 0 {
                u128::from(ask.size_in_base_lots)
            } else {
                remaining * u128::from(self.base_lots_per_base_unit) / unit_price
            };
            let lots = affordable.min(u128::from(ask.size_in_base_lots)) as u64;
            base_lots = base_lots.saturating_add(lots);
            remaining -= self.quote_lots(lots, ask.price_in_ticks).min(remaining);
        }

        SimulationSummaryInLots {
            base_lots_filled: base_lots,
            quote_lots_filled: (u128::from(quote_lots) - remaining) as u64,
        }
    }

    /// Sell up to `base_lots` into the bids.
    #[must_use]
    pub fn sell_base(&self, base_lots: u64) -> SimulationSummaryInLots {
        let mut remaining = base_lots;
        let mut quote_lots = 0u128;

        for bid in &self.ladder.bids {
            if remaining == 0 {
                break;
            }
            let lots = remaining.min(bid.size_in_base_lots);
            quote_lots += self.quote_lots(lots, bid.price_in_ticks);
            remaining -= lots;
        }

        SimulationSummaryInLots {
            base_lots_filled: base_lots - remaining,
            quote_lots_filled: u64::try_from(quote_lots).unwrap_or(u64::MAX),
        }
    }

    /// `Bid` spends quote lots, `Ask` sells base lots.
    #[must_use]
    pub fn simulate_market_sell(&self, side: Side, size_in_lots: u64) -> SimulationSummaryInLots {
        match side {
            Side::Bid => self.sell_quote(size_in_lots),
            Side::Ask => self.sell_base(size_in_lots),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::LadderLevel;

    fn level(price_in_ticks: u64, size_in_base_lots: u64) -> LadderLevel {
        LadderLevel {
            price_in_ticks,
            size_in_base_lots,
        }
    }

    /// Simplified SOL/USDC book: 1000 lots and 1000 quote lots of tick per SOL.
    fn sol_usdc() -> Ladder {
        Ladder {
            bids: vec![level(22_719, 1_087), level(22_713, 1_087), level(22_695, 1_087)],
            asks: vec![level(22_720, 12_342), level(22_720, 123_391), level(22_720, 172_641)],
        }
    }

    #[test]
    fn simulates_sol_usdc_fills() {
        let ladder = sol_usdc();
        let sim = MarketSimulator::with_scaling(&ladder, 1_000, 1_000).unwrap();
        let cases = [
            (Side::Ask, 3_000, 3_000, 68_130_654),
            (Side::Ask, 6_000, 3_261, 74_054_049),
            (Side::Bid, 68_000_000, 2_992, 67_978_240),
            (Side::Ask, 0, 0, 0),
            (Side::Bid, 0, 0, 0),
        ];
        for (side, input, base, quote) in cases {
            let result = sim.simulate_market_sell(side, input);
            assert_eq!(result.base_lots_filled, base, "{side} {input}");
            assert_eq!(result.quote_lots_filled, quote, "{side} {input}");
        }
    }

    #[test]
    fn selling_more_than_the_book_fills_the_book() {
        let ladder = sol_usdc();
        let sim = MarketSimulator::with_scaling(&ladder, 1_000, 1_000).unwrap();
        let depth: u64 = ladder.bids.iter().map(|l| l.size_in_base_lots).sum();
        let result = sim.simulate_market_sell(Side::Ask, depth * 2);
        assert_eq!(result.base_lots_filled, depth);

        let notional: u64 = ladder
            .asks
            .iter()
            .map(|l| l.size_in_base_lots * l.price_in_ticks)
            .sum();
        let result = sim.simulate_market_sell(Side::Bid, notional * 2);
        assert_eq!(result.quote_lots_filled, notional);
    }

    #[test]
    fn scaling_applies_to_quote_lots() {
        // 10 lots per unit, 5 quote lots per tick per unit:
        // one lot at 4 ticks costs 4 * 5 / 10 = 2 quote lots.
        let ladder = Ladder {
            bids: vec![level(4, 10)],
            asks: vec![level(4, 10)],
        };
        let sim = MarketSimulator::with_scaling(&ladder, 10, 5).unwrap();
        assert_eq!(
            sim.sell_base(3),
            SimulationSummaryInLots {
                base_lots_filled: 3,
                quote_lots_filled: 6,
            }
        );
        assert_eq!(
            sim.sell_quote(7),
            SimulationSummaryInLots {
                base_lots_filled: 3,
                quote_lots_filled: 6,
            }
        );
    }

    #[test]
    fn empty_ladder_fills_nothing() {
        let ladder = Ladder::default();
        let sim = MarketSimulator::with_scaling(&ladder, 1_000, 1_000).unwrap();
        assert_eq!(sim.simulate_market_sell(Side::Ask, 1_000), SimulationSummaryInLots::default());
        assert_eq!(sim.simulate_market_sell(Side::Bid, 1_000), SimulationSummaryInLots::default());
    }

    #[test]
    fn zero_lots_per_unit_is_rejected() {
        let ladder = Ladder::default();
        assert!(MarketSimulator::with_scaling(&ladder, 0, 1).is_err());
    }
}
