//! Fee-aware swap routing over a [`UiLadder`].
//!
//! A `Bid` swap buys base: quote goes in, the asks are walked, base comes
//! out. An `Ask` swap sells base: base goes in, the bids are walked, quote
//! comes out. A buy pays the taker fee on entry, so only `input * (1 - fee)`
//! of the quote reaches the book. A sell pays it on exit: the bids are
//! walked with the full base input and the fee is taken from the quote
//! proceeds.

use lobview_types::constants::BPS_DENOMINATOR;
use lobview_types::{LobviewError, Result, Side};
use serde::{Deserialize, Serialize};

use crate::ladder::{UiLadder, UiLadderLevel};

/// Result of one routed swap, in whole tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub side: Side,
    pub amount_in: f64,
    pub amount_out: f64,
    pub taker_fee_bps: u64,
}

/// Walks one ladder snapshot with a fixed taker fee.
#[derive(Debug, Clone, Copy)]
pub struct SwapRouter<'a> {
    ladder: &'a UiLadder,
    taker_fee_bps: u64,
}

impl<'a> SwapRouter<'a> {
    /// Fails if the fee would consume the whole input.
    pub fn new(ladder: &'a UiLadder, taker_fee_bps: u64) -> Result<Self> {
        if taker_fee_bps >= BPS_DENOMINATOR {
            return Err(LobviewError::Configuration(format!(
                "taker fee of {taker_fee_bps} bps leaves nothing to trade"
            )));
        }
        Ok(Self {
            ladder,
            taker_fee_bps,
        })
    }

    #[must_use]
    pub fn taker_fee_bps(&self) -> u64 {
        self.taker_fee_bps
    }

    /// `1 - fee`, always in `(0, 1]`.
    #[must_use]
    pub fn fee_multiplier(&self) -> f64 {
        1.0 - self.taker_fee_bps as f64 / BPS_DENOMINATOR as f64
    }

    /// Expected output for spending `input` (quote for `Bid`, base for `Ask`).
    #[must_use]
    pub fn out_from_in(&self, side: Side, input: f64) -> f64 {
        if input.is_nan() || input <= 0.0 {
            return 0.0;
        }
        match side {
            Side::Bid => self.walk_forward(side, input * self.fee_multiplier()),
            Side::Ask => self.walk_forward(side, input) * self.fee_multiplier(),
        }
    }

    /// Input required to receive `output` (base for `Bid`, quote for `Ask`).
    #[must_use]
    pub fn in_from_out(&self, side: Side, output: f64) -> f64 {
        if output.is_nan() || output <= 0.0 {
            return 0.0;
        }
        match side {
            Side::Bid => self.walk_inverse(side, output) / self.fee_multiplier(),
            Side::Ask => self.walk_inverse(side, output / self.fee_multiplier()),
        }
    }

    /// Fee-free output for an input that reaches the book in full.
    fn walk_forward(&self, side: Side, input: f64) -> f64 {
        let levels = self.ladder.levels(side.opposite());
        match side {
            Side::Bid => walk(levels, input, |l| l.quantity * l.price, |l| l.quantity, |rem, l| {
                rem / l.price
            }),
            Side::Ask => walk(levels, input, |l| l.quantity, |l| l.quantity * l.price, |rem, l| {
                rem * l.price
            }),
        }
    }

    /// Fee-free input needed for the book to yield `output`.
    fn walk_inverse(&self, side: Side, output: f64) -> f64 {
        let levels = self.ladder.levels(side.opposite());
        match side {
            Side::Bid => walk(levels, output, |l| l.quantity, |l| l.quantity * l.price, |rem, l| {
                rem * l.price
            }),
            Side::Ask => walk(levels, output, |l| l.quantity * l.price, |l| l.quantity, |rem, l| {
                rem / l.price
            }),
        }
    }

    #[must_use]
    pub fn quote_exact_in(&self, side: Side, amount_in: f64) -> SwapQuote {
        SwapQuote {
            side,
            amount_in,
            amount_out: self.out_from_in(side, amount_in),
            taker_fee_bps: self.taker_fee_bps,
        }
    }

    #[must_use]
    pub fn quote_exact_out(&self, side: Side, amount_out: f64) -> SwapQuote {
        SwapQuote {
            side,
            amount_in: self.in_from_out(side, amount_out),
            amount_out,
            taker_fee_bps: self.taker_fee_bps,
        }
    }
}

/// Consume levels until `budget` runs out.
///
/// `spend` is what a whole level costs against the budget, `gain` what it
/// yields, and `partial` what the leftover budget yields at a level too
/// large to take whole. Levels beyond the book's depth are simply absent.
fn walk(
    levels: &[UiLadderLevel],
    budget: f64,
    spend: impl Fn(&UiLadderLevel) -> f64,
    gain: impl Fn(&UiLadderLevel) -> f64,
    partial: impl Fn(f64, &UiLadderLevel) -> f64,
) -> f64 {
    let mut remaining = budget;
    let mut acquired = 0.0;
    for level in levels {
        if remaining <= 0.0 {
            break;
        }
        let cost = spend(level);
        if cost > remaining {
            acquired += partial(remaining, level);
            break;
        }
        acquired += gain(level);
        remaining -= cost;
    }
    acquired
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn level(price: f64, quantity: f64) -> UiLadderLevel {
        UiLadderLevel { price, quantity }
    }

    fn asks_only() -> UiLadder {
        UiLadder {
            bids: vec![],
            asks: vec![level(25.0, 10.0), level(30.0, 5.0), level(35.0, 2.0)],
        }
    }

    fn bids_only() -> UiLadder {
        UiLadder {
            bids: vec![level(35.0, 2.0), level(30.0, 5.0), level(25.0, 10.0)],
            asks: vec![],
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn buy_walks_asks_without_fee() {
        let ladder = asks_only();
        let router = SwapRouter::new(&ladder, 0).unwrap();
        assert!(close(router.out_from_in(Side::Bid, 250.0), 10.0));
        assert!(close(router.in_from_out(Side::Bid, 10.0), 250.0));
        // Into the second level: 250 buys 10, 60 more buys 2 at 30.
        assert!(close(router.out_from_in(Side::Bid, 310.0), 12.0));
        assert!(close(router.in_from_out(Side::Bid, 12.0), 310.0));
    }

    #[test]
    fn sell_walks_bids_without_fee() {
        let ladder = bids_only();
        let router = SwapRouter::new(&ladder, 0).unwrap();
        // 2 at 35, then 1 at 30.
        assert!(close(router.out_from_in(Side::Ask, 3.0), 100.0));
        assert!(close(router.in_from_out(Side::Ask, 100.0), 3.0));
    }

    #[test]
    fn buy_fee_is_charged_on_input() {
        let ladder = asks_only();
        let free = SwapRouter::new(&ladder, 0).unwrap();
        let paid = SwapRouter::new(&ladder, 5).unwrap();
        assert!(close(paid.fee_multiplier(), 0.9995));

        assert!(close(
            paid.out_from_in(Side::Bid, 250.0),
            free.out_from_in(Side::Bid, 250.0 * 0.9995)
        ));
        assert!(close(paid.out_from_in(Side::Bid, 250.0), 9.995));
        assert!(close(
            paid.in_from_out(Side::Bid, 10.0),
            free.in_from_out(Side::Bid, 10.0) / 0.9995
        ));
    }

    #[test]
    fn sell_fee_is_taken_from_proceeds() {
        let ladder = UiLadder {
            bids: vec![level(35.0, 2.0), level(30.0, 5.0)],
            asks: vec![],
        };
        let free = SwapRouter::new(&ladder, 0).unwrap();
        let paid = SwapRouter::new(&ladder, 1_000).unwrap();

        // 3 base crosses both levels: 2 @ 35 + 1 @ 30 = 100, less 10%.
        assert!(close(paid.out_from_in(Side::Ask, 3.0), 90.0));
        assert!(close(
            paid.out_from_in(Side::Ask, 3.0),
            free.out_from_in(Side::Ask, 3.0) * 0.9
        ));
        // Netting 90 quote needs the full 3 base.
        assert!(close(paid.in_from_out(Side::Ask, 90.0), 3.0));
        assert!(close(
            paid.in_from_out(Side::Ask, 45.0),
            free.in_from_out(Side::Ask, 50.0)
        ));
    }

    #[test]
    fn directions_invert_with_fee() {
        let ladder = UiLadder {
            bids: bids_only().bids,
            asks: asks_only().asks,
        };
        let router = SwapRouter::new(&ladder, 30).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let base = rng.gen_range(0.01..17.0);
            let quote = router.in_from_out(Side::Bid, base);
            assert!(close(router.out_from_in(Side::Bid, quote), base), "buy {base}");
            let proceeds = router.out_from_in(Side::Ask, base);
            assert!(close(router.in_from_out(Side::Ask, proceeds), base), "sell {base}");
        }
    }

    #[test]
    fn zero_and_negative_budgets_yield_zero() {
        let ladder = asks_only();
        let router = SwapRouter::new(&ladder, 5).unwrap();
        assert_eq!(router.out_from_in(Side::Bid, 0.0), 0.0);
        assert_eq!(router.in_from_out(Side::Bid, 0.0), 0.0);
        assert_eq!(router.out_from_in(Side::Bid, -1.0), 0.0);
        assert_eq!(router.out_from_in(Side::Bid, f64::NAN), 0.0);
    }

    #[test]
    fn budget_beyond_depth_returns_full_depth() {
        let ladder = asks_only();
        let router = SwapRouter::new(&ladder, 0).unwrap();
        // Whole book: 10 + 5 + 2 base for 250 + 150 + 70 quote.
        assert!(close(router.out_from_in(Side::Bid, 1_000_000.0), 17.0));
        assert!(close(router.in_from_out(Side::Bid, 1_000.0), 470.0));
    }

    #[test]
    fn empty_side_routes_nothing() {
        let ladder = asks_only();
        let router = SwapRouter::new(&ladder, 0).unwrap();
        assert_eq!(router.out_from_in(Side::Ask, 10.0), 0.0);
        assert_eq!(router.in_from_out(Side::Ask, 10.0), 0.0);

        let empty = UiLadder::default();
        let router = SwapRouter::new(&empty, 30).unwrap();
        assert_eq!(router.out_from_in(Side::Bid, 100.0), 0.0);
    }

    #[test]
    fn directions_invert_without_fee() {
        let ladder = asks_only();
        let router = SwapRouter::new(&ladder, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let base = rng.gen_range(0.01..17.0);
            let quote = router.in_from_out(Side::Bid, base);
            assert!(close(router.out_from_in(Side::Bid, quote), base), "base {base}");
        }
    }

    #[test]
    fn quotes_carry_both_legs() {
        let ladder = bids_only();
        let router = SwapRouter::new(&ladder, 0).unwrap();
        let quote = router.quote_exact_in(Side::Ask, 2.0);
        assert!(close(quote.amount_out, 70.0));
        let quote = router.quote_exact_out(Side::Ask, 70.0);
        assert!(close(quote.amount_in, 2.0));
        assert_eq!(quote.taker_fee_bps, 0);
    }

    #[test]
    fn fee_of_whole_input_is_rejected() {
        let ladder = UiLadder::default();
        assert!(matches!(
            SwapRouter::new(&ladder, 10_000),
            Err(LobviewError::Configuration(_))
        ));
    }
}
