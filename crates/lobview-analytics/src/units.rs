//! Conversions between on-book integers (lots, ticks, atoms) and human units.
//!
//! Terms used throughout:
//!
//! - **atom**: the token's smallest native unit (`10^-decimals` of a token)
//! - **raw base unit**: one whole base token
//! - **base unit**: the market's base unit, `raw_base_units_per_base_unit`
//!   whole tokens (almost always 1)
//! - **lot**: the market's trading increment, a fixed number of atoms
//! - **tick**: the price increment, in quote atoms per base unit
//!
//! Float conversions use natural floating-point division. Exact amounts are
//! rendered through [`Decimal`].

use lobview_types::{LobviewError, MarketHeader, Pubkey, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scaling constants of one market, derived from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMetadata {
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_decimals: u32,
    pub quote_decimals: u32,
    /// `10^base_decimals`
    pub base_atoms_per_raw_base_unit: u64,
    /// `10^quote_decimals`
    pub quote_atoms_per_quote_unit: u64,
    pub base_atoms_per_base_lot: u64,
    pub quote_atoms_per_quote_lot: u64,
    pub tick_size_in_quote_atoms_per_base_unit: u64,
    pub num_base_lots_per_base_unit: u64,
    pub raw_base_units_per_base_unit: u32,
}

impl MarketMetadata {
    /// Derive the scaling constants, rejecting headers that would divide by zero.
    pub fn from_header(header: &MarketHeader) -> Result<Self> {
        let invalid = |reason: &str| LobviewError::InvalidHeader {
            reason: reason.to_string(),
        };
        let base_atoms_per_raw_base_unit = 10u64
            .checked_pow(header.base_params.decimals)
            .ok_or_else(|| invalid("base decimals overflow u64"))?;
        let quote_atoms_per_quote_unit = 10u64
            .checked_pow(header.quote_params.decimals)
            .ok_or_else(|| invalid("quote decimals overflow u64"))?;
        if header.base_lot_size == 0 || header.quote_lot_size == 0 {
            return Err(invalid("lot size is zero"));
        }
        if header.tick_size_in_quote_atoms_per_base_unit == 0 {
            return Err(invalid("tick size is zero"));
        }
        let raw_base_units_per_base_unit = header.effective_raw_base_units_per_base_unit();
        let num_base_lots_per_base_unit = base_atoms_per_raw_base_unit
            .checked_mul(u64::from(raw_base_units_per_base_unit))
            .ok_or_else(|| invalid("base unit size overflows u64"))?
            / header.base_lot_size;
        if num_base_lots_per_base_unit == 0 {
            return Err(invalid("base lot is larger than a base unit"));
        }

        Ok(Self {
            base_mint: header.base_params.mint_key,
            quote_mint: header.quote_params.mint_key,
            base_decimals: header.base_params.decimals,
            quote_decimals: header.quote_params.decimals,
            base_atoms_per_raw_base_unit,
            quote_atoms_per_quote_unit,
            base_atoms_per_base_lot: header.base_lot_size,
            quote_atoms_per_quote_lot: header.quote_lot_size,
            tick_size_in_quote_atoms_per_base_unit: header.tick_size_in_quote_atoms_per_base_unit,
            num_base_lots_per_base_unit,
            raw_base_units_per_base_unit,
        })
    }

    // =================================================================
    // Base quantities
    // =================================================================

    /// Whole base tokens to base lots, rounded down.
    #[must_use]
    pub fn raw_base_units_to_base_lots_rounded_down(&self, raw_base_units: f64) -> u64 {
        (self.raw_base_units_to_fractional_lots(raw_base_units)).floor() as u64
    }

    /// Whole base tokens to base lots, rounded up.
    #[must_use]
    pub fn raw_base_units_to_base_lots_rounded_up(&self, raw_base_units: f64) -> u64 {
        (self.raw_base_units_to_fractional_lots(raw_base_units)).ceil() as u64
    }

    fn raw_base_units_to_fractional_lots(&self, raw_base_units: f64) -> f64 {
        let base_units = raw_base_units / f64::from(self.raw_base_units_per_base_unit);
        base_units * self.num_base_lots_per_base_unit as f64
    }

    #[must_use]
    pub fn base_atoms_to_base_lots_rounded_down(&self, base_atoms: u64) -> u64 {
        base_atoms / self.base_atoms_per_base_lot
    }

    #[must_use]
    pub fn base_atoms_to_base_lots_rounded_up(&self, base_atoms: u64) -> u64 {
        base_atoms.div_ceil(self.base_atoms_per_base_lot)
    }

    #[must_use]
    pub fn base_lots_to_base_atoms(&self, base_lots: u64) -> u64 {
        base_lots.saturating_mul(self.base_atoms_per_base_lot)
    }

    /// Base lots as a floating count of whole base tokens.
    #[must_use]
    pub fn base_lots_to_raw_base_units_as_float(&self, base_lots: u64) -> f64 {
        self.base_atoms_to_raw_base_units_as_float(self.base_lots_to_base_atoms(base_lots))
    }

    #[must_use]
    pub fn base_atoms_to_raw_base_units_as_float(&self, base_atoms: u64) -> f64 {
        base_atoms as f64 / self.base_atoms_per_raw_base_unit as f64
    }

    // =================================================================
    // Quote quantities
    // =================================================================

    /// Whole quote tokens to quote lots, truncated.
    #[must_use]
    pub fn quote_units_to_quote_lots(&self, quote_units: f64) -> u64 {
        (quote_units * self.quote_atoms_per_quote_unit as f64 / self.quote_atoms_per_quote_lot as f64)
            as u64
    }

    #[must_use]
    pub fn quote_atoms_to_quote_lots_rounded_down(&self, quote_atoms: u64) -> u64 {
        quote_atoms / self.quote_atoms_per_quote_lot
    }

    #[must_use]
    pub fn quote_atoms_to_quote_lots_rounded_up(&self, quote_atoms: u64) -> u64 {
        quote_atoms.div_ceil(self.quote_atoms_per_quote_lot)
    }

    #[must_use]
    pub fn quote_lots_to_quote_atoms(&self, quote_lots: u64) -> u64 {
        quote_lots.saturating_mul(self.quote_atoms_per_quote_lot)
    }

    /// Quote lots as a floating count of whole quote tokens.
    #[must_use]
    pub fn quote_lots_to_quote_units_as_float(&self, quote_lots: u64) -> f64 {
        self.quote_atoms_to_quote_units_as_float(self.quote_lots_to_quote_atoms(quote_lots))
    }

    #[must_use]
    pub fn quote_atoms_to_quote_units_as_float(&self, quote_atoms: u64) -> f64 {
        quote_atoms as f64 / self.quote_atoms_per_quote_unit as f64
    }

    // =================================================================
    // Prices
    // =================================================================

    /// Quote atoms exchanged by `base_lots` at `price_in_ticks`.
    #[must_use]
    pub fn order_to_quote_atoms(&self, base_lots: u64, price_in_ticks: u64) -> u64 {
        let atoms = (u128::from(base_lots) * u128::from(price_in_ticks))
            .saturating_mul(u128::from(self.tick_size_in_quote_atoms_per_base_unit))
            / u128::from(self.num_base_lots_per_base_unit);
        u64::try_from(atoms).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn float_price_to_ticks_rounded_down(&self, price: f64) -> u64 {
        self.float_price_to_fractional_ticks(price).floor() as u64
    }

    #[must_use]
    pub fn float_price_to_ticks_rounded_up(&self, price: f64) -> u64 {
        self.float_price_to_fractional_ticks(price).ceil() as u64
    }

    fn float_price_to_fractional_ticks(&self, price: f64) -> f64 {
        price
            * f64::from(self.raw_base_units_per_base_unit)
            * self.quote_atoms_per_quote_unit as f64
            / self.tick_size_in_quote_atoms_per_base_unit as f64
    }

    /// Price of one whole base token, in whole quote tokens.
    #[must_use]
    pub fn ticks_to_float_price(&self, ticks: u64) -> f64 {
        ticks as f64 * self.tick_size_in_quote_atoms_per_base_unit as f64
            / (self.quote_atoms_per_quote_unit as f64 * f64::from(self.raw_base_units_per_base_unit))
    }

    // =================================================================
    // Exact rendering
    // =================================================================

    pub fn base_atoms_to_decimal(&self, base_atoms: u64) -> Result<Decimal> {
        atoms_to_decimal(base_atoms, self.base_decimals)
    }

    pub fn quote_atoms_to_decimal(&self, quote_atoms: u64) -> Result<Decimal> {
        atoms_to_decimal(quote_atoms, self.quote_decimals)
    }
}

/// Exact decimal value of `atoms` for a token with `decimals` places,
/// with trailing zeros dropped.
pub fn atoms_to_decimal(atoms: u64, decimals: u32) -> Result<Decimal> {
    Decimal::try_from_i128_with_scale(i128::from(atoms), decimals)
        .map(|d| d.normalize())
        .map_err(|e| LobviewError::Internal(format!("cannot scale {atoms} by 10^-{decimals}: {e}")))
}
