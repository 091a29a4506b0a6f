//! Decode configuration and token labelling.
//!
//! Nothing here is global: callers build a [`DecodeConfig`] (usually from a
//! JSON file) and pass it to the assembler explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::RESTING_ORDER_LEN;
use crate::{LobviewError, MarketHeader, Pubkey, RestingOrderLayout, Result};

/// A known token: its mint and the symbol to display for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub mint: Pubkey,
}

/// Mint-to-symbol table used to label decoded markets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenRegistry {
    pub tokens: Vec<TokenConfig>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new(tokens: Vec<TokenConfig>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn symbol_for(&self, mint: &Pubkey) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.mint == *mint)
            .map(|t| t.symbol.as_str())
    }

    /// Labels for a market; unknown mints fall back to their short hex form.
    #[must_use]
    pub fn labels_for(&self, header: &MarketHeader) -> MarketLabels {
        let label = |mint: &Pubkey| {
            self.symbol_for(mint)
                .map_or_else(|| mint.short(), str::to_string)
        };
        MarketLabels {
            base: label(&header.base_params.mint_key),
            quote: label(&header.quote_params.mint_key),
        }
    }
}

/// Human-readable names of a market's base and quote tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLabels {
    pub base: String,
    pub quote: String,
}

impl MarketLabels {
    /// Returns the market symbol (e.g., "SOL/USDC").
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

/// Parameters of a snapshot decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Declared size of a resting-order value record.
    #[serde(default = "default_resting_order_size")]
    pub resting_order_size: usize,
    /// Which resting-order shape the snapshot was written with. Both shapes
    /// share one size, so this cannot be inferred from the bytes.
    #[serde(default)]
    pub resting_orders: RestingOrderLayout,
    #[serde(default)]
    pub tokens: TokenRegistry,
}

fn default_resting_order_size() -> usize {
    RESTING_ORDER_LEN
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            resting_order_size: default_resting_order_size(),
            resting_orders: RestingOrderLayout::default(),
            tokens: TokenRegistry::default(),
        }
    }
}

impl DecodeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LobviewError::Configuration(e.to_string()))?;
        // Reject an unknown record size at load time, not mid-decode.
        config.resting_order_layout()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn resting_order_layout(&self) -> Result<RestingOrderLayout> {
        self.resting_orders.for_value_size(self.resting_order_size)
    }
}
