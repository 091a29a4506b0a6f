//! Order book assembler: a full market snapshot in, [`MarketData`] out.
//!
//! ```text
//! [0, 576)            market header
//! [576, 832)          reserved padding
//! [832, 880)          six u64 market scalars
//! bids | asks | traders   three arena regions sized from the header
//! ```
//!
//! Bids come out sorted highest price first, asks lowest price first; ties
//! within a price go to the earlier placement (normalized sequence number).
//! Traders are addressed by `slot index + 1`, the index resting orders carry.

use std::collections::BTreeMap;

use lobview_types::constants::{MARKET_HEADER_LEN, MARKET_PADDING_LEN, MARKET_REGIONS_OFFSET};
use lobview_types::{
    ByteReader, DecodeConfig, LobviewError, MarketHeader, MarketLabels, MarketStatus, OrderId, Pubkey,
    RestingOrder, RestingOrderLayout, Result, Side, TraderState,
};
use serde::Serialize;

use crate::arena::{OrderIdRecord, TraderKeyRecord, TraderStateRecord, decode_arena, region_len};

/// One resting order with its key.
pub type BookEntry = (OrderId, RestingOrder);

/// Decoded, immutable view of one market snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MarketData {
    pub header: MarketHeader,
    pub labels: MarketLabels,
    pub base_lots_per_base_unit: u64,
    pub tick_size_in_quote_lots_per_base_unit: u64,
    pub order_sequence_number: u64,
    pub taker_fee_bps: u64,
    pub collected_quote_lot_fees: u64,
    pub unclaimed_quote_lot_fees: u64,
    /// Highest price first, then earliest placement.
    pub bids: Vec<BookEntry>,
    /// Lowest price first, then earliest placement.
    pub asks: Vec<BookEntry>,
    pub traders: BTreeMap<Pubkey, TraderState>,
    #[serde(skip)]
    trader_index_to_key: BTreeMap<u64, Pubkey>,
    #[serde(skip)]
    trader_key_to_index: BTreeMap<Pubkey, u64>,
}

impl MarketData {
    /// Decode a full market account.
    ///
    /// Fails without a partial result if the buffer is shorter than the
    /// header-declared regions or any region is internally inconsistent.
    pub fn from_bytes(data: &[u8], config: &DecodeConfig) -> Result<Self> {
        let header = MarketHeader::from_bytes(data)?;
        let layout = config.resting_order_layout()?;
        let sizes = header.market_size_params;

        let bids_len = region_len("bids", sizes.bids_size, &OrderIdRecord, &layout)?;
        let asks_len = region_len("asks", sizes.asks_size, &OrderIdRecord, &layout)?;
        let traders_len = region_len(
            "traders",
            sizes.num_seats,
            &TraderKeyRecord,
            &TraderStateRecord,
        )?;
        let total = MARKET_REGIONS_OFFSET
            .checked_add(bids_len)
            .and_then(|n| n.checked_add(asks_len))
            .and_then(|n| n.checked_add(traders_len))
            .ok_or_else(|| LobviewError::InvalidHeader {
                reason: "declared region sizes overflow the address space".into(),
            })?;
        if data.len() < total {
            return Err(LobviewError::BufferTooShort {
                region: "market",
                needed: total,
                available: data.len(),
            });
        }
        if data.len() > total {
            tracing::debug!(
                trailing = data.len() - total,
                "ignoring bytes after the trader region"
            );
        }

        let mut reader = ByteReader::new(data, "market");
        reader.skip(MARKET_HEADER_LEN + MARKET_PADDING_LEN)?;
        let base_lots_per_base_unit = reader.read_u64()?;
        let tick_size_in_quote_lots_per_base_unit = reader.read_u64()?;
        let order_sequence_number = reader.read_u64()?;
        let taker_fee_bps = reader.read_u64()?;
        let collected_quote_lot_fees = reader.read_u64()?;
        let unclaimed_quote_lot_fees = reader.read_u64()?;

        let bids_data = reader.take(bids_len)?;
        let asks_data = reader.take(asks_len)?;
        let traders_data = reader.take(traders_len)?;

        let bids = decode_side(bids_data, Side::Bid, sizes.bids_size, &layout)?;
        let asks = decode_side(asks_data, Side::Ask, sizes.asks_size, &layout)?;

        let trader_arena = decode_arena(
            traders_data,
            "traders",
            sizes.num_seats,
            &TraderKeyRecord,
            &TraderStateRecord,
        )?;
        let mut traders = BTreeMap::new();
        let mut trader_index_to_key = BTreeMap::new();
        let mut trader_key_to_index = BTreeMap::new();
        for slot in trader_arena {
            let index = u64::from(slot.index) + 1;
            trader_index_to_key.insert(index, slot.key);
            trader_key_to_index.insert(slot.key, index);
            traders.insert(slot.key, slot.value);
        }

        let labels = config.tokens.labels_for(&header);
        if let MarketStatus::Unknown(raw) = header.status {
            tracing::warn!(market = %labels.symbol(), raw, "market status not recognized");
        }
        tracing::debug!(
            market = %labels.symbol(),
            status = %header.status,
            bids = bids.len(),
            asks = asks.len(),
            traders = traders.len(),
            "assembled market snapshot"
        );

        Ok(Self {
            header,
            labels,
            base_lots_per_base_unit,
            tick_size_in_quote_lots_per_base_unit,
            order_sequence_number,
            taker_fee_bps,
            collected_quote_lot_fees,
            unclaimed_quote_lot_fees,
            bids,
            asks,
            traders,
            trader_index_to_key,
            trader_key_to_index,
        })
    }

    // =================================================================
    // Book access
    // =================================================================

    /// Orders of one side in priority order.
    #[must_use]
    pub fn book(&self, side: Side) -> &[BookEntry] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Best (highest) bid price in ticks.
    #[must_use]
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.first().map(|(id, _)| id.price_in_ticks)
    }

    /// Best (lowest) ask price in ticks.
    #[must_use]
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.first().map(|(id, _)| id.price_in_ticks)
    }

    /// Total number of resting orders on both sides.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    // =================================================================
    // Trader lookups
    // =================================================================

    pub fn trader_state(&self, trader: &Pubkey) -> Result<&TraderState> {
        self.traders
            .get(trader)
            .ok_or(LobviewError::TraderNotFound(*trader))
    }

    pub fn trader_key(&self, trader_index: u64) -> Result<Pubkey> {
        self.trader_index_to_key
            .get(&trader_index)
            .copied()
            .ok_or(LobviewError::TraderIndexNotFound(trader_index))
    }

    pub fn trader_index(&self, trader: &Pubkey) -> Result<u64> {
        self.trader_key_to_index
            .get(trader)
            .copied()
            .ok_or(LobviewError::TraderNotFound(*trader))
    }

    /// Number of registered traders.
    #[must_use]
    pub fn num_traders(&self) -> usize {
        self.traders.len()
    }

    /// Every order resting for `trader`, bids first, each side in priority order.
    pub fn orders_for_trader(&self, trader: &Pubkey) -> Result<Vec<(Side, OrderId, RestingOrder)>> {
        let index = self.trader_index(trader)?;
        Ok([Side::Bid, Side::Ask]
            .into_iter()
            .flat_map(|side| {
                self.book(side)
                    .iter()
                    .filter(move |(_, order)| order.trader_index == index)
                    .map(move |(id, order)| (side, *id, *order))
            })
            .collect())
    }
}

fn decode_side(
    data: &[u8],
    side: Side,
    capacity: u64,
    layout: &RestingOrderLayout,
) -> Result<Vec<BookEntry>> {
    let region = match side {
        Side::Bid => "bids",
        Side::Ask => "asks",
    };
    let arena = decode_arena(data, region, capacity, &OrderIdRecord, layout)?;
    let mut entries: Vec<BookEntry> = arena
        .into_iter()
        .map(|slot| (slot.key, slot.value))
        .collect();
    entries.sort_by(|(a, _), (b, _)| a.priority_cmp(b, side));
    Ok(entries)
}
