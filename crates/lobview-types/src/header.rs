//! The fixed market header at the start of every market snapshot.
//!
//! ```text
//! offset  field
//!      0  discriminant                               u64
//!      8  status                                     u64
//!     16  bids_size / asks_size / num_seats          3 x u64
//!     40  base params  (decimals, vault_bump, mint, vault)
//!    112  base_lot_size                              u64
//!    120  quote params (decimals, vault_bump, mint, vault)
//!    192  quote_lot_size                             u64
//!    200  tick_size_in_quote_atoms_per_base_unit     u64
//!    208  authority, fee_recipient                   2 x [u8; 32]
//!    272  market_sequence_number                     u64
//!    280  successor                                  [u8; 32]
//!    312  raw_base_units_per_base_unit               u32
//!    316  padding                                    u32 + 32 x u64
//!    576  end
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MARKET_HEADER_LEN;
use crate::{ByteReader, Pubkey, Result};

/// Lifecycle status of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketStatus {
    Uninitialized,
    Active,
    PostOnly,
    Paused,
    Closed,
    Tombstoned,
    Unknown(u64),
}

impl From<u64> for MarketStatus {
    fn from(raw: u64) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Active,
            2 => Self::PostOnly,
            3 => Self::Paused,
            4 => Self::Closed,
            5 => Self::Tombstoned,
            other => Self::Unknown(other),
        }
    }
}

impl From<MarketStatus> for u64 {
    fn from(status: MarketStatus) -> Self {
        match status {
            MarketStatus::Uninitialized => 0,
            MarketStatus::Active => 1,
            MarketStatus::PostOnly => 2,
            MarketStatus::Paused => 3,
            MarketStatus::Closed => 4,
            MarketStatus::Tombstoned => 5,
            MarketStatus::Unknown(other) => other,
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Active => write!(f, "ACTIVE"),
            Self::PostOnly => write!(f, "POST_ONLY"),
            Self::Paused => write!(f, "PAUSED"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Tombstoned => write!(f, "TOMBSTONED"),
            Self::Unknown(raw) => write!(f, "UNKNOWN({raw})"),
        }
    }
}

/// Capacities of the three arena regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSizeParams {
    pub bids_size: u64,
    pub asks_size: u64,
    pub num_seats: u64,
}

/// Mint, vault and decimals of one side's token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    pub decimals: u32,
    pub vault_bump: u32,
    pub mint_key: Pubkey,
    pub vault_key: Pubkey,
}

impl TokenParams {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            decimals: reader.read_u32()?,
            vault_bump: reader.read_u32()?,
            mint_key: reader.read_pubkey()?,
            vault_key: reader.read_pubkey()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.decimals.to_le_bytes());
        out.extend_from_slice(&self.vault_bump.to_le_bytes());
        out.extend_from_slice(self.mint_key.as_bytes());
        out.extend_from_slice(self.vault_key.as_bytes());
    }
}

/// Sizing, token and lot parameters of a market. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketHeader {
    pub discriminant: u64,
    pub status: MarketStatus,
    pub market_size_params: MarketSizeParams,
    pub base_params: TokenParams,
    pub base_lot_size: u64,
    pub quote_params: TokenParams,
    pub quote_lot_size: u64,
    pub tick_size_in_quote_atoms_per_base_unit: u64,
    pub authority: Pubkey,
    pub fee_recipient: Pubkey,
    pub market_sequence_number: u64,
    pub successor: Pubkey,
    /// Zero on markets created before the field existed; treat as 1.
    pub raw_base_units_per_base_unit: u32,
}

impl MarketHeader {
    pub const LEN: usize = MARKET_HEADER_LEN;

    /// Decode the header from the first [`MarketHeader::LEN`] bytes of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data, "market header");
        let header = Self {
            discriminant: reader.read_u64()?,
            status: MarketStatus::from(reader.read_u64()?),
            market_size_params: MarketSizeParams {
                bids_size: reader.read_u64()?,
                asks_size: reader.read_u64()?,
                num_seats: reader.read_u64()?,
            },
            base_params: TokenParams::read(&mut reader)?,
            base_lot_size: reader.read_u64()?,
            quote_params: TokenParams::read(&mut reader)?,
            quote_lot_size: reader.read_u64()?,
            tick_size_in_quote_atoms_per_base_unit: reader.read_u64()?,
            authority: reader.read_pubkey()?,
            fee_recipient: reader.read_pubkey()?,
            market_sequence_number: reader.read_u64()?,
            successor: reader.read_pubkey()?,
            raw_base_units_per_base_unit: reader.read_u32()?,
        };
        // Trailing padding must still be present.
        reader.skip(Self::LEN - reader.position())?;
        Ok(header)
    }

    /// Encode into the on-disk layout, padding included.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.discriminant.to_le_bytes());
        out.extend_from_slice(&u64::from(self.status).to_le_bytes());
        out.extend_from_slice(&self.market_size_params.bids_size.to_le_bytes());
        out.extend_from_slice(&self.market_size_params.asks_size.to_le_bytes());
        out.extend_from_slice(&self.market_size_params.num_seats.to_le_bytes());
        self.base_params.write(&mut out);
        out.extend_from_slice(&self.base_lot_size.to_le_bytes());
        self.quote_params.write(&mut out);
        out.extend_from_slice(&self.quote_lot_size.to_le_bytes());
        out.extend_from_slice(&self.tick_size_in_quote_atoms_per_base_unit.to_le_bytes());
        out.extend_from_slice(self.authority.as_bytes());
        out.extend_from_slice(self.fee_recipient.as_bytes());
        out.extend_from_slice(&self.market_sequence_number.to_le_bytes());
        out.extend_from_slice(self.successor.as_bytes());
        out.extend_from_slice(&self.raw_base_units_per_base_unit.to_le_bytes());
        out.resize(Self::LEN, 0);
        out
    }

    /// `raw_base_units_per_base_unit`, with the legacy zero read as 1.
    #[must_use]
    pub fn effective_raw_base_units_per_base_unit(&self) -> u32 {
        self.raw_base_units_per_base_unit.max(1)
    }
}
