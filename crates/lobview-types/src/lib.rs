//! # lobview-types
//!
//! Shared types, errors, and configuration for the **lobview** snapshot decoder.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Pubkey`], [`OrderId`], [`Side`]
//! - **Market header**: [`MarketHeader`], [`MarketSizeParams`], [`TokenParams`], [`MarketStatus`]
//! - **Arena records**: [`RestingOrder`], [`RestingOrderLayout`], [`TraderState`]
//! - **Expiry cursor**: [`AsOf`]
//! - **Byte access**: [`ByteReader`] over little-endian fixed layouts
//! - **Configuration**: [`DecodeConfig`], [`TokenRegistry`], [`TokenConfig`], [`MarketLabels`]
//! - **Errors**: [`LobviewError`] with `LV_ERR_` prefix codes
//! - **Constants**: on-disk layout sizes and defaults
//! - **Fixtures** (`test-helpers`): byte-exact snapshot and arena builders

pub mod bytes;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod ids;
pub mod records;

#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures;

// Re-export all primary types at crate root for ergonomic imports:
//   use lobview_types::{MarketHeader, OrderId, RestingOrder, ...};

pub use bytes::*;
pub use config::*;
pub use error::*;
pub use header::*;
pub use ids::*;
pub use records::*;

// Constants are accessed via `lobview_types::constants::FOO`
// (not re-exported to avoid name collisions).
