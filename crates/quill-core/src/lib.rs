//! # quill-core
//!
//! Core types, traits, and utilities for the Quill market-making engine.
//!
//! This crate provides:
//! - Domain types: `MarketTick`, `TradingEvent`, `Quotes`, `Side`, `Timestamp`, `VenueId`
//! - Monotonic and manual clocks behind the `Clock` trait
//! - Zero-copy serialization support via `rkyv`
//!
//! ## Example
//!
//! ```rust
//! use quill_core::types::{Side, Timestamp, TradingEvent};
//!
//! let event = TradingEvent {
//!     arrival_time: Timestamp::from_nanos(1_000_000),
//!     side: Side::Buy,
//! };
//! assert!(event.side.is_buy());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{ManualClock, MonotonicClock};
pub use constants::*;
pub use error::{Error, Result};
pub use traits::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::{ManualClock, MonotonicClock};
    pub use crate::constants::*;
    pub use crate::error::{Error, Result};
    pub use crate::traits::*;
    pub use crate::types::*;
}
