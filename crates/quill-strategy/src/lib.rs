//! # quill-strategy
//!
//! Quoting and risk for the market-making engine.
//!
//! This crate provides:
//! - [`quoting::AvellanedaStoikov`]: reservation-price quoting with
//!   latency-cost awareness
//! - [`risk::RiskPolicy`]: compile-time-constant risk limit tables and the
//!   pure order gate
//! - [`position::PositionTracker`]: inventory, average entry, and P&L
//! - [`volatility::EwmaVolatility`]: realized volatility estimate feeding
//!   the quoting model

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod position;
pub mod quoting;
pub mod risk;
pub mod volatility;

pub use position::PositionTracker;
pub use quoting::{AvellanedaStoikov, QuotingConfig};
pub use risk::{RiskLimits, RiskPolicy};
pub use volatility::EwmaVolatility;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::position::PositionTracker;
    pub use crate::quoting::{AvellanedaStoikov, QuotingConfig};
    pub use crate::risk::{RiskLimits, RiskPolicy};
    pub use crate::volatility::EwmaVolatility;
}
