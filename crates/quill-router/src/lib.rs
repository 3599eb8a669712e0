//! # quill-router
//!
//! Smart order routing under a latency budget.
//!
//! This crate provides:
//! - [`venue::VenueInfo`] / [`venue::VenueState`]: the static registry
//!   entry and the mutable per-venue connectivity state
//! - heartbeat-driven health tracking (RTT EMA, EWMA deviation, timeout
//!   state machine)
//! - [`router::SmartOrderRouter`]: candidate filtering and weighted
//!   price/latency/liquidity scoring against a budget derived from the
//!   quoting model's economics

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod health;
pub mod router;
pub mod venue;

pub use router::{RoutingConfig, RoutingDecision, SmartOrderRouter};
pub use venue::{default_venue_profile, HeartbeatEvent, OrderOutcome, VenueInfo, VenueState};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::router::{RoutingConfig, RoutingDecision, SmartOrderRouter};
    pub use crate::venue::{
        default_venue_profile, HeartbeatEvent, OrderOutcome, VenueInfo, VenueState,
    };
}
