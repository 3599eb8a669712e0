//! Core domain types for the market-making engine.

mod side;
mod timestamp;
mod venue_id;

pub use side::Side;
pub use timestamp::Timestamp;
pub use venue_id::VenueId;

use crate::constants::MAX_DEPTH_LEVELS;

/// Snapshot of one instrument's book state.
///
/// Value object: `Copy`, fixed size, safe to pass through an SPSC ring.
/// Producers must supply non-decreasing timestamps; a backwards timestamp
/// is clipped to zero elapsed time downstream.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[archive(check_bytes)]
pub struct MarketTick {
    /// Mid price
    pub mid_price: f64,
    /// Best bid price
    pub bid_price: f64,
    /// Best ask price
    pub ask_price: f64,
    /// Best bid size
    pub bid_size: u32,
    /// Best ask size
    pub ask_size: u32,
    /// Volume traded since the previous tick
    pub trade_volume: u32,
    /// Bid sizes per level, best first
    pub bid_sizes: [u32; MAX_DEPTH_LEVELS],
    /// Ask sizes per level, best first
    pub ask_sizes: [u32; MAX_DEPTH_LEVELS],
    /// Number of populated depth levels (<= `MAX_DEPTH_LEVELS`)
    pub depth_levels: u32,
    /// Exchange timestamp
    pub timestamp: Timestamp,
}

impl Default for MarketTick {
    fn default() -> Self {
        Self {
            mid_price: 0.0,
            bid_price: 0.0,
            ask_price: 0.0,
            bid_size: 0,
            ask_size: 0,
            trade_volume: 0,
            bid_sizes: [0; MAX_DEPTH_LEVELS],
            ask_sizes: [0; MAX_DEPTH_LEVELS],
            depth_levels: 0,
            timestamp: Timestamp::EPOCH,
        }
    }
}

impl MarketTick {
    /// Bid-ask spread
    #[inline]
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    /// Number of usable depth levels, clamped to the array bound
    #[inline]
    #[must_use]
    pub fn levels(&self) -> usize {
        (self.depth_levels as usize).min(MAX_DEPTH_LEVELS)
    }
}

/// A single arrival in the order-flow point process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[archive(check_bytes)]
pub struct TradingEvent {
    /// Event arrival time
    pub arrival_time: Timestamp,
    /// Aggressor side
    pub side: Side,
}

/// Two-sided quote produced by the strategy.
///
/// Invariant: `ask_price >= bid_price` and `spread == ask - bid`, or the
/// strategy refused to quote and the four price/size fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Quotes {
    /// Mid price the quotes were computed from
    pub mid_price: f64,
    /// Bid price
    pub bid_price: f64,
    /// Ask price
    pub ask_price: f64,
    /// Quoted spread (`ask - bid`)
    pub spread: f64,
    /// Bid size
    pub bid_size: f64,
    /// Ask size
    pub ask_size: f64,
}

impl Quotes {
    /// An explicit refuse-to-quote result: prices and sizes zeroed.
    #[must_use]
    pub const fn refused(mid_price: f64) -> Self {
        Self {
            mid_price,
            bid_price: 0.0,
            ask_price: 0.0,
            spread: 0.0,
            bid_size: 0.0,
            ask_size: 0.0,
        }
    }

    /// Whether these quotes can be acted on (non-refused, two-sided).
    #[inline]
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.bid_price > 0.0 && self.ask_price >= self.bid_price && self.bid_size > 0.0
    }
}

/// Market stress regime driving routing urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MarketRegime {
    /// Normal market conditions
    Normal,
    /// Elevated volatility
    ElevatedVolatility,
    /// High stress, liquidity thinning
    HighStress,
    /// Trading halted or effectively untradeable
    Halted,
}

impl MarketRegime {
    /// Urgency multiplier applied when deriving the latency budget.
    /// Higher urgency shrinks the budget.
    #[inline]
    #[must_use]
    pub const fn urgency_multiplier(self) -> f64 {
        match self {
            MarketRegime::Normal => 1.0,
            MarketRegime::ElevatedVolatility => 1.5,
            MarketRegime::HighStress => 3.0,
            MarketRegime::Halted => 10.0,
        }
    }
}

/// An order ready to hand to an external venue transport.
///
/// Emitted together with the [`Quotes`] that produced it; a routing
/// decision with no selected venue never becomes an `OrderRequest`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderRequest {
    /// Destination venue
    pub venue: VenueId,
    /// Order side
    pub side: Side,
    /// Limit price
    pub price: f64,
    /// Order size in contracts
    pub size: f64,
    /// Creation time
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_spread_and_levels() {
        let tick = MarketTick {
            mid_price: 100.0,
            bid_price: 99.95,
            ask_price: 100.05,
            depth_levels: 3,
            ..MarketTick::default()
        };

        assert!((tick.spread() - 0.10).abs() < 1e-12);
        assert_eq!(tick.levels(), 3);

        let deep = MarketTick {
            depth_levels: 64,
            ..MarketTick::default()
        };
        assert_eq!(deep.levels(), MAX_DEPTH_LEVELS);
    }

    #[test]
    fn test_refused_quotes() {
        let q = Quotes::refused(100.0);
        assert!(!q.is_actionable());
        assert_eq!(q.bid_price, 0.0);
        assert_eq!(q.ask_price, 0.0);
        assert_eq!(q.bid_size, 0.0);
        assert_eq!(q.ask_size, 0.0);
    }

    #[test]
    fn test_actionable_quotes() {
        let q = Quotes {
            mid_price: 100.0,
            bid_price: 99.9,
            ask_price: 100.1,
            spread: 0.2,
            bid_size: 10.0,
            ask_size: 10.0,
        };
        assert!(q.is_actionable());
    }

    #[test]
    fn test_regime_urgency_ordering() {
        assert!(
            MarketRegime::Halted.urgency_multiplier()
                > MarketRegime::HighStress.urgency_multiplier()
        );
        assert!(
            MarketRegime::HighStress.urgency_multiplier()
                > MarketRegime::ElevatedVolatility.urgency_multiplier()
        );
        assert!((MarketRegime::Normal.urgency_multiplier() - 1.0).abs() < f64::EPSILON);
    }
}
