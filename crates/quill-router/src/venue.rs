//! Venue registry entries and per-venue mutable state.

use quill_core::types::{Side, Timestamp, VenueId};
use serde::{Deserialize, Serialize};

/// Static registry entry for a trading venue.
///
/// Registered at startup; removable by the control plane. Depth and
/// fill-rate fields are priors that observed order results refine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueInfo {
    /// Venue identifier
    pub venue_id: VenueId,
    /// Human-readable name
    pub venue_name: String,
    /// Whether the control plane currently allows routing here
    pub is_active: bool,
    /// Transport endpoint (opaque to the core)
    pub endpoint: String,
    /// Expected round-trip latency in microseconds
    pub baseline_latency_us: f64,
    /// Maker fee in basis points (negative = rebate)
    pub maker_fee_bps: f64,
    /// Taker fee in basis points
    pub taker_fee_bps: f64,
    /// Smallest routable order
    pub min_order_size: f64,
    /// Largest routable order
    pub max_order_size: f64,
    /// Typical resting bid-side depth
    pub typical_bid_depth: f64,
    /// Typical resting ask-side depth
    pub typical_ask_depth: f64,
    /// Prior fill rate before any orders have been observed
    pub fill_rate: f64,
}

/// Mutable connectivity and execution state for one venue.
///
/// Invariants maintained by the health tracker: `std_dev_rtt_us >= 0`
/// and `ema_rtt_us > 0` after any update; a disconnected venue is never
/// selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VenueState {
    /// When the last heartbeat was sent
    pub last_heartbeat_sent: Timestamp,
    /// When the last heartbeat response arrived
    pub last_heartbeat_received: Timestamp,
    /// Most recent observed round-trip time in microseconds
    pub current_rtt_us: f64,
    /// Exponentially weighted average RTT
    pub ema_rtt_us: f64,
    /// Exponentially weighted RTT standard deviation
    pub std_dev_rtt_us: f64,
    /// Connectivity verdict
    pub is_connected: bool,
    /// Consecutive heartbeat timeouts since the last receipt
    pub consecutive_timeouts: u64,
    /// Heartbeats sent
    pub heartbeats_sent: u64,
    /// Heartbeats received
    pub heartbeats_received: u64,
    /// Orders routed to this venue
    pub orders_sent: u64,
    /// Orders confirmed filled
    pub orders_filled: u64,
    /// Orders rejected by the venue
    pub orders_rejected: u64,
    /// Orders that timed out
    pub orders_timeout: u64,
}

impl VenueState {
    /// Fresh state seeded from the venue's baseline latency.
    #[must_use]
    pub fn for_venue(venue: &VenueInfo) -> Self {
        Self {
            last_heartbeat_sent: Timestamp::EPOCH,
            last_heartbeat_received: Timestamp::EPOCH,
            current_rtt_us: venue.baseline_latency_us,
            ema_rtt_us: venue.baseline_latency_us,
            std_dev_rtt_us: venue.baseline_latency_us * 0.1,
            is_connected: true,
            consecutive_timeouts: 0,
            heartbeats_sent: 0,
            heartbeats_received: 0,
            orders_sent: 0,
            orders_filled: 0,
            orders_rejected: 0,
            orders_timeout: 0,
        }
    }

    /// Fill rate observed from routed orders, falling back to the prior
    /// until the first order completes.
    #[must_use]
    pub fn observed_fill_rate(&self, prior: f64) -> f64 {
        if self.orders_sent > 0 {
            self.orders_filled as f64 / self.orders_sent as f64
        } else {
            prior
        }
    }
}

/// A completed heartbeat round trip, delivered from the transport.
///
/// `Copy` so transports can hand these over an SPSC ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatEvent {
    /// Venue that answered
    pub venue: VenueId,
    /// When the heartbeat was sent
    pub sent: Timestamp,
    /// When the response arrived
    pub received: Timestamp,
}

/// Terminal outcome of a routed order, delivered from the transport.
///
/// Echoes the order's side, price, and size so the strategy thread can
/// update its position without keeping an in-flight order table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderOutcome {
    /// Venue the order was routed to
    pub venue: VenueId,
    /// Whether the order filled
    pub filled: bool,
    /// Whether the order timed out
    pub timeout: bool,
    /// Order side
    pub side: Side,
    /// Fill price
    pub price: f64,
    /// Order size in contracts
    pub size: f64,
}

/// Default venue registry profile used when no registry is configured.
#[must_use]
pub fn default_venue_profile() -> Vec<VenueInfo> {
    vec![
        VenueInfo {
            venue_id: VenueId::new("BINANCE").expect("static id"),
            venue_name: "Binance".to_string(),
            is_active: true,
            endpoint: "api.binance.com:443".to_string(),
            baseline_latency_us: 500.0,
            maker_fee_bps: -1.0,
            taker_fee_bps: 4.0,
            min_order_size: 0.001,
            max_order_size: 10_000.0,
            typical_bid_depth: 5_000.0,
            typical_ask_depth: 5_000.0,
            fill_rate: 0.95,
        },
        VenueInfo {
            venue_id: VenueId::new("COINBASE").expect("static id"),
            venue_name: "Coinbase Pro".to_string(),
            is_active: true,
            endpoint: "api.pro.coinbase.com:443".to_string(),
            baseline_latency_us: 800.0,
            maker_fee_bps: 0.0,
            taker_fee_bps: 5.0,
            min_order_size: 0.01,
            max_order_size: 5_000.0,
            typical_bid_depth: 3_000.0,
            typical_ask_depth: 3_000.0,
            fill_rate: 0.90,
        },
        VenueInfo {
            venue_id: VenueId::new("KRAKEN").expect("static id"),
            venue_name: "Kraken".to_string(),
            is_active: true,
            endpoint: "api.kraken.com:443".to_string(),
            baseline_latency_us: 1_200.0,
            maker_fee_bps: 0.0,
            taker_fee_bps: 6.0,
            min_order_size: 0.01,
            max_order_size: 3_000.0,
            typical_bid_depth: 2_000.0,
            typical_ask_depth: 2_000.0,
            fill_rate: 0.88,
        },
    ]
}
