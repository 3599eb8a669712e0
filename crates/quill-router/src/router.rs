//! Latency-budgeted venue selection.

use std::collections::HashMap;

use quill_core::constants::{MAX_LATENCY_BUDGET_US, MIN_LATENCY_BUDGET_US};
use quill_core::error::{Error, Result};
use quill_core::types::{MarketRegime, Timestamp, VenueId};
use quill_strategy::quoting::AvellanedaStoikov;
use serde::{Deserialize, Serialize};

use crate::health;
use crate::venue::{VenueInfo, VenueState};

/// Horizon (seconds) at which the router evaluates the quoting model
/// when pricing a trade's economics.
const BUDGET_HORIZON_SECS: f64 = 600.0;

/// Router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Fraction of the computed budget actually granted, in (0, 1]
    pub latency_safety_margin: f64,
    /// RTT spike filter threshold, in standard deviations
    pub latency_spike_threshold: f64,
    /// Weight of price quality in the composite score
    pub price_weight: f64,
    /// Weight of latency quality in the composite score
    pub latency_weight: f64,
    /// Weight of liquidity quality in the composite score
    pub liquidity_weight: f64,
    /// Minimum acceptable observed fill rate
    pub min_fill_rate: f64,
    /// Minimum composite score for selection
    pub min_composite_score: f64,
    /// Heartbeat cadence in milliseconds
    pub heartbeat_interval_ms: i64,
    /// Heartbeat timeout in milliseconds
    pub heartbeat_timeout_ms: i64,
    /// RTT EMA smoothing factor, in (0, 1)
    pub rtt_ema_alpha: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            latency_safety_margin: 0.8,
            latency_spike_threshold: 2.0,
            price_weight: 0.5,
            latency_weight: 0.3,
            liquidity_weight: 0.2,
            min_fill_rate: 0.85,
            min_composite_score: 0.6,
            heartbeat_interval_ms: 100,
            heartbeat_timeout_ms: 1_000,
            rtt_ema_alpha: 0.2,
        }
    }
}

impl RoutingConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Fails if the quality weights do not sum to 1, the safety margin
    /// is outside (0, 1], or the EMA alpha is outside (0, 1).
    pub fn validate(&self) -> Result<()> {
        let weight_sum = self.price_weight + self.latency_weight + self.liquidity_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(Error::ConfigError(format!(
                "quality weights must sum to 1, got {weight_sum}"
            )));
        }
        if !(self.latency_safety_margin > 0.0 && self.latency_safety_margin <= 1.0) {
            return Err(Error::ConfigError(format!(
                "latency_safety_margin must be in (0, 1], got {}",
                self.latency_safety_margin
            )));
        }
        if !(self.rtt_ema_alpha > 0.0 && self.rtt_ema_alpha < 1.0) {
            return Err(Error::ConfigError(format!(
                "rtt_ema_alpha must be in (0, 1), got {}",
                self.rtt_ema_alpha
            )));
        }
        if self.latency_spike_threshold < 0.0 {
            return Err(Error::ConfigError(format!(
                "latency_spike_threshold must be non-negative, got {}",
                self.latency_spike_threshold
            )));
        }
        Ok(())
    }
}

/// Outcome of one routing attempt.
///
/// `selected_venue == None` means the order was rejected and must not be
/// sent; `rejection_reason` says why, and always names the computed
/// budget when the candidate filter emptied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Winning venue, if any
    pub selected_venue: Option<VenueId>,
    /// EMA RTT of the winning venue, microseconds
    pub expected_latency_us: f64,
    /// Latency budget derived from the trade's economics, microseconds
    pub latency_budget_us: f64,
    /// Price quality of the winner, in [0, 1]
    pub price_quality: f64,
    /// Latency quality of the winner, in [0, 1]
    pub latency_quality: f64,
    /// Liquidity quality of the winner, in [0, 1]
    pub liquidity_quality: f64,
    /// Weighted composite score of the winner
    pub composite_score: f64,
    /// Populated when no venue was selected
    pub rejection_reason: String,
}

/// Smart order router.
///
/// Borrows the quoting strategy: the strategy must outlive the router,
/// which the lifetime enforces by construction.
pub struct SmartOrderRouter<'a> {
    config: RoutingConfig,
    strategy: &'a AvellanedaStoikov,
    venues: HashMap<VenueId, VenueInfo>,
    states: HashMap<VenueId, VenueState>,
}

impl<'a> SmartOrderRouter<'a> {
    /// Create a router over a validated configuration.
    ///
    /// # Errors
    /// Fails if the configuration is invalid.
    pub fn new(strategy: &'a AvellanedaStoikov, config: RoutingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            strategy,
            venues: HashMap::new(),
            states: HashMap::new(),
        })
    }

    /// Create a router pre-populated with the default crypto venue set.
    ///
    /// # Errors
    /// Fails if the configuration is invalid.
    pub fn with_default_venues(
        strategy: &'a AvellanedaStoikov,
        config: RoutingConfig,
    ) -> Result<Self> {
        let mut router = Self::new(strategy, config)?;
        for venue in crate::venue::default_venue_profile() {
            router.add_venue(venue);
        }
        Ok(router)
    }

    /// Register a venue, seeding its state from the baseline latency.
    pub fn add_venue(&mut self, venue: VenueInfo) {
        let state = VenueState::for_venue(&venue);
        self.states.insert(venue.venue_id, state);
        self.venues.insert(venue.venue_id, venue);
    }

    /// Remove a venue and its state.
    pub fn remove_venue(&mut self, venue_id: VenueId) {
        self.venues.remove(&venue_id);
        self.states.remove(&venue_id);
    }

    /// Venues that are both administratively active and connected.
    #[must_use]
    pub fn active_venues(&self) -> Vec<VenueId> {
        self.venues
            .iter()
            .filter(|(id, venue)| {
                venue.is_active && self.states.get(id).is_some_and(|s| s.is_connected)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Record a heartbeat send for a venue.
    pub fn send_heartbeat(&mut self, venue_id: VenueId, now: Timestamp) {
        if let Some(state) = self.states.get_mut(&venue_id) {
            health::record_heartbeat_sent(state, now);
        }
    }

    /// Record a heartbeat response for a venue.
    pub fn receive_heartbeat(&mut self, venue_id: VenueId, sent: Timestamp, received: Timestamp) {
        if let Some(state) = self.states.get_mut(&venue_id) {
            health::record_heartbeat_received(state, sent, received, self.config.rtt_ema_alpha);
        }
    }

    /// Sweep all venues for heartbeat timeouts.
    pub fn check_heartbeat_timeouts(&mut self, now: Timestamp) {
        let timeout_ns = self.config.heartbeat_timeout_ms * 1_000_000;
        for (venue_id, state) in &mut self.states {
            if health::check_timeout(state, now, timeout_ns) {
                tracing::warn!(venue = %venue_id, "venue disconnected after heartbeat timeouts");
            }
        }
    }

    /// Derive the latency budget (microseconds) for a prospective order.
    ///
    /// Quotes the borrowed strategy at a fixed horizon to price the
    /// trade: when the captured half-spread clears the latency cost with
    /// margin, the budget scales with the profit margin per unit of
    /// volatility and shrinks with urgency; otherwise only the floor is
    /// granted. The safety margin is applied last.
    #[must_use]
    pub fn calculate_latency_budget(
        &self,
        mid_price: f64,
        volatility: f64,
        position: i64,
        order_size: i64,
        regime: MarketRegime,
    ) -> f64 {
        let quotes = self
            .strategy
            .calculate_quotes(mid_price, position, BUDGET_HORIZON_SECS, 0.0);
        let latency_cost = self.strategy.calculate_latency_cost(volatility, mid_price);

        let bid_spread = mid_price - quotes.bid_price;
        let ask_spread = quotes.ask_price - mid_price;
        let expected_profit = if order_size > 0 { ask_spread } else { bid_spread };

        let mut urgency = regime.urgency_multiplier();
        urgency *= 1.0 + (position as f64 / 1_000.0).abs();

        let mut budget_us = if expected_profit > latency_cost * 1.1 {
            let profit_margin = expected_profit - latency_cost;
            ((profit_margin / volatility) * (1_000.0 / urgency))
                .clamp(MIN_LATENCY_BUDGET_US, MAX_LATENCY_BUDGET_US)
        } else {
            MIN_LATENCY_BUDGET_US
        };

        budget_us *= self.config.latency_safety_margin;
        budget_us
    }

    /// Route an order: filter candidates, score them, pick the best.
    ///
    /// `order_size` is signed: positive buys, negative sells.
    /// `venue_prices` maps venues to their current quote on the relevant
    /// side; venues missing from the map score a neutral 0.5 on price.
    #[must_use]
    pub fn route_order(
        &self,
        mid_price: f64,
        volatility: f64,
        position: i64,
        order_size: i64,
        regime: MarketRegime,
        venue_prices: &HashMap<VenueId, f64>,
    ) -> RoutingDecision {
        let mut decision = RoutingDecision {
            latency_budget_us: self.calculate_latency_budget(
                mid_price, volatility, position, order_size, regime,
            ),
            ..RoutingDecision::default()
        };

        let mut candidates: Vec<VenueId> = Vec::new();

        for (venue_id, venue) in &self.venues {
            if !venue.is_active {
                continue;
            }
            let Some(state) = self.states.get(venue_id) else {
                continue;
            };
            if !state.is_connected {
                continue;
            }
            if state.ema_rtt_us > decision.latency_budget_us {
                continue;
            }

            let spike_ceiling = state.ema_rtt_us
                + self.config.latency_spike_threshold * state.std_dev_rtt_us;
            if state.current_rtt_us > spike_ceiling {
                continue;
            }

            if state.observed_fill_rate(venue.fill_rate) < self.config.min_fill_rate {
                continue;
            }

            let abs_size = order_size.unsigned_abs() as f64;
            if abs_size < venue.min_order_size || abs_size > venue.max_order_size {
                continue;
            }

            candidates.push(*venue_id);
        }

        if candidates.is_empty() {
            decision.rejection_reason = format!(
                "No venues meet latency budget ({:.1} us) and connectivity requirements",
                decision.latency_budget_us
            );
            return decision;
        }

        let mut best: Option<(VenueId, f64)> = None;
        for venue_id in &candidates {
            let score = self.composite_score(*venue_id, order_size, &decision, venue_prices);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((*venue_id, score)),
            }
        }

        let (winner, score) = best.expect("candidates is non-empty");
        if score < self.config.min_composite_score {
            decision.rejection_reason = format!(
                "No venues meet minimum composite score ({:.2})",
                self.config.min_composite_score
            );
            return decision;
        }

        let venue = &self.venues[&winner];
        let state = &self.states[&winner];

        decision.selected_venue = Some(winner);
        decision.composite_score = score;
        decision.expected_latency_us = state.ema_rtt_us;
        decision.price_quality = price_quality(winner, order_size, venue_prices);
        decision.latency_quality =
            (1.0 - state.ema_rtt_us / decision.latency_budget_us).max(0.0);
        decision.liquidity_quality = liquidity_quality(venue, order_size);

        decision
    }

    /// Fold an order's terminal outcome into the venue's counters.
    pub fn record_order_result(&mut self, venue_id: VenueId, filled: bool, timeout: bool) {
        if let Some(state) = self.states.get_mut(&venue_id) {
            state.orders_sent += 1;
            if filled {
                state.orders_filled += 1;
            } else if timeout {
                state.orders_timeout += 1;
            } else {
                state.orders_rejected += 1;
            }
        }
    }

    /// Snapshot of one venue's state.
    #[must_use]
    pub fn venue_state(&self, venue_id: VenueId) -> Option<&VenueState> {
        self.states.get(&venue_id)
    }

    /// All venue states.
    #[must_use]
    pub fn venue_states(&self) -> &HashMap<VenueId, VenueState> {
        &self.states
    }

    /// Registered venue ids.
    #[must_use]
    pub fn venue_ids(&self) -> Vec<VenueId> {
        self.venues.keys().copied().collect()
    }

    /// Router configuration.
    #[must_use]
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    fn composite_score(
        &self,
        venue_id: VenueId,
        order_size: i64,
        decision: &RoutingDecision,
        venue_prices: &HashMap<VenueId, f64>,
    ) -> f64 {
        let venue = &self.venues[&venue_id];
        let state = &self.states[&venue_id];

        let price = price_quality(venue_id, order_size, venue_prices);
        let latency = (1.0 - state.ema_rtt_us / decision.latency_budget_us).max(0.0);
        let liquidity = liquidity_quality(venue, order_size);

        self.config.price_weight * price
            + self.config.latency_weight * latency
            + self.config.liquidity_weight * liquidity
    }
}

/// Price quality versus the best quote across venues: 1.0 at the best
/// price, penalized 1 point per basis point away from it. Venues with no
/// quote score a neutral 0.5.
fn price_quality(venue_id: VenueId, order_size: i64, venue_prices: &HashMap<VenueId, f64>) -> f64 {
    let Some(&venue_price) = venue_prices.get(&venue_id) else {
        return 0.5;
    };

    let mut best_price = venue_price;
    for &price in venue_prices.values() {
        if order_size > 0 {
            best_price = best_price.min(price);
        } else {
            best_price = best_price.max(price);
        }
    }

    let price_diff = if order_size > 0 {
        (venue_price - best_price) / best_price
    } else {
        (best_price - venue_price) / best_price
    };

    (1.0 - price_diff * 100.0).max(0.0)
}

/// Liquidity quality: fraction of the order the venue's typical depth on
/// the relevant side can absorb, capped at 1.
fn liquidity_quality(venue: &VenueInfo, order_size: i64) -> f64 {
    let required = order_size.unsigned_abs() as f64;
    if required == 0.0 {
        return 1.0;
    }
    let available = if order_size > 0 {
        venue.typical_ask_depth
    } else {
        venue.typical_bid_depth
    };
    (available / required).min(1.0)
}
