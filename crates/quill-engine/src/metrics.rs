//! Prometheus metrics for the engine.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

/// Metrics registry for the market-making pipeline.
#[derive(Debug)]
pub struct MetricsRegistry {
    /// Prometheus registry
    registry: Registry,
    /// Ticks consumed from the feed
    pub ticks_total: Counter,
    /// Two-sided quotes produced
    pub quotes_total: Counter,
    /// Quotes refused (degenerate inputs or spread below latency cost)
    pub quote_refusals_total: Counter,
    /// Orders rejected by the risk gate
    pub risk_rejects_total: Counter,
    /// Orders routed to a venue
    pub orders_routed_total: Counter,
    /// Routing attempts with no viable venue
    pub route_rejects_total: Counter,
    /// Inference calls that overran the fixed budget
    pub inference_overruns_total: Counter,
    /// Current net position
    pub position: Gauge,
    /// Current total P&L
    pub pnl: Gauge<f64, AtomicU64>,
    /// Current Hawkes buy intensity
    pub buy_intensity: Gauge<f64, AtomicU64>,
    /// Current Hawkes sell intensity
    pub sell_intensity: Gauge<f64, AtomicU64>,
    /// Raw inference compute time (nanoseconds)
    pub inference_compute_ns: Histogram,
    /// Tick-to-decision latency (nanoseconds)
    pub tick_latency_ns: Histogram,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let ticks_total = Counter::default();
        registry.register("quill_ticks_total", "Ticks consumed", ticks_total.clone());

        let quotes_total = Counter::default();
        registry.register(
            "quill_quotes_total",
            "Two-sided quotes produced",
            quotes_total.clone(),
        );

        let quote_refusals_total = Counter::default();
        registry.register(
            "quill_quote_refusals_total",
            "Quotes refused by the strategy",
            quote_refusals_total.clone(),
        );

        let risk_rejects_total = Counter::default();
        registry.register(
            "quill_risk_rejects_total",
            "Orders rejected by the risk gate",
            risk_rejects_total.clone(),
        );

        let orders_routed_total = Counter::default();
        registry.register(
            "quill_orders_routed_total",
            "Orders routed to a venue",
            orders_routed_total.clone(),
        );

        let route_rejects_total = Counter::default();
        registry.register(
            "quill_route_rejects_total",
            "Routing attempts with no viable venue",
            route_rejects_total.clone(),
        );

        let inference_overruns_total = Counter::default();
        registry.register(
            "quill_inference_overruns_total",
            "Inference calls exceeding the fixed latency budget",
            inference_overruns_total.clone(),
        );

        let position = Gauge::default();
        registry.register("quill_position", "Current net position", position.clone());

        let pnl = Gauge::<f64, AtomicU64>::default();
        registry.register("quill_pnl", "Current total P&L", pnl.clone());

        let buy_intensity = Gauge::<f64, AtomicU64>::default();
        registry.register(
            "quill_buy_intensity",
            "Hawkes buy-arrival intensity",
            buy_intensity.clone(),
        );

        let sell_intensity = Gauge::<f64, AtomicU64>::default();
        registry.register(
            "quill_sell_intensity",
            "Hawkes sell-arrival intensity",
            sell_intensity.clone(),
        );

        let ns_buckets: Vec<f64> = exponential_buckets(100.0, 2.0, 20).collect();

        let inference_compute_ns = Histogram::new(ns_buckets.iter().copied());
        registry.register(
            "quill_inference_compute_ns",
            "Raw inference compute time in nanoseconds",
            inference_compute_ns.clone(),
        );

        let tick_latency_ns = Histogram::new(ns_buckets.iter().copied());
        registry.register(
            "quill_tick_latency_ns",
            "Tick-to-decision latency in nanoseconds",
            tick_latency_ns.clone(),
        );

        Self {
            registry,
            ticks_total,
            quotes_total,
            quote_refusals_total,
            risk_rejects_total,
            orders_routed_total,
            route_rejects_total,
            inference_overruns_total,
            position,
            pnl,
            buy_intensity,
            sell_intensity,
            inference_compute_ns,
            tick_latency_ns,
        }
    }

    /// Encode metrics for Prometheus scraping.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry).expect("Failed to encode metrics");
        buffer
    }
}
