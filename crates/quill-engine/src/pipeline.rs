//! The threaded market-making pipeline.
//!
//! Thread topology, hot path in the middle:
//!
//! ```text
//! market-data thread --[tick ring]--> strategy thread --[order ring]--> transport thread
//!                                        ^      ^
//!                     [heartbeat ring]---+      +---[order-result ring]
//! ```
//!
//! The strategy thread exclusively owns the Hawkes engine, the quoting
//! strategy, the inference engine, and the router; heartbeats and order
//! results reach it over SPSC rings so no lock is ever taken per tick.
//! The only blocking on the hot path is the bounded busy-wait inside the
//! inference engine's fixed-latency pad.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use quill_core::clock::MonotonicClock;
use quill_core::traits::{Clock, TickSource};
use quill_core::types::{MarketTick, OrderRequest, Side, Timestamp, TradingEvent, VenueId};
use quill_flow::hawkes::MultiKernelHawkes;
use quill_model::features::FeatureExtractor;
use quill_model::network::MicroDnn;
use quill_ring::{ring, Consumer, Producer};
use quill_router::router::SmartOrderRouter;
use quill_router::venue::{HeartbeatEvent, OrderOutcome};
use quill_strategy::position::PositionTracker;
use quill_strategy::quoting::AvellanedaStoikov;
use quill_strategy::volatility::EwmaVolatility;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::EngineConfig;
use crate::feed::SyntheticFeed;
use crate::metrics::MetricsRegistry;

/// Tick ring capacity (slots)
const TICK_RING: usize = 4_096;
/// Control-plane ring capacity (slots)
const EVENT_RING: usize = 1_024;

/// Summary counters from one pipeline run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PipelineStats {
    /// Ticks consumed from the feed
    pub ticks_processed: u64,
    /// Trade events fed to the intensity engine
    pub trade_events: u64,
    /// Ticks where the strategy refused to quote
    pub quotes_refused: u64,
    /// Ticks with a neutral model signal (no order attempted)
    pub neutral_signals: u64,
    /// Order candidates rejected by the risk gate
    pub risk_rejected: u64,
    /// Orders routed to a venue
    pub orders_routed: u64,
    /// Routing attempts with no viable venue
    pub route_rejected: u64,
    /// Routed orders dropped because the order ring was full
    pub orders_dropped: u64,
    /// Heartbeat round trips folded into venue state
    pub heartbeats_processed: u64,
    /// Fills applied to the position
    pub fills_applied: u64,
    /// Inference calls made
    pub inference_count: u64,
    /// Inference calls that overran the fixed budget
    pub inference_overruns: u64,
    /// Net position at shutdown
    pub final_position: i64,
    /// Total P&L at shutdown
    pub total_pnl: f64,
}

/// The assembled engine pipeline.
pub struct Pipeline {
    config: EngineConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Pipeline {
    /// Create a pipeline over a configuration and metrics registry.
    #[must_use]
    pub fn new(config: EngineConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self { config, metrics }
    }

    /// Run the pipeline until `tick_count` ticks have been consumed,
    /// then shut all threads down and return the run's counters.
    ///
    /// # Errors
    /// Fails at startup on invalid strategy, kernel, or routing
    /// configuration; never mid-run.
    pub fn run_for_ticks(&self, tick_count: u64) -> anyhow::Result<PipelineStats> {
        let config = self.config.clone();
        let metrics = Arc::clone(&self.metrics);

        // Validate everything fatal before any thread spawns.
        let strategy = AvellanedaStoikov::new(config.quoting.clone())?;
        let hawkes =
            MultiKernelHawkes::new(config.flow.mu_buy, config.flow.mu_sell, config.flow.kernels)?;
        let model = MicroDnn::random(config.model.weight_seed, config.model.fixed_latency_ns);
        config.routing.validate()?;

        let (tick_tx, tick_rx) = ring::<MarketTick, TICK_RING>();
        let (hb_tx, hb_rx) = ring::<HeartbeatEvent, EVENT_RING>();
        let (result_tx, result_rx) = ring::<OrderOutcome, EVENT_RING>();
        let (order_tx, order_rx) = ring::<OrderRequest, EVENT_RING>();

        let clock = MonotonicClock::new();
        let feed_done = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));

        let producer = spawn_market_data_thread(
            SyntheticFeed::new(config.feed.clone()),
            tick_tx,
            tick_count,
            Arc::clone(&feed_done),
        );

        let transport = spawn_transport_thread(
            &config,
            clock.clone(),
            hb_tx,
            result_tx,
            order_rx,
            Arc::clone(&shutdown),
        );

        let strategy_thread = spawn_strategy_thread(StrategyThreadInput {
            config,
            metrics,
            strategy,
            hawkes,
            model,
            clock,
            tick_rx,
            hb_rx,
            result_rx,
            order_tx,
            feed_done,
        });

        let stats = strategy_thread
            .join()
            .map_err(|_| anyhow::anyhow!("strategy thread panicked"))?;

        shutdown.store(true, Ordering::Release);
        producer
            .join()
            .map_err(|_| anyhow::anyhow!("market-data thread panicked"))?;
        transport
            .join()
            .map_err(|_| anyhow::anyhow!("transport thread panicked"))?;

        Ok(stats)
    }
}

fn spawn_market_data_thread(
    mut feed: SyntheticFeed,
    mut tick_tx: Producer<MarketTick, TICK_RING>,
    tick_count: u64,
    feed_done: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("quill-md".to_string())
        .spawn(move || {
            let mut produced = 0u64;
            while produced < tick_count {
                let Some(tick) = feed.next_tick() else { break };
                let mut item = tick;
                loop {
                    match tick_tx.push(item) {
                        Ok(()) => break,
                        Err(back) => {
                            item = back;
                            std::hint::spin_loop();
                        }
                    }
                }
                produced += 1;
            }
            feed_done.store(true, Ordering::Release);
            tracing::debug!(produced, "market-data thread finished");
        })
        .expect("spawn market-data thread")
}

fn spawn_transport_thread(
    config: &EngineConfig,
    clock: MonotonicClock,
    mut hb_tx: Producer<HeartbeatEvent, EVENT_RING>,
    mut result_tx: Producer<OrderOutcome, EVENT_RING>,
    mut order_rx: Consumer<OrderRequest, EVENT_RING>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    struct SimVenue {
        id: VenueId,
        rtt_ns: f64,
        jitter: Normal<f64>,
        fill_rate: f64,
    }

    let venues: Vec<SimVenue> = config
        .venues
        .iter()
        .map(|v| SimVenue {
            id: v.venue_id,
            rtt_ns: v.baseline_latency_us * 1_000.0,
            jitter: Normal::new(0.0, v.baseline_latency_us * 50.0)
                .expect("jitter std dev is finite"),
            fill_rate: v.fill_rate.clamp(0.0, 1.0),
        })
        .collect();

    let hb_interval_ns = config.routing.heartbeat_interval_ms.max(1) * 1_000_000;

    thread::Builder::new()
        .name("quill-transport".to_string())
        .spawn(move || {
            let mut rng = StdRng::seed_from_u64(7);
            // Fire the first heartbeat round immediately.
            let mut last_heartbeat = Timestamp::from_nanos(i64::MIN / 2);

            while !shutdown.load(Ordering::Acquire) {
                let now = clock.now();

                if now.duration_since(last_heartbeat) >= hb_interval_ns {
                    for venue in &venues {
                        let rtt = (venue.rtt_ns + venue.jitter.sample(&mut rng)).max(1_000.0);
                        let event = HeartbeatEvent {
                            venue: venue.id,
                            sent: now,
                            received: now.add_nanos(rtt as i64),
                        };
                        let _ = hb_tx.push(event);
                    }
                    last_heartbeat = now;
                }

                while let Some(order) = order_rx.pop() {
                    let fill_rate = venues
                        .iter()
                        .find(|v| v.id == order.venue)
                        .map_or(0.0, |v| v.fill_rate);
                    let outcome = OrderOutcome {
                        venue: order.venue,
                        filled: rng.gen_bool(fill_rate),
                        timeout: false,
                        side: order.side,
                        price: order.price,
                        size: order.size,
                    };
                    let _ = result_tx.push(outcome);
                }

                thread::sleep(Duration::from_micros(200));
            }
        })
        .expect("spawn transport thread")
}

struct StrategyThreadInput {
    config: EngineConfig,
    metrics: Arc<MetricsRegistry>,
    strategy: AvellanedaStoikov,
    hawkes: MultiKernelHawkes,
    model: MicroDnn,
    clock: MonotonicClock,
    tick_rx: Consumer<MarketTick, TICK_RING>,
    hb_rx: Consumer<HeartbeatEvent, EVENT_RING>,
    result_rx: Consumer<OrderOutcome, EVENT_RING>,
    order_tx: Producer<OrderRequest, EVENT_RING>,
    feed_done: Arc<AtomicBool>,
}

fn spawn_strategy_thread(input: StrategyThreadInput) -> thread::JoinHandle<PipelineStats> {
    thread::Builder::new()
        .name("quill-strategy".to_string())
        .spawn(move || strategy_loop(input))
        .expect("spawn strategy thread")
}

/// The hot loop. Owns every stateful component; the only waits are ring
/// polls and the inference pad.
#[allow(clippy::too_many_lines)]
fn strategy_loop(input: StrategyThreadInput) -> PipelineStats {
    let StrategyThreadInput {
        config,
        metrics,
        strategy,
        mut hawkes,
        model,
        clock,
        mut tick_rx,
        mut hb_rx,
        mut result_rx,
        mut order_tx,
        feed_done,
    } = input;

    let mut router = SmartOrderRouter::new(&strategy, config.routing.clone())
        .expect("routing config validated at startup");
    for venue in &config.venues {
        router.add_venue(venue.clone());
    }

    let regime_classifier = config.regime.clone();
    let risk_policy = config.risk_policy;
    let order_size = strategy.config().quote_size;
    let horizon_secs = strategy.config().time_horizon_secs;

    let mut position = PositionTracker::new();
    position.start_session();
    let mut volatility = EwmaVolatility::default();

    let mut stats = PipelineStats::default();
    let mut prev_tick: Option<MarketTick> = None;
    let mut session_start: Option<Timestamp> = None;
    let reference_tick = reference_snapshot(&config);
    let venue_prices: HashMap<VenueId, f64> = HashMap::new();

    loop {
        drain_control_plane(
            &mut router,
            &mut hb_rx,
            &mut result_rx,
            &mut position,
            &mut stats,
        );
        router.check_heartbeat_timeouts(clock.now());

        let Some(tick) = tick_rx.pop() else {
            if feed_done.load(Ordering::Acquire) && tick_rx.is_empty() {
                break;
            }
            std::hint::spin_loop();
            continue;
        };

        let loop_start = clock.now();
        stats.ticks_processed += 1;
        metrics.ticks_total.inc();

        let first_ts = *session_start.get_or_insert(tick.timestamp);
        let prev = prev_tick.unwrap_or(tick);

        if tick.trade_volume > 0 {
            let side = classify_trade_side(&tick, &prev);
            hawkes.update(TradingEvent {
                arrival_time: tick.timestamp,
                side,
            });
            stats.trade_events += 1;
        }

        let lambda_buy = hawkes.buy_intensity_at(tick.timestamp);
        let lambda_sell = hawkes.sell_intensity_at(tick.timestamp);

        let features =
            FeatureExtractor::extract(&tick, &prev, &reference_tick, lambda_buy, lambda_sell);
        let prediction = model.predict(&features);
        metrics
            .inference_compute_ns
            .observe(prediction.compute_ns as f64);

        volatility.update(tick.mid_price, tick.timestamp);
        let sigma = volatility.sigma();
        position.mark(tick.mid_price);
        prev_tick = Some(tick);

        let time_remaining = horizon_secs - tick.timestamp.seconds_since(first_ts);
        let quotes =
            strategy.calculate_quotes(tick.mid_price, position.position(), time_remaining, 0.0);
        let latency_cost = strategy.calculate_latency_cost(sigma, tick.mid_price);

        if !quotes.is_actionable() || !strategy.should_quote(quotes.spread, latency_cost) {
            stats.quotes_refused += 1;
            metrics.quote_refusals_total.inc();
            continue;
        }
        metrics.quotes_total.inc();

        let direction = prediction.direction();
        if direction == 0 {
            stats.neutral_signals += 1;
            continue;
        }
        let side = if direction > 0 { Side::Buy } else { Side::Sell };

        let spread_bps = quotes.spread / tick.mid_price * 10_000.0;
        if !risk_policy.check_order(
            position.position() as f64,
            order_size,
            side,
            position.daily_pnl(),
            spread_bps,
        ) {
            stats.risk_rejected += 1;
            metrics.risk_rejects_total.inc();
            continue;
        }

        let regime = regime_classifier.classify(sigma, &tick);
        let signed_size = side.sign() * order_size.round() as i64;
        let decision = router.route_order(
            tick.mid_price,
            sigma,
            position.position(),
            signed_size,
            regime,
            &venue_prices,
        );

        match decision.selected_venue {
            Some(venue) => {
                stats.orders_routed += 1;
                metrics.orders_routed_total.inc();

                let order = OrderRequest {
                    venue,
                    side,
                    price: if side.is_buy() {
                        quotes.ask_price
                    } else {
                        quotes.bid_price
                    },
                    size: order_size,
                    timestamp: tick.timestamp,
                };
                if order_tx.push(order).is_err() {
                    stats.orders_dropped += 1;
                }
            }
            None => {
                stats.route_rejected += 1;
                metrics.route_rejects_total.inc();
                tracing::debug!(reason = %decision.rejection_reason, "order not routed");
            }
        }

        metrics
            .tick_latency_ns
            .observe((clock.now() - loop_start) as f64);
        metrics.position.set(position.position());
        metrics.pnl.set(position.total_pnl());
        metrics.buy_intensity.set(lambda_buy);
        metrics.sell_intensity.set(lambda_sell);
    }

    // Late control-plane events still count.
    drain_control_plane(
        &mut router,
        &mut hb_rx,
        &mut result_rx,
        &mut position,
        &mut stats,
    );

    stats.inference_count = model.inference_count();
    stats.inference_overruns = model.overrun_count();
    for _ in 0..stats.inference_overruns {
        metrics.inference_overruns_total.inc();
    }
    stats.final_position = position.position();
    stats.total_pnl = position.total_pnl();
    stats
}

fn drain_control_plane(
    router: &mut SmartOrderRouter<'_>,
    hb_rx: &mut Consumer<HeartbeatEvent, EVENT_RING>,
    result_rx: &mut Consumer<OrderOutcome, EVENT_RING>,
    position: &mut PositionTracker,
    stats: &mut PipelineStats,
) {
    while let Some(hb) = hb_rx.pop() {
        router.send_heartbeat(hb.venue, hb.sent);
        router.receive_heartbeat(hb.venue, hb.sent, hb.received);
        stats.heartbeats_processed += 1;
    }

    while let Some(outcome) = result_rx.pop() {
        router.record_order_result(outcome.venue, outcome.filled, outcome.timeout);
        if outcome.filled {
            position.apply_fill(outcome.side, outcome.price, outcome.size);
            stats.fills_applied += 1;
        }
    }
}

/// Classify a trade's aggressor side from consecutive snapshots: price
/// momentum first, book-imbalance sign for flat ticks.
fn classify_trade_side(tick: &MarketTick, prev: &MarketTick) -> Side {
    let momentum = tick.mid_price - prev.mid_price;
    if momentum > 0.0 {
        Side::Buy
    } else if momentum < 0.0 {
        Side::Sell
    } else {
        Side::from_is_buy(tick.bid_size >= tick.ask_size)
    }
}

/// Static reference-instrument snapshot used for the spread-ratio
/// feature in simulation.
fn reference_snapshot(config: &EngineConfig) -> MarketTick {
    let half_spread =
        f64::from(config.feed.avg_spread_ticks) * config.feed.tick_size / 2.0;
    MarketTick {
        mid_price: config.feed.initial_mid,
        bid_price: config.feed.initial_mid - half_spread,
        ask_price: config.feed.initial_mid + half_spread,
        bid_size: config.feed.avg_level_size,
        ask_size: config.feed.avg_level_size,
        bid_sizes: [config.feed.avg_level_size; quill_core::constants::MAX_DEPTH_LEVELS],
        ask_sizes: [config.feed.avg_level_size; quill_core::constants::MAX_DEPTH_LEVELS],
        depth_levels: quill_core::constants::MAX_DEPTH_LEVELS as u32,
        trade_volume: 0,
        timestamp: Timestamp::EPOCH,
    }
}
