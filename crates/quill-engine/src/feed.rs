//! Synthetic market-data generation.

use quill_core::constants::MAX_DEPTH_LEVELS;
use quill_core::traits::TickSource;
use quill_core::types::{MarketTick, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::config::FeedConfig;

/// Seeded synthetic tick generator.
///
/// Produces a random-walk mid price with a populated depth ladder and
/// occasional trades, at jittered event intervals. Deterministic for a
/// given seed, which keeps pipeline tests reproducible.
pub struct SyntheticFeed {
    config: FeedConfig,
    rng: StdRng,
    mid: f64,
    time_ns: i64,
    mid_noise: Normal<f64>,
}

impl SyntheticFeed {
    /// Create a feed from config, seeded from `config.seed`.
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        let mid_noise = Normal::new(0.0, config.volatility_ticks.max(1e-9) * config.tick_size)
            .expect("volatility std dev is finite");
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            mid: config.initial_mid,
            time_ns: 1,
            mid_noise,
            config,
        }
    }

    fn depth_ladder(&mut self) -> [u32; MAX_DEPTH_LEVELS] {
        let avg = self.config.avg_level_size.max(1);
        let mut ladder = [0u32; MAX_DEPTH_LEVELS];
        for slot in &mut ladder {
            *slot = self.rng.gen_range(avg / 2..=avg + avg / 2).max(1);
        }
        ladder
    }
}

impl TickSource for SyntheticFeed {
    fn next_tick(&mut self) -> Option<MarketTick> {
        // Random-walk the mid, snapped to the tick grid and floored away
        // from zero.
        self.mid += self.mid_noise.sample(&mut self.rng);
        let tick_size = self.config.tick_size;
        self.mid = ((self.mid / tick_size).round() * tick_size).max(tick_size * 100.0);

        let half_spread = f64::from(self.config.avg_spread_ticks) * tick_size / 2.0;
        let bid_price = self.mid - half_spread;
        let ask_price = self.mid + half_spread;

        let bid_sizes = self.depth_ladder();
        let ask_sizes = self.depth_ladder();

        let trade_volume = if self.rng.gen_bool(self.config.trade_frequency.clamp(0.0, 1.0)) {
            self.rng.gen_range(1..=self.config.avg_trade_size.max(1) * 2)
        } else {
            0
        };

        let interval = self.config.avg_event_interval_ns.max(1);
        self.time_ns += self.rng.gen_range(interval / 2..=interval + interval / 2) as i64;

        Some(MarketTick {
            mid_price: self.mid,
            bid_price,
            ask_price,
            bid_size: bid_sizes[0],
            ask_size: ask_sizes[0],
            trade_volume,
            bid_sizes,
            ask_sizes,
            depth_levels: MAX_DEPTH_LEVELS as u32,
            timestamp: Timestamp::from_nanos(self.time_ns),
        })
    }
}
