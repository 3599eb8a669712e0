//! Avellaneda-Stoikov quoting with latency awareness.
//!
//! The strategy converts mid price, signed inventory, volatility, and the
//! remaining horizon into a reservation price and an optimal half-spread:
//!
//! ```text
//! r      = mid - gamma * sigma^2 * T * inventory
//! delta* = gamma * sigma^2 * T / 2 + (1 / gamma) * ln(1 + gamma / k)
//! ```
//!
//! Bid and ask sit at `r -/+ delta*`, rounded outward to the tick grid.
//! The latency cost prices the adverse-selection exposure of holding a
//! quote through one round-trip window; quoting is only worthwhile when
//! the captured spread exceeds it.

use quill_core::constants::DEFAULT_QUOTE_SIZE;
use quill_core::error::{Error, Result};
use quill_core::types::Quotes;
use serde::{Deserialize, Serialize};

/// Quoting strategy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotingConfig {
    /// Risk aversion (gamma)
    pub risk_aversion: f64,
    /// Volatility estimate (sigma, price units per sqrt-second)
    pub volatility: f64,
    /// Trading horizon in seconds
    pub time_horizon_secs: f64,
    /// Order arrival rate (k)
    pub order_arrival_rate: f64,
    /// Tick size for price rounding
    pub tick_size: f64,
    /// One-way system latency in nanoseconds
    pub latency_ns: i64,
    /// Base quote size per side, in contracts
    pub quote_size: f64,
    /// Inventory normalization bound for size skew
    pub inventory_limit: i64,
    /// Size skew strength (0 disables skew)
    pub size_skew: f64,
}

impl Default for QuotingConfig {
    fn default() -> Self {
        Self {
            risk_aversion: 0.1,
            volatility: 0.2,
            time_horizon_secs: 300.0,
            order_arrival_rate: 0.5,
            tick_size: 0.01,
            latency_ns: 1_000,
            quote_size: DEFAULT_QUOTE_SIZE,
            inventory_limit: 1_000,
            size_skew: 0.5,
        }
    }
}

/// Avellaneda-Stoikov market-making strategy.
#[derive(Debug, Clone)]
pub struct AvellanedaStoikov {
    config: QuotingConfig,
}

impl AvellanedaStoikov {
    /// Create a strategy from a validated configuration.
    ///
    /// # Errors
    /// Fails if gamma, k, tick size, or quote size are non-positive, or if
    /// volatility is negative.
    pub fn new(config: QuotingConfig) -> Result<Self> {
        if config.risk_aversion <= 0.0 || !config.risk_aversion.is_finite() {
            return Err(Error::ConfigError(format!(
                "risk_aversion must be positive, got {}",
                config.risk_aversion
            )));
        }
        if config.order_arrival_rate <= 0.0 {
            return Err(Error::ConfigError(format!(
                "order_arrival_rate must be positive, got {}",
                config.order_arrival_rate
            )));
        }
        if config.tick_size <= 0.0 {
            return Err(Error::ConfigError(format!(
                "tick_size must be positive, got {}",
                config.tick_size
            )));
        }
        if config.volatility < 0.0 || !config.volatility.is_finite() {
            return Err(Error::ConfigError(format!(
                "volatility must be non-negative, got {}",
                config.volatility
            )));
        }
        if config.quote_size <= 0.0 {
            return Err(Error::ConfigError(format!(
                "quote_size must be positive, got {}",
                config.quote_size
            )));
        }

        Ok(Self { config })
    }

    /// Compute two-sided quotes.
    ///
    /// `risk_free_rate` is kept in the signature for model completeness;
    /// the discounting term drops out at these horizons.
    ///
    /// Degenerate inputs (`time_remaining <= 0` or `mid_price <= 0`)
    /// produce an explicit refuse-to-quote result with zeroed prices and
    /// sizes.
    #[must_use]
    pub fn calculate_quotes(
        &self,
        mid_price: f64,
        inventory: i64,
        time_remaining: f64,
        _risk_free_rate: f64,
    ) -> Quotes {
        if time_remaining <= 0.0 || mid_price <= 0.0 {
            return Quotes::refused(mid_price);
        }

        let gamma = self.config.risk_aversion;
        let sigma2 = self.config.volatility * self.config.volatility;

        let reservation = mid_price - gamma * sigma2 * time_remaining * inventory as f64;
        let half_spread = gamma * sigma2 * time_remaining / 2.0
            + (1.0 / gamma) * (1.0 + gamma / self.config.order_arrival_rate).ln();

        // Round outward so the quoted spread never narrows below optimal.
        let bid_price = self.round_down(reservation - half_spread);
        let ask_price = self.round_up(reservation + half_spread);

        let (bid_size, ask_size) = self.skewed_sizes(inventory);

        Quotes {
            mid_price,
            bid_price,
            ask_price,
            spread: ask_price - bid_price,
            bid_size,
            ask_size,
        }
    }

    /// Cost of holding a quote exposed during one latency window.
    #[inline]
    #[must_use]
    pub fn calculate_latency_cost(&self, volatility: f64, mid_price: f64) -> f64 {
        volatility * mid_price * (self.config.latency_ns as f64 / 1e9).sqrt()
    }

    /// Whether quoting is worthwhile at this spread and latency cost.
    #[inline]
    #[must_use]
    pub fn should_quote(&self, spread: f64, latency_cost: f64) -> bool {
        spread > latency_cost
    }

    /// Current risk aversion (gamma)
    #[inline]
    #[must_use]
    pub fn risk_aversion(&self) -> f64 {
        self.config.risk_aversion
    }

    /// Update risk aversion; non-positive values are ignored.
    pub fn set_risk_aversion(&mut self, gamma: f64) {
        if gamma > 0.0 && gamma.is_finite() {
            self.config.risk_aversion = gamma;
        }
    }

    /// Current volatility estimate (sigma)
    #[inline]
    #[must_use]
    pub fn volatility(&self) -> f64 {
        self.config.volatility
    }

    /// Update the volatility estimate; negative or non-finite values are
    /// ignored.
    pub fn set_volatility(&mut self, sigma: f64) {
        if sigma >= 0.0 && sigma.is_finite() {
            self.config.volatility = sigma;
        }
    }

    /// Strategy configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &QuotingConfig {
        &self.config
    }

    fn round_down(&self, price: f64) -> f64 {
        (price / self.config.tick_size).floor() * self.config.tick_size
    }

    fn round_up(&self, price: f64) -> f64 {
        (price / self.config.tick_size).ceil() * self.config.tick_size
    }

    /// Per-side sizes, skewed to lean against inventory. Symmetric when
    /// inventory is zero.
    fn skewed_sizes(&self, inventory: i64) -> (f64, f64) {
        let limit = self.config.inventory_limit.max(1) as f64;
        let ratio = (inventory as f64 / limit).clamp(-1.0, 1.0);
        let skew = self.config.size_skew * ratio;

        let bid_size = (self.config.quote_size * (1.0 - skew)).max(0.0);
        let ask_size = (self.config.quote_size * (1.0 + skew)).max(0.0);
        (bid_size, ask_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> AvellanedaStoikov {
        AvellanedaStoikov::new(QuotingConfig::default()).unwrap()
    }

    #[test]
    fn test_basic_quote_calculation() {
        let strategy = strategy();
        let quotes = strategy.calculate_quotes(100.0, 0, 300.0, 0.0);

        assert!(quotes.bid_price > 0.0);
        assert!(quotes.bid_price < 100.0);
        assert!(quotes.ask_price > 100.0);
        assert!(quotes.spread > 0.0);
        assert!((quotes.mid_price - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_inventory_symmetry() {
        let strategy = strategy();
        let quotes = strategy.calculate_quotes(100.0, 0, 300.0, 0.0);

        let below = 100.0 - quotes.bid_price;
        let above = quotes.ask_price - 100.0;
        assert!(
            (below - above).abs() <= strategy.config().tick_size + 1e-9,
            "bid offset {below} and ask offset {above} should match within a tick"
        );
        assert!((quotes.bid_size - quotes.ask_size).abs() < f64::EPSILON);
    }

    #[test]
    fn test_positive_inventory_shifts_quotes_down() {
        let strategy = strategy();
        let flat = strategy.calculate_quotes(100.0, 0, 300.0, 0.0);
        let long = strategy.calculate_quotes(100.0, 500, 300.0, 0.0);

        assert!(long.bid_price < flat.bid_price);
        assert!(long.ask_price < flat.ask_price);
        assert!(long.spread >= flat.spread - 1e-9);
    }

    #[test]
    fn test_negative_inventory_shifts_quotes_up() {
        let strategy = strategy();
        let flat = strategy.calculate_quotes(100.0, 0, 300.0, 0.0);
        let short = strategy.calculate_quotes(100.0, -500, 300.0, 0.0);

        assert!(short.bid_price > flat.bid_price);
        assert!(short.ask_price > flat.ask_price);
        assert!(short.spread >= flat.spread - 1e-9);
    }

    #[test]
    fn test_inventory_skews_sizes() {
        let strategy = strategy();
        let long = strategy.calculate_quotes(100.0, 500, 300.0, 0.0);

        // Long inventory: quote less on the bid, more on the ask.
        assert!(long.bid_size < long.ask_size);
    }

    #[test]
    fn test_spread_monotonic_in_volatility() {
        let mut config = QuotingConfig::default();
        let mut last = 0.0;
        for sigma in [0.1, 0.2, 0.4, 0.8] {
            config.volatility = sigma;
            let s = AvellanedaStoikov::new(config.clone()).unwrap();
            let spread = s.calculate_quotes(100.0, 0, 300.0, 0.0).spread;
            assert!(spread >= last, "spread must not shrink as sigma grows");
            last = spread;
        }
    }

    #[test]
    fn test_spread_monotonic_in_horizon() {
        let strategy = strategy();
        let short = strategy.calculate_quotes(100.0, 0, 60.0, 0.0).spread;
        let long = strategy.calculate_quotes(100.0, 0, 600.0, 0.0).spread;
        assert!(long >= short);
    }

    #[test]
    fn test_spread_monotonic_in_risk_aversion() {
        let low = {
            let mut c = QuotingConfig::default();
            c.risk_aversion = 0.1;
            AvellanedaStoikov::new(c).unwrap()
        };
        let high = {
            let mut c = QuotingConfig::default();
            c.risk_aversion = 0.2;
            AvellanedaStoikov::new(c).unwrap()
        };

        let s_low = low.calculate_quotes(100.0, 0, 300.0, 0.0).spread;
        let s_high = high.calculate_quotes(100.0, 0, 300.0, 0.0).spread;
        assert!(s_high >= s_low);
    }

    #[test]
    fn test_degenerate_inputs_refuse_to_quote() {
        let strategy = strategy();

        let expired = strategy.calculate_quotes(100.0, 0, 0.0, 0.0);
        assert_eq!(expired.bid_price, 0.0);
        assert_eq!(expired.ask_price, 0.0);
        assert_eq!(expired.bid_size, 0.0);
        assert_eq!(expired.ask_size, 0.0);

        let invalid = strategy.calculate_quotes(0.0, 0, 300.0, 0.0);
        assert_eq!(invalid.bid_price, 0.0);
        assert_eq!(invalid.ask_price, 0.0);

        let negative_t = strategy.calculate_quotes(100.0, 0, -5.0, 0.0);
        assert!(!negative_t.is_actionable());
    }

    #[test]
    fn test_latency_cost() {
        let strategy = strategy();
        let cost = strategy.calculate_latency_cost(0.2, 100.0);
        assert!(cost > 0.0);

        assert!(strategy.should_quote(0.05, 0.02));
        assert!(!strategy.should_quote(0.01, 0.02));
        assert!(!strategy.should_quote(0.02, 0.02));
    }

    #[test]
    fn test_parameter_updates() {
        let mut strategy = strategy();

        strategy.set_risk_aversion(0.2);
        assert!((strategy.risk_aversion() - 0.2).abs() < 1e-6);

        strategy.set_volatility(0.3);
        assert!((strategy.volatility() - 0.3).abs() < 1e-6);

        // Invalid updates are ignored.
        strategy.set_risk_aversion(-1.0);
        assert!((strategy.risk_aversion() - 0.2).abs() < 1e-6);
        strategy.set_volatility(f64::NAN);
        assert!((strategy.volatility() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = QuotingConfig::default();
        bad.risk_aversion = 0.0;
        assert!(AvellanedaStoikov::new(bad).is_err());

        let mut bad = QuotingConfig::default();
        bad.tick_size = -0.01;
        assert!(AvellanedaStoikov::new(bad).is_err());

        let mut bad = QuotingConfig::default();
        bad.order_arrival_rate = 0.0;
        assert!(AvellanedaStoikov::new(bad).is_err());
    }
}
