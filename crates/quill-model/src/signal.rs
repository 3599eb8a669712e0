//! Market regime classification.

use quill_core::types::{MarketRegime, MarketTick};
use serde::{Deserialize, Serialize};

/// Maps realized volatility and book state onto a [`MarketRegime`].
///
/// The regime feeds the router's urgency multiplier: calmer regimes allow
/// wider latency budgets, stressed regimes compress them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeClassifier {
    /// Volatility considered normal for the instrument
    pub baseline_sigma: f64,
    /// Sigma multiple at which volatility counts as elevated
    pub elevated_ratio: f64,
    /// Sigma multiple at which the market counts as stressed
    pub stress_ratio: f64,
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self {
            baseline_sigma: 0.2,
            elevated_ratio: 1.5,
            stress_ratio: 3.0,
        }
    }
}

impl RegimeClassifier {
    /// Classify the current regime.
    ///
    /// A one-sided or crossed book means there is no tradable market:
    /// that is `Halted` regardless of volatility.
    #[must_use]
    pub fn classify(&self, sigma: f64, tick: &MarketTick) -> MarketRegime {
        if tick.bid_price <= 0.0 || tick.ask_price <= 0.0 || tick.spread() <= 0.0 {
            return MarketRegime::Halted;
        }

        let baseline = self.baseline_sigma.max(f64::MIN_POSITIVE);
        let ratio = sigma / baseline;

        if ratio >= self.stress_ratio {
            MarketRegime::HighStress
        } else if ratio >= self.elevated_ratio {
            MarketRegime::ElevatedVolatility
        } else {
            MarketRegime::Normal
        }
    }
}
