//! Realized volatility estimation.

use quill_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// EWMA realized-volatility estimator.
///
/// Tracks an exponentially weighted variance of mid-price changes,
/// normalized by elapsed time, yielding sigma in price units per
/// sqrt-second, the scale the quoting model expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EwmaVolatility {
    /// EWMA smoothing factor in (0, 1)
    alpha: f64,
    /// Current variance estimate (price^2 per second)
    variance: f64,
    /// Floor applied to the reported sigma
    min_sigma: f64,
    last_mid: Option<f64>,
    last_time: Timestamp,
    observations: u64,
}

impl EwmaVolatility {
    /// Create an estimator seeded at `initial_sigma`.
    #[must_use]
    pub fn new(alpha: f64, initial_sigma: f64) -> Self {
        let alpha = alpha.clamp(1e-6, 1.0);
        Self {
            alpha,
            variance: initial_sigma * initial_sigma,
            min_sigma: initial_sigma * 0.1,
            last_mid: None,
            last_time: Timestamp::EPOCH,
            observations: 0,
        }
    }

    /// Fold in a mid-price observation.
    pub fn update(&mut self, mid_price: f64, now: Timestamp) {
        if mid_price <= 0.0 || !mid_price.is_finite() {
            return;
        }

        if let Some(prev) = self.last_mid {
            let dt = now.seconds_since(self.last_time);
            if dt > 0.0 {
                let change = mid_price - prev;
                let rate = (change * change) / dt;
                self.variance = self.alpha * rate + (1.0 - self.alpha) * self.variance;
                self.observations += 1;
            }
        }

        self.last_mid = Some(mid_price);
        self.last_time = now;
    }

    /// Current sigma estimate, floored away from zero.
    #[inline]
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.variance.sqrt().max(self.min_sigma)
    }

    /// Number of price changes folded in so far
    #[inline]
    #[must_use]
    pub fn observations(&self) -> u64 {
        self.observations
    }
}

impl Default for EwmaVolatility {
    fn default() -> Self {
        Self::new(0.05, 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sigma() {
        let vol = EwmaVolatility::new(0.05, 0.2);
        assert!((vol.sigma() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_larger_moves_raise_sigma() {
        let mut calm = EwmaVolatility::new(0.1, 0.05);
        let mut wild = EwmaVolatility::new(0.1, 0.05);

        let mut t = Timestamp::EPOCH;
        let mut calm_mid = 100.0;
        let mut wild_mid = 100.0;
        for i in 0..200 {
            t = t.add_millis(100);
            let dir = if i % 2 == 0 { 1.0 } else { -1.0 };
            calm_mid += dir * 0.01;
            wild_mid += dir * 0.50;
            calm.update(calm_mid, t);
            wild.update(wild_mid, t);
        }

        assert!(wild.sigma() > calm.sigma());
    }

    #[test]
    fn test_zero_dt_ignored() {
        let mut vol = EwmaVolatility::new(0.1, 0.2);
        let t = Timestamp::from_secs(1);
        vol.update(100.0, t);
        vol.update(150.0, t);

        assert_eq!(vol.observations(), 0);
        assert!((vol.sigma() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_bad_prices_ignored() {
        let mut vol = EwmaVolatility::new(0.1, 0.2);
        vol.update(-5.0, Timestamp::from_secs(1));
        vol.update(f64::NAN, Timestamp::from_secs(2));

        assert_eq!(vol.observations(), 0);
        assert!(vol.sigma().is_finite());
    }
}
