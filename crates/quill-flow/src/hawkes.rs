//! Multi-kernel Hawkes intensity engine.

use quill_core::constants::{HAWKES_EPSILON, KERNEL_COUNT, MAX_HAWKES_DT_SECS};
use quill_core::error::{Error, Result};
use quill_core::types::{Side, Timestamp, TradingEvent};
use serde::{Deserialize, Serialize};

/// Excitation kernel bank: `KERNEL_COUNT` exponential kernels at distinct
/// time scales.
///
/// `alphas_self[k]` is the intensity jump a same-side event adds under
/// kernel `k`; `alphas_cross[k]` the jump an opposite-side event adds;
/// `betas[k]` the decay rate per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelBank {
    /// Self-excitation jumps per kernel
    pub alphas_self: [f64; KERNEL_COUNT],
    /// Cross-excitation jumps per kernel
    pub alphas_cross: [f64; KERNEL_COUNT],
    /// Decay rates per kernel (per second)
    pub betas: [f64; KERNEL_COUNT],
}

impl Default for KernelBank {
    fn default() -> Self {
        Self {
            alphas_self: [0.5, 0.4, 0.3, 0.2],
            alphas_cross: [0.1, 0.1, 0.05, 0.05],
            betas: [100.0, 10.0, 1.0, 0.1],
        }
    }
}

impl KernelBank {
    /// Validate the bank.
    ///
    /// # Errors
    /// Fails on non-finite or negative `alpha`, or non-positive `beta`.
    /// Misconfigured kernels must prevent startup, never surface mid-run.
    pub fn validate(&self) -> Result<()> {
        for k in 0..KERNEL_COUNT {
            if !self.alphas_self[k].is_finite() || self.alphas_self[k] < 0.0 {
                return Err(Error::InvalidKernel(format!(
                    "alpha_self[{k}] = {} must be finite and non-negative",
                    self.alphas_self[k]
                )));
            }
            if !self.alphas_cross[k].is_finite() || self.alphas_cross[k] < 0.0 {
                return Err(Error::InvalidKernel(format!(
                    "alpha_cross[{k}] = {} must be finite and non-negative",
                    self.alphas_cross[k]
                )));
            }
            if !self.betas[k].is_finite() || self.betas[k] <= 0.0 {
                return Err(Error::InvalidKernel(format!(
                    "beta[{k}] = {} must be finite and positive",
                    self.betas[k]
                )));
            }
        }
        Ok(())
    }
}

/// Bivariate multi-kernel Hawkes intensity engine.
///
/// Per kernel `k` it maintains running sums `s_buy[k]` and `s_sell[k]`
/// holding the exponentially weighted contribution of all past events, so
/// an update is O(KERNEL_COUNT) regardless of history length.
///
/// Reads use peek-decay: `*_intensity_at(now)` applies decay to a copy of
/// the accumulators without mutating state. `update` is the only mutating
/// operation, which keeps the strategy thread's total order of updates
/// trivial to reason about. Peeked and updated values agree whenever a
/// query lands on an update time.
#[derive(Debug, Clone)]
pub struct MultiKernelHawkes {
    mu_buy: f64,
    mu_sell: f64,
    kernels: KernelBank,
    s_buy: [f64; KERNEL_COUNT],
    s_sell: [f64; KERNEL_COUNT],
    last_update: Timestamp,
}

impl MultiKernelHawkes {
    /// Create a new engine.
    ///
    /// # Errors
    /// Fails if either baseline intensity is non-positive or the kernel
    /// bank is invalid.
    pub fn new(mu_buy: f64, mu_sell: f64, kernels: KernelBank) -> Result<Self> {
        if !(mu_buy > 0.0 && mu_buy.is_finite()) || !(mu_sell > 0.0 && mu_sell.is_finite()) {
            return Err(Error::InvalidKernel(format!(
                "baseline intensities must be positive, got mu_buy={mu_buy} mu_sell={mu_sell}"
            )));
        }
        kernels.validate()?;

        Ok(Self {
            mu_buy,
            mu_sell,
            kernels,
            s_buy: [0.0; KERNEL_COUNT],
            s_sell: [0.0; KERNEL_COUNT],
            last_update: Timestamp::EPOCH,
        })
    }

    /// Ingest one order-flow event.
    ///
    /// Decays all accumulators by the elapsed time since the previous
    /// update, then adds the event's excitation jumps. A backwards
    /// arrival time (clock jitter) contributes zero elapsed time; gaps
    /// are clamped so the fast kernels cannot underflow.
    pub fn update(&mut self, event: TradingEvent) {
        let dt = event
            .arrival_time
            .seconds_since(self.last_update)
            .clamp(0.0, MAX_HAWKES_DT_SECS);

        for k in 0..KERNEL_COUNT {
            let decay = (-self.kernels.betas[k] * dt).exp();
            self.s_buy[k] *= decay;
            self.s_sell[k] *= decay;

            if self.s_buy[k] < HAWKES_EPSILON {
                self.s_buy[k] = 0.0;
            }
            if self.s_sell[k] < HAWKES_EPSILON {
                self.s_sell[k] = 0.0;
            }
        }

        match event.side {
            Side::Buy => {
                for k in 0..KERNEL_COUNT {
                    self.s_buy[k] += self.kernels.alphas_self[k];
                    self.s_sell[k] += self.kernels.alphas_cross[k];
                }
            }
            Side::Sell => {
                for k in 0..KERNEL_COUNT {
                    self.s_sell[k] += self.kernels.alphas_self[k];
                    self.s_buy[k] += self.kernels.alphas_cross[k];
                }
            }
        }

        self.last_update = event.arrival_time;
    }

    /// Buy intensity evaluated at the last update time.
    #[inline]
    #[must_use]
    pub fn buy_intensity(&self) -> f64 {
        self.mu_buy + self.s_buy.iter().sum::<f64>()
    }

    /// Sell intensity evaluated at the last update time.
    #[inline]
    #[must_use]
    pub fn sell_intensity(&self) -> f64 {
        self.mu_sell + self.s_sell.iter().sum::<f64>()
    }

    /// Buy intensity decayed to `now`, without mutating state.
    #[must_use]
    pub fn buy_intensity_at(&self, now: Timestamp) -> f64 {
        self.mu_buy + self.peeked_sum(&self.s_buy, now)
    }

    /// Sell intensity decayed to `now`, without mutating state.
    #[must_use]
    pub fn sell_intensity_at(&self, now: Timestamp) -> f64 {
        self.mu_sell + self.peeked_sum(&self.s_sell, now)
    }

    /// Baseline buy intensity
    #[inline]
    #[must_use]
    pub fn mu_buy(&self) -> f64 {
        self.mu_buy
    }

    /// Baseline sell intensity
    #[inline]
    #[must_use]
    pub fn mu_sell(&self) -> f64 {
        self.mu_sell
    }

    /// Time of the last ingested event
    #[inline]
    #[must_use]
    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    fn peeked_sum(&self, sums: &[f64; KERNEL_COUNT], now: Timestamp) -> f64 {
        let dt = now
            .seconds_since(self.last_update)
            .clamp(0.0, MAX_HAWKES_DT_SECS);

        let mut total = 0.0;
        for k in 0..KERNEL_COUNT {
            total += sums[k] * (-self.kernels.betas[k] * dt).exp();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MultiKernelHawkes {
        MultiKernelHawkes::new(10.0, 10.0, KernelBank::default()).unwrap()
    }

    fn buy_at(nanos: i64) -> TradingEvent {
        TradingEvent {
            arrival_time: Timestamp::from_nanos(nanos),
            side: Side::Buy,
        }
    }

    fn sell_at(nanos: i64) -> TradingEvent {
        TradingEvent {
            arrival_time: Timestamp::from_nanos(nanos),
            side: Side::Sell,
        }
    }

    #[test]
    fn test_initial_intensity_is_baseline() {
        let engine = engine();
        assert!((engine.buy_intensity() - 10.0).abs() < 1e-9);
        assert!((engine.sell_intensity() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_buy_event_raises_buy_intensity() {
        let mut engine = engine();
        let before = engine.buy_intensity();

        engine.update(buy_at(1_000_000_000));

        assert!(engine.buy_intensity() > before);
        // Cross-excitation lifts the sell side too, by less.
        assert!(engine.sell_intensity() > 10.0);
        assert!(engine.sell_intensity() < engine.buy_intensity());
    }

    #[test]
    fn test_intensity_decays_toward_baseline() {
        let mut engine = engine();
        let t0 = 1_000_000_000;
        engine.update(buy_at(t0));
        let excited = engine.buy_intensity();

        let later = Timestamp::from_nanos(t0 + 2_000_000_000);
        let peeked = engine.buy_intensity_at(later);
        assert!(peeked < excited);
        assert!(peeked >= engine.mu_buy());

        let much_later = Timestamp::from_nanos(t0 + 50_000_000_000);
        let almost_baseline = engine.buy_intensity_at(much_later);
        assert!((almost_baseline - engine.mu_buy()).abs() < 0.2);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let mut engine = engine();
        engine.update(buy_at(1_000_000_000));
        let at_update = engine.buy_intensity();

        let _ = engine.buy_intensity_at(Timestamp::from_secs(100));
        assert!((engine.buy_intensity() - at_update).abs() < 1e-12);
    }

    #[test]
    fn test_peek_agrees_with_update_time() {
        let mut engine = engine();
        let t0 = 5_000_000_000;
        engine.update(buy_at(t0));

        let peeked = engine.buy_intensity_at(Timestamp::from_nanos(t0));
        assert!((peeked - engine.buy_intensity()).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry_buy_sell() {
        // Symmetric kernels and baselines: a BUY then a SELL at the same
        // instant leave the two intensities equal.
        let mut engine = engine();
        let t0 = 1_000_000_000;
        engine.update(buy_at(t0));
        engine.update(sell_at(t0));

        assert!((engine.buy_intensity() - engine.sell_intensity()).abs() < 1e-9);
    }

    #[test]
    fn test_burst_and_decay() {
        let mut engine = engine();
        let t0 = 1_000_000_000;

        for _ in 0..5 {
            engine.update(buy_at(t0));
        }

        let burst = engine.buy_intensity();
        assert!(burst > 10.0);

        // One more event a second later: decayed burst plus one fresh jump
        // sits below the burst peak but above baseline.
        engine.update(buy_at(t0 + 1_000_000_000));
        let after = engine.buy_intensity();
        assert!(after < burst);
        assert!(after >= engine.mu_buy());
    }

    #[test]
    fn test_backwards_timestamp_clipped() {
        let mut engine = engine();
        engine.update(buy_at(2_000_000_000));
        let at_two = engine.buy_intensity();

        // An event with an earlier arrival time must not inflate decay.
        engine.update(buy_at(1_000_000_000));
        let expected_jump: f64 = KernelBank::default().alphas_self.iter().sum();
        assert!((engine.buy_intensity() - (at_two + expected_jump)).abs() < 1e-9);
    }

    #[test]
    fn test_long_gap_clamped() {
        let mut engine = engine();
        engine.update(buy_at(0));

        // A day-long gap decays the slowest kernel by at most
        // exp(-0.1 * 60) thanks to the clamp, not exp(-0.1 * 86400).
        let next = TradingEvent {
            arrival_time: Timestamp::from_secs(86_400),
            side: Side::Sell,
        };
        let mut clone = engine.clone();
        clone.update(next);
        assert!(clone.buy_intensity().is_finite());
        assert!(clone.buy_intensity() >= clone.mu_buy());
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(MultiKernelHawkes::new(0.0, 10.0, KernelBank::default()).is_err());
        assert!(MultiKernelHawkes::new(10.0, -1.0, KernelBank::default()).is_err());

        let bad_beta = KernelBank {
            betas: [100.0, 10.0, 0.0, 0.1],
            ..KernelBank::default()
        };
        assert!(MultiKernelHawkes::new(10.0, 10.0, bad_beta).is_err());

        let bad_alpha = KernelBank {
            alphas_self: [0.5, f64::NAN, 0.3, 0.2],
            ..KernelBank::default()
        };
        assert!(MultiKernelHawkes::new(10.0, 10.0, bad_alpha).is_err());
    }
}
