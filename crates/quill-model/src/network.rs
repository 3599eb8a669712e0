//! Fixed-latency micro-DNN inference.
//!
//! A 12-8-3 dense network (ReLU hidden layer, softmax output) small
//! enough to run in a few hundred nanoseconds. `predict` pads its
//! wall-clock execution to a fixed budget, so downstream consumers see
//! deterministic timing regardless of cache state, the same contract a
//! hardware inference offload would give the quoting loop.

use std::sync::atomic::{AtomicU64, Ordering};

use quill_core::clock::MonotonicClock;
use quill_core::constants::FEATURE_DIM;
use quill_core::error::{Error, Result};
use quill_core::traits::Clock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::features::MicrostructureFeatures;

/// Hidden layer width
pub const HIDDEN_DIM: usize = 8;
/// Output classes (down, flat, up)
pub const OUTPUT_DIM: usize = 3;

/// Dense weights and biases for the 12-8-3 topology.
///
/// Fixed for the life of the process: loaded or randomized at boot,
/// never updated online.
#[derive(Debug, Clone)]
pub struct ModelWeights {
    /// Hidden layer weights, row-major `[HIDDEN_DIM x FEATURE_DIM]`
    pub hidden: [f64; HIDDEN_DIM * FEATURE_DIM],
    /// Hidden layer biases
    pub hidden_bias: [f64; HIDDEN_DIM],
    /// Output layer weights, row-major `[OUTPUT_DIM x HIDDEN_DIM]`
    pub output: [f64; OUTPUT_DIM * HIDDEN_DIM],
    /// Output layer biases
    pub output_bias: [f64; OUTPUT_DIM],
}

impl ModelWeights {
    /// Random small weights, zero biases, reproducible from `seed`.
    #[must_use]
    pub fn random(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hidden = [0.0; HIDDEN_DIM * FEATURE_DIM];
        let mut output = [0.0; OUTPUT_DIM * HIDDEN_DIM];
        for w in &mut hidden {
            *w = rng.gen_range(-0.1..0.1);
        }
        for w in &mut output {
            *w = rng.gen_range(-0.1..0.1);
        }

        Self {
            hidden,
            hidden_bias: [0.0; HIDDEN_DIM],
            output,
            output_bias: [0.0; OUTPUT_DIM],
        }
    }

    fn validate(&self) -> Result<()> {
        let all_finite = self.hidden.iter()
            .chain(self.hidden_bias.iter())
            .chain(self.output.iter())
            .chain(self.output_bias.iter())
            .all(|w| w.is_finite());

        if all_finite {
            Ok(())
        } else {
            Err(Error::ModelError(
                "weights contain NaN or infinite values".to_string(),
            ))
        }
    }
}

/// Output of one inference call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Class probabilities (down, flat, up); sums to 1
    pub probabilities: [f64; OUTPUT_DIM],
    /// Raw compute time before padding, in nanoseconds
    pub compute_ns: u64,
}

impl Prediction {
    /// Predicted direction: -1 (down), 0 (flat), +1 (up).
    #[must_use]
    pub fn direction(&self) -> i8 {
        let mut best = 0;
        for i in 1..OUTPUT_DIM {
            if self.probabilities[i] > self.probabilities[best] {
                best = i;
            }
        }
        match best {
            0 => -1,
            1 => 0,
            _ => 1,
        }
    }

    /// Probability of the predicted class.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .iter()
            .fold(0.0_f64, |acc, &p| acc.max(p))
    }
}

/// Fixed-latency feedforward inference engine.
pub struct MicroDnn {
    weights: ModelWeights,
    fixed_latency_ns: i64,
    clock: MonotonicClock,
    inference_count: AtomicU64,
    overrun_count: AtomicU64,
    total_compute_ns: AtomicU64,
}

impl MicroDnn {
    /// Create an engine with weights randomized at boot.
    #[must_use]
    pub fn random(seed: u64, fixed_latency_ns: i64) -> Self {
        // Random weights are always finite, so this cannot fail.
        Self::from_weights(ModelWeights::random(seed), fixed_latency_ns)
            .expect("random weights are finite")
    }

    /// Create an engine from loaded weights.
    ///
    /// # Errors
    /// Fails at initialization on NaN or infinite weights; corrupt
    /// weights must never reach the hot path.
    pub fn from_weights(weights: ModelWeights, fixed_latency_ns: i64) -> Result<Self> {
        weights.validate()?;

        Ok(Self {
            weights,
            fixed_latency_ns: fixed_latency_ns.max(0),
            clock: MonotonicClock::new(),
            inference_count: AtomicU64::new(0),
            overrun_count: AtomicU64::new(0),
            total_compute_ns: AtomicU64::new(0),
        })
    }

    /// Run inference, padded to the fixed latency budget.
    ///
    /// If the forward pass finishes early the call busy-waits (with CPU
    /// pause hints) until the budget elapses; if it overruns it returns
    /// immediately and the overrun counter ticks.
    pub fn predict(&self, features: &MicrostructureFeatures) -> Prediction {
        let start = self.clock.now();

        let probabilities = self.forward(&features.as_array());

        let elapsed = self.clock.now() - start;
        if elapsed < self.fixed_latency_ns {
            while (self.clock.now() - start) < self.fixed_latency_ns {
                std::hint::spin_loop();
            }
        } else if self.fixed_latency_ns > 0 {
            self.overrun_count.fetch_add(1, Ordering::Relaxed);
        }

        self.inference_count.fetch_add(1, Ordering::Relaxed);
        let compute_ns = elapsed.max(0) as u64;
        self.total_compute_ns.fetch_add(compute_ns, Ordering::Relaxed);

        Prediction {
            probabilities,
            compute_ns,
        }
    }

    /// The wall-clock budget every call is padded to.
    #[inline]
    #[must_use]
    pub fn fixed_latency_ns(&self) -> i64 {
        self.fixed_latency_ns
    }

    /// Total inference calls
    #[must_use]
    pub fn inference_count(&self) -> u64 {
        self.inference_count.load(Ordering::Relaxed)
    }

    /// Calls whose forward pass exceeded the budget
    #[must_use]
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count.load(Ordering::Relaxed)
    }

    /// Mean raw compute time per call, in nanoseconds
    #[must_use]
    pub fn avg_compute_ns(&self) -> u64 {
        let count = self.inference_count();
        if count == 0 {
            0
        } else {
            self.total_compute_ns.load(Ordering::Relaxed) / count
        }
    }

    fn forward(&self, input: &[f64; FEATURE_DIM]) -> [f64; OUTPUT_DIM] {
        let mut hidden = [0.0; HIDDEN_DIM];
        for (row, h) in hidden.iter_mut().enumerate() {
            let mut acc = self.weights.hidden_bias[row];
            for (col, &x) in input.iter().enumerate() {
                acc += self.weights.hidden[row * FEATURE_DIM + col] * x;
            }
            *h = acc.max(0.0);
        }

        let mut output = [0.0; OUTPUT_DIM];
        for (row, o) in output.iter_mut().enumerate() {
            let mut acc = self.weights.output_bias[row];
            for (col, &h) in hidden.iter().enumerate() {
                acc += self.weights.output[row * HIDDEN_DIM + col] * h;
            }
            *o = acc;
        }

        softmax(&mut output);
        output
    }
}

/// Numerically stable softmax in place: subtract the max, exponentiate
/// with a fast approximation, normalize by the inverse sum.
fn softmax(logits: &mut [f64; OUTPUT_DIM]) {
    let max = logits.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let mut sum = 0.0;
    for l in logits.iter_mut() {
        *l = fast_exp(*l - max);
        sum += *l;
    }

    let inv_sum = 1.0 / sum;
    for l in logits.iter_mut() {
        *l *= inv_sum;
    }
}

/// Fast exp approximation via IEEE-754 bit manipulation.
///
/// Accurate to a few percent over the post-max-subtraction range, which
/// the normalization step absorbs. The argument is clamped to keep the
/// bit pattern in the normal range.
#[inline]
fn fast_exp(x: f64) -> f64 {
    const SCALE: f64 = 6_497_320_848_556_798.3; // 2^52 / ln(2)
    const BIAS: i64 = 4_607_182_418_800_017_408; // 1023 << 52
    let x = x.clamp(-700.0, 700.0);
    f64::from_bits(((SCALE * x) as i64 + BIAS) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn noisy_features(i: u64) -> MicrostructureFeatures {
        let f = i as f64;
        MicrostructureFeatures {
            ofi_level_1: f.sin() * 5.0,
            ofi_level_5: f.cos() * 3.0,
            ofi_level_10: (f * 0.1).sin(),
            volume_imbalance: (f % 3.0) - 1.0,
            hawkes_buy_intensity: 10.0 + (f % 7.0),
            hawkes_sell_intensity: 10.0 + (f % 5.0),
            hawkes_imbalance: ((f % 7.0) - (f % 5.0)) / 20.0,
            bid_ask_spread_bps: 5.0 + (f % 11.0),
            mid_price_momentum: f.sin() * 0.2,
            trade_flow_toxicity: 0.01,
            ..MicrostructureFeatures::default()
        }
    }

    #[test]
    fn test_fast_exp_near_unity() {
        assert!((fast_exp(0.0) - 1.0).abs() < 1e-12);
        for x in [-5.0, -1.0, -0.5, 0.5, 1.0, 5.0] {
            let approx = fast_exp(x);
            let exact = x.exp();
            assert!(
                (approx - exact).abs() / exact < 0.07,
                "fast_exp({x}) = {approx} too far from {exact}"
            );
        }
    }

    #[test]
    fn test_softmax_law() {
        let model = MicroDnn::random(42, 0);

        for i in 0..100 {
            let prediction = model.predict(&noisy_features(i));
            let sum: f64 = prediction.probabilities.iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-9,
                "probabilities must sum to 1, got {sum}"
            );
            for &p in &prediction.probabilities {
                assert!(p > 0.0 && p < 1.0, "each probability in (0, 1), got {p}");
            }
        }
    }

    #[test]
    fn test_zero_weights_give_uniform_output() {
        let weights = ModelWeights {
            hidden: [0.0; HIDDEN_DIM * FEATURE_DIM],
            hidden_bias: [0.0; HIDDEN_DIM],
            output: [0.0; OUTPUT_DIM * HIDDEN_DIM],
            output_bias: [0.0; OUTPUT_DIM],
        };
        let model = MicroDnn::from_weights(weights, 0).unwrap();

        let prediction = model.predict(&noisy_features(7));
        for &p in &prediction.probabilities {
            assert!((p - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let a = MicroDnn::random(7, 0);
        let b = MicroDnn::random(7, 0);

        let features = noisy_features(13);
        assert_eq!(
            a.predict(&features).probabilities,
            b.predict(&features).probabilities
        );
    }

    #[test]
    fn test_nan_weights_rejected_at_init() {
        let mut weights = ModelWeights::random(1);
        weights.hidden[17] = f64::NAN;
        assert!(MicroDnn::from_weights(weights, 400).is_err());

        let mut weights = ModelWeights::random(1);
        weights.output_bias[0] = f64::INFINITY;
        assert!(MicroDnn::from_weights(weights, 400).is_err());
    }

    #[test]
    fn test_latency_floor() {
        let model = MicroDnn::random(42, 400);
        let features = noisy_features(3);

        // Warm the caches before measuring.
        for _ in 0..100 {
            model.predict(&features);
        }

        for _ in 0..1_000 {
            let start = Instant::now();
            model.predict(&features);
            let elapsed_ns = start.elapsed().as_nanos();
            assert!(
                elapsed_ns >= 400,
                "predict returned after {elapsed_ns}ns, below the 400ns floor"
            );
        }
    }

    #[test]
    fn test_counters() {
        let model = MicroDnn::random(42, 1_000_000);
        assert_eq!(model.inference_count(), 0);

        let features = noisy_features(1);
        for _ in 0..10 {
            model.predict(&features);
        }

        assert_eq!(model.inference_count(), 10);
        // 1ms budget: the forward pass never overruns it.
        assert_eq!(model.overrun_count(), 0);
    }

    #[test]
    fn test_direction_and_confidence() {
        let prediction = Prediction {
            probabilities: [0.2, 0.3, 0.5],
            compute_ns: 100,
        };
        assert_eq!(prediction.direction(), 1);
        assert!((prediction.confidence() - 0.5).abs() < 1e-12);

        let down = Prediction {
            probabilities: [0.6, 0.3, 0.1],
            compute_ns: 100,
        };
        assert_eq!(down.direction(), -1);

        let flat = Prediction {
            probabilities: [0.2, 0.6, 0.2],
            compute_ns: 100,
        };
        assert_eq!(flat.direction(), 0);
    }
}
