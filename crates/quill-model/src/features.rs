//! Microstructure feature extraction.

use quill_core::constants::{DIV_EPSILON, FEATURE_DIM};
use quill_core::types::MarketTick;
use serde::{Deserialize, Serialize};

/// Fixed-size microstructure feature record, one value per model input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureFeatures {
    /// Order-flow imbalance at depth 1
    pub ofi_level_1: f64,
    /// Order-flow imbalance at depth 5
    pub ofi_level_5: f64,
    /// Order-flow imbalance at depth 10
    pub ofi_level_10: f64,
    /// Own spread over the reference asset's spread
    pub spread_ratio: f64,
    /// Reserved for a cross-asset correlation estimator; always 0.0 until
    /// one is provided
    pub price_correlation: f64,
    /// Top-of-book volume imbalance in [-1, 1]
    pub volume_imbalance: f64,
    /// Hawkes buy-arrival intensity
    pub hawkes_buy_intensity: f64,
    /// Hawkes sell-arrival intensity
    pub hawkes_sell_intensity: f64,
    /// Normalized intensity imbalance in [-1, 1]
    pub hawkes_imbalance: f64,
    /// Quoted spread in basis points of mid
    pub bid_ask_spread_bps: f64,
    /// Mid-price change since the previous tick
    pub mid_price_momentum: f64,
    /// Price impact per traded contract
    pub trade_flow_toxicity: f64,
}

impl Default for MicrostructureFeatures {
    fn default() -> Self {
        Self {
            ofi_level_1: 0.0,
            ofi_level_5: 0.0,
            ofi_level_10: 0.0,
            spread_ratio: 1.0,
            price_correlation: 0.0,
            volume_imbalance: 0.0,
            hawkes_buy_intensity: 0.0,
            hawkes_sell_intensity: 0.0,
            hawkes_imbalance: 0.0,
            bid_ask_spread_bps: 0.0,
            mid_price_momentum: 0.0,
            trade_flow_toxicity: 0.0,
        }
    }
}

impl MicrostructureFeatures {
    /// Flatten into the model input layout.
    #[must_use]
    pub fn as_array(&self) -> [f64; FEATURE_DIM] {
        [
            self.ofi_level_1,
            self.ofi_level_5,
            self.ofi_level_10,
            self.spread_ratio,
            self.price_correlation,
            self.volume_imbalance,
            self.hawkes_buy_intensity,
            self.hawkes_sell_intensity,
            self.hawkes_imbalance,
            self.bid_ask_spread_bps,
            self.mid_price_momentum,
            self.trade_flow_toxicity,
        ]
    }
}

/// Stateless feature extractor over consecutive book snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract the full feature vector.
    ///
    /// `previous` is the prior snapshot of the same instrument;
    /// `reference` a correlated instrument used for the spread ratio.
    /// All divisions carry a uniform near-zero guard: ratios default to
    /// 1.0, signed features to 0.0.
    #[must_use]
    pub fn extract(
        current: &MarketTick,
        previous: &MarketTick,
        reference: &MarketTick,
        hawkes_buy_intensity: f64,
        hawkes_sell_intensity: f64,
    ) -> MicrostructureFeatures {
        let mut features = MicrostructureFeatures::default();

        features.ofi_level_1 = Self::order_flow_imbalance(current, previous, 1);
        features.ofi_level_5 = Self::order_flow_imbalance(current, previous, 5);
        features.ofi_level_10 = Self::order_flow_imbalance(current, previous, 10);

        let current_spread = current.spread();
        let ref_spread = reference.spread();
        features.spread_ratio = if ref_spread > DIV_EPSILON {
            current_spread / ref_spread
        } else {
            1.0
        };

        let total_volume = f64::from(current.bid_size) + f64::from(current.ask_size);
        features.volume_imbalance = if total_volume > 0.0 {
            (f64::from(current.bid_size) - f64::from(current.ask_size)) / total_volume
        } else {
            0.0
        };

        features.hawkes_buy_intensity = hawkes_buy_intensity;
        features.hawkes_sell_intensity = hawkes_sell_intensity;
        let intensity_total = hawkes_buy_intensity + hawkes_sell_intensity;
        features.hawkes_imbalance = if intensity_total > DIV_EPSILON {
            (hawkes_buy_intensity - hawkes_sell_intensity) / intensity_total
        } else {
            0.0
        };

        features.bid_ask_spread_bps = if current.mid_price > DIV_EPSILON {
            (current_spread / current.mid_price) * 10_000.0
        } else {
            0.0
        };

        features.mid_price_momentum = current.mid_price - previous.mid_price;

        if current.trade_volume > 0 && previous.mid_price > DIV_EPSILON {
            let price_impact = (current.mid_price - previous.mid_price).abs();
            features.trade_flow_toxicity = price_impact / f64::from(current.trade_volume);
        }

        features
    }

    /// Depth-weighted order-flow imbalance between two snapshots.
    ///
    /// Level `k` contributes `(bid_delta - ask_delta) / (k + 1)`, summed
    /// over `min(depth, populated levels)`.
    #[must_use]
    pub fn order_flow_imbalance(current: &MarketTick, previous: &MarketTick, depth: usize) -> f64 {
        let levels = depth.min(current.levels());
        let mut ofi = 0.0;

        for k in 0..levels {
            let bid_delta = i64::from(current.bid_sizes[k]) - i64::from(previous.bid_sizes[k]);
            let ask_delta = i64::from(current.ask_sizes[k]) - i64::from(previous.ask_sizes[k]);
            let weight = 1.0 / (k as f64 + 1.0);
            ofi += weight * (bid_delta - ask_delta) as f64;
        }

        ofi
    }
}
