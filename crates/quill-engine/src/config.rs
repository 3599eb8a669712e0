//! Engine configuration.

use quill_flow::hawkes::KernelBank;
use quill_model::signal::RegimeClassifier;
use quill_router::router::RoutingConfig;
use quill_router::venue::{default_venue_profile, VenueInfo};
use quill_strategy::quoting::QuotingConfig;
use quill_strategy::risk::RiskPolicy;
use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine instance name
    pub name: String,
    /// Log level
    pub log_level: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// Risk policy tag (a plain value, kept ahead of the tables so the
    /// TOML form stays valid)
    pub risk_policy: RiskPolicy,
    /// Synthetic feed parameters
    pub feed: FeedConfig,
    /// Order-flow intensity parameters
    pub flow: FlowConfig,
    /// Quoting strategy parameters
    pub quoting: QuotingConfig,
    /// Inference parameters
    pub model: ModelConfig,
    /// Regime classification thresholds
    pub regime: RegimeClassifier,
    /// Router parameters
    pub routing: RoutingConfig,
    /// Venue registry; defaults to the standard three-venue profile
    pub venues: Vec<VenueInfo>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "quill".to_string(),
            log_level: "info".to_string(),
            metrics_port: 9090,
            risk_policy: RiskPolicy::Moderate,
            feed: FeedConfig::default(),
            flow: FlowConfig::default(),
            quoting: QuotingConfig::default(),
            model: ModelConfig::default(),
            regime: RegimeClassifier::default(),
            routing: RoutingConfig::default(),
            venues: default_venue_profile(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Profile tuned for fast deterministic simulation runs: tight event
    /// intervals, rapid heartbeats, strict risk.
    #[must_use]
    pub fn simulation() -> Self {
        Self {
            feed: FeedConfig {
                avg_event_interval_ns: 1_000_000,
                ..FeedConfig::default()
            },
            routing: RoutingConfig {
                heartbeat_interval_ms: 1,
                ..RoutingConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Synthetic feed parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Starting mid price
    pub initial_mid: f64,
    /// Tick size
    pub tick_size: f64,
    /// Average quoted spread in ticks
    pub avg_spread_ticks: u32,
    /// Average size per depth level
    pub avg_level_size: u32,
    /// Mid-price volatility per event, in ticks (std dev)
    pub volatility_ticks: f64,
    /// Probability a given event carries a trade
    pub trade_frequency: f64,
    /// Average trade size
    pub avg_trade_size: u32,
    /// Average time between events, nanoseconds
    pub avg_event_interval_ns: u64,
    /// RNG seed
    pub seed: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            initial_mid: 100.0,
            tick_size: 0.01,
            avg_spread_ticks: 10,
            avg_level_size: 50,
            volatility_ticks: 0.8,
            trade_frequency: 0.35,
            avg_trade_size: 5,
            avg_event_interval_ns: 1_000_000,
            seed: 42,
        }
    }
}

/// Order-flow intensity parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Baseline buy intensity
    pub mu_buy: f64,
    /// Baseline sell intensity
    pub mu_sell: f64,
    /// Excitation kernel bank
    pub kernels: KernelBank,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            mu_buy: 10.0,
            mu_sell: 10.0,
            kernels: KernelBank::default(),
        }
    }
}

/// Inference parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Seed for boot-time weight randomization
    pub weight_seed: u64,
    /// Fixed latency budget for every predict call, nanoseconds
    pub fixed_latency_ns: i64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weight_seed: 42,
            fixed_latency_ns: quill_core::constants::DEFAULT_FIXED_LATENCY_NS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.venues.len(), 3);
        assert!(config.quoting.risk_aversion > 0.0);
        assert!(config.routing.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EngineConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.name, config.name);
        assert_eq!(parsed.venues.len(), config.venues.len());
        assert!((parsed.quoting.tick_size - config.quoting.tick_size).abs() < f64::EPSILON);
        assert_eq!(parsed.risk_policy, config.risk_policy);
    }

    #[test]
    fn test_simulation_profile() {
        let config = EngineConfig::simulation();
        assert_eq!(config.routing.heartbeat_interval_ms, 1);
    }
}
