//! Pre-trade risk gate with policy-keyed constant limits.
//!
//! Limits are a closed set of policy tags, each carrying a constant
//! record, selected at construction time and dispatched by matching the
//! tag. The gate itself is a pure function of its arguments.

use quill_core::types::Side;
use serde::{Deserialize, Serialize};

/// Constant risk limits attached to a policy tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimits {
    /// Maximum absolute position after the order
    pub max_position_size: f64,
    /// Maximum single-order size
    pub max_order_size: f64,
    /// Maximum tolerated daily loss (positive number)
    pub max_daily_loss: f64,
    /// Minimum quoted spread in basis points
    pub min_spread_bps: f64,
    /// Whether selling without inventory is allowed
    pub allow_naked_shorts: bool,
}

/// Risk policy tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskPolicy {
    /// Tight limits, no naked shorts
    Strict,
    /// Default book limits
    #[default]
    Moderate,
    /// Wide limits, naked shorts allowed
    Aggressive,
}

impl RiskPolicy {
    /// The constant limit record for this policy.
    #[must_use]
    pub const fn limits(self) -> RiskLimits {
        match self {
            RiskPolicy::Strict => RiskLimits {
                max_position_size: 100.0,
                max_order_size: 10.0,
                max_daily_loss: 10_000.0,
                min_spread_bps: 5.0,
                allow_naked_shorts: false,
            },
            RiskPolicy::Moderate => RiskLimits {
                max_position_size: 500.0,
                max_order_size: 50.0,
                max_daily_loss: 50_000.0,
                min_spread_bps: 2.0,
                allow_naked_shorts: false,
            },
            RiskPolicy::Aggressive => RiskLimits {
                max_position_size: 1_000.0,
                max_order_size: 100.0,
                max_daily_loss: 100_000.0,
                min_spread_bps: 1.0,
                allow_naked_shorts: true,
            },
        }
    }

    /// Gate an order candidate. Pure: same arguments, same verdict.
    ///
    /// Rejects when the resulting position, the order size, the running
    /// daily P&L, or the quoted spread breach this policy's limits, or
    /// when a short would be naked under a policy that forbids it.
    #[must_use]
    pub fn check_order(
        self,
        current_position: f64,
        order_size: f64,
        side: Side,
        daily_pnl: f64,
        spread_bps: f64,
    ) -> bool {
        let limits = self.limits();

        let new_position = current_position + side.sign_f64() * order_size;
        if new_position.abs() > limits.max_position_size {
            return false;
        }

        if order_size > limits.max_order_size {
            return false;
        }

        if daily_pnl < -limits.max_daily_loss {
            return false;
        }

        if spread_bps < limits.min_spread_bps {
            return false;
        }

        if !limits.allow_naked_shorts && side.is_sell() && current_position <= 0.0 {
            return false;
        }

        true
    }

    /// Check only the position limit.
    #[must_use]
    pub fn check_position_limit(self, position: f64) -> bool {
        position.abs() <= self.limits().max_position_size
    }

    /// Check only the order size limit.
    #[must_use]
    pub fn check_order_size(self, size: f64) -> bool {
        size <= self.limits().max_order_size
    }

    /// Check only the daily loss limit.
    #[must_use]
    pub fn check_daily_loss(self, pnl: f64) -> bool {
        pnl >= -self.limits().max_daily_loss
    }

    /// Check only the minimum spread requirement.
    #[must_use]
    pub fn check_min_spread(self, spread_bps: f64) -> bool {
        spread_bps >= self.limits().min_spread_bps
    }
}
