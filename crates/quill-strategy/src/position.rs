//! Inventory and P&L tracking.

use quill_core::types::Side;

/// Tracks signed inventory, average entry price, and realized/unrealized
/// P&L from a stream of fills.
///
/// Feeds `inventory` into the quoting model and `daily_pnl` into the risk
/// gate.
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    position: i64,
    avg_entry_price: f64,
    realized_pnl: f64,
    unrealized_pnl: f64,
    daily_start_pnl: f64,
    fill_count: u32,
    round_trips: u32,
}

impl PositionTracker {
    /// Create a flat tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a fill.
    pub fn apply_fill(&mut self, side: Side, price: f64, quantity: f64) {
        let signed_qty = side.sign() * quantity.round() as i64;
        if signed_qty == 0 {
            return;
        }
        self.fill_count += 1;

        let same_direction =
            (self.position >= 0 && signed_qty > 0) || (self.position <= 0 && signed_qty < 0);

        if same_direction || self.position == 0 {
            // Adding to the position: blend the entry price.
            let old_notional = self.position.abs() as f64 * self.avg_entry_price;
            let new_notional = signed_qty.abs() as f64 * price;
            let total_qty = (self.position.abs() + signed_qty.abs()) as f64;
            if total_qty > 0.0 {
                self.avg_entry_price = (old_notional + new_notional) / total_qty;
            }
            self.position += signed_qty;
        } else {
            // Reducing: realize P&L on the covered quantity.
            let reduce_qty = signed_qty.abs().min(self.position.abs()) as f64;
            let price_diff = if self.position > 0 {
                price - self.avg_entry_price
            } else {
                self.avg_entry_price - price
            };
            self.realized_pnl += price_diff * reduce_qty;

            let prev_position = self.position;
            self.position += signed_qty;

            if self.position == 0 || self.position.signum() != prev_position.signum() {
                self.round_trips += 1;
                self.avg_entry_price = if self.position == 0 { 0.0 } else { price };
            }
        }
    }

    /// Mark the open position against the current mid.
    pub fn mark(&mut self, mid_price: f64) {
        if self.position == 0 {
            self.unrealized_pnl = 0.0;
        } else {
            self.unrealized_pnl = (mid_price - self.avg_entry_price) * self.position as f64;
        }
    }

    /// Signed inventory
    #[inline]
    #[must_use]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Average entry price of the open position
    #[inline]
    #[must_use]
    pub fn avg_entry_price(&self) -> f64 {
        self.avg_entry_price
    }

    /// Realized plus unrealized P&L
    #[inline]
    #[must_use]
    pub fn total_pnl(&self) -> f64 {
        self.realized_pnl + self.unrealized_pnl
    }

    /// P&L accumulated since the session anchor
    #[inline]
    #[must_use]
    pub fn daily_pnl(&self) -> f64 {
        self.total_pnl() - self.daily_start_pnl
    }

    /// Anchor the daily P&L baseline at the current total.
    pub fn start_session(&mut self) {
        self.daily_start_pnl = self.total_pnl();
    }

    /// Number of fills applied
    #[inline]
    #[must_use]
    pub fn fill_count(&self) -> u32 {
        self.fill_count
    }

    /// Number of completed round trips
    #[inline]
    #[must_use]
    pub fn round_trips(&self) -> u32 {
        self.round_trips
    }

    /// Reset to flat.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_realizes_pnl() {
        let mut tracker = PositionTracker::new();

        tracker.apply_fill(Side::Buy, 100.0, 10.0);
        assert_eq!(tracker.position(), 10);
        assert!((tracker.avg_entry_price() - 100.0).abs() < 1e-12);

        tracker.apply_fill(Side::Sell, 100.5, 10.0);
        assert_eq!(tracker.position(), 0);
        assert_eq!(tracker.round_trips(), 1);
        assert!((tracker.total_pnl() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_entry_blends() {
        let mut tracker = PositionTracker::new();

        tracker.apply_fill(Side::Buy, 100.0, 10.0);
        tracker.apply_fill(Side::Buy, 102.0, 10.0);

        assert_eq!(tracker.position(), 20);
        assert!((tracker.avg_entry_price() - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrealized_marks_to_mid() {
        let mut tracker = PositionTracker::new();
        tracker.apply_fill(Side::Buy, 100.0, 10.0);

        tracker.mark(100.3);
        assert!((tracker.total_pnl() - 3.0).abs() < 1e-9);

        tracker.mark(99.8);
        assert!((tracker.total_pnl() + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_flip() {
        let mut tracker = PositionTracker::new();
        tracker.apply_fill(Side::Buy, 100.0, 5.0);
        tracker.apply_fill(Side::Sell, 101.0, 8.0);

        assert_eq!(tracker.position(), -3);
        // 5 contracts covered at +1 each.
        assert!((tracker.realized_pnl - 5.0).abs() < 1e-9);
        assert!((tracker.avg_entry_price() - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_pnl_anchoring() {
        let mut tracker = PositionTracker::new();
        tracker.apply_fill(Side::Buy, 100.0, 10.0);
        tracker.apply_fill(Side::Sell, 101.0, 10.0);
        assert!((tracker.daily_pnl() - 10.0).abs() < 1e-9);

        tracker.start_session();
        assert!(tracker.daily_pnl().abs() < 1e-12);
    }

    #[test]
    fn test_short_side() {
        let mut tracker = PositionTracker::new();
        tracker.apply_fill(Side::Sell, 100.0, 10.0);
        assert_eq!(tracker.position(), -10);

        tracker.mark(99.0);
        assert!((tracker.total_pnl() - 10.0).abs() < 1e-9);
    }
}
