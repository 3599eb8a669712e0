//! Heartbeat-driven venue health tracking.
//!
//! Each venue runs a small state machine: `Connected -> Connected` on
//! every heartbeat receipt, `Connected -> Disconnected` on the third
//! consecutive timeout, `Disconnected -> Connected` on any successful
//! receipt.

use quill_core::constants::DISCONNECT_TIMEOUT_COUNT;
use quill_core::types::Timestamp;

use crate::venue::VenueState;

/// Record that a heartbeat was sent to this venue.
pub fn record_heartbeat_sent(state: &mut VenueState, now: Timestamp) {
    state.last_heartbeat_sent = now;
    state.heartbeats_sent += 1;
}

/// Fold a completed heartbeat round trip into the venue's RTT model.
///
/// Updates the EMA and the EWMA standard deviation:
///
/// ```text
/// ema     <- alpha * rtt + (1 - alpha) * ema
/// std_dev <- sqrt(alpha * (rtt - ema)^2 + (1 - alpha) * std_dev^2)
/// ```
///
/// Any receipt reconnects the venue and clears its timeout streak.
pub fn record_heartbeat_received(
    state: &mut VenueState,
    sent: Timestamp,
    received: Timestamp,
    alpha: f64,
) {
    state.last_heartbeat_received = received;
    state.heartbeats_received += 1;
    state.consecutive_timeouts = 0;
    state.is_connected = true;

    let rtt_us = (received.duration_since(sent) as f64 / 1_000.0).max(0.0);
    state.current_rtt_us = rtt_us;

    state.ema_rtt_us = alpha * rtt_us + (1.0 - alpha) * state.ema_rtt_us;

    let delta = rtt_us - state.ema_rtt_us;
    state.std_dev_rtt_us =
        (alpha * delta * delta + (1.0 - alpha) * state.std_dev_rtt_us * state.std_dev_rtt_us)
            .sqrt();
}

/// Check one venue for a heartbeat timeout.
///
/// Counts a timeout when the venue is connected, has sent at least one
/// heartbeat, and the last send is older than `timeout_ns`. Returns true
/// if this check disconnected the venue.
pub fn check_timeout(state: &mut VenueState, now: Timestamp, timeout_ns: i64) -> bool {
    if state.last_heartbeat_sent == Timestamp::EPOCH {
        return false;
    }

    let since_sent = now.duration_since(state.last_heartbeat_sent);
    if since_sent > timeout_ns && state.is_connected {
        state.consecutive_timeouts += 1;

        if state.consecutive_timeouts >= DISCONNECT_TIMEOUT_COUNT {
            state.is_connected = false;
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::VenueInfo;
    use quill_core::types::VenueId;

    fn state() -> VenueState {
        let venue = VenueInfo {
            venue_id: VenueId::new("TESTVENUE").unwrap(),
            venue_name: "Test".to_string(),
            is_active: true,
            endpoint: String::new(),
            baseline_latency_us: 500.0,
            maker_fee_bps: 0.0,
            taker_fee_bps: 0.0,
            min_order_size: 1.0,
            max_order_size: 100.0,
            typical_bid_depth: 1_000.0,
            typical_ask_depth: 1_000.0,
            fill_rate: 0.9,
        };
        VenueState::for_venue(&venue)
    }

    #[test]
    fn test_rtt_ema_update() {
        let mut state = state();

        // 800us round trip folded in at alpha = 0.2.
        let sent = Timestamp::from_micros(1_000);
        let received = Timestamp::from_micros(1_800);
        record_heartbeat_received(&mut state, sent, received, 0.2);

        assert!((state.current_rtt_us - 800.0).abs() < 1e-9);
        assert!((state.ema_rtt_us - (0.2 * 800.0 + 0.8 * 500.0)).abs() < 1e-9);
        assert!(state.std_dev_rtt_us >= 0.0);
        assert!(state.ema_rtt_us > 0.0);
        assert_eq!(state.heartbeats_received, 1);
    }

    #[test]
    fn test_stddev_tracks_dispersion() {
        let mut stable = state();
        let mut jittery = state();

        for i in 0..50i64 {
            let sent = Timestamp::from_micros(i * 10_000);
            record_heartbeat_received(&mut stable, sent, sent.add_micros(500), 0.2);

            let rtt = if i % 2 == 0 { 200 } else { 900 };
            record_heartbeat_received(&mut jittery, sent, sent.add_micros(rtt), 0.2);
        }

        assert!(jittery.std_dev_rtt_us > stable.std_dev_rtt_us);
    }

    #[test]
    fn test_three_timeouts_disconnect() {
        let mut state = state();
        let timeout_ns = 1_000_000_000; // 1s

        record_heartbeat_sent(&mut state, Timestamp::from_secs(1));

        // Two late checks: still connected.
        assert!(!check_timeout(&mut state, Timestamp::from_secs(3), timeout_ns));
        assert!(!check_timeout(&mut state, Timestamp::from_secs(5), timeout_ns));
        assert!(state.is_connected);
        assert_eq!(state.consecutive_timeouts, 2);

        // Third strike disconnects.
        assert!(check_timeout(&mut state, Timestamp::from_secs(7), timeout_ns));
        assert!(!state.is_connected);

        // Further checks do not accrue once disconnected.
        assert!(!check_timeout(&mut state, Timestamp::from_secs(9), timeout_ns));
        assert_eq!(state.consecutive_timeouts, 3);
    }

    #[test]
    fn test_receipt_reconnects() {
        let mut state = state();
        let timeout_ns = 1_000_000_000;

        record_heartbeat_sent(&mut state, Timestamp::from_secs(1));
        for t in [3, 5, 7] {
            check_timeout(&mut state, Timestamp::from_secs(t), timeout_ns);
        }
        assert!(!state.is_connected);

        let sent = Timestamp::from_secs(8);
        record_heartbeat_received(&mut state, sent, sent.add_micros(600), 0.2);
        assert!(state.is_connected);
        assert_eq!(state.consecutive_timeouts, 0);
    }

    #[test]
    fn test_timely_heartbeat_no_timeout() {
        let mut state = state();
        let timeout_ns = 1_000_000_000;

        record_heartbeat_sent(&mut state, Timestamp::from_secs(1));
        assert!(!check_timeout(
            &mut state,
            Timestamp::from_millis(1_500),
            timeout_ns
        ));
        assert_eq!(state.consecutive_timeouts, 0);
    }

    #[test]
    fn test_no_heartbeat_sent_no_timeout() {
        let mut state = state();
        assert!(!check_timeout(&mut state, Timestamp::from_secs(100), 1_000));
        assert_eq!(state.consecutive_timeouts, 0);
    }
}
