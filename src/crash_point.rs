// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Crash Point Generation
//
// Draws the secret multiplier at which a round ends. The house edge is a
// probability mass of instant crashes at 1.00x; every other draw lands on a
// heavy-tailed curve floored to cent resolution with a 1.01x minimum.

use crate::random::RandomSource;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Crash point of an instant-crash round.
pub const INSTANT_CRASH: f64 = 1.00;

/// Smallest crash point of a round that does not crash instantly.
pub const MIN_CRASH_POINT: f64 = 1.01;

/// Largest draw accepted from a source; keeps `1 - h` strictly positive.
const MAX_DRAW: f64 = 1.0 - f64::EPSILON;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Map a uniform draw `h` in `[0, 1)` to a crash point.
///
/// `h * 100 < edge` is an instant crash. Otherwise the crash point is
/// `(99 / (100 - edge)) / (1 - h)`, floored to two decimals and raised to at
/// least [`MIN_CRASH_POINT`]. Draws outside `[0, 1)` are clamped.
pub fn crash_point_from_draw(house_edge_percent: f64, h: f64) -> f64 {
    let h = if h.is_nan() { 0.0 } else { h.clamp(0.0, MAX_DRAW) };
    if h * 100.0 < house_edge_percent {
        return INSTANT_CRASH;
    }
    let max_factor = 99.0 / (100.0 - house_edge_percent);
    let crash_point = max_factor / (1.0 - h);
    let floored = (crash_point * 100.0).floor() / 100.0;
    floored.max(MIN_CRASH_POINT)
}

/// Draw one crash point from `rand`.
pub fn generate<R: RandomSource + ?Sized>(house_edge_percent: f64, rand: &mut R) -> f64 {
    crash_point_from_draw(house_edge_percent, rand.next())
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// Exact `P(crash >= m)` for the distribution above.
///
/// Crash points are either 1.00 or at least 1.01, so every `m` in `(1, 1.01]`
/// shares the survival probability of 1.01. Above that the tail is
/// `min((100 - edge) / 100, 99 / ((100 - edge) * m))`, evaluated at `m`
/// rounded up to the next cent since crash points live on the cent grid.
pub fn survival_probability(house_edge_percent: f64, m: f64) -> f64 {
    if m <= INSTANT_CRASH {
        return 1.0;
    }
    // Tolerance keeps grid values such as 1.10 (110.00000000000001 cents) on the grid.
    let m = (m * 100.0 - 1e-9).ceil() / 100.0;
    let m = m.max(MIN_CRASH_POINT);
    let non_instant = (100.0 - house_edge_percent) / 100.0;
    let tail = 99.0 / ((100.0 - house_edge_percent) * m);
    non_instant.min(tail).clamp(0.0, 1.0)
}

/// Expected return per unit staked when always cashing out at `target`.
pub fn theoretical_rtp(house_edge_percent: f64, target: f64) -> f64 {
    target * survival_probability(house_edge_percent, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ChaChaSource, ScriptedSource};
    use proptest::prelude::*;

    #[test]
    fn test_instant_crash_on_zero_draw() {
        assert_eq!(crash_point_from_draw(1.0, 0.0), 1.00);
    }

    #[test]
    fn test_half_draw_doubles() {
        // maxFactor = 99 / 99 = 1.0, crash = 1.0 / 0.5 = 2.0
        assert_eq!(crash_point_from_draw(1.0, 0.5), 2.00);
    }

    #[test]
    fn test_just_past_edge_floors_to_minimum() {
        // 0.99 / 0.99 = 1.0 → raised to 1.01
        assert_eq!(crash_point_from_draw(1.0, 0.01), MIN_CRASH_POINT);
        // Zero edge never crashes instantly; smallest point is 1.01
        assert_eq!(crash_point_from_draw(0.0, 0.0), MIN_CRASH_POINT);
    }

    #[test]
    fn test_floors_to_cents() {
        // 1.0 / (1 - 0.7) = 3.333.. → 3.33
        assert_eq!(crash_point_from_draw(1.0, 0.7), 3.33);
    }

    #[test]
    fn test_out_of_range_draws_clamped() {
        assert_eq!(crash_point_from_draw(1.0, -0.5), 1.00);
        assert!(crash_point_from_draw(1.0, 1.0).is_finite());
        assert!(crash_point_from_draw(1.0, 7.0) > 1_000_000.0);
        assert_eq!(crash_point_from_draw(1.0, f64::NAN), 1.00);
    }

    #[test]
    fn test_generate_reads_one_draw() {
        let mut src = ScriptedSource::new([0.5, 0.0]);
        assert_eq!(generate(1.0, &mut src), 2.00);
        assert_eq!(generate(1.0, &mut src), 1.00);
    }

    #[test]
    fn test_survival_probability_matches_samples() {
        let mut src = ChaChaSource::seeded(42);
        let n = 200_000;
        let edge = 3.0;
        let points: Vec<f64> = (0..n).map(|_| generate(edge, &mut src)).collect();
        for &m in &[1.01, 1.5, 2.0, 5.0, 10.0] {
            let hits = points.iter().filter(|&&p| p >= m).count();
            let empirical = hits as f64 / n as f64;
            let expected = survival_probability(edge, m);
            assert!(
                (empirical - expected).abs() < 0.005,
                "P(crash >= {}) empirical {:.4} vs expected {:.4}",
                m, empirical, expected
            );
        }
    }

    #[test]
    fn test_instant_crash_rate_matches_edge() {
        let mut src = ChaChaSource::seeded(9);
        let n = 100_000;
        let instant = (0..n).filter(|_| generate(5.0, &mut src) == INSTANT_CRASH).count();
        let rate = instant as f64 / n as f64;
        assert!((rate - 0.05).abs() < 0.005, "instant crash rate {:.4}", rate);
    }

    #[test]
    fn test_theoretical_rtp() {
        assert_eq!(survival_probability(1.0, 1.0), 1.0);
        assert!((theoretical_rtp(1.0, 2.0) - 1.0).abs() < 1e-12);
        assert!((survival_probability(1.0, 1.005) - 0.99).abs() < 1e-12);
        // 1.10 is on the grid even though 1.1 * 100 is not exactly 110
        assert!((survival_probability(1.0, 1.1) - 1.0 / 1.1).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_never_between_instant_and_minimum(edge in 0.0f64..100.0, h in 0.0f64..1.0) {
            let p = crash_point_from_draw(edge, h);
            prop_assert!(p == INSTANT_CRASH || p >= MIN_CRASH_POINT, "edge {} h {} gave {}", edge, h, p);
        }

        #[test]
        fn prop_crash_point_monotone_in_draw(edge in 0.0f64..100.0, a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(crash_point_from_draw(edge, lo) <= crash_point_from_draw(edge, hi));
        }
    }
}
