//! The expectation window: the controller's prediction of next
//! tick's water level, derived from the current level (or, in
//! RESCUE, the last prediction), the steam reading, the commanded
//! pump count, and whether the valve is broken open or closed.

use boiler_api::Config;

/// Absorbs floating-point slack when comparing a measured level to a
/// predicted window.
pub const EPSILON: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expectation {
    pub lo: f64,
    pub hi: f64,
}

impl Expectation {
    pub fn contains(&self, level: f64) -> bool {
        level >= self.lo && level <= self.hi
    }

    pub fn mid(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    /// Widens the lower bound by `amount`. Used when the planner has
    /// to fall back to a pump of known-reduced capacity (§4.5).
    pub fn widen_lo(&self, amount: f64) -> Expectation {
        Expectation {
            lo: self.lo - amount,
            hi: self.hi,
        }
    }
}

/// Predicts the level window one tick ahead, given `base` (this
/// tick's level, or the previous prediction in RESCUE), `k` pumps
/// commanded open, the `steam` reading, and whether the valve is
/// open and broken (in which case it drains an extra `evac_rate`
/// regardless of command).
pub fn predict(
    cfg: &Config,
    base: f64,
    k: usize,
    steam: f64,
    valve_draining: bool,
) -> Expectation {
    let inflow = 5.0 * cfg.pump_capacity * k as f64;
    let mut max = base + inflow - 5.0 * steam;
    let mut min = base + inflow - 5.0 * cfg.max_steam;

    if valve_draining {
        max -= 5.0 * cfg.evac_rate;
        min -= 5.0 * cfg.evac_rate;
    }

    Expectation {
        lo: min - EPSILON,
        hi: max + EPSILON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config {
            capacity: 1000.0,
            normal_lo: 400.0,
            normal_hi: 600.0,
            safety_lo: 100.0,
            safety_hi: 900.0,
            pumps: 4,
            pump_capacity: 5.0,
            max_steam: 10.0,
            evac_rate: 10.0,
        }
    }

    #[test]
    fn predict_widens_with_steam_uncertainty() {
        let e = predict(&cfg(), 500.0, 2, 4.0, false);
        // inflow = 5*5*2 = 50; max = 500+50-20=530; min=500+50-50=500
        assert!((e.hi - (530.0 + EPSILON)).abs() < 1e-9);
        assert!((e.lo - (500.0 - EPSILON)).abs() < 1e-9);
        assert!(e.contains(515.0));
    }

    #[test]
    fn valve_draining_shifts_window_down() {
        let with = predict(&cfg(), 500.0, 2, 4.0, true);
        let without = predict(&cfg(), 500.0, 2, 4.0, false);

        assert!(with.hi < without.hi);
        assert!(with.lo < without.lo);
    }

    #[test]
    fn widen_lo_only_moves_lower_bound() {
        let e = Expectation { lo: 10.0, hi: 20.0 };
        let w = e.widen_lo(5.0);

        assert_eq!(w.lo, 5.0);
        assert_eq!(w.hi, 20.0);
    }
}
