//! The pump-count planner (§4.5).
//!
//! Chooses how many pumps to command open so the predicted mid-range
//! level lands as close as possible to the target `T`, then turns
//! that count into a concrete per-pump open/close decision that
//! respects locked-on and locked-off pumps and only reaches for a
//! known-reduced pump as a last resort.

use super::expectation::{predict, Expectation};
use super::fault::FaultRegistry;
use boiler_api::Config;
use std::collections::HashSet;

pub struct Plan {
    /// `commands[i]` is the commanded state for pump `i` this tick.
    pub commands: Vec<bool>,
    pub expectation: Expectation,
}

/// The reduced-capacity probe's commanding rule (§4.5): open exactly
/// `candidate`, close every other pump, and predict the window as if
/// `candidate` were at full capacity. The next tick's measured level
/// falling below `expectation.lo` is what confirms the pump really is
/// running reduced.
pub fn plan_probe(
    cfg: &Config,
    base: f64,
    steam: f64,
    valve_draining: bool,
    candidate: usize,
) -> Plan {
    let mut commands = vec![false; cfg.pumps];
    commands[candidate] = true;

    Plan {
        commands,
        expectation: predict(cfg, base, 1, steam, valve_draining),
    }
}

/// `base` is the current level reading in NORMAL/DEGRADED, or the
/// midpoint of the previous expectation window in RESCUE.
pub fn plan(
    cfg: &Config,
    base: f64,
    steam: f64,
    valve_draining: bool,
    faults: &FaultRegistry,
) -> Plan {
    let locked_on = faults.locked_on_pumps();
    let locked_off: HashSet<usize> =
        faults.locked_off_pumps().into_iter().collect();
    let locked_on_set: HashSet<usize> = locked_on.iter().copied().collect();
    let n_locked_on = locked_on.len();

    let mut best_k = n_locked_on;
    let mut best_exp = predict(cfg, base, best_k, steam, valve_draining);
    let mut best_diff = (best_exp.mid() - cfg.target()).abs();

    for k in n_locked_on..=cfg.pumps {
        let exp = predict(cfg, base, k, steam, valve_draining);
        let diff = (exp.mid() - cfg.target()).abs();

        if diff < best_diff {
            best_diff = diff;
            best_k = k;
            best_exp = exp;
        }
    }

    let mut commands = vec![false; cfg.pumps];
    for &i in &locked_on {
        commands[i] = true;
    }

    let mut remaining = best_k.saturating_sub(n_locked_on);
    let mut expectation = best_exp;

    let healthy: Vec<usize> = faults
        .healthy_pumps(cfg.pumps)
        .into_iter()
        .filter(|i| !locked_on_set.contains(i) && !locked_off.contains(i))
        .collect();

    for &i in &healthy {
        if remaining == 0 {
            break;
        }
        commands[i] = true;
        remaining -= 1;
    }

    if remaining > 0 {
        let reduced: Vec<usize> = faults
            .reduced_pumps()
            .into_iter()
            .filter(|i| !locked_on_set.contains(i) && !locked_off.contains(i))
            .collect();

        for &i in &reduced {
            if remaining == 0 {
                break;
            }
            commands[i] = true;
            expectation = expectation.widen_lo(cfg.pump_capacity);
            remaining -= 1;
        }
    }

    Plan {
        commands,
        expectation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fault::{FaultKind, Peripheral};

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
    fn healthy_plant_targets_midband() {
        let faults = FaultRegistry::new(4);
        let plan = plan(&cfg(), 500.0, 0.0, false, &faults);

        assert!((plan.expectation.mid() - cfg().target()).abs() < 5.0);
    }

    #[test]
    fn locked_on_pump_is_always_commanded() {
        let mut faults = FaultRegistry::new(4);
        faults.set(Peripheral::Pump(2), FaultKind::StuckOn);

        let plan = plan(&cfg(), 500.0, 0.0, false, &faults);
        assert!(plan.commands[2]);
    }

    #[test]
    fn locked_off_pump_is_never_commanded() {
        let mut faults = FaultRegistry::new(4);
        faults.set(Peripheral::Pump(1), FaultKind::StuckOff);

        let plan = plan(&cfg(), 200.0, 0.0, false, &faults);
        assert!(!plan.commands[1]);
    }

    #[test]
    fn falls_back_to_reduced_pump_when_no_healthy_left() {
        let mut faults = FaultRegistry::new(2);
        faults.set(Peripheral::Pump(0), FaultKind::Reduced);
        faults.set(Peripheral::Pump(1), FaultKind::StuckOff);

        // Only pump 0 (reduced) can possibly be opened.
        let plan = plan(&cfg(), 200.0, 0.0, false, &faults);
        assert!(plan.commands[0] || !plan.commands.iter().any(|&c| c));
    }
}
