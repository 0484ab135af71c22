//! The failure detector (§4.6): turns commanded/reported/measured
//! tick data into fault verdicts.
//!
//! This module is deliberately built out of small, separately-tested
//! primitives -- the per-pump truth table, the steam sanity check,
//! the level-sensor classifier, and the valve-return calculation --
//! rather than one monolithic function. The orchestrator in
//! `core::mod` sequences these per §4.1/§4.6 and folds the results
//! into the [`super::fault::FaultRegistry`].

use boiler_api::Config;

/// A diagnosis the detector couldn't settle this tick and is
/// carrying forward, per §4.6's deferred-resolution rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingDiagnosis {
    /// Case 5 fired for `pump`: commanded and reported-controller
    /// state disagree, the pump agrees with the commanded state, and
    /// the level still looked normal. The at-most-one-fault
    /// assumption means next tick's drift direction decides whether
    /// the pump or its controller is actually at fault.
    AmbiguousPump { pump: usize },
    /// RESCUE was just entered; next tick's valve-return check
    /// decides valve-stuck vs pump-at-half vs a genuine level-sensor
    /// fault.
    RescueEntry,
}

/// The truth-table verdict for a single pump, before the caller picks
/// a concrete [`super::fault::FaultKind`] and peripheral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpCase {
    /// No disagreement: the pump is behaving as commanded.
    Consistent,
    /// Controller report matches command, pump disagrees, level
    /// still normal: the pump's own transmission is wrong (case 1).
    TxWrong,
    /// Controller report matches command, pump disagrees, level
    /// abnormal: the pump itself failed (case 2). Direction comes
    /// from the sign of `level - target`.
    DirectionalFailure,
    /// Controller disagrees with command, pump agrees with the
    /// controller's report, level normal: the pump is stuck in the
    /// reported state (case 3).
    StuckInReportedState,
    /// Controller disagrees with command, pump still matches the
    /// command, level abnormal: stuck, direction from level vs
    /// `exp_hi` (case 4).
    StuckByLevel,
    /// Controller disagrees with command, pump still matches the
    /// command, level normal: ambiguous, deferred to next tick
    /// (case 5).
    Deferred,
    /// Controller disagrees with command, pump matches neither,
    /// level abnormal: outright pump failure (case 6).
    Failure,
}

/// Applies the §4.6 truth table to one pump's tick data.
///
/// `commanded` is `c`, `reported_pump` is `p`, `reported_controller`
/// is `s`, `level_normal` is whether the measured level fell inside
/// `[exp_lo, exp_hi]`.
pub fn evaluate_pump(
    commanded: bool,
    reported_pump: bool,
    reported_controller: bool,
    level_normal: bool,
) -> PumpCase {
    let c = commanded;
    let p = reported_pump;
    let s = reported_controller;

    if s == c {
        if p == c {
            return PumpCase::Consistent;
        }
        return if level_normal {
            PumpCase::TxWrong
        } else {
            PumpCase::DirectionalFailure
        };
    }

    if p == c {
        return if level_normal {
            PumpCase::Deferred
        } else {
            PumpCase::StuckByLevel
        };
    }

    if level_normal {
        PumpCase::StuckInReportedState
    } else {
        PumpCase::Failure
    }
}

/// `true` if the level sits above target -- used to pick STUCK_ON vs
/// STUCK_OFF, or the direction of a directional pump failure.
pub fn level_above_target(level: f64, reference: f64) -> bool {
    level > reference
}

/// Steam sanity check (§4.6): negative, above the physical max, or
/// dropping tick-over-tick are all nonsensical for this plant's
/// steam production and flag the sensor as stuck.
pub fn steam_is_faulty(cfg: &Config, steam: f64, last_steam: f64) -> bool {
    steam < 0.0 || steam > cfg.max_steam || steam < last_steam
}

/// Classifies a level-sensor fault once no pump/controller case
/// explains an abnormal level: a clear break sits outside the
/// physical safety envelope, a subtle one stays inside it but still
/// misses the predicted window.
pub fn level_break_is_clear(cfg: &Config, level: f64) -> bool {
    level < cfg.safety_lo || level > cfg.safety_hi
}

/// The valve-return calculation from §4.6: if the valve were stuck
/// open and draining, this tick's level should sit close to
/// `last_level + 5*evac_rate - 5*avg(last_steam, steam)`. Used after
/// a RESCUE entry to tell a valve fault apart from a level-sensor
/// fault or a half-capacity pump.
pub fn valve_return_matches(
    cfg: &Config,
    last_level: f64,
    last_steam: f64,
    steam: f64,
    measured_level: f64,
    epsilon: f64,
) -> bool {
    let predicted =
        last_level + 5.0 * cfg.evac_rate - 5.0 * ((last_steam + steam) / 2.0);

    (measured_level - predicted).abs() <= epsilon
}

/// The pump-at-half hypothesis: if a single pump were running at
/// half its nominal capacity instead of full, the level would fall
/// short of the all-healthy prediction by roughly half that pump's
/// per-tick contribution.
pub fn pump_half_deficit_matches(
    cfg: &Config,
    predicted_full: f64,
    measured_level: f64,
    epsilon: f64,
) -> bool {
    let half_pump_contribution = 5.0 * cfg.pump_capacity / 2.0;

    (predicted_full - measured_level - half_pump_contribution).abs() <= epsilon
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
    fn consistent_pump_is_case_none() {
        assert_eq!(
            evaluate_pump(true, true, true, true),
            PumpCase::Consistent
        );
    }

    #[test]
    fn case_one_tx_wrong() {
        assert_eq!(
            evaluate_pump(true, false, true, true),
            PumpCase::TxWrong
        );
    }

    #[test]
    fn case_two_directional_failure() {
        assert_eq!(
            evaluate_pump(true, false, true, false),
            PumpCase::DirectionalFailure
        );
    }

    #[test]
    fn case_three_stuck_in_reported_state() {
        assert_eq!(
            evaluate_pump(true, false, false, true),
            PumpCase::StuckInReportedState
        );
    }

    #[test]
    fn case_four_stuck_by_level() {
        assert_eq!(
            evaluate_pump(true, true, false, false),
            PumpCase::StuckByLevel
        );
    }

    #[test]
    fn case_five_is_deferred() {
        assert_eq!(evaluate_pump(true, true, false, true), PumpCase::Deferred);
    }

    #[test]
    fn case_six_is_failure() {
        assert_eq!(
            evaluate_pump(true, false, false, false),
            PumpCase::Failure
        );
    }

    #[test]
    fn steam_below_zero_is_faulty() {
        assert!(steam_is_faulty(&cfg(), -1.0, 4.0));
    }

    #[test]
    fn steam_above_max_is_faulty() {
        assert!(steam_is_faulty(&cfg(), 11.0, 4.0));
    }

    #[test]
    fn steam_dropping_is_faulty() {
        assert!(steam_is_faulty(&cfg(), 3.0, 4.0));
    }

    #[test]
    fn steam_rising_within_range_is_fine() {
        assert!(!steam_is_faulty(&cfg(), 6.0, 4.0));
    }

    #[test]
    fn level_outside_envelope_is_clear_break() {
        assert!(level_break_is_clear(&cfg(), 950.0));
        assert!(level_break_is_clear(&cfg(), 50.0));
    }

    #[test]
    fn level_inside_envelope_is_subtle() {
        assert!(!level_break_is_clear(&cfg(), 650.0));
    }

    #[test]
    fn valve_return_matches_expected_drain() {
        // last_level=500, evac=10, avg steam=4 -> predicted = 500+50-20=530
        assert!(valve_return_matches(&cfg(), 500.0, 4.0, 4.0, 530.0, 0.5));
        assert!(!valve_return_matches(&cfg(), 500.0, 4.0, 4.0, 400.0, 0.5));
    }

    #[test]
    fn pump_half_deficit_detects_half_capacity_shortfall() {
        let predicted_full = 550.0;
        let half_short = predicted_full - 5.0 * cfg().pump_capacity / 2.0;

        assert!(pump_half_deficit_matches(
            &cfg(),
            predicted_full,
            half_short,
            0.5
        ));
    }
}
