//! The tick orchestrator and the six-state operating-mode machine.
//!
//! `Controller` owns every piece of per-process state named in the
//! data model: the mode, the last commands sent to each pump, the
//! valve bit, the expectation window, the fault registry, and the one
//! pending cross-tick diagnosis. `Controller::tick` is the only
//! entry point: it is a pure function of `&mut self` and an inbound
//! [`Mailbox`], with no I/O of its own.

pub mod detector;
pub mod expectation;
pub mod fault;
pub mod planner;

use boiler_api::{Config, Error, Mailbox, Message, Mode, Result};
use expectation::Expectation;
use fault::{FaultKind, FaultRegistry, Peripheral};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
enum AckKind {
    Level,
    Steam,
    Pump(usize),
    PumpControl(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RepairedKind {
    Level,
    Steam,
    Pump(usize),
    PumpControl(usize),
}

/// Everything extracted from one tick's inbound mailbox.
struct Intake {
    level: f64,
    steam: f64,
    waiting_signal: bool,
    units_ready: bool,
    pump_state: Vec<Option<bool>>,
    pump_control_state: Vec<Option<bool>>,
    acks: Vec<AckKind>,
    repaired: Vec<RepairedKind>,
}

pub struct Controller {
    cfg: Config,
    mode: Mode,
    pump_cmd: Vec<bool>,
    valve_open: bool,
    expectation: Expectation,
    last_steam: f64,
    last_level: f64,
    faults: FaultRegistry,
    pending: Option<detector::PendingDiagnosis>,
    /// Remaining untried candidates for the reduced-capacity probe
    /// (§4.5); `None` when no probe is in progress.
    probe: Option<Vec<usize>>,
}

impl Controller {
    pub fn new(cfg: Config) -> Self {
        let pumps = cfg.pumps;
        let expectation = Expectation {
            lo: cfg.normal_lo,
            hi: cfg.normal_hi,
        };
        let last_level = cfg.target();

        Controller {
            pump_cmd: vec![false; pumps],
            valve_open: false,
            expectation,
            last_steam: 0.0,
            last_level,
            faults: FaultRegistry::new(pumps),
            pending: None,
            probe: None,
            mode: Mode::Waiting,
            cfg,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Runs one five-second tick: consumes `inbox`, updates all
    /// internal state exactly once, and returns the outbound
    /// mailbox. See §4.1 for the ordered steps this follows.
    #[tracing::instrument(skip(self, inbox), fields(mode = %self.mode))]
    pub fn tick(&mut self, inbox: &Mailbox) -> Mailbox {
        let mut out = Mailbox::new();

        if self.mode.is_terminal() {
            return self.emergency_stop(out);
        }

        let intake = match self.intake(inbox) {
            Ok(intake) => intake,
            Err(e) => {
                warn!(error = %e, "malformed tick, emergency stop");
                return self.emergency_stop(out);
            }
        };

        if self.mode == Mode::Waiting && self.waiting_level_not_responding(&intake) {
            warn!("level not responding to open valve while waiting, emergency stop");
            return self.emergency_stop(out);
        }

        if self.probe.is_some() {
            self.resolve_probe(&intake, &mut out);
        }

        if self.faults.valve_faulted() {
            self.check_valve_return(&intake);
        }

        if !matches!(self.mode, Mode::Waiting | Mode::Ready) {
            self.run_detector(&intake, &mut out);

            if matches!(self.mode, Mode::Degraded | Mode::Rescue) {
                self.run_repair_handshake(&intake, &mut out);
            }
        }

        if self.mode.is_terminal() {
            return self.emergency_stop(out);
        }

        self.dispatch(&intake, &mut out);

        if !matches!(self.mode, Mode::Waiting | Mode::Ready)
            && self.safety_violated(&intake)
        {
            return self.emergency_stop(out);
        }

        out.send(Message::ModeChanged(self.mode));

        self.last_steam = intake.steam;
        self.last_level = intake.level;

        out
    }

    fn intake(&self, inbox: &Mailbox) -> Result<Intake> {
        let level = inbox
            .extract_unique(|m| match m {
                Message::Level(v) => Some(*v),
                _ => None,
            })?
            .ok_or_else(|| Error::ProtocolError("missing LEVEL reading".into()))?;

        let steam = inbox
            .extract_unique(|m| match m {
                Message::Steam(v) => Some(*v),
                _ => None,
            })?
            .ok_or_else(|| Error::ProtocolError("missing STEAM reading".into()))?;

        let waiting_signal = inbox
            .iter()
            .any(|m| matches!(m, Message::SteamBoilerWaiting));
        let units_ready = inbox
            .iter()
            .any(|m| matches!(m, Message::PhysicalUnitsReady));

        let pump_state = inbox.extract_indexed(self.cfg.pumps, |m| match m {
            Message::PumpState(i, b) => Some((*i, *b)),
            _ => None,
        })?;
        let pump_control_state =
            inbox.extract_indexed(self.cfg.pumps, |m| match m {
                Message::PumpControlState(i, b) => Some((*i, *b)),
                _ => None,
            })?;

        let acks = inbox.extract_all(|m| match m {
            Message::LevelFailureAcknowledgement => Some(AckKind::Level),
            Message::SteamOutcomeFailureAcknowledgement => {
                Some(AckKind::Steam)
            }
            Message::PumpFailureAcknowledgement(i) => {
                Some(AckKind::Pump(*i))
            }
            Message::PumpControlFailureAcknowledgement(i) => {
                Some(AckKind::PumpControl(*i))
            }
            _ => None,
        });

        let repaired = inbox.extract_all(|m| match m {
            Message::LevelRepaired => Some(RepairedKind::Level),
            Message::SteamRepaired => Some(RepairedKind::Steam),
            Message::PumpRepaired(i) => Some(RepairedKind::Pump(*i)),
            Message::PumpControlRepaired(i) => {
                Some(RepairedKind::PumpControl(*i))
            }
            _ => None,
        });

        Ok(Intake {
            level,
            steam,
            waiting_signal,
            units_ready,
            pump_state,
            pump_control_state,
            acks,
            repaired,
        })
    }

    fn dispatch(&mut self, intake: &Intake, out: &mut Mailbox) {
        match self.mode {
            Mode::Waiting => self.tick_waiting(intake, out),
            Mode::Ready => self.tick_ready(intake),
            Mode::Normal => self.tick_normal(intake, out),
            Mode::Degraded => self.tick_degraded(intake, out),
            Mode::Rescue => self.tick_rescue(intake, out),
            Mode::EmergencyStop => {}
        }
    }

    /// §4.1 step 2: while WAITING with the valve already open and
    /// draining, the level should be falling. If it sits flat or
    /// rises anyway, the level sensor (or the valve itself) is
    /// nonsensical and WAITING can never resolve on its own.
    fn waiting_level_not_responding(&self, intake: &Intake) -> bool {
        self.valve_open && intake.level >= self.last_level - expectation::EPSILON
    }

    /// §4.3: drive the level into the normal band before handing
    /// control to the plant.
    fn tick_waiting(&mut self, intake: &Intake, out: &mut Mailbox) {
        if !intake.waiting_signal {
            return;
        }

        if intake.level > self.cfg.normal_hi {
            if !self.valve_open {
                self.toggle_valve(out);
            }
            return;
        }

        if self.valve_open {
            self.toggle_valve(out);
        }

        if intake.level < self.cfg.normal_lo {
            let target = self.cfg.target();
            let mut best_k = 1;
            let mut best_diff = f64::INFINITY;

            for k in 1..=self.cfg.pumps {
                let predicted =
                    intake.level + 5.0 * self.cfg.pump_capacity * k as f64;
                let diff = (predicted - target).abs();

                if diff < best_diff {
                    best_diff = diff;
                    best_k = k;
                }
            }

            self.command_count(best_k, out);
            return;
        }

        self.command_count(0, out);
        info!("level in band, program ready");
        out.send(Message::ProgramReady);
        self.mode = Mode::Ready;
    }

    fn tick_ready(&mut self, intake: &Intake) {
        if intake.units_ready {
            info!("physical units ready, entering normal operation");
            self.mode = Mode::Normal;
        }
    }

    fn tick_normal(&mut self, intake: &Intake, out: &mut Mailbox) {
        let plan = planner::plan(
            &self.cfg,
            intake.level,
            intake.steam,
            self.valve_open && self.faults.valve_faulted(),
            &self.faults,
        );

        self.apply_plan(&plan.commands, out);
        self.expectation = plan.expectation;
    }

    fn tick_degraded(&mut self, intake: &Intake, out: &mut Mailbox) {
        if let Some(candidates) = &self.probe {
            let candidate = *candidates
                .first()
                .expect("resolve_probe clears an exhausted candidate list");
            let plan = planner::plan_probe(
                &self.cfg,
                intake.level,
                intake.steam,
                self.valve_open && self.faults.valve_faulted(),
                candidate,
            );
            self.apply_plan(&plan.commands, out);
            self.expectation = plan.expectation;
            return;
        }

        let plan = planner::plan(
            &self.cfg,
            intake.level,
            intake.steam,
            self.valve_open && self.faults.valve_faulted(),
            &self.faults,
        );

        self.apply_plan(&plan.commands, out);
        self.expectation = plan.expectation;
    }

    /// §4.2 RESCUE: drive off the predicted window, never the
    /// (untrusted) level reading.
    fn tick_rescue(&mut self, intake: &Intake, out: &mut Mailbox) {
        let base = self.expectation.mid();
        let plan = planner::plan(
            &self.cfg,
            base,
            intake.steam,
            self.faults.valve_faulted(),
            &self.faults,
        );

        self.apply_plan(&plan.commands, out);
        self.expectation = plan.expectation;
    }

    fn toggle_valve(&mut self, out: &mut Mailbox) {
        out.send(Message::Valve);
        self.valve_open = !self.valve_open;
    }

    fn command_count(&mut self, k: usize, out: &mut Mailbox) {
        let commands: Vec<bool> =
            (0..self.cfg.pumps).map(|i| i < k).collect();
        self.apply_plan(&commands, out);
    }

    fn apply_plan(&mut self, commands: &[bool], out: &mut Mailbox) {
        for (i, &want) in commands.iter().enumerate() {
            if want != self.pump_cmd[i] {
                self.pump_cmd[i] = want;
                out.send(if want {
                    Message::OpenPump(i)
                } else {
                    Message::ClosePump(i)
                });
            }
        }
    }

    /// §4.6: resolves a deferred case-5 diagnosis or a RESCUE entry
    /// left pending from last tick, then runs the steam check and the
    /// per-pump truth table.
    fn run_detector(&mut self, intake: &Intake, out: &mut Mailbox) {
        self.resolve_pending(intake, out);

        if self.mode.is_terminal() {
            return;
        }

        if !self.faults.steam_faulted()
            && detector::steam_is_faulty(&self.cfg, intake.steam, self.last_steam)
        {
            self.faults.set(Peripheral::Steam, FaultKind::Stuck);
            warn!("steam sensor fault detected");
            out.send(Message::SteamFailureDetection);

            if self.mode == Mode::Rescue {
                self.mode = Mode::EmergencyStop;
            } else {
                self.mode = Mode::Degraded;
            }
            return;
        }

        let level_normal = self.expectation.contains(intake.level);
        let mut any_pump_case = false;

        for i in 0..self.cfg.pumps {
            if self.faults.is_faulted(Peripheral::Pump(i))
                || self.faults.is_faulted(Peripheral::Controller(i))
            {
                continue;
            }

            let (Some(p), Some(s)) =
                (intake.pump_state[i], intake.pump_control_state[i])
            else {
                continue;
            };
            let c = self.pump_cmd[i];

            match detector::evaluate_pump(c, p, s, level_normal) {
                detector::PumpCase::Consistent => {}

                detector::PumpCase::TxWrong => {
                    any_pump_case = true;
                    self.faults.set(Peripheral::Pump(i), FaultKind::TxWrong);
                    warn!(pump = i, "pump transmission fault detected");
                    out.send(Message::PumpFailureDetection(i));
                    self.demote_non_rescue();
                }

                detector::PumpCase::DirectionalFailure
                | detector::PumpCase::Failure => {
                    any_pump_case = true;
                    let kind = if detector::level_above_target(
                        intake.level,
                        self.cfg.target(),
                    ) {
                        FaultKind::StuckOn
                    } else {
                        FaultKind::StuckOff
                    };
                    self.faults.set(Peripheral::Pump(i), kind);
                    warn!(pump = i, "pump failure detected");
                    out.send(Message::PumpFailureDetection(i));
                    self.demote_non_rescue();
                }

                detector::PumpCase::StuckInReportedState => {
                    any_pump_case = true;
                    let kind = if s { FaultKind::StuckOn } else { FaultKind::StuckOff };
                    self.faults.set(Peripheral::Pump(i), kind);
                    self.pump_cmd[i] = s;
                    warn!(pump = i, "pump stuck in reported state");
                    out.send(Message::PumpFailureDetection(i));
                    self.demote_non_rescue();
                }

                detector::PumpCase::StuckByLevel => {
                    any_pump_case = true;
                    let kind = if intake.level > self.expectation.hi {
                        FaultKind::StuckOn
                    } else {
                        FaultKind::StuckOff
                    };
                    self.faults.set(Peripheral::Pump(i), kind);
                    warn!(pump = i, "pump stuck, inferred from level");
                    out.send(Message::PumpFailureDetection(i));
                    self.demote_non_rescue();
                }

                detector::PumpCase::Deferred => {
                    any_pump_case = true;
                    debug!(pump = i, "deferring ambiguous pump/controller diagnosis");
                    self.pending =
                        Some(detector::PendingDiagnosis::AmbiguousPump { pump: i });
                }
            }
        }

        if !any_pump_case && !level_normal && !self.faults.level_faulted() {
            let clear_break = detector::level_break_is_clear(&self.cfg, intake.level);
            self.faults.set(
                Peripheral::Level,
                if clear_break { FaultKind::Stuck } else { FaultKind::Offset },
            );
            warn!(clear_break, "level sensor fault detected");
            out.send(Message::LevelFailureDetection);
            self.pending = Some(detector::PendingDiagnosis::RescueEntry);
            self.mode = Mode::Rescue;
        }
    }

    fn demote_non_rescue(&mut self) {
        if self.mode == Mode::Normal {
            self.mode = Mode::Degraded;
        }
    }

    /// §4.6 deferred-resolution rules, run before this tick's own
    /// detector pass.
    fn resolve_pending(&mut self, intake: &Intake, out: &mut Mailbox) {
        match self.pending.take() {
            Some(detector::PendingDiagnosis::AmbiguousPump { pump }) => {
                if intake.level < self.expectation.lo {
                    self.faults.set(Peripheral::Pump(pump), FaultKind::StuckOff);
                    warn!(pump, "deferred diagnosis resolved: pump at fault");
                    out.send(Message::PumpFailureDetection(pump));
                    self.demote_non_rescue();
                } else if intake.level > self.expectation.hi {
                    self.faults
                        .set(Peripheral::Controller(pump), FaultKind::StuckOn);
                    warn!(pump, "deferred diagnosis resolved: controller at fault");
                    out.send(Message::PumpControlFailureDetection(pump));
                    self.demote_non_rescue();
                } else {
                    self.pending =
                        Some(detector::PendingDiagnosis::AmbiguousPump { pump });
                }
            }

            Some(detector::PendingDiagnosis::RescueEntry) => {
                if detector::valve_return_matches(
                    &self.cfg,
                    self.last_level,
                    self.last_steam,
                    intake.steam,
                    intake.level,
                    expectation::EPSILON,
                ) {
                    info!("rescue entry reclassified as a valve fault");
                    self.faults.clear(Peripheral::Level);
                    self.faults.set(Peripheral::Valve, FaultKind::Stuck);
                    self.mode = Mode::Degraded;
                } else if detector::pump_half_deficit_matches(
                    &self.cfg,
                    self.expectation.mid(),
                    intake.level,
                    expectation::EPSILON,
                ) {
                    debug!("rescue entry looks like a half-capacity pump, starting probe");
                    self.faults.clear(Peripheral::Level);
                    self.probe = Some((0..self.cfg.pumps).collect());
                    self.mode = Mode::Degraded;
                }
                // Otherwise this was a genuine level-sensor fault;
                // stay in RESCUE and say nothing further.
            }

            None => {}
        }
    }

    /// §4.5's reduced-capacity probe: try one candidate pump alone
    /// per tick until the level confirms it, or every candidate is
    /// exhausted.
    fn resolve_probe(&mut self, intake: &Intake, out: &mut Mailbox) {
        let Some(candidates) = &mut self.probe else {
            return;
        };
        let Some(&candidate) = candidates.first() else {
            self.probe = None;
            return;
        };

        if intake.level < self.expectation.lo {
            warn!(pump = candidate, "reduced-capacity pump confirmed");
            self.faults.set(Peripheral::Pump(candidate), FaultKind::Reduced);
            out.send(Message::PumpFailureDetection(candidate));
            self.probe = None;
        } else {
            candidates.remove(0);
            if candidates.is_empty() {
                debug!("reduced-capacity probe exhausted, reverting to rescue");
                self.probe = None;
                self.mode = Mode::Rescue;
            }
        }
    }

    /// §4.5's ongoing valve-return check, run every tick while the
    /// valve fault is still open.
    fn check_valve_return(&mut self, intake: &Intake) {
        let predicted = self.expectation.hi + 5.0 * self.cfg.evac_rate;

        if (intake.level - predicted).abs() <= expectation::EPSILON {
            info!("valve fault cleared");
            self.faults.clear(Peripheral::Valve);
            self.mode = self.mode_after_clear();
        }
    }

    /// §4.7: runs ACK processing then REPAIRED processing, moving
    /// mode according to what's still faulted afterward.
    fn run_repair_handshake(&mut self, intake: &Intake, out: &mut Mailbox) {
        for ack in &intake.acks {
            let p = match *ack {
                AckKind::Level => Peripheral::Level,
                AckKind::Steam => Peripheral::Steam,
                AckKind::Pump(i) => Peripheral::Pump(i),
                AckKind::PumpControl(i) => Peripheral::Controller(i),
            };

            if self.faults.is_faulted(p) {
                self.faults.acknowledge(p);
            }
            // A rogue ACK with no matching fault is a no-op.
        }

        for repaired in &intake.repaired {
            let (p, ack_msg) = match *repaired {
                RepairedKind::Level => {
                    (Peripheral::Level, Message::LevelRepairedAcknowledgement)
                }
                RepairedKind::Steam => {
                    (Peripheral::Steam, Message::SteamRepairedAcknowledgement)
                }
                RepairedKind::Pump(i) => (
                    Peripheral::Pump(i),
                    Message::PumpRepairedAcknowledgement(i),
                ),
                RepairedKind::PumpControl(i) => (
                    Peripheral::Controller(i),
                    Message::PumpControlRepairedAcknowledgement(i),
                ),
            };

            let slot = self.faults.get(p);
            if !slot.kind.is_ok() && slot.acknowledged {
                info!("fault repaired");
                self.faults.clear(p);
                out.send(ack_msg);
                self.mode = self.mode_after_clear();
            }
            // REPAIRED without a prior ACK is ignored, per §4.7.
        }
    }

    /// §4.7's post-clear mode selection: RESCUE beats DEGRADED beats
    /// NORMAL.
    fn mode_after_clear(&self) -> Mode {
        if self.faults.level_faulted() {
            Mode::Rescue
        } else if self.faults.any_non_level_faulted() {
            Mode::Degraded
        } else {
            Mode::Normal
        }
    }

    /// §4.4: emergency-stop if the predicted or actual level can no
    /// longer be kept inside the safety band.
    fn safety_violated(&self, intake: &Intake) -> bool {
        let exp = &self.expectation;

        if exp.hi > self.cfg.safety_hi || exp.lo < self.cfg.safety_lo {
            return true;
        }

        let q = self.cfg.pump_capacity;
        if intake.level - q <= self.cfg.safety_lo
            || intake.level + q >= self.cfg.safety_hi
        {
            return true;
        }

        if self.mode == Mode::Rescue {
            let locked_off = self.faults.locked_off_pumps().len();
            let locked_on = self.faults.locked_on_pumps().len();
            let available = self.cfg.pumps.saturating_sub(locked_off) as f64;

            if available * q < intake.steam {
                return true;
            }
            if locked_on as f64 * q > intake.steam {
                return true;
            }
        }

        false
    }

    fn emergency_stop(&mut self, mut out: Mailbox) -> Mailbox {
        if self.mode != Mode::EmergencyStop {
            warn!("emergency stop");
        }
        self.mode = Mode::EmergencyStop;
        out.send(Message::ModeChanged(self.mode));
        out
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

    fn pump_readings(states: &[bool]) -> Vec<Message> {
        let mut msgs = Vec::new();
        for (i, &s) in states.iter().enumerate() {
            msgs.push(Message::PumpState(i, s));
            msgs.push(Message::PumpControlState(i, s));
        }
        msgs
    }

    #[test]
    fn waiting_to_ready_when_level_in_band() {
        let mut ctl = Controller::new(cfg());
        let mut inbox = Mailbox::new();
        inbox.send(Message::SteamBoilerWaiting);
        inbox.send(Message::Level(500.0));
        inbox.send(Message::Steam(0.0));

        let out = ctl.tick(&inbox);

        assert_eq!(ctl.mode(), Mode::Ready);
        assert!(out.iter().any(|m| matches!(m, Message::ProgramReady)));
    }

    #[test]
    fn waiting_opens_valve_when_overfilled() {
        let mut ctl = Controller::new(cfg());
        let mut inbox = Mailbox::new();
        inbox.send(Message::SteamBoilerWaiting);
        inbox.send(Message::Level(700.0));
        inbox.send(Message::Steam(0.0));

        let out = ctl.tick(&inbox);

        assert_eq!(ctl.mode(), Mode::Waiting);
        assert!(out.iter().any(|m| matches!(m, Message::Valve)));
    }

    #[test]
    fn ready_to_normal_on_physical_units_ready() {
        let mut ctl = Controller::new(cfg());
        let mut inbox = Mailbox::new();
        inbox.send(Message::SteamBoilerWaiting);
        inbox.send(Message::Level(500.0));
        inbox.send(Message::Steam(0.0));
        ctl.tick(&inbox);

        let mut inbox2 = Mailbox::new();
        inbox2.send(Message::PhysicalUnitsReady);
        inbox2.send(Message::Level(500.0));
        inbox2.send(Message::Steam(0.0));
        ctl.tick(&inbox2);

        assert_eq!(ctl.mode(), Mode::Normal);
    }

    #[test]
    fn waiting_valve_toggles_once_not_every_tick() {
        let mut ctl = Controller::new(cfg());
        let mut first = Mailbox::new();
        first.send(Message::SteamBoilerWaiting);
        first.send(Message::Level(700.0));
        first.send(Message::Steam(0.0));
        let out = ctl.tick(&first);
        assert!(out.iter().any(|m| matches!(m, Message::Valve)));

        let mut second = Mailbox::new();
        second.send(Message::SteamBoilerWaiting);
        second.send(Message::Level(660.0));
        second.send(Message::Steam(0.0));
        let out = ctl.tick(&second);

        assert!(!out.iter().any(|m| matches!(m, Message::Valve)));
        assert_eq!(ctl.mode(), Mode::Waiting);
    }

    #[test]
    fn waiting_emergency_stops_when_level_ignores_open_valve() {
        let mut ctl = Controller::new(cfg());
        let mut first = Mailbox::new();
        first.send(Message::SteamBoilerWaiting);
        first.send(Message::Level(700.0));
        first.send(Message::Steam(0.0));
        ctl.tick(&first);

        let mut second = Mailbox::new();
        second.send(Message::SteamBoilerWaiting);
        second.send(Message::Level(700.0));
        second.send(Message::Steam(0.0));
        ctl.tick(&second);

        assert_eq!(ctl.mode(), Mode::EmergencyStop);
    }

    #[test]
    fn missing_level_reading_emergency_stops() {
        let mut ctl = Controller::new(cfg());
        let mut inbox = Mailbox::new();
        inbox.send(Message::Steam(0.0));

        ctl.tick(&inbox);
        assert_eq!(ctl.mode(), Mode::EmergencyStop);
    }

    #[test]
    fn emergency_stop_is_terminal() {
        let mut ctl = Controller::new(cfg());
        let mut bad = Mailbox::new();
        bad.send(Message::Steam(0.0));
        ctl.tick(&bad);
        assert_eq!(ctl.mode(), Mode::EmergencyStop);

        let mut inbox = Mailbox::new();
        inbox.send(Message::SteamBoilerWaiting);
        inbox.send(Message::Level(500.0));
        inbox.send(Message::Steam(0.0));
        ctl.tick(&inbox);

        assert_eq!(ctl.mode(), Mode::EmergencyStop);
    }

    #[test]
    fn degraded_probe_commands_only_the_candidate_pump() {
        let mut ctl = Controller::new(cfg());
        ctl.mode = Mode::Degraded;
        ctl.probe = Some(vec![2, 0, 1, 3]);

        let intake = Intake {
            level: 500.0,
            steam: 0.0,
            waiting_signal: false,
            units_ready: false,
            pump_state: vec![None; 4],
            pump_control_state: vec![None; 4],
            acks: Vec::new(),
            repaired: Vec::new(),
        };
        let mut out = Mailbox::new();
        ctl.tick_degraded(&intake, &mut out);

        let opened: Vec<usize> = out
            .iter()
            .filter_map(|m| match m {
                Message::OpenPump(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(opened, vec![2]);
        assert!(!out.iter().any(|m| matches!(m, Message::ClosePump(_))));
    }

    #[test]
    fn normal_operation_drives_toward_healthy_plant() {
        let mut ctl = Controller::new(cfg());

        let mut to_ready = Mailbox::new();
        to_ready.send(Message::SteamBoilerWaiting);
        to_ready.send(Message::Level(500.0));
        to_ready.send(Message::Steam(0.0));
        ctl.tick(&to_ready);

        let mut to_normal = Mailbox::new();
        to_normal.send(Message::PhysicalUnitsReady);
        to_normal.send(Message::Level(500.0));
        to_normal.send(Message::Steam(0.0));
        ctl.tick(&to_normal);

        let mut tick = Mailbox::new();
        tick.send(Message::Level(500.0));
        tick.send(Message::Steam(0.0));
        for msg in pump_readings(&[false, false, false, false]) {
            tick.send(msg);
        }

        ctl.tick(&tick);
        assert_eq!(ctl.mode(), Mode::Normal);
    }
}
