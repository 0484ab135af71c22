//! The fault registry: one slot per peripheral, tracking both the
//! kind of fault (if any) and whether the plant has acknowledged our
//! failure report for it.
//!
//! A flat, fixed-size collection indexed by [`Peripheral`] beats a
//! polymorphic hierarchy here -- there are exactly `2 + 2*P`
//! peripherals and they never change shape at runtime.

/// The five fault classes the detector can implicate a pump or
/// controller with, plus the two simpler ones used for the valve,
/// steam sensor, and level sensor (which only ever get stuck or
/// subtly offset, never "reduced" or "wrong-transmission").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Ok,
    StuckOn,
    StuckOff,
    Reduced,
    TxWrong,
    /// Valve or steam sensor stuck at its last value.
    Stuck,
    /// Level sensor reads a constant offset from the true level.
    Offset,
}

impl FaultKind {
    pub fn is_ok(self) -> bool {
        self == FaultKind::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultSlot {
    pub kind: FaultKind,
    pub acknowledged: bool,
}

impl Default for FaultSlot {
    fn default() -> Self {
        FaultSlot {
            kind: FaultKind::Ok,
            acknowledged: false,
        }
    }
}

/// Identifies a single peripheral in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    Valve,
    Steam,
    Level,
    Pump(usize),
    Controller(usize),
}

#[derive(Debug, Clone)]
pub struct FaultRegistry {
    valve: FaultSlot,
    steam: FaultSlot,
    level: FaultSlot,
    pumps: Vec<FaultSlot>,
    controllers: Vec<FaultSlot>,
}

impl FaultRegistry {
    pub fn new(pump_count: usize) -> Self {
        FaultRegistry {
            valve: FaultSlot::default(),
            steam: FaultSlot::default(),
            level: FaultSlot::default(),
            pumps: vec![FaultSlot::default(); pump_count],
            controllers: vec![FaultSlot::default(); pump_count],
        }
    }

    fn slot(&self, p: Peripheral) -> &FaultSlot {
        match p {
            Peripheral::Valve => &self.valve,
            Peripheral::Steam => &self.steam,
            Peripheral::Level => &self.level,
            Peripheral::Pump(i) => &self.pumps[i],
            Peripheral::Controller(i) => &self.controllers[i],
        }
    }

    fn slot_mut(&mut self, p: Peripheral) -> &mut FaultSlot {
        match p {
            Peripheral::Valve => &mut self.valve,
            Peripheral::Steam => &mut self.steam,
            Peripheral::Level => &mut self.level,
            Peripheral::Pump(i) => &mut self.pumps[i],
            Peripheral::Controller(i) => &mut self.controllers[i],
        }
    }

    pub fn get(&self, p: Peripheral) -> FaultSlot {
        *self.slot(p)
    }

    pub fn is_faulted(&self, p: Peripheral) -> bool {
        !self.slot(p).kind.is_ok()
    }

    /// Records a new fault. Newly-detected faults always start
    /// unacknowledged -- the handshake in §4.7 is what moves them to
    /// acknowledged, then clears them.
    pub fn set(&mut self, p: Peripheral, kind: FaultKind) {
        *self.slot_mut(p) = FaultSlot {
            kind,
            acknowledged: false,
        };
    }

    pub fn acknowledge(&mut self, p: Peripheral) {
        let slot = self.slot_mut(p);
        if !slot.kind.is_ok() {
            slot.acknowledged = true;
        }
    }

    /// Clears a slot back to healthy. Called once a REPAIRED message
    /// for an acknowledged fault has been accepted.
    pub fn clear(&mut self, p: Peripheral) {
        *self.slot_mut(p) = FaultSlot::default();
    }

    pub fn level_faulted(&self) -> bool {
        self.is_faulted(Peripheral::Level)
    }

    pub fn steam_faulted(&self) -> bool {
        self.is_faulted(Peripheral::Steam)
    }

    pub fn valve_faulted(&self) -> bool {
        self.is_faulted(Peripheral::Valve)
    }

    /// `true` if any peripheral other than the level sensor is
    /// faulted. Used to pick DEGRADED vs NORMAL after a repair.
    pub fn any_non_level_faulted(&self) -> bool {
        self.valve_faulted()
            || self.steam_faulted()
            || self.pumps.iter().any(|s| !s.kind.is_ok())
            || self.controllers.iter().any(|s| !s.kind.is_ok())
    }

    pub fn any_faulted(&self) -> bool {
        self.level_faulted() || self.any_non_level_faulted()
    }

    /// Pumps currently commanded to stay on regardless of the
    /// planner's choice (stuck-on), and those forced off
    /// (stuck-off). Used by the planner's DEGRADED commanding rules.
    pub fn locked_on_pumps(&self) -> Vec<usize> {
        self.pumps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == FaultKind::StuckOn)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn locked_off_pumps(&self) -> Vec<usize> {
        self.pumps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == FaultKind::StuckOff)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn reduced_pumps(&self) -> Vec<usize> {
        self.pumps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind == FaultKind::Reduced)
            .map(|(i, _)| i)
            .collect()
    }

    /// Pumps that the planner can freely open/close: not stuck in
    /// either direction, not known-reduced (those are used only as a
    /// last resort, see §4.5), and a TX_WRONG pump only once the
    /// plant has acknowledged that report -- before acknowledgement
    /// its true state is still in question.
    pub fn healthy_pumps(&self, pump_count: usize) -> Vec<usize> {
        (0..pump_count)
            .filter(|&i| {
                let slot = self.pumps[i];
                match slot.kind {
                    FaultKind::Ok => true,
                    FaultKind::TxWrong => slot.acknowledged,
                    _ => false,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_registry_is_all_ok() {
        let reg = FaultRegistry::new(4);
        assert!(!reg.any_faulted());
        assert!(!reg.is_faulted(Peripheral::Pump(2)));
    }

    #[test]
    fn set_then_acknowledge_then_clear() {
        let mut reg = FaultRegistry::new(4);

        reg.set(Peripheral::Pump(1), FaultKind::StuckOn);
        assert!(reg.is_faulted(Peripheral::Pump(1)));
        assert!(!reg.get(Peripheral::Pump(1)).acknowledged);

        reg.acknowledge(Peripheral::Pump(1));
        assert!(reg.get(Peripheral::Pump(1)).acknowledged);

        reg.clear(Peripheral::Pump(1));
        assert!(!reg.is_faulted(Peripheral::Pump(1)));
        assert!(!reg.get(Peripheral::Pump(1)).acknowledged);
    }

    #[test]
    fn locked_pump_classification() {
        let mut reg = FaultRegistry::new(4);

        reg.set(Peripheral::Pump(0), FaultKind::StuckOn);
        reg.set(Peripheral::Pump(1), FaultKind::StuckOff);
        reg.set(Peripheral::Pump(2), FaultKind::Reduced);

        assert_eq!(reg.locked_on_pumps(), vec![0]);
        assert_eq!(reg.locked_off_pumps(), vec![1]);
        assert_eq!(reg.reduced_pumps(), vec![2]);
        assert_eq!(reg.healthy_pumps(4), vec![3]);
    }

    #[test]
    fn tx_wrong_pump_is_healthy_only_once_acknowledged() {
        let mut reg = FaultRegistry::new(4);
        reg.set(Peripheral::Pump(0), FaultKind::TxWrong);

        assert_eq!(reg.healthy_pumps(4), vec![1, 2, 3]);

        reg.acknowledge(Peripheral::Pump(0));
        assert_eq!(reg.healthy_pumps(4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn level_fault_does_not_count_as_non_level() {
        let mut reg = FaultRegistry::new(4);
        reg.set(Peripheral::Level, FaultKind::Stuck);
        assert!(reg.any_faulted());
        assert!(!reg.any_non_level_faulted());
    }
}
