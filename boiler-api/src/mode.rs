//! The controller's operating mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six states of the top-level operating-mode state machine.
///
/// `EmergencyStop` is terminal: once entered, the orchestrator never
/// leaves it (see `Controller::tick`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Waiting,
    Ready,
    Normal,
    Degraded,
    Rescue,
    EmergencyStop,
}

impl Mode {
    pub fn is_terminal(self) -> bool {
        self == Mode::EmergencyStop
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Mode::Waiting => "WAITING",
            Mode::Ready => "READY",
            Mode::Normal => "NORMAL",
            Mode::Degraded => "DEGRADED",
            Mode::Rescue => "RESCUE",
            Mode::EmergencyStop => "EMERGENCY_STOP",
        };
        write!(f, "{}", s)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Waiting
    }
}
