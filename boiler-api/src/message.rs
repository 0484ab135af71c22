//! The per-tick message vocabulary exchanged with the plant.
//!
//! Every tick the plant hands the controller a bundle of inbound
//! messages (sensor readings, pump/controller status, repair
//! handshakes) and receives back a bundle of outbound messages (mode,
//! pump commands, valve toggles, failure reports). Neither bundle is
//! ordered in a way the controller depends on other than "at most one
//! of a given kind, for a given index, per tick" -- see
//! [`crate::mailbox::Mailbox`].

use crate::mode::Mode;
use serde::{Deserialize, Serialize};

/// A single tagged message, inbound or outbound.
///
/// One `enum` covers both directions, mirroring the wire-level
/// discriminated union the plant actually uses; the orchestrator only
/// ever constructs the outbound variants and only ever matches on the
/// inbound ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Message {
    // -- inbound --
    SteamBoilerWaiting,
    PhysicalUnitsReady,
    Level(f64),
    Steam(f64),
    PumpState(usize, bool),
    PumpControlState(usize, bool),
    LevelRepaired,
    SteamRepaired,
    PumpRepaired(usize),
    PumpControlRepaired(usize),
    LevelFailureAcknowledgement,
    SteamOutcomeFailureAcknowledgement,
    PumpFailureAcknowledgement(usize),
    PumpControlFailureAcknowledgement(usize),

    // -- outbound --
    ModeChanged(Mode),
    ProgramReady,
    OpenPump(usize),
    ClosePump(usize),
    Valve,
    LevelFailureDetection,
    SteamFailureDetection,
    PumpFailureDetection(usize),
    PumpControlFailureDetection(usize),
    LevelRepairedAcknowledgement,
    SteamRepairedAcknowledgement,
    PumpRepairedAcknowledgement(usize),
    PumpControlRepairedAcknowledgement(usize),
}

impl Message {
    /// `true` for the messages the plant may legally send.
    pub fn is_inbound(&self) -> bool {
        !matches!(
            self,
            Message::ModeChanged(_)
                | Message::ProgramReady
                | Message::OpenPump(_)
                | Message::ClosePump(_)
                | Message::Valve
                | Message::LevelFailureDetection
                | Message::SteamFailureDetection
                | Message::PumpFailureDetection(_)
                | Message::PumpControlFailureDetection(_)
                | Message::LevelRepairedAcknowledgement
                | Message::SteamRepairedAcknowledgement
                | Message::PumpRepairedAcknowledgement(_)
                | Message::PumpControlRepairedAcknowledgement(_)
        )
    }
}
