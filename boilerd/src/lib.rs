//! The steam boiler controller library: configuration loading and
//! the tick-driven control core. Split out from the `boilerd` binary
//! so the scenario/property tests in `tests/` can drive
//! [`core::Controller`] directly, with hand-built mailboxes and no
//! process spawning.

pub mod config;
pub mod core;

pub use core::Controller;
