//! Immutable plant parameters.
//!
//! A `Config` is parsed once (see `boilerd::config`) and never
//! changes afterward; every module in the controller borrows it for
//! the lifetime of the process.

use crate::error::{Error, Result};
use serde::Deserialize;

/// The physical parameters of the boiler, its pumps, and its valve.
///
/// Field names follow the spec's notation: `capacity` is C, `normal_*`
/// is [N⁻, N⁺], `safety_*` is [L⁻, L⁺], `pumps` is P, `pump_capacity`
/// is Q (uniform across all P pumps), `max_steam` is W, and
/// `evac_rate` is E.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub capacity: f64,
    pub normal_lo: f64,
    pub normal_hi: f64,
    pub safety_lo: f64,
    pub safety_hi: f64,
    pub pumps: usize,
    pub pump_capacity: f64,
    pub max_steam: f64,
    pub evac_rate: f64,
}

impl Config {
    /// The level the controller aims to hold: the midpoint of the
    /// normal band.
    pub fn target(&self) -> f64 {
        (self.normal_lo + self.normal_hi) / 2.0
    }

    /// Checks the ordering invariant from §3 of the spec:
    /// `0 < L⁻ < N⁻ < T < N⁺ < L⁺ < C`, plus positivity of the
    /// remaining plant constants. Called once, at startup.
    pub fn validate(&self) -> Result<()> {
        let t = self.target();
        let ordered = 0.0 < self.safety_lo
            && self.safety_lo < self.normal_lo
            && self.normal_lo < t
            && t < self.normal_hi
            && self.normal_hi < self.safety_hi
            && self.safety_hi < self.capacity;

        if !ordered {
            return Err(Error::ConfigError(format!(
                "band ordering violated: expected 0 < {} < {} < {} < {} < {} < {}",
                self.safety_lo,
                self.normal_lo,
                t,
                self.normal_hi,
                self.safety_hi,
                self.capacity
            )));
        }

        if self.pumps == 0 {
            return Err(Error::ConfigError("pumps must be > 0".into()));
        }
        if self.pump_capacity <= 0.0 {
            return Err(Error::ConfigError("pump_capacity must be > 0".into()));
        }
        if self.max_steam <= 0.0 {
            return Err(Error::ConfigError("max_steam must be > 0".into()));
        }
        if self.evac_rate <= 0.0 {
            return Err(Error::ConfigError("evac_rate must be > 0".into()));
        }

        for (name, v) in [
            ("capacity", self.capacity),
            ("normal_lo", self.normal_lo),
            ("normal_hi", self.normal_hi),
            ("safety_lo", self.safety_lo),
            ("safety_hi", self.safety_hi),
            ("pump_capacity", self.pump_capacity),
            ("max_steam", self.max_steam),
            ("evac_rate", self.evac_rate),
        ] {
            if !v.is_finite() {
                return Err(Error::ConfigError(format!(
                    "{} must be a finite number, got {}",
                    name, v
                )));
            }
        }

        Ok(())
    }
}
