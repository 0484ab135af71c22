//! Defines the error type used throughout the controller.
//!
//! Peripheral faults (a stuck pump, a broken level sensor) are *not*
//! represented here -- they are ordinary data flowing through the
//! fault registry. This type is reserved for things that mean the
//! controller itself cannot proceed: a malformed configuration, a
//! malformed tick, or an internal invariant that didn't hold.

use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// A configuration file was missing a required field, or its
    /// plant parameters violated the ordering invariant.
    ConfigError(String),

    /// The inbound mailbox for a tick was malformed: a required
    /// message was missing, duplicated, or out of range.
    ProtocolError(String),

    /// An internal invariant didn't hold. Unlike the two errors
    /// above, this indicates a bug in the controller rather than bad
    /// input.
    OperationError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ConfigError(v) => write!(f, "config error: {}", &v),
            Error::ProtocolError(v) => write!(f, "protocol error: {}", &v),
            Error::OperationError(v) => {
                write!(f, "couldn't complete operation: {}", &v)
            }
        }
    }
}
