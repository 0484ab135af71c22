//! Types shared between the controller core and its driver binary:
//! the tick-level message vocabulary, the plant configuration, the
//! operating mode, and the crate-wide error type.

pub mod config;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod mode;

pub use config::Config;
pub use error::{Error, Result};
pub use mailbox::Mailbox;
pub use message::Message;
pub use mode::Mode;
