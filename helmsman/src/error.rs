//! Error types for the guidance daemon
//!
//! # Recovery strategies
//!
//! Different error kinds call for different responses:
//!
//! ## Fatal at startup
//!
//! - **`Config`**: the configuration file is missing or malformed. Fix the
//!   file and restart; `main` exits non-zero.
//! - **`State`**: the shared store is unusable (a poisoned lock means a
//!   writer panicked mid-save). Surfaced to the mission supervisor, which
//!   transitions the mission to FAILURE.
//!
//! ## Transient (retry locally)
//!
//! - **`Serial` / `Io`**: serial open/read/write failure. Reads and writes
//!   are retried with a bounded backoff; a persistent failure raises an
//!   alarm but does not kill the process.
//! - **`Sync`**: the low-level controller did not answer the handshake.
//!   Retried indefinitely with backoff - the controller may simply be
//!   rebooting.
//!
//! ## Log and continue
//!
//! - **`Parse` / `Location`**: a malformed NMEA sentence, controller frame
//!   or coordinate string. The offending unit is reported and discarded.
//! - **`Nav`**: the planner found no usable candidate heading. An alarm is
//!   raised and the boat holds its current heading until the next fix.

use thiserror::Error;

/// Errors that can occur in the guidance daemon.
///
/// See the module documentation for recovery strategies.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("coordinate parse error: {0}")]
    Location(#[from] pelorus::ParseError),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("controller sync: {0}")]
    Sync(String),

    #[error("state store error: {0}")]
    State(String),

    #[error("navigation error: {0}")]
    Nav(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
