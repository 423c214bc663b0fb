//! Helmsman - guidance core for an autonomous sailboat
//!
//! Continuously decides, from noisy sensor input, how to steer and trim
//! along a sequence of geographic goals while avoiding forbidden regions
//! and respecting the physics of sailing: a boat cannot sail straight
//! upwind, and tacking is expensive.
//!
//! ## Task model
//!
//! Five cooperating threads around one shared typed store:
//!
//! - **otto-reader / otto-writer**: the framed serial link to the
//!   low-level controller that owns the servos and sensors
//! - **gps-ingest**: NMEA in, GPS fixes published
//! - **navigator**: woken per fix, runs the vector-field planner
//! - **mission-supervisor**: owns the mission state machine
//!
//! The store is the only cross-task mutable state; each record type has a
//! single writer and publish/subscribe wakeups carry its change counter.

pub mod alarm;
pub mod config;
pub mod error;
pub mod gps;
pub mod mission;
pub mod nav;
pub mod otto;
pub mod store;
pub mod threads;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
