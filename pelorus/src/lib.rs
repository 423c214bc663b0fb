//! Pelorus - navigation math for an autonomous sailboat
//!
//! This library holds the pure math underneath the guidance core: spherical
//! geodesics (bearings and ranges in nautical miles), angle normalization,
//! the hull-speed polar model, chord-adjusted waypoints and the coupled
//! heading/wind/apparent-wind course state.
//!
//! All angles are radians. Latitudes live in [-π/2, π/2], longitudes in
//! (-π, π], absolute bearings in [0, 2π) and apparent wind angles in
//! (-π, π] with negative values meaning the wind comes over the port side.

pub mod angle;
pub mod bearing;
pub mod course;
pub mod error;
pub mod location;
pub mod polar;
pub mod waypoint;

pub use bearing::{Bearing, EARTH_RADIUS_NM};
pub use course::{Course, Tack};
pub use error::ParseError;
pub use location::Location;
pub use polar::PolarCurve;
pub use waypoint::{Waypoint, REACHED_THRESHOLD_NM};
