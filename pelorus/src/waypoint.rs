//! Attractors and repellors with chord-adjusted distance.

use std::f64::consts::PI;

use crate::angle::absolute;
use crate::bearing::Bearing;
use crate::location::Location;

/// A waypoint counts as achieved once its adjusted distance drops inside
/// this band (about 10 m, the GPS error floor).
pub const REACHED_THRESHOLD_NM: f64 = 0.0054;

/// A navigation goal (attractor) or hazard (repellor).
///
/// The `range` and `normal` describe a half-disk of coverage: a disk of
/// radius `range` around `location`, clipped by the half-plane whose
/// boundary runs perpendicular to `normal`. Arriving from inside the
/// half-plane shortens the measured distance by `range`, so the boat is
/// "at" the waypoint only when it approaches from the correct side.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub location: Location,
    /// Direction of the valid approach corridor, radians.
    pub normal: f64,
    /// Radius of the coverage half-disk, nautical miles.
    pub range: f64,
    pub name: String,
    pub attractor: bool,
    /// Bearing from the boat, refreshed by [`Waypoint::compute_bearing`].
    pub bearing: Bearing,
    /// Chord-adjusted distance in nautical miles, never negative.
    pub distance: f64,
}

impl Waypoint {
    pub fn attractor(location: Location, normal: f64, range: f64, name: &str) -> Self {
        Waypoint::new(location, normal, range, name, true)
    }

    pub fn repellor(location: Location, normal: f64, range: f64, name: &str) -> Self {
        Waypoint::new(location, normal, range, name, false)
    }

    fn new(location: Location, normal: f64, range: f64, name: &str, attractor: bool) -> Self {
        Waypoint {
            location,
            normal: absolute(normal),
            range: range.max(0.0),
            name: name.to_string(),
            attractor,
            bearing: Bearing::default(),
            distance: f64::INFINITY,
        }
    }

    /// Refresh the stored bearing and chord-adjusted distance from `from`.
    ///
    /// The raw great-circle distance is shortened by `range` only when the
    /// back-bearing from the waypoint falls inside the chord half-plane,
    /// i.e. `(back_angle - normal) mod 2π ∈ [0, π)`.
    pub fn compute_bearing(&mut self, from: Location) -> Bearing {
        let bearing = Bearing::compute(from, self.location);
        let alpha = absolute(bearing.back_angle() - self.normal);

        self.distance = if alpha < PI {
            (bearing.distance - self.range).max(0.0)
        } else {
            bearing.distance
        };
        self.bearing = bearing;
        bearing
    }

    /// Achieved when the adjusted distance is inside the GPS error floor.
    pub fn is_reached(&self) -> bool {
        self.distance <= REACHED_THRESHOLD_NM
    }
}
