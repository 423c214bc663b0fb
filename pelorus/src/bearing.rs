//! Great-circle bearings and ranges.

use std::f64::consts::PI;
use std::ops::{Add, Sub};

use crate::angle::absolute;
use crate::location::Location;

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.069528437724;

/// A direction and a range over the ground.
///
/// The angle is an absolute bearing in [0, 2π) (0 = true north) and the
/// distance is in nautical miles, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bearing {
    pub angle: f64,
    pub distance: f64,
}

impl Bearing {
    /// Build a bearing, normalizing the angle and flooring the distance at 0.
    pub fn new(angle: f64, distance: f64) -> Self {
        Bearing {
            angle: absolute(angle),
            distance: distance.max(0.0),
        }
    }

    /// Great-circle bearing and range from `from` to `to`.
    ///
    /// Uses the Haversine identity on the unit sphere scaled by
    /// [`EARTH_RADIUS_NM`].
    pub fn compute(from: Location, to: Location) -> Self {
        let delta_lon = to.longitude - from.longitude;
        let (sin_from, cos_from) = from.latitude.sin_cos();
        let (sin_to, cos_to) = to.latitude.sin_cos();

        // Rounding can push the dot product a hair outside [-1, 1].
        let cos_d = (sin_from * sin_to + cos_from * cos_to * delta_lon.cos()).clamp(-1.0, 1.0);
        let distance = cos_d.acos() * EARTH_RADIUS_NM;

        let angle = (delta_lon.sin() * cos_to)
            .atan2(cos_from * sin_to - sin_from * cos_to * delta_lon.cos());

        Bearing::new(angle, distance)
    }

    /// The reciprocal bearing, (angle + π) mod 2π.
    pub fn back_angle(&self) -> f64 {
        absolute(self.angle + PI)
    }
}

impl Add<Bearing> for Location {
    type Output = Location;

    /// Project along the great circle described by `bearing`.
    fn add(self, bearing: Bearing) -> Location {
        let angular = bearing.distance / EARTH_RADIUS_NM;
        let (sin_lat, cos_lat) = self.latitude.sin_cos();
        let (sin_d, cos_d) = angular.sin_cos();

        let latitude = (sin_lat * cos_d + cos_lat * sin_d * bearing.angle.cos()).asin();
        let longitude = self.longitude
            + (bearing.angle.sin() * sin_d * cos_lat).atan2(cos_d - sin_lat * latitude.sin());

        Location::new(latitude, longitude)
    }
}

impl Sub for Location {
    type Output = Bearing;

    /// `destination - origin` is the bearing from the origin to the
    /// destination.
    fn sub(self, origin: Location) -> Bearing {
        Bearing::compute(origin, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::separation;

    #[test]
    fn test_dublin_to_london() {
        // Trinity College Dublin to Buckingham Palace.
        let dublin = Location::new(0.9310282965575151, -0.10918010110276395);
        let palace = Location::new(0.8988640251982394, -0.0024844063770438486);

        let bearing = Bearing::compute(dublin, palace);
        assert!((bearing.angle - 1.98).abs() < 0.1, "angle {}", bearing.angle);
        assert!(
            (bearing.distance - 250.0).abs() < 10.0,
            "distance {}",
            bearing.distance
        );
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Location::from_degrees(53.0, -9.0);
        let b = Location::from_degrees(48.5, -4.5);
        let ab = Bearing::compute(a, b);
        let ba = Bearing::compute(b, a);
        assert!((ab.distance - ba.distance).abs() < 1e-9);
    }

    #[test]
    fn test_back_angle_duality_on_meridian_and_equator() {
        // Along a meridian or the equator the reciprocal bearing is exact.
        let south = Location::from_degrees(50.0, -9.0);
        let north = Location::from_degrees(55.0, -9.0);
        assert!(separation((north - south).back_angle(), (south - north).angle) < 1e-9);

        let west = Location::from_degrees(0.0, -10.0);
        let east = Location::from_degrees(0.0, -5.0);
        assert!(separation((east - west).back_angle(), (west - east).angle) < 1e-9);
    }

    #[test]
    fn test_back_angle_duality_short_range() {
        // At short range convergence of meridians is negligible.
        let a = Location::from_degrees(53.27, -9.05);
        let b = Location::from_degrees(53.28, -9.03);
        assert!(separation((b - a).back_angle(), (a - b).angle) < 1e-3);
    }

    #[test]
    fn test_projection_inverts_bearing() {
        let start = Location::from_degrees(53.27, -9.05);
        let bearing = Bearing::new(2.1, 25.0);
        let end = start + bearing;
        let recovered = end - start;
        assert!(separation(recovered.angle, bearing.angle) < 1e-6);
        assert!((recovered.distance - bearing.distance).abs() < 1e-6);
    }

    #[test]
    fn test_zero_distance() {
        let a = Location::from_degrees(10.0, 10.0);
        let b = Bearing::compute(a, a);
        assert_eq!(b.distance, 0.0);
        assert!(b.angle >= 0.0 && b.angle < std::f64::consts::TAU);
    }
}
