//! The boat's current (or candidate) sailing state.

use crate::angle::{absolute, normalize_pi};
use crate::bearing::Bearing;
use crate::polar::PolarCurve;
use crate::waypoint::Waypoint;

/// Which side the wind comes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tack {
    Port,
    Starboard,
}

/// Heading, true wind, apparent wind angle and the speed the polar model
/// predicts for them.
///
/// The three angles are coupled: `awa = wind.angle - heading` normalized
/// into (-π, π]. Every setter restores the coupling and recomputes speed,
/// so the struct can never hold an inconsistent triple. The wind bearing's
/// distance slot carries the wind speed in knots.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    heading: f64,
    wind: Bearing,
    awa: f64,
    speed: f64,
    polar: PolarCurve,
}

impl Course {
    pub fn new(polar: PolarCurve) -> Self {
        Course {
            heading: 0.0,
            wind: Bearing::default(),
            awa: 0.0,
            speed: polar.speed(0.0),
            polar,
        }
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn wind(&self) -> Bearing {
        self.wind
    }

    /// Apparent wind angle in (-π, π]; negative means port tack.
    pub fn awa(&self) -> f64 {
        self.awa
    }

    /// Predicted hull speed in knots.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Point the boat; apparent wind and speed follow.
    pub fn set_heading(&mut self, heading: f64) {
        self.heading = absolute(heading);
        self.compute_awa();
    }

    /// Replace the true wind; apparent wind and speed follow.
    pub fn set_wind(&mut self, wind: Bearing) {
        self.wind = wind;
        self.compute_awa();
    }

    /// Take the apparent wind angle as measured; speed follows.
    ///
    /// Used when reading the masthead sensor, before [`Course::compute_wind`]
    /// recovers the true wind direction.
    pub fn set_awa(&mut self, awa: f64) {
        self.awa = normalize_pi(awa);
        self.compute_speed();
    }

    /// Recover the true wind direction from heading and apparent wind.
    pub fn compute_wind(&mut self) {
        self.wind.angle = absolute(self.heading + self.awa);
    }

    /// Component of predicted velocity toward `waypoint`, normalized by its
    /// adjusted distance so nearer goals weigh heavier.
    ///
    /// Infinite or NaN results (a waypoint at zero distance) are the
    /// caller's concern; the planner treats them as -∞.
    pub fn relative_vmg(&self, waypoint: &Waypoint) -> f64 {
        self.speed * (waypoint.bearing.angle - self.heading).cos() / waypoint.distance
    }

    pub fn tack(&self) -> Tack {
        if self.awa < 0.0 {
            Tack::Port
        } else {
            Tack::Starboard
        }
    }

    fn compute_awa(&mut self) {
        self.awa = normalize_pi(self.wind.angle - self.heading);
        self.compute_speed();
    }

    fn compute_speed(&mut self) {
        self.speed = self.polar.speed(self.awa);
    }
}

impl Default for Course {
    fn default() -> Self {
        Course::new(PolarCurve::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn test_heading_wraps_and_awa_follows() {
        let mut course = Course::default();
        course.set_wind(Bearing::new(FRAC_PI_4, 10.0));
        assert!((course.awa() - FRAC_PI_4).abs() < 1e-12);

        course.set_heading(3.0 * PI);
        assert!((course.heading() - PI).abs() < 1e-12);
        // π/4 - π wraps to -3π/4.
        assert!((course.awa() + 3.0 * FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_awa_invariant_after_any_setter() {
        let mut course = Course::default();
        for (wind, heading) in [(0.3, 5.9), (4.0, 0.2), (6.1, 6.2), (PI, PI)] {
            course.set_wind(Bearing::new(wind, 8.0));
            course.set_heading(heading);
            let expected = crate::angle::normalize_pi(course.wind().angle - course.heading());
            assert!((course.awa() - expected).abs() < 1e-12);
            assert!(course.awa() > -PI && course.awa() <= PI);
        }
    }

    #[test]
    fn test_tack_sign_convention() {
        let mut course = Course::default();
        course.set_awa(-0.1);
        assert_eq!(course.tack(), Tack::Port);
        course.set_awa(0.1);
        assert_eq!(course.tack(), Tack::Starboard);
        course.set_awa(0.0);
        assert_eq!(course.tack(), Tack::Starboard);
    }

    #[test]
    fn test_speed_tracks_awa() {
        let mut course = Course::default();
        course.set_awa(0.2);
        assert_eq!(course.speed(), 0.0);
        course.set_awa(FRAC_PI_2);
        assert!(course.speed() > 4.0);
    }

    #[test]
    fn test_compute_wind_recovers_direction() {
        let mut course = Course::default();
        course.set_heading(1.0);
        course.set_awa(-0.5);
        course.compute_wind();
        assert!((course.wind().angle - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_relative_vmg_projects_onto_bearing() {
        let mut course = Course::default();
        course.set_wind(Bearing::new(0.0, 10.0));
        course.set_heading(FRAC_PI_2);

        let mut wp = Waypoint::attractor(Location::from_degrees(53.0, -8.0), 0.0, 0.0, "t");
        wp.bearing = Bearing::new(FRAC_PI_2, 2.0);
        wp.distance = 2.0;

        // Sailing straight at the waypoint: vmg = speed / distance.
        assert!((course.relative_vmg(&wp) - course.speed() / 2.0).abs() < 1e-12);

        // Orthogonal bearing projects to zero.
        wp.bearing = Bearing::new(0.0, 2.0);
        assert!(course.relative_vmg(&wp).abs() < 1e-9);
    }
}
