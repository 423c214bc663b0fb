//! Swing-window search over candidate headings.
//!
//! Each cycle the planner sweeps a window of headings around the bearing
//! to the current attractor and scores every candidate by relative VMG:
//! velocity projected onto each goal, weighted inversely by distance.
//! Repellors contribute with opposite sign, pushing the search away from
//! hazards. Changing tack costs a heavy penalty because a tack loses way
//! and risks the rig.

use pelorus::angle::{degrees_to_radians, separation};
use pelorus::{Course, Waypoint};

/// Half-width of the heading search window, degrees.
pub const SWING_DEGREES: i32 = 45;

/// Utility multiplier for candidates on the opposite tack.
pub const TACK_PENALTY: f64 = 0.1;

/// How many upcoming attractors pull on the candidate besides the
/// current target.
pub const LOOKAHEAD_WAYPOINTS: usize = 3;

/// Candidates slower than this are head to wind and unusable.
const MIN_SAILABLE_SPEED: f64 = 0.001;

/// The winning candidate of one search.
#[derive(Debug, Clone)]
pub struct Plan {
    pub course: Course,
    pub utility: f64,
    /// The winner lies on the other tack from the current course.
    pub tacking: bool,
}

/// Search the swing window around the bearing to
/// `attractors[current]`.
///
/// Every waypoint must have a fresh bearing from
/// [`Waypoint::compute_bearing`]. Candidates with a non-finite utility
/// (a goal at zero distance) are treated as -∞ and skipped. Returns
/// `None` when no candidate can sail at all.
///
/// Ties resolve to the candidate nearer the current heading, which keeps
/// the rudder quiet when the field is flat.
pub fn search(
    course: &Course,
    attractors: &[Waypoint],
    repellors: &[Waypoint],
    current: usize,
) -> Option<Plan> {
    let target = attractors.get(current)?;
    let pull_end = (current + LOOKAHEAD_WAYPOINTS).min(attractors.len());

    let mut best: Option<Plan> = None;

    for swing in -SWING_DEGREES..=SWING_DEGREES {
        let mut candidate = course.clone();
        candidate.set_heading(target.bearing.angle + degrees_to_radians(swing as f64));

        if candidate.speed() < MIN_SAILABLE_SPEED {
            continue;
        }

        let mut utility = candidate.relative_vmg(target);
        for attractor in &attractors[current..pull_end] {
            utility += candidate.relative_vmg(attractor);
        }
        for repellor in repellors {
            utility -= candidate.relative_vmg(repellor);
        }

        if !utility.is_finite() {
            continue;
        }

        let tacking = candidate.tack() != course.tack();
        if tacking {
            utility *= TACK_PENALTY;
        }

        let better = match &best {
            None => true,
            Some(plan) => {
                utility > plan.utility
                    || (utility == plan.utility
                        && separation(candidate.heading(), course.heading())
                            < separation(plan.course.heading(), course.heading()))
            }
        };
        if better {
            best = Some(Plan {
                course: candidate,
                utility,
                tacking,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use pelorus::{Bearing, Location, PolarCurve};
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    /// Boat in Galway Bay with fresh bearings to each waypoint.
    fn boat() -> Location {
        Location::from_degrees(53.20, -9.10)
    }

    fn mark(bearing_deg: f64, distance_nm: f64, attractor: bool) -> Waypoint {
        let location = boat() + Bearing::new(degrees_to_radians(bearing_deg), distance_nm);
        let mut wp = if attractor {
            Waypoint::attractor(location, 0.0, 0.0, "mark")
        } else {
            Waypoint::repellor(location, 0.0, 0.0, "hazard")
        };
        wp.compute_bearing(boat());
        wp
    }

    /// Wind from the north, boat settled on starboard tack heading west.
    fn westbound_course() -> Course {
        let mut course = Course::new(PolarCurve::default());
        course.set_wind(Bearing::new(0.0, 12.0));
        course.set_heading(3.0 * FRAC_PI_2);
        course
    }

    #[test]
    fn test_prefers_current_tack_on_symmetric_field() {
        // Target dead upwind: the ±swing candidates are mirror images,
        // equal raw utility, opposite tacks. The penalty must keep the
        // boat on its current (starboard) tack.
        let course = westbound_course();
        let attractors = vec![mark(0.0, 5.0, true)];

        let plan = search(&course, &attractors, &[], 0).expect("no plan");
        assert_eq!(plan.course.tack(), course.tack());
        assert!(!plan.tacking);
        // Starboard tack on a northerly wind means heading west of north.
        assert!(plan.course.heading() > PI);
    }

    #[test]
    fn test_search_is_deterministic() {
        let course = westbound_course();
        let attractors = vec![mark(20.0, 3.0, true), mark(60.0, 5.0, true)];
        let repellors = vec![mark(100.0, 1.0, false)];

        let a = search(&course, &attractors, &repellors, 0).unwrap();
        let b = search(&course, &attractors, &repellors, 0).unwrap();
        assert_eq!(a.course.heading().to_bits(), b.course.heading().to_bits());
        assert_eq!(a.utility.to_bits(), b.utility.to_bits());
    }

    #[test]
    fn test_candidates_stay_inside_swing_window() {
        let course = westbound_course();
        let attractors = vec![mark(120.0, 4.0, true)];

        let plan = search(&course, &attractors, &[], 0).unwrap();
        let target_bearing = attractors[0].bearing.angle;
        assert!(
            separation(plan.course.heading(), target_bearing)
                <= degrees_to_radians(SWING_DEGREES as f64) + 1e-9
        );
    }

    #[test]
    fn test_repellor_pushes_choice_away() {
        let course = westbound_course();
        let attractors = vec![mark(90.0, 4.0, true)];

        let clear = search(&course, &attractors, &[], 0).unwrap();

        // A hazard close on the down-swing side shifts the winner.
        let repellors = vec![mark(60.0, 0.2, false)];
        let avoided = search(&course, &attractors, &repellors, 0).unwrap();
        assert!(avoided.utility < clear.utility);
        assert!(
            separation(avoided.course.heading(), degrees_to_radians(60.0))
                >= separation(clear.course.heading(), degrees_to_radians(60.0))
        );
    }

    #[test]
    fn test_zero_distance_target_yields_no_plan() {
        // All candidates divide by zero distance; every utility is
        // non-finite and must be treated as -∞.
        let course = westbound_course();
        let mut wp = mark(0.0, 5.0, true);
        wp.distance = 0.0;

        assert!(search(&course, &[wp], &[], 0).is_none());
    }

    #[test]
    fn test_empty_attractor_list_yields_no_plan() {
        let course = westbound_course();
        assert!(search(&course, &[], &[], 0).is_none());
        assert!(search(&course, &[mark(0.0, 1.0, true)], &[], 5).is_none());
    }

    #[test]
    fn test_headings_normalized() {
        let course = westbound_course();
        // Target bearing near north: the swing window wraps through 0.
        let attractors = vec![mark(2.0, 5.0, true)];
        let plan = search(&course, &attractors, &[], 0).unwrap();
        assert!(plan.course.heading() >= 0.0 && plan.course.heading() < TAU);
    }
}
