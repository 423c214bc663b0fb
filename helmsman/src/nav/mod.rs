//! Navigator task.
//!
//! Woken by GPS fix publishes, the navigator rebuilds the boat's course
//! from the controller's compass and wind sensor, advances through the
//! mission's attractor list, runs the swing-window planner and hands the
//! winning heading to the controller.
//!
//! The navigator never writes MissionStatus itself; waypoint advancement
//! and completion travel to the mission supervisor as [`NavEvent`]s, so
//! the status record keeps a single writer.

pub mod planner;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use pelorus::angle::normalize_pi;
use pelorus::{Course, Location, Waypoint};

use crate::alarm;
use crate::error::Result;
use crate::gps::GpsFix;
use crate::mission::{Mission, MissionStatus};
use crate::otto::{OttoHandle, OttoState};
use crate::store::Store;

/// Reports from the navigator to the mission supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    /// The current waypoint index changed (including the initial 0).
    Advanced { index: usize },
    /// An attractor's coverage half-disk was entered.
    WaypointReached { index: usize, name: String },
    /// The chosen heading crosses to the other tack.
    Tacking,
    /// The attractor list is exhausted; the voyage is done.
    Complete,
    /// The search found no sailable candidate at all; holding course.
    Stalled,
}

/// Pause before reconsidering an invalid fix.
const GPS_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How long to wait on the GPS channel before rechecking mission state.
const WAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll interval while the mission is inactive.
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Allowed perpendicular deviation from the current leg, nautical miles.
const CROSS_TRACK_LIMIT_NM: f64 = 1.0;

pub struct Navigator {
    store: Arc<Store>,
    otto: OttoHandle,
    events: Sender<NavEvent>,
    gps_wakeups: Receiver<u64>,
    course: Course,
    /// Working copies; the mission itself stays immutable for the voyage.
    attractors: Vec<Waypoint>,
    repellors: Vec<Waypoint>,
    /// Start of the current leg, for cross-track monitoring.
    leg_start: Location,
}

impl Navigator {
    pub fn new(
        store: Arc<Store>,
        otto: OttoHandle,
        mission: &Mission,
        events: Sender<NavEvent>,
        gps_wakeups: Receiver<u64>,
    ) -> Self {
        Navigator {
            store,
            otto,
            events,
            gps_wakeups,
            course: Course::default(),
            attractors: mission.attractors.clone(),
            repellors: mission.repellors.clone(),
            leg_start: mission.launch.location,
        }
    }

    /// Thread body: sleep while the mission is inactive, otherwise run one
    /// planning cycle per GPS publish.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        log::info!(
            "navigator started: {} attractors, {} repellors",
            self.attractors.len(),
            self.repellors.len()
        );

        while !shutdown.load(Ordering::Relaxed) {
            let status = match self.store.load::<MissionStatus>() {
                Ok(status) => status,
                Err(e) => {
                    log::error!("navigator: cannot read mission status: {}", e);
                    break;
                }
            };

            if !status.state.is_active() {
                std::thread::sleep(IDLE_POLL);
                continue;
            }

            match self.gps_wakeups.recv_timeout(WAKE_TIMEOUT) {
                Ok(_counter) => {
                    if let Err(e) = self.cycle(&status) {
                        log::error!("navigator cycle failed: {}", e);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        log::info!("navigator exiting");
    }

    /// One planning cycle against the latest fix and controller state.
    fn cycle(&mut self, status: &MissionStatus) -> Result<()> {
        let gps = self.store.load::<GpsFix>()?;
        if !gps.valid {
            alarm::raise(&self.store, alarm::GPS_INVALID)?;
            std::thread::sleep(GPS_RETRY_DELAY);
            return Ok(());
        }

        // The mission begins on the first cycle.
        let mut current = if status.current_waypoint < 0 {
            self.send(NavEvent::Advanced { index: 0 });
            0
        } else {
            status.current_waypoint as usize
        };
        if current >= self.attractors.len() {
            self.send(NavEvent::Complete);
            return Ok(());
        }

        // Rebuild the course from what the controller actually measured.
        let otto = self.store.load::<OttoState>()?;
        self.course.set_heading(otto.compass_radians());
        self.course.set_awa(otto.awa_radians());
        self.course.compute_wind();

        for waypoint in &mut self.attractors[current..] {
            waypoint.compute_bearing(gps.location);
        }
        for repellor in &mut self.repellors {
            repellor.compute_bearing(gps.location);
        }

        if self
            .repellors
            .iter()
            .any(|r| r.bearing.distance < r.range)
        {
            alarm::raise(&self.store, alarm::INSIDE_FENCE)?;
        }

        // Walk through any attractors whose half-disk we are inside.
        while self.attractors[current].is_reached() {
            log::info!(
                "waypoint {} \"{}\" reached",
                current,
                self.attractors[current].name
            );
            alarm::raise(&self.store, alarm::WAYPOINT_REACHED)?;
            self.send(NavEvent::WaypointReached {
                index: current,
                name: self.attractors[current].name.clone(),
            });
            self.leg_start = self.attractors[current].location;

            current += 1;
            if current >= self.attractors.len() {
                self.send(NavEvent::Complete);
                return Ok(());
            }
            self.send(NavEvent::Advanced { index: current });
        }

        if cross_track_nm(self.leg_start, &self.attractors[current], gps.location).abs()
            > CROSS_TRACK_LIMIT_NM
        {
            alarm::raise(&self.store, alarm::CROSS_TRACK_ERROR)?;
        }

        // An empty search means every heading in the window was head to
        // wind or scored non-finite; a best candidate with poor utility
        // is still the least-bad heading and gets steered.
        let plan = match planner::search(&self.course, &self.attractors, &self.repellors, current)
        {
            Some(plan) => plan,
            None => {
                alarm::raise(&self.store, alarm::NAV_STALLED)?;
                self.send(NavEvent::Stalled);
                return Ok(());
            }
        };

        if plan.tacking {
            log::info!(
                "tacking: {:.0}° onto the other board",
                pelorus::angle::radians_to_degrees(normalize_pi(
                    plan.course.heading() - self.course.heading()
                ))
                .abs()
            );
            self.send(NavEvent::Tacking);
        }

        self.course = plan.course;
        self.otto.steer_compass(self.course.heading())
    }

    fn send(&self, event: NavEvent) {
        if self.events.send(event).is_err() {
            log::warn!("navigator: supervisor event channel closed");
        }
    }
}

/// Signed perpendicular deviation of `boat` from the leg running
/// `leg_start` -> `target`, in nautical miles.
fn cross_track_nm(leg_start: Location, target: &Waypoint, boat: Location) -> f64 {
    let leg = target.location - leg_start;
    if leg.distance <= 0.0 {
        return 0.0;
    }
    let to_boat = boat - leg_start;
    to_boat.distance * normalize_pi(to_boat.angle - leg.angle).sin()
}
