//! Mission supervisor task.
//!
//! Owns every MissionStatus transition (the navigator only reports
//! [`NavEvent`]s) and walks the lifecycle: wait for the boat to be ready,
//! run the start test, commence, then track navigator progress until the
//! waypoints are exhausted or the voyage is cut short.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::alarm;
use crate::error::Result;
use crate::gps::GpsFix;
use crate::nav::NavEvent;
use crate::otto::{OttoHandle, OttoState};
use crate::store::{now_timestamp, Store};

use super::status::{MissionState, MissionStatus};

/// Poll interval for readiness checks before the mission is under way.
const READINESS_POLL: Duration = Duration::from_secs(1);

/// Poll interval once the mission has reached a terminal state.
const TERMINAL_POLL: Duration = Duration::from_secs(60);

/// How long to block on navigator events per step while active.
const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// Buzzer code sounded during the start test.
const START_TEST_CHIRP: u8 = 2;

pub struct Supervisor {
    store: Arc<Store>,
    otto: OttoHandle,
    events: Receiver<NavEvent>,
    shutdown: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(
        store: Arc<Store>,
        otto: OttoHandle,
        events: Receiver<NavEvent>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Supervisor {
            store,
            otto,
            events,
            shutdown,
        }
    }

    /// Thread body. Persists MissionStatus after every step.
    pub fn run(&mut self) {
        while !self.shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.step() {
                log::error!("mission supervisor failed: {}", e);
                let _ = self.transition(|status| {
                    status.state = MissionState::Failure;
                    status.end_time = now_timestamp();
                });
                break;
            }
        }

        self.finish();
        log::info!("mission supervisor exiting");
    }

    fn step(&mut self) -> Result<()> {
        let status = self.store.load::<MissionStatus>()?;

        match status.state {
            MissionState::Awaiting => {
                // The mission file was loaded before this task started.
                log::info!("mission loaded, ready to start");
                self.transition(|status| status.state = MissionState::ReadyToStart)?;
            }
            MissionState::ReadyToStart => {
                if self.boat_ready()? {
                    log::info!("boat ready, beginning start test");
                    self.transition(|status| status.state = MissionState::StartTest)?;
                } else {
                    self.pause(READINESS_POLL);
                }
            }
            MissionState::StartTest => self.start_test()?,
            MissionState::RadioControl
            | MissionState::CompassFollow
            | MissionState::WindFollow => self.track_navigator()?,
            MissionState::Complete | MissionState::Terminated | MissionState::Failure => {
                log::debug!("mission in terminal state {:?}", status.state);
                self.pause(TERMINAL_POLL);
            }
        }
        Ok(())
    }

    /// A valid fix has been seen and the controller has reported uptime.
    fn boat_ready(&self) -> Result<bool> {
        let gps = self.store.load::<GpsFix>()?;
        let otto = self.store.load::<OttoState>()?;
        Ok(gps.valid && otto.otto_timestamp > 0)
    }

    /// Sound the buzzer, confirm the controller is still talking, then
    /// commence under compass steering.
    fn start_test(&mut self) -> Result<()> {
        let before = self.store.counter::<OttoState>()?;
        let _ = self.otto.buzzer(START_TEST_CHIRP);

        self.pause(Duration::from_secs(2));
        if self.shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }

        if self.store.counter::<OttoState>()? == before {
            log::warn!("controller went quiet during start test, waiting");
            return Ok(());
        }

        log::info!("start test passed, mission commencing");
        alarm::raise(&self.store, alarm::MISSION_COMMENCE)?;
        let _ = self.otto.mission_control(1);
        self.transition(|status| {
            status.state = MissionState::CompassFollow;
            status.start_time = now_timestamp();
        })
    }

    /// Apply navigator events while the boat is under way.
    fn track_navigator(&mut self) -> Result<()> {
        let event = match self.events.recv_timeout(EVENT_TIMEOUT) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                // Nothing new; persist the step anyway.
                let status = self.store.load::<MissionStatus>()?;
                self.store.save(&status)?;
                return Ok(());
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(crate::error::Error::Other(
                    "navigator event channel closed".to_string(),
                ))
            }
        };

        match event {
            NavEvent::Advanced { index } => {
                // The navigator repeats this until it sees the update land.
                let status = self.store.load::<MissionStatus>()?;
                if status.current_waypoint != index as i32 {
                    log::info!("now sailing for waypoint {}", index);
                }
                self.transition(|status| status.current_waypoint = index as i32)?;
            }
            NavEvent::WaypointReached { index, name } => {
                log::info!("waypoint {} \"{}\" achieved", index, name);
                let status = self.store.load::<MissionStatus>()?;
                self.store.save_and_publish(&status)?;
            }
            NavEvent::Tacking => log::info!("navigator committed to a tack"),
            NavEvent::Stalled => {
                log::warn!("navigator stalled, boat holding heading");
            }
            NavEvent::Complete => {
                log::info!("all waypoints achieved, mission complete");
                alarm::raise(&self.store, alarm::MISSION_COMPLETE)?;
                let _ = self.otto.mission_control(0);
                self.transition(|status| {
                    status.state = MissionState::Complete;
                    status.end_time = now_timestamp();
                })?;
            }
        }
        Ok(())
    }

    /// On shutdown, an active mission was cut short by the operator.
    fn finish(&mut self) {
        let Ok(status) = self.store.load::<MissionStatus>() else {
            return;
        };
        if status.state.is_active() {
            log::warn!("mission terminated by operator");
            let _ = alarm::raise(&self.store, alarm::MISSION_ABORT);
            let _ = self.otto.mission_control(0);
            let _ = self.transition(|status| {
                status.state = MissionState::Terminated;
                status.end_time = now_timestamp();
            });
        }
    }

    fn transition<F: FnOnce(&mut MissionStatus)>(&self, mutate: F) -> Result<()> {
        self.store.update_and_publish::<MissionStatus, _>(mutate)?;
        Ok(())
    }

    /// Sleep that wakes early on shutdown.
    fn pause(&self, duration: Duration) {
        let deadline = std::time::Instant::now() + duration;
        while std::time::Instant::now() < deadline {
            if self.shutdown.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn harness() -> (Supervisor, crossbeam_channel::Sender<NavEvent>, Arc<Store>) {
        let store = Arc::new(Store::new());
        let (event_tx, event_rx) = unbounded();
        let (otto, _requests) = crate::otto::write_queue();
        let supervisor = Supervisor::new(
            Arc::clone(&store),
            otto,
            event_rx,
            Arc::new(AtomicBool::new(false)),
        );
        (supervisor, event_tx, store)
    }

    #[test]
    fn test_awaiting_advances_when_mission_loaded() {
        let (mut supervisor, _tx, store) = harness();
        supervisor.step().unwrap();
        assert_eq!(
            store.load::<MissionStatus>().unwrap().state,
            MissionState::ReadyToStart
        );
    }

    #[test]
    fn test_ready_waits_for_fix_and_controller() {
        let (mut supervisor, _tx, store) = harness();
        store
            .save(&MissionStatus {
                state: MissionState::ReadyToStart,
                ..MissionStatus::default()
            })
            .unwrap();

        supervisor.step().unwrap();
        assert_eq!(
            store.load::<MissionStatus>().unwrap().state,
            MissionState::ReadyToStart
        );

        store
            .save(&GpsFix {
                valid: true,
                ..GpsFix::default()
            })
            .unwrap();
        store
            .save(&OttoState {
                otto_timestamp: 12,
                ..OttoState::default()
            })
            .unwrap();

        supervisor.step().unwrap();
        assert_eq!(
            store.load::<MissionStatus>().unwrap().state,
            MissionState::StartTest
        );
    }

    #[test]
    fn test_navigator_events_drive_progress() {
        let (mut supervisor, tx, store) = harness();
        store
            .save(&MissionStatus {
                state: MissionState::CompassFollow,
                current_waypoint: 0,
                start_time: 1.0,
                end_time: 0.0,
            })
            .unwrap();

        tx.send(NavEvent::Advanced { index: 1 }).unwrap();
        supervisor.step().unwrap();
        assert_eq!(store.load::<MissionStatus>().unwrap().current_waypoint, 1);

        tx.send(NavEvent::Complete).unwrap();
        supervisor.step().unwrap();
        let status = store.load::<MissionStatus>().unwrap();
        assert_eq!(status.state, MissionState::Complete);
        assert!(status.end_time > 0.0);

        let alarms = store.load::<alarm::AlarmState>().unwrap();
        assert_ne!(alarms.bitmap & alarm::MISSION_COMPLETE, 0);
    }

    #[test]
    fn test_shutdown_terminates_active_mission() {
        let (supervisor, _tx, store) = harness();
        store
            .save(&MissionStatus {
                state: MissionState::WindFollow,
                current_waypoint: 3,
                start_time: 1.0,
                end_time: 0.0,
            })
            .unwrap();

        let mut supervisor = supervisor;
        supervisor.shutdown.store(true, Ordering::Relaxed);
        supervisor.run();

        let status = store.load::<MissionStatus>().unwrap();
        assert_eq!(status.state, MissionState::Terminated);
        let alarms = store.load::<alarm::AlarmState>().unwrap();
        assert_ne!(alarms.bitmap & alarm::MISSION_ABORT, 0);
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let (mut supervisor, tx, store) = harness();
        store
            .save(&MissionStatus {
                state: MissionState::Complete,
                current_waypoint: 5,
                start_time: 1.0,
                end_time: 2.0,
            })
            .unwrap();

        supervisor.shutdown.store(true, Ordering::Relaxed);
        tx.send(NavEvent::Advanced { index: 9 }).unwrap();
        supervisor.run();

        let status = store.load::<MissionStatus>().unwrap();
        assert_eq!(status.state, MissionState::Complete);
        assert_eq!(status.current_waypoint, 5);
    }
}
