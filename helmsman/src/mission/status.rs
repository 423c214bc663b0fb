//! Mission lifecycle record.

use crate::store::{FieldReader, FieldWriter, Record, Value};

/// Mission lifecycle states.
///
/// ```text
/// AWAITING -> READY_TO_START -> START_TEST -> {RADIO_CONTROL |
/// COMPASS_FOLLOW | WIND_FOLLOW} -> COMPLETE
/// ```
///
/// Any active state can fall to TERMINATED (operator) and any state to
/// FAILURE (unrecoverable error). The terminal states are permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MissionState {
    #[default]
    Awaiting = 0,
    ReadyToStart = 1,
    StartTest = 2,
    RadioControl = 3,
    CompassFollow = 4,
    WindFollow = 5,
    Complete = 6,
    Terminated = 7,
    Failure = 8,
}

impl MissionState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => MissionState::ReadyToStart,
            2 => MissionState::StartTest,
            3 => MissionState::RadioControl,
            4 => MissionState::CompassFollow,
            5 => MissionState::WindFollow,
            6 => MissionState::Complete,
            7 => MissionState::Terminated,
            8 => MissionState::Failure,
            _ => MissionState::Awaiting,
        }
    }

    /// The boat is under way: START_TEST up to but excluding COMPLETE.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MissionState::StartTest
                | MissionState::RadioControl
                | MissionState::CompassFollow
                | MissionState::WindFollow
        )
    }

    /// No further transitions leave this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MissionState::Complete | MissionState::Terminated | MissionState::Failure
        )
    }
}

/// The persisted mission progress record.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionStatus {
    pub state: MissionState,
    /// Index into the attractor list; -1 until the mission begins.
    pub current_waypoint: i32,
    /// Epoch seconds; 0 until set.
    pub start_time: f64,
    pub end_time: f64,
}

impl Default for MissionStatus {
    fn default() -> Self {
        MissionStatus {
            state: MissionState::Awaiting,
            current_waypoint: -1,
            start_time: 0.0,
            end_time: 0.0,
        }
    }
}

impl Record for MissionStatus {
    const NAME: &'static str = "missionstatus";

    fn pack(&self, fields: &mut FieldWriter<'_>) {
        fields.set("state", Value::Int(self.state.code() as i64));
        fields.set(
            "current_waypoint",
            Value::Int(self.current_waypoint as i64),
        );
        fields.set("start_time", Value::Timestamp(self.start_time));
        fields.set("end_time", Value::Timestamp(self.end_time));
    }

    fn unpack(fields: &FieldReader<'_>) -> Self {
        MissionStatus {
            state: MissionState::from_code(fields.i64("state", 0) as u8),
            current_waypoint: fields.i64("current_waypoint", -1) as i32,
            start_time: fields.f64("start_time", 0.0),
            end_time: fields.f64("end_time", 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn test_active_band() {
        assert!(!MissionState::Awaiting.is_active());
        assert!(!MissionState::ReadyToStart.is_active());
        assert!(MissionState::StartTest.is_active());
        assert!(MissionState::RadioControl.is_active());
        assert!(MissionState::CompassFollow.is_active());
        assert!(MissionState::WindFollow.is_active());
        assert!(!MissionState::Complete.is_active());
        assert!(!MissionState::Terminated.is_active());
        assert!(!MissionState::Failure.is_active());
    }

    #[test]
    fn test_code_round_trip() {
        for code in 0..=8u8 {
            assert_eq!(MissionState::from_code(code).code(), code);
        }
        assert_eq!(MissionState::from_code(200), MissionState::Awaiting);
    }

    #[test]
    fn test_store_round_trip_and_defaults() {
        let store = Store::new();
        assert_eq!(
            store.load::<MissionStatus>().unwrap(),
            MissionStatus::default()
        );

        let status = MissionStatus {
            state: MissionState::CompassFollow,
            current_waypoint: 2,
            start_time: 1_785_582_000.0,
            end_time: 0.0,
        };
        store.save(&status).unwrap();
        assert_eq!(store.load::<MissionStatus>().unwrap(), status);
    }
}
