//! Alarm bitmap shared by the controller and the mission software.
//!
//! Alarms live in a single u16 bitmap record. Controller-side bits arrive
//! in `$` status frames and are OR-merged by the reader; mission-side bits
//! are raised from the navigator and supervisor. Raising goes through
//! [`Store::update_and_publish`] so concurrent raisers cannot lose bits
//! and every write carries its own wakeup.

use crate::error::Result;
use crate::store::{FieldReader, FieldWriter, Record, Store, Value};

pub const MOTHER_UNRESP: u16 = 0x0001;
pub const OTTO_RESTART: u16 = 0x0002;
pub const GPS_INVALID: u16 = 0x0004;
pub const WAYPOINT_REACHED: u16 = 0x0008;
pub const MISSION_COMMENCE: u16 = 0x0010;
pub const MISSION_COMPLETE: u16 = 0x0020;
pub const MISSION_ABORT: u16 = 0x0040;
pub const CROSS_TRACK_ERROR: u16 = 0x0080;
pub const INSIDE_FENCE: u16 = 0x0100;
/// Planner found no sailable candidate heading at all.
pub const NAV_STALLED: u16 = 0x0200;

/// Human-readable names for set bits, for logs.
pub fn describe(bitmap: u16) -> String {
    const NAMES: [(u16, &str); 10] = [
        (MOTHER_UNRESP, "MOTHER_UNRESP"),
        (OTTO_RESTART, "OTTO_RESTART"),
        (GPS_INVALID, "GPS_INVALID"),
        (WAYPOINT_REACHED, "WAYPOINT_REACHED"),
        (MISSION_COMMENCE, "MISSION_COMMENCE"),
        (MISSION_COMPLETE, "MISSION_COMPLETE"),
        (MISSION_ABORT, "MISSION_ABORT"),
        (CROSS_TRACK_ERROR, "CROSS_TRACK_ERROR"),
        (INSIDE_FENCE, "INSIDE_FENCE"),
        (NAV_STALLED, "NAV_STALLED"),
    ];

    let names: Vec<&str> = NAMES
        .iter()
        .filter(|(bit, _)| bitmap & bit != 0)
        .map(|&(_, name)| name)
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join("|")
    }
}

/// The persisted alarm bitmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmState {
    pub bitmap: u16,
}

impl Record for AlarmState {
    const NAME: &'static str = "alarmstate";

    fn pack(&self, fields: &mut FieldWriter<'_>) {
        fields.set("bitmap", Value::Int(self.bitmap as i64));
    }

    fn unpack(fields: &FieldReader<'_>) -> Self {
        AlarmState {
            bitmap: fields.i64("bitmap", 0) as u16,
        }
    }
}

/// Set alarm bits and publish. Returns the bits that were newly set.
pub fn raise(store: &Store, bits: u16) -> Result<u16> {
    let mut newly = 0;
    store.update_and_publish::<AlarmState, _>(|state| {
        newly = bits & !state.bitmap;
        state.bitmap |= bits;
    })?;
    if newly != 0 {
        log::warn!("alarm raised: {}", describe(newly));
    }
    Ok(newly)
}

/// Clear alarm bits and publish.
pub fn clear(store: &Store, bits: u16) -> Result<()> {
    let mut changed = false;
    store.update_and_publish::<AlarmState, _>(|state| {
        changed = state.bitmap & bits != 0;
        state.bitmap &= !bits;
    })?;
    if changed {
        log::info!("alarm cleared: {}", describe(bits));
    }
    Ok(())
}
