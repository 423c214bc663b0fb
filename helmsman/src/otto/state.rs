//! Mirror of the controller's reported state.

use crate::store::{FieldReader, FieldWriter, Record, Value};

use super::registers::{
    angle_from_register, awa_from_register, rudder_from_register, sail_from_register, OttoMode,
};

/// Number of controller telemetry channels.
pub const TELEMETRY_CHANNELS: usize = 16;

/// The last state reported by the controller over the serial link.
///
/// Actuator and sensor fields are kept in register units exactly as they
/// arrived; the accessors convert to application units. `otto_timestamp`
/// is a 24-bit seconds-since-boot counter, so a value smaller than the
/// previous one means the controller rebooted.
#[derive(Debug, Clone, PartialEq)]
pub struct OttoState {
    /// Raw mode code from the last `!` frame.
    pub mode: u8,
    /// Controller alarm bitmap from the last `$` frame.
    pub alarm_status: u16,
    /// Rudder position, register units (128 = centered).
    pub actual_rudder: u8,
    /// Sail trim, register units (0 = fully in).
    pub actual_sail: u8,
    /// Compass heading, register units (256 counts per circle).
    pub actual_compass: u8,
    /// Apparent wind angle, signed register units.
    pub actual_awa: i8,
    /// Seconds since controller boot (24-bit).
    pub otto_timestamp: u32,
    /// 12-bit telemetry samples by channel.
    pub telemetry: [u16; TELEMETRY_CHANNELS],
}

impl Default for OttoState {
    fn default() -> Self {
        OttoState {
            mode: 0,
            alarm_status: 0,
            actual_rudder: 128,
            actual_sail: 0,
            actual_compass: 0,
            actual_awa: 0,
            otto_timestamp: 0,
            telemetry: [0; TELEMETRY_CHANNELS],
        }
    }
}

impl OttoState {
    pub fn mode(&self) -> OttoMode {
        OttoMode::from_code(self.mode)
    }

    /// Compass heading in radians, [0, 2π).
    pub fn compass_radians(&self) -> f64 {
        angle_from_register(self.actual_compass)
    }

    /// Apparent wind angle in radians, (-π, π].
    pub fn awa_radians(&self) -> f64 {
        awa_from_register(self.actual_awa as u8)
    }

    /// Rudder angle in degrees, [-40, +40].
    pub fn rudder_degrees(&self) -> f64 {
        rudder_from_register(self.actual_rudder)
    }

    /// Sail trim in percent, [0, 100].
    pub fn sail_percent(&self) -> f64 {
        sail_from_register(self.actual_sail)
    }
}

impl Record for OttoState {
    const NAME: &'static str = "ottostate";

    fn pack(&self, fields: &mut FieldWriter<'_>) {
        fields.set("mode", Value::Int(self.mode as i64));
        fields.set("alarm_status", Value::Int(self.alarm_status as i64));
        fields.set("actual_rudder", Value::Int(self.actual_rudder as i64));
        fields.set("actual_sail", Value::Int(self.actual_sail as i64));
        fields.set("actual_compass", Value::Int(self.actual_compass as i64));
        fields.set("actual_awa", Value::Int(self.actual_awa as i64));
        fields.set("otto_timestamp", Value::Int(self.otto_timestamp as i64));
        fields.set_array(
            "telemetry",
            self.telemetry.iter().map(|&t| Value::Int(t as i64)),
        );
    }

    fn unpack(fields: &FieldReader<'_>) -> Self {
        let samples: [i64; TELEMETRY_CHANNELS] = fields.array("telemetry", 0);
        let mut telemetry = [0u16; TELEMETRY_CHANNELS];
        for (slot, sample) in telemetry.iter_mut().zip(samples) {
            *slot = sample as u16;
        }

        OttoState {
            mode: fields.i64("mode", 0) as u8,
            alarm_status: fields.i64("alarm_status", 0) as u16,
            actual_rudder: fields.i64("actual_rudder", 128) as u8,
            actual_sail: fields.i64("actual_sail", 0) as u8,
            actual_compass: fields.i64("actual_compass", 0) as u8,
            actual_awa: fields.i64("actual_awa", 0) as i8,
            otto_timestamp: fields.i64("otto_timestamp", 0) as u32,
            telemetry,
        }
    }
}
