//! Register map and unit scaling for the low-level controller.
//!
//! The register numbering and the scaling constants are part of the wire
//! contract with the controller firmware and must match it bit-for-bit.

use std::f64::consts::PI;

use pelorus::angle::{absolute, normalize_pi};

/// Writable controller registers, in wire numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    AlarmClear = 0,
    MissionControl = 1,
    Mode = 2,
    Buzzer = 3,
    RudderAngle = 4,
    SailAngle = 5,
    CompassHeading = 6,
    MinCompass = 7,
    MaxCompass = 8,
    AwaHeading = 9,
    MinAwa = 10,
    MaxAwa = 11,
    WakeDuration = 12,
    NextWakeup = 13,
    RudderPidP = 14,
    RudderPidI = 15,
    RudderPidD = 16,
    RudderPidENum = 17,
    RudderPidEDen = 18,
    RudderPidUDiv = 19,
    SailMxcM = 20,
    SailMxcC = 21,
    SailMxcUDiv = 22,
}

impl Register {
    /// Decimal register number on the wire.
    pub fn number(self) -> u8 {
        self as u8
    }
}

/// Controller operating modes, as carried by `!` frames and the MODE
/// register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OttoMode {
    #[default]
    Idle = 0,
    /// Rudder and sail positions commanded directly.
    Manual = 1,
    /// Controller holds a compass heading.
    TrackCompass = 2,
    /// Controller holds an apparent wind angle.
    TrackAwa = 3,
}

impl OttoMode {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Unknown codes decode to Idle; the raw byte is kept in OttoState.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => OttoMode::Manual,
            2 => OttoMode::TrackCompass,
            3 => OttoMode::TrackAwa,
            _ => OttoMode::Idle,
        }
    }
}

/// Rudder scale factor: register counts per degree.
const RUDDER_SCALE: f64 = 3.175;
/// Sail scale factor: register counts per percent.
const SAIL_SCALE: f64 = 2.55;
/// Angle scale: 256 register counts per full circle.
const ANGLE_SCALE: f64 = 128.0 / PI;

/// Rudder degrees in [-40, +40] to register counts, clamped.
pub fn rudder_to_register(degrees: f64) -> u8 {
    (RUDDER_SCALE * degrees.clamp(-40.0, 40.0) + 128.0).round() as u8
}

/// Register counts back to rudder degrees.
pub fn rudder_from_register(value: u8) -> f64 {
    (value as f64 - 128.0) / RUDDER_SCALE
}

/// Sail percent in [0, 100] to register counts.
pub fn sail_to_register(percent: f64) -> u8 {
    (SAIL_SCALE * percent.clamp(0.0, 100.0)).round() as u8
}

/// Register counts back to sail percent.
pub fn sail_from_register(value: u8) -> f64 {
    value as f64 / SAIL_SCALE
}

/// Absolute angle in radians to register counts; 0 maps to north and the
/// encoding wraps mod 256.
pub fn angle_to_register(radians: f64) -> u8 {
    ((absolute(radians) * ANGLE_SCALE).round() as i64 & 0xFF) as u8
}

/// Register counts back to an absolute angle.
pub fn angle_from_register(value: u8) -> f64 {
    value as f64 / ANGLE_SCALE
}

/// Signed apparent wind angle in (-π, π] to register counts
/// (two's-complement 8-bit).
pub fn awa_to_register(radians: f64) -> u8 {
    (normalize_pi(radians) * ANGLE_SCALE).round() as i32 as u8
}

/// Register counts back to a signed apparent wind angle; values above 128
/// are negative.
pub fn awa_from_register(value: u8) -> f64 {
    (value as i8) as f64 / ANGLE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_numbering_matches_wire_contract() {
        assert_eq!(Register::AlarmClear.number(), 0);
        assert_eq!(Register::RudderAngle.number(), 4);
        assert_eq!(Register::SailAngle.number(), 5);
        assert_eq!(Register::CompassHeading.number(), 6);
        assert_eq!(Register::AwaHeading.number(), 9);
        assert_eq!(Register::NextWakeup.number(), 13);
        assert_eq!(Register::RudderPidUDiv.number(), 19);
        assert_eq!(Register::SailMxcUDiv.number(), 22);
    }

    #[test]
    fn test_rudder_scaling_endpoints() {
        assert_eq!(rudder_to_register(0.0), 128);
        assert_eq!(rudder_to_register(40.0), 255);
        assert_eq!(rudder_to_register(-40.0), 1);
        assert_eq!(rudder_to_register(90.0), 255);
        assert!((rudder_from_register(255) - 40.0).abs() < 1e-9);
        assert!((rudder_from_register(1) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_rudder_register_round_trip() {
        for value in 1..=255u8 {
            assert_eq!(rudder_to_register(rudder_from_register(value)), value);
        }
    }

    #[test]
    fn test_sail_register_round_trip() {
        assert_eq!(sail_to_register(0.0), 0);
        assert_eq!(sail_to_register(100.0), 255);
        for value in 0..=255u8 {
            assert_eq!(sail_to_register(sail_from_register(value)), value);
        }
    }

    #[test]
    fn test_compass_register_round_trip() {
        assert_eq!(angle_to_register(0.0), 0);
        assert_eq!(angle_to_register(std::f64::consts::PI), 128);
        assert_eq!(angle_to_register(std::f64::consts::TAU), 0);
        for value in 0..=255u8 {
            assert_eq!(angle_to_register(angle_from_register(value)), value);
        }
    }

    #[test]
    fn test_awa_register_round_trip_with_sign() {
        assert_eq!(awa_to_register(0.0), 0);
        assert!(awa_from_register(200) < 0.0);
        assert!(awa_from_register(100) > 0.0);
        for value in 0..=255u8 {
            assert_eq!(awa_to_register(awa_from_register(value)), value);
        }
    }

    #[test]
    fn test_conversion_quantization_error_is_bounded() {
        let step = std::f64::consts::PI / 128.0;
        for i in 0..100 {
            let angle = i as f64 * 0.06;
            let err = pelorus::angle::separation(angle, angle_from_register(angle_to_register(angle)));
            assert!(err <= step / 2.0 + 1e-9, "error {} at {}", err, angle);
        }
    }
}
