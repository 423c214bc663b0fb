//! Angle helpers shared by every other module.

use std::f64::consts::{PI, TAU};

/// Convert degrees to radians.
#[inline]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Convert radians to degrees.
#[inline]
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Normalize an angle into [0, 2π).
#[inline]
pub fn absolute(theta: f64) -> f64 {
    let wrapped = (theta % TAU + TAU) % TAU;
    // The fold above can land exactly on 2π for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Normalize an angle into (-π, π].
#[inline]
pub fn normalize_pi(theta: f64) -> f64 {
    let wrapped = absolute(theta);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Smallest absolute angular difference between two angles, in [0, π].
#[inline]
pub fn separation(a: f64, b: f64) -> f64 {
    normalize_pi(a - b).abs()
}
