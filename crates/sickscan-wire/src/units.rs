//! Fixed-point units used by the device.

/// Device angle units per degree (2^22).
pub const ANGLE_UNITS_PER_DEGREE: f64 = 4_194_304.0;

/// Convert a raw device angle to degrees.
pub fn angle_to_degrees(raw: i32) -> f64 {
    f64::from(raw) / ANGLE_UNITS_PER_DEGREE
}

/// Convert degrees to a raw device angle, rounding to the nearest unit.
///
/// Values outside the representable range saturate.
pub fn degrees_to_angle(degrees: f64) -> i32 {
    (degrees * ANGLE_UNITS_PER_DEGREE).round() as i32
}
