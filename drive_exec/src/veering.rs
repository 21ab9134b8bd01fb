//! Veering correction
//!
//! A field relative demand is converted to the robot frame using the heading
//! at the time of the command, but the robot keeps turning until the demand
//! takes effect. Left alone the translation then veers in the direction of
//! rotation. The correction converts using the heading the robot is expected
//! to have once the command takes effect instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::kinematics::{ChassisSpeeds, FieldRelativeVelocity};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a field relative demand into the robot frame, allowing for the
/// robot turning at `heading_rate_rads` over `latency_s`.
pub fn correct_field_relative(
    demand: &FieldRelativeVelocity,
    heading_rad: f64,
    heading_rate_rads: f64,
    latency_s: f64,
) -> ChassisSpeeds {
    ChassisSpeeds::from_field_relative(demand, heading_rad + heading_rate_rads * latency_s)
}

/// Correct a robot relative demand which was computed for the robot's current
/// heading.
pub fn correct_chassis(speeds: &ChassisSpeeds, heading_rate_rads: f64, latency_s: f64) -> ChassisSpeeds {
    correct_field_relative(&speeds.to_field_relative(0.0), 0.0, heading_rate_rads, latency_s)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_no_rotation_no_correction() {
        let demand = FieldRelativeVelocity::new(1.0, 0.5, 0.0);
        let corrected = correct_field_relative(&demand, 0.3, 0.0, 0.1);
        let plain = ChassisSpeeds::from_field_relative(&demand, 0.3);

        assert_abs_diff_eq!(corrected.vx_ms, plain.vx_ms);
        assert_abs_diff_eq!(corrected.vy_ms, plain.vy_ms);
    }

    #[test]
    fn test_turning_left_leans_right() {
        // Driving field +x while facing +x and turning left
        let demand = FieldRelativeVelocity::new(1.0, 0.0, 2.0);
        let corrected = correct_field_relative(&demand, 0.0, 2.0, 0.05);

        // Rotated by -0.1 rad in the robot frame
        assert_abs_diff_eq!(corrected.vx_ms, 0.1f64.cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(corrected.vy_ms, -0.1f64.sin(), epsilon = 1e-12);
        assert_abs_diff_eq!(corrected.omega_rads, 2.0);

        let chassis = correct_chassis(&ChassisSpeeds::new(1.0, 0.0, 2.0), 2.0, 0.05);
        assert_abs_diff_eq!(chassis.vy_ms, corrected.vy_ms, epsilon = 1e-12);
    }
}
