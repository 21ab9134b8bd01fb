//! Desaturation of infeasible demands
//!
//! Three policies are provided and each call site picks one explicitly:
//!
//! - `desaturate_wheel_speeds` scales all module speeds by the same factor,
//!   preserving the shape of the commanded motion.
//! - `SwerveKinematics::analytic_desaturation` scales translation and
//!   rotation of a body velocity together, preserving their ratio.
//! - `SwerveKinematics::prefer_rotation` keeps the rotation and gives the
//!   translation whatever capability is left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{ModuleState, PlanarVelocity, SwerveKinematics};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Speeds below this are treated as zero.
const SPEED_EPS: f64 = 1e-12;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Uniformly scale all module speeds so none exceeds `max_speed_ms`.
///
/// Returns true if the speeds were scaled. Already feasible states are left
/// untouched, so applying this twice is the same as applying it once.
pub fn desaturate_wheel_speeds(states: &mut [ModuleState], max_speed_ms: f64) -> bool {
    let real_max = states
        .iter()
        .map(|s| s.speed_ms.abs())
        .fold(0.0, f64::max);

    if real_max <= max_speed_ms {
        return false;
    }

    let scale = max_speed_ms / real_max;
    for state in states.iter_mut() {
        state.speed_ms *= scale;
    }

    true
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    /// Scale a velocity so that translation plus rotation is feasible,
    /// keeping the ratio between the two.
    ///
    /// Feasibility is judged against the linear trade-off between full speed
    /// translation and full rate rotation.
    pub fn analytic_desaturation<V: PlanarVelocity>(&self, vel: V) -> V {
        let max_v = self.limits().max_drive_velocity_ms;
        let max_omega = self.max_angular_speed_rads();

        let (vx, vy, omega) = vel.components();
        let xy_speed = vel.speed_ms();

        // Negative if the translation alone is already too fast
        let omega_for_speed = max_omega * (1.0 - xy_speed / max_v);
        if omega.abs() <= omega_for_speed {
            return vel;
        }

        if xy_speed < SPEED_EPS {
            return V::from_components(0.0, 0.0, clamp(&omega, &-max_omega, &max_omega));
        }

        if omega.abs() < SPEED_EPS {
            let xy_scale = (max_v / xy_speed).min(1.0);
            return V::from_components(vx * xy_scale, vy * xy_scale, 0.0);
        }

        // Largest speed on the feasible line with the same omega/speed ratio
        let v = max_omega * xy_speed * max_v / (max_omega * xy_speed + omega.abs() * max_v);
        let scale = v / xy_speed;

        V::from_components(vx * scale, vy * scale, omega * scale)
    }

    /// Keep the commanded rotation (clamped to the maximum rate) and scale the
    /// translation down into the remaining capability.
    pub fn prefer_rotation<V: PlanarVelocity>(&self, vel: V) -> V {
        let max_v = self.limits().max_drive_velocity_ms;
        let max_omega = self.max_angular_speed_rads();

        let (vx, vy, omega) = vel.components();
        let omega = clamp(&omega, &-max_omega, &max_omega);
        let xy_speed = vel.speed_ms();

        let omega_ratio = omega.abs() / max_omega;
        let xy_ratio = xy_speed / max_v;
        let available_ratio = 1.0 - omega_ratio;

        if xy_ratio <= available_ratio || xy_speed < SPEED_EPS {
            return V::from_components(vx, vy, omega);
        }

        let scale = available_ratio * max_v / xy_speed;

        V::from_components(vx * scale, vy * scale, omega)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::{test_kinematics, ChassisSpeeds, FieldRelativeVelocity};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_desaturate_wheel_speeds() {
        let kin = test_kinematics();
        let max = kin.limits().max_drive_velocity_ms;

        let mut states = kin.to_module_states(&ChassisSpeeds::new(4.0, 1.0, 5.0));
        let before = states;

        assert!(desaturate_wheel_speeds(&mut states, max));

        // Nothing above the limit and the fastest is at it
        let fastest = states.iter().map(|s| s.speed_ms.abs()).fold(0.0, f64::max);
        assert_abs_diff_eq!(fastest, max, epsilon = 1e-12);

        // Angles untouched and speeds scaled by a common factor
        let scale = states[0].speed_ms / before[0].speed_ms;
        for (s, b) in states.iter().zip(before.iter()) {
            assert_eq!(s.angle_rad, b.angle_rad);
            assert_abs_diff_eq!(s.speed_ms, b.speed_ms * scale, epsilon = 1e-12);
        }

        // Idempotent
        let once = states;
        assert!(!desaturate_wheel_speeds(&mut states, max));
        assert_eq!(states, once);
    }

    #[test]
    fn test_desaturate_noop_when_feasible() {
        let kin = test_kinematics();
        let mut states = kin.to_module_states(&ChassisSpeeds::new(1.0, -0.5, 0.3));
        let before = states;

        assert!(!desaturate_wheel_speeds(&mut states, 4.5));
        assert_eq!(states, before);
    }

    #[test]
    fn test_analytic_desaturation() {
        let kin = test_kinematics();
        let max_v = kin.limits().max_drive_velocity_ms;
        let max_omega = kin.max_angular_speed_rads();

        // Feasible input is returned unchanged
        let v = FieldRelativeVelocity::new(1.0, 0.0, 1.0);
        assert_eq!(kin.analytic_desaturation(v), v);

        // Too fast in translation alone
        let v = kin.analytic_desaturation(FieldRelativeVelocity::new(10.0, 0.0, 0.0));
        assert_abs_diff_eq!(v.vx_ms, max_v);

        // Combined motion lands on the feasible line, preserving the ratio
        let input = ChassisSpeeds::new(4.0, 0.0, 10.0);
        let v = kin.analytic_desaturation(input);
        assert_abs_diff_eq!(v.vx_ms / max_v + v.omega_rads / max_omega, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v.omega_rads / v.vx_ms, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_prefer_rotation() {
        let kin = test_kinematics();
        let max_v = kin.limits().max_drive_velocity_ms;
        let max_omega = kin.max_angular_speed_rads();

        // Half the rotation capability leaves half the translation
        let v = kin.prefer_rotation(FieldRelativeVelocity::new(0.0, -max_v, 0.5 * max_omega));
        assert_abs_diff_eq!(v.omega_rads, 0.5 * max_omega);
        assert_abs_diff_eq!(v.vy_ms, -0.5 * max_v, epsilon = 1e-9);
        assert_abs_diff_eq!(v.vx_ms, 0.0);

        // Idempotent
        let again = kin.prefer_rotation(v);
        assert_abs_diff_eq!(again.vy_ms, v.vy_ms, epsilon = 1e-12);
        assert_abs_diff_eq!(again.omega_rads, v.omega_rads);

        // Negative rotation is treated the same way
        let v = kin.prefer_rotation(FieldRelativeVelocity::new(max_v, 0.0, -0.25 * max_omega));
        assert_abs_diff_eq!(v.vx_ms, 0.75 * max_v, epsilon = 1e-9);

        // Excess rotation is clamped and leaves no translation
        let v = kin.prefer_rotation(FieldRelativeVelocity::new(1.0, 1.0, 2.0 * max_omega));
        assert_abs_diff_eq!(v.omega_rads, max_omega);
        assert_abs_diff_eq!(v.speed_ms(), 0.0, epsilon = 1e-12);
    }
}
