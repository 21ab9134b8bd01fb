//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;
use std::f64::consts::{PI, TAU};

/// Limit a value to the range [min, max].
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Zero the value if its magnitude is below the deadband.
pub fn apply_deadband(value: f64, deadband: f64) -> f64 {
    if value.abs() < deadband {
        0.0
    }
    else {
        value
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle into the range (-pi, pi].
///
/// Angle differences passed through this give the shortest signed rotation.
pub fn angle_modulus(angle_rad: f64) -> f64 {
    let wrapped = wrap_to_pi(angle_rad);

    if wrapped <= -PI {
        PI
    }
    else {
        wrapped
    }
}

/// Wrap an angle into the range [-pi, pi).
pub fn wrap_to_pi(angle_rad: f64) -> f64 {
    let wrapped = rem_euclid(angle_rad + PI, TAU) - PI;

    // Round-off in rem_euclid can land exactly on the open end
    if wrapped >= PI {
        wrapped - TAU
    }
    else {
        wrapped
    }
}

/// Return the angle equivalent to `target_rad` (modulo 2pi) which is closest to
/// `measurement_rad`.
///
/// Used to pick a goal for a controller operating on an unwrapped angle so
/// that it always takes the short way round.
pub fn get_min_distance(measurement_rad: f64, target_rad: f64) -> f64 {
    target_rad + TAU * ((measurement_rad - target_rad) / TAU).round()
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_angle_modulus() {
        assert_abs_diff_eq!(angle_modulus(0.5), 0.5);
        assert_abs_diff_eq!(angle_modulus(PI), PI);
        assert_abs_diff_eq!(angle_modulus(-PI), PI);
        assert_abs_diff_eq!(angle_modulus(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_modulus(-5.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_modulus(TAU + 0.1), 0.1, epsilon = 1e-12);

        assert_abs_diff_eq!(wrap_to_pi(PI), -PI);
        assert_abs_diff_eq!(wrap_to_pi(-PI), -PI);
    }

    #[test]
    fn test_get_min_distance() {
        // Already close
        assert_abs_diff_eq!(get_min_distance(0.0, 0.5), 0.5);

        // Measurement has wound up several turns
        assert_abs_diff_eq!(get_min_distance(4.0 * PI + 0.1, 0.0), 4.0 * PI, epsilon = 1e-12);

        // Crossing the -pi/pi boundary goes the short way
        assert_abs_diff_eq!(get_min_distance(3.0, -3.0), TAU - 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(get_min_distance(-3.0, 3.0), 3.0 - TAU, epsilon = 1e-12);
    }

    #[test]
    fn test_clamp_and_deadband() {
        assert_eq!(clamp(&2.0, &-1.0, &1.0), 1.0);
        assert_eq!(clamp(&-2.0, &-1.0, &1.0), -1.0);
        assert_eq!(clamp(&0.25, &-1.0, &1.0), 0.25);
        assert_eq!(apply_deadband(0.04, 0.05), 0.0);
        assert_eq!(apply_deadband(-0.06, 0.05), -0.06);
    }
}
