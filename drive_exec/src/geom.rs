//! # Planar geometry
//!
//! Poses and twists in the field plane. Poses are composed with twists using
//! the exponential map, which is exact for motion of constant curvature over
//! the twist.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use util::maths::angle_modulus;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this angle the series expansions of the exp/log maps are used.
const SMALL_ANGLE_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position and heading of the robot body frame in the field frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2 {
    /// Position of the robot centre.
    ///
    /// Units: meters,
    /// Frame: Field
    pub position_m: Vector2<f64>,

    /// Heading of the robot, anticlockwise from the field X axis, in (-pi, pi].
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A motion delta expressed in the frame of the pose it starts from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2 {
    /// Units: meters
    pub dx_m: f64,

    /// Units: meters
    pub dy_m: f64,

    /// Units: radians
    pub dtheta_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose2 {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: angle_modulus(heading_rad),
        }
    }

    pub fn identity() -> Self {
        Self {
            position_m: Vector2::zeros(),
            heading_rad: 0.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.position_m[0]
    }

    pub fn y(&self) -> f64 {
        self.position_m[1]
    }

    /// Apply `other` as a transform expressed in this pose's frame.
    pub fn transform_by(&self, other: &Pose2) -> Pose2 {
        Pose2 {
            position_m: self.position_m + rotate(&other.position_m, self.heading_rad),
            heading_rad: angle_modulus(self.heading_rad + other.heading_rad),
        }
    }

    /// Express this pose in the frame of `origin`.
    pub fn relative_to(&self, origin: &Pose2) -> Pose2 {
        Pose2 {
            position_m: rotate(&(self.position_m - origin.position_m), -origin.heading_rad),
            heading_rad: angle_modulus(self.heading_rad - origin.heading_rad),
        }
    }

    /// The inverse transform, such that `p.transform_by(&p.inverse())` is the
    /// identity.
    pub fn inverse(&self) -> Pose2 {
        Pose2 {
            position_m: rotate(&(-self.position_m), -self.heading_rad),
            heading_rad: angle_modulus(-self.heading_rad),
        }
    }

    /// Follow the constant-curvature arc described by `twist` from this pose.
    pub fn exp(&self, twist: &Twist2) -> Pose2 {
        let dtheta = twist.dtheta_rad;
        let sin_theta = dtheta.sin();
        let cos_theta = dtheta.cos();

        let (s, c) = if dtheta.abs() < SMALL_ANGLE_RAD {
            (1.0 - dtheta * dtheta / 6.0, 0.5 * dtheta)
        }
        else {
            (sin_theta / dtheta, (1.0 - cos_theta) / dtheta)
        };

        let delta = Pose2 {
            position_m: Vector2::new(
                twist.dx_m * s - twist.dy_m * c,
                twist.dx_m * c + twist.dy_m * s,
            ),
            heading_rad: angle_modulus(dtheta),
        };

        self.transform_by(&delta)
    }

    /// The twist which takes this pose to `end`, i.e. the inverse of `exp`.
    pub fn log(&self, end: &Pose2) -> Twist2 {
        let transform = end.relative_to(self);
        let dtheta = transform.heading_rad;
        let half_dtheta = 0.5 * dtheta;
        let cos_minus_one = dtheta.cos() - 1.0;

        let half_theta_by_tan = if cos_minus_one.abs() < SMALL_ANGLE_RAD {
            1.0 - dtheta * dtheta / 12.0
        }
        else {
            -(half_dtheta * dtheta.sin()) / cos_minus_one
        };

        let t = transform.position_m;

        Twist2 {
            dx_m: half_theta_by_tan * t[0] + half_dtheta * t[1],
            dy_m: -half_dtheta * t[0] + half_theta_by_tan * t[1],
            dtheta_rad: dtheta,
        }
    }

    /// Interpolate along the twist between this pose and `end`.
    ///
    /// `frac` is clamped to [0, 1].
    pub fn interpolate(&self, end: &Pose2, frac: f64) -> Pose2 {
        if frac <= 0.0 {
            *self
        }
        else if frac >= 1.0 {
            *end
        }
        else {
            self.exp(&self.log(end).scaled(frac))
        }
    }

    /// Euclidean distance between the two positions.
    pub fn distance_m(&self, other: &Pose2) -> f64 {
        (other.position_m - self.position_m).norm()
    }
}

impl Twist2 {
    pub fn new(dx_m: f64, dy_m: f64, dtheta_rad: f64) -> Self {
        Self {
            dx_m,
            dy_m,
            dtheta_rad,
        }
    }

    pub fn scaled(&self, k: f64) -> Twist2 {
        Twist2 {
            dx_m: self.dx_m * k,
            dy_m: self.dy_m * k,
            dtheta_rad: self.dtheta_rad * k,
        }
    }

    /// Length of the translational part.
    pub fn norm(&self) -> f64 {
        self.dx_m.hypot(self.dy_m)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotate a vector anticlockwise by the given angle.
pub fn rotate(vec: &Vector2<f64>, angle_rad: f64) -> Vector2<f64> {
    Rotation2::new(angle_rad) * vec
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_pose_eq(a: &Pose2, b: &Pose2) {
        assert_abs_diff_eq!(a.x(), b.x(), epsilon = 1e-9);
        assert_abs_diff_eq!(a.y(), b.y(), epsilon = 1e-9);
        assert_abs_diff_eq!(angle_modulus(a.heading_rad - b.heading_rad), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_exp_quarter_circle() {
        // Driving a quarter circle of radius 1 to the left
        let start = Pose2::identity();
        let end = start.exp(&Twist2::new(FRAC_PI_2, 0.0, FRAC_PI_2));

        assert_pose_eq(&end, &Pose2::new(1.0, 1.0, FRAC_PI_2));
    }

    #[test]
    fn test_exp_log_inverse() {
        let start = Pose2::new(1.5, -2.0, 0.7);
        let end = Pose2::new(-0.3, 4.0, -2.9);

        let twist = start.log(&end);
        assert_pose_eq(&start.exp(&twist), &end);

        // Straight line has a pure translation twist
        let twist = Pose2::new(0.0, 0.0, PI).log(&Pose2::new(-2.0, 0.0, PI));
        assert_abs_diff_eq!(twist.dx_m, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(twist.dy_m, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(twist.dtheta_rad, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_relative_and_inverse() {
        let a = Pose2::new(1.0, 2.0, FRAC_PI_2);
        let b = Pose2::new(1.0, 3.0, PI);

        let rel = b.relative_to(&a);
        assert_pose_eq(&rel, &Pose2::new(1.0, 0.0, FRAC_PI_2));
        assert_pose_eq(&a.transform_by(&rel), &b);
        assert_pose_eq(&a.transform_by(&a.inverse()), &Pose2::identity());
    }

    #[test]
    fn test_interpolate() {
        let a = Pose2::identity();
        let b = a.exp(&Twist2::new(2.0, 0.0, 1.0));

        let mid = a.interpolate(&b, 0.5);
        assert_pose_eq(&mid, &a.exp(&Twist2::new(1.0, 0.0, 0.5)));
        assert_pose_eq(&a.interpolate(&b, 1.5), &b);
        assert_pose_eq(&a.interpolate(&b, -1.0), &a);
    }
}
