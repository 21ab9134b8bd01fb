//! Timing constraints applied during time parameterisation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

// Internal
use super::PoseWithMotion;
use crate::kinematics::{ChassisSpeeds, SwerveKinematics};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Allowed range of acceleration along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxAccel {
    /// Units: meters/second^2
    pub min_mss: f64,

    /// Units: meters/second^2
    pub max_mss: f64,
}

/// Limits speed through curves so that the centripetal acceleration stays
/// below a maximum.
#[derive(Debug, Clone, Copy)]
pub struct CentripetalAccelerationConstraint {
    /// Units: meters/second^2
    max_centripetal_accel_mss: f64,
}

/// Limits imposed by the swerve modules themselves.
///
/// Rotating while translating puts some modules above the path speed, and a
/// change of course must be followed by the steering.
#[derive(Debug, Clone)]
pub struct SwerveDriveDynamicsConstraint {
    kinematics: Arc<SwerveKinematics>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A limit on how fast a point on the path may be traversed.
pub trait TimingConstraint: Send + Sync {
    /// Maximum speed along the path at this point.
    ///
    /// Units: meters/second
    fn max_velocity(&self, point: &PoseWithMotion) -> f64;

    /// Acceleration range along the path at this point when moving at
    /// `velocity_ms`.
    fn min_max_accel(&self, point: &PoseWithMotion, velocity_ms: f64) -> MinMaxAccel;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MinMaxAccel {
    pub fn new(min_mss: f64, max_mss: f64) -> Self {
        Self { min_mss, max_mss }
    }

    /// No limit in either direction.
    pub fn unbounded() -> Self {
        Self::new(std::f64::NEG_INFINITY, std::f64::INFINITY)
    }

    pub fn is_valid(&self) -> bool {
        !self.min_mss.is_nan() && !self.max_mss.is_nan() && self.min_mss <= self.max_mss
    }
}

impl CentripetalAccelerationConstraint {
    pub fn new(max_centripetal_accel_mss: f64) -> Self {
        Self {
            max_centripetal_accel_mss,
        }
    }
}

impl TimingConstraint for CentripetalAccelerationConstraint {
    fn max_velocity(&self, point: &PoseWithMotion) -> f64 {
        let curvature = point.curvature_m.abs();
        if curvature < 1e-9 {
            return std::f64::INFINITY;
        }

        (self.max_centripetal_accel_mss / curvature).sqrt()
    }

    fn min_max_accel(&self, _point: &PoseWithMotion, _velocity_ms: f64) -> MinMaxAccel {
        MinMaxAccel::unbounded()
    }
}

impl SwerveDriveDynamicsConstraint {
    pub fn new(kinematics: Arc<SwerveKinematics>) -> Self {
        Self { kinematics }
    }
}

impl TimingConstraint for SwerveDriveDynamicsConstraint {
    fn max_velocity(&self, point: &PoseWithMotion) -> f64 {
        let limits = self.kinematics.limits();

        // Module speeds for travelling at 1 m/s along the path, which scale
        // linearly with path speed
        let motion_direction = point.course_rad - point.pose.heading_rad;
        let unit = ChassisSpeeds::new(
            motion_direction.cos(),
            motion_direction.sin(),
            point.heading_rate_radm,
        );
        let fastest_module = self
            .kinematics
            .to_module_states(&unit)
            .iter()
            .map(|s| s.speed_ms.abs())
            .fold(0.0, f64::max);

        let mut max_vel = limits.max_drive_velocity_ms / fastest_module.max(1e-9);

        // The course turns at curvature times speed, which the steering has to
        // keep up with
        let curvature = point.curvature_m.abs();
        if curvature > 1e-9 {
            max_vel = max_vel.min(limits.max_steering_velocity_rads / curvature);
        }

        max_vel
    }

    fn min_max_accel(&self, _point: &PoseWithMotion, _velocity_ms: f64) -> MinMaxAccel {
        let max_accel = self.kinematics.limits().max_drive_accel_mss;
        MinMaxAccel::new(-max_accel, max_accel)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Pose2;
    use crate::kinematics::test_kinematics;
    use approx::assert_abs_diff_eq;

    fn point(curvature_m: f64, heading_rate_radm: f64) -> PoseWithMotion {
        PoseWithMotion {
            pose: Pose2::identity(),
            course_rad: 0.0,
            curvature_m,
            heading_rate_radm,
        }
    }

    #[test]
    fn test_centripetal() {
        let c = CentripetalAccelerationConstraint::new(2.0);

        assert!(c.max_velocity(&point(0.0, 0.0)).is_infinite());
        assert_abs_diff_eq!(c.max_velocity(&point(0.5, 0.0)), 2.0);
        assert_abs_diff_eq!(c.max_velocity(&point(-0.5, 0.0)), 2.0);
    }

    #[test]
    fn test_swerve_dynamics() {
        let kin = Arc::new(test_kinematics());
        let c = SwerveDriveDynamicsConstraint::new(kin.clone());

        // Straight line without rotation is limited by module speed alone
        assert_abs_diff_eq!(c.max_velocity(&point(0.0, 0.0)), 4.5, epsilon = 1e-9);

        // Rotating along the path is slower
        assert!(c.max_velocity(&point(0.0, 1.0)) < 4.5);

        // Tight curves are limited by steering rate
        assert_abs_diff_eq!(c.max_velocity(&point(10.0, 0.0)), 1.3, epsilon = 1e-9);

        let accel = c.min_max_accel(&point(0.0, 0.0), 1.0);
        assert_eq!(accel, MinMaxAccel::new(-4.4, 4.4));
        assert!(accel.is_valid());
    }
}
