//! Velocity and module state types

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use crate::geom::rotate;
use util::maths::{angle_modulus, wrap_to_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity of the robot expressed in the robot body frame.
///
/// No clamping is applied, feasibility is handled by the desaturation
/// functions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Forward velocity.
    ///
    /// Units: meters/second
    pub vx_ms: f64,

    /// Leftward velocity.
    ///
    /// Units: meters/second
    pub vy_ms: f64,

    /// Anticlockwise rotation rate.
    ///
    /// Units: radians/second
    pub omega_rads: f64,
}

/// Velocity of the robot expressed in the field frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldRelativeVelocity {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64,
}

/// Demand or measurement for a single swerve module.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleState {
    /// Signed wheel ground speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steering angle relative to the robot X axis, in [-pi, pi).
    ///
    /// Units: radians
    pub angle_rad: f64,
}

/// Accumulated distance and current angle of a single swerve module, as
/// reported by the module encoders.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModulePosition {
    /// Units: meters
    pub distance_m: f64,

    /// Units: radians
    pub angle_rad: f64,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A planar velocity made of a translation and a rotation rate, in any frame.
///
/// Desaturation only cares about the magnitudes involved so works on either
/// frame through this trait.
pub trait PlanarVelocity: Copy {
    fn components(&self) -> (f64, f64, f64);

    fn from_components(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self;

    /// Magnitude of the translational velocity.
    fn speed_ms(&self) -> f64 {
        let (vx, vy, _) = self.components();
        vx.hypot(vy)
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisSpeeds {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads }
    }

    /// Convert a field relative velocity into the robot frame for a robot at
    /// the given heading.
    pub fn from_field_relative(vel: &FieldRelativeVelocity, heading_rad: f64) -> Self {
        let v = rotate(&Vector2::new(vel.vx_ms, vel.vy_ms), -heading_rad);
        Self::new(v[0], v[1], vel.omega_rads)
    }

    /// Convert into the field frame for a robot at the given heading.
    pub fn to_field_relative(&self, heading_rad: f64) -> FieldRelativeVelocity {
        let v = rotate(&Vector2::new(self.vx_ms, self.vy_ms), heading_rad);
        FieldRelativeVelocity::new(v[0], v[1], self.omega_rads)
    }
}

impl FieldRelativeVelocity {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self { vx_ms, vy_ms, omega_rads }
    }

    pub fn plus(&self, other: &FieldRelativeVelocity) -> Self {
        Self::new(
            self.vx_ms + other.vx_ms,
            self.vy_ms + other.vy_ms,
            self.omega_rads + other.omega_rads,
        )
    }

    pub fn minus(&self, other: &FieldRelativeVelocity) -> Self {
        self.plus(&other.times(-1.0))
    }

    pub fn times(&self, k: f64) -> Self {
        Self::new(self.vx_ms * k, self.vy_ms * k, self.omega_rads * k)
    }
}

impl ModuleState {
    pub fn new(speed_ms: f64, angle_rad: f64) -> Self {
        Self {
            speed_ms,
            angle_rad: wrap_to_pi(angle_rad),
        }
    }

    /// Minimise the change in steering angle from `current_angle_rad`.
    ///
    /// If the demand is more than 90 degrees from the current angle the
    /// module is steered to the opposite angle and driven backwards instead.
    pub fn optimize(&self, current_angle_rad: f64) -> ModuleState {
        let delta = angle_modulus(self.angle_rad - current_angle_rad);

        if delta.abs() > std::f64::consts::FRAC_PI_2 {
            ModuleState::new(-self.speed_ms, self.angle_rad + std::f64::consts::PI)
        }
        else {
            *self
        }
    }
}

impl ModulePosition {
    pub fn new(distance_m: f64, angle_rad: f64) -> Self {
        Self { distance_m, angle_rad }
    }

    /// The change from `prev` to this position, carrying this position's
    /// angle.
    pub fn delta_from(&self, prev: &ModulePosition) -> ModulePosition {
        ModulePosition::new(self.distance_m - prev.distance_m, self.angle_rad)
    }
}

impl PlanarVelocity for ChassisSpeeds {
    fn components(&self) -> (f64, f64, f64) {
        (self.vx_ms, self.vy_ms, self.omega_rads)
    }

    fn from_components(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self::new(vx_ms, vy_ms, omega_rads)
    }
}

impl PlanarVelocity for FieldRelativeVelocity {
    fn components(&self) -> (f64, f64, f64) {
        (self.vx_ms, self.vy_ms, self.omega_rads)
    }

    fn from_components(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self::new(vx_ms, vy_ms, omega_rads)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_field_relative_conversion() {
        // Robot facing +Y, driving along field +X means driving to its right
        let field = FieldRelativeVelocity::new(1.0, 0.0, 0.5);
        let chassis = ChassisSpeeds::from_field_relative(&field, FRAC_PI_2);

        assert_abs_diff_eq!(chassis.vx_ms, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(chassis.vy_ms, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(chassis.omega_rads, 0.5);

        let back = chassis.to_field_relative(FRAC_PI_2);
        assert_abs_diff_eq!(back.vx_ms, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back.vy_ms, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_optimize() {
        let demand = ModuleState::new(2.0, PI - 0.1);

        // Close to the demand, unchanged
        assert_eq!(demand.optimize(PI - 0.2), demand);

        // Module pointing the other way drives backwards
        let opt = demand.optimize(-0.1);
        assert_abs_diff_eq!(opt.speed_ms, -2.0);
        assert_abs_diff_eq!(opt.angle_rad, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_module_angle_wrapped() {
        assert_abs_diff_eq!(ModuleState::new(1.0, PI).angle_rad, -PI);
        assert_abs_diff_eq!(ModuleState::new(1.0, 3.0 * PI / 2.0).angle_rad, -FRAC_PI_2, epsilon = 1e-12);
    }
}
