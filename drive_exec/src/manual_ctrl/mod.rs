//! # Manual control module
//!
//! Drives the robot from operator input. Input is normalised to [-1, 1] on
//! each axis and interpreted by one of several strategies, selected by the
//! caller each cycle through `ManualMode`:
//!
//! - `ModuleStates` steers and drives all modules together.
//! - `RobotRelative` is a chassis velocity in the robot frame.
//! - `FieldRelative` is a velocity in the field frame.
//! - `Snaps` is field relative translation with a heading controller which
//!   latches onto an absolute heading request.
//!
//! Each strategy keeps its own state, which is reset whenever the mode
//! changes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod driver;
mod heading;
mod latch;
mod params;
mod simple;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    experiments::Experiments,
    kinematics::{PlanarVelocity, SwerveKinematics},
    loc::SwerveState,
    loco_ctrl::DriveDemand,
};
pub use driver::*;
pub use heading::*;
pub use latch::*;
pub use params::*;
pub use simple::*;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Operator input for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInput {
    /// Forward, between -1 and 1.
    pub x: f64,

    /// Left, between -1 and 1.
    pub y: f64,

    /// Anticlockwise rotation, between -1 and 1.
    pub theta: f64,

    /// Absolute heading request, usually from a POV hat.
    ///
    /// Units: radians
    pub pov_rad: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The ways operator input can be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualMode {
    ModuleStates,
    RobotRelative,
    FieldRelative,
    Snaps,
}

/// Possible errors that can occur in manual control.
#[derive(Debug, thiserror::Error)]
pub enum ManualCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Interprets operator input as a drive demand.
pub trait ManualStrategy {
    /// Forget any state carried over from previous cycles.
    fn reset(&mut self, state: &SwerveState);

    /// Calculate the demand for this cycle.
    fn apply(
        &mut self,
        state: &SwerveState,
        input: &DriverInput,
        experiments: &Experiments,
    ) -> DriveDemand;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriverInput {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self {
            x,
            y,
            theta,
            pov_rad: None,
        }
    }

    /// Clip translation to the unit circle and rotation to [-1, 1].
    pub fn clipped(&self) -> DriverInput {
        let hypot = self.x.hypot(self.y);
        let (x, y) = if hypot > 1.0 {
            (self.x / hypot, self.y / hypot)
        }
        else {
            (self.x, self.y)
        };

        DriverInput {
            x,
            y,
            theta: self.theta.max(-1.0).min(1.0),
            pov_rad: self.pov_rad,
        }
    }

    /// Clip the input and scale it to the maximum speed and rotation rate.
    ///
    /// The result is not necessarily feasible, since full speed and full
    /// rotation cannot both be achieved.
    pub fn scaled<V: PlanarVelocity>(&self, kinematics: &SwerveKinematics) -> V {
        let clipped = self.clipped();
        let max_v = kinematics.limits().max_drive_velocity_ms;

        V::from_components(
            clipped.x * max_v,
            clipped.y * max_v,
            clipped.theta * kinematics.max_angular_speed_rads(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::{test_kinematics, ChassisSpeeds};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_clip() {
        let c = DriverInput::new(1.0, 1.0, -2.0).clipped();
        assert_abs_diff_eq!(c.x, 0.5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(c.y, 0.5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(c.theta, -1.0);

        let c = DriverInput::new(0.3, -0.4, 0.5).clipped();
        assert_eq!(c, DriverInput::new(0.3, -0.4, 0.5));
    }

    #[test]
    fn test_scale() {
        let kin = test_kinematics();
        let s: ChassisSpeeds = DriverInput::new(0.5, 0.0, 1.0).scaled(&kin);
        assert_abs_diff_eq!(s.vx_ms, 2.25, epsilon = 1e-12);
        assert_abs_diff_eq!(s.omega_rads, kin.max_angular_speed_rads(), epsilon = 1e-12);
    }
}
