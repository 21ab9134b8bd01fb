//! # Kinematics engine
//!
//! Maps between chassis velocities and the speed and angle of each swerve
//! module, and keeps module demands within the drive's physical limits.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod desaturate;
mod params;
mod speeds;
mod swerve;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use desaturate::*;
pub use params::*;
pub use speeds::*;
pub use swerve::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the robot.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while building the kinematics.
#[derive(Debug, thiserror::Error)]
pub enum KinematicsError {
    #[error("Module geometry is degenerate, chassis velocity cannot be recovered from module states")]
    DegenerateGeometry,

    #[error("Could not invert the module geometry matrix: {0}")]
    PseudoInverseFailed(&'static str),

    #[error("Kinematic limit {0} must be positive and finite, found {1}")]
    InvalidLimit(&'static str, f64),
}
