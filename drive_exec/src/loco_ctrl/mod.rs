//! # Locomotion control module
//!
//! Locomotion control turns a drive demand from one of the controllers into
//! a speed and steering angle for each swerve module. Field relative demands
//! are converted to the robot frame (optionally correcting for veering),
//! module speeds are uniformly desaturated, and each module takes the
//! shortest steering path to its new angle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod demand;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use demand::*;
pub use params::*;
pub use state::*;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LocoCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Recieved a demand which is not finite: {0:?}")]
    NonFiniteDemand(DriveDemand),
}
