//! # Trajectory control module
//!
//! Trajectory control keeps the robot on a planned trajectory. Each cycle the
//! trajectory is advanced to the current time to give a setpoint, and the
//! commanded chassis speeds are the sum of:
//!
//! - a feedforward term, which is the velocity the trajectory itself expects
//!   at the setpoint, and
//! - a feedback term, proportional to the field relative error between the
//!   setpoint and the measured pose.
//!
//! Heading error is always taken the short way round.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;
use util::params::LoadError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(LoadError),

    /// Attempted to follow a trajectory before one has been set.
    #[error("No trajectory has been set")]
    NoTrajectory,
}
