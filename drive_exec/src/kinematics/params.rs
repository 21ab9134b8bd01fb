//! Parameters structure for the kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the kinematics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Position of each module's steer axis relative to the robot centre,
    /// X forward and Y left.
    ///
    /// Units: meters,
    /// Frame: Robot body
    pub module_pos_m_rb: [[f64; 2]; NUM_MODULES],

    // ---- CAPABILITIES ----

    pub limits: KinematicLimits,
}

/// Physical limits of the drivetrain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KinematicLimits {
    /// Maximum speed of any one module.
    ///
    /// Units: meters/second
    pub max_drive_velocity_ms: f64,

    /// Maximum acceleration of any one module.
    ///
    /// Units: meters/second^2
    pub max_drive_accel_mss: f64,

    /// Maximum steering rate of a module.
    ///
    /// Units: radians/second
    pub max_steering_velocity_rads: f64,
}
