//! Trajectory planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the trajectory planner
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Maximum forward length of a path segment in the segment's own frame.
    ///
    /// Units: meters
    pub max_dx_m: f64,

    /// Maximum sideways length of a path segment in the segment's own frame.
    ///
    /// Units: meters
    pub max_dy_m: f64,

    /// Maximum change in course or heading over a path segment.
    ///
    /// Units: radians
    pub max_dtheta_rad: f64,

    /// Arc length between trajectory samples.
    ///
    /// Units: meters
    pub step_m: f64,

    /// Limit on the centripetal acceleration used by the default constraints.
    ///
    /// Units: meters/second^2
    pub max_centripetal_accel_mss: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_dx_m: 0.0127,
            max_dy_m: 0.0127,
            max_dtheta_rad: 0.1,
            step_m: 0.0127,
            max_centripetal_accel_mss: 60.0,
        }
    }
}
