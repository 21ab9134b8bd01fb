//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Params {
    /// Proportional gain on the translation error.
    ///
    /// Units: 1/seconds
    pub translation_k_p: f64,

    /// Proportional gain on the heading error.
    ///
    /// Units: 1/seconds
    pub heading_k_p: f64,

    /// Gain on the difference between the setpoint velocity and the measured
    /// velocity. Zero disables velocity feedback.
    #[serde(default)]
    pub velocity_k_p: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            translation_k_p: 2.4,
            heading_k_p: 2.4,
            velocity_k_p: 0.0,
        }
    }
}
