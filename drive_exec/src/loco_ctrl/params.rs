//! Parameters structure for LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Locomotion control.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    /// Time between a demand being issued and it taking effect at the wheels,
    /// used by the veering correction.
    ///
    /// Units: seconds
    pub veering_latency_s: f64,

    /// If true modules may reverse their drive direction rather than steer
    /// through more than 90 degrees.
    pub optimise_steering: bool,
}
