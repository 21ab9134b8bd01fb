//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use drive_lib::{experiments::Experiments, manual_ctrl::DriverInput};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DriveExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Pose the robot starts at, `[x, y, heading]`.
    pub start_pose: [f64; 3],

    /// Trajectory waypoints, `[x, y, course]`.
    pub waypoints: Vec<[f64; 3]>,

    /// Robot heading at each waypoint.
    ///
    /// Units: radians
    pub headings_rad: Vec<f64>,

    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Units: meters/second^2
    pub max_abs_accel_mss: f64,

    /// Operator input used when driving manually.
    pub manual_input: DriverInput,

    /// Proportion of the true wheel travel measured by the module encoders.
    pub wheel_slip_factor: f64,

    /// Units: seconds
    pub vision_period_s: f64,

    /// Time between a vision frame being captured and its pose reaching the
    /// estimator.
    ///
    /// Units: seconds
    pub vision_latency_s: f64,

    #[serde(default)]
    pub experiments: Experiments,
}
