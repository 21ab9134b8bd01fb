//! # Localisation module
//!
//! Estimates the pose of the robot in the field frame.
//!
//! Odometry (module position deltas plus the gyro heading) is integrated
//! every control cycle along constant curvature arcs. Vision observations
//! arrive later than they were captured, so each one is blended into the
//! estimate recorded at its capture time and the odometry received since then
//! is replayed on top of the corrected pose.
//!
//! The estimator can be shared between the control loop and a vision thread
//! through `SharedPoseEstimator`, which serialises all updates.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod estimator;
mod odometry;
mod params;
mod shared;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    geom::Pose2,
    kinematics::{FieldRelativeVelocity, ModulePosition, NUM_MODULES},
    profile::State1d,
};
pub use estimator::*;
pub use odometry::*;
pub use params::*;
pub use shared::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Snapshot of the estimated state of the robot, read by the controllers each
/// cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SwerveState {
    pub pose: Pose2,

    /// Field relative velocity.
    pub velocity: FieldRelativeVelocity,

    /// Heading and heading rate.
    pub theta: State1d,
}

/// Odometry measurements for one control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryInput {
    /// Gyro heading, or `None` if the gyro is not available this cycle.
    ///
    /// Units: radians
    pub heading_rad: Option<f64>,

    /// Gyro rate, if available.
    ///
    /// Units: radians/second
    pub heading_rate_rads: Option<f64>,

    /// Accumulated distance and current angle of each module.
    pub positions: [ModulePosition; NUM_MODULES],
}

/// A pose observed by the vision system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionMeasurement {
    /// Time at which the image was captured, on the same clock as the
    /// odometry updates.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    pub pose: Pose2,

    /// Standard deviations of this measurement in x, y and heading, replacing
    /// the configured ones if given.
    pub std_devs: Option<[f64; 3]>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What to do for heading when the gyro is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeadingFallback {
    /// Integrate the rotation seen by the wheels.
    WheelOdometry,

    /// Hold the last known heading.
    HoldLast,
}

/// Reasons a vision measurement can be rejected.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VisionError {
    #[error("No odometry has been recorded yet")]
    NoHistory,

    #[error("Measurement at {0:.3} s is older than the history buffer (oldest {1:.3} s)")]
    Stale(f64, f64),

    #[error("Measurement timestamp {0} is not valid")]
    InvalidTimestamp(f64),
}

/// Errors which can occur while building a pose estimator.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EstimatorError {
    #[error("Estimator parameter {0} must be finite and not negative, found {1}")]
    InvalidParameter(&'static str, f64),
}

impl Default for HeadingFallback {
    fn default() -> Self {
        HeadingFallback::WheelOdometry
    }
}

impl OdometryInput {
    pub fn new(heading_rad: Option<f64>, positions: [ModulePosition; NUM_MODULES]) -> Self {
        Self {
            heading_rad,
            heading_rate_rads: None,
            positions,
        }
    }
}
