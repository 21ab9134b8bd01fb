//! Pose estimator parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::HeadingFallback;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the pose estimator
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Standard deviation of the odometry estimate in x, y and heading.
    ///
    /// Units: meters, meters, radians
    pub state_std_devs: [f64; 3],

    /// Standard deviation of vision measurements in x, y and heading.
    ///
    /// Units: meters, meters, radians
    pub vision_std_devs: [f64; 3],

    /// How far back vision measurements can be applied.
    ///
    /// Units: seconds
    pub buffer_duration_s: f64,

    /// Heading source to use when the gyro is unavailable.
    #[serde(default)]
    pub heading_fallback: HeadingFallback,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            state_std_devs: [0.1, 0.1, 0.1],
            vision_std_devs: [0.5, 0.5, 0.1],
            buffer_duration_s: 1.5,
            heading_fallback: HeadingFallback::WheelOdometry,
        }
    }
}
