//! Thread safe handle to a pose estimator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard};

// Internal
use super::{OdometryInput, PoseEstimator, SwerveState, VisionError, VisionMeasurement};
use crate::geom::Pose2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pose estimator shared between the control loop and other threads.
///
/// Every update and read holds the lock for its whole duration, so readers
/// never see a partially applied update. Clones refer to the same estimator.
#[derive(Debug, Clone)]
pub struct SharedPoseEstimator {
    inner: Arc<Mutex<PoseEstimator>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SharedPoseEstimator {
    pub fn new(estimator: PoseEstimator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    pub fn update(&self, time_s: f64, input: &OdometryInput) -> Pose2 {
        self.lock().update(time_s, input)
    }

    pub fn add_vision(&self, measurement: &VisionMeasurement) -> Result<Pose2, VisionError> {
        self.lock().add_vision(measurement)
    }

    pub fn reset_pose(&self, pose: Pose2, input: &OdometryInput) {
        self.lock().reset_pose(pose, input)
    }

    pub fn get_state(&self) -> SwerveState {
        self.lock().get_state()
    }

    pub fn is_degraded(&self) -> bool {
        self.lock().is_degraded()
    }

    /// Lock the estimator, recovering it if another thread panicked while
    /// holding the lock.
    fn lock(&self) -> MutexGuard<'_, PoseEstimator> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Pose estimator lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
