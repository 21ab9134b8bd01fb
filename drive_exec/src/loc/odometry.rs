//! Swerve drive odometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::sync::Arc;

// Internal
use super::{HeadingFallback, OdometryInput};
use crate::{
    geom::Pose2,
    kinematics::{ModulePosition, SwerveKinematics, NUM_MODULES},
};
use util::maths::angle_modulus;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Integrates module motion and gyro heading into a field relative pose.
#[derive(Debug, Clone)]
pub struct SwerveOdometry {
    kinematics: Arc<SwerveKinematics>,

    fallback: HeadingFallback,

    pose: Pose2,

    /// Added to the gyro heading to give the field heading.
    ///
    /// Units: radians
    gyro_offset_rad: f64,

    prev_positions: [ModulePosition; NUM_MODULES],

    /// True while the gyro is unavailable.
    gyro_lost: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveOdometry {
    /// Start odometry at `pose` given the current measurements.
    pub fn new(
        kinematics: Arc<SwerveKinematics>,
        fallback: HeadingFallback,
        pose: Pose2,
        input: &OdometryInput,
    ) -> Self {
        let mut odometry = Self {
            kinematics,
            fallback,
            pose,
            gyro_offset_rad: 0.0,
            prev_positions: input.positions,
            gyro_lost: false,
        };
        odometry.reset(pose, input);

        odometry
    }

    /// Move the odometry to `pose` without any motion.
    ///
    /// If the gyro is available the offset is recomputed so that its current
    /// reading corresponds to the pose's heading, otherwise the existing offset
    /// is kept.
    pub fn reset(&mut self, pose: Pose2, input: &OdometryInput) {
        if let Some(gyro_rad) = input.heading_rad {
            self.gyro_offset_rad = angle_modulus(pose.heading_rad - gyro_rad);
        }

        self.pose = pose;
        self.prev_positions = input.positions;
    }

    /// Integrate one cycle of measurements.
    ///
    /// Returns the new pose and whether the heading was degraded (the gyro
    /// was not available).
    pub fn update(&mut self, input: &OdometryInput) -> (Pose2, bool) {
        let mut deltas = [ModulePosition::default(); NUM_MODULES];
        for (i, delta) in deltas.iter_mut().enumerate() {
            *delta = input.positions[i].delta_from(&self.prev_positions[i]);
        }
        self.prev_positions = input.positions;

        let mut twist = self.kinematics.to_twist(&deltas);

        let degraded = match input.heading_rad {
            Some(gyro_rad) => {
                if self.gyro_lost {
                    info!("Gyro heading available again");
                    self.gyro_lost = false;
                }

                let heading_rad = angle_modulus(gyro_rad + self.gyro_offset_rad);
                twist.dtheta_rad = angle_modulus(heading_rad - self.pose.heading_rad);

                false
            }
            None => {
                if !self.gyro_lost {
                    warn!("Gyro heading unavailable, falling back to {:?}", self.fallback);
                    self.gyro_lost = true;
                }

                if self.fallback == HeadingFallback::HoldLast {
                    twist.dtheta_rad = 0.0;
                }

                true
            }
        };

        self.pose = self.pose.exp(&twist);

        (self.pose, degraded)
    }

    pub fn pose(&self) -> Pose2 {
        self.pose
    }

    pub fn is_degraded(&self) -> bool {
        self.gyro_lost
    }
}
