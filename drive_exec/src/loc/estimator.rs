//! Latency compensated pose estimator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use ordered_float::NotNan;
use std::collections::BTreeMap;
use std::sync::Arc;

// Internal
use super::{
    EstimatorError, OdometryInput, Params, SwerveOdometry, SwerveState, VisionError,
    VisionMeasurement,
};
use crate::{
    geom::{Pose2, Twist2},
    kinematics::{FieldRelativeVelocity, SwerveKinematics},
    profile::State1d,
};
use util::maths::angle_modulus;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fuses odometry with delayed vision measurements.
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    params: Params,

    odometry: SwerveOdometry,

    /// Variance of the odometry estimate in x, y and heading.
    q: [f64; 3],

    /// Gains applied to vision measurements which use the configured noise.
    default_gains: [f64; 3],

    /// Recent estimates keyed by time, oldest first.
    history: BTreeMap<NotNan<f64>, Record>,

    /// Units: seconds
    latest_time_s: Option<f64>,

    velocity: FieldRelativeVelocity,

    heading_rate_rads: f64,

    degraded: bool,
}

/// An estimate and the odometry input it was made from.
#[derive(Debug, Clone)]
struct Record {
    pose: Pose2,
    input: OdometryInput,

    /// Vision corrections applied at this record, in order of arrival.
    corrections: Vec<Correction>,
}

/// A vision measurement blended into the estimate.
#[derive(Debug, Clone, Copy)]
struct Correction {
    measured: Pose2,
    gains: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseEstimator {
    /// Create a new estimator at `initial_pose`.
    ///
    /// Standard deviations and the buffer duration must be finite and not
    /// negative.
    pub fn new(
        params: Params,
        kinematics: Arc<SwerveKinematics>,
        initial_pose: Pose2,
        input: &OdometryInput,
    ) -> Result<Self, EstimatorError> {
        check_non_negative("buffer_duration_s", params.buffer_duration_s)?;
        for &std in params.state_std_devs.iter() {
            check_non_negative("state_std_devs", std)?;
        }
        for &std in params.vision_std_devs.iter() {
            check_non_negative("vision_std_devs", std)?;
        }

        let mut q = [0.0; 3];
        for (q, std) in q.iter_mut().zip(params.state_std_devs.iter()) {
            *q = std * std;
        }
        let default_gains = vision_gains(&q, &params.vision_std_devs);

        let odometry = SwerveOdometry::new(kinematics, params.heading_fallback, initial_pose, input);

        Ok(Self {
            params,
            odometry,
            q,
            default_gains,
            history: BTreeMap::new(),
            latest_time_s: None,
            velocity: FieldRelativeVelocity::default(),
            heading_rate_rads: 0.0,
            degraded: false,
        })
    }

    /// Integrate the odometry measured at `time_s`.
    pub fn update(&mut self, time_s: f64, input: &OdometryInput) -> Pose2 {
        let prev_pose = self.odometry.pose();
        let (pose, degraded) = self.odometry.update(input);
        self.degraded = degraded;

        if let Some(prev_time_s) = self.latest_time_s {
            let dt_s = time_s - prev_time_s;

            // A repeated or backwards time carries the old velocity forward
            if dt_s > 0.0 {
                self.velocity = FieldRelativeVelocity::new(
                    (pose.x() - prev_pose.x()) / dt_s,
                    (pose.y() - prev_pose.y()) / dt_s,
                    angle_modulus(pose.heading_rad - prev_pose.heading_rad) / dt_s,
                );
            }
        }

        self.heading_rate_rads = match input.heading_rate_rads {
            Some(r) if !degraded => r,
            _ => self.velocity.omega_rads,
        };

        match NotNan::new(time_s) {
            Ok(t) => {
                self.history.insert(
                    t,
                    Record {
                        pose,
                        input: *input,
                        corrections: Vec::new(),
                    },
                );
                self.latest_time_s = Some(self.latest_time_s.map_or(time_s, |l| l.max(time_s)));
                self.trim_history();
            }
            Err(_) => warn!("Odometry update with NaN time will not be kept in history"),
        }

        pose
    }

    /// Apply a vision measurement captured at some point in the recent past.
    ///
    /// The measurement is blended into the estimate at or before its capture
    /// time, and all odometry since then is replayed on top of it. Corrections
    /// from earlier measurements met during the replay are applied again, so
    /// the order in which measurements arrive does not matter. Measurements
    /// older than the history buffer are rejected.
    pub fn add_vision(&mut self, measurement: &VisionMeasurement) -> Result<Pose2, VisionError> {
        if !measurement.timestamp_s.is_finite() {
            return Err(VisionError::InvalidTimestamp(measurement.timestamp_s));
        }
        let timestamp = NotNan::new(measurement.timestamp_s)
            .map_err(|_| VisionError::InvalidTimestamp(measurement.timestamp_s))?;

        let latest_time_s = match self.latest_time_s {
            Some(t) => t,
            None => return Err(VisionError::NoHistory),
        };

        let oldest_allowed_s = latest_time_s - self.params.buffer_duration_s;
        let floor_time = match self.history.range(..=timestamp).next_back() {
            Some((t, _)) if measurement.timestamp_s >= oldest_allowed_s => *t,
            _ => {
                let oldest_s = self
                    .history
                    .keys()
                    .next()
                    .map_or(latest_time_s, |t| t.into_inner())
                    .max(oldest_allowed_s);

                warn!(
                    "Dropping vision measurement at {:.3} s, oldest usable time is {:.3} s",
                    measurement.timestamp_s, oldest_s
                );
                return Err(VisionError::Stale(measurement.timestamp_s, oldest_s));
            }
        };

        let correction = Correction {
            measured: measurement.pose,
            gains: match measurement.std_devs {
                Some(std_devs) => vision_gains(&self.q, &std_devs),
                None => self.default_gains,
            },
        };

        // Replay everything from the floor record on top of the correction
        let mut replayed = 0;
        for (t, record) in self.history.range_mut(floor_time..) {
            if *t == floor_time {
                let corrected = correction.apply(&record.pose);

                debug!(
                    "Vision at {:.3} s corrects {:?} to {:?}",
                    measurement.timestamp_s, record.pose, corrected
                );

                record.pose = corrected;
                record.corrections.push(correction);
            }
            else {
                let mut pose = self.odometry.update(&record.input).0;
                for c in record.corrections.iter() {
                    pose = c.apply(&pose);
                }
                record.pose = pose;
                replayed += 1;
            }

            self.odometry.reset(record.pose, &record.input);
        }

        debug!("Replayed {} odometry updates", replayed);

        Ok(self.odometry.pose())
    }

    /// Move the estimate to `pose`, forgetting all history.
    pub fn reset_pose(&mut self, pose: Pose2, input: &OdometryInput) {
        self.odometry.reset(pose, input);
        self.history.clear();
        self.latest_time_s = None;
        self.velocity = FieldRelativeVelocity::default();
        self.heading_rate_rads = 0.0;
    }

    pub fn get_pose(&self) -> Pose2 {
        self.odometry.pose()
    }

    pub fn get_state(&self) -> SwerveState {
        let pose = self.odometry.pose();

        SwerveState {
            pose,
            velocity: self.velocity,
            theta: State1d::new(pose.heading_rad, self.heading_rate_rads),
        }
    }

    /// True if the last update had no gyro heading.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Drop records which are too old to be corrected.
    fn trim_history(&mut self) {
        let latest_time_s = match self.latest_time_s {
            Some(t) => t,
            None => return,
        };

        if let Ok(cutoff) = NotNan::new(latest_time_s - self.params.buffer_duration_s) {
            // The last record at or before the cutoff is the floor for
            // measurements at the edge of the buffer
            let keep_from = self
                .history
                .range(..=cutoff)
                .next_back()
                .map(|(t, _)| *t)
                .unwrap_or(cutoff);

            self.history = self.history.split_off(&keep_from);
        }
    }
}

impl Correction {
    /// Move part of the way from `estimate` to the measured pose.
    fn apply(&self, estimate: &Pose2) -> Pose2 {
        let twist = estimate.log(&self.measured);

        estimate.exp(&Twist2::new(
            self.gains[0] * twist.dx_m,
            self.gains[1] * twist.dy_m,
            self.gains[2] * twist.dtheta_rad,
        ))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_non_negative(name: &'static str, value: f64) -> Result<(), EstimatorError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    }
    else {
        Err(EstimatorError::InvalidParameter(name, value))
    }
}

/// Steady state Kalman gain for each axis given the odometry variance `q` and
/// the measurement standard deviations.
fn vision_gains(q: &[f64; 3], vision_std_devs: &[f64; 3]) -> [f64; 3] {
    let mut gains = [0.0; 3];

    for i in 0..3 {
        let r = vision_std_devs[i] * vision_std_devs[i];
        gains[i] = if q[i] == 0.0 {
            0.0
        }
        else {
            q[i] / (q[i] + (q[i] * r).sqrt())
        };
    }

    gains
}
