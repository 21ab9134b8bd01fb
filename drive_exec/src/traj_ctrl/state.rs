//! Trajectory control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{Params, TrajCtrlError};
use crate::{
    geom::Pose2,
    kinematics::{ChassisSpeeds, FieldRelativeVelocity},
    traj::{TimedPose, Trajectory, TrajectoryIterator, TrajectorySampler},
};
use util::{maths::angle_modulus, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory control module state
#[derive(Default)]
pub struct TrajCtrl {
    params: Params,

    /// Executing mode
    mode: TrajCtrlMode,

    /// The trajectory being followed, `None` until one is set.
    iter: Option<TrajectoryIterator>,

    /// Time of the previous update, `None` if no update has been made since
    /// the trajectory was set.
    ///
    /// Units: seconds
    last_time_s: Option<f64>,

    setpoint: Option<TimedPose>,

    /// Field relative error between the setpoint and the measured pose.
    error: Pose2,
}

/// Input data to trajectory control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Units: seconds
    pub time_s: f64,

    /// Measured pose of the robot.
    pub pose: Pose2,

    /// Measured field relative velocity of the robot.
    pub velocity: FieldRelativeVelocity,
}

/// The status report of the trajectory controller.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    pub setpoint: Option<TimedPose>,

    /// Units: meters
    pub translation_error_m: f64,

    /// Units: radians
    pub heading_error_rad: f64,

    /// True once the end of the trajectory has been reached.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of TrajCtrl.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrajCtrlMode {
    Uninitialised,
    Following,
    Finished,
}

impl Default for TrajCtrlMode {
    fn default() -> Self {
        TrajCtrlMode::Uninitialised
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrajCtrl {
    type InitData = &'static str;
    type InitError = TrajCtrlError;

    type InputData = InputData;
    type OutputData = ChassisSpeeds;
    type StatusReport = StatusReport;
    type ProcError = TrajCtrlError;

    /// Initialise the TrajCtrl module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(TrajCtrlError::ParamLoadError)?;

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let output = self.update(input_data.time_s, &input_data.pose, &input_data.velocity)?;

        let report = StatusReport {
            setpoint: self.setpoint,
            translation_error_m: self.error.position_m.norm(),
            heading_error_rad: self.error.heading_rad,
            finished: self.is_done(),
        };

        Ok((output, report))
    }
}

impl TrajCtrl {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Begin following a new trajectory.
    ///
    /// Any trajectory already being followed is abandoned along with its
    /// error. Time starts from the first call to `update`.
    pub fn set_trajectory(&mut self, trajectory: Arc<Trajectory>) {
        debug!(
            "New trajectory of {} points, {:.3} s",
            trajectory.len(),
            trajectory.duration_s()
        );

        self.iter = Some(TrajectoryIterator::new(TrajectorySampler::new(trajectory)));
        self.mode = TrajCtrlMode::Following;
        self.last_time_s = None;
        self.setpoint = None;
        self.error = Pose2::identity();
    }

    /// Calculate the chassis speeds needed to follow the trajectory.
    ///
    /// Once the end of the trajectory is reached, and for trajectories of a
    /// single point, zero speeds are returned.
    pub fn update(
        &mut self,
        time_s: f64,
        pose: &Pose2,
        velocity: &FieldRelativeVelocity,
    ) -> Result<ChassisSpeeds, TrajCtrlError> {
        let iter = match self.iter.as_mut() {
            Some(i) => i,
            None => return Err(TrajCtrlError::NoTrajectory),
        };

        let dt_s = match self.last_time_s {
            Some(t) => time_s - t,
            None => 0.0,
        };
        self.last_time_s = Some(time_s);

        let setpoint = iter.advance(dt_s);
        self.setpoint = Some(setpoint);

        if iter.sampler().trajectory().len() < 2 {
            self.mode = TrajCtrlMode::Finished;
            self.error = Pose2::identity();
            return Ok(ChassisSpeeds::default());
        }

        self.error = Pose2 {
            position_m: setpoint.point.pose.position_m - pose.position_m,
            heading_rad: angle_modulus(setpoint.point.pose.heading_rad - pose.heading_rad),
        };

        if iter.is_done() {
            if self.mode != TrajCtrlMode::Finished {
                debug!("Trajectory finished at {:.3} s", iter.progress_s());
            }
            self.mode = TrajCtrlMode::Finished;
            return Ok(ChassisSpeeds::default());
        }

        // Feedforward: the trajectory's own motion at the setpoint
        let v = setpoint.velocity_ms;
        let feedforward = FieldRelativeVelocity::new(
            v * setpoint.point.course_rad.cos(),
            v * setpoint.point.course_rad.sin(),
            v * setpoint.point.heading_rate_radm,
        );

        let feedback = FieldRelativeVelocity::new(
            self.params.translation_k_p * self.error.x(),
            self.params.translation_k_p * self.error.y(),
            self.params.heading_k_p * self.error.heading_rad,
        );

        let velocity_feedback = feedforward.minus(velocity).times(self.params.velocity_k_p);

        let demand = feedforward.plus(&feedback).plus(&velocity_feedback);

        trace!(
            "TrajCtrl t = {:.3} s, setpoint {:?}, error {:?}, demand {:?}",
            time_s,
            setpoint.point.pose,
            self.error,
            demand
        );

        Ok(ChassisSpeeds::from_field_relative(&demand, pose.heading_rad))
    }

    /// Field relative error from the measured pose to the setpoint, as of the
    /// last update.
    pub fn get_error(&self) -> Pose2 {
        self.error
    }

    /// The setpoint of the last update.
    pub fn get_setpoint(&self) -> Option<TimedPose> {
        self.setpoint
    }

    pub fn get_mode(&self) -> TrajCtrlMode {
        self.mode
    }

    pub fn is_done(&self) -> bool {
        self.mode == TrajCtrlMode::Finished
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::test_kinematics;
    use crate::traj::{self, TimingLimits, TrajectoryPlanner};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn calibration_trajectory() -> Arc<Trajectory> {
        let planner =
            TrajectoryPlanner::new(traj::Params::default(), Arc::new(test_kinematics())).unwrap();
        let constraints = planner.default_constraints();

        let traj = planner
            .generate_trajectory(
                &[Pose2::new(0.0, 0.0, 3.0 * FRAC_PI_2), Pose2::new(10.0, -10.0, 0.0)],
                &[FRAC_PI_2, PI],
                &constraints,
                &TimingLimits {
                    start_velocity_ms: 0.0,
                    end_velocity_ms: 0.0,
                    max_velocity_ms: 1.0,
                    max_abs_accel_mss: 1.0,
                },
            )
            .unwrap();

        Arc::new(traj)
    }

    #[test]
    fn test_follow_calibration_path() {
        let mut ctrl = TrajCtrl::new(Params::default());
        ctrl.set_trajectory(calibration_trajectory());
        let still = FieldRelativeVelocity::default();

        // At rest on the start point
        let out = ctrl.update(0.0, &Pose2::new(0.0, 0.0, FRAC_PI_2), &still).unwrap();
        assert_abs_diff_eq!(out.vx_ms, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.vy_ms, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(out.omega_rads, 0.0, epsilon = 1e-3);

        // Facing +y while travelling towards -y, so mostly robot -x
        let out = ctrl.update(4.0, &Pose2::new(0.25, -3.5, 1.69), &still).unwrap();
        assert_abs_diff_eq!(out.vx_ms, -0.961, epsilon = 0.01);
        assert_abs_diff_eq!(out.vy_ms, -0.034, epsilon = 0.01);
        assert_abs_diff_eq!(out.omega_rads, 0.032, epsilon = 0.01);

        let error = ctrl.get_error();
        assert_abs_diff_eq!(error.x(), 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(error.y(), 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(error.heading_rad, 0.0, epsilon = 0.05);

        let setpoint = ctrl.get_setpoint().unwrap();
        assert_abs_diff_eq!(setpoint.point.pose.x(), 0.233, epsilon = 0.01);
        assert_abs_diff_eq!(setpoint.point.pose.y(), -3.486, epsilon = 0.01);
        assert_abs_diff_eq!(setpoint.point.pose.heading_rad, 1.671, epsilon = 0.01);
        assert_abs_diff_eq!(setpoint.time_s, 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(setpoint.velocity_ms, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(setpoint.accel_mss, 0.0, epsilon = 1e-3);

        let out = ctrl.update(8.0, &Pose2::new(1.85, -7.11, 2.22), &still).unwrap();
        assert_abs_diff_eq!(out.vx_ms, -0.96, epsilon = 0.05);
        assert_abs_diff_eq!(out.vy_ms, -0.05, epsilon = 0.05);
        assert_abs_diff_eq!(out.omega_rads, 0.18, epsilon = 0.05);

        let error = ctrl.get_error();
        assert_abs_diff_eq!(error.x(), 0.0, epsilon = 0.02);
        assert_abs_diff_eq!(error.y(), 0.0, epsilon = 0.02);
        assert_abs_diff_eq!(error.heading_rad, 0.0, epsilon = 0.02);

        let setpoint = ctrl.get_setpoint().unwrap();
        assert_abs_diff_eq!(setpoint.point.pose.x(), 1.85, epsilon = 0.01);
        assert_abs_diff_eq!(setpoint.point.pose.y(), -7.10, epsilon = 0.01);
        assert_abs_diff_eq!(setpoint.point.pose.heading_rad, 2.22, epsilon = 0.01);
        assert_abs_diff_eq!(setpoint.time_s, 8.0, epsilon = 1e-6);
        assert_abs_diff_eq!(setpoint.velocity_ms, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(setpoint.accel_mss, 0.0, epsilon = 1e-3);
        assert!(!ctrl.is_done());
    }

    #[test]
    fn test_perfect_following() {
        let trajectory = calibration_trajectory();
        let reference = TrajectorySampler::new(trajectory.clone());

        let mut ctrl = TrajCtrl::new(Params::default());
        ctrl.set_trajectory(trajectory.clone());

        let mut time_s = 0.0;
        while !ctrl.is_done() {
            let pose = reference.sample(time_s).point.pose;
            ctrl.update(time_s, &pose, &FieldRelativeVelocity::default())
                .unwrap();

            let error = ctrl.get_error();
            assert!(error.position_m.norm() <= 0.05);
            assert!(error.heading_rad.abs() <= 0.05);

            time_s += 0.02;
            assert!(time_s < trajectory.duration_s() + 1.0);
        }

        // Stopped at the end
        let out = ctrl
            .update(time_s, &trajectory.last().point.pose, &FieldRelativeVelocity::default())
            .unwrap();
        assert_eq!(out, ChassisSpeeds::default());
    }

    #[test]
    fn test_single_point() {
        let single = Trajectory::new(vec![TimedPose {
            point: traj::PoseWithMotion {
                pose: Pose2::new(1.0, 2.0, 0.5),
                course_rad: 0.0,
                curvature_m: 0.0,
                heading_rate_radm: 0.0,
            },
            time_s: 0.0,
            distance_m: 0.0,
            velocity_ms: 0.0,
            accel_mss: 0.0,
        }])
        .unwrap();

        let mut ctrl = TrajCtrl::new(Params::default());
        ctrl.set_trajectory(Arc::new(single));

        let out = ctrl
            .update(0.0, &Pose2::identity(), &FieldRelativeVelocity::default())
            .unwrap();

        assert_eq!(out, ChassisSpeeds::default());
        assert_eq!(ctrl.get_error(), Pose2::identity());
        assert!(ctrl.is_done());
    }

    #[test]
    fn test_no_trajectory() {
        let mut ctrl = TrajCtrl::default();
        assert_eq!(ctrl.get_mode(), TrajCtrlMode::Uninitialised);
        assert!(matches!(
            ctrl.update(0.0, &Pose2::identity(), &FieldRelativeVelocity::default()),
            Err(TrajCtrlError::NoTrajectory)
        ));
    }

    #[test]
    fn test_new_trajectory_discards_error() {
        let mut ctrl = TrajCtrl::new(Params::default());
        ctrl.set_trajectory(calibration_trajectory());
        ctrl.update(0.0, &Pose2::new(1.0, 1.0, 0.0), &FieldRelativeVelocity::default())
            .unwrap();
        assert!(ctrl.get_error().position_m.norm() > 1.0);

        ctrl.set_trajectory(calibration_trajectory());
        assert_eq!(ctrl.get_error(), Pose2::identity());
        assert!(ctrl.get_setpoint().is_none());
    }
}
