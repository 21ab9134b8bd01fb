//! Manual driving with a latching heading controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use std::sync::Arc;

// Internal
use super::{DriverInput, HeadingLatch, ManualStrategy, Params};
use crate::{
    experiments::{Experiment, Experiments},
    kinematics::{FieldRelativeVelocity, SwerveKinematics},
    loc::SwerveState,
    loco_ctrl::DriveDemand,
    profile::State1d,
};
use util::maths::{angle_modulus, apply_deadband, clamp, get_min_distance};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Field relative manual driving, with rotation either manual or servoed to
/// a latched heading by full state feedback.
#[derive(Debug, Clone)]
pub struct ManualWithFullStateHeading {
    kinematics: Arc<SwerveKinematics>,

    params: Params,

    latch: HeadingLatch,

    /// Short path heading goal, `None` while rotation is manual.
    ///
    /// Units: radians
    goal_rad: Option<f64>,

    /// Heading setpoint, `None` while rotation is manual.
    theta_setpoint: Option<State1d>,

    omega_filter: SinglePoleFilter,
}

/// Single pole low pass filter.
#[derive(Debug, Clone)]
struct SinglePoleFilter {
    gain: f64,
    output: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManualWithFullStateHeading {
    pub fn new(kinematics: Arc<SwerveKinematics>, params: Params) -> Self {
        let omega_filter =
            SinglePoleFilter::new(params.theta_filter_time_constant_s, params.period_s);

        Self {
            kinematics,
            params,
            latch: HeadingLatch::Free,
            goal_rad: None,
            theta_setpoint: None,
            omega_filter,
        }
    }

    /// Calculate a feasible field relative velocity from the operator input.
    pub fn calculate(
        &mut self,
        state: &SwerveState,
        input: &DriverInput,
        experiments: &Experiments,
    ) -> FieldRelativeVelocity {
        let twist: FieldRelativeVelocity = input.scaled(&self.kinematics);

        let measurement_rad = state.pose.heading_rad;
        let rate_rads = state.theta.v;

        let latched_rad =
            self.latch
                .update(input.pov_rad, twist.omega_rads, self.params.latch_deadband_rads);

        let latched_rad = match latched_rad {
            Some(h) => h,
            None => {
                // Manual rotation, nothing to servo to
                self.goal_rad = None;
                self.theta_setpoint = None;
                trace!("Heading free");
                return self.kinematics.analytic_desaturation(twist);
            }
        };

        let goal_rad = get_min_distance(measurement_rad, latched_rad);
        self.goal_rad = Some(goal_rad);

        // A fresh engagement starts from the measured state, after that the
        // setpoint is kept on the same turn as the measurement
        let setpoint = match self.theta_setpoint {
            None => State1d::new(measurement_rad, rate_rads),
            Some(sp) => State1d::new(get_min_distance(measurement_rad, sp.x), sp.v),
        };

        let setpoint = match &self.params.theta_profile {
            Some(profile) => {
                profile.calculate(self.params.period_s, setpoint, State1d::new(goal_rad, 0.0))
            }
            None => State1d::new(goal_rad, 0.0),
        };
        self.theta_setpoint = Some(setpoint);

        let theta_ff = setpoint.v;

        let theta_error = angle_modulus(setpoint.x - measurement_rad);
        let omega_error = setpoint.v - rate_rads;

        let theta_fb = self.params.heading_k[0] * theta_error;
        let mut omega_fb = self.params.heading_k[1] * omega_error;

        if experiments.enabled(Experiment::UseThetaFilter) {
            omega_fb = self.omega_filter.calculate(omega_fb);
        }

        let theta_fb = apply_deadband(theta_fb, self.params.output_deadband_rads);
        let omega_fb = apply_deadband(omega_fb, self.params.output_deadband_rads);

        let max_omega = self.kinematics.max_angular_speed_rads();
        let omega = clamp(&(theta_ff + theta_fb + omega_fb), &-max_omega, &max_omega);

        trace!(
            "Heading snap: goal {:.3}, setpoint {:?}, measured {:.3} at {:.3}, fb {:.3} + {:.3}, omega {:.3}",
            goal_rad,
            setpoint,
            measurement_rad,
            rate_rads,
            theta_fb,
            omega_fb,
            omega
        );

        // Rotation is kept whole, translation gets what is left
        self.kinematics
            .prefer_rotation(FieldRelativeVelocity::new(twist.vx_ms, twist.vy_ms, omega))
    }

    pub fn get_latch(&self) -> HeadingLatch {
        self.latch
    }

    pub fn get_goal(&self) -> Option<f64> {
        self.goal_rad
    }

    pub fn get_setpoint(&self) -> Option<State1d> {
        self.theta_setpoint
    }
}

impl ManualStrategy for ManualWithFullStateHeading {
    fn reset(&mut self, _state: &SwerveState) {
        self.latch.unlatch();
        self.goal_rad = None;
        self.theta_setpoint = None;
        self.omega_filter.reset();
    }

    fn apply(
        &mut self,
        state: &SwerveState,
        input: &DriverInput,
        experiments: &Experiments,
    ) -> DriveDemand {
        DriveDemand::FieldRelative(self.calculate(state, input, experiments))
    }
}

impl SinglePoleFilter {
    fn new(time_constant_s: f64, period_s: f64) -> Self {
        let gain = if time_constant_s > 0.0 {
            (-period_s / time_constant_s).exp()
        }
        else {
            0.0
        };

        Self { gain, output: 0.0 }
    }

    fn calculate(&mut self, input: f64) -> f64 {
        self.output = (1.0 - self.gain) * input + self.gain * self.output;
        self.output
    }

    fn reset(&mut self) {
        self.output = 0.0;
    }
}
