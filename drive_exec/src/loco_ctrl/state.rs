//! Implementations for the LocoCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::sync::Arc;

// Internal
use super::{DriveDemand, LocoCtrlError, Params};
use crate::{
    kinematics::{desaturate_wheel_speeds, ChassisSpeeds, ModuleState, SwerveKinematics, NUM_MODULES},
    veering,
};
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Module speeds below this are considered stopped, and the module holds its
/// previous steering angle.
const STOPPED_SPEED_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Locomotion control module state
pub struct LocoCtrl {
    pub(crate) params: Params,

    kinematics: Arc<SwerveKinematics>,

    pub(crate) report: StatusReport,

    pub(crate) output: Option<OutputData>,
}

/// Input data to Locomotion Control.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    pub demand: DriveDemand,

    /// Current heading of the robot in the field frame.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Units: radians/second
    pub heading_rate_rads: f64,

    /// If true field and robot relative demands are corrected for veering.
    pub veering_correction: bool,
}

/// Output demands from LocoCtrl for the module actuators.
#[derive(Clone, Copy, Serialize, Debug, Default, PartialEq)]
pub struct OutputData {
    pub module_states: [ModuleState; NUM_MODULES],
}

/// Status report for LocoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Module speeds were scaled down to respect the drive velocity limit.
    pub desaturated: bool,

    /// The veering correction was applied.
    pub veering_corrected: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for LocoCtrl {
    type InitData = &'static str;
    type InitError = LocoCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = LocoCtrlError;

    /// Initialise the LocoCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(LocoCtrlError::ParamLoadError)?;

        Ok(())
    }

    /// Perform cyclic processing of Locomotion Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        if !input_data.demand.is_finite() {
            return Err(LocoCtrlError::NonFiniteDemand(input_data.demand));
        }

        let mut states = match input_data.demand {
            DriveDemand::Stop => [ModuleState::default(); NUM_MODULES],
            DriveDemand::ModuleStates(states) => states,
            DriveDemand::RobotRelative(speeds) => {
                let speeds = if input_data.veering_correction {
                    self.report.veering_corrected = true;
                    veering::correct_chassis(
                        &speeds,
                        input_data.heading_rate_rads,
                        self.params.veering_latency_s,
                    )
                }
                else {
                    speeds
                };
                self.kinematics.to_module_states(&speeds)
            }
            DriveDemand::FieldRelative(vel) => {
                let speeds = if input_data.veering_correction {
                    self.report.veering_corrected = true;
                    veering::correct_field_relative(
                        &vel,
                        input_data.heading_rad,
                        input_data.heading_rate_rads,
                        self.params.veering_latency_s,
                    )
                }
                else {
                    ChassisSpeeds::from_field_relative(&vel, input_data.heading_rad)
                };
                self.kinematics.to_module_states(&speeds)
            }
        };

        // Uniform scaling keeps the direction of the demanded motion
        self.report.desaturated =
            desaturate_wheel_speeds(&mut states, self.kinematics.limits().max_drive_velocity_ms);

        // Compare against the previous demand, or straight ahead at startup
        let prev = self.output.unwrap_or_default().module_states;
        let stopped = states.iter().all(|s| s.speed_ms.abs() < STOPPED_SPEED_MS);
        for (state, prev) in states.iter_mut().zip(prev.iter()) {
            if stopped {
                *state = ModuleState::new(0.0, prev.angle_rad);
            }
            else if self.params.optimise_steering {
                *state = state.optimize(prev.angle_rad);
            }
        }

        let output = OutputData { module_states: states };

        trace!("LocoCtrl output: {:?}", output.module_states);

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl LocoCtrl {
    pub fn new(kinematics: Arc<SwerveKinematics>) -> Self {
        Self {
            params: Params::default(),
            kinematics,
            report: StatusReport::default(),
            output: None,
        }
    }

    pub fn with_params(kinematics: Arc<SwerveKinematics>, params: Params) -> Self {
        Self {
            params,
            ..Self::new(kinematics)
        }
    }

    /// The last output, if any.
    pub fn get_output(&self) -> Option<OutputData> {
        self.output
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::{test_kinematics, FieldRelativeVelocity};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn loco_ctrl(optimise_steering: bool) -> LocoCtrl {
        LocoCtrl::with_params(
            Arc::new(test_kinematics()),
            Params {
                veering_latency_s: 0.1,
                optimise_steering,
            },
        )
    }

    fn input(demand: DriveDemand) -> InputData {
        InputData {
            demand,
            ..Default::default()
        }
    }

    #[test]
    fn test_field_relative() {
        let mut lc = loco_ctrl(false);

        // Driving field +x while facing field +y is robot -y
        let (out, report) = lc
            .proc(&InputData {
                demand: DriveDemand::FieldRelative(FieldRelativeVelocity::new(1.0, 0.0, 0.0)),
                heading_rad: FRAC_PI_2,
                ..Default::default()
            })
            .unwrap();

        assert!(!report.desaturated);
        assert!(!report.veering_corrected);
        for s in out.module_states.iter() {
            assert_abs_diff_eq!(s.speed_ms, 1.0, epsilon = 1e-9);
            assert_abs_diff_eq!(s.angle_rad, -FRAC_PI_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_desaturates_uniformly() {
        let mut lc = loco_ctrl(false);
        let (out, report) = lc
            .proc(&input(DriveDemand::RobotRelative(ChassisSpeeds::new(4.0, 0.0, 5.0))))
            .unwrap();

        assert!(report.desaturated);
        let max = out
            .module_states
            .iter()
            .map(|s| s.speed_ms.abs())
            .fold(0.0, f64::max);
        assert_abs_diff_eq!(max, 4.5, epsilon = 1e-9);
    }

    #[test]
    fn test_stop_holds_angles() {
        let mut lc = loco_ctrl(false);
        lc.proc(&input(DriveDemand::RobotRelative(ChassisSpeeds::new(0.0, 1.0, 0.0))))
            .unwrap();

        let (out, _) = lc.proc(&input(DriveDemand::Stop)).unwrap();
        for s in out.module_states.iter() {
            assert_abs_diff_eq!(s.speed_ms, 0.0);
            assert_abs_diff_eq!(s.angle_rad, FRAC_PI_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_optimise_steering() {
        let mut lc = loco_ctrl(true);
        lc.proc(&input(DriveDemand::RobotRelative(ChassisSpeeds::new(1.0, 0.0, 0.0))))
            .unwrap();

        // Backwards is a reversal, not a half turn
        let (out, _) = lc
            .proc(&input(DriveDemand::RobotRelative(ChassisSpeeds::new(-1.0, 0.0, 0.0))))
            .unwrap();
        for s in out.module_states.iter() {
            assert_abs_diff_eq!(s.speed_ms, -1.0, epsilon = 1e-9);
            assert_abs_diff_eq!(s.angle_rad, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_veering_flag() {
        let mut lc = loco_ctrl(false);
        let (_, report) = lc
            .proc(&InputData {
                demand: DriveDemand::FieldRelative(FieldRelativeVelocity::new(1.0, 0.0, 1.0)),
                heading_rate_rads: 1.0,
                veering_correction: true,
                ..Default::default()
            })
            .unwrap();
        assert!(report.veering_corrected);
    }

    #[test]
    fn test_non_finite() {
        let mut lc = loco_ctrl(false);
        assert!(matches!(
            lc.proc(&input(DriveDemand::RobotRelative(ChassisSpeeds::new(std::f64::NAN, 0.0, 0.0)))),
            Err(LocoCtrlError::NonFiniteDemand(_))
        ));
    }
}
