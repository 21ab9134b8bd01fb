//! Manual strategies without any feedback

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

// Internal
use super::{DriverInput, ManualStrategy};
use crate::{
    experiments::Experiments,
    kinematics::{ChassisSpeeds, FieldRelativeVelocity, ModuleState, SwerveKinematics, NUM_MODULES},
    loc::SwerveState,
    loco_ctrl::DriveDemand,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Translation input below this leaves the modules pointing where they were.
const MIN_STEER_INPUT: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All modules steer to the direction of the translation input and drive at
/// its magnitude. Rotation input is ignored.
#[derive(Debug, Clone)]
pub struct ManualModuleStates {
    kinematics: Arc<SwerveKinematics>,

    /// Units: radians
    last_angle_rad: f64,
}

/// Robot relative chassis speeds.
#[derive(Debug, Clone)]
pub struct ManualChassisSpeeds {
    kinematics: Arc<SwerveKinematics>,
}

/// Field relative velocity.
#[derive(Debug, Clone)]
pub struct ManualFieldRelative {
    kinematics: Arc<SwerveKinematics>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManualModuleStates {
    pub fn new(kinematics: Arc<SwerveKinematics>) -> Self {
        Self {
            kinematics,
            last_angle_rad: 0.0,
        }
    }
}

impl ManualStrategy for ManualModuleStates {
    fn reset(&mut self, _state: &SwerveState) {
        self.last_angle_rad = 0.0;
    }

    fn apply(&mut self, _state: &SwerveState, input: &DriverInput, _: &Experiments) -> DriveDemand {
        let clipped = input.clipped();
        let magnitude = clipped.x.hypot(clipped.y);

        let state = if magnitude < MIN_STEER_INPUT {
            ModuleState::new(0.0, self.last_angle_rad)
        }
        else {
            self.last_angle_rad = clipped.y.atan2(clipped.x);
            ModuleState::new(
                magnitude * self.kinematics.limits().max_drive_velocity_ms,
                self.last_angle_rad,
            )
        };

        DriveDemand::ModuleStates([state; NUM_MODULES])
    }
}

impl ManualChassisSpeeds {
    pub fn new(kinematics: Arc<SwerveKinematics>) -> Self {
        Self { kinematics }
    }
}

impl ManualStrategy for ManualChassisSpeeds {
    fn reset(&mut self, _state: &SwerveState) {}

    fn apply(&mut self, _state: &SwerveState, input: &DriverInput, _: &Experiments) -> DriveDemand {
        let speeds: ChassisSpeeds = input.scaled(&self.kinematics);
        DriveDemand::RobotRelative(self.kinematics.analytic_desaturation(speeds))
    }
}

impl ManualFieldRelative {
    pub fn new(kinematics: Arc<SwerveKinematics>) -> Self {
        Self { kinematics }
    }
}

impl ManualStrategy for ManualFieldRelative {
    fn reset(&mut self, _state: &SwerveState) {}

    fn apply(&mut self, _state: &SwerveState, input: &DriverInput, _: &Experiments) -> DriveDemand {
        let vel: FieldRelativeVelocity = input.scaled(&self.kinematics);
        DriveDemand::FieldRelative(self.kinematics.analytic_desaturation(vel))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::test_kinematics;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_module_states_hold_angle() {
        let mut strategy = ManualModuleStates::new(Arc::new(test_kinematics()));
        let state = SwerveState::default();
        let exps = Experiments::new();

        match strategy.apply(&state, &DriverInput::new(0.0, 0.5, 0.0), &exps) {
            DriveDemand::ModuleStates(states) => {
                assert_abs_diff_eq!(states[0].speed_ms, 2.25, epsilon = 1e-12);
                assert_abs_diff_eq!(states[0].angle_rad, FRAC_PI_2, epsilon = 1e-12);
            }
            d => panic!("Unexpected demand {:?}", d),
        }

        // Releasing the stick stops but keeps pointing the same way
        match strategy.apply(&state, &DriverInput::default(), &exps) {
            DriveDemand::ModuleStates(states) => {
                assert_abs_diff_eq!(states[3].speed_ms, 0.0);
                assert_abs_diff_eq!(states[3].angle_rad, FRAC_PI_2, epsilon = 1e-12);
            }
            d => panic!("Unexpected demand {:?}", d),
        }
    }

    #[test]
    fn test_field_relative_is_feasible() {
        let kin = Arc::new(test_kinematics());
        let mut strategy = ManualFieldRelative::new(kin.clone());

        let demand = strategy.apply(
            &SwerveState::default(),
            &DriverInput::new(1.0, 0.0, 1.0),
            &Experiments::new(),
        );
        let vel = match demand {
            DriveDemand::FieldRelative(v) => v,
            d => panic!("Unexpected demand {:?}", d),
        };

        // Translation and rotation both scaled by the same amount
        let max_v = kin.limits().max_drive_velocity_ms;
        let max_omega = kin.max_angular_speed_rads();
        assert_abs_diff_eq!(vel.vx_ms / max_v, vel.omega_rads / max_omega, epsilon = 1e-9);
        assert_abs_diff_eq!(vel.vx_ms / max_v + vel.omega_rads / max_omega, 1.0, epsilon = 1e-9);
    }
}
