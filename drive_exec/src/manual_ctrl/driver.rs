//! Mode switching between the manual strategies

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::sync::Arc;

// Internal
use super::{
    DriverInput, ManualChassisSpeeds, ManualCtrlError, ManualFieldRelative, ManualMode,
    ManualModuleStates, ManualStrategy, ManualWithFullStateHeading, Params,
};
use crate::{
    experiments::Experiments, kinematics::SwerveKinematics, loc::SwerveState,
    loco_ctrl::DriveDemand,
};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Owns one instance of each manual strategy and dispatches operator input to
/// the one selected for the cycle.
pub struct ManualDriver {
    current: Option<ManualMode>,

    module_states: ManualModuleStates,
    robot_relative: ManualChassisSpeeds,
    field_relative: ManualFieldRelative,
    snaps: ManualWithFullStateHeading,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ManualDriver {
    pub fn new(kinematics: Arc<SwerveKinematics>, params: Params) -> Self {
        Self {
            current: None,
            module_states: ManualModuleStates::new(kinematics.clone()),
            robot_relative: ManualChassisSpeeds::new(kinematics.clone()),
            field_relative: ManualFieldRelative::new(kinematics.clone()),
            snaps: ManualWithFullStateHeading::new(kinematics, params),
        }
    }

    /// Load the parameters from the given file, relative to the params
    /// directory.
    pub fn from_params_file(
        kinematics: Arc<SwerveKinematics>,
        path: &str,
    ) -> Result<Self, ManualCtrlError> {
        let params = params::load(path).map_err(ManualCtrlError::ParamLoadError)?;
        Ok(Self::new(kinematics, params))
    }

    /// Calculate the demand for this cycle in the given mode.
    ///
    /// The strategy is reset first if the mode differs from the last cycle's.
    pub fn apply(
        &mut self,
        mode: ManualMode,
        state: &SwerveState,
        input: &DriverInput,
        experiments: &Experiments,
    ) -> DriveDemand {
        if self.current != Some(mode) {
            info!("Manual mode changed from {:?} to {:?}", self.current, mode);
            self.strategy(mode).reset(state);
            self.current = Some(mode);
        }

        self.strategy(mode).apply(state, input, experiments)
    }

    /// The mode used in the last cycle.
    pub fn mode(&self) -> Option<ManualMode> {
        self.current
    }

    pub fn heading_controller(&self) -> &ManualWithFullStateHeading {
        &self.snaps
    }

    fn strategy(&mut self, mode: ManualMode) -> &mut dyn ManualStrategy {
        match mode {
            ManualMode::ModuleStates => &mut self.module_states,
            ManualMode::RobotRelative => &mut self.robot_relative,
            ManualMode::FieldRelative => &mut self.field_relative,
            ManualMode::Snaps => &mut self.snaps,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::test_kinematics;
    use crate::manual_ctrl::HeadingLatch;

    #[test]
    fn test_mode_switch_resets() {
        let mut driver = ManualDriver::new(Arc::new(test_kinematics()), Params::default());
        let state = SwerveState::default();
        let exps = Experiments::new();
        let snap = DriverInput {
            pov_rad: Some(1.0),
            ..Default::default()
        };

        assert!(driver.mode().is_none());
        driver.apply(ManualMode::Snaps, &state, &snap, &exps);
        assert_eq!(driver.mode(), Some(ManualMode::Snaps));
        assert_eq!(driver.heading_controller().get_latch(), HeadingLatch::Latched(1.0));

        // Staying in the mode keeps the latch
        driver.apply(ManualMode::Snaps, &state, &DriverInput::default(), &exps);
        assert_eq!(driver.heading_controller().get_latch(), HeadingLatch::Latched(1.0));

        // Leaving and coming back does not
        let demand = driver.apply(ManualMode::RobotRelative, &state, &DriverInput::default(), &exps);
        assert!(matches!(demand, DriveDemand::RobotRelative(_)));
        driver.apply(ManualMode::Snaps, &state, &DriverInput::default(), &exps);
        assert_eq!(driver.heading_controller().get_latch(), HeadingLatch::Free);
    }
}
