//! Demands passed into LocoCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::kinematics::{ChassisSpeeds, FieldRelativeVelocity, ModuleState, NUM_MODULES};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A motion demand in one of the frames the controllers work in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum DriveDemand {
    /// Bring all modules to a stop, holding their steering angles.
    Stop,

    /// Drive each module directly.
    ModuleStates([ModuleState; NUM_MODULES]),

    /// Velocity in the robot frame.
    RobotRelative(ChassisSpeeds),

    /// Velocity in the field frame.
    FieldRelative(FieldRelativeVelocity),
}

impl Default for DriveDemand {
    fn default() -> Self {
        DriveDemand::Stop
    }
}

impl DriveDemand {
    /// Determine if every quantity in the demand is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            DriveDemand::Stop => true,
            DriveDemand::ModuleStates(states) => states
                .iter()
                .all(|s| s.speed_ms.is_finite() && s.angle_rad.is_finite()),
            DriveDemand::RobotRelative(s) => {
                s.vx_ms.is_finite() && s.vy_ms.is_finite() && s.omega_rads.is_finite()
            }
            DriveDemand::FieldRelative(v) => {
                v.vx_ms.is_finite() && v.vy_ms.is_finite() && v.omega_rads.is_finite()
            }
        }
    }
}
