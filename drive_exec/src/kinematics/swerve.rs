//! Swerve drive forward and inverse kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{DMatrix, DVector, Vector2};

// Internal
use super::{
    ChassisSpeeds, KinematicLimits, KinematicsError, ModulePosition, ModuleState, Params,
    NUM_MODULES,
};
use crate::geom::Twist2;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when inverting the geometry matrix.
const PINV_EPS: f64 = 1e-9;

/// Module speeds below this leave the module angle undefined.
const MIN_MODULE_SPEED_MS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematics of a swerve drive with fixed module geometry.
///
/// Immutable once built, share between users with an `Arc`.
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    /// Module positions relative to the robot centre.
    ///
    /// Units: meters,
    /// Frame: Robot body
    module_pos_m_rb: [Vector2<f64>; NUM_MODULES],

    /// Maps `[vx, vy, omega]` onto interleaved module velocity components
    /// `[vx_0, vy_0, vx_1, vy_1, ...]`.
    inverse_kinematics: DMatrix<f64>,

    /// Least squares inverse of `inverse_kinematics`.
    forward_kinematics: DMatrix<f64>,

    limits: KinematicLimits,

    /// Distance from the robot centre to the furthest module.
    ///
    /// Units: meters
    drive_radius_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    pub fn new(params: &Params) -> Result<Self, KinematicsError> {
        check_limit("max_drive_velocity_ms", params.limits.max_drive_velocity_ms)?;
        check_limit("max_drive_accel_mss", params.limits.max_drive_accel_mss)?;
        check_limit("max_steering_velocity_rads", params.limits.max_steering_velocity_rads)?;

        let mut module_pos_m_rb = [Vector2::zeros(); NUM_MODULES];
        let mut inverse_kinematics = DMatrix::zeros(2 * NUM_MODULES, 3);

        for (i, pos) in params.module_pos_m_rb.iter().enumerate() {
            module_pos_m_rb[i] = Vector2::new(pos[0], pos[1]);

            // The module velocity is the chassis velocity plus omega cross the
            // module position
            inverse_kinematics[(2 * i, 0)] = 1.0;
            inverse_kinematics[(2 * i, 2)] = -pos[1];
            inverse_kinematics[(2 * i + 1, 1)] = 1.0;
            inverse_kinematics[(2 * i + 1, 2)] = pos[0];
        }

        if inverse_kinematics.rank(PINV_EPS) < 3 {
            return Err(KinematicsError::DegenerateGeometry);
        }

        let forward_kinematics = inverse_kinematics
            .clone()
            .pseudo_inverse(PINV_EPS)
            .map_err(KinematicsError::PseudoInverseFailed)?;

        let drive_radius_m = module_pos_m_rb
            .iter()
            .map(|p| p.norm())
            .fold(0.0, f64::max);

        debug!(
            "SwerveKinematics built with drive radius {:.4} m, max omega {:.3} rad/s",
            drive_radius_m,
            params.limits.max_drive_velocity_ms / drive_radius_m
        );

        Ok(Self {
            module_pos_m_rb,
            inverse_kinematics,
            forward_kinematics,
            limits: params.limits,
            drive_radius_m,
        })
    }

    pub fn limits(&self) -> &KinematicLimits {
        &self.limits
    }

    pub fn module_positions_m_rb(&self) -> &[Vector2<f64>; NUM_MODULES] {
        &self.module_pos_m_rb
    }

    /// Fastest rotation possible with no translation.
    ///
    /// Units: radians/second
    pub fn max_angular_speed_rads(&self) -> f64 {
        self.limits.max_drive_velocity_ms / self.drive_radius_m
    }

    /// Calculate the module demands which achieve the given chassis speeds.
    ///
    /// No limits are applied. A module with no speed is given an angle of
    /// zero.
    pub fn to_module_states(&self, speeds: &ChassisSpeeds) -> [ModuleState; NUM_MODULES] {
        let chassis = DVector::from_column_slice(&[speeds.vx_ms, speeds.vy_ms, speeds.omega_rads]);
        let module_vels = &self.inverse_kinematics * chassis;

        let mut states = [ModuleState::default(); NUM_MODULES];

        for (i, state) in states.iter_mut().enumerate() {
            let vx = module_vels[2 * i];
            let vy = module_vels[2 * i + 1];
            let speed = vx.hypot(vy);

            *state = if speed < MIN_MODULE_SPEED_MS {
                ModuleState::new(0.0, 0.0)
            }
            else {
                ModuleState::new(speed, vy.atan2(vx))
            };
        }

        states
    }

    /// Recover the chassis speeds from measured module states.
    ///
    /// This is the least squares solution, exact when the module states are
    /// consistent with rigid body motion.
    pub fn to_chassis_speeds(&self, states: &[ModuleState; NUM_MODULES]) -> ChassisSpeeds {
        let chassis = &self.forward_kinematics
            * self.module_vector(states.iter().map(|s| (s.speed_ms, s.angle_rad)));

        ChassisSpeeds::new(chassis[0], chassis[1], chassis[2])
    }

    /// Recover the robot-frame motion from the change in module positions
    /// over one update.
    ///
    /// The returned `dtheta_rad` is the wheel-derived rotation, which odometry
    /// replaces with the gyro's when one is available.
    pub fn to_twist(&self, deltas: &[ModulePosition; NUM_MODULES]) -> Twist2 {
        let twist = &self.forward_kinematics
            * self.module_vector(deltas.iter().map(|d| (d.distance_m, d.angle_rad)));

        Twist2::new(twist[0], twist[1], twist[2])
    }

    /// Build the interleaved cartesian vector from polar module quantities.
    fn module_vector<I>(&self, polar: I) -> DVector<f64>
    where
        I: Iterator<Item = (f64, f64)>,
    {
        let mut vec = DVector::zeros(2 * NUM_MODULES);

        for (i, (mag, angle)) in polar.enumerate().take(NUM_MODULES) {
            vec[2 * i] = mag * angle.cos();
            vec[2 * i + 1] = mag * angle.sin();
        }

        vec
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_limit(name: &'static str, value: f64) -> Result<(), KinematicsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    }
    else {
        Err(KinematicsError::InvalidLimit(name, value))
    }
}

/// Kinematics for a square 4 module chassis used throughout the tests.
#[cfg(test)]
pub(crate) fn test_kinematics() -> SwerveKinematics {
    SwerveKinematics::new(&Params {
        module_pos_m_rb: [
            [0.2635, 0.2635],
            [0.2635, -0.2635],
            [-0.2635, 0.2635],
            [-0.2635, -0.2635],
        ],
        limits: KinematicLimits {
            max_drive_velocity_ms: 4.5,
            max_drive_accel_mss: 4.4,
            max_steering_velocity_rads: 13.0,
        },
    })
    .unwrap()
}
