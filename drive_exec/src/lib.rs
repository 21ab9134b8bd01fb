//! # Drive library.
//!
//! Motion control for a four module swerve drive. The executable and the
//! benchmarks access the control components through this library.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Experimental features which can be switched on at runtime
pub mod experiments;

/// Planar rigid body geometry - poses, twists and their exponential maps
pub mod geom;

/// Swerve kinematics - conversions between chassis and module motion
pub mod kinematics;

/// Localisation - odometry fused with latent vision measurements
pub mod loc;

/// Locomotion control - converts drive demands into module states
pub mod loco_ctrl;

/// Manual control - interprets operator input
pub mod manual_ctrl;

/// Motion profiles
pub mod profile;

/// Trajectory planning and sampling
pub mod traj;

/// Trajectory control - keeps the robot on the planned trajectory
pub mod traj_ctrl;

/// Veering correction - compensates field relative demands for rotation during
/// the command latency
pub mod veering;
