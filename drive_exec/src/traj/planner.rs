//! Trajectory planner

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use std::sync::Arc;

// Internal
use super::{
    time_parameterize, CentripetalAccelerationConstraint, HolonomicSpline, Params, Path,
    PlannerError, SwerveDriveDynamicsConstraint, TimingConstraint, TimingLimits, Trajectory,
};
use crate::geom::Pose2;
use crate::kinematics::SwerveKinematics;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Plans trajectories for a particular drivetrain.
#[derive(Debug, Clone)]
pub struct TrajectoryPlanner {
    params: Params,
    kinematics: Arc<SwerveKinematics>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectoryPlanner {
    /// Create a planner, checking that the path tolerances, sample step and
    /// centripetal limit are all positive.
    pub fn new(params: Params, kinematics: Arc<SwerveKinematics>) -> Result<Self, PlannerError> {
        check_param("max_dx_m", params.max_dx_m)?;
        check_param("max_dy_m", params.max_dy_m)?;
        check_param("max_dtheta_rad", params.max_dtheta_rad)?;
        check_param("step_m", params.step_m)?;
        check_param("max_centripetal_accel_mss", params.max_centripetal_accel_mss)?;

        Ok(Self { params, kinematics })
    }

    /// The drivetrain's own constraints: centripetal acceleration and module
    /// dynamics.
    pub fn default_constraints(&self) -> Vec<Box<dyn TimingConstraint>> {
        vec![
            Box::new(CentripetalAccelerationConstraint::new(
                self.params.max_centripetal_accel_mss,
            )),
            Box::new(SwerveDriveDynamicsConstraint::new(self.kinematics.clone())),
        ]
    }

    /// Plan a trajectory through the waypoints.
    ///
    /// The heading of each waypoint is the course (direction of travel) at
    /// that point, while `headings_rad` gives the robot heading, which is
    /// interpolated independently. Waypoints and headings must have the same
    /// length of at least two.
    pub fn generate_trajectory(
        &self,
        waypoints: &[Pose2],
        headings_rad: &[f64],
        constraints: &[Box<dyn TimingConstraint>],
        limits: &TimingLimits,
    ) -> Result<Trajectory, PlannerError> {
        if waypoints.len() < 2 {
            return Err(PlannerError::TooFewWaypoints(waypoints.len()));
        }
        if waypoints.len() != headings_rad.len() {
            return Err(PlannerError::HeadingCountMismatch(
                waypoints.len(),
                headings_rad.len(),
            ));
        }
        for (i, (wp, heading)) in waypoints.iter().zip(headings_rad).enumerate() {
            if !(wp.x().is_finite() && wp.y().is_finite() && wp.heading_rad.is_finite())
                || !heading.is_finite()
            {
                return Err(PlannerError::NonFiniteWaypoint(i));
            }
        }

        let splines: Vec<HolonomicSpline> = waypoints
            .windows(2)
            .zip(headings_rad.windows(2))
            .map(|(w, h)| HolonomicSpline::new(&w[0], &w[1], h[0], h[1]))
            .collect();

        let path = Path::from_splines(&splines, &self.params);

        // Resample at a fixed arc length step
        let length_m = path.length_m();
        let num_states = (length_m / self.params.step_m + 1.0).ceil() as usize;
        let samples = (0..num_states)
            .filter_map(|i| path.sample((i as f64 * self.params.step_m).min(length_m)))
            .collect::<Vec<_>>();

        debug!(
            "Planned path of {:.3} m from {} spline points, {} samples",
            length_m,
            path.len(),
            samples.len()
        );

        let trajectory = time_parameterize(&samples, constraints, limits)?;

        debug!("Trajectory duration {:.3} s", trajectory.duration_s());

        Ok(trajectory)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_param(name: &'static str, value: f64) -> Result<(), PlannerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    }
    else {
        Err(PlannerError::InvalidParameter(name, value))
    }
}
