//! # Trajectory module
//!
//! Planning of time parameterised holonomic trajectories through waypoints,
//! and continuous-time sampling of the result.
//!
//! A trajectory is planned in three stages:
//!
//! 1. A quintic spline is fitted between each pair of waypoints and
//!    recursively subdivided until every segment is short and nearly straight
//!    (`path`).
//! 2. The path is resampled at a fixed arc length step, so the number of
//!    samples depends only on the path length.
//! 3. A forward and backward pass over the samples finds the fastest velocity
//!    profile allowed by the acceleration limits and the timing constraints,
//!    which is then integrated to give the time of each sample (`timing`).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod constraint;
mod params;
mod path;
mod planner;
mod sampler;
mod spline;
mod timing;
mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::geom::Pose2;
use util::maths::angle_modulus;

pub use constraint::*;
pub use params::*;
pub use path::*;
pub use planner::*;
pub use sampler::*;
pub use spline::*;
pub use timing::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on a path, annotated with the local shape of the path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseWithMotion {
    /// Position and robot heading.
    pub pose: Pose2,

    /// Direction of travel, which is independent of the robot heading.
    ///
    /// Units: radians
    pub course_rad: f64,

    /// Curvature of the path.
    ///
    /// Units: 1/meters
    pub curvature_m: f64,

    /// Change in robot heading per distance travelled.
    ///
    /// Units: radians/meter
    pub heading_rate_radm: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while planning a trajectory.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("At least two waypoints are required, found {0}")]
    TooFewWaypoints(usize),

    #[error("Found {0} waypoints but {1} headings")]
    HeadingCountMismatch(usize, usize),

    #[error("Waypoint {0} is not finite")]
    NonFiniteWaypoint(usize),

    #[error("Constraints are infeasible at distance {0:.4} m: {1}")]
    Infeasible(f64, &'static str),

    #[error("Cannot build a trajectory with no points")]
    EmptyTrajectory,

    #[error("Planner parameter {0} must be positive and finite, found {1}")]
    InvalidParameter(&'static str, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseWithMotion {
    /// The pose of the path itself, whose heading is the course.
    fn course_pose(&self) -> Pose2 {
        Pose2 {
            position_m: self.pose.position_m,
            heading_rad: self.course_rad,
        }
    }

    /// Distance along the arc between this point and `other`.
    pub fn distance_m(&self, other: &PoseWithMotion) -> f64 {
        self.course_pose().log(&other.course_pose()).norm()
    }

    /// Interpolate along the arc to `other`.
    ///
    /// The robot heading turns the short way, the curvature and heading rate
    /// are interpolated linearly.
    pub fn interpolate(&self, other: &PoseWithMotion, frac: f64) -> PoseWithMotion {
        if frac <= 0.0 {
            return *self;
        }
        if frac >= 1.0 {
            return *other;
        }

        let course_pose = self.course_pose().interpolate(&other.course_pose(), frac);
        let heading = self.pose.heading_rad
            + frac * angle_modulus(other.pose.heading_rad - self.pose.heading_rad);

        PoseWithMotion {
            pose: Pose2::new(course_pose.x(), course_pose.y(), heading),
            course_rad: course_pose.heading_rad,
            curvature_m: lerp(self.curvature_m, other.curvature_m, frac),
            heading_rate_radm: lerp(self.heading_rate_radm, other.heading_rate_radm, frac),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}
