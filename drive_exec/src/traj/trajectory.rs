//! Time parameterised trajectories

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{PlannerError, PoseWithMotion};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One sample of a planned trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimedPose {
    pub point: PoseWithMotion,

    /// Time since the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Arc length from the start of the trajectory.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Speed along the path.
    ///
    /// Units: meters/second
    pub velocity_ms: f64,

    /// Acceleration along the path, constant until the next sample.
    ///
    /// Units: meters/second^2
    pub accel_mss: f64,
}

/// An ordered, non-empty sequence of timed poses starting at time zero.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    points: Vec<TimedPose>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TimedPose {
    /// Interpolate between this sample and the next one.
    ///
    /// Time is interpolated linearly, the distance travelled follows from the
    /// constant acceleration over the interval and gives the position along
    /// the arc.
    pub fn interpolate(&self, next: &TimedPose, frac: f64) -> TimedPose {
        if frac <= 0.0 {
            return *self;
        }
        if frac >= 1.0 {
            return *next;
        }

        let new_t = self.time_s + (next.time_s - self.time_s) * frac;
        let dt = new_t - self.time_s;

        let new_v = self.velocity_ms + self.accel_mss * dt;
        let new_s = self.velocity_ms * dt + 0.5 * self.accel_mss * dt * dt;

        let segment_m = next.distance_m - self.distance_m;
        let point_frac = if segment_m > 1e-12 {
            new_s / segment_m
        }
        else {
            frac
        };

        TimedPose {
            point: self.point.interpolate(&next.point, point_frac),
            time_s: new_t,
            distance_m: self.distance_m + new_s,
            velocity_ms: new_v,
            accel_mss: self.accel_mss,
        }
    }
}

impl Trajectory {
    pub fn new(points: Vec<TimedPose>) -> Result<Self, PlannerError> {
        if points.is_empty() {
            return Err(PlannerError::EmptyTrajectory);
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[TimedPose] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &TimedPose {
        &self.points[0]
    }

    pub fn last(&self) -> &TimedPose {
        &self.points[self.points.len() - 1]
    }

    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        self.last().time_s
    }

    /// Sample the trajectory at a time since its start.
    ///
    /// Times before the start or after the end give the first or last sample.
    pub fn sample(&self, time_s: f64) -> TimedPose {
        let first = self.first();
        if !(time_s > first.time_s) {
            return *first;
        }

        let last = self.last();
        if time_s >= last.time_s {
            return *last;
        }

        // First sample after the requested time, never zero given the checks
        // above
        let i = self.points.partition_point(|p| p.time_s <= time_s);
        let prev = &self.points[i - 1];
        let next = &self.points[i];

        let span = next.time_s - prev.time_s;
        if span <= 0.0 {
            return *next;
        }

        prev.interpolate(next, (time_s - prev.time_s) / span)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Pose2;
    use approx::assert_abs_diff_eq;

    fn timed(x: f64, time_s: f64, velocity_ms: f64, accel_mss: f64) -> TimedPose {
        TimedPose {
            point: PoseWithMotion {
                pose: Pose2::new(x, 0.0, 0.0),
                course_rad: 0.0,
                curvature_m: 0.0,
                heading_rate_radm: 0.0,
            },
            time_s,
            distance_m: x,
            velocity_ms,
            accel_mss,
        }
    }

    #[test]
    fn test_sample_constant_accel() {
        // Accelerating from rest at 1 m/s^2 for 2 s
        let traj = Trajectory::new(vec![timed(0.0, 0.0, 0.0, 1.0), timed(2.0, 2.0, 2.0, 1.0)])
            .unwrap();

        let s = traj.sample(1.0);
        assert_abs_diff_eq!(s.time_s, 1.0);
        assert_abs_diff_eq!(s.velocity_ms, 1.0);

        // Distance follows the acceleration, not a linear blend
        assert_abs_diff_eq!(s.point.pose.x(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(s.distance_m, 0.5, epsilon = 1e-9);

        // Clamped at the ends
        assert_eq!(traj.sample(-1.0), *traj.first());
        assert_eq!(traj.sample(10.0), *traj.last());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(Trajectory::new(Vec::new()), Err(PlannerError::EmptyTrajectory)));
    }

    #[test]
    fn test_serialise() {
        let traj = Trajectory::new(vec![timed(0.0, 0.0, 0.0, 1.0), timed(2.0, 2.0, 2.0, 1.0)])
            .unwrap();

        let json = serde_json::to_value(&traj).unwrap();
        let points = json["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1]["time_s"], 2.0);
        assert_eq!(points[1]["point"]["pose"]["position_m"][0], 2.0);
    }
}
