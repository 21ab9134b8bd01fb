//! Continuous time views of a trajectory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::Arc;

// Internal
use super::{TimedPose, Trajectory};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Samples a shared trajectory at arbitrary times.
#[derive(Debug, Clone)]
pub struct TrajectorySampler {
    trajectory: Arc<Trajectory>,
}

/// Steps forward through a trajectory.
///
/// Progress only moves forwards and stops at the end of the trajectory, where
/// the final sample is repeated. Use `reset` to start again.
#[derive(Debug, Clone)]
pub struct TrajectoryIterator {
    sampler: TrajectorySampler,

    /// Units: seconds
    progress_s: f64,

    current: TimedPose,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectorySampler {
    pub fn new(trajectory: Arc<Trajectory>) -> Self {
        Self { trajectory }
    }

    pub fn sample(&self, time_s: f64) -> TimedPose {
        self.trajectory.sample(time_s)
    }

    pub fn start_s(&self) -> f64 {
        self.trajectory.first().time_s
    }

    pub fn end_s(&self) -> f64 {
        self.trajectory.duration_s()
    }

    pub fn trajectory(&self) -> &Arc<Trajectory> {
        &self.trajectory
    }
}

impl TrajectoryIterator {
    pub fn new(sampler: TrajectorySampler) -> Self {
        let progress_s = sampler.start_s();
        let current = sampler.sample(progress_s);

        Self {
            sampler,
            progress_s,
            current,
        }
    }

    /// Move `dt_s` seconds along the trajectory and return the sample there.
    ///
    /// Non-positive steps leave the progress where it is.
    pub fn advance(&mut self, dt_s: f64) -> TimedPose {
        if dt_s > 0.0 {
            self.progress_s = (self.progress_s + dt_s).min(self.sampler.end_s());
            self.current = self.sampler.sample(self.progress_s);
        }

        self.current
    }

    /// The sample `dt_s` seconds ahead, without moving.
    pub fn preview(&self, dt_s: f64) -> TimedPose {
        let t = (self.progress_s + dt_s.max(0.0)).min(self.sampler.end_s());
        self.sampler.sample(t)
    }

    /// Go back to the start of the trajectory.
    pub fn reset(&mut self) {
        self.progress_s = self.sampler.start_s();
        self.current = self.sampler.sample(self.progress_s);
    }

    pub fn is_done(&self) -> bool {
        self.progress_s >= self.sampler.end_s()
    }

    pub fn sampler(&self) -> &TrajectorySampler {
        &self.sampler
    }

    pub fn current(&self) -> TimedPose {
        self.current
    }

    /// Units: seconds
    pub fn progress_s(&self) -> f64 {
        self.progress_s
    }

    /// Units: seconds
    pub fn remaining_s(&self) -> f64 {
        self.sampler.end_s() - self.progress_s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Pose2;
    use crate::traj::PoseWithMotion;

    fn traj() -> Arc<Trajectory> {
        let point = |x: f64, t: f64| TimedPose {
            point: PoseWithMotion {
                pose: Pose2::new(x, 0.0, 0.0),
                course_rad: 0.0,
                curvature_m: 0.0,
                heading_rate_radm: 0.0,
            },
            time_s: t,
            distance_m: x,
            velocity_ms: 1.0,
            accel_mss: 0.0,
        };

        Arc::new(Trajectory::new(vec![point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)]).unwrap())
    }

    #[test]
    fn test_advance_clamps_at_end() {
        let mut iter = TrajectoryIterator::new(TrajectorySampler::new(traj()));

        assert!(!iter.is_done());
        assert_eq!(iter.advance(0.5).time_s, 0.5);
        assert_eq!(iter.preview(0.25).time_s, 0.75);
        assert_eq!(iter.progress_s(), 0.5);

        // Going backwards is not possible
        assert_eq!(iter.advance(-1.0).time_s, 0.5);

        // Past the end the final sample repeats
        let end = iter.advance(10.0);
        assert_eq!(end.time_s, 2.0);
        assert!(iter.is_done());
        assert_eq!(iter.advance(0.1), end);
        assert_eq!(iter.remaining_s(), 0.0);

        iter.reset();
        assert!(!iter.is_done());
        assert_eq!(iter.current().time_s, 0.0);
    }

    #[test]
    fn test_single_point_is_done() {
        let single = Arc::new(Trajectory::new(vec![*traj().first()]).unwrap());
        let iter = TrajectoryIterator::new(TrajectorySampler::new(single));

        assert!(iter.is_done());
    }
}
