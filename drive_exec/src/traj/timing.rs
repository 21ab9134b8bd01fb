//! Time parameterisation of a path under velocity and acceleration limits

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{PlannerError, PoseWithMotion, TimedPose, TimingConstraint, Trajectory};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Limits found for one sample during the forward and backward passes.
#[derive(Debug, Clone, Copy)]
struct ConstrainedState {
    point: PoseWithMotion,

    /// Units: meters
    distance_m: f64,

    /// Units: meters/second
    max_velocity_ms: f64,

    /// Units: meters/second^2
    min_accel_mss: f64,

    /// Units: meters/second^2
    max_accel_mss: f64,
}

/// Velocity and acceleration limits for a trajectory as a whole.
#[derive(Debug, Clone, Copy)]
pub struct TimingLimits {
    /// Units: meters/second
    pub start_velocity_ms: f64,

    /// Units: meters/second
    pub end_velocity_ms: f64,

    /// Units: meters/second
    pub max_velocity_ms: f64,

    /// Units: meters/second^2
    pub max_abs_accel_mss: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the fastest velocity profile along `points` which respects the limits
/// and all constraints, and integrate it to give the time of each point.
///
/// The forward pass caps the velocity at each point by what can be reached
/// from the previous point. The backward pass then caps it by what still
/// allows slowing down to the end velocity. Where a constraint is tighter
/// than the acceleration limit the neighbouring point's acceleration is
/// adjusted and the pass retried.
pub fn time_parameterize(
    points: &[PoseWithMotion],
    constraints: &[Box<dyn TimingConstraint>],
    limits: &TimingLimits,
) -> Result<Trajectory, PlannerError> {
    if points.is_empty() {
        return Err(PlannerError::EmptyTrajectory);
    }

    let max_abs_accel = limits.max_abs_accel_mss.abs();

    // ---- FORWARD PASS ----

    let mut states: Vec<ConstrainedState> = Vec::with_capacity(points.len());

    let mut predecessor = ConstrainedState {
        point: points[0],
        distance_m: 0.0,
        max_velocity_ms: limits.start_velocity_ms,
        min_accel_mss: -max_abs_accel,
        max_accel_mss: max_abs_accel,
    };

    for (i, point) in points.iter().enumerate() {
        let ds = point.distance_m(&predecessor.point);
        let mut state = ConstrainedState {
            point: *point,
            distance_m: predecessor.distance_m + ds,
            max_velocity_ms: std::f64::INFINITY,
            min_accel_mss: -max_abs_accel,
            max_accel_mss: max_abs_accel,
        };

        loop {
            // Reachable from the predecessor
            state.max_velocity_ms = limits.max_velocity_ms.min(
                (predecessor.max_velocity_ms.powi(2) + 2.0 * predecessor.max_accel_mss * ds)
                    .sqrt(),
            );
            if state.max_velocity_ms.is_nan() {
                return Err(PlannerError::Infeasible(state.distance_m, "unreachable velocity"));
            }

            state.min_accel_mss = -max_abs_accel;
            state.max_accel_mss = max_abs_accel;

            for constraint in constraints {
                state.max_velocity_ms = state.max_velocity_ms.min(constraint.max_velocity(point));
            }
            if state.max_velocity_ms < 0.0 {
                return Err(PlannerError::Infeasible(state.distance_m, "negative velocity limit"));
            }

            apply_accel_constraints(&mut state, constraints)?;

            if ds < EPSILON {
                break;
            }

            // If the constraints limit acceleration more than was assumed to
            // reach this point, lower the predecessor's limit and go again
            let actual_accel =
                (state.max_velocity_ms.powi(2) - predecessor.max_velocity_ms.powi(2)) / (2.0 * ds);
            if state.max_accel_mss < actual_accel - EPSILON {
                predecessor.max_accel_mss = state.max_accel_mss;
            }
            else {
                if actual_accel > predecessor.min_accel_mss + EPSILON {
                    predecessor.max_accel_mss = actual_accel;
                }
                break;
            }
        }

        if i > 0 {
            states[i - 1] = predecessor;
        }
        states.push(state);
        predecessor = state;
    }

    // ---- BACKWARD PASS ----

    let last = states[states.len() - 1];
    let mut successor = ConstrainedState {
        point: last.point,
        distance_m: last.distance_m,
        max_velocity_ms: limits.end_velocity_ms,
        min_accel_mss: -max_abs_accel,
        max_accel_mss: max_abs_accel,
    };

    for i in (0..states.len()).rev() {
        let mut state = states[i];
        let ds = state.distance_m - successor.distance_m;

        loop {
            let new_max_velocity =
                (successor.max_velocity_ms.powi(2) + 2.0 * successor.min_accel_mss * ds).sqrt();
            if new_max_velocity >= state.max_velocity_ms {
                // Forward pass limit is tighter
                break;
            }

            state.max_velocity_ms = new_max_velocity;
            if state.max_velocity_ms.is_nan() {
                return Err(PlannerError::Infeasible(state.distance_m, "cannot decelerate"));
            }

            apply_accel_constraints(&mut state, constraints)?;

            if ds > -EPSILON {
                break;
            }

            let actual_accel =
                (state.max_velocity_ms.powi(2) - successor.max_velocity_ms.powi(2)) / (2.0 * ds);
            if state.min_accel_mss > actual_accel + EPSILON {
                successor.min_accel_mss = state.min_accel_mss;
            }
            else {
                successor.min_accel_mss = actual_accel;
                break;
            }
        }

        if i + 1 < states.len() {
            states[i + 1] = successor;
        }
        states[i] = state;
        successor = state;
    }

    // ---- INTEGRATE ----

    let mut timed: Vec<TimedPose> = Vec::with_capacity(states.len());
    let mut t = 0.0;
    let mut s = 0.0;
    let mut v = 0.0;

    for (i, state) in states.iter().enumerate() {
        let ds = state.distance_m - s;
        let accel = if ds.abs() > EPSILON {
            (state.max_velocity_ms.powi(2) - v * v) / (2.0 * ds)
        }
        else {
            0.0
        };

        let mut dt = 0.0;
        if i > 0 {
            timed[i - 1].accel_mss = accel;

            if accel.abs() > EPSILON {
                dt = (state.max_velocity_ms - v) / accel;
            }
            else if v.abs() > EPSILON {
                dt = ds / v;
            }
            else if ds.abs() > EPSILON {
                return Err(PlannerError::Infeasible(state.distance_m, "stationary with distance left"));
            }
        }

        t += dt;
        if !t.is_finite() {
            return Err(PlannerError::Infeasible(state.distance_m, "non-finite time"));
        }

        v = state.max_velocity_ms;
        s = state.distance_m;

        timed.push(TimedPose {
            point: state.point,
            time_s: t,
            distance_m: s,
            velocity_ms: v,
            accel_mss: accel,
        });
    }

    Trajectory::new(timed)
}

/// Narrow the state's acceleration range by all the constraints at its
/// current velocity limit.
fn apply_accel_constraints(
    state: &mut ConstrainedState,
    constraints: &[Box<dyn TimingConstraint>],
) -> Result<(), PlannerError> {
    for constraint in constraints {
        let min_max = constraint.min_max_accel(&state.point, state.max_velocity_ms);
        if !min_max.is_valid() {
            return Err(PlannerError::Infeasible(state.distance_m, "invalid acceleration range"));
        }

        state.min_accel_mss = state.min_accel_mss.max(min_max.min_mss);
        state.max_accel_mss = state.max_accel_mss.min(min_max.max_mss);
    }

    if state.min_accel_mss > state.max_accel_mss {
        return Err(PlannerError::Infeasible(state.distance_m, "empty acceleration range"));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Pose2;
    use crate::traj::CentripetalAccelerationConstraint;
    use approx::assert_abs_diff_eq;

    fn line(length_m: f64, step_m: f64) -> Vec<PoseWithMotion> {
        let n = (length_m / step_m).round() as usize;
        (0..=n)
            .map(|i| PoseWithMotion {
                pose: Pose2::new(i as f64 * step_m, 0.0, 0.0),
                course_rad: 0.0,
                curvature_m: 0.0,
                heading_rate_radm: 0.0,
            })
            .collect()
    }

    fn limits(max_velocity_ms: f64, max_abs_accel_mss: f64) -> TimingLimits {
        TimingLimits {
            start_velocity_ms: 0.0,
            end_velocity_ms: 0.0,
            max_velocity_ms,
            max_abs_accel_mss,
        }
    }

    #[test]
    fn test_trapezoid_on_line() {
        // 4 m at 1 m/s and 1 m/s^2: 1 s accelerating, 3 s cruising, 1 s
        // decelerating
        let traj = time_parameterize(&line(4.0, 0.01), &[], &limits(1.0, 1.0)).unwrap();

        assert_abs_diff_eq!(traj.duration_s(), 5.0, epsilon = 1e-3);
        assert_abs_diff_eq!(traj.first().velocity_ms, 0.0);
        assert_abs_diff_eq!(traj.last().velocity_ms, 0.0);

        let mid = traj.sample(2.5);
        assert_abs_diff_eq!(mid.velocity_ms, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mid.accel_mss, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mid.point.pose.x(), 2.0, epsilon = 1e-3);

        // Time and distance increase together
        for pair in traj.points().windows(2) {
            assert!(pair[1].time_s > pair[0].time_s);
            assert!(pair[1].distance_m > pair[0].distance_m);
        }
    }

    #[test]
    fn test_constraint_caps_velocity() {
        // Gentle constant curvature, centripetal limit of 0.25 m/s^2 caps
        // speed at 0.5 m/s
        let mut points = line(3.0, 0.01);
        for p in points.iter_mut() {
            p.curvature_m = 1.0;
        }
        let constraints: Vec<Box<dyn TimingConstraint>> =
            vec![Box::new(CentripetalAccelerationConstraint::new(0.25))];

        let traj = time_parameterize(&points, &constraints, &limits(2.0, 1.0)).unwrap();
        let fastest = traj.points().iter().map(|p| p.velocity_ms).fold(0.0, f64::max);

        assert_abs_diff_eq!(fastest, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_end_velocity() {
        let mut lim = limits(2.0, 1.0);
        lim.end_velocity_ms = 1.0;
        lim.start_velocity_ms = 1.0;

        let traj = time_parameterize(&line(1.0, 0.01), &[], &lim).unwrap();
        assert_abs_diff_eq!(traj.first().velocity_ms, 1.0);
        assert_abs_diff_eq!(traj.last().velocity_ms, 1.0);
    }

    #[test]
    fn test_single_point() {
        let traj = time_parameterize(&line(0.0, 0.01), &[], &limits(1.0, 1.0)).unwrap();

        assert_eq!(traj.len(), 1);
        assert_eq!(traj.duration_s(), 0.0);
    }
}
