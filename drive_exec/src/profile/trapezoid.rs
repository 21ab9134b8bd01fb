//! Trapezoidal motion profile

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::convert::TryFrom;

// Internal
use super::{ProfileError, State1d};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trapezoidal velocity profile between two states.
///
/// The profile is stateless, each call plans the whole motion from the given
/// initial state and returns the state one step along it.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(try_from = "ProfileLimits")]
pub struct TrapezoidProfile {
    /// Units: per second
    max_vel: f64,

    /// Units: per second^2
    max_accel: f64,
}

/// Unchecked limits as they appear in a parameter file.
#[derive(Debug, Clone, Copy, Deserialize)]
struct ProfileLimits {
    max_vel: f64,
    max_accel: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrapezoidProfile {
    /// Create a new profile, both limits must be positive and finite.
    pub fn new(max_vel: f64, max_accel: f64) -> Result<Self, ProfileError> {
        check_limit("max_vel", max_vel)?;
        check_limit("max_accel", max_accel)?;

        Ok(Self { max_vel, max_accel })
    }

    pub fn max_vel(&self) -> f64 {
        self.max_vel
    }

    pub fn max_accel(&self) -> f64 {
        self.max_accel
    }

    /// Calculate the state `dt_s` seconds along the profile from `initial` to
    /// `goal`.
    ///
    /// A non-positive `dt_s` is no update and returns `initial`. An initial
    /// speed above the limit, in either direction, is clamped to the limit.
    pub fn calculate(&self, dt_s: f64, initial: State1d, goal: State1d) -> State1d {
        if !(dt_s > 0.0) {
            return initial;
        }

        // Plan as if moving in the positive direction
        let direction = if initial.x > goal.x { -1.0 } else { 1.0 };
        let mut current = directed(initial, direction);
        let goal = directed(goal, direction);

        current.v = clamp(&current.v, &-self.max_vel, &self.max_vel);

        let max_a = self.max_accel;

        // Distances which would be covered accelerating from/to rest, which
        // lets the profile be treated as a full trapezoid from zero velocity
        let cutoff_begin = current.v / max_a;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_a / 2.0;

        let cutoff_end = goal.v / max_a;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_a / 2.0;

        let full_trapezoid_dist = cutoff_dist_begin + (goal.x - current.x) + cutoff_dist_end;
        let mut accel_time = self.max_vel / max_a;
        let mut full_speed_dist = full_trapezoid_dist - accel_time * accel_time * max_a;

        // Triangular profile, never reaches max velocity
        if full_speed_dist < 0.0 {
            accel_time = (full_trapezoid_dist / max_a).max(0.0).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = accel_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / self.max_vel;
        let end_decel = end_full_speed + accel_time - cutoff_end;

        let t = dt_s;
        let mut result = current;

        if t < end_accel {
            result.v += t * max_a;
            result.x += (current.v + t * max_a / 2.0) * t;
        }
        else if t < end_full_speed {
            result.v = self.max_vel;
            result.x += (current.v + end_accel * max_a / 2.0) * end_accel
                + self.max_vel * (t - end_accel);
        }
        else if t <= end_decel {
            let time_left = end_decel - t;
            result.v = goal.v + time_left * max_a;
            result.x = goal.x - (goal.v + time_left * max_a / 2.0) * time_left;
        }
        else {
            result = goal;
        }

        directed(result, direction)
    }
}

impl TryFrom<ProfileLimits> for TrapezoidProfile {
    type Error = ProfileError;

    fn try_from(limits: ProfileLimits) -> Result<Self, Self::Error> {
        Self::new(limits.max_vel, limits.max_accel)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_limit(name: &'static str, value: f64) -> Result<(), ProfileError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    }
    else {
        Err(ProfileError::InvalidLimit(name, value))
    }
}

fn directed(state: State1d, direction: f64) -> State1d {
    State1d::new(state.x * direction, state.v * direction)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT_S: f64 = 0.02;

    /// Run the profile until the goal is reached, checking limits at every
    /// step. Returns the number of steps taken.
    fn run_to_goal(profile: &TrapezoidProfile, mut state: State1d, goal: State1d) -> usize {
        for step in 0..10_000 {
            let next = profile.calculate(DT_S, state, goal);

            assert!(next.v.abs() <= profile.max_vel() + 1e-9);
            assert!((next.v - state.v).abs() <= profile.max_accel() * DT_S + 1e-9);

            state = next;
            if state == goal {
                return step;
            }
        }
        panic!("Profile did not reach the goal");
    }

    #[test]
    fn test_reaches_goal() {
        let profile = TrapezoidProfile::new(1.0, 1.0).unwrap();

        // Accelerate 1 s, cruise 2 s, decelerate 1 s
        let steps = run_to_goal(&profile, State1d::new(0.0, 0.0), State1d::new(3.0, 0.0));
        assert!((195..=205).contains(&steps));
    }

    #[test]
    fn test_goal_behind() {
        let profile = TrapezoidProfile::new(2.0, 3.0).unwrap();

        let first = profile.calculate(DT_S, State1d::new(1.0, 0.0), State1d::new(-2.0, 0.0));
        assert!(first.v < 0.0);
        assert!(first.x < 1.0);

        run_to_goal(&profile, State1d::new(1.0, 0.0), State1d::new(-2.0, 0.0));
    }

    #[test]
    fn test_triangular() {
        let profile = TrapezoidProfile::new(10.0, 1.0).unwrap();

        // Too short to reach full speed, peaks at 1 m/s halfway
        let mut state = State1d::new(0.0, 0.0);
        let goal = State1d::new(1.0, 0.0);
        let mut peak = 0.0f64;
        for _ in 0..100 {
            state = profile.calculate(DT_S, state, goal);
            peak = peak.max(state.v);
        }
        assert_abs_diff_eq!(peak, 1.0, epsilon = 0.03);
    }

    #[test]
    fn test_initial_velocity_clamped() {
        let profile = TrapezoidProfile::new(1.0, 1.0).unwrap();

        let next = profile.calculate(DT_S, State1d::new(0.0, 5.0), State1d::new(10.0, 0.0));
        assert!(next.v <= 1.0 + 1e-9);

        // Moving away from the goal faster than the limit
        let goal = State1d::new(10.0, 0.0);
        let next = profile.calculate(DT_S, State1d::new(0.0, -5.0), goal);
        assert!(next.v.abs() <= 1.0 + 1e-9, "speed {} above limit", next.v);
        assert!(next.v > -1.0);
        run_to_goal(&profile, next, goal);

        // Goal behind, already moving towards it too fast
        let goal = State1d::new(-10.0, 0.0);
        let next = profile.calculate(DT_S, State1d::new(0.0, -5.0), goal);
        assert!(next.v.abs() <= 1.0 + 1e-9, "speed {} above limit", next.v);
        assert!(next.x < 0.0);
        run_to_goal(&profile, next, goal);

        // Goal behind, moving away from it too fast
        let next = profile.calculate(DT_S, State1d::new(0.0, 5.0), goal);
        assert!(next.v.abs() <= 1.0 + 1e-9, "speed {} above limit", next.v);
        run_to_goal(&profile, next, goal);
    }

    #[test]
    fn test_invalid_limits() {
        assert!(matches!(
            TrapezoidProfile::new(1.0, 0.0),
            Err(ProfileError::InvalidLimit("max_accel", _))
        ));
        assert!(matches!(
            TrapezoidProfile::new(-1.0, 1.0),
            Err(ProfileError::InvalidLimit("max_vel", _))
        ));
        assert!(TrapezoidProfile::new(1.0, std::f64::NAN).is_err());

        // Limits read from a parameter file are checked too
        let zero_accel = r#"{"max_vel": 1.0, "max_accel": 0.0}"#;
        assert!(serde_json::from_str::<TrapezoidProfile>(zero_accel).is_err());
        let profile: TrapezoidProfile =
            serde_json::from_str(r#"{"max_vel": 2.0, "max_accel": 4.0}"#).unwrap();
        assert_abs_diff_eq!(profile.max_accel(), 4.0);
    }

    #[test]
    fn test_no_update_without_time() {
        let profile = TrapezoidProfile::new(1.0, 1.0).unwrap();
        let initial = State1d::new(0.3, 0.2);

        assert_eq!(profile.calculate(0.0, initial, State1d::new(5.0, 0.0)), initial);
        assert_eq!(profile.calculate(-0.1, initial, State1d::new(5.0, 0.0)), initial);
    }
}
