//! Profiled position servo

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Deserialize;

// Internal
use super::{State1d, TrapezoidProfile};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a position servo.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ServoParams {
    pub profile: TrapezoidProfile,

    /// Proportional gain on the setpoint position error.
    ///
    /// Units: 1/second
    pub k_p: f64,

    /// Fixed control period.
    ///
    /// Units: seconds
    pub period_s: f64,
}

/// Drives a single axis to a goal position by following a trapezoid profile,
/// outputting a velocity demand.
#[derive(Debug, Clone)]
pub struct PositionServo {
    params: ServoParams,

    /// Current profile setpoint, `None` while the servo is not engaged.
    setpoint: Option<State1d>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PositionServo {
    pub fn new(params: ServoParams) -> Self {
        Self {
            params,
            setpoint: None,
        }
    }

    /// Disengage the servo.
    ///
    /// The next call to `set_position` starts the profile from the measured
    /// state, so there is no artificial step after a period of disuse.
    pub fn reset(&mut self) {
        self.setpoint = None;
    }

    /// Advance the profile towards `goal_x` and return the velocity demand.
    pub fn set_position(&mut self, goal_x: f64, measurement: State1d) -> f64 {
        let current = self.setpoint.unwrap_or(measurement);

        let setpoint = self.params.profile.calculate(
            self.params.period_s,
            current,
            State1d::new(goal_x, 0.0),
        );
        self.setpoint = Some(setpoint);

        let demand = setpoint.v + self.params.k_p * (setpoint.x - measurement.x);

        trace!(
            "PositionServo setpoint ({:.4}, {:.4}), demand {:.4}",
            setpoint.x,
            setpoint.v,
            demand
        );

        demand
    }

    pub fn get_setpoint(&self) -> Option<State1d> {
        self.setpoint
    }

    /// True once the profile has reached the goal and the measurement is
    /// within `tolerance` of it.
    pub fn at_goal(&self, goal_x: f64, measurement: State1d, tolerance: f64) -> bool {
        match self.setpoint {
            Some(sp) => sp.x == goal_x && (measurement.x - goal_x).abs() <= tolerance,
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn servo() -> PositionServo {
        PositionServo::new(ServoParams {
            profile: TrapezoidProfile::new(1.0, 2.0).unwrap(),
            k_p: 5.0,
            period_s: 0.02,
        })
    }

    #[test]
    fn test_tracks_goal() {
        let mut servo = servo();
        let mut measurement = State1d::new(0.0, 0.0);

        // Perfect actuator which achieves the demanded velocity
        for _ in 0..200 {
            let v = servo.set_position(1.0, measurement);
            measurement = State1d::new(measurement.x + v * 0.02, v);
        }

        assert_abs_diff_eq!(measurement.x, 1.0, epsilon = 1e-3);
        assert!(servo.at_goal(1.0, measurement, 1e-3));
    }

    #[test]
    fn test_reset_starts_from_measurement() {
        let mut servo = servo();
        assert!(servo.get_setpoint().is_none());

        servo.set_position(1.0, State1d::new(0.0, 0.0));
        servo.set_position(1.0, State1d::new(0.0, 0.0));
        assert!(servo.get_setpoint().is_some());

        // After disuse the axis has moved elsewhere
        servo.reset();
        assert!(servo.get_setpoint().is_none());

        let measurement = State1d::new(3.0, 0.0);
        let demand = servo.set_position(3.0, measurement);
        assert_abs_diff_eq!(demand, 0.0);
        assert_abs_diff_eq!(servo.get_setpoint().unwrap().x, 3.0);
    }
}
