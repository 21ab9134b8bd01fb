//! Manual control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::profile::TrapezoidProfile;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for manual control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Full state feedback gains of the heading controller, on heading error
    /// and on heading rate error.
    pub heading_k: [f64; 2],

    /// Profile followed by the heading setpoint on its way to a latched
    /// heading. Without a profile the setpoint is the latched heading itself.
    #[serde(default)]
    pub theta_profile: Option<TrapezoidProfile>,

    /// Control period.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Time constant of the filter on the heading rate feedback.
    ///
    /// Units: seconds
    pub theta_filter_time_constant_s: f64,

    /// Heading controller feedback terms smaller than this are dropped.
    ///
    /// Units: radians/second
    pub output_deadband_rads: f64,

    /// Rotation input larger than this releases the heading latch.
    ///
    /// Units: radians/second
    pub latch_deadband_rads: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            heading_k: [2.0, 0.25],
            theta_profile: None,
            period_s: 0.02,
            theta_filter_time_constant_s: 0.01,
            output_deadband_rads: 0.05,
            latch_deadband_rads: 0.05,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const BASE: &str = r#"
        heading_k = [2.0, 0.25]
        period_s = 0.02
        theta_filter_time_constant_s = 0.01
        output_deadband_rads = 0.05
        latch_deadband_rads = 0.05
    "#;

    #[test]
    fn test_theta_profile_checked_on_load() {
        let valid = format!("{}\n[theta_profile]\nmax_vel = 6.0\nmax_accel = 12.0", BASE);
        let params: Params = util::params::from_str(&valid).unwrap();
        assert!(params.theta_profile.is_some());

        let zero_accel = format!("{}\n[theta_profile]\nmax_vel = 6.0\nmax_accel = 0.0", BASE);
        assert!(util::params::from_str::<Params>(&zero_accel).is_err());
    }
}
