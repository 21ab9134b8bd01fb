//! Switchable experimental behaviours
//!
//! Experiments are features which can be turned on and off at runtime while
//! they are being evaluated. The set of enabled experiments is owned by the
//! executable and passed by reference to the components which check it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The set of enabled experiments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<Experiment>")]
pub struct Experiments {
    enabled: HashSet<Experiment>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Experiment {
    /// Low pass filter the heading rate feedback of the heading controller.
    UseThetaFilter,

    /// Correct field relative demands for the rotation of the robot during
    /// the actuation latency.
    UseVeeringCorrection,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Experiments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self, experiment: Experiment) -> bool {
        self.enabled.contains(&experiment)
    }

    pub fn set(&mut self, experiment: Experiment, enabled: bool) {
        if enabled {
            self.enabled.insert(experiment);
        }
        else {
            self.enabled.remove(&experiment);
        }
    }
}

impl From<Vec<Experiment>> for Experiments {
    fn from(list: Vec<Experiment>) -> Self {
        Self {
            enabled: list.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set() {
        let mut exps = Experiments::new();
        assert!(!exps.enabled(Experiment::UseThetaFilter));

        exps.set(Experiment::UseThetaFilter, true);
        assert!(exps.enabled(Experiment::UseThetaFilter));
        assert!(!exps.enabled(Experiment::UseVeeringCorrection));

        exps.set(Experiment::UseThetaFilter, false);
        assert!(!exps.enabled(Experiment::UseThetaFilter));
    }

    #[test]
    fn test_from_params() {
        #[derive(Deserialize)]
        struct P {
            experiments: Experiments,
        }

        let p: P = util::params::from_str("experiments = [\"UseVeeringCorrection\"]").unwrap();
        assert!(p.experiments.enabled(Experiment::UseVeeringCorrection));
        assert!(!p.experiments.enabled(Experiment::UseThetaFilter));
    }
}
