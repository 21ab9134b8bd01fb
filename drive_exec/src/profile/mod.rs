//! # Motion profiles
//!
//! Time optimal one dimensional motion under velocity and acceleration
//! limits, and a position servo which follows such a profile.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod servo;
mod trapezoid;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
pub use servo::*;
pub use trapezoid::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Scalar position and velocity.
///
/// Units depend on the use, either meters and meters/second or radians and
/// radians/second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct State1d {
    pub x: f64,
    pub v: f64,
}

impl State1d {
    pub fn new(x: f64, v: f64) -> Self {
        Self { x, v }
    }
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while building a motion profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile limit {0} must be positive and finite, found {1}")]
    InvalidLimit(&'static str, f64),
}
