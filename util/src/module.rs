//! Cyclic module interface
//!
//! Control components stepped once per drive cycle implement `State`. They
//! are built once at startup, initialised from their parameter file and then
//! processed with fresh inputs every cycle, returning their demand together
//! with a status report describing how it was produced.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

pub trait State {
    /// Usually the path of the parameter file, relative to the params
    /// directory.
    type InitData;
    type InitError;

    /// Measurements and demands for one cycle.
    type InputData;

    /// The demand produced by the cycle.
    type OutputData;

    /// Diagnostics for the cycle, serialisable so they can be logged.
    type StatusReport;

    /// Runtime faults. The caller is expected to issue a safe demand for the
    /// cycle and carry on.
    type ProcError;

    /// Load parameters and prepare for cyclic processing.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one control cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
