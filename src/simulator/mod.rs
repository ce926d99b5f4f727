//! Interfaces for the simulators that consume a finished model.
//!
//! No integrator lives here: [`CompiledModel`] exposes the state vector, the
//! initial state and the right-hand side, and [`StochasticModel`] lists the
//! jump processes of a mass-action network.

mod compiled;
mod stochastic;

pub use compiled::CompiledModel;
pub use stochastic::{Jump, StochasticModel};

/// Options used when compiling a model for numeric simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Initial value for variables declared without one. When `None`, such a
    /// variable makes [`CompiledModel::initial_state`] fail.
    pub default_initial: Option<f64>,
    /// Reject variables and parameters without a value at compile time.
    pub check_required: bool,
}

impl CompileOptions {
    pub fn new() -> CompileOptions {
        CompileOptions {
            default_initial: None,
            check_required: true,
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new()
    }
}
