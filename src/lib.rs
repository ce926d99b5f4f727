extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod compartment;
pub mod conversion;
pub mod error;
pub mod expr;
pub mod graph;
pub mod import;
pub mod model;
pub mod reactions;
pub mod simulator;
pub mod species;

pub use compartment::volume;
pub use conversion::{compensate_volume, make_concentration};
pub use error::{ModelError, Result};
pub use expr::Expr;
pub use model::{Binding, Model, Node, NodeId, NodeKind, SystemBuilder};
pub use reactions::{Equation, EquationGroup, RateLaw, Reaction};
pub use simulator::{CompileOptions, CompiledModel, StochasticModel};
pub use species::{
    amount, concentration, constant, parameter, reaction_amount, reaction_concentration,
    reaction_initial, variable, Initial, Reactant,
};
