//! Species declarations and the stoichiometric [`Reactant`] wrapper.

use std::hash::{Hash, Hasher};
use std::ops::Mul;

use crate::expr::Expr;
use crate::model::{NodeId, Parameter, ParameterKind, Variable, VariableKind};

/// Optional initial value of a declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Initial(pub Option<Expr>);

impl Initial {
    pub const NONE: Initial = Initial(None);
}

impl From<f64> for Initial {
    fn from(value: f64) -> Self {
        Initial(Some(Expr::Number(value)))
    }
}

impl From<i32> for Initial {
    fn from(value: i32) -> Self {
        Initial(Some(Expr::from(value)))
    }
}

impl From<Expr> for Initial {
    fn from(expr: Expr) -> Self {
        Initial(Some(expr))
    }
}

impl From<NodeId> for Initial {
    fn from(id: NodeId) -> Self {
        Initial(Some(Expr::Var(id)))
    }
}

impl From<Option<Expr>> for Initial {
    fn from(expr: Option<Expr>) -> Self {
        Initial(expr)
    }
}

/// A species (or plain variable) taking part in a reaction, with its
/// stoichiometric coefficient.
///
/// Two reactants compare equal when they wrap the same variable, whatever
/// their coefficients.
#[derive(Debug, Clone, Copy)]
pub struct Reactant {
    pub variable: NodeId,
    pub stoichiometry: f64,
}

impl Reactant {
    pub fn new(variable: NodeId, stoichiometry: f64) -> Self {
        Self {
            variable,
            stoichiometry,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.stoichiometry.fract() == 0.0
    }
}

impl PartialEq for Reactant {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable
    }
}

impl Eq for Reactant {}

impl Hash for Reactant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variable.hash(state)
    }
}

impl From<NodeId> for Reactant {
    fn from(variable: NodeId) -> Self {
        Reactant::new(variable, 1.0)
    }
}

impl Mul<NodeId> for f64 {
    type Output = Reactant;
    fn mul(self, variable: NodeId) -> Reactant {
        Reactant::new(variable, self)
    }
}

impl Mul<f64> for NodeId {
    type Output = Reactant;
    fn mul(self, stoichiometry: f64) -> Reactant {
        Reactant::new(self, stoichiometry)
    }
}

impl Mul<Reactant> for f64 {
    type Output = Reactant;
    fn mul(self, reactant: Reactant) -> Reactant {
        Reactant::new(reactant.variable, self * reactant.stoichiometry)
    }
}

/// An unattached reactant declaration: the variable to create and the
/// coefficient it enters reactions with.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactantSlot {
    pub variable: Variable,
    pub stoichiometry: f64,
}

fn species(default: Initial, concentration: bool) -> Variable {
    Variable::new(VariableKind::Species { concentration }, default.0)
}

fn slot(mut variable: Variable) -> ReactantSlot {
    variable.reactant_slot = true;
    ReactantSlot {
        variable,
        stoichiometry: 1.0,
    }
}

pub fn concentration(default: impl Into<Initial>) -> Variable {
    species(default.into(), true)
}

pub fn amount(default: impl Into<Initial>) -> Variable {
    species(default.into(), false)
}

pub fn variable(default: impl Into<Initial>) -> Variable {
    Variable::new(VariableKind::Plain, default.into().0)
}

pub fn reaction_concentration(default: impl Into<Initial>) -> ReactantSlot {
    slot(concentration(default))
}

pub fn reaction_amount(default: impl Into<Initial>) -> ReactantSlot {
    slot(amount(default))
}

/// Reactant slot over a plain variable, for templates that do not care
/// about units.
pub fn reaction_initial(default: impl Into<Initial>) -> ReactantSlot {
    slot(variable(default))
}

pub fn parameter(default: impl Into<Initial>) -> Parameter {
    Parameter::new(ParameterKind::Parameter, default.into().0)
}

pub fn constant(default: impl Into<Initial>) -> Parameter {
    Parameter::new(ParameterKind::Constant, default.into().0)
}
