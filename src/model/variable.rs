use std::collections::BTreeMap;

use crate::expr::Expr;

/// What a variable stands for. Conversion rules dispatch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Plain,
    Species { concentration: bool },
    Volume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Derivative {
    pub initial: Option<Expr>,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    kind: VariableKind,
    pub initial: Option<Expr>,
    pub derivatives: BTreeMap<usize, Derivative>,
    /// Highest derivative order that has an equation attached.
    pub equation_order: Option<usize>,
    pub(crate) reactant_slot: bool,
}

impl Variable {
    pub fn new(kind: VariableKind, initial: Option<Expr>) -> Self {
        Self {
            kind,
            initial,
            derivatives: BTreeMap::new(),
            equation_order: None,
            reactant_slot: false,
        }
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn is_species(&self) -> bool {
        matches!(self.kind, VariableKind::Species { .. })
    }

    pub fn is_volume(&self) -> bool {
        self.kind == VariableKind::Volume
    }

    /// `Some(flag)` for species, `None` for any other variable.
    pub fn concentration(&self) -> Option<bool> {
        match self.kind {
            VariableKind::Species { concentration } => Some(concentration),
            _ => None,
        }
    }

    /// Declared with one of the `reaction_*` factories, so it may be linked
    /// to an external species with a stoichiometric multiplier.
    pub fn is_reactant_slot(&self) -> bool {
        self.reactant_slot
    }

    /// Record the derivative of `order` (and every lower order) if missing.
    pub fn derive(&mut self, order: usize, initial: Option<Expr>) -> &mut Derivative {
        for lower in 1..order {
            self.derivatives.entry(lower).or_insert(Derivative {
                initial: None,
                order: lower,
            });
        }
        let derivative = self.derivatives.entry(order).or_insert(Derivative {
            initial: None,
            order,
        });
        if initial.is_some() {
            derivative.initial = initial;
        }
        derivative
    }

    pub(crate) fn mark_equation(&mut self, order: usize) {
        self.derive(order, None);
        self.equation_order = Some(self.equation_order.map_or(order, |o| o.max(order)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Parameter,
    Constant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    kind: ParameterKind,
    pub default: Option<Expr>,
}

impl Parameter {
    pub fn new(kind: ParameterKind, default: Option<Expr>) -> Self {
        Self { kind, default }
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn is_constant(&self) -> bool {
        self.kind == ParameterKind::Constant
    }
}
