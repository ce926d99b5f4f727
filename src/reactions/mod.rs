//! Rate laws and the reaction template library.
//!
//! Every reaction reduces to one or more [`RateLaw`]s. A rate law becomes an
//! [`EquationGroup`] with one first-order contribution per species whose net
//! stoichiometric coefficient is non-zero.

use std::collections::HashMap;
use std::ops::Add;

use log::trace;

use crate::conversion::{compensate_volume, make_concentration};
use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::model::{Model, NodeId, NodeKind};
use crate::species::Reactant;

pub mod compound;
pub mod enzymatic;
pub mod single;

/// `d^order variable / dt^order = rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub variable: NodeId,
    pub order: usize,
    pub rhs: Expr,
}

impl Equation {
    fn rename(&self, refs: &HashMap<NodeId, NodeId>) -> Self {
        Self {
            variable: *refs.get(&self.variable).unwrap_or(&self.variable),
            order: self.order,
            rhs: self.rhs.rename(refs),
        }
    }
}

/// Ordered equation contributions. Groups concatenate with `+`; two
/// contributions to the same variable add up when the model is compiled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquationGroup {
    pub equations: Vec<Equation>,
}

impl EquationGroup {
    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Equation> {
        self.equations.iter()
    }

    pub fn rename(&self, refs: &HashMap<NodeId, NodeId>) -> Self {
        self.equations.iter().map(|e| e.rename(refs)).collect()
    }
}

impl Add for EquationGroup {
    type Output = EquationGroup;

    fn add(mut self, rhs: EquationGroup) -> EquationGroup {
        self.equations.extend(rhs.equations);
        self
    }
}

impl FromIterator<Equation> for EquationGroup {
    fn from_iter<I: IntoIterator<Item = Equation>>(iter: I) -> Self {
        Self {
            equations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a EquationGroup {
    type Item = &'a Equation;
    type IntoIter = std::slice::Iter<'a, Equation>;

    fn into_iter(self) -> Self::IntoIter {
        self.equations.iter()
    }
}

/// How the rate of a [`RateLaw`] is obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Kinetics {
    /// Explicit rate in concentration per time.
    General(Expr),
    /// Explicit rate in amount per time.
    Absolute(Expr),
    /// `rate * prod(reactant ^ stoichiometry)`, in concentration per time.
    MassAction(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLaw {
    pub reactants: Vec<Reactant>,
    pub products: Vec<Reactant>,
    pub kinetics: Kinetics,
}

fn collect<R: Into<Reactant>>(reactants: impl IntoIterator<Item = R>) -> Vec<Reactant> {
    reactants.into_iter().map(Into::into).collect()
}

impl RateLaw {
    pub fn new<R, P>(
        reactants: impl IntoIterator<Item = R>,
        products: impl IntoIterator<Item = P>,
        rate_law: impl Into<Expr>,
    ) -> Self
    where
        R: Into<Reactant>,
        P: Into<Reactant>,
    {
        Self {
            reactants: collect(reactants),
            products: collect(products),
            kinetics: Kinetics::General(rate_law.into()),
        }
    }

    pub fn mass_action<R, P>(
        reactants: impl IntoIterator<Item = R>,
        products: impl IntoIterator<Item = P>,
        rate: impl Into<Expr>,
    ) -> Self
    where
        R: Into<Reactant>,
        P: Into<Reactant>,
    {
        Self {
            reactants: collect(reactants),
            products: collect(products),
            kinetics: Kinetics::MassAction(rate.into()),
        }
    }

    pub fn absolute<R, P>(
        reactants: impl IntoIterator<Item = R>,
        products: impl IntoIterator<Item = P>,
        rate_law: impl Into<Expr>,
    ) -> Self
    where
        R: Into<Reactant>,
        P: Into<Reactant>,
    {
        Self {
            reactants: collect(reactants),
            products: collect(products),
            kinetics: Kinetics::Absolute(rate_law.into()),
        }
    }

    /// Whether the rate is expressed per unit volume.
    pub fn is_concentration(&self) -> bool {
        !matches!(self.kinetics, Kinetics::Absolute(_))
    }

    pub fn is_mass_action(&self) -> bool {
        matches!(self.kinetics, Kinetics::MassAction(_))
    }

    /// Rate constant of a mass-action law.
    pub fn rate(&self) -> Option<&Expr> {
        match &self.kinetics {
            Kinetics::MassAction(rate) => Some(rate),
            _ => None,
        }
    }

    /// The rate expression, before any unit conversion.
    ///
    /// For mass action it is rebuilt from the current reactants, so a
    /// stoichiometry changed by linking is reflected in the exponents.
    pub fn rate_law(&self) -> Expr {
        match &self.kinetics {
            Kinetics::General(expr) | Kinetics::Absolute(expr) => expr.clone(),
            Kinetics::MassAction(rate) => self.reactants.iter().fold(rate.clone(), |acc, r| {
                let factor = if r.stoichiometry == 1.0 {
                    Expr::Var(r.variable)
                } else {
                    Expr::Var(r.variable).pow(r.stoichiometry)
                };
                acc * factor
            }),
        }
    }

    /// Net coefficient per species, products minus reactants, in order of
    /// first appearance.
    pub fn net_stoichiometry(&self) -> Vec<(NodeId, f64)> {
        let mut net: Vec<(NodeId, f64)> = Vec::new();
        let sides = self
            .reactants
            .iter()
            .map(|r| (r, -1.0))
            .chain(self.products.iter().map(|p| (p, 1.0)));
        for (reactant, sign) in sides {
            let delta = sign * reactant.stoichiometry;
            match net.iter_mut().find(|(v, _)| *v == reactant.variable) {
                Some((_, coefficient)) => *coefficient += delta,
                None => net.push((reactant.variable, delta)),
            }
        }
        net
    }

    /// Every variable named on either side, without repeats.
    pub fn species(&self) -> Vec<NodeId> {
        self.net_stoichiometry().into_iter().map(|(v, _)| v).collect()
    }

    pub(crate) fn validated(self) -> Result<Self> {
        for reactant in self.reactants.iter().chain(&self.products) {
            if !(reactant.stoichiometry > 0.0 && reactant.stoichiometry.is_finite()) {
                return Err(ModelError::definition(format!(
                    "stoichiometry must be a positive number, got {} for {}",
                    reactant.stoichiometry, reactant.variable
                )));
            }
        }
        Ok(self)
    }

    pub(crate) fn map_exprs(&mut self, mut f: impl FnMut(&Expr) -> Result<Expr>) -> Result<()> {
        match &mut self.kinetics {
            Kinetics::General(expr) | Kinetics::Absolute(expr) | Kinetics::MassAction(expr) => {
                *expr = f(expr)?;
            }
        }
        Ok(())
    }

    pub(crate) fn rename(
        &self,
        refs: &HashMap<NodeId, NodeId>,
        factors: &HashMap<NodeId, f64>,
    ) -> Self {
        let rename = |r: &Reactant| {
            Reactant::new(
                *refs.get(&r.variable).unwrap_or(&r.variable),
                r.stoichiometry * factors.get(&r.variable).unwrap_or(&1.0),
            )
        };
        let kinetics = match &self.kinetics {
            Kinetics::General(expr) => Kinetics::General(expr.rename(refs)),
            Kinetics::Absolute(expr) => Kinetics::Absolute(expr.rename(refs)),
            Kinetics::MassAction(rate) => Kinetics::MassAction(rate.rename(refs)),
        };
        Self {
            reactants: self.reactants.iter().map(rename).collect(),
            products: self.products.iter().map(rename).collect(),
            kinetics,
        }
    }

    /// Reduce to per-species contributions against the containment tree of
    /// `model`.
    pub fn equations(&self, model: &Model) -> Result<EquationGroup> {
        let rate_law = self.rate_law();
        let mut concentrations = HashMap::new();
        for dep in rate_law.dependents() {
            if let NodeKind::Variable(_) = model.node(dep)?.kind() {
                concentrations.insert(dep, make_concentration(model, dep)?);
            }
        }
        let rate_law = rate_law.clone_and_subst(&concentrations);

        let mut group = EquationGroup::default();
        for (variable, net) in self.net_stoichiometry() {
            if net == 0.0 {
                continue;
            }
            let rhs = compensate_volume(
                model,
                variable,
                Expr::Number(net) * rate_law.clone(),
                self.is_concentration(),
            )?;
            trace!("d{}/dt += {}", model.path(variable), model.display(&rhs));
            group.equations.push(Equation {
                variable,
                order: 1,
                rhs,
            });
        }
        Ok(group)
    }
}

/// A reaction template: anything that reduces to an ordered list of rate
/// laws.
pub trait Reaction {
    fn name(&self) -> &'static str;

    fn rate_laws(&self) -> Vec<RateLaw>;

    /// Concatenated equations of every rate law, in order.
    fn equations(&self, model: &Model) -> Result<EquationGroup> {
        self.rate_laws()
            .iter()
            .try_fold(EquationGroup::default(), |group, rate_law| {
                Ok(group + rate_law.equations(model)?)
            })
    }
}

impl Reaction for RateLaw {
    fn name(&self) -> &'static str {
        match self.kinetics {
            Kinetics::General(_) => "RateLaw",
            Kinetics::Absolute(_) => "AbsoluteRateLaw",
            Kinetics::MassAction(_) => "MassAction",
        }
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![self.clone()]
    }
}

/// A reaction as registered in a model: the template it came from and its
/// rate laws over resolved species.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionNode {
    pub template: String,
    pub rate_laws: Vec<RateLaw>,
}

impl ReactionNode {
    /// Variables that receive a contribution from this reaction.
    pub fn targets(&self) -> Vec<NodeId> {
        let mut targets = Vec::new();
        for variable in self.rate_laws.iter().flat_map(RateLaw::species) {
            if !targets.contains(&variable) {
                targets.push(variable);
            }
        }
        targets
    }

    pub fn equations(&self, model: &Model) -> Result<EquationGroup> {
        self.rate_laws
            .iter()
            .try_fold(EquationGroup::default(), |group, rate_law| {
                Ok(group + rate_law.equations(model)?)
            })
    }

    pub(crate) fn rename(
        &self,
        refs: &HashMap<NodeId, NodeId>,
        factors: &HashMap<NodeId, f64>,
    ) -> Self {
        Self {
            template: self.template.clone(),
            rate_laws: self.rate_laws.iter().map(|r| r.rename(refs, factors)).collect(),
        }
    }
}

impl Model {
    /// All equations of the model: reactions and explicit equations, in
    /// declaration order through every nesting level.
    pub fn equations(&self) -> Result<EquationGroup> {
        let mut group = EquationGroup::default();
        let holders = self.yield_nodes(self.root(), true, |n| {
            matches!(n.kind(), NodeKind::Reaction(_) | NodeKind::Equation(_))
        });
        for id in holders {
            match self.node(id)?.kind() {
                NodeKind::Reaction(reaction) => group = group + reaction.equations(self)?,
                NodeKind::Equation(equations) => group = group + equations.clone(),
                _ => {}
            }
        }
        Ok(group)
    }
}
