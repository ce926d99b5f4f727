//! Enzyme kinetics.

use super::compound::ReversibleSynthesis;
use super::single::Dissociation;
use super::{RateLaw, Reaction};
use crate::expr::Expr;
use crate::species::Reactant;

/// E + S <-> ES -> E + P, with every elementary step explicit.
#[derive(Debug, Clone, PartialEq)]
pub struct MichaelisMenten {
    pub e: Reactant,
    pub s: Reactant,
    pub es: Reactant,
    pub p: Reactant,
    pub forward_rate: Expr,
    pub reverse_rate: Expr,
    pub catalytic_rate: Expr,
}

impl MichaelisMenten {
    pub fn new(
        e: impl Into<Reactant>,
        s: impl Into<Reactant>,
        es: impl Into<Reactant>,
        p: impl Into<Reactant>,
        forward_rate: impl Into<Expr>,
        reverse_rate: impl Into<Expr>,
        catalytic_rate: impl Into<Expr>,
    ) -> Self {
        Self {
            e: e.into(),
            s: s.into(),
            es: es.into(),
            p: p.into(),
            forward_rate: forward_rate.into(),
            reverse_rate: reverse_rate.into(),
            catalytic_rate: catalytic_rate.into(),
        }
    }
}

impl Reaction for MichaelisMenten {
    fn name(&self) -> &'static str {
        "MichaelisMenten"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        let binding = ReversibleSynthesis::new(
            self.e,
            self.s,
            self.es,
            self.forward_rate.clone(),
            self.reverse_rate.clone(),
        );
        let release = Dissociation::new(self.es, self.e, self.p, self.catalytic_rate.clone());
        [binding.rate_laws(), release.rate_laws()].concat()
    }
}

fn saturating(s: &Reactant, p: &Reactant, maximum_velocity: &Expr, constant: &Expr) -> RateLaw {
    let substrate = Expr::Var(s.variable);
    RateLaw::new(
        [*s],
        [*p],
        maximum_velocity.clone() * substrate.clone() / (constant.clone() + substrate),
    )
}

/// S -> P at `Vmax * S / (Kd + S)`, assuming fast binding equilibrium.
#[derive(Debug, Clone, PartialEq)]
pub struct MichaelisMentenEqApprox {
    pub s: Reactant,
    pub p: Reactant,
    pub maximum_velocity: Expr,
    pub dissociation_constant: Expr,
}

impl MichaelisMentenEqApprox {
    pub fn new(
        s: impl Into<Reactant>,
        p: impl Into<Reactant>,
        maximum_velocity: impl Into<Expr>,
        dissociation_constant: impl Into<Expr>,
    ) -> Self {
        Self {
            s: s.into(),
            p: p.into(),
            maximum_velocity: maximum_velocity.into(),
            dissociation_constant: dissociation_constant.into(),
        }
    }
}

impl Reaction for MichaelisMentenEqApprox {
    fn name(&self) -> &'static str {
        "MichaelisMentenEqApprox"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![saturating(
            &self.s,
            &self.p,
            &self.maximum_velocity,
            &self.dissociation_constant,
        )]
    }
}

/// S -> P at `Vmax * S / (Km + S)`, assuming a quasi-steady enzyme complex.
#[derive(Debug, Clone, PartialEq)]
pub struct MichaelisMentenQuasiSSAprox {
    pub s: Reactant,
    pub p: Reactant,
    pub maximum_velocity: Expr,
    pub michaelis_constant: Expr,
}

impl MichaelisMentenQuasiSSAprox {
    pub fn new(
        s: impl Into<Reactant>,
        p: impl Into<Reactant>,
        maximum_velocity: impl Into<Expr>,
        michaelis_constant: impl Into<Expr>,
    ) -> Self {
        Self {
            s: s.into(),
            p: p.into(),
            maximum_velocity: maximum_velocity.into(),
            michaelis_constant: michaelis_constant.into(),
        }
    }
}

impl Reaction for MichaelisMentenQuasiSSAprox {
    fn name(&self) -> &'static str {
        "MichaelisMentenQuasiSSAprox"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![saturating(
            &self.s,
            &self.p,
            &self.maximum_velocity,
            &self.michaelis_constant,
        )]
    }
}
