//! Primitive mass-action reactions. Each produces exactly one rate law.

use super::{RateLaw, Reaction};
use crate::expr::Expr;
use crate::species::Reactant;

const NOTHING: [Reactant; 0] = [];

/// ∅ -> A
#[derive(Debug, Clone, PartialEq)]
pub struct Creation {
    pub a: Reactant,
    pub rate: Expr,
}

impl Creation {
    pub fn new(a: impl Into<Reactant>, rate: impl Into<Expr>) -> Self {
        Self {
            a: a.into(),
            rate: rate.into(),
        }
    }
}

impl Reaction for Creation {
    fn name(&self) -> &'static str {
        "Creation"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![RateLaw::mass_action(NOTHING, [self.a], self.rate.clone())]
    }
}

/// A -> 2A
#[derive(Debug, Clone, PartialEq)]
pub struct AutoCreation {
    pub a: Reactant,
    pub rate: Expr,
}

impl AutoCreation {
    pub fn new(a: impl Into<Reactant>, rate: impl Into<Expr>) -> Self {
        Self {
            a: a.into(),
            rate: rate.into(),
        }
    }
}

impl Reaction for AutoCreation {
    fn name(&self) -> &'static str {
        "AutoCreation"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![RateLaw::mass_action([self.a], [2.0 * self.a], self.rate.clone())]
    }
}

/// A -> ∅
#[derive(Debug, Clone, PartialEq)]
pub struct Destruction {
    pub a: Reactant,
    pub rate: Expr,
}

impl Destruction {
    pub fn new(a: impl Into<Reactant>, rate: impl Into<Expr>) -> Self {
        Self {
            a: a.into(),
            rate: rate.into(),
        }
    }
}

impl Reaction for Destruction {
    fn name(&self) -> &'static str {
        "Destruction"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![RateLaw::mass_action([self.a], NOTHING, self.rate.clone())]
    }
}

/// A -> B
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub a: Reactant,
    pub b: Reactant,
    pub rate: Expr,
}

impl Conversion {
    pub fn new(a: impl Into<Reactant>, b: impl Into<Reactant>, rate: impl Into<Expr>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            rate: rate.into(),
        }
    }
}

impl Reaction for Conversion {
    fn name(&self) -> &'static str {
        "Conversion"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![RateLaw::mass_action([self.a], [self.b], self.rate.clone())]
    }
}

/// A + B -> AB
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub a: Reactant,
    pub b: Reactant,
    pub ab: Reactant,
    pub rate: Expr,
}

impl Synthesis {
    pub fn new(
        a: impl Into<Reactant>,
        b: impl Into<Reactant>,
        ab: impl Into<Reactant>,
        rate: impl Into<Expr>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            ab: ab.into(),
            rate: rate.into(),
        }
    }
}

impl Reaction for Synthesis {
    fn name(&self) -> &'static str {
        "Synthesis"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![RateLaw::mass_action([self.a, self.b], [self.ab], self.rate.clone())]
    }
}

/// AB -> A + B
#[derive(Debug, Clone, PartialEq)]
pub struct Dissociation {
    pub ab: Reactant,
    pub a: Reactant,
    pub b: Reactant,
    pub rate: Expr,
}

impl Dissociation {
    pub fn new(
        ab: impl Into<Reactant>,
        a: impl Into<Reactant>,
        b: impl Into<Reactant>,
        rate: impl Into<Expr>,
    ) -> Self {
        Self {
            ab: ab.into(),
            a: a.into(),
            b: b.into(),
            rate: rate.into(),
        }
    }
}

impl Reaction for Dissociation {
    fn name(&self) -> &'static str {
        "Dissociation"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        vec![RateLaw::mass_action([self.ab], [self.a, self.b], self.rate.clone())]
    }
}
