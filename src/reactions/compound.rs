//! Reactions composed of primitives. Their rate laws are the constituents'
//! rate laws concatenated, forward reaction first.

use super::single::{Conversion, Dissociation, Synthesis};
use super::{RateLaw, Reaction};
use crate::expr::Expr;
use crate::species::Reactant;

/// A + B <-> AB
#[derive(Debug, Clone, PartialEq)]
pub struct ReversibleSynthesis {
    pub a: Reactant,
    pub b: Reactant,
    pub ab: Reactant,
    pub forward_rate: Expr,
    pub reverse_rate: Expr,
}

impl ReversibleSynthesis {
    pub fn new(
        a: impl Into<Reactant>,
        b: impl Into<Reactant>,
        ab: impl Into<Reactant>,
        forward_rate: impl Into<Expr>,
        reverse_rate: impl Into<Expr>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            ab: ab.into(),
            forward_rate: forward_rate.into(),
            reverse_rate: reverse_rate.into(),
        }
    }
}

impl Reaction for ReversibleSynthesis {
    fn name(&self) -> &'static str {
        "ReversibleSynthesis"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        let forward = Synthesis::new(self.a, self.b, self.ab, self.forward_rate.clone());
        let backward = Dissociation::new(self.ab, self.a, self.b, self.reverse_rate.clone());
        [forward.rate_laws(), backward.rate_laws()].concat()
    }
}

/// A <-> B
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibration {
    pub a: Reactant,
    pub b: Reactant,
    pub forward_rate: Expr,
    pub reverse_rate: Expr,
}

impl Equilibration {
    pub fn new(
        a: impl Into<Reactant>,
        b: impl Into<Reactant>,
        forward_rate: impl Into<Expr>,
        reverse_rate: impl Into<Expr>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            forward_rate: forward_rate.into(),
            reverse_rate: reverse_rate.into(),
        }
    }
}

impl Reaction for Equilibration {
    fn name(&self) -> &'static str {
        "Equilibration"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        let forward = Conversion::new(self.a, self.b, self.forward_rate.clone());
        let backward = Conversion::new(self.b, self.a, self.reverse_rate.clone());
        [forward.rate_laws(), backward.rate_laws()].concat()
    }
}

/// A + B <-> AB -> P
#[derive(Debug, Clone, PartialEq)]
pub struct CatalyzeConvert {
    pub a: Reactant,
    pub b: Reactant,
    pub ab: Reactant,
    pub p: Reactant,
    pub forward_rate: Expr,
    pub reverse_rate: Expr,
    pub conversion_rate: Expr,
}

impl CatalyzeConvert {
    pub fn new(
        a: impl Into<Reactant>,
        b: impl Into<Reactant>,
        ab: impl Into<Reactant>,
        p: impl Into<Reactant>,
        forward_rate: impl Into<Expr>,
        reverse_rate: impl Into<Expr>,
        conversion_rate: impl Into<Expr>,
    ) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            ab: ab.into(),
            p: p.into(),
            forward_rate: forward_rate.into(),
            reverse_rate: reverse_rate.into(),
            conversion_rate: conversion_rate.into(),
        }
    }
}

impl Reaction for CatalyzeConvert {
    fn name(&self) -> &'static str {
        "CatalyzeConvert"
    }

    fn rate_laws(&self) -> Vec<RateLaw> {
        let binding = ReversibleSynthesis::new(
            self.a,
            self.b,
            self.ab,
            self.forward_rate.clone(),
            self.reverse_rate.clone(),
        );
        let conversion = Conversion::new(self.ab, self.p, self.conversion_rate.clone());
        [binding.rate_laws(), conversion.rate_laws()].concat()
    }
}
