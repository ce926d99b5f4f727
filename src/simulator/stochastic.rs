use log::info;

use super::{CompileOptions, CompiledModel};
use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::model::{Model, NodeId, NodeKind};
use crate::species::Reactant;

/// One reaction channel of a Gillespie-style simulator.
///
/// Species names are repeated once per unit of stoichiometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Jump {
    pub rate: Expr,
    pub reactants: Vec<String>,
    pub products: Vec<String>,
}

/// The jump processes of a model built only from mass-action reactions.
#[derive(Debug, Clone)]
pub struct StochasticModel {
    compiled: CompiledModel,
    species: Vec<String>,
    jumps: Vec<Jump>,
}

/// Simulator-safe name: dots are not allowed in identifiers.
pub fn species_name(model: &Model, id: NodeId) -> String {
    model.path(id).replace('.', "__")
}

/// Largest stoichiometry a single jump may carry.
pub const MAX_STOICHIOMETRY: u32 = 1000;

fn expand(model: &Model, reactants: &[Reactant]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for reactant in reactants {
        if !reactant.is_integral() {
            return Err(ModelError::unsupported(format!(
                "stoichiometry {} of {} is not an integer",
                reactant.stoichiometry,
                model.path(reactant.variable)
            )));
        }
        if reactant.stoichiometry > f64::from(MAX_STOICHIOMETRY) {
            return Err(ModelError::unsupported(format!(
                "stoichiometry {} of {} exceeds {}",
                reactant.stoichiometry,
                model.path(reactant.variable),
                MAX_STOICHIOMETRY
            )));
        }
        let name = species_name(model, reactant.variable);
        names.extend(std::iter::repeat(name).take(reactant.stoichiometry as usize));
    }
    Ok(names)
}

impl StochasticModel {
    pub fn build(model: &Model) -> Result<Self> {
        let mut jumps = Vec::new();
        for id in model.reactions() {
            let NodeKind::Reaction(reaction) = model.node(id)?.kind() else {
                continue;
            };
            for rate_law in &reaction.rate_laws {
                let rate = rate_law.rate().ok_or_else(|| {
                    ModelError::unsupported(format!(
                        "{} is a {}; only mass-action reactions can be simulated stochastically",
                        model.path(id),
                        reaction.template
                    ))
                })?;
                jumps.push(Jump {
                    rate: rate.clone(),
                    reactants: expand(model, &rate_law.reactants)?,
                    products: expand(model, &rate_law.products)?,
                });
            }
        }
        let compiled = CompiledModel::build(model, &CompileOptions::new())?;
        let species = compiled
            .states()
            .iter()
            .map(|id| species_name(model, *id))
            .collect();
        info!("{} has {} reaction channels", model.name(), jumps.len());
        Ok(Self {
            compiled,
            species,
            jumps,
        })
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn jumps(&self) -> &[Jump] {
        &self.jumps
    }

    pub fn set_value(&mut self, id: NodeId, value: f64) -> Result<()> {
        self.compiled.set_value(id, value)
    }

    /// Initial population of every species, truncated to whole molecules.
    pub fn initial_counts(&self) -> Result<Vec<(String, u64)>> {
        let y0 = self.compiled.initial_state()?;
        Ok(self
            .species
            .iter()
            .cloned()
            .zip(y0.iter().map(|v| v.max(0.0) as u64))
            .collect())
    }

    /// Rate constant of every jump, evaluated on the initial state.
    pub fn rate_constants(&self) -> Result<Vec<f64>> {
        let y0 = self.compiled.initial_state()?;
        self.jumps
            .iter()
            .map(|jump| self.compiled.evaluate(&jump.rate, 0.0, &y0))
            .collect()
    }
}
