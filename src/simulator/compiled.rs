use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::{debug, info};
use ndarray::Array1;

use super::CompileOptions;
use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::model::{Model, NodeId, NodeKind};

/// A model reduced to a first-order system `dy/dt = f(t, y)`.
///
/// The state vector holds every variable of the model in declaration order.
/// Variables that no equation targets have a zero right-hand side.
/// Parameters are inlined into the right-hand side whenever one changes.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    options: CompileOptions,
    states: Vec<NodeId>,
    parameters: Vec<NodeId>,
    names: HashMap<NodeId, String>,
    index: HashMap<NodeId, usize>,
    independents: HashSet<NodeId>,
    initials: HashMap<NodeId, Expr>,
    values: HashMap<NodeId, Expr>,
    equations: Vec<Expr>,
    rhs: Vec<Expr>,
}

/// Substitute definitions into each other until none refers to another.
fn inline(definitions: &HashMap<NodeId, Expr>) -> Result<HashMap<NodeId, Expr>> {
    let mut resolved = definitions.clone();
    for _ in 0..=definitions.len() {
        let done = resolved
            .values()
            .all(|expr| expr.dependents().iter().all(|d| !definitions.contains_key(d)));
        if done {
            return Ok(resolved);
        }
        resolved = resolved
            .iter()
            .map(|(id, expr)| (*id, expr.clone_and_subst(&resolved)))
            .collect();
    }
    let mut cycle: Vec<NodeId> = resolved
        .iter()
        .filter(|(_, expr)| expr.dependents().iter().any(|d| definitions.contains_key(d)))
        .map(|(id, _)| *id)
        .collect();
    cycle.sort();
    Err(ModelError::definition(format!(
        "circular definition involving {}",
        cycle.iter().join(", ")
    )))
}

impl CompiledModel {
    pub fn build(model: &Model, options: &CompileOptions) -> Result<Self> {
        let mut names = HashMap::new();
        let mut initials = HashMap::new();
        let mut states = Vec::new();
        for id in model.variables() {
            let variable = model.variable(id)?;
            if let Some(order) = variable.equation_order.filter(|o| *o > 1) {
                return Err(ModelError::unsupported(format!(
                    "{} has an equation of order {}; only first-order systems can be compiled",
                    model.path(id),
                    order
                )));
            }
            match &variable.initial {
                Some(initial) => {
                    initials.insert(id, initial.clone());
                }
                None if options.check_required && options.default_initial.is_none() => {
                    return Err(ModelError::definition(format!(
                        "variable {} has no initial value",
                        model.path(id)
                    )))
                }
                None => {}
            }
            names.insert(id, model.path(id));
            states.push(id);
        }

        let mut values = HashMap::new();
        let mut parameters = Vec::new();
        for id in model.parameters() {
            match model.node(id)?.kind().as_parameter().and_then(|p| p.default.as_ref()) {
                Some(default) => {
                    values.insert(id, default.clone());
                }
                None if options.check_required => {
                    return Err(ModelError::definition(format!(
                        "parameter {} has no value",
                        model.path(id)
                    )))
                }
                None => {}
            }
            names.insert(id, model.path(id));
            parameters.push(id);
        }

        let independents: HashSet<NodeId> = model
            .yield_nodes(model.root(), true, |n| matches!(n.kind(), NodeKind::Independent))
            .collect();
        let index: HashMap<NodeId, usize> =
            states.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut contributions: Vec<Option<Expr>> = vec![None; states.len()];
        for equation in &model.equations()? {
            if equation.order != 1 {
                return Err(ModelError::unsupported(format!(
                    "equation of order {} for {}",
                    equation.order,
                    model.path(equation.variable)
                )));
            }
            let i = *index.get(&equation.variable).ok_or_else(|| {
                ModelError::lookup(format!("{} is not a variable of the model", equation.variable))
            })?;
            let rhs = equation.rhs.clone();
            contributions[i] = Some(match contributions[i].take() {
                Some(acc) => acc + rhs,
                None => rhs,
            });
        }
        let equations: Vec<Expr> = contributions
            .into_iter()
            .map(|c| c.unwrap_or(Expr::Number(0.0)))
            .collect();

        let mut compiled = Self {
            options: options.clone(),
            states,
            parameters,
            names,
            index,
            independents,
            initials,
            values,
            equations,
            rhs: Vec::new(),
        };
        compiled.refresh()?;
        info!(
            "compiled {} with {} states and {} parameters",
            model.name(),
            compiled.states.len(),
            compiled.parameters.len()
        );
        Ok(compiled)
    }

    fn refresh(&mut self) -> Result<()> {
        let values = inline(&self.values)?;
        self.rhs = self.equations.iter().map(|e| e.clone_and_subst(&values)).collect();
        debug!("inlined {} parameters into {} equations", values.len(), self.rhs.len());
        Ok(())
    }

    fn name(&self, id: NodeId) -> String {
        self.names.get(&id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn number_of_states(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[NodeId] {
        &self.states
    }

    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    pub fn state_names(&self) -> Vec<String> {
        self.states.iter().map(|id| self.name(*id)).collect()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Summed right-hand side of every state, with parameters inlined.
    pub fn equations(&self) -> &[Expr] {
        &self.rhs
    }

    /// Override the initial value of a variable or the value of a parameter.
    pub fn set_value(&mut self, id: NodeId, value: f64) -> Result<()> {
        if self.index.contains_key(&id) {
            self.initials.insert(id, Expr::Number(value));
            Ok(())
        } else if self.parameters.contains(&id) {
            self.values.insert(id, Expr::Number(value));
            self.refresh()
        } else {
            Err(ModelError::lookup(format!(
                "{} is neither a variable nor a parameter of the model",
                id
            )))
        }
    }

    /// Initial state vector, evaluated at time zero.
    pub fn initial_state(&self) -> Result<Array1<f64>> {
        let mut definitions = self.values.clone();
        for id in &self.states {
            match (self.initials.get(id), self.options.default_initial) {
                (Some(initial), _) => {
                    definitions.insert(*id, initial.clone());
                }
                (None, Some(default)) => {
                    definitions.insert(*id, Expr::Number(default));
                }
                (None, None) => {
                    return Err(ModelError::evaluation(format!(
                        "variable {} has no initial value",
                        self.name(*id)
                    )))
                }
            }
        }
        let resolved = inline(&definitions)?;
        let lookup = |id: NodeId| -> Result<f64> {
            if self.independents.contains(&id) {
                Ok(0.0)
            } else {
                Err(ModelError::evaluation(format!("{} has no value", self.name(id))))
            }
        };
        let mut y0 = Array1::zeros(self.states.len());
        for (i, id) in self.states.iter().enumerate() {
            // every state was given a definition above
            if let Some(expr) = resolved.get(id) {
                y0[i] = expr.eval(&lookup)?;
            }
        }
        Ok(y0)
    }

    /// Evaluate an expression of the model at `(t, y)`.
    pub fn evaluate(&self, expr: &Expr, t: f64, y: &Array1<f64>) -> Result<f64> {
        let values = inline(&self.values)?;
        expr.clone_and_subst(&values).eval(&|id| self.lookup(id, t, y))
    }

    fn lookup(&self, id: NodeId, t: f64, y: &Array1<f64>) -> Result<f64> {
        if let Some(i) = self.index.get(&id) {
            y.get(*i).copied().ok_or_else(|| {
                ModelError::evaluation(format!(
                    "state vector has {} entries, expected {}",
                    y.len(),
                    self.states.len()
                ))
            })
        } else if self.independents.contains(&id) {
            Ok(t)
        } else {
            Err(ModelError::evaluation(format!("{} has no value", self.name(id))))
        }
    }

    /// `dy/dt` at `(t, y)`.
    pub fn rhs(&self, t: f64, y: &Array1<f64>) -> Result<Array1<f64>> {
        if y.len() != self.states.len() {
            return Err(ModelError::evaluation(format!(
                "state vector has {} entries, expected {}",
                y.len(),
                self.states.len()
            )));
        }
        let mut dy = Array1::zeros(self.states.len());
        for (i, rhs) in self.rhs.iter().enumerate() {
            dy[i] = rhs.eval(&|id| self.lookup(id, t, y))?;
        }
        Ok(dy)
    }
}
