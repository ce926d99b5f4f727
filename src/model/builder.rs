use log::debug;

use super::{Binding, Model, NodeId, NodeKind, Parameter, System, Variable};
use crate::compartment::check_volumes;
use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::reactions::{Equation, EquationGroup, Reaction, ReactionNode};
use crate::species::{Reactant, ReactantSlot};

/// Registration API for a system or compartment template.
///
/// Members are added in declaration order and validated as they are added;
/// [`SystemBuilder::build`] runs the compartment checks and hands back the
/// finished, immutable [`Model`].
#[derive(Debug)]
pub struct SystemBuilder {
    model: Model,
}

impl SystemBuilder {
    pub fn system(name: &str) -> Self {
        Self {
            model: Model::new(name, false),
        }
    }

    pub fn compartment(name: &str) -> Self {
        Self {
            model: Model::new(name, true),
        }
    }

    pub fn root(&self) -> NodeId {
        self.model.root()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn variable(&mut self, name: &str, variable: Variable) -> Result<NodeId> {
        let mut variable = variable;
        variable.initial = self.resolve_opt(variable.initial.as_ref())?;
        let is_volume = variable.is_volume();
        let id = self.model.push(self.root(), name, NodeKind::Variable(variable))?;
        if is_volume {
            // first volume wins; build() rejects any second one
            let root = self.root();
            if let NodeKind::System(system) = &mut self.model.node_mut(root)?.kind {
                system.volume.get_or_insert(id);
            }
        }
        Ok(id)
    }

    /// Declare a reactant slot and return the reactant it enters reactions as.
    pub fn reactant(&mut self, name: &str, slot: ReactantSlot) -> Result<Reactant> {
        let id = self.variable(name, slot.variable)?;
        Ok(Reactant::new(id, slot.stoichiometry))
    }

    pub fn parameter(&mut self, name: &str, parameter: Parameter) -> Result<NodeId> {
        let mut parameter = parameter;
        parameter.default = self.resolve_opt(parameter.default.as_ref())?;
        self.model.push(self.root(), name, NodeKind::Parameter(parameter))
    }

    pub fn independent(&mut self, name: &str) -> Result<NodeId> {
        self.model.push(self.root(), name, NodeKind::Independent)
    }

    /// Attach a fresh copy of `template` as member `name`.
    pub fn instantiate(
        &mut self,
        name: &str,
        template: &Model,
        bindings: &[(&str, Binding)],
    ) -> Result<NodeId> {
        let root = self.root();
        self.model.attach_clone(root, name, template, bindings)
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Result<NodeId> {
        self.model.child(parent, name).ok_or_else(|| {
            ModelError::lookup(format!("{} has no member {}", self.model.path(parent), name))
        })
    }

    /// Reactant for a member of an instantiated sub-component, following links.
    pub fn reactant_of(&self, id: NodeId) -> Result<Reactant> {
        let reactant = self.model.resolve(Reactant::from(id))?;
        self.model.variable(reactant.variable)?;
        Ok(reactant)
    }

    /// Register a reaction (primitive, composite or rate law) as one member.
    pub fn reaction(&mut self, name: &str, reaction: impl Reaction) -> Result<NodeId> {
        let mut rate_laws = Vec::new();
        for rate_law in reaction.rate_laws() {
            let mut rate_law = rate_law.validated()?;
            for reactant in rate_law.reactants.iter_mut().chain(rate_law.products.iter_mut()) {
                let resolved = self.reactant_of(reactant.variable)?;
                *reactant = Reactant::new(
                    resolved.variable,
                    resolved.stoichiometry * reactant.stoichiometry,
                );
            }
            rate_law.map_exprs(|e| self.model.resolve_links(e))?;
            rate_laws.push(rate_law);
        }
        let node = ReactionNode {
            template: reaction.name().to_string(),
            rate_laws,
        };
        let targets = node.targets();
        debug!("reaction {} ({}) touches {} species", name, node.template, targets.len());
        let id = self.model.push(self.root(), name, NodeKind::Reaction(node))?;
        for variable in targets {
            self.model.variable_mut(variable)?.mark_equation(1);
        }
        Ok(id)
    }

    /// Attach `d variable / dt = rhs` directly, outside any reaction.
    pub fn equation(
        &mut self,
        name: &str,
        variable: NodeId,
        rhs: impl Into<Expr>,
    ) -> Result<NodeId> {
        let variable = self.reactant_of(variable)?.variable;
        let rhs = self.model.resolve_links(&rhs.into())?;
        let group = EquationGroup {
            equations: vec![Equation {
                variable,
                order: 1,
                rhs,
            }],
        };
        let id = self.model.push(self.root(), name, NodeKind::Equation(group))?;
        self.model.variable_mut(variable)?.mark_equation(1);
        Ok(id)
    }

    pub fn derive(&mut self, variable: NodeId, order: usize, initial: Option<Expr>) -> Result<()> {
        if order == 0 {
            return Err(ModelError::definition("derivative order must be at least 1"));
        }
        let initial = self.resolve_opt(initial.as_ref())?;
        self.model.variable_mut(variable)?.derive(order, initial);
        Ok(())
    }

    pub fn set_initial(&mut self, id: NodeId, initial: impl Into<Expr>) -> Result<()> {
        let initial = self.model.resolve_links(&initial.into())?;
        self.model.set_initial(id, initial)
    }

    /// Validate and finish the template.
    pub fn build(self) -> Result<Model> {
        let mut model = self.model;
        if model.is_compartment() {
            let volume = check_volumes(&model, model.root())?;
            let root = model.root();
            if let NodeKind::System(System { volume: v, .. }) = &mut model.node_mut(root)?.kind {
                *v = Some(volume);
            }
        }
        debug!("built {} with {} nodes", model.name(), model.len());
        Ok(model)
    }

    fn resolve_opt(&self, expr: Option<&Expr>) -> Result<Option<Expr>> {
        expr.map(|e| self.model.resolve_links(e)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::SystemBuilder;
    use crate::compartment::volume;
    use crate::error::ModelError;
    use crate::expr::Expr;
    use crate::model::{Binding, NodeKind};
    use crate::reactions::RateLaw;
    use crate::species::{amount, concentration, reaction_amount, reaction_initial};

    #[test]
    fn compartment_without_volume_fails_to_build() {
        let mut b = SystemBuilder::compartment("Model");
        let a = b.variable("A", amount(1.0)).unwrap();
        b.reaction("eq", RateLaw::new([a], [2.0 * a], 1.0)).unwrap();
        assert!(matches!(b.build(), Err(ModelError::Definition(_))));
    }

    #[test]
    fn compartment_with_two_volumes_fails_to_build() {
        let mut b = SystemBuilder::compartment("Model");
        b.variable("V1", volume(1.0)).unwrap();
        b.variable("V2", volume(1.0)).unwrap();
        assert!(matches!(b.build(), Err(ModelError::Definition(msg)) if msg.contains("multiple")));
    }

    #[test]
    fn volume_is_registered_on_the_container() {
        let mut b = SystemBuilder::compartment("Model");
        let v = b.variable("V", volume(2.0)).unwrap();
        b.variable("A", concentration(1.0)).unwrap();
        let model = b.build().unwrap();
        assert_eq!(model.volume_of(model.root()), Some(v));
    }

    #[test]
    fn nested_reactant_with_external_stoichiometry() {
        let mut nested = SystemBuilder::system("Nested");
        let a = nested.reactant("A", reaction_initial(0.5)).unwrap();
        let b_ = nested.reactant("B", reaction_initial(2.0)).unwrap();
        let ab = nested.reactant("AB", reaction_initial(0.0)).unwrap();
        nested.reaction("eq", RateLaw::new([a, b_], [ab], 2.0)).unwrap();
        let nested = nested.build().unwrap();

        let mut b = SystemBuilder::compartment("Model");
        b.variable("V", volume(4.0)).unwrap();
        let outer_a = b.reactant("A", reaction_amount(1.0)).unwrap();
        let outer_b = b.reactant("B", reaction_amount(3.0)).unwrap();
        let n = b
            .instantiate(
                "nested",
                &nested,
                &[
                    ("A", Binding::from(2.0 * outer_a)),
                    ("B", Binding::from(3.0 * outer_b)),
                ],
            )
            .unwrap();
        let nested_a = b.reactant_of(b.child(n, "A").unwrap()).unwrap();
        let nested_b = b.reactant_of(b.child(n, "B").unwrap()).unwrap();
        assert_eq!(nested_a.variable, outer_a.variable);
        assert_eq!(nested_a.stoichiometry, 2.0);
        assert_eq!(nested_b.stoichiometry, 3.0);
        let nested_ab = b.reactant_of(b.child(n, "AB").unwrap()).unwrap();
        b.reaction("eq", RateLaw::new([nested_ab], [nested_a, outer_b], 1.0))
            .unwrap();
        let model = b.build().unwrap();
        let eq = model.get("eq").unwrap();
        let node = model.node(eq).unwrap().kind().as_reaction().unwrap();
        assert_eq!(node.rate_laws[0].products[0].variable, outer_a.variable);
        assert_eq!(node.rate_laws[0].products[0].stoichiometry, 2.0);
    }

    #[test]
    fn equation_marks_the_variable() {
        let mut b = SystemBuilder::compartment("Model");
        let t = b.independent("t").unwrap();
        let v = b.variable("V", volume(1.0)).unwrap();
        b.equation("vol_eq", v, Expr::var(t)).unwrap();
        let model = b.build().unwrap();
        assert_eq!(model.variable(v).unwrap().equation_order, Some(1));
        let vol_eq = model.get("vol_eq").unwrap();
        assert!(matches!(model.node(vol_eq).unwrap().kind(), NodeKind::Equation(_)));
    }

    #[test]
    fn derive_records_initials() {
        let mut b = SystemBuilder::system("Model");
        let x = b.variable("x", amount(1.0)).unwrap();
        b.derive(x, 2, Some(Expr::Number(0.5))).unwrap();
        assert!(b.derive(x, 0, None).is_err());
        let model = b.build().unwrap();
        let x = model.variable(x).unwrap();
        assert_eq!(x.derivatives[&2].initial, Some(Expr::Number(0.5)));
        assert_eq!(x.derivatives.len(), 2);
    }
}
