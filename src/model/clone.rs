use std::collections::HashMap;
use std::iter;

use log::{debug, info};

use super::{Model, Node, NodeId, NodeKind, System};
use crate::compartment::check_linkage;
use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::species::Reactant;

/// Value supplied for a template slot on instantiation.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Override the slot's initial value (or parameter default).
    Value(Expr),
    /// Replace the slot by a node of the enclosing model.
    Link(Reactant),
}

impl Binding {
    pub fn is_link(&self) -> bool {
        matches!(self, Binding::Link(_))
    }
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Binding::Value(Expr::Number(value))
    }
}

impl From<i32> for Binding {
    fn from(value: i32) -> Self {
        Binding::Value(Expr::from(value))
    }
}

/// A bare variable reference is a link; any other expression is a value.
impl From<Expr> for Binding {
    fn from(expr: Expr) -> Self {
        match expr {
            Expr::Var(id) => Binding::Link(Reactant::from(id)),
            expr => Binding::Value(expr),
        }
    }
}

impl From<NodeId> for Binding {
    fn from(id: NodeId) -> Self {
        Binding::Link(Reactant::from(id))
    }
}

impl From<Reactant> for Binding {
    fn from(reactant: Reactant) -> Self {
        Binding::Link(reactant)
    }
}

impl Model {
    fn check_binding(&self, template: &Model, slot: NodeId, binding: &Binding) -> Result<()> {
        let node = template.node(slot)?;
        check_linkage(template, slot, binding)?;
        match binding {
            Binding::Value(expr) => {
                for dep in expr.dependents() {
                    self.node(dep)?;
                }
                match node.kind() {
                    NodeKind::Variable(_) | NodeKind::Parameter(_) => Ok(()),
                    other => Err(ModelError::lookup(format!(
                        "cannot assign a value to {} {} of {}",
                        other.kind_name(),
                        node.name(),
                        template.name()
                    ))),
                }
            }
            Binding::Link(reactant) => {
                let target = self.node(reactant.variable)?;
                if !(reactant.stoichiometry > 0.0 && reactant.stoichiometry.is_finite()) {
                    return Err(ModelError::definition(format!(
                        "stoichiometry of {} must be positive, got {}",
                        node.name(),
                        reactant.stoichiometry
                    )));
                }
                let linkable = match (node.kind(), target.kind()) {
                    (NodeKind::Variable(slot), NodeKind::Variable(_)) => {
                        reactant.stoichiometry == 1.0 || slot.is_reactant_slot()
                    }
                    (
                        NodeKind::Parameter(_),
                        NodeKind::Variable(_) | NodeKind::Parameter(_) | NodeKind::Independent,
                    ) => reactant.stoichiometry == 1.0,
                    (NodeKind::Independent, NodeKind::Independent) => true,
                    _ => false,
                };
                if linkable {
                    Ok(())
                } else {
                    Err(ModelError::linkage(format!(
                        "cannot link {} {} of {} to {} {}",
                        node.kind().kind_name(),
                        node.name(),
                        template.name(),
                        target.kind().kind_name(),
                        self.path(reactant.variable)
                    )))
                }
            }
        }
    }

    /// Copy the whole of `template` below `parent` under `name`.
    ///
    /// Runs in two passes: first every template node is assigned its new id,
    /// then every node is rebuilt with all of its expressions rewritten
    /// through that map. Linked slots are mapped to their external targets
    /// instead and appear in the copy as link nodes. The template is never
    /// modified, and no node of the copy shares identity with it.
    ///
    /// ```
    /// use simbio::{amount, SystemBuilder};
    ///
    /// let mut inner = SystemBuilder::system("Inner");
    /// inner.variable("A", amount(1.0)).unwrap();
    /// let inner = inner.build().unwrap();
    ///
    /// let mut model = SystemBuilder::system("Outer").build().unwrap();
    /// let root = model.root();
    /// let first = model.attach_clone(root, "first", &inner, &[]).unwrap();
    /// let second = model.attach_clone(root, "second", &inner, &[]).unwrap();
    /// assert_eq!(model.path(first), "first");
    /// assert_ne!(model.child(first, "A"), model.child(second, "A"));
    /// assert!(model.get("second.A").is_some());
    /// ```
    pub fn attach_clone(
        &mut self,
        parent: NodeId,
        name: &str,
        template: &Model,
        bindings: &[(&str, Binding)],
    ) -> Result<NodeId> {
        if self.node(parent)?.kind().as_system().is_none() {
            return Err(ModelError::definition(format!(
                "{} is not a system and cannot own {}",
                self.path(parent),
                name
            )));
        }
        if self.child(parent, name).is_some() {
            return Err(ModelError::definition(format!(
                "{} already has a member named {}",
                self.path(parent),
                name
            )));
        }

        let mut overrides: HashMap<NodeId, &Binding> = HashMap::new();
        for (slot_name, binding) in bindings {
            let slot = template.child(template.root(), slot_name).ok_or_else(|| {
                ModelError::lookup(format!("{} has no member {}", template.name(), slot_name))
            })?;
            self.check_binding(template, slot, binding)?;
            if overrides.insert(slot, binding).is_some() {
                return Err(ModelError::definition(format!(
                    "{} is bound more than once",
                    slot_name
                )));
            }
        }

        // first pass: old id -> new id over the whole subtree
        let old_ids: Vec<NodeId> = iter::once(template.root())
            .chain(template.yield_nodes(template.root(), true, |_| true))
            .collect();
        let base = self.len();
        let ids: HashMap<NodeId, NodeId> = old_ids
            .iter()
            .enumerate()
            .map(|(i, old)| (*old, NodeId::new(base + i)))
            .collect();
        let mut refs = ids.clone();
        let mut factors: HashMap<NodeId, f64> = HashMap::new();
        for (slot, binding) in &overrides {
            if let Binding::Link(target) = binding {
                refs.insert(*slot, target.variable);
                factors.insert(*slot, target.stoichiometry);
            }
        }
        debug!(
            "cloning {} nodes of {} ({} links)",
            old_ids.len(),
            template.name(),
            factors.len()
        );

        // second pass: rebuild every node through the map
        for old in &old_ids {
            let node = template.node(*old)?;
            let kind = match (node.kind(), overrides.get(old)) {
                (_, Some(Binding::Link(target))) => NodeKind::Link(*target),
                (NodeKind::Variable(variable), value) => {
                    let mut variable = variable.clone();
                    variable.initial = match value {
                        Some(Binding::Value(expr)) => Some(self.resolve_links(expr)?),
                        _ => variable.initial.map(|e| e.rename(&refs)),
                    };
                    for derivative in variable.derivatives.values_mut() {
                        derivative.initial = derivative.initial.as_ref().map(|e| e.rename(&refs));
                    }
                    NodeKind::Variable(variable)
                }
                (NodeKind::Parameter(parameter), value) => {
                    let mut parameter = parameter.clone();
                    parameter.default = match value {
                        Some(Binding::Value(expr)) => Some(self.resolve_links(expr)?),
                        _ => parameter.default.map(|e| e.rename(&refs)),
                    };
                    NodeKind::Parameter(parameter)
                }
                (NodeKind::System(system), _) => NodeKind::System(System {
                    compartment: system.compartment,
                    volume: system.volume.map(|v| ids[&v]),
                }),
                (NodeKind::Link(target), _) => NodeKind::Link(Reactant::new(
                    *refs.get(&target.variable).unwrap_or(&target.variable),
                    target.stoichiometry * factors.get(&target.variable).unwrap_or(&1.0),
                )),
                (NodeKind::Reaction(reaction), _) => {
                    NodeKind::Reaction(reaction.rename(&refs, &factors))
                }
                (NodeKind::Equation(group), _) => NodeKind::Equation(group.rename(&refs)),
                (NodeKind::Independent, _) => NodeKind::Independent,
            };
            let is_root = *old == template.root();
            let id = self.push_detached(Node {
                name: if is_root { name.to_string() } else { node.name().to_string() },
                parent: if is_root {
                    Some(parent)
                } else {
                    node.parent().map(|p| ids[&p])
                },
                children: node.children().iter().map(|c| ids[c]).collect(),
                kind,
            });
            debug_assert_eq!(id, ids[old]);
        }
        let new_root = ids[&template.root()];
        self.node_mut(parent)?.children.push(new_root);

        // targets outside the copy now receive equations too
        let targets: Vec<(NodeId, usize)> = old_ids
            .iter()
            .flat_map(|old| match self.nodes()[ids[old].index()].kind() {
                NodeKind::Reaction(reaction) => {
                    reaction.targets().into_iter().map(|v| (v, 1)).collect()
                }
                NodeKind::Equation(group) => group
                    .equations
                    .iter()
                    .map(|e| (e.variable, e.order))
                    .collect(),
                _ => Vec::new(),
            })
            .collect();
        for (variable, order) in targets {
            self.variable_mut(variable)?.mark_equation(order);
        }

        info!(
            "instantiated {} as {}",
            template.name(),
            self.path(new_root)
        );
        Ok(new_root)
    }
}

#[cfg(test)]
mod tests {
    use super::Binding;
    use crate::compartment::volume;
    use crate::error::ModelError;
    use crate::expr::Expr;
    use crate::model::{Model, NodeKind, SystemBuilder};
    use crate::reactions::single::Destruction;
    use crate::species::{amount, parameter, reaction_initial, Initial, Reactant};

    fn decay() -> Model {
        let mut b = SystemBuilder::system("Decay");
        let a = b.reactant("A", reaction_initial(1.0)).unwrap();
        let k = b.parameter("k", parameter(0.5)).unwrap();
        let a_var = a.variable;
        b.variable("B", crate::species::variable(Expr::var(a_var) * 2.0)).unwrap();
        b.reaction("decay", Destruction::new(a, k)).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn clone_has_fresh_identity() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        let first = b.instantiate("first", &template, &[]).unwrap();
        let second = b.instantiate("second", &template, &[]).unwrap();
        let model = b.build().unwrap();

        let a1 = model.get("first.A").unwrap();
        let a2 = model.get("second.A").unwrap();
        assert_ne!(a1, a2);
        assert_ne!(first, second);
        // B's initial references the sibling A of its own copy
        let b1 = model.variable(model.get("first.B").unwrap()).unwrap();
        assert_eq!(b1.initial, Some(Expr::var(a1) * 2.0));
        let b2 = model.variable(model.get("second.B").unwrap()).unwrap();
        assert_eq!(b2.initial, Some(Expr::var(a2) * 2.0));
        // the template is untouched
        assert_eq!(template, decay());
    }

    #[test]
    fn mutating_one_clone_leaves_the_other() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        b.instantiate("first", &template, &[]).unwrap();
        b.instantiate("second", &template, &[]).unwrap();
        let mut model = b.build().unwrap();
        let a1 = model.get("first.A").unwrap();
        model.set_initial(a1, 10.0).unwrap();
        let a2 = model.get("second.A").unwrap();
        assert_eq!(model.variable(a1).unwrap().initial, Some(Expr::Number(10.0)));
        assert_eq!(model.variable(a2).unwrap().initial, Some(Expr::Number(1.0)));
    }

    #[test]
    fn reactions_follow_the_copy() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        b.instantiate("first", &template, &[]).unwrap();
        let model = b.build().unwrap();
        let reaction = model.get("first.decay").unwrap();
        let reaction = model.node(reaction).unwrap().kind().as_reaction().unwrap();
        let a = model.get("first.A").unwrap();
        let k = model.get("first.k").unwrap();
        assert_eq!(reaction.rate_laws[0].reactants, vec![Reactant::from(a)]);
        assert_eq!(reaction.rate_laws[0].rate(), Some(&Expr::var(k)));
        assert_eq!(model.variable(a).unwrap().equation_order, Some(1));
    }

    #[test]
    fn linked_slot_becomes_link_node() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        let x = b.variable("X", amount(3.0)).unwrap();
        b.instantiate("decay", &template, &[("A", Binding::from(2.0 * x))])
            .unwrap();
        let model = b.build().unwrap();
        let link = model.get("decay.A").unwrap();
        match model.node(link).unwrap().kind() {
            NodeKind::Link(target) => {
                assert_eq!(target.variable, x);
                assert_eq!(target.stoichiometry, 2.0);
            }
            other => panic!("expected link, got {:?}", other),
        }
        // the reaction now consumes X twice per event
        let reaction = model.get("decay.decay").unwrap();
        let reaction = model.node(reaction).unwrap().kind().as_reaction().unwrap();
        assert_eq!(reaction.rate_laws[0].reactants[0].variable, x);
        assert_eq!(reaction.rate_laws[0].reactants[0].stoichiometry, 2.0);
        // and B's initial points at X
        let b_init = &model.variable(model.get("decay.B").unwrap()).unwrap().initial;
        assert_eq!(b_init, &Some(Expr::var(x) * 2.0));
        assert_eq!(model.variable(x).unwrap().equation_order, Some(1));
    }

    #[test]
    fn value_binding_overrides_initial() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        b.instantiate("d", &template, &[("A", Binding::from(4.0)), ("k", Binding::from(2.0))])
            .unwrap();
        let model = b.build().unwrap();
        let a = model.get("d.A").unwrap();
        assert_eq!(model.variable(a).unwrap().initial, Some(Expr::Number(4.0)));
    }

    #[test]
    fn value_bindings_see_through_links() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        let x = b.variable("X", amount(3.0)).unwrap();
        let first = b.instantiate("first", &template, &[("A", Binding::from(x))]).unwrap();
        let first_a = b.child(first, "A").unwrap();
        b.instantiate(
            "second",
            &template,
            &[
                ("A", Binding::Value(Expr::var(first_a) * 2.0)),
                ("k", Binding::Value(Expr::var(first_a) + 1.0)),
            ],
        )
        .unwrap();
        let model = b.build().unwrap();
        let a = model.get("second.A").unwrap();
        assert_eq!(model.variable(a).unwrap().initial, Some(Expr::var(x) * 2.0));
        let k = model.get("second.k").unwrap();
        match model.node(k).unwrap().kind() {
            NodeKind::Parameter(parameter) => {
                assert_eq!(parameter.default, Some(Expr::var(x) + 1.0))
            }
            other => panic!("expected parameter, got {:?}", other),
        }
    }

    #[test]
    fn binding_errors() {
        let template = decay();
        let mut b = SystemBuilder::system("Model");
        assert!(matches!(
            b.instantiate("d", &template, &[("missing", Binding::from(1.0))]),
            Err(ModelError::Lookup(_))
        ));
        let k = b.parameter("k", parameter(1.0)).unwrap();
        // stoichiometry on a non-reactant slot
        let x = b.variable("X", amount(Initial::NONE)).unwrap();
        assert!(matches!(
            b.instantiate("d", &template, &[("k", Binding::from(2.0 * x))]),
            Err(ModelError::Linkage(_))
        ));
        assert!(b.instantiate("d", &template, &[("k", Binding::from(k))]).is_ok());
    }

    #[test]
    fn compartment_species_cannot_be_linked() {
        let mut nested = SystemBuilder::compartment("Nested");
        nested.variable("V", volume(1.0)).unwrap();
        nested.variable("A", amount(1.0)).unwrap();
        let nested = nested.build().unwrap();

        let mut b = SystemBuilder::compartment("Model");
        let v = b.variable("V", volume(1.0)).unwrap();
        let a = b.variable("A", amount(1.0)).unwrap();
        assert!(matches!(
            b.instantiate("nested", &nested, &[("A", Binding::from(a))]),
            Err(ModelError::Linkage(_))
        ));
        assert!(matches!(
            b.instantiate("nested", &nested, &[("V", Binding::from(v))]),
            Err(ModelError::Linkage(_))
        ));
        let nested_id = b.instantiate("nested", &nested, &[("A", Binding::from(2.0))]).unwrap();
        let model = b.build().unwrap();
        let inner_a = model.child(nested_id, "A").unwrap();
        assert_eq!(model.variable(inner_a).unwrap().initial, Some(Expr::Number(2.0)));
        assert_eq!(model.volume_of(nested_id), model.get("nested.V"));
    }
}
