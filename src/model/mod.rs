//! The containment tree.
//!
//! A [`Model`] is an arena of [`Node`]s. Every node except the root has
//! exactly one parent, referenced by index; children are kept in declaration
//! order. Nodes are never re-parented: attaching a template to a new parent
//! always goes through [`Model::attach_clone`], which allocates fresh ids.

use std::fmt;

use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::reactions::{EquationGroup, ReactionNode};
use crate::species::Reactant;

pub mod builder;
mod clone;
pub mod variable;

pub use builder::SystemBuilder;
pub use clone::Binding;
pub use variable::{Derivative, Parameter, ParameterKind, Variable, VariableKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub compartment: bool,
    /// The single directly declared volume, registered when it is added.
    pub volume: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    System(System),
    Variable(Variable),
    Parameter(Parameter),
    Independent,
    /// A template slot that was bound to an external node on instantiation.
    Link(Reactant),
    Reaction(ReactionNode),
    Equation(EquationGroup),
}

impl NodeKind {
    pub fn as_system(&self) -> Option<&System> {
        match self {
            NodeKind::System(system) => Some(system),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            NodeKind::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            NodeKind::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn as_reaction(&self) -> Option<&ReactionNode> {
        match self {
            NodeKind::Reaction(reaction) => Some(reaction),
            _ => None,
        }
    }

    pub fn is_compartment(&self) -> bool {
        matches!(self, NodeKind::System(System { compartment: true, .. }))
    }

    pub fn is_species(&self) -> bool {
        self.as_variable().is_some_and(Variable::is_species)
    }

    pub fn is_volume(&self) -> bool {
        self.as_variable().is_some_and(Variable::is_volume)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::System(System { compartment: true, .. }) => "Compartment",
            NodeKind::System(_) => "System",
            NodeKind::Variable(v) => match v.kind() {
                VariableKind::Plain => "Variable",
                VariableKind::Species { .. } => "Species",
                VariableKind::Volume => "Volume",
            },
            NodeKind::Parameter(p) if p.is_constant() => "Constant",
            NodeKind::Parameter(_) => "Parameter",
            NodeKind::Independent => "Independent",
            NodeKind::Link(_) => "Link",
            NodeKind::Reaction(_) => "Reaction",
            NodeKind::Equation(_) => "Equation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// A finished (or in-construction) containment tree rooted at one system.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Model {
    pub(crate) fn new(name: &str, compartment: bool) -> Self {
        let root = Node {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            kind: NodeKind::System(System {
                compartment,
                volume: None,
            }),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self) -> &str {
        &self.nodes[self.root.0].name
    }

    pub fn is_compartment(&self) -> bool {
        self.nodes[self.root.0].kind.is_compartment()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get_node(id).ok_or_else(|| {
            ModelError::lookup(format!(
                "node {} does not belong to model {}",
                id,
                self.name()
            ))
        })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        let name = self.name().to_string();
        self.nodes.get_mut(id.0).ok_or_else(|| {
            ModelError::lookup(format!("node {} does not belong to model {}", id, name))
        })
    }

    pub fn variable(&self, id: NodeId) -> Result<&Variable> {
        let node = self.node(id)?;
        node.kind.as_variable().ok_or_else(|| {
            ModelError::lookup(format!(
                "{} is a {}, not a variable",
                self.path(id),
                node.kind.kind_name()
            ))
        })
    }

    pub(crate) fn variable_mut(&mut self, id: NodeId) -> Result<&mut Variable> {
        let path = self.path(id);
        match &mut self.node_mut(id)?.kind {
            NodeKind::Variable(variable) => Ok(variable),
            other => Err(ModelError::lookup(format!(
                "{} is a {}, not a variable",
                path,
                other.kind_name()
            ))),
        }
    }

    /// Push a new child of `parent`; names are unique among siblings.
    pub(crate) fn push(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> Result<NodeId> {
        self.node(parent)?;
        if self.child(parent, name).is_some() {
            return Err(ModelError::definition(format!(
                "{} already has a member named {}",
                self.path(parent),
                name
            )));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get_node(parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == name)
    }

    /// Look up a node by its dotted path below the root, e.g. `"nested.A"`.
    pub fn get(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return Some(self.root);
        }
        path.split('.')
            .try_fold(self.root, |parent, name| self.child(parent, name))
    }

    pub fn lookup(&self, path: &str) -> Result<NodeId> {
        self.get(path)
            .ok_or_else(|| ModelError::lookup(format!("{} has no member {}", self.name(), path)))
    }

    /// Dotted path from the root (exclusive). The root's path is its name.
    pub fn path(&self, id: NodeId) -> String {
        let Some(node) = self.get_node(id) else {
            return id.to_string();
        };
        if id == self.root {
            return node.name.clone();
        }
        let mut names: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .take_while(|a| *a != self.root)
            .map(|a| self.nodes[a.0].name.as_str())
            .collect();
        names.reverse();
        names.join(".")
    }

    /// Nodes below `from` matching `filter`, in declaration order.
    ///
    /// With `recursive` false only direct children are visited. The
    /// returned iterator is finite, and calling this again restarts it.
    pub fn yield_nodes<F>(&self, from: NodeId, recursive: bool, filter: F) -> Descendants<'_, F>
    where
        F: Fn(&Node) -> bool,
    {
        let stack = self
            .get_node(from)
            .map(|node| node.children.iter().rev().copied().collect())
            .unwrap_or_default();
        Descendants {
            model: self,
            stack,
            recursive,
            filter,
        }
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            model: self,
            current: self.get_node(id).and_then(|n| n.parent),
        }
    }

    /// First ancestor of `id`, walking outward, whose node satisfies `predicate`.
    pub fn nearest_ancestor(
        &self,
        id: NodeId,
        predicate: impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(id).find(|a| predicate(&self.nodes[a.0]))
    }

    pub fn variables(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.yield_nodes(self.root, true, |n| n.kind.as_variable().is_some())
    }

    pub fn species(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.yield_nodes(self.root, true, |n| n.kind.is_species())
    }

    pub fn parameters(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.yield_nodes(self.root, true, |n| n.kind.as_parameter().is_some())
    }

    pub fn reactions(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.yield_nodes(self.root, true, |n| n.kind.as_reaction().is_some())
    }

    /// The volume registered on `system`, if it is a system that has one.
    pub fn volume_of(&self, system: NodeId) -> Option<NodeId> {
        self.get_node(system)?.kind.as_system()?.volume
    }

    /// Follow link nodes until a concrete node is reached, multiplying
    /// stoichiometries along the way.
    pub fn resolve(&self, reactant: Reactant) -> Result<Reactant> {
        let mut current = reactant;
        loop {
            match &self.node(current.variable)?.kind {
                NodeKind::Link(target) => {
                    current = Reactant {
                        variable: target.variable,
                        stoichiometry: current.stoichiometry * target.stoichiometry,
                    }
                }
                _ => return Ok(current),
            }
        }
    }

    /// Replace references to link nodes with their targets.
    pub fn resolve_links(&self, expr: &Expr) -> Result<Expr> {
        for id in expr.dependents() {
            self.node(id)?;
        }
        Ok(expr.map_vars(&mut |id| match &self.nodes[id.0].kind {
            NodeKind::Link(_) => self
                .resolve(Reactant::from(id))
                .ok()
                .map(|r| Expr::Var(r.variable)),
            _ => None,
        }))
    }

    pub fn set_initial(&mut self, id: NodeId, initial: impl Into<Expr>) -> Result<()> {
        let initial = initial.into();
        match &mut self.node_mut(id)?.kind {
            NodeKind::Variable(variable) => variable.initial = Some(initial),
            NodeKind::Parameter(parameter) => parameter.default = Some(initial),
            other => {
                return Err(ModelError::lookup(format!(
                    "cannot set the initial value of a {}",
                    other.kind_name()
                )))
            }
        }
        Ok(())
    }

    pub fn display(&self, expr: &Expr) -> String {
        expr.display_with(&|id| self.path(id))
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn push_detached(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

pub struct Descendants<'m, F> {
    model: &'m Model,
    stack: Vec<NodeId>,
    recursive: bool,
    filter: F,
}

impl<F: Fn(&Node) -> bool> Iterator for Descendants<'_, F> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let node = &self.model.nodes[id.0];
            if self.recursive {
                self.stack.extend(node.children.iter().rev());
            }
            if (self.filter)(node) {
                return Some(id);
            }
        }
        None
    }
}

pub struct Ancestors<'m> {
    model: &'m Model,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.model.nodes[id.0].parent;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Model, NodeKind, System};
    use crate::compartment::volume;
    use crate::species::{amount, concentration};

    fn nested() -> Model {
        let mut model = Model::new("Outer", true);
        let root = model.root();
        model.push(root, "V", NodeKind::Variable(volume(1.0))).unwrap();
        model.push(root, "A", NodeKind::Variable(amount(1.0))).unwrap();
        let inner = model
            .push(
                root,
                "inner",
                NodeKind::System(System {
                    compartment: false,
                    volume: None,
                }),
            )
            .unwrap();
        model.push(inner, "B", NodeKind::Variable(concentration(2.0))).unwrap();
        model.push(root, "C", NodeKind::Variable(amount(0.0))).unwrap();
        model
    }

    #[test]
    fn yield_in_declaration_order() {
        let model = nested();
        let names: Vec<String> = model.species().map(|id| model.path(id)).collect();
        assert_eq!(names, vec!["A", "inner.B", "C"]);
        // restartable
        assert_eq!(model.species().count(), 3);
    }

    #[test]
    fn non_recursive_yield_stops_at_children() {
        let model = nested();
        let direct: Vec<_> = model
            .yield_nodes(model.root(), false, |n| n.kind().is_species())
            .map(|id| model.path(id))
            .collect();
        assert_eq!(direct, vec!["A", "C"]);
    }

    #[test]
    fn path_lookup_round_trips() {
        let model = nested();
        let b = model.get("inner.B").unwrap();
        assert_eq!(model.path(b), "inner.B");
        assert_eq!(model.node(b).unwrap().name(), "B");
        assert!(model.get("inner.X").is_none());
        assert_eq!(model.get(""), Some(model.root()));
    }

    #[test]
    fn nearest_ancestor_walks_outward() {
        let model = nested();
        let b = model.get("inner.B").unwrap();
        let inner = model.get("inner").unwrap();
        assert_eq!(
            model.nearest_ancestor(b, |n| n.kind().as_system().is_some()),
            Some(inner)
        );
        assert_eq!(
            model.nearest_ancestor(b, |n| n.kind().is_compartment()),
            Some(model.root())
        );
        assert_eq!(model.nearest_ancestor(model.root(), |_| true), None);
    }

    #[test]
    fn duplicate_member_is_rejected() {
        let mut model = nested();
        let root = model.root();
        assert!(model.push(root, "A", NodeKind::Variable(amount(1.0))).is_err());
    }
}
