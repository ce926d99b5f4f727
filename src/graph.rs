//! Structural export of the reaction network.
//!
//! [`reaction_graph`] builds a directed bipartite graph: reactants point to
//! their reaction, a reaction points to its products, and every edge carries
//! the stoichiometric coefficient. The projections connect two species that
//! take part in the same reaction, or two reactions that share a species.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};

use crate::error::Result;
use crate::model::{Model, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    Species {
        id: NodeId,
        name: String,
    },
    /// One rate law of a reaction node.
    Reaction {
        id: NodeId,
        rate_law: usize,
        name: String,
    },
}

impl GraphNode {
    pub fn is_species(&self) -> bool {
        matches!(self, GraphNode::Species { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            GraphNode::Species { name, .. } | GraphNode::Reaction { name, .. } => name,
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub type ReactionGraph = DiGraph<GraphNode, f64>;

pub fn reaction_graph(model: &Model) -> Result<ReactionGraph> {
    let mut graph = ReactionGraph::new();
    let mut species: HashMap<NodeId, NodeIndex> = HashMap::new();

    let mut species_node = |graph: &mut ReactionGraph, id: NodeId| {
        *species.entry(id).or_insert_with(|| {
            graph.add_node(GraphNode::Species {
                id,
                name: model.path(id),
            })
        })
    };

    for id in model.species() {
        species_node(&mut graph, id);
    }
    for id in model.reactions() {
        let NodeKind::Reaction(reaction) = model.node(id)?.kind() else {
            continue;
        };
        let path = model.path(id);
        for (i, rate_law) in reaction.rate_laws.iter().enumerate() {
            let name = if reaction.rate_laws.len() == 1 {
                path.clone()
            } else {
                format!("{}[{}]", path, i)
            };
            let node = graph.add_node(GraphNode::Reaction {
                id,
                rate_law: i,
                name,
            });
            for reactant in &rate_law.reactants {
                let from = species_node(&mut graph, reactant.variable);
                graph.add_edge(from, node, reactant.stoichiometry);
            }
            for product in &rate_law.products {
                let to = species_node(&mut graph, product.variable);
                graph.add_edge(node, to, product.stoichiometry);
            }
        }
    }
    debug!(
        "reaction graph of {} has {} nodes and {} edges",
        model.name(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn project(graph: &ReactionGraph, keep: impl Fn(&GraphNode) -> bool) -> UnGraph<GraphNode, ()> {
    let mut projected = UnGraph::default();
    let mut map = HashMap::new();
    for idx in graph.node_indices() {
        if keep(&graph[idx]) {
            map.insert(idx, projected.add_node(graph[idx].clone()));
        }
    }
    for idx in graph.node_indices() {
        let Some(&from) = map.get(&idx) else {
            continue;
        };
        for middle in graph.neighbors_undirected(idx) {
            for other in graph.neighbors_undirected(middle) {
                if other <= idx {
                    continue;
                }
                if let Some(&to) = map.get(&other) {
                    projected.update_edge(from, to, ());
                }
            }
        }
    }
    projected
}

/// Two species are connected if they take part in the same reaction.
pub fn to_species_graph(graph: &ReactionGraph) -> UnGraph<GraphNode, ()> {
    project(graph, GraphNode::is_species)
}

/// Two reactions are connected if they share a species.
pub fn to_reaction_graph(graph: &ReactionGraph) -> UnGraph<GraphNode, ()> {
    project(graph, |n| !n.is_species())
}

#[cfg(test)]
mod tests {

    use super::{reaction_graph, to_reaction_graph, to_species_graph, GraphNode};
    use crate::compartment::volume;
    use crate::model::SystemBuilder;
    use crate::reactions::compound::Equilibration;
    use crate::reactions::single::{Conversion, Destruction};
    use crate::species::{amount, parameter};

    fn chain() -> crate::model::Model {
        let mut b = SystemBuilder::compartment("Chain");
        b.variable("V", volume(1.0)).unwrap();
        let a = b.variable("A", amount(1.0)).unwrap();
        let c = b.variable("B", amount(0.0)).unwrap();
        let d = b.variable("C", amount(0.0)).unwrap();
        let k = b.parameter("k", parameter(1.0)).unwrap();
        b.reaction("ab", Equilibration::new(a, c, k, k)).unwrap();
        b.reaction("bc", Conversion::new(c, d, k)).unwrap();
        b.reaction("decay", Destruction::new(2.0 * d, k)).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn bipartite_graph_has_weighted_edges() {
        let model = chain();
        let graph = reaction_graph(&model).unwrap();
        // 3 species, 4 rate laws
        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.edge_count(), 7);
        let names: Vec<&str> = graph.node_weights().map(GraphNode::name).collect();
        assert_eq!(names, vec!["A", "B", "C", "ab[0]", "ab[1]", "bc", "decay"]);
        let decay = graph
            .node_indices()
            .find(|i| graph[*i].name() == "decay")
            .unwrap();
        let edge = graph.edges_directed(decay, petgraph::Direction::Incoming).next().unwrap();
        assert_eq!(*edge.weight(), 2.0);
    }

    #[test]
    fn projections() {
        let graph = reaction_graph(&chain()).unwrap();
        let species = to_species_graph(&graph);
        assert_eq!(species.node_count(), 3);
        // A-B and B-C, but not A-C
        assert_eq!(species.edge_count(), 2);

        let reactions = to_reaction_graph(&graph);
        assert_eq!(reactions.node_count(), 4);
        // ab[0]-ab[1], ab[0]-bc, ab[1]-bc, bc-decay
        assert_eq!(reactions.edge_count(), 4);
    }
}
