//! Volumes and the compartment rules: one direct volume per compartment,
//! and no external linking of compartment-local species or volumes.

use itertools::Itertools;
use log::debug;

use crate::error::{ModelError, Result};
use crate::model::{Binding, Model, NodeId, Variable, VariableKind};
use crate::species::Initial;

pub fn volume(default: impl Into<Initial>) -> Variable {
    Variable::new(VariableKind::Volume, default.into().0)
}

/// Check that `system` declares exactly one direct volume and return it.
///
/// Volumes of nested systems do not count.
pub fn check_volumes(model: &Model, system: NodeId) -> Result<NodeId> {
    let volumes: Vec<NodeId> = model
        .yield_nodes(system, false, |n| n.kind().is_volume())
        .collect();
    match volumes.as_slice() {
        [volume] => {
            debug!("compartment {} has volume {}", model.path(system), model.path(*volume));
            Ok(*volume)
        }
        [] => Err(ModelError::definition(format!(
            "Compartment {} has no Volume; compartments must have exactly one Volume",
            model.path(system)
        ))),
        _ => Err(ModelError::definition(format!(
            "Compartment {} has multiple Volumes ({}); compartments can only have one Volume",
            model.path(system),
            volumes.iter().map(|v| model.path(*v)).join(", ")
        ))),
    }
}

/// Reject binding a compartment's own species or volume to a node of the
/// enclosing model. Only initial values may be supplied for them.
pub fn check_linkage(template: &Model, slot: NodeId, binding: &Binding) -> Result<()> {
    if !template.is_compartment() || !binding.is_link() {
        return Ok(());
    }
    let node = template.node(slot)?;
    let local = node.kind().is_species() || node.kind().is_volume();
    if node.parent() == Some(template.root()) && local {
        return Err(ModelError::linkage(format!(
            "{} {} of compartment {} cannot be linked to an external variable, \
             only initials can be passed on instantiation",
            node.kind().kind_name(),
            node.name(),
            template.name()
        )));
    }
    Ok(())
}
