//! Amount/concentration conversion against the nearest enclosing compartment.
//!
//! Rate laws are written in concentration terms. A species is read into a
//! rate expression through [`make_concentration`], and each per-species
//! contribution is written back through [`compensate_volume`], so one
//! reaction may mix amount and concentration species, or species of
//! different nested compartments.

use log::trace;

use crate::error::{ModelError, Result};
use crate::expr::Expr;
use crate::model::{Model, NodeId, VariableKind};

/// Nearest ancestor of `id` that is a compartment.
pub fn nearest_compartment(model: &Model, id: NodeId) -> Option<NodeId> {
    model.nearest_ancestor(id, |n| n.kind().is_compartment())
}

fn volume_expr(model: &Model, compartment: NodeId) -> Result<Expr> {
    model.volume_of(compartment).map(Expr::Var).ok_or_else(|| {
        ModelError::conversion(format!(
            "Compartment {} must have a Volume",
            model.path(compartment)
        ))
    })
}

/// Express `variable` in concentration terms.
///
/// Amount species inside a compartment are divided by its volume; all other
/// variables are returned as they are.
pub fn make_concentration(model: &Model, variable: NodeId) -> Result<Expr> {
    let kind = model.variable(variable)?.kind();
    if let VariableKind::Species {
        concentration: false,
    } = kind
    {
        if let Some(compartment) = nearest_compartment(model, variable) {
            let volume = volume_expr(model, compartment)?;
            trace!(
                "reading amount {} as concentration in {}",
                model.path(variable),
                model.path(compartment)
            );
            return Ok(Expr::Var(variable) / volume);
        }
    }
    Ok(Expr::Var(variable))
}

/// Rescale a rate contribution destined for `variable`'s own equation to
/// the variable's native representation.
pub fn compensate_volume(
    model: &Model,
    variable: NodeId,
    rhs: Expr,
    reaction_is_concentration: bool,
) -> Result<Expr> {
    let VariableKind::Species { concentration } = model.variable(variable)?.kind() else {
        return Ok(rhs);
    };
    let Some(compartment) = nearest_compartment(model, variable) else {
        return Ok(rhs);
    };
    match (concentration, reaction_is_concentration) {
        (true, false) => Ok(rhs / volume_expr(model, compartment)?),
        (false, true) => Ok(rhs * volume_expr(model, compartment)?),
        _ => Ok(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::{compensate_volume, make_concentration, nearest_compartment};
    use crate::compartment::volume;
    use crate::error::ModelError;
    use crate::expr::Expr;
    use crate::model::{Model, NodeKind, SystemBuilder};
    use crate::species::{amount, concentration, reaction_amount, reaction_concentration, variable};

    #[test]
    fn species_in_reactant() {
        let mut b = SystemBuilder::compartment("Nested");
        let v = b.variable("V", volume(2.0)).unwrap();
        let a = b.reactant("A", reaction_amount(0.5)).unwrap().variable;
        let bb = b.reactant("B", reaction_concentration(2.0)).unwrap().variable;
        let model = b.build().unwrap();

        assert_eq!(make_concentration(&model, a).unwrap(), Expr::var(a) / Expr::var(v));
        assert_eq!(make_concentration(&model, bb).unwrap(), Expr::var(bb));
        assert_eq!(
            compensate_volume(&model, a, 2.0 * Expr::var(a), true).unwrap(),
            2.0 * Expr::var(a) * Expr::var(v)
        );
        assert_eq!(
            compensate_volume(&model, bb, 2.0 * Expr::var(bb), true).unwrap(),
            2.0 * Expr::var(bb)
        );
        assert_eq!(
            compensate_volume(&model, bb, Expr::Number(1.0), false).unwrap(),
            Expr::Number(1.0) / Expr::var(v)
        );
        assert_eq!(
            compensate_volume(&model, a, Expr::Number(1.0), false).unwrap(),
            Expr::Number(1.0)
        );
    }

    #[test]
    fn outside_a_compartment_nothing_changes() {
        let mut b = SystemBuilder::system("Plain");
        let a = b.variable("A", amount(1.0)).unwrap();
        let c = b.variable("C", concentration(1.0)).unwrap();
        let model = b.build().unwrap();
        assert_eq!(make_concentration(&model, a).unwrap(), Expr::var(a));
        assert_eq!(
            compensate_volume(&model, a, Expr::Number(3.0), true).unwrap(),
            Expr::Number(3.0)
        );
        assert_eq!(
            compensate_volume(&model, c, Expr::Number(3.0), false).unwrap(),
            Expr::Number(3.0)
        );
    }

    #[test]
    fn plain_variables_are_never_converted() {
        let mut b = SystemBuilder::compartment("Cell");
        b.variable("V", volume(2.0)).unwrap();
        let x = b.variable("x", variable(1.0)).unwrap();
        let model = b.build().unwrap();
        assert_eq!(make_concentration(&model, x).unwrap(), Expr::var(x));
        assert_eq!(
            compensate_volume(&model, x, Expr::Number(1.0), true).unwrap(),
            Expr::Number(1.0)
        );
    }

    #[test]
    fn nested_species_use_their_own_compartment() {
        let mut inner = SystemBuilder::compartment("Inner");
        inner.variable("V", volume(1.0)).unwrap();
        inner.variable("A", amount(1.0)).unwrap();
        let inner = inner.build().unwrap();

        let mut b = SystemBuilder::compartment("Outer");
        let outer_v = b.variable("V", volume(3.0)).unwrap();
        let outer_a = b.variable("A", amount(1.0)).unwrap();
        let n = b.instantiate("inner", &inner, &[]).unwrap();
        let model = b.build().unwrap();

        let inner_a = model.child(n, "A").unwrap();
        let inner_v = model.child(n, "V").unwrap();
        assert_eq!(nearest_compartment(&model, inner_a), Some(n));
        assert_eq!(
            make_concentration(&model, inner_a).unwrap(),
            Expr::var(inner_a) / Expr::var(inner_v)
        );
        assert_eq!(
            make_concentration(&model, outer_a).unwrap(),
            Expr::var(outer_a) / Expr::var(outer_v)
        );
    }

    #[test]
    fn round_trip_scales_by_volume_once() {
        let mut b = SystemBuilder::compartment("Cell");
        let v = b.variable("V", volume(2.0)).unwrap();
        let a = b.variable("A", amount(1.0)).unwrap();
        let model = b.build().unwrap();
        let read = make_concentration(&model, a).unwrap();
        let written = compensate_volume(&model, a, read, true).unwrap();
        assert_eq!(written, Expr::var(a) / Expr::var(v) * Expr::var(v));
        let value = written
            .eval(&|id| Ok(if id == v { 2.0 } else { 5.0 }))
            .unwrap();
        assert_eq!(value, 5.0);
    }

    #[test]
    fn compartment_without_volume_is_a_conversion_error() {
        // bypasses the builder, which would reject this compartment
        let mut model = Model::new("Broken", true);
        let root = model.root();
        let a = model.push(root, "A", NodeKind::Variable(amount(1.0))).unwrap();
        assert!(matches!(make_concentration(&model, a), Err(ModelError::Conversion(_))));
        assert!(matches!(
            compensate_volume(&model, a, Expr::Number(1.0), true),
            Err(ModelError::Conversion(_))
        ));
    }
}
