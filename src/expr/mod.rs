//! Symbolic scalar expressions over model nodes.
//!
//! Leaves refer to nodes by [`NodeId`], so an expression is only meaningful
//! together with the [`Model`](crate::Model) whose arena issued those ids.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use itertools::Itertools;

use crate::error::{ModelError, Result};
use crate::model::NodeId;

mod ops;

pub use ops::{BinaryOp, Func, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct Binop {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monop {
    pub op: UnaryOp,
    pub child: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Func,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Var(NodeId),
    Derivative { variable: NodeId, order: usize },
    /// An identifier not yet bound to a node, as produced by import.
    Symbol(String),
    Binop(Binop),
    Monop(Monop),
    Call(Call),
}

impl Expr {
    pub fn var(id: NodeId) -> Self {
        Expr::Var(id)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn binop(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binop(Binop {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn monop(op: UnaryOp, child: Expr) -> Self {
        Expr::Monop(Monop {
            op,
            child: Box::new(child),
        })
    }

    pub fn call(func: Func, args: Vec<Expr>) -> Self {
        Expr::Call(Call { func, args })
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Expr::binop(BinaryOp::Pow, self, exponent.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Expr::Var(_))
    }

    /// Rebuild the expression, replacing every variable leaf for which `f`
    /// returns `Some`.
    pub fn map_vars(&self, f: &mut dyn FnMut(NodeId) -> Option<Expr>) -> Expr {
        match self {
            Expr::Var(id) => f(*id).unwrap_or_else(|| self.clone()),
            Expr::Binop(binop) => Expr::binop(
                binop.op,
                binop.left.map_vars(f),
                binop.right.map_vars(f),
            ),
            Expr::Monop(monop) => Expr::monop(monop.op, monop.child.map_vars(f)),
            Expr::Call(call) => Expr::call(
                call.func,
                call.args.iter().map(|arg| arg.map_vars(f)).collect(),
            ),
            Expr::Number(_) | Expr::Bool(_) | Expr::Derivative { .. } | Expr::Symbol(_) => {
                self.clone()
            }
        }
    }

    pub fn clone_and_subst(&self, replacements: &HashMap<NodeId, Expr>) -> Expr {
        self.map_vars(&mut |id| replacements.get(&id).cloned())
    }

    /// Rewrite every node reference, derivatives included, through `ids`.
    pub fn rename(&self, ids: &HashMap<NodeId, NodeId>) -> Expr {
        match self {
            Expr::Var(id) => Expr::Var(*ids.get(id).unwrap_or(id)),
            Expr::Derivative { variable, order } => Expr::Derivative {
                variable: *ids.get(variable).unwrap_or(variable),
                order: *order,
            },
            Expr::Binop(binop) => Expr::binop(
                binop.op,
                binop.left.rename(ids),
                binop.right.rename(ids),
            ),
            Expr::Monop(monop) => Expr::monop(monop.op, monop.child.rename(ids)),
            Expr::Call(call) => Expr::call(
                call.func,
                call.args.iter().map(|arg| arg.rename(ids)).collect(),
            ),
            Expr::Number(_) | Expr::Bool(_) | Expr::Symbol(_) => self.clone(),
        }
    }

    pub fn bind_symbols(&self, bindings: &HashMap<String, Expr>) -> Expr {
        match self {
            Expr::Symbol(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            Expr::Binop(binop) => Expr::binop(
                binop.op,
                binop.left.bind_symbols(bindings),
                binop.right.bind_symbols(bindings),
            ),
            Expr::Monop(monop) => Expr::monop(monop.op, monop.child.bind_symbols(bindings)),
            Expr::Call(call) => Expr::call(
                call.func,
                call.args.iter().map(|arg| arg.bind_symbols(bindings)).collect(),
            ),
            _ => self.clone(),
        }
    }

    /// Distinct node ids referenced by the expression, in order of first appearance.
    pub fn dependents(&self) -> Vec<NodeId> {
        let mut deps = Vec::new();
        self.collect_dependents(&mut deps);
        deps
    }

    fn collect_dependents(&self, deps: &mut Vec<NodeId>) {
        match self {
            Expr::Var(id) | Expr::Derivative { variable: id, .. } => {
                if !deps.contains(id) {
                    deps.push(*id);
                }
            }
            Expr::Binop(binop) => {
                binop.left.collect_dependents(deps);
                binop.right.collect_dependents(deps);
            }
            Expr::Monop(monop) => monop.child.collect_dependents(deps),
            Expr::Call(call) => call.args.iter().for_each(|arg| arg.collect_dependents(deps)),
            Expr::Number(_) | Expr::Bool(_) | Expr::Symbol(_) => (),
        }
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_symbols(&mut names);
        names
    }

    fn collect_symbols<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Symbol(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Binop(binop) => {
                binop.left.collect_symbols(names);
                binop.right.collect_symbols(names);
            }
            Expr::Monop(monop) => monop.child.collect_symbols(names),
            Expr::Call(call) => call.args.iter().for_each(|arg| arg.collect_symbols(names)),
            _ => (),
        }
    }

    /// Evaluate numerically, resolving variable leaves through `lookup`.
    /// Booleans evaluate to 1 and 0.
    pub fn eval(&self, lookup: &dyn Fn(NodeId) -> Result<f64>) -> Result<f64> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Bool(value) => Ok(if *value { 1.0 } else { 0.0 }),
            Expr::Var(id) => lookup(*id),
            Expr::Derivative { variable, order } => Err(ModelError::evaluation(format!(
                "cannot evaluate derivative of order {} of {}",
                order, variable
            ))),
            Expr::Symbol(name) => Err(ModelError::evaluation(format!(
                "unbound symbol {}",
                name
            ))),
            Expr::Binop(binop) => {
                let left = binop.left.eval(lookup)?;
                let right = binop.right.eval(lookup)?;
                Ok(binop.op.apply(left, right))
            }
            Expr::Monop(monop) => Ok(monop.op.apply(monop.child.eval(lookup)?)),
            Expr::Call(call) => {
                if call.args.len() != 1 {
                    return Err(ModelError::evaluation(format!(
                        "function {} takes 1 argument, {} given",
                        call.func.name(),
                        call.args.len()
                    )));
                }
                Ok(call.func.apply(call.args[0].eval(lookup)?))
            }
        }
    }

    /// Format with a caller-supplied name for each node id.
    pub fn display_with(&self, names: &dyn Fn(NodeId) -> String) -> String {
        match self {
            Expr::Number(value) => value.to_string(),
            Expr::Bool(value) => value.to_string(),
            Expr::Var(id) => names(*id),
            Expr::Derivative { variable, order } => format!("d{}({})", order, names(*variable)),
            Expr::Symbol(name) => name.clone(),
            Expr::Binop(binop) => format!(
                "({} {} {})",
                binop.left.display_with(names),
                binop.op.symbol(),
                binop.right.display_with(names)
            ),
            Expr::Monop(monop) => {
                format!("{}{}", monop.op.symbol(), monop.child.display_with(names))
            }
            Expr::Call(call) => format!(
                "{}({})",
                call.func.name(),
                call.args.iter().map(|arg| arg.display_with(names)).join(", ")
            ),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_with(&|id| id.to_string()))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Number(f64::from(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Bool(value)
    }
}

impl From<NodeId> for Expr {
    fn from(id: NodeId) -> Self {
        Expr::Var(id)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Expr>> $trait<T> for Expr {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                Expr::binop($op, self, rhs.into())
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binop($op, Expr::Number(self), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::monop(UnaryOp::Neg, self)
    }
}
