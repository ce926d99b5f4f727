//! Content MathML to [`Expr`].
//!
//! Identifiers (`ci`, `csymbol`) become [`Expr::Symbol`]s; bind them to model
//! nodes afterwards with [`Expr::bind_symbols`].

use std::f64::consts;

use log::trace;

use super::xml::Element;
use crate::error::{ModelError, Result};
use crate::expr::{BinaryOp, Expr, Func, UnaryOp};

pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operator {
    /// Exactly two operands.
    Binary(BinaryOp),
    /// Left fold over one or more operands.
    Fold(BinaryOp),
    /// Negation with one operand, subtraction with more.
    Minus,
    Unary(UnaryOp),
    Call(Func),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tag {
    Number,
    Identifier,
    Apply,
    Math,
    Constant(f64),
    Bool(bool),
    Operator(Operator),
    Unsupported,
}

fn tag(name: &str) -> Option<Tag> {
    use BinaryOp as B;
    use Operator::*;
    let tag = match name {
        "cn" => Tag::Number,
        "ci" | "csymbol" => Tag::Identifier,
        "apply" => Tag::Apply,
        "math" => Tag::Math,
        "eq" => Tag::Operator(Binary(B::Eq)),
        "neq" => Tag::Operator(Binary(B::Ne)),
        "gt" => Tag::Operator(Binary(B::Gt)),
        "lt" => Tag::Operator(Binary(B::Lt)),
        "geq" => Tag::Operator(Binary(B::Ge)),
        "leq" => Tag::Operator(Binary(B::Le)),
        "plus" => Tag::Operator(Fold(B::Add)),
        "minus" => Tag::Operator(Minus),
        "times" => Tag::Operator(Fold(B::Mul)),
        "divide" => Tag::Operator(Fold(B::Div)),
        "power" => Tag::Operator(Binary(B::Pow)),
        "rem" => Tag::Operator(Binary(B::Rem)),
        "and" => Tag::Operator(Fold(B::And)),
        "or" => Tag::Operator(Fold(B::Or)),
        "xor" => Tag::Operator(Binary(B::Xor)),
        "not" => Tag::Operator(Unary(UnaryOp::Not)),
        "abs" => Tag::Operator(Call(Func::Abs)),
        "exp" => Tag::Operator(Call(Func::Exp)),
        "ln" => Tag::Operator(Call(Func::Ln)),
        "log" => Tag::Operator(Call(Func::Log10)),
        "floor" => Tag::Operator(Call(Func::Floor)),
        "ceiling" => Tag::Operator(Call(Func::Ceil)),
        "factorial" => Tag::Operator(Call(Func::Factorial)),
        "sin" => Tag::Operator(Call(Func::Sin)),
        "cos" => Tag::Operator(Call(Func::Cos)),
        "tan" => Tag::Operator(Call(Func::Tan)),
        "sinh" => Tag::Operator(Call(Func::Sinh)),
        "cosh" => Tag::Operator(Call(Func::Cosh)),
        "tanh" => Tag::Operator(Call(Func::Tanh)),
        "arcsin" => Tag::Operator(Call(Func::Asin)),
        "arccos" => Tag::Operator(Call(Func::Acos)),
        "arctan" => Tag::Operator(Call(Func::Atan)),
        "arcsinh" => Tag::Operator(Call(Func::Asinh)),
        "arccosh" => Tag::Operator(Call(Func::Acosh)),
        "arctanh" => Tag::Operator(Call(Func::Atanh)),
        "true" => Tag::Bool(true),
        "false" => Tag::Bool(false),
        "notanumber" => Tag::Constant(f64::NAN),
        "pi" => Tag::Constant(consts::PI),
        "infinity" => Tag::Constant(f64::INFINITY),
        "exponentiale" => Tag::Constant(consts::E),
        "sep" | "piecewise" | "piece" | "otherwise" | "lambda" | "root" | "quotient" | "max"
        | "min" | "implies" | "degree" | "bvar" | "logbase" | "sec" | "csc" | "cot" | "sech"
        | "csch" | "coth" | "arcsec" | "arccsc" | "arccot" | "arcsech" | "arccsch" | "arccoth"
        | "semantics" | "annotation" | "annotation-xml" => Tag::Unsupported,
        _ => return None,
    };
    Some(tag)
}

fn split_namespace(tag: &str) -> (&str, &str) {
    match tag.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
        Some((namespace, local)) => (namespace, local),
        None => ("", tag),
    }
}

enum Translated {
    Expr(Expr),
    Operator(Operator),
    List(Vec<Expr>),
}

fn fold(binary: BinaryOp, args: Vec<Expr>) -> Result<Expr> {
    args.into_iter()
        .reduce(|acc, arg| Expr::binop(binary, acc, arg))
        .ok_or_else(|| ModelError::parse(format!("{:?} needs at least one operand", binary)))
}

fn negate(mut args: Vec<Expr>) -> Result<Expr> {
    args.pop()
        .map(|child| Expr::monop(UnaryOp::Neg, child))
        .ok_or_else(|| ModelError::parse("missing operand"))
}

fn apply(op: Operator, args: Vec<Expr>) -> Result<Expr> {
    let arity = |expected: usize| {
        if args.len() == expected {
            Ok(())
        } else {
            Err(ModelError::parse(format!(
                "{:?} takes {} operands, {} given",
                op,
                expected,
                args.len()
            )))
        }
    };
    match op {
        Operator::Binary(binary) => {
            arity(2)?;
            let mut args = args.into_iter();
            match (args.next(), args.next()) {
                (Some(left), Some(right)) => Ok(Expr::binop(binary, left, right)),
                _ => Err(ModelError::parse("missing operand")),
            }
        }
        Operator::Minus if args.len() == 1 => negate(args),
        Operator::Minus => fold(BinaryOp::Sub, args),
        Operator::Fold(binary) => fold(binary, args),
        Operator::Unary(unary) => {
            arity(1)?;
            let mut args = args;
            args.pop()
                .map(|child| Expr::monop(unary, child))
                .ok_or_else(|| ModelError::parse("missing operand"))
        }
        Operator::Call(func) => {
            arity(1)?;
            Ok(Expr::call(func, args))
        }
    }
}

fn expressions(translated: Vec<Translated>) -> Result<Vec<Expr>> {
    translated
        .into_iter()
        .map(|t| match t {
            Translated::Expr(expr) => Ok(expr),
            Translated::Operator(op) => {
                Err(ModelError::parse(format!("{:?} used as an operand", op)))
            }
            Translated::List(_) => Err(ModelError::parse("nested math element used as an operand")),
        })
        .collect()
}

// plain decimal <cn> only; e-notation and rational need the <sep/> split
fn number<E: Element>(element: &E, text: &str) -> Result<f64> {
    match element.attribute("type") {
        None | Some("real") | Some("integer") => {}
        Some(other) => {
            return Err(ModelError::unsupported(format!("<cn type=\"{}\">", other)))
        }
    }
    if let Some(base) = element.attribute("base").filter(|base| base.trim() != "10") {
        return Err(ModelError::unsupported(format!("<cn base=\"{}\">", base)));
    }
    if let Some(child) = element.children().first() {
        translate(child)?;
        return Err(ModelError::parse("<cn> may only hold text"));
    }
    text.parse::<f64>()
        .map_err(|_| ModelError::parse(format!("<cn> holds {:?}, not a number", text)))
}

fn translate<E: Element>(element: &E) -> Result<Translated> {
    let (namespace, local) = split_namespace(element.tag());
    if !namespace.is_empty() && namespace != MATHML_NAMESPACE {
        return Err(ModelError::parse(format!("unknown namespace {}", namespace)));
    }
    let kind = tag(local)
        .ok_or_else(|| ModelError::parse(format!("unknown MathML element <{}>", local)))?;
    let text = element.text().map(str::trim).unwrap_or("");
    match kind {
        Tag::Unsupported => Err(ModelError::unsupported(format!("MathML element <{}>", local))),
        Tag::Apply => {
            let mut children = element.children().iter().map(translate);
            let op = match children.next() {
                Some(Ok(Translated::Operator(op))) => op,
                Some(Err(err)) => return Err(err),
                Some(Ok(_)) => return Err(ModelError::parse("<apply> must start with an operator")),
                None => return Err(ModelError::parse("empty <apply>")),
            };
            let args = expressions(children.collect::<Result<Vec<_>>>()?)?;
            apply(op, args).map(Translated::Expr)
        }
        Tag::Math => {
            let children = element.children().iter().map(translate).collect::<Result<Vec<_>>>()?;
            Ok(Translated::List(expressions(children)?))
        }
        Tag::Number => number(element, text).map(|value| Translated::Expr(Expr::Number(value))),
        Tag::Identifier if text.is_empty() => Err(ModelError::parse(format!("empty <{}>", local))),
        Tag::Identifier => Ok(Translated::Expr(Expr::symbol(text))),
        Tag::Constant(value) => Ok(Translated::Expr(Expr::Number(value))),
        Tag::Bool(value) => Ok(Translated::Expr(Expr::Bool(value))),
        Tag::Operator(op) => Ok(Translated::Operator(op)),
    }
}

/// Translate a `<math>` element holding one expression, or any single
/// expression element.
pub fn from_element<E: Element>(element: &E) -> Result<Expr> {
    let expr = match translate(element)? {
        Translated::Expr(expr) => expr,
        Translated::List(mut exprs) if exprs.len() == 1 => exprs.remove(0),
        Translated::List(exprs) => {
            return Err(ModelError::parse(format!(
                "expected a single expression, found {}",
                exprs.len()
            )))
        }
        Translated::Operator(op) => {
            return Err(ModelError::parse(format!("{:?} is not an expression", op)))
        }
    };
    trace!("translated MathML to {}", expr);
    Ok(expr)
}
