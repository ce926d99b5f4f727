//! Reading expressions from markup.

pub mod mathml;
pub mod xml;

pub use mathml::{from_element, MATHML_NAMESPACE};
pub use xml::{parse_xml, Element, XmlElement};

use crate::error::Result;
use crate::expr::Expr;

/// Parse a MathML document into an expression.
pub fn parse_mathml(text: &str) -> Result<Expr> {
    from_element(&parse_xml(text)?)
}
