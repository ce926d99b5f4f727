use std::collections::HashMap;

use pest::iterators::Pair;
use pest::Parser;

use crate::error::{ModelError, Result};

#[derive(Parser)]
#[grammar = "import/xml.pest"] // relative to src
struct XmlParser;

/// Read-only view of an XML element, as consumed by the MathML translator.
pub trait Element: Sized {
    /// Tag name, qualified as `{namespace}local` when the element is in a
    /// namespace.
    fn tag(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Character data directly inside the element, if any.
    fn text(&self) -> Option<&str>;

    fn children(&self) -> &[Self];
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl Element for XmlElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let end = rest[start..]
            .find(';')
            .ok_or_else(|| ModelError::parse(format!("unterminated entity in {:?}", text)))?;
        let entity = &rest[start + 1..start + end];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok().and_then(char::from_u32)
                } else {
                    None
                }
            }
        };
        out.push(decoded.ok_or_else(|| ModelError::parse(format!("unknown entity &{};", entity)))?);
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn qualify(name: &str, scope: &HashMap<String, String>) -> Result<String> {
    let (namespace, local) = match name.split_once(':') {
        Some((prefix, local)) => {
            let namespace = scope
                .get(prefix)
                .ok_or_else(|| ModelError::parse(format!("unbound namespace prefix {}", prefix)))?;
            (namespace.as_str(), local)
        }
        None => (scope.get("").map(String::as_str).unwrap_or(""), name),
    };
    if namespace.is_empty() {
        Ok(local.to_string())
    } else {
        Ok(format!("{{{}}}{}", namespace, local))
    }
}

fn malformed() -> ModelError {
    ModelError::parse("malformed element")
}

fn read_element(pair: Pair<Rule>, scope: &HashMap<String, String>) -> Result<XmlElement> {
    let mut inner = pair.into_inner();
    let start = inner.next().ok_or_else(malformed)?;
    let mut start_inner = start.into_inner();
    let raw_name = start_inner.next().ok_or_else(malformed)?.as_str();

    let mut attributes = Vec::new();
    for attribute in start_inner {
        let mut parts = attribute.into_inner();
        let name = parts.next().ok_or_else(malformed)?.as_str().to_string();
        let value = match parts.next() {
            Some(value) => unescape(value.as_str())?,
            None => String::new(),
        };
        attributes.push((name, value));
    }

    let mut scope = scope.clone();
    for (name, value) in &attributes {
        if name == "xmlns" {
            scope.insert(String::new(), value.clone());
        } else if let Some(prefix) = name.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value.clone());
        }
    }
    let tag = qualify(raw_name, &scope)?;

    let mut text = String::new();
    let mut children = Vec::new();
    for part in inner {
        match part.as_rule() {
            Rule::element => children.push(read_element(part, &scope)?),
            Rule::text => text.push_str(&unescape(part.as_str())?),
            Rule::cdata_text => text.push_str(part.as_str()),
            Rule::close_tag => {
                let close = part.into_inner().next().ok_or_else(malformed)?.as_str();
                if close != raw_name {
                    return Err(ModelError::parse(format!(
                        "<{}> closed by </{}>",
                        raw_name, close
                    )));
                }
            }
            _ => {}
        }
    }

    Ok(XmlElement {
        tag,
        attributes,
        text: if text.is_empty() { None } else { Some(text) },
        children,
    })
}

/// Parse a document and return its root element.
pub fn parse_xml(text: &str) -> Result<XmlElement> {
    let document = XmlParser::parse(Rule::document, text)
        .map_err(|e| ModelError::parse(e.to_string()))?
        .next()
        .ok_or_else(|| ModelError::parse("empty document"))?;
    let root = document
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::element)
        .ok_or_else(|| ModelError::parse("document has no root element"))?;
    read_element(root, &HashMap::new())
}
