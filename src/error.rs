use thiserror::Error;

/// Errors raised while defining, instantiating or translating a model.
///
/// Every error aborts the operation that raised it; a builder that fails
/// validation is consumed and never yields a usable template.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A compartment declares no volume, or more than one.
    #[error("definition error: {0}")]
    Definition(String),

    /// A compartment-local species or volume was bound to an external node.
    #[error("linkage error: {0}")]
    Linkage(String),

    /// An amount species resolved to a compartment that exposes no volume.
    #[error("conversion error: {0}")]
    Conversion(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl ModelError {
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    pub fn linkage(msg: impl Into<String>) -> Self {
        Self::Linkage(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::ModelError;

    #[test]
    fn messages_name_the_kind() {
        let err = ModelError::definition("Compartment Cell has no Volume");
        assert_eq!(err.to_string(), "definition error: Compartment Cell has no Volume");
        let err = ModelError::unsupported("stoichiometry 1.5 is not integral");
        assert!(err.to_string().starts_with("unsupported operation"));
    }
}
