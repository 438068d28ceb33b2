//! Error taxonomy for overload generation.
//!
//! Configuration and validation errors abort generation and name the
//! offending field or key. An [`UnrecognizedDescriptor`] is only a warning:
//! the descriptor is emitted verbatim and generation continues.

use thiserror::Error;

/// Invalid or contradictory generator options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// `include_implementation` was set without a body to emit.
    #[error("include_implementation is set but implementation_body is missing or blank")]
    MissingImplementationBody,
    /// `has_self` was set and another parameter is also named `self`.
    #[error("parameter `{field}` is named `self`, which conflicts with has_self")]
    SelfParameterConflict {
        /// Configuration field holding the conflicting name
        field: String,
    },
    /// A name that must be a Python identifier is not one.
    #[error("{field} must be a valid Python identifier, got {value:?}")]
    InvalidIdentifier {
        /// Configuration field holding the name
        field: String,
        /// Rejected value
        value: String,
    },
    /// Two parameters share a name.
    #[error("duplicate parameter name `{name}`")]
    DuplicateParameter {
        /// Repeated parameter name
        name: String,
    },
    /// A configuration document could not be decoded.
    #[error("failed to parse {format} configuration: {message}")]
    Parse {
        /// Document format, e.g. "TOML"
        format: &'static str,
        /// Decoder message
        message: String,
    },
}

/// Structurally invalid mapping or overload set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Cannot synthesize zero overloads.
    #[error("mapping is empty; at least one key is required to synthesize overloads")]
    EmptyMapping,
    /// The same key appears twice.
    #[error("duplicate mapping key {key}")]
    DuplicateKey {
        /// Python literal form of the repeated key
        key: String,
    },
    /// Declarations handed to `OverloadSet::new` break the set invariants.
    #[error("malformed overload set: {reason}")]
    MalformedOverloadSet {
        /// Which invariant failed
        reason: String,
    },
}

/// Any fatal generation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid options
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Invalid mapping
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A type descriptor the builder could not decompose; it is emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized type descriptor {text:?} ({reason}); emitting it verbatim")]
pub struct UnrecognizedDescriptor {
    /// Original descriptor text
    pub text: String,
    /// Why structural parsing stopped
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offending_field() {
        let err = ConfigurationError::InvalidIdentifier {
            field: "key_param".into(),
            value: "class".into(),
        };
        assert_eq!(
            err.to_string(),
            "key_param must be a valid Python identifier, got \"class\""
        );

        let err = Error::from(ValidationError::DuplicateKey { key: "'a'".into() });
        assert_eq!(err.to_string(), "duplicate mapping key 'a'");
    }
}
