//! Class wrapping for overload sets.

use crate::error::ConfigurationError;
use crate::overload::OverloadSet;
use crate::types::ClassDecl;
use crate::utils::is_valid_identifier;

/// Docstring used when wrapping is asked for one without supplying text.
pub fn default_docstring(class_name: &str) -> String {
    format!("{class_name} class.")
}

/// Nest `set` in a class named `class_name`.
///
/// With `include_docstring`, the class starts with `docstring` or, if that is
/// `None`, [`default_docstring`]. Without it, `docstring` is ignored.
pub fn wrap(
    class_name: &str,
    set: OverloadSet,
    include_docstring: bool,
    docstring: Option<&str>,
) -> Result<ClassDecl, ConfigurationError> {
    if !is_valid_identifier(class_name) {
        return Err(ConfigurationError::InvalidIdentifier {
            field: "class_name".into(),
            value: class_name.to_string(),
        });
    }

    let docstring = include_docstring
        .then(|| docstring.map_or_else(|| default_docstring(class_name), str::to_string));

    Ok(ClassDecl {
        name: class_name.to_string(),
        docstring,
        body: set.into_declarations(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, Mapping};
    use crate::emit::Emit;
    use crate::overload::build_set;

    fn set() -> OverloadSet {
        let mapping: Mapping = [("pet", "Pet")].into_iter().collect();
        build_set(&GeneratorConfig::new("get"), &mapping).unwrap()
    }

    #[test]
    fn test_wrap_with_default_docstring() {
        let class = wrap("Client", set(), true, None).unwrap();
        assert_eq!(class.docstring.as_deref(), Some("Client class."));
        assert_eq!(class.body.len(), 1);
        assert_eq!(
            class.emit(),
            "class Client:\n    \"\"\"Client class.\"\"\"\n\n    @overload\n    def get(self, resource_name: Literal['pet']) -> Pet:\n        ...\n"
        );
    }

    #[test]
    fn test_wrap_docstring_options() {
        let class = wrap("Client", set(), true, Some("Typed accessors.")).unwrap();
        assert_eq!(class.docstring.as_deref(), Some("Typed accessors."));

        let class = wrap("Client", set(), false, Some("ignored")).unwrap();
        assert_eq!(class.docstring, None);
    }

    #[test]
    fn test_wrap_rejects_invalid_class_name() {
        assert_eq!(
            wrap("my client", set(), true, None),
            Err(ConfigurationError::InvalidIdentifier {
                field: "class_name".into(),
                value: "my client".into(),
            })
        );
    }
}
