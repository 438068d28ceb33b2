//! Overload set construction.
//!
//! Walks the mapping in order, synthesizes one `@overload` stub per key and
//! optionally appends the shared implementation.

use tracing::debug;

use crate::builder::TypeBuilder;
use crate::config::{GeneratorConfig, Mapping};
use crate::error::{Error, UnrecognizedDescriptor, ValidationError};
use crate::synth::{SignatureRequest, literal_key_type, resolve_params, synthesize};
use crate::types::{LiteralValue, OverloadDecl, TypeExpr};

/// Ordered declarations sharing one function name.
///
/// At least one declaration, at most one non-stub and only in last position.
/// Every member has the same name, async-ness and parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadSet {
    declarations: Vec<OverloadDecl>,
    warnings: Vec<UnrecognizedDescriptor>,
}

impl OverloadSet {
    /// Check the set invariants and wrap `declarations`.
    pub fn new(declarations: Vec<OverloadDecl>) -> Result<Self, ValidationError> {
        Self::with_warnings(declarations, Vec::new())
    }

    fn with_warnings(
        declarations: Vec<OverloadDecl>,
        warnings: Vec<UnrecognizedDescriptor>,
    ) -> Result<Self, ValidationError> {
        let malformed = |reason: String| ValidationError::MalformedOverloadSet { reason };

        let Some((first, rest)) = declarations.split_first() else {
            return Err(malformed("an overload set needs at least one declaration".into()));
        };

        let names = first.param_names();
        for decl in rest {
            if decl.name != first.name {
                return Err(malformed(format!(
                    "declaration `{}` does not match function name `{}`",
                    decl.name, first.name
                )));
            }
            if decl.is_async != first.is_async {
                return Err(malformed(format!(
                    "`{}` mixes async and sync declarations",
                    first.name
                )));
            }
            if decl.param_names() != names {
                return Err(malformed(format!(
                    "`{}` declarations disagree on parameter names",
                    first.name
                )));
            }
        }

        let last = declarations.len() - 1;
        if let Some(pos) = declarations.iter().position(|d| !d.is_stub())
            && pos != last
        {
            return Err(malformed(
                "the implementation must be the last declaration".into(),
            ));
        }

        Ok(Self {
            declarations,
            warnings,
        })
    }

    /// All declarations in emission order.
    pub fn declarations(&self) -> &[OverloadDecl] {
        &self.declarations
    }

    /// The `@overload` stubs, in mapping order.
    pub fn stubs(&self) -> impl Iterator<Item = &OverloadDecl> {
        self.declarations.iter().filter(|d| d.is_stub())
    }

    /// The shared implementation, if one was requested.
    pub fn implementation(&self) -> Option<&OverloadDecl> {
        self.declarations.last().filter(|d| !d.is_stub())
    }

    /// Descriptors that were kept verbatim while building the set.
    pub fn warnings(&self) -> &[UnrecognizedDescriptor] {
        &self.warnings
    }

    /// Function name shared by the set.
    pub fn function_name(&self) -> &str {
        self.declarations
            .first()
            .map_or("", |decl| decl.name.as_str())
    }

    /// Number of declarations, implementation included.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Take the declarations out of the set.
    pub fn into_declarations(self) -> Vec<OverloadDecl> {
        self.declarations
    }
}

/// Builds overload sets with a configurable [`TypeBuilder`].
#[derive(Debug, Clone, Default)]
pub struct OverloadSetBuilder {
    types: TypeBuilder,
}

impl OverloadSetBuilder {
    /// Builder using the default type construction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder using `types` for every descriptor.
    pub const fn with_type_builder(types: TypeBuilder) -> Self {
        Self { types }
    }

    /// The type builder in use.
    pub const fn type_builder(&self) -> &TypeBuilder {
        &self.types
    }

    /// Validate `config` and `mapping`, then synthesize the set.
    pub fn build(&self, config: &GeneratorConfig, mapping: &Mapping) -> Result<OverloadSet, Error> {
        config.validate()?;
        mapping.validate()?;

        let mut warnings = Vec::new();
        let params = resolve_params(&self.types, &config.additional_params, &mut warnings);
        let fallback = self
            .types
            .build_collecting(&config.return_type_fallback, &mut warnings);

        let mut declarations = Vec::with_capacity(mapping.len() + 1);
        for entry in mapping.entries() {
            let return_type = match &entry.descriptor {
                Some(descriptor) if config.return_type_from_mapping => {
                    self.types.build_collecting(descriptor, &mut warnings)
                }
                _ => fallback.clone(),
            };
            declarations.push(synthesize(&SignatureRequest {
                function_name: &config.function_name,
                key_param: &config.key_param,
                key_type: literal_key_type(&entry.key),
                additional_params: &params,
                return_type,
                is_async: config.is_async,
                has_self: config.has_self,
                include_implementation: false,
                implementation_body: None,
            })?);
        }

        if config.include_implementation {
            let key_type = match &config.implementation_key_type {
                Some(descriptor) => self.types.build_collecting(descriptor, &mut warnings),
                None => wide_key_type(mapping.keys()),
            };
            declarations.push(synthesize(&SignatureRequest {
                function_name: &config.function_name,
                key_param: &config.key_param,
                key_type,
                additional_params: &params,
                return_type: fallback,
                is_async: config.is_async,
                has_self: config.has_self,
                include_implementation: true,
                implementation_body: config.implementation_text(),
            })?);
        }

        debug!(
            function = %config.function_name,
            overloads = mapping.len(),
            implementation = config.include_implementation,
            warnings = warnings.len(),
            "Built overload set."
        );

        OverloadSet::with_warnings(declarations, warnings).map_err(Error::from)
    }
}

/// Build an overload set with the default type builder.
pub fn build_set(config: &GeneratorConfig, mapping: &Mapping) -> Result<OverloadSet, Error> {
    OverloadSetBuilder::new().build(config, mapping)
}

/// Annotation accepting every key: the builtin type of each key kind,
/// joined with `|` in first-seen order.
pub fn wide_key_type<'a>(keys: impl IntoIterator<Item = &'a LiteralValue>) -> TypeExpr {
    let mut kinds: Vec<&'static str> = Vec::new();
    for key in keys {
        let kind = key.type_name();
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    TypeExpr::union(kinds.into_iter().map(TypeExpr::name).collect())
        .unwrap_or_else(|| TypeExpr::name("str"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builder::TypeDescriptor;
    use crate::config::ParamSpec;
    use crate::emit::Emit;
    use crate::error::ConfigurationError;
    use crate::types::{Body, Param};

    fn mapping() -> Mapping {
        [("pet", "M.Pet"), ("skill", "M.Skill"), ("item", "M.Item")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_one_stub_per_key_in_order() {
        let set = build_set(&GeneratorConfig::new("get_resource"), &mapping()).unwrap();

        assert_eq!(set.len(), 3);
        assert!(set.implementation().is_none());
        let keys: Vec<String> = set
            .stubs()
            .map(|d| d.param("resource_name").unwrap().ty.as_ref().unwrap().emit())
            .collect();
        assert_eq!(
            keys,
            vec!["Literal['pet']", "Literal['skill']", "Literal['item']"]
        );
        assert_eq!(set.declarations()[1].return_type, TypeExpr::name("M.Skill"));
    }

    #[test]
    fn test_implementation_is_appended_last() {
        let mut config = GeneratorConfig::new("get_resource");
        config.additional_params = vec![ParamSpec::new("id", "int")];
        config.include_implementation = true;
        config.implementation_body = Some("return self._fetch(resource_name, id)".into());

        let set = build_set(&config, &mapping()).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.stubs().count(), 3);

        let implementation = set.implementation().unwrap();
        assert_eq!(
            implementation.param("resource_name").unwrap().ty,
            Some(TypeExpr::name("str"))
        );
        assert_eq!(implementation.return_type, TypeExpr::name("Any"));
        assert_eq!(
            implementation.body,
            Body::Implementation("return self._fetch(resource_name, id)".into())
        );
    }

    #[test]
    fn test_implementation_key_type_override() {
        let mut config = GeneratorConfig::new("get");
        config.include_implementation = true;
        config.implementation_body = Some("...".into());
        config.implementation_key_type = Some("ResourceName".into());

        let set = build_set(&config, &mapping()).unwrap();
        assert_eq!(
            set.implementation().unwrap().param("resource_name").unwrap().ty,
            Some(TypeExpr::name("ResourceName"))
        );
    }

    #[test]
    fn test_fallback_return_type() {
        let mut untyped = Mapping::new();
        untyped.insert("a", "int").insert_untyped("b");

        let set = build_set(&GeneratorConfig::new("get"), &untyped).unwrap();
        assert_eq!(set.declarations()[0].return_type, TypeExpr::name("int"));
        assert_eq!(set.declarations()[1].return_type, TypeExpr::name("Any"));

        let mut config = GeneratorConfig::new("get");
        config.return_type_from_mapping = false;
        config.return_type_fallback = "object".into();
        let set = build_set(&config, &untyped).unwrap();
        assert!(
            set.declarations()
                .iter()
                .all(|d| d.return_type == TypeExpr::name("object"))
        );
    }

    #[test]
    fn test_rejects_empty_and_duplicate_mappings() {
        let config = GeneratorConfig::new("get");
        assert_eq!(
            build_set(&config, &Mapping::new()),
            Err(Error::Validation(ValidationError::EmptyMapping))
        );

        let dup: Mapping = [("a", "int"), ("a", "str")].into_iter().collect();
        let err = build_set(&config, &dup).unwrap_err();
        assert_eq!(err.to_string(), "duplicate mapping key 'a'");
    }

    #[test]
    fn test_configuration_checked_before_mapping() {
        let mut config = GeneratorConfig::new("get");
        config.include_implementation = true;
        assert_eq!(
            build_set(&config, &Mapping::new()),
            Err(Error::Configuration(
                ConfigurationError::MissingImplementationBody
            ))
        );
    }

    #[test]
    fn test_warnings_are_collected() {
        let mapping: Mapping = [("a", "int"), ("b", "Callable[[int], str]")]
            .into_iter()
            .collect();
        let set = build_set(&GeneratorConfig::new("get"), &mapping).unwrap();
        assert_eq!(set.warnings().len(), 1);
        assert_eq!(
            set.declarations()[1].return_type,
            TypeExpr::raw("Callable[[int], str]")
        );
    }

    #[test]
    fn test_type_builder_override() {
        let builder = OverloadSetBuilder::with_type_builder(TypeBuilder::new().with_override(
            |descriptor| match descriptor {
                TypeDescriptor::Text(text) if text == "Pet" => {
                    Some(TypeExpr::name("models.Pet"))
                }
                _ => None,
            },
        ));
        let mapping: Mapping = [("pet", "Pet"), ("n", "int")].into_iter().collect();
        let set = builder.build(&GeneratorConfig::new("get"), &mapping).unwrap();
        assert_eq!(set.declarations()[0].return_type, TypeExpr::name("models.Pet"));
        assert_eq!(set.declarations()[1].return_type, TypeExpr::name("int"));
    }

    #[test]
    fn test_wide_key_type() {
        let keys = [
            LiteralValue::from(1_i64),
            LiteralValue::from("a"),
            LiteralValue::from(2_i64),
            LiteralValue::None,
        ];
        assert_eq!(wide_key_type(&keys).emit(), "int | str | None");
        assert_eq!(wide_key_type(&keys[..1]), TypeExpr::name("int"));
    }

    #[test]
    fn test_new_rejects_malformed_sets() {
        let stub = |name: &str| OverloadDecl {
            name: name.into(),
            params: vec![Param::typed("k", TypeExpr::literal("a"))],
            return_type: TypeExpr::name("int"),
            is_async: false,
            body: Body::Stub,
        };
        let implementation = OverloadDecl {
            body: Body::Implementation("pass".into()),
            ..stub("get")
        };

        assert!(OverloadSet::new(vec![]).is_err());
        assert!(OverloadSet::new(vec![stub("get"), stub("other")]).is_err());
        assert!(OverloadSet::new(vec![implementation.clone(), stub("get")]).is_err());

        let mut async_stub = stub("get");
        async_stub.is_async = true;
        assert!(OverloadSet::new(vec![stub("get"), async_stub]).is_err());

        let mut renamed = stub("get");
        renamed.params[0].name = "key".into();
        assert!(OverloadSet::new(vec![stub("get"), renamed]).is_err());

        let set = OverloadSet::new(vec![stub("get"), implementation]).unwrap();
        assert_eq!(set.function_name(), "get");
        assert!(set.implementation().is_some());
    }
}
