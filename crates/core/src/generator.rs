//! High-level generation entry points.
//!
//! [`OverloadGenerator`] ties the pipeline together: build the overload set,
//! optionally wrap it in a class, collect the `typing` names the output
//! refers to, and emit the module text.

use crate::builder::TypeBuilder;
use crate::class::wrap;
use crate::config::{GenerationDocument, GeneratorConfig, Mapping, OutputOptions};
use crate::emit::{Emit, emit};
use crate::error::Error;
use crate::overload::{OverloadSet, OverloadSetBuilder};
use crate::types::{Decl, Import, Module, TypeExpr};

/// `typing` names that may be imported, in import order.
const TYPING_NAMES: [&str; 5] = ["overload", "Literal", "Optional", "Union", "Any"];

/// Generator bound to one configuration.
#[derive(Debug, Clone)]
pub struct OverloadGenerator {
    config: GeneratorConfig,
    builder: OverloadSetBuilder,
}

impl OverloadGenerator {
    /// Generator with the default type builder.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            builder: OverloadSetBuilder::new(),
        }
    }

    /// Use `types` for every descriptor.
    #[must_use]
    pub fn with_type_builder(mut self, types: TypeBuilder) -> Self {
        self.builder = OverloadSetBuilder::with_type_builder(types);
        self
    }

    /// The configuration in use.
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the overload set for `mapping`.
    pub fn build(&self, mapping: &Mapping) -> Result<OverloadSet, Error> {
        self.builder.build(&self.config, mapping)
    }

    /// Emit the overloads (and implementation, if configured) without imports.
    pub fn generate(&self, mapping: &Mapping) -> Result<String, Error> {
        let decls = into_functions(self.build(mapping)?);
        Ok(emit(&decls, &[]))
    }

    /// Emit the overloads preceded by the `typing` import and `extra_imports`.
    pub fn generate_with_imports(
        &self,
        mapping: &Mapping,
        extra_imports: &[String],
    ) -> Result<String, Error> {
        let decls = into_functions(self.build(mapping)?);
        let mut imports: Vec<Import> = typing_import(&decls).into_iter().collect();
        imports.extend(extra_imports.iter().cloned().map(Import::Raw));
        Ok(emit(&decls, &imports))
    }

    /// Emit the overloads as methods of `class_name`. `has_self` is always on.
    pub fn generate_class(
        &self,
        class_name: &str,
        mapping: &Mapping,
        include_docstring: bool,
        docstring: Option<&str>,
    ) -> Result<String, Error> {
        let config = GeneratorConfig {
            has_self: true,
            ..self.config.clone()
        };
        let set = self.builder.build(&config, mapping)?;
        let class = wrap(class_name, set, include_docstring, docstring)?;
        Ok(class.emit())
    }

    /// Assemble the full module described by `output`.
    pub fn build_module(&self, mapping: &Mapping, output: &OutputOptions) -> Result<Module, Error> {
        let decls = match &output.class {
            Some(class) => {
                let config = GeneratorConfig {
                    has_self: true,
                    ..self.config.clone()
                };
                let set = self.builder.build(&config, mapping)?;
                let class = wrap(
                    &class.name,
                    set,
                    class.include_docstring,
                    class.docstring.as_deref(),
                )?;
                vec![Decl::Class(class)]
            }
            None => into_functions(self.build(mapping)?),
        };

        let mut imports = Vec::with_capacity(output.extra_imports.len() + 1);
        if output.typing_import {
            imports.extend(typing_import(&decls));
        }
        imports.extend(output.extra_imports.iter().cloned().map(Import::Raw));

        Ok(Module {
            header: output.header.clone(),
            imports,
            body: decls,
        })
    }

    /// Emit the full module described by `output`.
    pub fn render(&self, mapping: &Mapping, output: &OutputOptions) -> Result<String, Error> {
        self.build_module(mapping, output).map(|module| module.emit())
    }
}

fn into_functions(set: OverloadSet) -> Vec<Decl> {
    set.into_declarations()
        .into_iter()
        .map(Decl::Function)
        .collect()
}

/// `from typing import ...` naming what `decls` use, or `None` if nothing.
///
/// Only structural nodes are inspected; names inside raw annotations are the
/// caller's to import.
pub fn typing_import(decls: &[Decl]) -> Option<Import> {
    let functions: Vec<_> = decls.iter().flat_map(Decl::functions).collect();
    let annotations: Vec<&TypeExpr> = functions
        .iter()
        .copied()
        .flat_map(|f| {
            f.params
                .iter()
                .filter_map(|p| p.ty.as_ref())
                .chain(std::iter::once(&f.return_type))
        })
        .collect();
    let uses = |pred: &dyn Fn(&TypeExpr) -> bool| annotations.iter().any(|ty| ty.any(&pred));

    let names: Vec<String> = TYPING_NAMES
        .iter()
        .filter(|name| match **name {
            "overload" => functions.iter().any(|f| f.is_stub()),
            "Literal" => uses(&|ty| matches!(ty, TypeExpr::Literal(_))),
            "Optional" => uses(&|ty| matches!(ty, TypeExpr::Optional(_))),
            "Union" => uses(&|ty| {
                matches!(ty, TypeExpr::Generic { base, .. } if **base == TypeExpr::name("Union"))
            }),
            other => uses(&|ty| matches!(ty, TypeExpr::Name(n) if n == other)),
        })
        .map(ToString::to_string)
        .collect();

    (!names.is_empty()).then(|| Import::From {
        module: "typing".into(),
        names,
    })
}

/// Emit the overloads for `mapping` without imports.
pub fn generate_overloads(config: GeneratorConfig, mapping: &Mapping) -> Result<String, Error> {
    OverloadGenerator::new(config).generate(mapping)
}

/// Emit the overloads for `mapping` with the `typing` import and `extra_imports`.
pub fn generate_overloads_with_imports(
    config: GeneratorConfig,
    mapping: &Mapping,
    extra_imports: &[String],
) -> Result<String, Error> {
    OverloadGenerator::new(config).generate_with_imports(mapping, extra_imports)
}

/// Render a whole configuration document.
pub fn generate(document: &GenerationDocument) -> Result<String, Error> {
    OverloadGenerator::new(document.generator.clone()).render(&document.mapping, &document.output)
}
