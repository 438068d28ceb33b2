//! Typed overload synthesis for Python.
//!
//! Given a function name, a discriminating key parameter and an ordered
//! mapping from literal keys to result types, `overgen-core` produces one
//! `@overload` stub per key, optionally followed by a shared implementation,
//! and emits the declarations as Python source.
//!
//! ```
//! use overgen_core::{GeneratorConfig, Mapping, OverloadGenerator};
//!
//! let mut config = GeneratorConfig::new("parse_data");
//! config.key_param = "format".into();
//! config.has_self = false;
//!
//! let mapping: Mapping = [("json", "dict[str, Any]"), ("xml", "str")].into_iter().collect();
//! let code = OverloadGenerator::new(config).generate(&mapping)?;
//! assert!(code.starts_with("@overload\ndef parse_data(format: Literal['json']) -> dict[str, Any]:"));
//! # Ok::<(), overgen_core::Error>(())
//! ```
//!
//! The crate performs no I/O. Loading configuration files and writing output
//! is left to the caller (see the `overgen` command).

pub mod builder;
pub mod class;
pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod overload;
pub mod synth;
pub mod types;
pub mod utils;

pub use builder::{TypeBuilder, TypeDescriptor, TypeOverride, parse_type};
pub use class::wrap;
pub use config::{
    ClassOptions, GenerationDocument, GeneratorConfig, Mapping, MappingEntry, OutputOptions,
    ParamSpec,
};
pub use emit::{Emit, emit};
pub use error::{ConfigurationError, Error, UnrecognizedDescriptor, ValidationError};
pub use generator::{
    OverloadGenerator, generate, generate_overloads, generate_overloads_with_imports,
    typing_import,
};
pub use overload::{OverloadSet, OverloadSetBuilder, build_set};
pub use synth::{SignatureRequest, literal_key_type, synthesize};
pub use types::{
    Body, ClassDecl, Decl, Import, LiteralValue, Module, OverloadDecl, Param, ParamKind, TypeExpr,
};
